use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::friend::schema::FriendRequestStatus;
use crate::modules::user::model::UserResponse;

#[derive(Deserialize, Validate)]
pub struct SendFriendRequestModel {
    #[validate(length(min = 1, message = "Email is required to send a friend request"))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct RespondFriendRequestModel {
    pub request_id: Uuid,
    #[validate(length(
        min = 1,
        message = "Request ID and a valid status (\"accepted\" or \"rejected\") are required"
    ))]
    pub status: String,
}

/// Pending request joined with its sender, one row per request.
#[derive(FromRow)]
pub struct PendingRequestRow {
    pub req_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub from_user: UserResponse,
    pub status: FriendRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<PendingRequestRow> for FriendRequestResponse {
    fn from(row: PendingRequestRow) -> Self {
        FriendRequestResponse {
            id: row.req_id,
            from_user: UserResponse {
                id: row.sender_id,
                name: row.sender_name,
                email: row.sender_email,
                created_at: row.sender_created_at,
            },
            status: row.status,
            created_at: row.created_at,
        }
    }
}
