use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::PendingRequestRow;
use crate::modules::friend::schema::{FriendRequestEntity, FriendRequestStatus};
use crate::modules::user::schema::UserEntity;

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// Any request between the pair, in either direction and any status.
    async fn find_between(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn create(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Moves a pending request addressed to `recipient_id` into a terminal
    /// status. Returns false when no such pending request exists.
    async fn respond(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
        status: FriendRequestStatus,
    ) -> Result<bool, error::SystemError>;

    /// Counterpart accounts of all accepted requests involving the user.
    async fn find_friends(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;

    async fn count_friends(&self, user_id: &Uuid) -> Result<i64, error::SystemError>;

    /// Pending requests addressed to the user, sender joined in.
    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingRequestRow>, error::SystemError>;

    async fn count_pending_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError>;
}
