use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;
use crate::utils::Paginated;

#[derive(Deserialize, Validate)]
pub struct SignUpModel {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginModel {
    #[validate(length(min = 1, message = "Please provide both email and password"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide both email and password"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, message = "Search query cannot be empty"))]
    pub query: String,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub id: uuid::Uuid,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Wire form of an account. The password hash is write-only and never leaves
/// the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            created_at: entity.created_at,
        }
    }
}

/// Search returns a bare account for the exact-email path and a page for the
/// name-substring path.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    Single(UserResponse),
    Page(Paginated<UserResponse>),
}

pub struct InsertUser {
    pub name: String,
    pub email: String,
    pub hash_password: String,
}
