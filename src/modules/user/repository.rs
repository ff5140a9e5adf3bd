use uuid::Uuid;

use crate::{api::error, modules::user::model::InsertUser, modules::user::schema::UserEntity};

#[async_trait::async_trait]
pub trait UserRepository {
    /// Case-insensitive email lookup; the authentication path and the
    /// friend-request target lookup go through here.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;

    /// Exact-match email lookup used by the `@`-query search path.
    async fn find_by_email_exact(
        &self,
        email: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;

    /// Search users by name (case-insensitive, partial match).
    async fn search_by_name(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;

    async fn count_by_name(&self, query: &str) -> Result<i64, error::SystemError>;
}
