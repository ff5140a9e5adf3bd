use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::PendingRequestRow,
        repository::FriendRequestRepository,
        schema::{FriendRequestEntity, FriendRequestStatus},
    },
    modules::user::schema::UserEntity,
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_between(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE
                (from_user_id = $1 AND to_user_id = $2)
            OR (from_user_id = $2 AND to_user_id = $1)
            "#,
        )
        .bind(user_id_a)
        .bind(user_id_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        // The unique index on (LEAST(from, to), GREATEST(from, to)) is the
        // authority on duplicates and reciprocal requests; a 23505 out of
        // this insert means the pre-check lost a race.
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, from_user_id, to_user_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn respond(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
        status: FriendRequestStatus,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE friend_requests
            SET status = $3
            WHERE id = $1 AND to_user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(request_id)
        .bind(recipient_id)
        .bind(status)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let friends = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.*
            FROM friend_requests fr
            JOIN users u
                ON u.id = CASE
                    WHEN fr.from_user_id = $1 THEN fr.to_user_id
                    ELSE fr.from_user_id
                END
            WHERE (fr.from_user_id = $1 OR fr.to_user_id = $1)
              AND fr.status = 'accepted'
              AND u.id <> $1
            ORDER BY u.name, u.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn count_friends(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM friend_requests fr
            WHERE (fr.from_user_id = $1 OR fr.to_user_id = $1)
              AND fr.status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingRequestRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                fr.status,
                fr.created_at,
                u.id AS sender_id,
                u.name AS sender_name,
                u.email AS sender_email,
                u.created_at AS sender_created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.from_user_id = u.id
            WHERE fr.to_user_id = $1 AND fr.status = 'pending'
            ORDER BY fr.created_at DESC, fr.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_pending_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM friend_requests WHERE to_user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
