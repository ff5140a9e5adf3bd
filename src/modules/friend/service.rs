use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::FriendRequestResponse,
            repository::FriendRequestRepository,
            schema::{FriendRequestEntity, FriendRequestStatus},
        },
        user::{model::UserResponse, repository::UserRepository},
    },
    utils::{PageQuery, Paginated},
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRequestRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRequestRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        target_email: &str,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let target = self
            .user_repo
            .find_by_email(target_email)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if target.id == sender_id {
            return Err(error::SystemError::bad_request(
                "You cannot send a friend request to yourself",
            ));
        }

        if self.friend_repo.find_between(&sender_id, &target.id).await?.is_some() {
            return Err(error::SystemError::bad_request("Friend request already exists"));
        }

        match self.friend_repo.create(&sender_id, &target.id).await {
            Ok(request) => Ok(request),
            // Concurrent insert between the pre-check and here; same answer.
            Err(e) if e.is_conflict() => {
                Err(error::SystemError::bad_request("Friend request already exists"))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn respond_friend_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        status: &str,
    ) -> Result<FriendRequestStatus, error::SystemError> {
        let status = FriendRequestStatus::parse_response(status).ok_or_else(|| {
            error::SystemError::bad_request(
                "Request ID and a valid status (\"accepted\" or \"rejected\") are required",
            )
        })?;

        let updated = self.friend_repo.respond(&request_id, &user_id, status).await?;
        if !updated {
            return Err(error::SystemError::not_found("Friend request not found"));
        }

        Ok(status)
    }

    pub async fn list_friends(
        &self,
        user_id: Uuid,
        page: &PageQuery,
    ) -> Result<Paginated<UserResponse>, error::SystemError> {
        let count = self.friend_repo.count_friends(&user_id).await?;
        let friends = self.friend_repo.find_friends(&user_id, page.limit(), page.offset()).await?;
        let results = friends.into_iter().map(UserResponse::from).collect();

        Ok(Paginated::new(count, page, results))
    }

    pub async fn list_pending_requests(
        &self,
        user_id: Uuid,
        page: &PageQuery,
    ) -> Result<Paginated<FriendRequestResponse>, error::SystemError> {
        let count = self.friend_repo.count_pending_to_user(&user_id).await?;
        let rows = self
            .friend_repo
            .find_pending_to_user(&user_id, page.limit(), page.offset())
            .await?;
        let results = rows.into_iter().map(FriendRequestResponse::from).collect();

        Ok(Paginated::new(count, page, results))
    }
}
