use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::TokenCache;
use crate::ENV;

use crate::modules::user::model::{
    InsertUser, LoginModel, SearchResult, SignUpModel, UserResponse,
};
use crate::modules::user::repository::UserRepository;
use crate::utils::{hash_password, verify_password, Claims, PageQuery, Paginated};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<dyn TokenCache>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<dyn TokenCache>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache }
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let name = user.name.trim().to_string();
        if name.is_empty() {
            return Err(error::SystemError::bad_request("Name cannot be empty"));
        }

        let hash_password = hash_password(&user.password)?;

        // Normalized storage: uniqueness lives on the lowercased column, so
        // the value is lowercased before it ever reaches the database.
        let new_user =
            InsertUser { name, email: user.email.to_lowercase(), hash_password };

        match self.repo.create(&new_user).await {
            Ok(user_id) => Ok(user_id),
            Err(e) if e.is_conflict() => {
                Err(error::SystemError::bad_request("Email address is already in use"))
            }
            Err(e) => Err(e),
        }
    }

    /// Unknown email and wrong password both come back as the same
    /// NotFound("Invalid Credentials"); login deliberately answers 404 here.
    pub async fn login(&self, credentials: LoginModel) -> Result<String, error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&credentials.email)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Invalid Credentials"))?;

        let valid = verify_password(&user_entity.hash_password, &credentials.password)?;
        if !valid {
            return Err(error::SystemError::not_found("Invalid Credentials"));
        }

        // Reuse the token issued earlier if it is still live.
        if let Some(token) = self.cache.get_token(&user_entity.id).await? {
            return Ok(token);
        }

        let token =
            Claims::new(&user_entity.id, ENV.token_expiration).encode(ENV.jwt_secret.as_ref())?;
        self.cache
            .store_token(&user_entity.id, &token, ENV.token_expiration as usize)
            .await?;

        Ok(token)
    }

    pub async fn search(
        &self,
        query: &str,
        page: &PageQuery,
    ) -> Result<SearchResult, error::SystemError> {
        if query.contains('@') {
            let user = self
                .repo
                .find_by_email_exact(query)
                .await?
                .ok_or_else(|| error::SystemError::not_found("User not found"))?;
            return Ok(SearchResult::Single(UserResponse::from(user)));
        }

        let count = self.repo.count_by_name(query).await?;
        let users = self.repo.search_by_name(query, page.limit(), page.offset()).await?;
        let results = users.into_iter().map(UserResponse::from).collect();

        Ok(SearchResult::Page(Paginated::new(count, page, results)))
    }
}
