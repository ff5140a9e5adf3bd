use actix_web::{get, post, web};

use crate::modules::user::{model, service::UserService};
use crate::utils::{PageQuery, ValidatedJson, ValidatedQuery};
use crate::{
    api::{error, success},
    modules::user::model::SignUpResponse,
};

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<SignUpResponse>, error::Error> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(SignUpResponse { id: user_id }))
        .message("You have been successfully registered"))
}

#[post("/login")]
pub async fn login(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::LoginModel>,
) -> Result<success::Success<model::LoginResponse>, error::Error> {
    let token = user_service.login(user_data.0).await?;
    Ok(success::Success::ok(Some(model::LoginResponse { token })).message("Login successful"))
}

#[get("/search")]
pub async fn search(
    user_service: web::Data<UserService>,
    search: ValidatedQuery<model::SearchQuery>,
    page: ValidatedQuery<PageQuery>,
) -> Result<success::Success<model::SearchResult>, error::Error> {
    let result = user_service.search(&search.0.query, &page.0).await?;
    Ok(success::Success::ok(Some(result)))
}
