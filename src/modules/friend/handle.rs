use actix_web::{get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{FriendRequestResponse, RespondFriendRequestModel, SendFriendRequestModel},
            repository_pg::FriendRepositoryPg,
            schema::FriendRequestEntity,
            service::FriendService,
        },
        user::{model::UserResponse, repository_pg::UserRepositoryPg},
    },
    utils::{PageQuery, Paginated, ValidatedJson, ValidatedQuery},
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[post("")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<SendFriendRequestModel>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let request = friend_service.send_friend_request(sender_id, &body.0.email).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent successfully"))
}

#[post("/requests/respond")]
pub async fn respond_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<RespondFriendRequestModel>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let status = friend_service
        .respond_friend_request(user_id, body.0.request_id, &body.0.status)
        .await?;

    Ok(success::Success::ok(None).message(format!("Friend request {}", status.as_str())))
}

#[get("")]
pub async fn list_friends(
    friend_service: web::Data<FriendSvc>,
    page: ValidatedQuery<PageQuery>,
    req: HttpRequest,
) -> Result<success::Success<Paginated<UserResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.list_friends(user_id, &page.0).await?;

    Ok(success::Success::ok(Some(friends)))
}

#[get("/requests/pending")]
pub async fn list_pending_friend_requests(
    friend_service: web::Data<FriendSvc>,
    page: ValidatedQuery<PageQuery>,
    req: HttpRequest,
) -> Result<success::Success<Paginated<FriendRequestResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.list_pending_requests(user_id, &page.0).await?;

    Ok(success::Success::ok(Some(requests)))
}
