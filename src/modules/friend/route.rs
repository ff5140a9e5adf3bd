use crate::middlewares::throttle_friend_requests;
use crate::modules::friend::handle::*;
use actix_web::middleware::from_fn;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(list_friends)
            .service(respond_friend_request)
            .service(list_pending_friend_requests)
            // Sending is the only throttled action, so it sits in its own
            // scope behind the rate-limit middleware.
            .service(
                scope("/requests")
                    .wrap(from_fn(throttle_friend_requests))
                    .service(send_friend_request),
            ),
    );
}
