use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/auth").service(sign_up).service(login));
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/users").service(search));
}
