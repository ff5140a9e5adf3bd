use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};
use dashmap::DashMap;
use uuid::Uuid;

use crate::{api::error, utils::Claims, ENV};

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return Err(error::Error::unauthorized("Token Invalid or Expired").into());
        }
    };

    let claims = Claims::decode(token, ENV.jwt_secret.as_ref())
        .map_err(|_| error::Error::unauthorized("Token Invalid or Expired"))?;

    req.extensions_mut().insert(claims);

    next.call(req).await
}

pub fn get_claims(req: &HttpRequest) -> Result<Claims, error::Error> {
    let extensions = req.extensions();

    let claims = extensions
        .get::<Claims>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(claims)
}

/// Rate-limit state for one account.
struct RateEntry {
    count: u32,
    window_start: i64,
}

/// Fixed-window request counter keyed by account id.
pub struct RateLimiter {
    max: u32,
    window_secs: i64,
    entries: DashMap<Uuid, RateEntry>,
}

impl RateLimiter {
    pub fn new(max: u32, window_secs: i64) -> Self {
        RateLimiter { max, window_secs, entries: DashMap::new() }
    }

    pub fn check(&self, key: Uuid) -> bool {
        self.check_at(key, chrono::Utc::now().timestamp())
    }

    fn check_at(&self, key: Uuid, now: i64) -> bool {
        let mut entry =
            self.entries.entry(key).or_insert(RateEntry { count: 0, window_start: now });

        // Reset window if expired
        if now - entry.window_start >= self.window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max {
            return false;
        }

        entry.count += 1;
        true
    }
}

/// Throttles friend-request sends per authenticated account. Must run inside
/// the authenticated scope so the claims are already in the extensions.
pub async fn throttle_friend_requests<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let limiter = req
        .app_data::<web::Data<RateLimiter>>()
        .cloned()
        .ok_or_else(error::Error::internal_server_error)?;

    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?;

    if !limiter.check(claims.sub) {
        return Err(error::Error::too_many_requests("Request was throttled").into());
    }

    next.call(req).await
}
