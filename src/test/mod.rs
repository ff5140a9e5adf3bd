use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use uuid::Uuid;

use crate::api::error;
use crate::configs::TokenCache;
use crate::modules::friend::model::PendingRequestRow;
use crate::modules::friend::repository::FriendRequestRepository;
use crate::modules::friend::schema::{FriendRequestEntity, FriendRequestStatus};
use crate::modules::friend::service::FriendService;
use crate::modules::user::model::{InsertUser, LoginModel, SearchResult, SignUpModel};
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserEntity;
use crate::modules::user::service::UserService;
use crate::utils::PageQuery;

static ENV_SETUP: Once = Once::new();

fn setup_env() {
    ENV_SETUP.call_once(|| {
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::set_var("DATABASE_URL", "postgres://unused");
        std::env::set_var("REDIS_URL", "redis://unused");
    });
}

fn new_id() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

/// In-memory stand-in for the Postgres repositories, mirroring the unique
/// indexes the migrations declare (lower(email), unordered request pair).
#[derive(Default)]
struct MemStore {
    users: Mutex<Vec<UserEntity>>,
    requests: Mutex<Vec<FriendRequestEntity>>,
    tokens: Mutex<HashMap<Uuid, String>>,
}

#[async_trait::async_trait]
impl UserRepository for MemStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_email_exact(
        &self,
        email: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(error::SystemError::Conflict(None));
        }
        let id = new_id();
        users.push(UserEntity {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            created_at: chrono::Utc::now(),
        });
        Ok(id)
    }

    async fn search_by_name(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let needle = query.to_lowercase();
        let mut matches: Vec<UserEntity> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn count_by_name(&self, query: &str) -> Result<i64, error::SystemError> {
        let needle = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for MemStore {
    async fn find_between(
        &self,
        a: &Uuid,
        b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                (r.from_user_id == *a && r.to_user_id == *b)
                    || (r.from_user_id == *b && r.to_user_id == *a)
            })
            .cloned())
    }

    async fn create(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut requests = self.requests.lock().unwrap();
        let exists = requests.iter().any(|r| {
            (r.from_user_id == *sender_id && r.to_user_id == *recipient_id)
                || (r.from_user_id == *recipient_id && r.to_user_id == *sender_id)
        });
        if exists {
            return Err(error::SystemError::Conflict(None));
        }
        let request = FriendRequestEntity {
            id: new_id(),
            from_user_id: *sender_id,
            to_user_id: *recipient_id,
            status: FriendRequestStatus::Pending,
            created_at: chrono::Utc::now(),
        };
        requests.push(request.clone());
        Ok(request)
    }

    async fn respond(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
        status: FriendRequestStatus,
    ) -> Result<bool, error::SystemError> {
        let mut requests = self.requests.lock().unwrap();
        let found = requests.iter_mut().find(|r| {
            r.id == *request_id
                && r.to_user_id == *recipient_id
                && r.status == FriendRequestStatus::Pending
        });
        match found {
            Some(request) => {
                request.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let counterpart_ids: Vec<Uuid> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.status == FriendRequestStatus::Accepted
                    && (r.from_user_id == *user_id || r.to_user_id == *user_id)
            })
            .map(|r| if r.from_user_id == *user_id { r.to_user_id } else { r.from_user_id })
            .filter(|id| id != user_id)
            .collect();

        let mut friends: Vec<UserEntity> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| counterpart_ids.contains(&u.id))
            .cloned()
            .collect();
        friends.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(friends.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn count_friends(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.status == FriendRequestStatus::Accepted
                    && (r.from_user_id == *user_id || r.to_user_id == *user_id)
            })
            .count() as i64)
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PendingRequestRow>, error::SystemError> {
        let users = self.users.lock().unwrap();
        let mut pending: Vec<PendingRequestRow> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.to_user_id == *user_id && r.status == FriendRequestStatus::Pending)
            .filter_map(|r| {
                let sender = users.iter().find(|u| u.id == r.from_user_id)?;
                Some(PendingRequestRow {
                    req_id: r.id,
                    status: r.status,
                    created_at: r.created_at,
                    sender_id: sender.id,
                    sender_name: sender.name.clone(),
                    sender_email: sender.email.clone(),
                    sender_created_at: sender.created_at,
                })
            })
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn count_pending_to_user(&self, user_id: &Uuid) -> Result<i64, error::SystemError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.to_user_id == *user_id && r.status == FriendRequestStatus::Pending)
            .count() as i64)
    }
}

#[async_trait::async_trait]
impl TokenCache for MemStore {
    async fn get_token(&self, user_id: &Uuid) -> Result<Option<String>, error::SystemError> {
        Ok(self.tokens.lock().unwrap().get(user_id).cloned())
    }

    async fn store_token(
        &self,
        user_id: &Uuid,
        token: &str,
        _expiration: usize,
    ) -> Result<(), error::SystemError> {
        self.tokens.lock().unwrap().insert(*user_id, token.to_string());
        Ok(())
    }
}

fn services() -> (UserService, FriendService<MemStore, MemStore>, Arc<MemStore>) {
    setup_env();
    let store = Arc::new(MemStore::default());
    let user_service = UserService::with_dependencies(store.clone(), store.clone());
    let friend_service = FriendService::with_dependencies(store.clone(), store.clone());
    (user_service, friend_service, store)
}

async fn register(users: &UserService, name: &str, email: &str, password: &str) -> Uuid {
    users
        .sign_up(SignUpModel {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
        .await
        .unwrap()
}

fn login_model(email: &str, password: &str) -> LoginModel {
    LoginModel { email: email.to_string(), password: password.to_string() }
}

fn page() -> PageQuery {
    PageQuery::default()
}

#[tokio::test]
async fn signup_then_login_yields_token() {
    let (users, _, _) = services();
    register(&users, "Alice", "alice@x.com", "pw1").await;

    let token = users.login(login_model("alice@x.com", "pw1")).await.unwrap();
    assert!(!token.is_empty());

    // A second login within the token lifetime reuses the issued token.
    let again = users.login(login_model("alice@x.com", "pw1")).await.unwrap();
    assert_eq!(token, again);
}

#[tokio::test]
async fn signup_normalizes_and_rejects_duplicates_ignoring_case() {
    let (users, _, store) = services();
    register(&users, "  Alice  ", "Alice@X.com", "pw1").await;

    {
        let stored = store.users.lock().unwrap();
        assert_eq!(stored[0].name, "Alice");
        assert_eq!(stored[0].email, "alice@x.com");
    }

    let err = users
        .sign_up(SignUpModel {
            name: "Other".into(),
            email: "ALICE@x.COM".into(),
            password: "pw2".into(),
        })
        .await
        .unwrap_err();
    match err {
        error::SystemError::BadRequest(msg) => {
            assert_eq!(msg, "Email address is already in use")
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let (users, _, _) = services();
    let err = users
        .sign_up(SignUpModel { name: "   ".into(), email: "a@b.com".into(), password: "pw".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, error::SystemError::BadRequest(_)));
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let (users, _, _) = services();
    register(&users, "Alice", "A@B.com", "pw1").await;

    assert!(users.login(login_model("a@b.com", "pw1")).await.is_ok());
    assert!(users.login(login_model("A@B.COM", "pw1")).await.is_ok());
}

#[tokio::test]
async fn bad_credentials_answer_not_found_uniformly() {
    let (users, _, _) = services();
    register(&users, "Alice", "alice@x.com", "pw1").await;

    let wrong_password = users.login(login_model("alice@x.com", "nope")).await.unwrap_err();
    let unknown_email = users.login(login_model("ghost@x.com", "pw1")).await.unwrap_err();

    for err in [wrong_password, unknown_email] {
        match err {
            error::SystemError::NotFound(msg) => assert_eq!(msg, "Invalid Credentials"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn cannot_send_friend_request_to_self() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;

    let err = friends.send_friend_request(alice, "alice@x.com").await.unwrap_err();
    assert!(matches!(err, error::SystemError::BadRequest(_)));
}

#[tokio::test]
async fn send_to_unknown_user_is_not_found() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;

    let err = friends.send_friend_request(alice, "ghost@x.com").await.unwrap_err();
    assert!(matches!(err, error::SystemError::NotFound(_)));
}

#[tokio::test]
async fn target_email_lookup_is_case_insensitive() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    register(&users, "Bob", "bob@x.com", "pw2").await;

    assert!(friends.send_friend_request(alice, "BOB@X.COM").await.is_ok());
}

#[tokio::test]
async fn duplicate_and_reciprocal_requests_are_rejected() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    friends.send_friend_request(alice, "bob@x.com").await.unwrap();

    let duplicate = friends.send_friend_request(alice, "bob@x.com").await.unwrap_err();
    let reciprocal = friends.send_friend_request(bob, "alice@x.com").await.unwrap_err();

    for err in [duplicate, reciprocal] {
        match err {
            error::SystemError::BadRequest(msg) => {
                assert_eq!(msg, "Friend request already exists")
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn reciprocal_stays_blocked_after_response() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();
    friends.respond_friend_request(bob, request.id, "rejected").await.unwrap();

    // The rejected row still occupies the pair in both directions.
    assert!(friends.send_friend_request(bob, "alice@x.com").await.is_err());
    assert!(friends.send_friend_request(alice, "bob@x.com").await.is_err());
}

#[tokio::test]
async fn respond_rejects_invalid_status() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();

    for status in ["pending", "Accepted", "maybe", ""] {
        let err = friends.respond_friend_request(bob, request.id, status).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)), "status {status:?}");
    }
}

#[tokio::test]
async fn only_the_recipient_can_respond() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();

    // The sender responding to their own request finds nothing addressed to them.
    let err = friends.respond_friend_request(alice, request.id, "accepted").await.unwrap_err();
    assert!(matches!(err, error::SystemError::NotFound(_)));
}

#[tokio::test]
async fn respond_is_single_shot_and_checks_existence() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let missing = friends.respond_friend_request(bob, new_id(), "accepted").await.unwrap_err();
    assert!(matches!(missing, error::SystemError::NotFound(_)));

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();
    friends.respond_friend_request(bob, request.id, "accepted").await.unwrap();

    // No longer pending, so a second response finds nothing.
    let again = friends.respond_friend_request(bob, request.id, "rejected").await.unwrap_err();
    assert!(matches!(again, error::SystemError::NotFound(_)));
}

#[tokio::test]
async fn accepting_makes_both_sides_friends() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();
    friends.respond_friend_request(bob, request.id, "accepted").await.unwrap();

    let alices = friends.list_friends(alice, &page()).await.unwrap();
    assert_eq!(alices.count, 1);
    assert_eq!(alices.results[0].email, "bob@x.com");

    let bobs = friends.list_friends(bob, &page()).await.unwrap();
    assert_eq!(bobs.count, 1);
    assert_eq!(bobs.results[0].email, "alice@x.com");
}

#[tokio::test]
async fn rejection_creates_no_friendship() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();
    friends.respond_friend_request(bob, request.id, "rejected").await.unwrap();

    assert_eq!(friends.list_friends(alice, &page()).await.unwrap().count, 0);
    assert_eq!(friends.list_friends(bob, &page()).await.unwrap().count, 0);
}

#[tokio::test]
async fn pending_list_embeds_sender_and_shrinks_on_response() {
    let (users, friends, _) = services();
    let alice = register(&users, "Alice", "alice@x.com", "pw1").await;
    let bob = register(&users, "Bob", "bob@x.com", "pw2").await;

    let request = friends.send_friend_request(alice, "bob@x.com").await.unwrap();

    let pending = friends.list_pending_requests(bob, &page()).await.unwrap();
    assert_eq!(pending.count, 1);
    assert_eq!(pending.results[0].id, request.id);
    assert_eq!(pending.results[0].from_user.email, "alice@x.com");
    assert_eq!(pending.results[0].from_user.name, "Alice");

    // Nothing pending for the sender.
    assert_eq!(friends.list_pending_requests(alice, &page()).await.unwrap().count, 0);

    friends.respond_friend_request(bob, request.id, "accepted").await.unwrap();
    assert_eq!(friends.list_pending_requests(bob, &page()).await.unwrap().count, 0);
}

#[tokio::test]
async fn search_with_at_sign_is_exact_email_match() {
    let (users, _, _) = services();
    register(&users, "Alice", "alice@x.com", "pw1").await;

    match users.search("alice@x.com", &page()).await.unwrap() {
        SearchResult::Single(user) => assert_eq!(user.name, "Alice"),
        SearchResult::Page(_) => panic!("expected a single account"),
    }

    // The email path is case-sensitive, unlike login.
    let err = users.search("Alice@X.com", &page()).await.unwrap_err();
    assert!(matches!(err, error::SystemError::NotFound(_)));
}

#[tokio::test]
async fn search_by_name_is_substring_and_case_insensitive() {
    let (users, _, _) = services();
    register(&users, "Alice Smith", "alice@x.com", "pw1").await;
    register(&users, "Bob Smith", "bob@x.com", "pw2").await;
    register(&users, "Carol Jones", "carol@x.com", "pw3").await;

    match users.search("sMiTh", &page()).await.unwrap() {
        SearchResult::Page(page) => {
            assert_eq!(page.count, 2);
            let names: Vec<&str> = page.results.iter().map(|u| u.name.as_str()).collect();
            assert_eq!(names, ["Alice Smith", "Bob Smith"]);
        }
        SearchResult::Single(_) => panic!("expected a page"),
    }
}

#[tokio::test]
async fn search_pages_default_to_ten_results() {
    let (users, _, _) = services();
    for i in 0..12 {
        register(&users, &format!("Member {i:02}"), &format!("m{i}@x.com"), "pw").await;
    }

    let first = match users.search("Member", &page()).await.unwrap() {
        SearchResult::Page(p) => p,
        SearchResult::Single(_) => panic!("expected a page"),
    };
    assert_eq!(first.count, 12);
    assert_eq!(first.page_size, 10);
    assert_eq!(first.results.len(), 10);

    let second_query = PageQuery { page: Some(2), page_size: None };
    let second = match users.search("Member", &second_query).await.unwrap() {
        SearchResult::Page(p) => p,
        SearchResult::Single(_) => panic!("expected a page"),
    };
    assert_eq!(second.results.len(), 2);
    assert_eq!(second.results[0].name, "Member 10");
}
