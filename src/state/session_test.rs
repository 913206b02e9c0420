use super::*;
use crate::config::StorageKeys;
use crate::net::gateway::UnauthorizedHook;
use crate::net::transport::TransportError;
use crate::test_support::{NOW, ScriptedTransport, gateway, json_response, live_token, token_for};
use crate::util::storage::{KeyValueStore, MemoryStorage};
use futures::executor::block_on;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

// =============================================================
// Helpers
// =============================================================

struct Harness {
    manager: SessionManager,
    backend: Arc<MemoryStorage>,
    navigations: Arc<Mutex<Vec<String>>>,
    now: Arc<AtomicI64>,
}

fn harness() -> Harness {
    let backend = Arc::new(MemoryStorage::new());
    let navigations = Arc::new(Mutex::new(Vec::new()));
    let now = Arc::new(AtomicI64::new(NOW));

    let nav_sink = Arc::clone(&navigations);
    let navigator: Navigator = Arc::new(move |path: &str| nav_sink.lock().unwrap().push(path.to_owned()));
    let clock_source = Arc::clone(&now);
    let clock: Clock = Arc::new(move || clock_source.load(Ordering::SeqCst));

    let store = TokenStore::new(backend.clone(), StorageKeys::default());
    let manager = SessionManager::with_clock(store, navigator, clock);
    Harness { manager, backend, navigations, now }
}

fn wired_gateway(h: &Harness, transport: &ScriptedTransport) -> Gateway<ScriptedTransport> {
    let manager = h.manager.clone();
    let hook: UnauthorizedHook = Arc::new(move |token: &str| {
        manager.expire(token);
    });
    gateway(transport).with_credentials(Arc::new(h.manager.clone())).with_unauthorized_hook(hook)
}

fn persist(h: &Harness, token: &str, user: &serde_json::Value) {
    h.backend.set("token", token).unwrap();
    h.backend.set("userInfo", &user.to_string()).unwrap();
}

fn credentials() -> LoginRequest {
    LoginRequest { username: "alice".to_owned(), password: "secret".to_owned() }
}

fn sign_in(h: &Harness, role: &str) -> String {
    let token = live_token("alice", role);
    persist(h, &token, &json!({"id": 7, "username": "alice", "role": role}));
    h.manager.initialize();
    token
}

fn assert_storage_empty(h: &Harness) {
    assert_eq!(h.backend.get("token"), None);
    assert_eq!(h.backend.get("userInfo"), None);
}

// =============================================================
// initialize
// =============================================================

#[test]
fn initialize_without_token_is_anonymous() {
    let h = harness();
    h.manager.initialize();
    assert_eq!(h.manager.current(), Session::Anonymous);
}

#[test]
fn initialize_restores_valid_session() {
    let h = harness();
    let token = sign_in(&h, "USER");

    let session = h.manager.current();
    assert!(session.is_authenticated());
    assert_eq!(session.token(), Some(token.as_str()));
    assert_eq!(session.user().unwrap().username, "alice");
    assert_eq!(h.manager.role(), Some(Role::User));
}

#[test]
fn initialize_takes_role_from_claims_over_stored_user() {
    let h = harness();
    let token = live_token("alice", "USER");
    persist(&h, &token, &json!({"username": "alice", "role": "ADMIN"}));

    h.manager.initialize();

    assert_eq!(h.manager.role(), Some(Role::User));
}

#[test]
fn initialize_clears_malformed_token() {
    let h = harness();
    persist(&h, "not-a-jwt", &json!({"username": "alice"}));

    h.manager.initialize();

    assert_eq!(h.manager.current(), Session::Anonymous);
    assert_storage_empty(&h);
}

#[test]
fn initialize_clears_expired_token() {
    let h = harness();
    persist(&h, &token_for("alice", "USER", NOW - 1), &json!({"username": "alice"}));

    h.manager.initialize();

    assert!(!h.manager.current().is_authenticated());
    assert_storage_empty(&h);
}

#[test]
fn initialize_derives_missing_user_from_claims() {
    let h = harness();
    h.backend.set("token", &live_token("bob", "ADMIN")).unwrap();

    h.manager.initialize();

    let user = h.manager.user().unwrap();
    assert_eq!(user.username, "bob");
    assert_eq!(user.id.as_deref(), Some("7"));
    assert_eq!(user.role, Role::Admin);
    assert!(h.backend.get("userInfo").is_some());
}

#[test]
fn initialize_does_not_navigate() {
    let h = harness();
    persist(&h, "bad", &json!({}));
    h.manager.initialize();
    assert!(h.navigations.lock().unwrap().is_empty());
}

#[test]
fn subscribe_receives_current_and_later_sessions() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.manager.subscribe(Arc::new(move |s: &Session| sink.lock().unwrap().push(s.is_authenticated())));

    sign_in(&h, "USER");

    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

// =============================================================
// login
// =============================================================

#[test]
fn login_persists_token_and_user() {
    let h = harness();
    let token = live_token("alice", "USER");
    let transport = ScriptedTransport::new(vec![json_response(
        200,
        &json!({"code": "0000", "data": {"token": token, "user": {"id": 1, "username": "alice", "role": "USER"}}}),
    )]);
    let gw = wired_gateway(&h, &transport);

    let session = block_on(h.manager.login(&gw, &credentials())).unwrap();

    assert!(session.is_authenticated());
    assert_eq!(h.backend.get("token"), Some(token));
    assert_eq!(h.manager.user().unwrap().id.as_deref(), Some("1"));
    let request = &transport.requests()[0];
    assert_eq!(request.url, "http://localhost:8080/api/auth/login");
    assert_eq!(request.header("Authorization"), None);
}

#[test]
fn login_without_user_derives_identity_from_claims() {
    let h = harness();
    let token = live_token("alice", "ADMIN");
    let transport = ScriptedTransport::new(vec![json_response(200, &json!({"success": true, "data": {"token": token}}))]);

    let session = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap();

    assert_eq!(session.role(), Some(Role::Admin));
    assert_eq!(session.user().unwrap().username, "alice");
}

#[test]
fn login_rejected_keeps_previous_session() {
    let h = harness();
    let previous = sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![json_response(401, &json!({"message": "bad"}))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials(_)));
    assert_eq!(h.manager.token(), Some(previous.clone()));
    assert_eq!(h.backend.get("token"), Some(previous));
    assert!(h.navigations.lock().unwrap().is_empty());
}

#[test]
fn login_application_failure_surfaces_backend_message() {
    let h = harness();
    let transport =
        ScriptedTransport::new(vec![json_response(200, &json!({"code": "2001", "message": "Wrong password"}))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials("Wrong password".to_owned()));
}

#[test]
fn login_network_failure_reports_network() {
    let h = harness();
    let transport = ScriptedTransport::new(vec![Err(TransportError::Timeout(30_000))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert!(!h.manager.current().is_authenticated());
}

#[test]
fn login_server_error_reports_server() {
    let h = harness();
    let transport = ScriptedTransport::new(vec![json_response(500, &json!({}))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert_eq!(err, AuthError::Server("Internal server error".to_owned()));
}

#[test]
fn login_with_expired_token_is_rejected() {
    let h = harness();
    let stale = token_for("alice", "USER", NOW - 5);
    let transport = ScriptedTransport::new(vec![json_response(200, &json!({"success": true, "data": {"token": stale}}))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert!(matches!(err, AuthError::InvalidToken(_)));
    assert_storage_empty(&h);
}

#[test]
fn login_without_token_is_rejected() {
    let h = harness();
    let transport = ScriptedTransport::new(vec![json_response(200, &json!({"success": true, "data": {"user": {}}}))]);

    let err = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials())).unwrap_err();

    assert!(matches!(err, AuthError::InvalidToken(_)));
}

#[test]
fn login_storage_failure_restores_previous_pair() {
    let h = harness();
    let previous = sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![json_response(
        200,
        &json!({"success": true, "data": {"token": live_token("mallory", "ADMIN")}}),
    )]);
    h.backend.reject_writes_to("userInfo");

    let result = block_on(h.manager.login(&wired_gateway(&h, &transport), &credentials()));
    h.backend.accept_all_writes();

    assert!(matches!(result, Err(AuthError::Storage(_))));
    assert_eq!(h.manager.token(), Some(previous));
    assert_eq!(h.manager.user().unwrap().username, "alice");
}

// =============================================================
// logout
// =============================================================

#[test]
fn logout_clears_even_when_backend_fails() {
    let h = harness();
    sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![Err(TransportError::Unreachable("offline".to_owned()))]);

    block_on(h.manager.logout(&wired_gateway(&h, &transport)));

    assert_eq!(h.manager.current(), Session::Anonymous);
    assert_storage_empty(&h);
    assert_eq!(*h.navigations.lock().unwrap(), vec!["/auth".to_owned()]);
}

#[test]
fn logout_notifies_backend_with_credentials() {
    let h = harness();
    let token = sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![json_response(200, &json!({"success": true}))]);

    block_on(h.manager.logout(&wired_gateway(&h, &transport)));

    let request = &transport.requests()[0];
    assert_eq!(request.url, "http://localhost:8080/api/auth/logout");
    assert_eq!(request.header("Authorization"), Some(format!("Bearer {token}").as_str()));
    assert_storage_empty(&h);
}

#[test]
fn logout_when_signed_out_skips_backend() {
    let h = harness();
    let transport = ScriptedTransport::new(vec![]);

    block_on(h.manager.logout(&wired_gateway(&h, &transport)));

    assert!(transport.requests().is_empty());
    assert_eq!(*h.navigations.lock().unwrap(), vec!["/auth".to_owned()]);
}

// =============================================================
// Expiry and 401
// =============================================================

#[test]
fn concurrent_unauthorized_responses_clear_session_once() {
    let h = harness();
    let token = sign_in(&h, "USER");
    let cleared = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&cleared);
    h.manager.subscribe(Arc::new(move |s: &Session| {
        if !s.is_authenticated() {
            *counter.lock().unwrap() += 1;
        }
    }));
    let transport =
        ScriptedTransport::yielding(vec![json_response(401, &json!({})), json_response(401, &json!({}))]);
    let gw = wired_gateway(&h, &transport);

    let (a, b) = block_on(futures::future::join(
        gw.get("/api/question/history", &[]),
        gw.get("/api/question/stats", &[]),
    ));

    assert!(!a.success && !b.success);
    let bearer = format!("Bearer {token}");
    let sent: Vec<Option<String>> =
        transport.requests().iter().map(|r| r.header("Authorization").map(str::to_owned)).collect();
    assert_eq!(sent, vec![Some(bearer.clone()), Some(bearer)]);
    assert_eq!(*cleared.lock().unwrap(), 1);
    assert_eq!(*h.navigations.lock().unwrap(), vec!["/auth".to_owned()]);
    assert_storage_empty(&h);
}

#[test]
fn expire_ignores_tokens_that_are_no_longer_current() {
    let h = harness();
    sign_in(&h, "USER");

    assert!(!h.manager.expire("some.other.token"));
    assert!(h.manager.current().is_authenticated());
}

#[test]
fn expire_if_stale_clears_after_clock_passes_exp() {
    let h = harness();
    sign_in(&h, "USER");
    assert!(!h.manager.expire_if_stale());

    h.now.store(NOW + 7200, Ordering::SeqCst);

    assert!(h.manager.expire_if_stale());
    assert!(!h.manager.current().is_authenticated());
    assert_storage_empty(&h);
}

#[test]
fn credential_reports_expired_token() {
    let h = harness();
    let token = sign_in(&h, "USER");
    assert_eq!(h.manager.credential(), Some(Credential::Bearer(token.clone())));

    h.now.store(NOW + 7200, Ordering::SeqCst);

    assert_eq!(h.manager.credential(), Some(Credential::Expired(token)));
}

#[test]
fn request_with_locally_expired_token_signs_out_without_network() {
    let h = harness();
    sign_in(&h, "USER");
    h.now.store(NOW + 7200, Ordering::SeqCst);
    let transport = ScriptedTransport::new(vec![]);

    let resp = block_on(wired_gateway(&h, &transport).get("/api/question/history", &[]));

    assert!(!resp.success);
    assert!(transport.requests().is_empty());
    assert!(!h.manager.current().is_authenticated());
}

// =============================================================
// update_user
// =============================================================

#[test]
fn update_user_rewrites_identity_and_keeps_token() {
    let h = harness();
    let token = sign_in(&h, "USER");
    let dto = UserDto {
        id: None,
        username: "alice2".to_owned(),
        email: Some("a@b.c".to_owned()),
        role: Some(Role::Admin),
        create_at: None,
        enabled: Some(true),
    };

    h.manager.update_user(&dto).unwrap();

    let user = h.manager.user().unwrap();
    assert_eq!(user.username, "alice2");
    assert_eq!(user.id.as_deref(), Some("7"));
    // Claims win over the record.
    assert_eq!(user.role, Role::User);
    assert_eq!(h.manager.token(), Some(token));
    assert!(h.backend.get("userInfo").unwrap().contains("alice2"));
}

#[test]
fn update_user_when_signed_out_is_noop() {
    let h = harness();
    let dto = UserDto {
        id: None,
        username: "ghost".to_owned(),
        email: None,
        role: None,
        create_at: None,
        enabled: None,
    };
    assert!(h.manager.update_user(&dto).is_ok());
    assert_eq!(h.backend.get("userInfo"), None);
}

// =============================================================
// revalidate
// =============================================================

#[test]
fn revalidate_signs_out_when_backend_rejects_session() {
    let h = harness();
    sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![json_response(
        200,
        &json!({"success": true, "data": {"authenticated": false, "sessionValid": false}}),
    )]);

    block_on(h.manager.revalidate(&wired_gateway(&h, &transport)));

    assert!(!h.manager.current().is_authenticated());
    assert_eq!(*h.navigations.lock().unwrap(), vec!["/auth".to_owned()]);
    assert_storage_empty(&h);
    // No identity refresh after signing out.
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn revalidate_refreshes_user_when_session_is_accepted() {
    let h = harness();
    let token = sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![
        json_response(200, &json!({"success": true, "data": {"authenticated": true, "sessionValid": true}})),
        json_response(200, &json!({"code": "0000", "data": {"id": 7, "username": "alice.w", "role": "USER"}})),
    ]);

    block_on(h.manager.revalidate(&wired_gateway(&h, &transport)));

    let paths: Vec<String> = transport.requests().iter().map(|r| r.url.clone()).collect();
    assert!(paths[0].ends_with("/api/auth/check"));
    assert!(paths[1].ends_with("/api/auth/current"));
    assert_eq!(h.manager.token(), Some(token));
    assert_eq!(h.manager.user().unwrap().username, "alice.w");
    assert!(h.navigations.lock().unwrap().is_empty());
}

#[test]
fn revalidate_keeps_session_when_check_is_unavailable() {
    let h = harness();
    sign_in(&h, "USER");
    let transport = ScriptedTransport::new(vec![
        json_response(404, &json!({})),
        Err(TransportError::Unreachable("offline".to_owned())),
    ]);

    block_on(h.manager.revalidate(&wired_gateway(&h, &transport)));

    assert!(h.manager.current().is_authenticated());
    assert_eq!(h.manager.user().unwrap().username, "alice");
    assert_eq!(transport.requests().len(), 2);
}

#[test]
fn revalidate_when_signed_out_sends_nothing() {
    let h = harness();
    let transport = ScriptedTransport::new(vec![]);

    block_on(h.manager.revalidate(&wired_gateway(&h, &transport)));

    assert!(transport.requests().is_empty());
}
