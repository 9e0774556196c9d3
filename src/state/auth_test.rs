use super::*;
use crate::state::storage::MemoryStore;
use crate::state::test_helpers::{admin_user, seed_snapshot, staff_less_user, test_session_store};

fn assert_consistent(store: &SessionStore) {
    let state = store.state();
    assert_eq!(state.is_authenticated(), state.user.is_some());
    assert_eq!(store.is_authenticated(), store.user().is_some());
}

fn has_snapshot(store: &MemoryStore) -> bool {
    store.contains(USER_KEY)
}

// =============================================================
// AuthError mapping
// =============================================================

#[test]
fn login_error_maps_rejections_to_authentication_failed() {
    assert!(matches!(login_error(ApiError::Unauthorized), AuthError::AuthenticationFailed(_)));
    let bad_request = ApiError::Status { status: 400, message: "bad".into() };
    assert_eq!(login_error(bad_request), AuthError::AuthenticationFailed("bad".into()));
    let forbidden = ApiError::Status { status: 403, message: "nope".into() };
    assert!(matches!(login_error(forbidden), AuthError::AuthenticationFailed(_)));
    let no_user = ApiError::Decode("response has no user".into());
    assert!(matches!(login_error(no_user), AuthError::AuthenticationFailed(_)));
}

#[test]
fn login_error_keeps_network_failures_distinct() {
    let err = login_error(ApiError::Network("connection refused".into()));
    assert_eq!(err, AuthError::Network("connection refused".into()));
}

#[test]
fn server_errors_map_to_invalid_response() {
    let err = AuthError::from(ApiError::Status { status: 500, message: "boom".into() });
    assert!(matches!(err, AuthError::InvalidResponse(ref m) if m.contains("500")));
}

// =============================================================
// AuthState
// =============================================================

#[test]
fn auth_state_default_is_signed_out() {
    let state = AuthState::default();
    assert!(!state.is_authenticated());
    assert!(!state.is_admin());
    assert!(!state.verifying);
}

#[test]
fn auth_state_admin_requires_staff() {
    let admin = AuthState { user: Some(admin_user()), verifying: false };
    let alice = AuthState { user: Some(staff_less_user()), verifying: false };
    assert!(admin.is_admin());
    assert!(alice.is_authenticated());
    assert!(!alice.is_admin());
}

// =============================================================
// login / logout
// =============================================================

#[tokio::test]
async fn login_success_sets_user_and_snapshot() {
    let (store, durable, gateway) = test_session_store();
    gateway.push_login(Ok(admin_user()));

    let user = store
        .login(&Credentials::new("admin", "pw"))
        .await
        .unwrap();

    assert_eq!(user, admin_user());
    assert_eq!(store.user(), Some(admin_user()));
    assert!(has_snapshot(&durable));
    assert_consistent(&store);
}

#[tokio::test]
async fn login_failure_leaves_state_unchanged() {
    let (store, durable, gateway) = test_session_store();
    gateway.push_login(Err(ApiError::Status { status: 400, message: "invalid credentials".into() }));

    let err = store
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthenticationFailed(_)));
    assert!(!store.is_authenticated());
    assert!(!has_snapshot(&durable));
    assert_consistent(&store);
}

#[tokio::test]
async fn login_failure_keeps_previous_user() {
    let (store, _durable, gateway) = test_session_store();
    gateway.push_login(Ok(staff_less_user()));
    gateway.push_login(Err(ApiError::Network("down".into())));
    store.login(&Credentials::new("alice", "pw")).await.unwrap();

    let err = store.login(&Credentials::new("admin", "pw")).await.unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(store.user(), Some(staff_less_user()));
}

#[tokio::test]
async fn logout_clears_user_and_snapshot() {
    let (store, durable, gateway) = test_session_store();
    gateway.push_login(Ok(admin_user()));
    store.login(&Credentials::new("admin", "pw")).await.unwrap();

    store.logout().await.unwrap();

    assert_eq!(store.user(), None);
    assert!(!has_snapshot(&durable));
    assert_consistent(&store);
}

#[tokio::test]
async fn logout_clears_locally_even_when_remote_fails() {
    let (store, durable, gateway) = test_session_store();
    gateway.push_login(Ok(admin_user()));
    gateway.push_logout(Err(ApiError::Network("timeout".into())));
    store.login(&Credentials::new("admin", "pw")).await.unwrap();

    let err = store.logout().await.unwrap_err();

    assert_eq!(err, AuthError::Network("timeout".into()));
    assert_eq!(store.user(), None);
    assert!(!has_snapshot(&durable));
}

// =============================================================
// init_auth
// =============================================================

#[tokio::test]
async fn init_without_snapshot_makes_no_remote_call() {
    let (store, _durable, gateway) = test_session_store();

    let outcome = store.init_auth().await;

    assert_eq!(outcome, InitOutcome::NoSnapshot);
    assert_eq!(gateway.current_user_calls(), 0);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn begin_init_restores_snapshot_synchronously() {
    let (store, durable, _gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());

    let Bootstrap::Pending(ticket) = store.session().begin_init() else {
        panic!("expected a verification ticket");
    };

    assert_eq!(store.user(), Some(admin_user()));
    assert!(store.state().verifying);
    drop(ticket);
    assert!(!store.state().verifying);
}

#[tokio::test]
async fn init_verified_overwrites_with_authoritative_record() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &staff_less_user());
    let mut promoted = staff_less_user();
    promoted.is_staff = true;
    gateway.push_current_user(Ok(promoted.clone()));

    let outcome = store.init_auth().await;

    assert_eq!(outcome, InitOutcome::Verified);
    assert_eq!(store.user(), Some(promoted.clone()));
    let persisted: UserRecord = load_json(&*durable, USER_KEY).unwrap();
    assert_eq!(persisted, promoted);
    assert_consistent(&store);
}

#[tokio::test]
async fn init_unauthorized_clears_user_and_snapshot() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Err(ApiError::Unauthorized));

    let outcome = store.init_auth().await;

    assert_eq!(outcome, InitOutcome::SignedOut);
    assert_eq!(store.user(), None);
    assert!(!has_snapshot(&durable));
    assert_eq!(gateway.logout_calls(), 1);
    assert_consistent(&store);
}

#[tokio::test]
async fn init_other_failure_keeps_optimistic_user() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Err(ApiError::Network("connection refused".into())));

    let outcome = store.init_auth().await;

    assert_eq!(outcome, InitOutcome::Provisional);
    assert_eq!(store.user(), Some(admin_user()));
    assert!(has_snapshot(&durable));
    assert!(!store.state().verifying);
}

#[tokio::test]
async fn init_server_error_keeps_optimistic_user() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Err(ApiError::Status { status: 502, message: "bad gateway".into() }));

    assert_eq!(store.init_auth().await, InitOutcome::Provisional);
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn init_with_corrupt_snapshot_treats_it_as_absent() {
    let (store, durable, gateway) = test_session_store();
    durable.save(USER_KEY, "{\"id\":").unwrap();

    let outcome = store.init_auth().await;

    assert_eq!(outcome, InitOutcome::NoSnapshot);
    assert!(!has_snapshot(&durable));
    assert_eq!(gateway.current_user_calls(), 0);
}

#[tokio::test]
async fn concurrent_init_is_deduplicated() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Ok(admin_user()));

    let Bootstrap::Pending(ticket) = store.session().begin_init() else {
        panic!("expected a verification ticket");
    };
    let second = store.init_auth().await;
    let first = store.finish_init(ticket).await;

    assert_eq!(second, InitOutcome::InFlight);
    assert_eq!(first, InitOutcome::Verified);
    assert_eq!(gateway.current_user_calls(), 1);
}

#[tokio::test]
async fn init_after_verification_can_verify_again() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Ok(admin_user()));
    gateway.push_current_user(Ok(admin_user()));

    assert_eq!(store.init_auth().await, InitOutcome::Verified);
    assert_eq!(store.init_auth().await, InitOutcome::Verified);
    assert_eq!(gateway.current_user_calls(), 2);
}

// =============================================================
// Interleavings
// =============================================================

#[tokio::test]
async fn logout_during_verification_wins_when_verification_finishes_last() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Ok(admin_user()));
    let release = gateway.gate_current_user();

    let Bootstrap::Pending(ticket) = store.session().begin_init() else {
        panic!("expected a verification ticket");
    };
    let verifier = store.clone();
    let task = tokio::spawn(async move { verifier.finish_init(ticket).await });

    store.logout().await.unwrap();
    release.send(()).unwrap();
    let outcome = task.await.unwrap();

    assert_eq!(outcome, InitOutcome::Superseded);
    assert_eq!(store.user(), None);
    assert!(!has_snapshot(&durable));
    assert_consistent(&store);
}

#[tokio::test]
async fn logout_after_verification_leaves_session_signed_out() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Ok(admin_user()));

    assert_eq!(store.init_auth().await, InitOutcome::Verified);
    store.logout().await.unwrap();

    assert_eq!(store.user(), None);
    assert!(!has_snapshot(&durable));
}

#[tokio::test]
async fn unauthorized_verification_does_not_clear_a_newer_login() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &staff_less_user());
    gateway.push_current_user(Err(ApiError::Unauthorized));
    gateway.push_login(Ok(admin_user()));

    let Bootstrap::Pending(ticket) = store.session().begin_init() else {
        panic!("expected a verification ticket");
    };
    store.login(&Credentials::new("admin", "pw")).await.unwrap();
    let outcome = store.finish_init(ticket).await;

    assert_eq!(outcome, InitOutcome::Superseded);
    assert_eq!(store.user(), Some(admin_user()));
    assert!(has_snapshot(&durable));
    assert_eq!(gateway.logout_calls(), 0);
}

#[tokio::test]
async fn dropped_ticket_releases_in_flight_slot() {
    let (store, durable, gateway) = test_session_store();
    seed_snapshot(&durable, &admin_user());
    gateway.push_current_user(Ok(admin_user()));

    match store.session().begin_init() {
        Bootstrap::Pending(ticket) => drop(ticket),
        Bootstrap::Settled(outcome) => panic!("unexpected {outcome:?}"),
    }

    assert_eq!(store.init_auth().await, InitOutcome::Verified);
}

#[test]
fn new_session_reads_nothing_until_init() {
    let durable = Arc::new(MemoryStore::new());
    seed_snapshot(&durable, &admin_user());
    let session = Session::new(durable);
    assert_eq!(session.user(), None);
    assert_eq!(session.epoch(), 0);
}

#[test]
fn transitions_bump_epoch() {
    let session = Session::new(Arc::new(MemoryStore::new()));
    session.sign_in(admin_user());
    assert_eq!(session.epoch(), 1);
    session.clear();
    assert_eq!(session.epoch(), 2);
}
