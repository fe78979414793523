// Gate flow integration: submission, lockout, token lifetime, and
// durable storage across gate instances.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use sheetgate::crypto::{EphemeralKeyProvider, FixedKeyProvider};
use sheetgate::{GateSession, GateState, Navigation, TokenManager};
use sheetgate_core::logger::GateLogger;
use sheetgate_core::options::{GateOptions, GateRoute};
use sheetgate_core::storage::MemoryTokenStore;
use sheetgate_fs::FileTokenStore;

fn options() -> GateOptions {
    GateOptions {
        gate_id: "members".into(),
        password: Some("correct horse".into()),
        destination: "/members".into(),
        max_attempts: 3,
        ..Default::default()
    }
}

fn manager(store: Arc<dyn sheetgate_core::TokenStore>) -> TokenManager {
    TokenManager::new(store, Arc::new(FixedKeyProvider::from_bytes([5u8; 32])))
        .with_logger(GateLogger::silent())
}

#[tokio::test]
async fn full_flow_wrong_then_right() {
    let mut gate = GateSession::new(options(), manager(Arc::new(MemoryTokenStore::new())))
        .unwrap()
        .with_logger(GateLogger::silent());

    assert_eq!(*gate.state(), GateState::Idle);
    assert!(!gate.is_admitted("/members").await);

    gate.submit("wrong", None).await;
    assert!(matches!(gate.state(), GateState::Errored { .. }));
    assert_eq!(gate.attempts(), 1);

    let state = gate.submit("correct horse", None).await;
    assert_eq!(
        *state,
        GateState::Authenticated {
            destination: Navigation::Internal("/members".into())
        }
    );
    assert_eq!(gate.attempts(), 0);
    assert!(gate.is_admitted("/members").await);

    gate.logout("/members").await;
    assert!(!gate.is_admitted("/members").await);
}

#[tokio::test]
async fn lockout_blocks_even_correct_password() {
    let mut gate = GateSession::new(options(), manager(Arc::new(MemoryTokenStore::new())))
        .unwrap()
        .with_logger(GateLogger::silent());

    for guess in ["a", "b", "c"] {
        gate.submit(guess, None).await;
    }
    let locked = gate.state().clone();
    assert!(matches!(locked, GateState::LockedOut { .. }));

    let after = gate.submit("correct horse", None).await;
    assert_eq!(*after, locked);
    assert!(!gate.is_admitted("/members").await);
}

#[tokio::test]
async fn lockout_skips_remote_verification_entirely() {
    // A gate wired to an unreachable endpoint: any attempt that touched
    // the network would land in Errored. Inside the lockout window the
    // submission must be a pure no-op instead.
    let options = GateOptions {
        gate_id: "remote".into(),
        auth_endpoint: Some("http://127.0.0.1:9/auth".into()),
        max_attempts: 1,
        ..Default::default()
    };
    let mut gate = GateSession::new(options, manager(Arc::new(MemoryTokenStore::new())))
        .unwrap()
        .with_logger(GateLogger::silent());

    // First submission reaches the endpoint and fails as a network
    // fault, which does not consume an attempt.
    gate.submit("pw", None).await;
    assert!(matches!(gate.state(), GateState::Errored { .. }));
    assert_eq!(gate.attempts(), 0);

    // One authentication failure locks a max_attempts=1 gate; an empty
    // password fails before any hashing or network touch.
    gate.submit("", None).await;
    let locked = gate.state().clone();
    assert!(matches!(locked, GateState::LockedOut { .. }));

    let after = gate.submit("pw", None).await;
    assert_eq!(*after, locked);
}

#[tokio::test]
async fn tokens_survive_gate_teardown_via_durable_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    // The key must outlive the gate for the token to stay readable.
    let keys = Arc::new(EphemeralKeyProvider::new());

    {
        let manager = TokenManager::new(
            Arc::new(FileTokenStore::new(&path)),
            keys.clone(),
        )
        .with_logger(GateLogger::silent());
        let mut gate = GateSession::new(options(), manager)
            .unwrap()
            .with_logger(GateLogger::silent());
        gate.submit("correct horse", None).await;
        assert!(gate.is_admitted("/members").await);
        // Gate instance dropped here: attempt counters die with it.
    }

    let manager = TokenManager::new(Arc::new(FileTokenStore::new(&path)), keys)
        .with_logger(GateLogger::silent());
    assert!(manager.is_token_valid("/members").await);

    manager.clear_all_tokens().await;
    assert!(!manager.is_token_valid("/members").await);
}

#[tokio::test]
async fn key_regeneration_invalidates_durable_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    let writer = TokenManager::new(
        Arc::new(FileTokenStore::new(&path)),
        Arc::new(EphemeralKeyProvider::new()),
    )
    .with_logger(GateLogger::silent());
    writer
        .store_token("/members", "tok", Utc::now() + TimeDelta::minutes(5))
        .await
        .unwrap();

    // A fresh key provider simulates a process restart: the slot is
    // unreadable and gets cleared lazily.
    let reader = TokenManager::new(
        Arc::new(FileTokenStore::new(&path)),
        Arc::new(EphemeralKeyProvider::new()),
    )
    .with_logger(GateLogger::silent());
    assert_eq!(reader.get_token("/members").await, None);
}

#[tokio::test]
async fn routes_and_deep_links() {
    let options = GateOptions {
        gate_id: "doors".into(),
        routes: vec![
            GateRoute {
                password: "staff".into(),
                destination: "/staff".into(),
            },
            GateRoute {
                password: "guest".into(),
                destination: "https://example.com/guest".into(),
            },
        ],
        ..Default::default()
    };
    let mut gate = GateSession::new(options, manager(Arc::new(MemoryTokenStore::new())))
        .unwrap()
        .with_logger(GateLogger::silent());

    // A deep link wins over the matched route's destination.
    let state = gate
        .submit("staff", Some("https://host.example/doors?next=/annual-report"))
        .await;
    assert_eq!(
        *state,
        GateState::Authenticated {
            destination: Navigation::Internal("/annual-report".into())
        }
    );
    assert!(gate.is_admitted("/annual-report").await);

    // Without one, the route's own destination applies.
    let state = gate.submit("guest", None).await;
    assert_eq!(
        *state,
        GateState::Authenticated {
            destination: Navigation::External("https://example.com/guest".into())
        }
    );
}
