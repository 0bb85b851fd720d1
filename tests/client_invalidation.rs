//! Authentication failures rebuild the shared client and retry exactly once.

mod common;

use async_trait::async_trait;
use common::mock_library::{MockLibrary, MockResponse};
use homedeck::config::SecureString;
use homedeck::covers::CoverError;
use homedeck::session::SessionSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const CANDIDATES: &[&str] = &["/cover/v2/{id}", "/cover/v1/{id}"];

/// Hands out "stale" on the first call and "fresh" afterwards.
#[derive(Default)]
struct RotatingSession {
    calls: AtomicUsize,
}

#[async_trait]
impl SessionSource for RotatingSession {
    async fn session(&self) -> Option<SecureString> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let token = if call == 0 { "stale" } else { "fresh" };
        Some(SecureString::new(token))
    }
}

#[tokio::test]
async fn test_second_auth_failure_surfaces_unauthorized() {
    let mock = MockLibrary::start().await;
    mock.route("/cover/v1/7", MockResponse::status(401)).await;
    let service = common::cover_service(&mock.base_url(), CANDIDATES);
    service.cache().record_success("7", 1);

    let err = service.get_cover("7").await.unwrap_err();

    assert!(matches!(
        err,
        CoverError::Authentication {
            after_retry: true,
            ..
        }
    ));
    assert_eq!(err.error_type(), "unauthorized");
    assert_eq!(err.status_code().as_u16(), 502);
    assert_eq!(service.registry().builds(), 2);
    assert_eq!(mock.captured_paths().await, vec!["/cover/v1/7", "/cover/v1/7"]);
    // Auth failures leave the cached path alone.
    assert_eq!(service.cache().entry("7").unwrap().failures, 0);
}

#[tokio::test]
async fn test_rebuilt_client_recovers_with_fresh_session() {
    let mock = MockLibrary::start().await;
    mock.enqueue("/cover/v1/7", MockResponse::status(401)).await;
    mock.route("/cover/v1/7", MockResponse::image(b"seven")).await;

    let session = Arc::new(RotatingSession::default());
    let config = common::library_config(&mock.base_url(), CANDIDATES);
    let service = common::cover_service_with(config, session.clone());
    service.cache().record_success("7", 1);

    let image = service.get_cover("7").await.unwrap();

    assert_eq!(&image.bytes[..], b"seven");
    assert_eq!(service.registry().builds(), 2);
    assert_eq!(session.calls.load(Ordering::SeqCst), 2);

    let auth: Vec<_> = mock
        .captured_requests()
        .await
        .into_iter()
        .map(|r| r.authorization)
        .collect();
    assert_eq!(
        auth,
        vec![
            Some("Bearer stale".to_string()),
            Some("Bearer fresh".to_string())
        ]
    );
}

#[tokio::test]
async fn test_concurrent_auth_failures_rebuild_once() {
    let mock = MockLibrary::start().await;
    mock.enqueue("/cover/v2/30", MockResponse::status(403).with_delay(100))
        .await;
    mock.route("/cover/v2/30", MockResponse::image(b"thirty")).await;
    let service = common::cover_service(&mock.base_url(), CANDIDATES);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.get_cover("30").await }));
    }
    for handle in handles {
        let image = handle.await.unwrap().unwrap();
        assert_eq!(&image.bytes[..], b"thirty");
    }

    assert_eq!(service.registry().builds(), 2);
}

#[tokio::test]
async fn test_not_found_never_invalidates_client() {
    let mock = MockLibrary::start().await;
    let service = common::cover_service(&mock.base_url(), CANDIDATES);

    for _ in 0..3 {
        let err = service.get_cover("nope").await.unwrap_err();
        assert!(matches!(err, CoverError::NotFound { .. }));
    }
    assert_eq!(service.registry().builds(), 1);
    assert_eq!(service.registry().current_generation(), Some(1));
}

#[tokio::test]
async fn test_rejected_handshake_is_unauthorized_without_cover_requests() {
    let mock = MockLibrary::start().await;
    mock.route("/ajax/library-info", MockResponse::status(401)).await;
    let mut config = common::library_config(&mock.base_url(), CANDIDATES);
    config.library.handshake_path = Some("/ajax/library-info".to_string());
    config.library.username = Some("reader".to_string());
    config.library.password = Some("wrong".to_string());
    let service = common::cover_service_with(config, Arc::new(homedeck::session::StaticSession::none()));

    let err = service.get_cover("1").await.unwrap_err();

    assert!(matches!(
        err,
        CoverError::Authentication {
            after_retry: false,
            ..
        }
    ));
    assert_eq!(err.status_code().as_u16(), 401);
    assert_eq!(mock.captured_paths().await, vec!["/ajax/library-info"]);
    assert_eq!(service.registry().current_generation(), None);

    let requests = mock.captured_requests().await;
    let header = requests[0].authorization.as_deref().unwrap();
    assert!(header.starts_with("Basic "));
}

#[tokio::test]
async fn test_successful_handshake_then_covers() {
    let mock = MockLibrary::start().await;
    mock.route("/ajax/library-info", MockResponse::status(200)).await;
    mock.route("/cover/v2/2", MockResponse::image(b"two")).await;
    let mut config = common::library_config(&mock.base_url(), CANDIDATES);
    config.library.handshake_path = Some("/ajax/library-info".to_string());
    let service = common::cover_service_with(config, Arc::new(homedeck::session::StaticSession::none()));

    service.get_cover("2").await.unwrap();
    service.get_cover("2").await.unwrap();

    assert_eq!(mock.hits("/ajax/library-info").await, 1);
    assert_eq!(mock.hits("/cover/v2/2").await, 2);
}

#[tokio::test]
async fn test_unreachable_handshake_is_connectivity_error() {
    let base_url = format!("http://127.0.0.1:{}", common::free_port());
    let mut config = common::library_config(&base_url, CANDIDATES);
    config.library.handshake_path = Some("/ajax/library-info".to_string());
    let service = common::cover_service_with(config, Arc::new(homedeck::session::StaticSession::none()));

    let err = service.get_cover("1").await.unwrap_err();
    assert!(matches!(err, CoverError::Connectivity { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_joined_stale_request_does_not_discard_fresh_client() {
    let mock = MockLibrary::start().await;
    mock.enqueue("/c/b", MockResponse::status(401).with_delay(300))
        .await;
    mock.route("/c/b", MockResponse::image(b"bee")).await;
    mock.enqueue("/c/z", MockResponse::status(401)).await;
    mock.route("/c/z", MockResponse::image(b"zed")).await;
    let service = common::cover_service(&mock.base_url(), &["/c/{id}"]);

    // First request for "b" starts a slow lookup on generation 1.
    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.get_cover("b").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // "z" is rejected on generation 1 and recovers on generation 2.
    let z = service.get_cover("z").await.unwrap();
    assert_eq!(&z.bytes[..], b"zed");
    assert_eq!(service.registry().current_generation(), Some(2));

    // Second request for "b" holds generation 2 but joins the generation 1 lookup.
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.get_cover("b").await })
    };

    for handle in [first, second] {
        let image = handle.await.unwrap().unwrap();
        assert_eq!(&image.bytes[..], b"bee");
    }
    assert_eq!(service.registry().builds(), 2);
    assert_eq!(service.registry().current_generation(), Some(2));
}
