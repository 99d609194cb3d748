use chutes_openai_proxy::client::{BrowserProfile, ChutesClient};
use chutes_openai_proxy::config::UpstreamConfig;
use chutes_openai_proxy::metrics::RetryMetrics;
use chutes_openai_proxy::models::chutes::ChutesRequest;
use chutes_openai_proxy::models::openai::{ChatMessage, ChatRequest};
use chutes_openai_proxy::provider::Upstream;
use chutes_openai_proxy::retry::{RetryController, RetryPolicy};
use chutes_openai_proxy::state::ClearanceStore;
use chutes_openai_proxy::streaming::{collect_completion, frames};
use chutes_openai_proxy::transform::transform_request;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use std::sync::Arc;
use std::time::Duration;

const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                        data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n\
                        data: [DONE]\n\n";

fn can_bind_localhost() -> bool {
    match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(_) => true,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping httpmock test: sandbox forbids binding to localhost");
            false
        }
        Err(err) => panic!("failed to bind localhost for httpmock tests: {err}"),
    }
}

fn upstream_config(base_url: String) -> UpstreamConfig {
    UpstreamConfig {
        base_url,
        connect_timeout_secs: 2,
        backoff_base_ms: 0,
        ..UpstreamConfig::default()
    }
}

fn envelope() -> ChutesRequest {
    let req = ChatRequest {
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: serde_json::json!("Hello"),
        }],
        model: "deepseek-ai/DeepSeek-R1".to_string(),
        stream: false,
    };
    transform_request(&req).unwrap()
}

#[tokio::test]
async fn test_refresh_reads_clearance_cookie() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .header("authorization", "Bearer tok|||stale");
            then.status(200)
                .header("set-cookie", "cf_clearance=fresh-123; Path=/; HttpOnly")
                .body("<html></html>");
        })
        .await;

    let client = ChutesClient::new(upstream_config(server.base_url()), Some("tok".into())).unwrap();
    let clearance = client.refresh_clearance(Some("stale")).await;

    mock.assert_async().await;
    assert_eq!(clearance.as_deref(), Some("fresh-123"));
}

#[tokio::test]
async fn test_refresh_without_cookie_is_none() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(403)
                .header("set-cookie", "__cf_bm=other; Path=/")
                .body("Just a moment...");
        })
        .await;

    let client = ChutesClient::new(upstream_config(server.base_url()), None).unwrap();
    assert!(client.refresh_clearance(None).await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_refresh_unreachable_host_is_none() {
    let port = match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(listener) => listener.local_addr().unwrap().port(),
        Err(_) => return,
    };

    let client =
        ChutesClient::new(upstream_config(format!("http://127.0.0.1:{}", port)), None).unwrap();
    assert!(client.refresh_clearance(Some("cf")).await.is_none());
}

#[tokio::test]
async fn test_post_carries_clearance_cookie_and_header() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/app/api/chat")
                .header("cookie", "cf_clearance=cf-value")
                .header("authorization", "Bearer tok|||cf-value")
                .header("content-type", "application/json")
                .header("accept-encoding", "gzip, deflate, br")
                .body_includes("\"chuteName\":\"chutes-deepseek-ai-deepseek-r1\"")
                .body_includes("\"createdOn\"");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(SSE_BODY);
        })
        .await;

    let client = ChutesClient::new(upstream_config(server.base_url()), Some("tok".into())).unwrap();
    let response = client.post_chat(&envelope(), Some("cf-value")).await.unwrap();
    assert!(response.status.is_success());

    let completion = collect_completion(frames(response.body), "deepseek-ai/DeepSeek-R1")
        .await
        .unwrap();
    assert_eq!(completion.content(), "Hi!");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_returns_challenge_status_as_ok() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/app/api/chat");
            then.status(403).body("challenge page");
        })
        .await;

    let client = ChutesClient::new(upstream_config(server.base_url()), None).unwrap();
    let response = client.post_chat(&envelope(), None).await.unwrap();

    assert_eq!(response.status.as_u16(), 403);
    assert_eq!(response.text().await, "challenge page");
}

#[tokio::test]
async fn test_chrome_profile_does_not_refresh() {
    let config = UpstreamConfig {
        profile: BrowserProfile::ChromeLinux,
        ..UpstreamConfig::default()
    };
    let client = ChutesClient::new(config, None).unwrap();
    assert!(!client.supports_refresh());
    assert_eq!(client.name(), "Chutes");
}

#[tokio::test]
async fn test_rejected_clearance_is_replaced_end_to_end() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/app/api/chat")
                .header("cookie", "cf_clearance=stale");
            then.status(403).body("challenge");
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .header("authorization", "Bearer stale");
            then.status(200)
                .header("set-cookie", "cf_clearance=fresh; Path=/");
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/app/api/chat")
                .header("cookie", "cf_clearance=fresh")
                .header("authorization", "Bearer fresh");
            then.status(200).body(SSE_BODY);
        })
        .await;

    let config = upstream_config(server.base_url());
    let policy = RetryPolicy::from(&config);
    let upstream = Arc::new(ChutesClient::new(config, None).unwrap());
    let store = ClearanceStore::with_value("stale");
    let metrics = Arc::new(RetryMetrics::new());
    let controller = RetryController::new(upstream, store.clone(), policy, metrics.clone());

    let response = tokio::time::timeout(Duration::from_secs(10), controller.send(&envelope()))
        .await
        .unwrap()
        .unwrap();

    assert!(response.status.is_success());
    assert_eq!(store.get().unwrap().as_str(), "fresh");
    rejected.assert_async().await;
    refresh.assert_async().await;
    accepted.assert_async().await;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.attempts, 2);
    assert_eq!(snapshot.challenge_rejections, 1);
    assert_eq!(snapshot.refreshes_succeeded, 1);
}
