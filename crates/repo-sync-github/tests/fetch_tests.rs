use std::time::Duration;

use base64::Engine;
use repo_sync::{FetchError, Fetcher};
use repo_sync_github::{GitHubFetcher, GitHubFetcherConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, token: Option<&str>) -> GitHubFetcherConfig {
    GitHubFetcherConfig {
        token: token.map(str::to_owned),
        timeout: Duration::from_secs(5),
        raw_base_url: Some(server.uri()),
        api_base_url: Some(server.uri()),
    }
}

fn contents_body(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    // GitHub wraps the encoded payload at 60 characters
    let wrapped: Vec<String> = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect();
    serde_json::json!({
        "name": "file",
        "path": "file",
        "content": wrapped.join("\n"),
        "encoding": "base64",
    })
    .to_string()
}

#[tokio::test]
async fn fetch_from_raw_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, None));
    let content = fetcher.fetch("test/repo", "main", "README.md").await.unwrap();

    assert_eq!(content, b"# Hello");
}

#[tokio::test]
async fn raw_request_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/README.md"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("public"))
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let content = fetcher.fetch("test/repo", "main", "README.md").await.unwrap();

    assert_eq!(content, b"public");
}

#[tokio::test]
async fn falls_back_to_contents_api_with_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/v1.0/private.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/private.txt"))
        .and(query_param("ref", "v1.0"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(contents_body(b"private content"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let content = fetcher.fetch("test/repo", "v1.0", "private.txt").await.unwrap();

    assert_eq!(content, b"private content");
}

#[tokio::test]
async fn contents_api_decodes_long_binary_payloads() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

    Mock::given(method("GET"))
        .and(path("/test/repo/main/blob.bin"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/blob.bin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(contents_body(&payload), "application/json"),
        )
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let content = fetcher.fetch("test/repo", "main", "blob.bin").await.unwrap();

    assert_eq!(content, payload);
}

#[tokio::test]
async fn no_token_means_no_api_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/missing.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, None));
    let result = fetcher.fetch("test/repo", "main", "missing.txt").await;

    match result {
        Err(FetchError::NotFound { id, reason }) => {
            assert_eq!(id, "test/repo:main:missing.txt");
            assert!(reason.contains("404"), "reason was: {reason}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn both_paths_failing_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/gone.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/gone.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let result = fetcher.fetch("test/repo", "main", "gone.txt").await;

    match result {
        Err(FetchError::NotFound { id, reason }) => {
            assert_eq!(id, "test/repo:main:gone.txt");
            assert!(reason.contains("contents API"), "reason was: {reason}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_encoding_falls_through_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/big.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/big.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"content":"","encoding":"none"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let result = fetcher.fetch("test/repo", "main", "big.txt").await;

    match result {
        Err(FetchError::NotFound { reason, .. }) => {
            assert!(reason.contains("unexpected encoding"), "reason was: {reason}");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_falls_through_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/odd.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/test/repo/contents/odd.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, Some("secret")));
    let result = fetcher.fetch("test/repo", "main", "odd.txt").await;

    assert!(matches!(result, Err(FetchError::NotFound { .. })));
}

#[tokio::test]
async fn path_with_spaces_is_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/docs/my%20file.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("spaced"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, None));
    let content = fetcher
        .fetch("test/repo", "main", "docs/my file.md")
        .await
        .unwrap();

    assert_eq!(content, b"spaced");
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test/repo/main/slow.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(GitHubFetcherConfig {
        timeout: Duration::from_millis(200),
        ..config_for(&server, None)
    });
    let result = fetcher.fetch("test/repo", "main", "slow.txt").await;

    assert!(matches!(result, Err(FetchError::NotFound { .. })));
}

#[tokio::test]
async fn connection_check_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actions/checkout/main/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# checkout"))
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, None));
    assert!(fetcher.check_connection().await);
}

#[tokio::test]
async fn connection_check_fails_on_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actions/checkout/main/README.md"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = GitHubFetcher::new(config_for(&server, None));
    assert!(!fetcher.check_connection().await);
}
