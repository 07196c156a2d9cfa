use repo_sync_github::{NewPullRequest, PullRequestClient, PullRequestError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> NewPullRequest<'static> {
    NewPullRequest {
        title: "Sync files from repositories",
        body: "Automated file sync",
        head: "sync/repo-files",
        base: "main",
    }
}

#[tokio::test]
async fn creates_pull_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/me/project/pulls"))
        .and(header("Authorization", "Bearer secret"))
        .and(body_json(serde_json::json!({
            "title": "Sync files from repositories",
            "body": "Automated file sync",
            "head": "sync/repo-files",
            "base": "main",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_raw(
            r#"{"html_url":"https://github.com/me/project/pull/7","number":7,"state":"open"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = PullRequestClient::new("secret", Some(server.uri()));
    let pr = client.create("me/project", &request()).await.unwrap();

    assert_eq!(pr.number, 7);
    assert_eq!(pr.html_url, "https://github.com/me/project/pull/7");
}

#[tokio::test]
async fn existing_pull_request_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/me/project/pulls"))
        .respond_with(ResponseTemplate::new(422).set_body_raw(
            r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","code":"custom","message":"A pull request already exists for me:sync/repo-files."}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = PullRequestClient::new("secret", Some(server.uri()));
    let result = client.create("me/project", &request()).await;

    assert!(matches!(
        result,
        Err(PullRequestError::AlreadyExists { head }) if head == "sync/repo-files"
    ));
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/me/project/pulls"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"message":"Resource not accessible by integration"}"#),
        )
        .mount(&server)
        .await;

    let client = PullRequestClient::new("secret", Some(server.uri()));
    let result = client.create("me/project", &request()).await;

    match result {
        Err(PullRequestError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Resource not accessible by integration");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
