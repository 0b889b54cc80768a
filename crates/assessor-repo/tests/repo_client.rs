//! Integration tests for RepoClient and RepoSummarizer.
//!
//! Uses wiremock for HTTP mocking. Tests cover status mapping (401/403/404/429/5xx),
//! retry behavior, base64 content decoding, and the byte/file caps of a summary.

use assessor_repo::{
    RepoClient, RepoConfig, RepoError, RepoLimits, RepoRef, RepoSummarizer, REPO_USER_AGENT,
};
use base64::Engine as _;
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn b64(s: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(s)
}

fn test_config(mock_server: &MockServer) -> RepoConfig {
    RepoConfig::default()
        .with_url(mock_server.uri())
        .with_max_retries(0)
}

fn test_client(mock_server: &MockServer) -> RepoClient {
    RepoClient::new(test_config(mock_server)).expect("failed to create client")
}

fn repo() -> RepoRef {
    RepoRef::parse("https://github.com/octo/calc").unwrap()
}

async fn mount_content(mock_server: &MockServer, file_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/octo/calc/contents/{}", file_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": file_path,
            "size": body.len(),
            "content": b64(body),
            "encoding": "base64"
        })))
        .mount(mock_server)
        .await;
}

async fn mount_repository(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "calc",
            "full_name": "octo/calc",
            "description": "A tiny calculator",
            "default_branch": "main",
            "private": false
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Python": 900,
            "Shell": 100
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc",
            "truncated": false,
            "tree": [
                {"path": "README.md", "type": "blob", "size": 30},
                {"path": "calc", "type": "tree"},
                {"path": "calc/calculator.py", "type": "blob", "size": 40},
                {"path": "calc/util.py", "type": "blob", "size": 20},
                {"path": "logo.png", "type": "blob", "size": 5000},
                {"path": "tests", "type": "tree"},
                {"path": "tests/test_calc.py", "type": "blob", "size": 30},
                {"path": "huge.py", "type": "blob", "size": 900000}
            ]
        })))
        .mount(mock_server)
        .await;

    mount_content(mock_server, "README.md", "# Calc\nAdds and subtracts numbers.").await;
    mount_content(
        mock_server,
        "calc/calculator.py",
        "def add(a, b):\n    return a + b  # calculator core",
    )
    .await;
    mount_content(mock_server, "calc/util.py", "def noop():\n    pass").await;
    mount_content(
        mock_server,
        "tests/test_calc.py",
        "from calc.calculator import add",
    )
    .await;
}

#[tokio::test]
async fn test_get_repository_sends_user_agent_and_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .and(header("user-agent", REPO_USER_AGENT))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "calc",
            "default_branch": "trunk"
        })))
        .mount(&mock_server)
        .await;

    let client = RepoClient::new(test_config(&mock_server).with_token("test-token")).unwrap();
    let meta = client.get_repository(&repo()).await.expect("metadata");
    assert_eq!(meta.default_branch, "trunk");
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = test_client(&mock_server).get_repository(&repo()).await;
    match result {
        Err(RepoError::NotFound { owner, name }) => {
            assert_eq!(owner, "octo");
            assert_eq!(name, "calc");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forbidden_is_private_unless_rate_limit_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc/languages"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "1"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert!(matches!(
        client.get_repository(&repo()).await,
        Err(RepoError::Unauthorized { .. })
    ));
    assert!(matches!(
        client.get_languages(&repo()).await,
        Err(RepoError::RateLimited { .. })
    ));
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "calc"})))
        .mount(&mock_server)
        .await;

    let client = RepoClient::new(test_config(&mock_server).with_max_retries(1)).unwrap();
    let meta = client.get_repository(&repo()).await.expect("retry succeeds");
    assert_eq!(meta.name, "calc");
    assert_eq!(meta.default_branch, "main");
}

#[tokio::test]
async fn test_server_error_without_retries_is_network_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .get_repository(&repo())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("HTTP 500"));
}

#[tokio::test]
async fn test_file_content_decodes_base64() {
    let mock_server = MockServer::start().await;
    mount_content(&mock_server, "calc/util.py", "def noop():\n    pass").await;

    let text = test_client(&mock_server)
        .get_file_content(&repo(), "calc/util.py", "main")
        .await
        .expect("content");
    assert_eq!(text, "def noop():\n    pass");
}

#[tokio::test]
async fn test_summarize_ranks_and_flags() {
    let mock_server = MockServer::start().await;
    mount_repository(&mock_server).await;

    let summarizer = RepoSummarizer::new(test_client(&mock_server));
    let summary = summarizer
        .summarize(&repo(), &["calculator".to_string()])
        .await
        .expect("summary");

    assert_eq!(summary.full_name(), "octo/calc");
    assert_eq!(summary.file_count, 6);
    // README is fetched for the excerpt; png and oversized files are skipped.
    assert_eq!(summary.analyzed_file_count, 3);
    assert!(summary.has_readme);
    assert!(summary.has_tests);
    assert!(!summary.has_documentation);
    assert_eq!(summary.languages.get("Python"), Some(&900));
    assert_eq!(
        summary.readme_excerpt.as_deref(),
        Some("# Calc\nAdds and subtracts numbers.")
    );

    let first = &summary.selected_files[0];
    assert_eq!(first.path, "calc/calculator.py");

    let digest = summary.render_digest();
    assert!(digest.contains("Repository: octo/calc"));
    assert!(digest.contains("Python 90.0%"));
    assert!(digest.contains("- Tests present: yes"));
    assert!(!digest.contains("--- huge.py ---"));
}

#[tokio::test]
async fn test_summarize_respects_total_byte_cap() {
    let mock_server = MockServer::start().await;
    mount_repository(&mock_server).await;

    let limits = RepoLimits {
        // README (30) + calculator.py (40) fit; util.py (20) does not.
        max_total_bytes: 75,
        ..Default::default()
    };
    let client = RepoClient::new(test_config(&mock_server).with_limits(limits)).unwrap();
    let summary = RepoSummarizer::new(client)
        .summarize(&repo(), &[])
        .await
        .expect("summary");

    assert_eq!(summary.analyzed_file_count, 1);
    assert_eq!(summary.selected_files.len(), 1);
    assert_eq!(summary.selected_files[0].path, "calc/calculator.py");
}

#[tokio::test]
async fn test_summarize_fetches_keyword_paths_before_file_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "calc",
            "default_branch": "main"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/calc/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Python": 100})))
        .mount(&mock_server)
        .await;

    let mut tree: Vec<serde_json::Value> = (0..30)
        .map(|i| json!({"path": format!("docs/page{:02}.md", i), "type": "blob", "size": 10}))
        .collect();
    tree.push(json!({"path": "src/calculator.py", "type": "blob", "size": 30}));
    Mock::given(method("GET"))
        .and(path("/repos/octo/calc/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tree": tree})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/octo/calc/contents/docs/page\d+\.md$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "docs/page.md",
            "size": 10,
            "content": b64("Some notes"),
            "encoding": "base64"
        })))
        .mount(&mock_server)
        .await;
    mount_content(&mock_server, "src/calculator.py", "def add(a, b): return a + b").await;

    let summary = RepoSummarizer::new(test_client(&mock_server))
        .summarize(&repo(), &["calculator".to_string()])
        .await
        .expect("summary");

    assert_eq!(summary.file_count, 31);
    assert_eq!(summary.analyzed_file_count, 25);
    assert_eq!(summary.selected_files[0].path, "src/calculator.py");
    assert!(summary
        .render_digest()
        .contains("--- src/calculator.py ---\ndef add(a, b)"));
}

#[tokio::test]
async fn test_summarize_private_repository_fails_loudly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/calc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = RepoSummarizer::new(test_client(&mock_server))
        .summarize(&repo(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}
