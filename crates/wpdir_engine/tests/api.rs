use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wpdir_engine::{
    ClientConfig, FailureKind, FileRequest, ReqwestSearchApi, SearchApi, STATUS_RUNNING,
};

fn api_for(server: &MockServer) -> ReqwestSearchApi {
    let config = ClientConfig::with_base_url(&server.uri()).expect("valid base url");
    ReqwestSearchApi::new(config).expect("client")
}

#[tokio::test]
async fn job_is_fetched_and_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/01HJOB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "01HJOB",
            "input": "wp_remote_get",
            "repo": "plugins",
            "status": 1,
            "progress": 40,
            "matches": 12,
            "started": "2026-03-01T10:00:00Z",
            "completed": "0001-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let job = api_for(&server).job("01HJOB").await.expect("job");
    assert_eq!(job.id, "01HJOB");
    assert_eq!(job.status, STATUS_RUNNING);
    assert_eq!(job.progress, 40);
    assert_eq!(job.total, 100);
    assert_eq!(job.matches, 12);
    assert!(job.started.is_some());
    assert_eq!(job.completed, None);
}

#[tokio::test]
async fn missing_job_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = api_for(&server).job("gone").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn server_error_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/summary/01HJOB"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api_for(&server).summary("01HJOB").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/01HJOB"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server).job("01HJOB").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": "slow", "status": 0}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut config = ClientConfig::with_base_url(&server.uri()).expect("valid base url");
    config.request_timeout = Duration::from_millis(50);
    let api = ReqwestSearchApi::new(config).expect("client");

    let err = api.job("slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn summary_accepts_array_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/summary/01HJOB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                {"slug": "akismet", "name": "Akismet", "installs": 5000000, "matches": 3},
                {"slug": "hello-dolly", "active_installs": 10, "matches": 1}
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let items = api_for(&server).summary("01HJOB").await.expect("summary");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("Akismet"));
    assert_eq!(items[0].installs, Some(5_000_000));
    assert_eq!(items[1].slug, "hello-dolly");
    assert_eq!(items[1].name, None);
    assert_eq!(items[1].installs, Some(10));
}

#[tokio::test]
async fn summary_accepts_keyed_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/summary/01HJOB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": {
                "woo": {"name": "Woo", "installs": 7, "matches": 9},
                "acf": {"slug": "acf", "installs": 3, "matches": 2}
            }
        })))
        .mount(&server)
        .await;

    let items = api_for(&server).summary("01HJOB").await.expect("summary");
    let slugs: Vec<&str> = items.iter().map(|item| item.slug.as_str()).collect();
    assert_eq!(slugs, vec!["acf", "woo"]);
}

#[tokio::test]
async fn matches_escape_the_slug_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/matches/01HJOB/contact-form-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [
                {
                    "slug": "contact-form-7",
                    "file": "contact-form-7/includes/mail.php",
                    "line_num": 42,
                    "line_text": "wp_mail( $to );"
                }
            ]
        })))
        .mount(&server)
        .await;

    let matches = api_for(&server)
        .matches("01HJOB", "contact-form-7")
        .await
        .expect("matches");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].line_num, 42);
    assert_eq!(matches[0].file, "contact-form-7/includes/mail.php");
    assert!(matches[0].before.is_empty());
}

#[tokio::test]
async fn null_match_list_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/matches/01HJOB/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"matches": null})))
        .mount(&server)
        .await;

    let matches = api_for(&server).matches("01HJOB", "empty").await.expect("matches");
    assert!(matches.is_empty());
}

#[tokio::test]
async fn file_content_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/file"))
        .and(body_json(serde_json::json!({
            "repo": "plugins",
            "slug": "akismet",
            "file": "akismet/akismet.php"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": "<?php\necho 1;\n"})),
        )
        .mount(&server)
        .await;

    let request = FileRequest {
        repo: "plugins".to_string(),
        slug: "akismet".to_string(),
        file: "akismet/akismet.php".to_string(),
    };
    let code = api_for(&server).file_content(&request).await.expect("file");
    assert_eq!(code, "<?php\necho 1;\n");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/file"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": "x".repeat(4096)})),
        )
        .mount(&server)
        .await;

    let mut config = ClientConfig::with_base_url(&server.uri()).expect("valid base url");
    config.max_bytes = 64;
    let api = ReqwestSearchApi::new(config).expect("client");
    let request = FileRequest {
        repo: "themes".to_string(),
        slug: "twentytwenty".to_string(),
        file: "twentytwenty/style.css".to_string(),
    };

    let err = api.file_content(&request).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 64, .. }));
}

#[tokio::test]
async fn recent_jobs_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/searches/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "searches": [
                {"id": "a", "input": "eval(", "repo": "plugins", "matches": 100},
                {"id": "b", "input": "base64_decode", "repo": "themes", "matches": 0}
            ]
        })))
        .mount(&server)
        .await;

    let recent = api_for(&server).recent_jobs(5).await.expect("recent");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].repo, "themes");
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let config = ClientConfig::with_base_url("http://127.0.0.1:9").expect("valid base url");
    let api = ReqwestSearchApi::new(config).expect("client");

    let err = api.job("any").await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}
