//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, downloading and the full crawl cycle end-to-end.

use chrono::NaiveDate;
use forum_crawler::config::{parse_config, Config, CrawlMode, RequestConfig};
use forum_crawler::crawler::{Coordinator, HttpFetcher, PageFetcher, RunOptions};
use forum_crawler::output::FileSaver;
use forum_crawler::state::StopReason;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, save_dir: &TempDir) -> Config {
    let host = url::Url::parse(&server.uri())
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();
    let port = server.address().port();

    parse_config(&format!(
        r#"
site-domain = "{host}:{port}"
site-scheme = "http"

[request]
timeout-secs = 5
delay-ms = 0

[crawl]
max-pages = 5
retry-times = 2

[save-paths]
picture = "{picture}"
novel = "{novel}"

[[picture-forums]]
id = "3"
name = "Pictures"

[[novel-forums]]
id = "7"
name = "Stories"
"#,
        host = host,
        port = port,
        picture = save_dir.path().join("picture").display(),
        novel = save_dir.path().join("novel").display(),
    ))
    .expect("Failed to parse test config")
}

fn test_fetcher(retry_times: u32) -> HttpFetcher {
    let client = forum_crawler::crawler::build_http_client(&RequestConfig::default())
        .expect("Failed to build client");
    HttpFetcher::new(client, Duration::from_millis(0), retry_times)
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn listing(topics: &[(&str, &str)], next: Option<&str>) -> String {
    let rows: String = topics
        .iter()
        .map(|(href, title)| {
            format!(
                r#"<li class="row"><dl><dt><a href="{}" class="topictitle">{}</a></dt></dl></li>"#,
                href, title
            )
        })
        .collect();
    let pagination = next
        .map(|href| format!(r#"<div class="pagination"><a href="{}">下一页</a></div>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body><div class="forumbg"><ul class="topiclist topics">{}</ul></div>{}</body></html>"#,
        rows, pagination
    )
}

#[tokio::test]
async fn test_fetcher_retries_then_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let result = fetcher.get(&format!("{}/flaky", mock_server.uri())).await;

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_fetcher_recovers_after_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "<p>hello</p>".to_string()).await;

    let fetcher = test_fetcher(3);
    let result = fetcher.get(&format!("{}/page", mock_server.uri())).await;

    assert_eq!(result.as_deref(), Some("<p>hello</p>"));
}

#[tokio::test]
async fn test_fetcher_sends_configured_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(wiremock::matchers::header("referer", "https://forum.example.com/"))
        .respond_with(html("ok".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = RequestConfig::default();
    request
        .headers
        .insert("Referer".to_string(), "https://forum.example.com/".to_string());
    let client = forum_crawler::crawler::build_http_client(&request).unwrap();
    let fetcher = HttpFetcher::new(client, Duration::from_millis(0), 1);

    let result = fetcher.get(&format!("{}/headers", mock_server.uri())).await;
    assert_eq!(result.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_download_writes_file() {
    let mock_server = MockServer::start().await;
    let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    Mock::given(method("GET"))
        .and(path("/upload/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/upload/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = test_fetcher(2);

    let dest = dir.path().join("a.png");
    assert!(
        fetcher
            .download(&format!("{}/upload/a.png", mock_server.uri()), &dest)
            .await
    );
    assert_eq!(std::fs::read(&dest).unwrap(), bytes);

    let missing = dir.path().join("gone.png");
    assert!(
        !fetcher
            .download(&format!("{}/upload/gone.png", mock_server.uri()), &missing)
            .await
    );
    assert!(!missing.exists());
}

#[tokio::test]
async fn test_full_novel_crawl() {
    let mock_server = MockServer::start().await;
    let save_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, &save_dir);

    mount_page(
        &mock_server,
        "/viewforum/7",
        listing(
            &[("/viewtopic/1", "Chapter 1"), ("/viewtopic/2", "Chapter: 2")],
            Some("/viewforum/7/page2?start=25"),
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/viewforum/7/page2",
        listing(&[("/viewtopic/3", "Chapter 3")], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/viewtopic/1",
        r#"<div class="postbody"><p>First line</p><script>x()</script><p>Second line</p></div>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/viewtopic/2",
        r#"<div class="postbody">Second chapter</div>"#.to_string(),
    )
    .await;
    // Topic 3 is missing and answers 404

    let fetcher = HttpFetcher::from_config(&config.request, &config.crawl).unwrap();
    let sink = FileSaver::create(config.save_paths.clone()).await.unwrap();
    let coordinator = Coordinator::new(config, fetcher, sink, RunOptions::today(false)).unwrap();

    let summary = coordinator.run(CrawlMode::Novel).await;

    assert_eq!(summary.modes.len(), 1);
    let forum = &summary.modes[0].forums[0];
    assert_eq!(forum.pages, 2);
    assert_eq!(forum.stop_reason, StopReason::NoNextPage);
    assert_eq!(forum.result.topics_processed, 3);
    assert_eq!(forum.result.items_saved, 2);

    let novel_dir = save_dir.path().join("novel");
    assert_eq!(
        std::fs::read_to_string(novel_dir.join("Chapter 1.txt")).unwrap(),
        "First line\nSecond line"
    );
    assert_eq!(
        std::fs::read_to_string(novel_dir.join("Chapter_ 2.txt")).unwrap(),
        "Second chapter"
    );
    assert!(!novel_dir.join("Chapter 3.txt").exists());
}

#[tokio::test]
async fn test_full_picture_crawl() {
    let mock_server = MockServer::start().await;
    let save_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, &save_dir);

    mount_page(
        &mock_server,
        "/viewforum/3",
        listing(&[("/viewtopic/10", "Gallery")], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/viewtopic/10",
        r#"<div class="content">
             <img src="/upload/one.png">
             <img src="/images/avatars/me.png">
             <img src="/upload/two">
           </div>"#
            .to_string(),
    )
    .await;

    for image in ["/upload/one.png", "/upload/two"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image.as_bytes().to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let fetcher = HttpFetcher::from_config(&config.request, &config.crawl).unwrap();
    let sink = FileSaver::create(config.save_paths.clone()).await.unwrap();
    let coordinator = Coordinator::new(config, fetcher, sink, RunOptions::today(false)).unwrap();

    let summary = coordinator.run(CrawlMode::Picture).await;
    assert_eq!(summary.total().items_saved, 2);

    let topic_dir = save_dir.path().join("picture").join("Gallery");
    assert_eq!(
        std::fs::read(topic_dir.join("image_1.png")).unwrap(),
        b"/upload/one.png".to_vec()
    );
    assert!(topic_dir.join("image_2.jpg").is_file());
}

#[tokio::test]
async fn test_daily_crawl() {
    let mock_server = MockServer::start().await;
    let save_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server, &save_dir);
    let run_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    mount_page(
        &mock_server,
        "/viewforum/7",
        listing(
            &[("/viewtopic/1", "[06-01] Today"), ("/viewtopic/2", "[05-31] Yesterday")],
            None,
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/viewtopic/1",
        r#"<div class="postbody">fresh</div>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/viewtopic/2"))
        .respond_with(html("stale".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let save_paths = config.save_paths.for_run(true, run_date);
    let fetcher = HttpFetcher::from_config(&config.request, &config.crawl).unwrap();
    let sink = FileSaver::create(save_paths).await.unwrap();
    let options = RunOptions {
        daily: true,
        run_date,
    };
    let coordinator = Coordinator::new(config, fetcher, sink, options).unwrap();

    let summary = coordinator.run(CrawlMode::Novel).await;
    assert!(summary.daily);
    assert_eq!(summary.total().items_saved, 1);

    let daily_dir = save_dir.path().join("novel").join("daily_2024-06-01");
    assert_eq!(
        std::fs::read_to_string(daily_dir.join("[06-01] Today.txt")).unwrap(),
        "fresh"
    );
}
