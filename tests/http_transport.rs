//! End-to-end tests of the reqwest transport against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use proceedings::error::{AppError, TransportError};
use proceedings::models::{Config, NO_ABSTRACT, YearRange};
use proceedings::pipeline::Scraper;
use proceedings::services::{
    DownloadOutcome, Fetcher, HttpTransport, PdfDownloader, RetryPolicy, Transport,
};
use proceedings::storage::LocalStorage;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str, root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.scraper.base_url = base_url.to_string();
    config.scraper.retry_delay_ms = 0;
    config.scraper.request_delay_ms = 0;
    config.scraper.timeout_secs = 5;
    config.output.root_dir = root.to_path_buf();
    config
}

fn transport(config: &Config) -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(&config.scraper).unwrap())
}

#[tokio::test]
async fn fetch_recovers_after_two_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = config(&server.uri(), tmp.path());
    let fetcher = Fetcher::new(transport(&config), RetryPolicy::from_config(&config.scraper));

    let body = fetcher.fetch(&format!("{}/page", server.uri())).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn fetch_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut config = config(&server.uri(), tmp.path());
    config.scraper.timeout_secs = 1;
    let fetcher = Fetcher::new(transport(&config), RetryPolicy::new(1, Duration::ZERO));

    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    match err {
        AppError::Fetch { attempts, last, .. } => {
            assert_eq!(attempts, 1);
            assert_eq!(last, TransportError::Timeout);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn download_streams_file_in_blocks() {
    let server = MockServer::start().await;
    let body: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/file-Paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = config(&server.uri(), tmp.path());
    let downloader = PdfDownloader::new(
        transport(&config),
        RetryPolicy::from_config(&config.scraper),
        1024,
    );
    let dest = tmp.path().join("2020").join("Paper.pdf");
    let url = format!("{}/file-Paper.pdf", server.uri());

    let first = downloader.download(&url, &dest).await.unwrap();
    assert_eq!(first, DownloadOutcome::Downloaded { bytes: 10_000 });
    assert_eq!(std::fs::read(&dest).unwrap(), body);

    // Second call is served from disk; the mock expects exactly one request.
    let second = downloader.download(&url, &dest).await.unwrap();
    assert_eq!(second, DownloadOutcome::AlreadyPresent);
}

#[tokio::test]
async fn scrape_conference_year_end_to_end() {
    let server = MockServer::start().await;
    let listing = r#"
        <html><body><ul class="paper-list">
          <li><a href="/paper_files/paper/2023/hash/abc-Abstract-Conference.html">A Study: Of Things</a></li>
        </ul></body></html>
    "#;
    let detail = r#"
        <html><head><title>A Study: Of Things</title></head><body>
          <a class="btn btn-primary btn-spacer" href="/paper_files/paper/2023/file/abc-Paper-Conference.pdf">Paper</a>
          <h4>Authors</h4><p><i>Grace Hopper</i></p>
        </body></html>
    "#;
    Mock::given(method("GET"))
        .and(path("/paper_files/paper/2023"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/paper_files/paper/2023/hash/abc-Abstract-Conference.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/paper_files/paper/2023/file/abc-Paper-Conference.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = config(&server.uri(), tmp.path());
    let storage = Arc::new(LocalStorage::new(tmp.path()));
    let scraper = Scraper::new(&config, transport(&config), storage.clone());

    scraper.run(YearRange::new(2023, 2023)).await.unwrap();
    // Second run stops after the listing.
    scraper.run(YearRange::new(2023, 2023)).await.unwrap();

    let records = storage.load_records(2023).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "A Study Of Things");
    assert_eq!(records[0].authors, "Grace Hopper");
    assert_eq!(records[0].abstract_text, NO_ABSTRACT);
    assert_eq!(
        records[0].pdf_url,
        format!(
            "{}/paper_files/paper/2023/file/abc-Paper-Conference.pdf",
            server.uri()
        )
    );

    let pdf = tmp.path().join("2023").join("A Study Of Things.pdf");
    assert_eq!(std::fs::read(pdf).unwrap(), b"%PDF-1.7");
}
