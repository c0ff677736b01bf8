//! End-to-end tests for `ScrapeSession::run` against a mock Open Food Facts
//! server exposing both locale paths.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use offscrape_core::ScrapeTarget;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use offscrape_scraper::{
    FetchSettings, ProductPageClient, RetryPolicy, ScrapeSession, Stage, UrlNormalizer,
};

const HTML: &str = "text/html; charset=utf-8";

const STUB_PAGE: &str = r#"<html><head>
  <meta property="og:type" content="website">
  <title>Open Food Facts</title>
</head><body><p>Produit non trouvé</p></body></html>"#;

const FALLBACK_PAGE: &str = r#"<html><head>
  <meta property="og:type" content="food">
</head><body>
  <h1 property="food:name" itemprop="name">Nutella</h1>
  <table id="nutrition_table">
    <tr><td>Énergie</td><td>520 kJ / 125 kcal</td></tr>
    <tr><td>Matières grasses</td><td>30,9 g</td></tr>
  </table>
</body></html>"#;

fn session(server: &MockServer, max_attempts: u32) -> ScrapeSession {
    session_with_delay(server, max_attempts, Duration::ZERO)
}

fn session_with_delay(server: &MockServer, max_attempts: u32, delay: Duration) -> ScrapeSession {
    let client = ProductPageClient::new(FetchSettings {
        user_agent: "offscrape-test/0.1".to_owned(),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::immediate(max_attempts),
    })
    .expect("failed to build test client");
    let normalizer = UrlNormalizer::new(
        &format!("{}/product/", server.uri()),
        &format!("{}/produit/", server.uri()),
    );
    ScrapeSession::new(client, normalizer, delay)
}

fn targets(raw: &[&str]) -> Vec<ScrapeTarget> {
    raw.iter().filter_map(|t| ScrapeTarget::parse(t)).collect()
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, HTML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn stub_primary_page_falls_back_to_french_locale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/3017620422003"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STUB_PAGE, HTML))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/produit/3017620422003"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FALLBACK_PAGE, HTML))
        .expect(1)
        .mount(&server)
        .await;

    let report = session(&server, 3)
        .run(&targets(&["3017620422003"]), &AtomicBool::new(false))
        .await;

    assert!(report.failures.is_empty(), "failures: {:?}", report.failures);
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.index(), "3017620422003");
    assert_eq!(record.name(), Some("Nutella"));
    assert_eq!(record.nutriments().calories(), Some(125.0));
    assert_eq!(record.nutriments().lipides(), Some(30.9));
    assert_eq!(
        record.source(),
        format!("{}/produit/3017620422003", server.uri())
    );
}

#[tokio::test]
async fn product_primary_page_skips_fallback() {
    let server = MockServer::start().await;
    mount_page(&server, "/product/12345678", FALLBACK_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/produit/12345678"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FALLBACK_PAGE, HTML))
        .expect(0)
        .mount(&server)
        .await;

    let report = session(&server, 1)
        .run(&targets(&["12345678"]), &AtomicBool::new(false))
        .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(
        report.records[0].source(),
        format!("{}/product/12345678", server.uri())
    );
}

#[tokio::test]
async fn fallback_page_is_extracted_without_classification() {
    let server = MockServer::start().await;
    mount_page(&server, "/product/87654321", STUB_PAGE).await;
    mount_page(&server, "/produit/87654321", STUB_PAGE).await;

    let report = session(&server, 1)
        .run(&targets(&["87654321"]), &AtomicBool::new(false))
        .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].index(), "87654321");
    assert!(report.records[0].nutriments().is_empty());
}

#[tokio::test]
async fn failing_target_does_not_abort_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/11111111"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/product/22222222", FALLBACK_PAGE).await;

    let report = session(&server, 3)
        .run(&targets(&["11111111", "22222222"]), &AtomicBool::new(false))
        .await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].index(), "22222222");
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.target.as_str(), "11111111");
    assert_eq!(failure.position, 1);
    assert_eq!(failure.stage, Stage::Start);
    assert!(failure.error.contains("500"), "{}", failure.error);
}

#[tokio::test]
async fn fallback_fetch_failure_is_reported_at_primary_stage() {
    let server = MockServer::start().await;
    mount_page(&server, "/product/33333333", STUB_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/produit/33333333"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let report = session(&server, 1)
        .run(&targets(&["33333333"]), &AtomicBool::new(false))
        .await;

    assert!(report.records.is_empty());
    assert_eq!(report.failures[0].stage, Stage::FetchedPrimary);
}

#[tokio::test]
async fn records_keep_input_order() {
    let server = MockServer::start().await;
    for code in ["44444444", "55555555", "66666666"] {
        mount_page(&server, &format!("/product/{code}"), FALLBACK_PAGE).await;
    }

    let report = session(&server, 1)
        .run(
            &targets(&["66666666", "", "44444444", "55555555"]),
            &AtomicBool::new(false),
        )
        .await;

    let order: Vec<&str> = report.records.iter().map(|r| r.index()).collect();
    assert_eq!(order, ["66666666", "44444444", "55555555"]);
}

#[tokio::test]
async fn stop_flag_prevents_new_targets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FALLBACK_PAGE, HTML))
        .expect(0)
        .mount(&server)
        .await;

    let report = session(&server, 1)
        .run(&targets(&["12345678"]), &AtomicBool::new(true))
        .await;

    assert!(report.interrupted);
    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn polite_delay_separates_targets_but_not_after_the_last() {
    const DELAY: Duration = Duration::from_millis(400);

    let server = MockServer::start().await;
    mount_page(&server, "/product/11111111", FALLBACK_PAGE).await;
    mount_page(&server, "/product/22222222", FALLBACK_PAGE).await;
    let stop = AtomicBool::new(false);

    let started = Instant::now();
    let report = session_with_delay(&server, 1, DELAY)
        .run(&targets(&["11111111"]), &stop)
        .await;
    let single = started.elapsed();
    assert_eq!(report.records.len(), 1);
    assert!(single < DELAY, "single target waited {single:?}");

    let started = Instant::now();
    let report = session_with_delay(&server, 1, DELAY)
        .run(&targets(&["11111111", "22222222"]), &stop)
        .await;
    let pair = started.elapsed();
    assert_eq!(report.records.len(), 2);
    assert!(pair >= DELAY, "two targets took only {pair:?}");
    assert!(pair < DELAY * 2, "delay awaited after the last target: {pair:?}");
}
