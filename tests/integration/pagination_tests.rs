//! Crunchbase API walking against a mock server

use company_harvest::config::Config;
use company_harvest::crawler::{
    build_http_client, paginate, Coordinator, CrunchbaseSource, FetchFailure, StopReason,
};
use company_harvest::output::{write_csv, DuplicatePolicy};
use company_harvest::HarvestError;
use serde_json::{json, Value};
use std::ops::ControlFlow;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/v4/data/entities/organizations";

/// Creates a test configuration pointing the API at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.crunchbase.base_url = format!("{}{}", server.uri(), API_PATH);
    config.crunchbase.request_delay_ms = 0;
    config.crunchbase.cooldown_ms = 10; // Very short for testing
    config.crunchbase.max_cooldown_ms = 40;
    config.crunchbase.max_retries = 2;
    config
}

fn source_for(config: &Config) -> CrunchbaseSource {
    let client = build_http_client(&config.http).expect("Failed to build client");
    CrunchbaseSource::new(client, &config.crunchbase, "test-key".to_string())
}

fn organization(name: &str, funding: u64) -> Value {
    json!({"organization": {
        "name": name,
        "total_funding_amount": funding,
        "last_funding_date": "2021-05-01T00:00:00Z",
        "founders": {"items": [{"founder": {"name": "Ada"}}]}
    }})
}

fn page_body(items: Vec<Value>) -> Value {
    json!({"data": {"items": items}})
}

async fn mount_page(server: &MockServer, page: u32, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(items)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walk_until_empty_page() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    mount_page(&server, 1, vec![organization("A", 1), organization("B", 2)]).await;
    mount_page(&server, 2, vec![organization("C", 3)]).await;
    mount_page(&server, 3, vec![]).await;

    let source = source_for(&config);
    let mut pages = Vec::new();
    let summary = paginate(&source, 100, Duration::ZERO, |page| {
        pages.push(page.page);
        ControlFlow::Continue(())
    })
    .await
    .expect("Walk failed");

    assert_eq!(pages, vec![1, 2]);
    assert_eq!(summary.items, 3);
    assert!(matches!(summary.stop, StopReason::Exhausted { page: 3 }));

    // Exactly N + 1 requests; `expect(1)` on each mock is verified on drop
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_request_carries_key_and_paging() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(header("X-cb-user-key", "test-key"))
        .and(header("Content-Type", "application/json"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&config);
    let summary = paginate(&source, 100, Duration::ZERO, |_| ControlFlow::Continue(())).await.unwrap();
    assert_eq!(summary.pages, 0);
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    // Mounted first, so it answers the first request only
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 1, vec![organization("A", 1)]).await;
    mount_page(&server, 2, vec![]).await;

    let source = source_for(&config);
    let mut seen = Vec::new();
    let summary = paginate(&source, 100, Duration::ZERO, |page| {
        seen.push((page.page, page.items.len()));
        ControlFlow::Continue(())
    })
    .await
    .unwrap();

    assert_eq!(seen, vec![(1, 1)]);
    assert_eq!(summary.pages, 1);
}

#[tokio::test]
async fn test_rate_limit_budget_exhausted() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    // max_retries = 2: one initial attempt plus two retries
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let source = source_for(&config);
    let summary = paginate(&source, 100, Duration::ZERO, |_| ControlFlow::Continue(())).await.unwrap();

    assert!(matches!(
        summary.stop,
        StopReason::Failed(FetchFailure::RateLimited { page: 1, attempts: 3 })
    ));
}

#[tokio::test]
async fn test_unauthorized_aborts() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&config);
    let result = paginate(&source, 100, Duration::ZERO, |_| ControlFlow::Continue(())).await;

    assert!(matches!(result, Err(HarvestError::Unauthorized { status: 401 })));
}

#[tokio::test]
async fn test_server_error_stops_walk() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    mount_page(&server, 1, vec![organization("A", 1)]).await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config.clone()).unwrap();
    let records = coordinator
        .harvest_crunchbase(&source_for(&config))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_stops_walk() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&config);
    let summary = paginate(&source, 100, Duration::ZERO, |_| ControlFlow::Continue(())).await.unwrap();

    assert!(matches!(
        summary.stop,
        StopReason::Failed(FetchFailure::Malformed { page: 1, .. })
    ));
}

#[tokio::test]
async fn test_duplicates_resolved_by_policy() {
    for (policy, expected) in [
        (DuplicatePolicy::FirstWins, "100"),
        (DuplicatePolicy::LastWins, "999"),
    ] {
        let server = MockServer::start().await;
        mount_page(&server, 1, vec![organization("Acme", 100), organization("Acme", 999)]).await;
        mount_page(&server, 2, vec![]).await;

        let mut config = create_test_config(&server);
        config.output.duplicates = policy;
        let coordinator = Coordinator::new(config.clone()).unwrap();

        let records = coordinator
            .harvest_crunchbase(&source_for(&config))
            .await
            .unwrap();

        assert_eq!(records.len(), 1, "{:?}", policy);
        assert_eq!(records.records()[0].total_funding_amount, expected);
        assert_eq!(records.collisions(), 1);
    }
}

#[tokio::test]
async fn test_duplicate_error_policy_stops_walk() {
    let server = MockServer::start().await;
    let mut config = create_test_config(&server);
    config.output.duplicates = DuplicatePolicy::Error;

    mount_page(&server, 1, vec![organization("Acme", 1), organization("Acme", 2)]).await;
    for page in 2u64..=4 {
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![
                organization(&format!("Org {}", page), page),
            ])))
            .expect(0)
            .mount(&server)
            .await;
    }

    let coordinator = Coordinator::new(config.clone()).unwrap();
    let result = coordinator.harvest_crunchbase(&source_for(&config)).await;

    assert!(matches!(result, Err(HarvestError::Write(_))));
    // The collision on page 1 ends the walk before page 2 is requested
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_csv_round_trip() {
    let server = MockServer::start().await;
    let config = create_test_config(&server);

    mount_page(&server, 1, vec![organization("Acme", 7_500_000), organization("Beta", 0)]).await;
    mount_page(&server, 2, vec![]).await;

    let coordinator = Coordinator::new(config.clone()).unwrap();
    let records = coordinator
        .harvest_crunchbase(&source_for(&config))
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("organizations.csv");
    assert_eq!(write_csv(&records, &csv_path).unwrap(), 2);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 33);

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][column("Organization Name")], "Acme");
    assert_eq!(&rows[0][column("Total Funding Amount")], "7500000");
    assert_eq!(&rows[0][column("Founders")], "Ada");
    assert_eq!(&rows[0][column("Number of Founders (Alumni)")], "1");
    assert_eq!(&rows[0][column("Last Funding Date")], "2021-05-01");
    assert_eq!(&rows[1][column("Organization Name")], "Beta");
    assert_eq!(&rows[1][column("Founded Date")], "");
}
