//! YC directory and profile pipelines against a mock server

use company_harvest::config::Config;
use company_harvest::crawler::{Coordinator, HttpRenderer};
use company_harvest::extract::YcCompany;
use company_harvest::output::{read_json, save_json};
use company_harvest::HarvestError;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps a payload the way YC pages embed it: an entity-encoded attribute
fn data_page_html(payload: &Value) -> String {
    let encoded = payload
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    format!(
        r#"<html><body><div id="app" data-page="{}"></div></body></html>"#,
        encoded
    )
}

fn company_payload(name: &str, website: &str, founder: &str) -> Value {
    json!({"props": {"company": {
        "name": name,
        "one_liner": format!("{} & friends", name),
        "website": website,
        "batch_name": "W21",
        "year_founded": 2020,
        "team_size": "12",
        "founders": [{
            "full_name": founder,
            "title": "CEO",
            "founder_bio": "Builder",
            "linkedin_url": format!("https://linkedin.com/in/{}", founder.to_lowercase())
        }],
        "linkedin_url": format!("https://linkedin.com/company/{}", name.to_lowercase())
    }}})
}

/// Creates a test configuration with every path inside `dir`
fn create_test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    let out = |name: &str| dir.join(name).to_string_lossy().to_string();

    config.directory.origin = server.uri();
    config.directory.listing_url = format!("{}/companies", server.uri());
    config.directory.url_file = out("urls.json");
    config.directory.dump_path = out("dump.json");
    config.directory.csv_path = out("companies.csv");
    config.directory.excel_path = out("founders.xlsx");
    config.directory.page_delay_ms = 0; // Very short for testing

    config.profiles.base_url = format!("{}/organization/", server.uri());
    config.profiles.page_delay_ms = 0;
    config.profiles.output = out("profiles.csv");
    config
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_directory(server: &MockServer) {
    let listing = json!({"props": {"companies": {"list": [
        {"name": "Acme", "url": "/companies/acme"},
        {"name": "Beta", "url": "/companies/beta"}
    ]}}});
    mount_html(server, "/companies", data_page_html(&listing)).await;

    let mut acme = company_payload("Acme", "https://acme.example", "Ada");
    acme["props"]["company"]["newsItems"] =
        json!([{"title": "Launch", "url": "https://news.example/1", "date": "2021-01-01"}]);
    acme["props"]["company"]["newsUrl"] = json!("/companies/acme/news");
    mount_html(server, "/companies/acme", data_page_html(&acme)).await;

    let beta = company_payload("Beta", "https://beta.example", "Grace");
    mount_html(server, "/companies/beta", data_page_html(&beta)).await;

    Mock::given(method("GET"))
        .and(path("/companies/acme/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"newsItems": [
            {"title": "Launch", "url": "https://news.example/1"},
            {"title": "Series A", "url": "https://news.example/2"}
        ]})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_directory_to_csv_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let config = create_test_config(&server, dir.path());
    let coordinator = Coordinator::new(config.clone()).expect("Failed to create coordinator");

    let urls = coordinator.run_yc_urls(None).await.expect("Listing failed");
    let urls: Vec<String> = urls.into_iter().map(String::from).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/companies/acme", server.uri()),
            format!("{}/companies/beta", server.uri()),
        ]
    );

    assert_eq!(coordinator.run_yc_scrape().await.expect("Scrape failed"), 2);
    assert_eq!(coordinator.run_yc_export(false).expect("Export failed"), 2);

    let mut reader = csv::Reader::from_path(&config.directory.csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][column("name")], "Acme");
    assert_eq!(&rows[0][column("one_liner")], "Acme & friends");
    assert_eq!(&rows[0][column("team_size")], "12");
    assert_eq!(&rows[0][column("founder_1_name")], "Ada");
    assert_eq!(&rows[0][column("founder_2_name")], "");
    assert_eq!(&rows[1][column("founder_1_name")], "Grace");
    assert_eq!(&rows[1][column("founder_2_name")], "");
}

#[tokio::test]
async fn test_news_endpoint_merged_without_duplicates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let url = url::Url::parse(&format!("{}/companies/acme", server.uri())).unwrap();
    let company = coordinator.scrape_company(&url).await.unwrap();

    let news: Vec<&str> = company
        .latest_news
        .iter()
        .filter_map(|n| n.url.as_deref())
        .collect();
    assert_eq!(news, vec!["https://news.example/1", "https://news.example/2"]);
}

#[tokio::test]
async fn test_news_failure_keeps_company() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut payload = company_payload("Solo", "https://solo.example", "Sam");
    payload["props"]["company"]["newsUrl"] = json!("/companies/solo/news");
    mount_html(&server, "/companies/solo", data_page_html(&payload)).await;
    Mock::given(method("GET"))
        .and(path("/companies/solo/news"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let url = url::Url::parse(&format!("{}/companies/solo", server.uri())).unwrap();
    let company = coordinator.scrape_company(&url).await.unwrap();

    assert_eq!(company.name.as_deref(), Some("Solo"));
    assert!(company.latest_news.is_empty());
}

#[tokio::test]
async fn test_failed_detail_pages_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let ok = company_payload("Good", "https://good.example", "Gil");
    mount_html(&server, "/companies/good", data_page_html(&ok)).await;
    mount_html(&server, "/companies/blobless", "<html><body>moved</body></html>".into()).await;

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let urls: Vec<url::Url> = ["missing", "blobless", "good"]
        .iter()
        .map(|slug| url::Url::parse(&format!("{}/companies/{}", server.uri(), slug)).unwrap())
        .collect();

    let companies = coordinator.scrape_companies(&urls).await;
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].website.as_deref(), Some("https://good.example"));
}

#[tokio::test]
async fn test_dump_merge_keeps_existing_records() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let config = create_test_config(&server, dir.path());
    let earlier = YcCompany {
        name: Some("Acme (old)".to_string()),
        website: Some("https://acme.example".to_string()),
        ..Default::default()
    };
    let unrelated = YcCompany {
        name: Some("Zeta".to_string()),
        website: Some("https://zeta.example".to_string()),
        ..Default::default()
    };
    save_json(Path::new(&config.directory.dump_path), &vec![earlier, unrelated]).unwrap();

    let coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.run_yc_urls(None).await.unwrap();
    assert_eq!(coordinator.run_yc_scrape().await.unwrap(), 3);

    let dump: Vec<YcCompany> = read_json(Path::new(&config.directory.dump_path)).unwrap();
    let names: Vec<&str> = dump.iter().filter_map(|c| c.name.as_deref()).collect();
    assert_eq!(names, vec!["Acme (old)", "Zeta", "Beta"]);
}

#[tokio::test]
async fn test_dump_with_string_counts_survives_scrape() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let config = create_test_config(&server, dir.path());
    let prior = json!([
        {"name": "Old One", "website": "https://one.example",
         "key_details": {"team_size": "12", "year_founded": "2015"}},
        {"name": "Old Two", "website": "https://two.example",
         "key_details": {"team_size": 40}}
    ]);
    save_json(Path::new(&config.directory.dump_path), &prior).unwrap();
    save_json(Path::new(&config.directory.url_file), &Vec::<String>::new()).unwrap();

    let coordinator = Coordinator::new(config.clone()).unwrap();
    assert_eq!(coordinator.run_yc_scrape().await.unwrap(), 2);

    let dump: Vec<YcCompany> = read_json(Path::new(&config.directory.dump_path)).unwrap();
    assert_eq!(dump.len(), 2);
    assert_eq!(dump[0].name.as_deref(), Some("Old One"));
    assert_eq!(dump[0].key_details.team_size, Some(12));
    assert_eq!(dump[1].key_details.team_size, Some(40));
}

#[tokio::test]
async fn test_undecodable_dump_is_left_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let config = create_test_config(&server, dir.path());
    let dump_path = Path::new(&config.directory.dump_path);
    let prior = r#"[{"name": ["not", "a", "string"], "website": "https://kept.example"}]"#;
    std::fs::write(dump_path, prior).unwrap();

    let coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.run_yc_urls(None).await.unwrap();
    let result = coordinator.run_yc_scrape().await;

    assert!(matches!(result, Err(HarvestError::Write(_))));
    assert_eq!(std::fs::read_to_string(dump_path).unwrap(), prior);
}

#[tokio::test]
async fn test_excel_export_one_row_per_founder() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_directory(&server).await;

    let config = create_test_config(&server, dir.path());
    let coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.run_yc_urls(Some(1)).await.unwrap();
    coordinator.run_yc_scrape().await.unwrap();

    assert_eq!(coordinator.run_yc_export(true).unwrap(), 1);
    let bytes = std::fs::read(&config.directory.excel_path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_export_without_dump_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let result = coordinator.run_yc_export(false);
    assert!(matches!(result, Err(HarvestError::Write(_))));
}

#[tokio::test]
async fn test_listing_without_blob_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_html(&server, "/companies", "<html><body>No data</body></html>".into()).await;

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let result = coordinator.run_yc_urls(None).await;
    assert!(matches!(result, Err(HarvestError::DirectoryBlob { .. })));
}

#[tokio::test]
async fn test_listing_error_status_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, dir.path())).unwrap();
    let result = coordinator.run_yc_urls(None).await;
    assert!(matches!(result, Err(HarvestError::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn test_profiles_over_http() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_html(
        &server,
        "/organization/acme",
        r#"<html><body>
            <h1 class="profile-name">Acme</h1>
            <div><span>Last Funding Date</span>
            <span class="component--field-formatter field-type-date">Jan 5, 2022</span></div>
            <section id="founders"><a class="cb-link">Ada</a></section>
        </body></html>"#
            .to_string(),
    )
    .await;

    let mut config = create_test_config(&server, dir.path());
    config.profiles.slugs = vec!["acme".to_string(), "missing".to_string()];
    let coordinator = Coordinator::new(config.clone()).unwrap();
    let mut renderer = HttpRenderer::new(coordinator.client().clone());

    assert_eq!(coordinator.run_profiles(&mut renderer).await.unwrap(), 1);

    let mut reader = csv::Reader::from_path(&config.profiles.output).unwrap();
    let headers = reader.headers().unwrap().clone();
    let row = reader.records().next().unwrap().unwrap();
    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();

    assert_eq!(headers.len(), 22);
    assert_eq!(&row[column("Name")], "Acme");
    assert_eq!(&row[column("Founders")], "Ada");
    assert_eq!(&row[column("Last Funding Date")], "2022-01-05");
}
