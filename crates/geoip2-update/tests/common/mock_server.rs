//! Mock server helpers for the MaxMind endpoints
//!
//! Every mock requires the test credentials, so a request without valid
//! Basic auth falls through to wiremock's default 404.

use geoip2_core::Edition;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::archives::database_archive_bytes;
use super::constants::*;

pub fn update_path(edition: Edition) -> String {
    format!("/geoip/databases/{}/update", edition)
}

pub fn download_path(edition: Edition) -> String {
    format!("/geoip/databases/{}/download", edition)
}

/// Catalog endpoint answering with `{"date": <date>}`
pub async fn mock_update_info(server: &MockServer, edition: Edition, date: &str) {
    Mock::given(method("GET"))
        .and(path(update_path(edition)))
        .and(basic_auth(ACCOUNT_ID, LICENSE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "edition_id": edition.as_str(),
            "date": date,
        })))
        .mount(server)
        .await;
}

/// Catalog endpoint answering with an arbitrary status and body
pub async fn mock_update_raw(server: &MockServer, edition: Edition, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(update_path(edition)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Download endpoint serving `content` for the given compact date
pub async fn mock_download(server: &MockServer, edition: Edition, date: &str, content: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(download_path(edition)))
        .and(query_param("date", date))
        .and(query_param("suffix", "tar.gz"))
        .and(basic_auth(ACCOUNT_ID, LICENSE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
}

/// Download endpoint that always fails with `status`
pub async fn mock_failing_download(server: &MockServer, edition: Edition, status: u16) {
    Mock::given(method("GET"))
        .and(path(download_path(edition)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Catalog and download endpoints for a full successful update
pub async fn mock_edition_release(server: &MockServer, edition: Edition, date: &str) {
    mock_update_info(server, edition, date).await;
    mock_download(
        server,
        edition,
        &date.replace('-', ""),
        database_archive_bytes(edition, date),
    )
    .await;
}
