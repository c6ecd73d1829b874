//! Batched PMC metadata fetching against a mocked EFetch endpoint

mod common;

use pmc_crawler::{PmcClient, PmcId};
use tracing_test::traced_test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{mock_session, pmc_article, pmc_articleset};

fn pmcids(ids: &[&str]) -> Vec<PmcId> {
    ids.iter().map(|id| PmcId::parse(id).unwrap()).collect()
}

#[tokio::test]
#[traced_test]
async fn test_fetch_metadata_single_batch() {
    let mock_server = MockServer::start().await;

    let body = pmc_articleset(&[
        pmc_article("PMC101", "First article", "2020"),
        pmc_article("PMC102", "Second article", "2021"),
    ]);

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pmc"))
        .and(query_param("id", "101,102"))
        .and(query_param("retmode", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PmcClient::new(mock_session(&mock_server));
    let ids = pmcids(&["PMC101", "PMC102"]);
    let records = client.fetch_metadata(&ids).await;

    assert_eq!(records.len(), 2);
    let first = &records[&ids[0]];
    assert_eq!(first.id, "PMC101");
    assert_eq!(first.title, "First article");
    assert_eq!(first.year, "2020");
    assert_eq!(first.journal, "Test Journal");
    assert_eq!(first.authors, vec!["Ada Tester"]);
    assert_eq!(records[&ids[1]].title, "Second article");
}

#[tokio::test]
#[traced_test]
async fn test_fetch_metadata_splits_into_batches_of_fifty() {
    let mock_server = MockServer::start().await;

    let ids: Vec<PmcId> = (1..=120).map(|n| PmcId::parse(&n.to_string()).unwrap()).collect();

    for chunk in ids.chunks(50) {
        let id_param = chunk
            .iter()
            .map(|id| id.numeric_part().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let articles: Vec<String> = chunk
            .iter()
            .map(|id| pmc_article(&id.to_string(), &format!("Title {id}"), "2022"))
            .collect();

        Mock::given(method("GET"))
            .and(path("/efetch.fcgi"))
            .and(query_param("id", id_param.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(pmc_articleset(&articles)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = PmcClient::new(mock_session(&mock_server));
    let records = client.fetch_metadata(&ids).await;

    assert_eq!(records.len(), 120);
    assert_eq!(records[&ids[119]].title, "Title PMC120");
}

#[tokio::test]
#[traced_test]
async fn test_count_mismatch_drops_batch() {
    let mock_server = MockServer::start().await;

    // three requested, two returned
    let body = pmc_articleset(&[
        pmc_article("PMC1", "One", "2020"),
        pmc_article("PMC2", "Two", "2020"),
    ]);

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = PmcClient::new(mock_session(&mock_server));
    let records = client.fetch_metadata(&pmcids(&["PMC1", "PMC2", "PMC3"])).await;

    assert!(records.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_misattributed_record_is_dropped() {
    let mock_server = MockServer::start().await;

    // response order swapped relative to the request
    let body = pmc_articleset(&[
        pmc_article("PMC2", "Two", "2020"),
        pmc_article("PMC1", "One", "2021"),
        pmc_article("PMC3", "Three", "2022"),
    ]);

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = PmcClient::new(mock_session(&mock_server));
    let ids = pmcids(&["PMC1", "PMC2", "PMC3"]);
    let records = client.fetch_metadata(&ids).await;

    assert_eq!(records.len(), 1);
    assert!(!records.contains_key(&ids[0]));
    assert!(!records.contains_key(&ids[1]));
    assert_eq!(records[&ids[2]].title, "Three");
}

#[tokio::test]
#[traced_test]
async fn test_failed_batch_leaves_ids_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = PmcClient::new(mock_session(&mock_server));
    let records = client.fetch_metadata(&pmcids(&["PMC1", "PMC2"])).await;

    assert!(records.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_malformed_response_leaves_ids_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<pmc-articleset><article><front></article>"),
        )
        .mount(&mock_server)
        .await;

    let client = PmcClient::new(mock_session(&mock_server));
    let records = client.fetch_metadata(&pmcids(&["PMC1"])).await;

    assert!(records.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_empty_input_makes_no_requests() {
    let mock_server = MockServer::start().await;
    let client = PmcClient::new(mock_session(&mock_server));

    let records = client.fetch_metadata(&[]).await;

    assert!(records.is_empty());
    let received_requests = mock_server.received_requests().await.unwrap();
    assert_eq!(received_requests.len(), 0);
}
