//! Whole crawl runs against a mocked NCBI

mod common;

use pmc_crawler::crawler::LOG_FILE_NAME;
use pmc_crawler::{CrawlRequest, CrawlSummary, Crawler, CrawlerError, DownloadStatus, SearchDb};
use tempfile::TempDir;
use tracing_test::traced_test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    esearch_json, mock_session, oa_not_open_access, oa_response, pdf_bytes, pmc_article,
    pmc_articleset,
};

async fn mount_search(mock_server: &MockServer, db: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", db))
        .respond_with(ResponseTemplate::new(200).set_body_string(esearch_json(ids)))
        .mount(mock_server)
        .await;
}

async fn mount_pdf(mock_server: &MockServer, pmcid: &str, size: usize) {
    let file_path = format!("/files/{pmcid}.pdf");
    let href = format!("{}{}", mock_server.uri(), file_path);

    Mock::given(method("GET"))
        .and(path("/oa.fcgi"))
        .and(query_param("id", pmcid))
        .respond_with(ResponseTemplate::new(200).set_body_string(oa_response(pmcid, "pdf", &href)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_bytes(size)))
        .mount(mock_server)
        .await;
}

async fn mount_pmc_metadata(mock_server: &MockServer) {
    let body = pmc_articleset(&[
        pmc_article("PMC1", "Deep learning: a review", "2021"),
        pmc_article("PMC2", "Protein folding", "2019"),
    ]);

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pmc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(mock_server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_crawl_downloads_every_open_access_article() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &["PMC1", "PMC2"]).await;
    mount_pmc_metadata(&mock_server).await;
    mount_pdf(&mock_server, "PMC1", 4096).await;
    mount_pdf(&mock_server, "PMC2", 2048).await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let request = CrawlRequest::new("test", dir.path()).with_max_results(2);

    let summary = crawler.run(&request).await.unwrap();

    assert_eq!(summary.query, "test");
    assert_eq!(summary.total_found, 2);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.details.len(), 2);
    assert!(summary.details.iter().all(|d| d.status == DownloadStatus::DirectPdf));
    assert_eq!(summary.details[0].pmc_id, "PMC1");
    assert_eq!(
        summary.details[0].filename.as_deref(),
        Some("PMC1_2021_Deep_learning_a_review.pdf")
    );

    let first = dir.path().join("PMC1_2021_Deep_learning_a_review.pdf");
    assert_eq!(std::fs::metadata(first).unwrap().len(), 4096);
    assert!(dir.path().join("PMC2_2019_Protein_folding.pdf").exists());

    let log: CrawlSummary =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(log, summary);
}

#[tokio::test]
#[traced_test]
async fn test_second_run_reports_existing_files() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &["1", "2"]).await;
    mount_pmc_metadata(&mock_server).await;
    mount_pdf(&mock_server, "PMC1", 4096).await;
    mount_pdf(&mock_server, "PMC2", 2048).await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let request = CrawlRequest::new("test", dir.path()).with_max_results(2);

    crawler.run(&request).await.unwrap();
    let requests_after_first = mock_server.received_requests().await.unwrap().len();

    let summary = crawler.run(&request).await.unwrap();

    assert_eq!(summary.downloaded, 2);
    assert!(
        summary
            .details
            .iter()
            .all(|d| d.status == DownloadStatus::AlreadyExists)
    );
    // only search and metadata are requested again
    let requests_after_second = mock_server.received_requests().await.unwrap().len();
    assert_eq!(requests_after_second - requests_after_first, 2);
}

#[tokio::test]
#[traced_test]
async fn test_failures_are_recorded_without_aborting() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &["1", "2"]).await;
    mount_pmc_metadata(&mock_server).await;
    mount_pdf(&mock_server, "PMC1", 4096).await;

    Mock::given(method("GET"))
        .and(path("/oa.fcgi"))
        .and(query_param("id", "PMC2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(oa_not_open_access("PMC2")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let request = CrawlRequest::new("test", dir.path()).with_max_results(2);

    let summary = crawler.run(&request).await.unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.details[1].status, DownloadStatus::NoOaLink);
    assert_eq!(summary.details[1].filename, None);
    assert!(dir.path().join(LOG_FILE_NAME).exists());
}

#[tokio::test]
#[traced_test]
async fn test_malformed_search_id_is_logged_as_failure() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &["1", "abc", "2"]).await;
    mount_pmc_metadata(&mock_server).await;
    mount_pdf(&mock_server, "PMC1", 4096).await;
    mount_pdf(&mock_server, "PMC2", 2048).await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let summary = crawler
        .run(&CrawlRequest::new("test", dir.path()).with_max_results(3))
        .await
        .unwrap();

    assert_eq!(summary.total_found, 3);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded + summary.failed, summary.total_found);

    let ids: Vec<&str> = summary.details.iter().map(|d| d.pmc_id.as_str()).collect();
    assert_eq!(ids, vec!["PMC1", "abc", "PMC2"]);
    assert_eq!(summary.details[1].status, DownloadStatus::NoOaLink);
    assert_eq!(summary.details[1].filename, None);
}

#[tokio::test]
#[traced_test]
async fn test_metadata_failure_uses_placeholders() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &["1"]).await;
    mount_pdf(&mock_server, "PMC1", 4096).await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let summary = crawler
        .run(&CrawlRequest::new("test", dir.path()).with_max_results(1))
        .await
        .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.details[0].title, "Unknown");
    assert!(dir.path().join("PMC1__Unknown.pdf").exists());
}

#[tokio::test]
#[traced_test]
async fn test_no_results_aborts_without_log() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pmc", &[]).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");
    let crawler = Crawler::with_session(mock_session(&mock_server));

    let result = crawler.run(&CrawlRequest::new("nothing", &output)).await;

    assert!(matches!(result, Err(CrawlerError::NoSearchResults { .. })));
    assert!(output.is_dir());
    assert!(!output.join(LOG_FILE_NAME).exists());
}

#[tokio::test]
#[traced_test]
async fn test_failed_search_is_treated_as_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));

    let result = crawler.run(&CrawlRequest::new("test", dir.path())).await;

    assert!(matches!(result, Err(CrawlerError::NoSearchResults { .. })));
}

#[tokio::test]
#[traced_test]
async fn test_pubmed_source_maps_to_pmc() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "pubmed", &["31978945", "33515491"]).await;

    let elink = r#"{
        "linksets": [
            {
                "dbfrom": "pubmed",
                "ids": ["31978945"],
                "linksetdbs": [{"dbto": "pmc", "linkname": "pubmed_pmc", "links": ["7094943"]}]
            },
            {"dbfrom": "pubmed", "ids": ["33515491"]}
        ]
    }"#;
    Mock::given(method("GET"))
        .and(path("/elink.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(elink))
        .mount(&mock_server)
        .await;

    let pubmed_xml = r#"<PubmedArticleSet>
    <PubmedArticle>
        <MedlineCitation>
            <PMID Version="1">31978945</PMID>
            <Article>
                <Journal><JournalIssue><PubDate><Year>2020</Year></PubDate></JournalIssue><Title>Nature</Title></Journal>
                <ArticleTitle>A new coronavirus</ArticleTitle>
            </Article>
        </MedlineCitation>
    </PubmedArticle>
</PubmedArticleSet>"#;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pubmed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(pubmed_xml))
        .mount(&mock_server)
        .await;

    mount_pdf(&mock_server, "PMC7094943", 4096).await;

    let dir = TempDir::new().unwrap();
    let crawler = Crawler::with_session(mock_session(&mock_server));
    let request = CrawlRequest::new("coronavirus", dir.path()).with_source(SearchDb::PubMed);

    let summary = crawler.run(&request).await.unwrap();

    assert_eq!(summary.total_found, 2);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.details[0].pmc_id, "PMC7094943");
    assert_eq!(summary.details[0].status, DownloadStatus::DirectPdf);
    assert_eq!(summary.details[1].pmc_id, "33515491");
    assert_eq!(summary.details[1].status, DownloadStatus::NoOaLink);
    assert!(
        dir.path()
            .join("PMC7094943_2020_A_new_coronavirus.pdf")
            .exists()
    );
}
