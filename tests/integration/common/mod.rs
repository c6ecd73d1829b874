//! Shared helpers for the mocked integration tests
#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use pmc_crawler::{ClientConfig, HttpSession, RetryConfig};
use wiremock::MockServer;

/// Config pointing every endpoint at the mock server, without pacing
pub fn mock_config(mock_server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_oa_base_url(format!("{}/oa.fcgi", mock_server.uri()))
        .with_request_delay(Duration::ZERO)
        .with_retry_config(
            RetryConfig::new()
                .with_max_retries(1)
                .with_base_delay(Duration::from_millis(10)),
        )
}

pub fn mock_session(mock_server: &MockServer) -> HttpSession {
    HttpSession::new(mock_config(mock_server)).unwrap()
}

/// A fake PDF body of exactly `size` bytes
pub fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut body = b"%PDF-1.7\n".to_vec();
    body.resize(size, b'x');
    body
}

/// Deterministic bytes that gzip cannot shrink much
pub fn noise(size: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// ESearch JSON listing `ids`
pub fn esearch_json(ids: &[&str]) -> String {
    serde_json::json!({
        "header": { "type": "esearch", "version": "0.3" },
        "esearchresult": {
            "count": ids.len().to_string(),
            "retmax": ids.len().to_string(),
            "retstart": "0",
            "idlist": ids,
            "querytranslation": "test[All Fields]"
        }
    })
    .to_string()
}

/// One PMC `<article>` element
pub fn pmc_article(pmcid: &str, title: &str, year: &str) -> String {
    format!(
        r#"<article>
  <front>
    <journal-meta><journal-title-group><journal-title>Test Journal</journal-title></journal-title-group></journal-meta>
    <article-meta>
      <article-id pub-id-type="pmcid">{pmcid}</article-id>
      <title-group><article-title>{title}</article-title></title-group>
      <contrib-group>
        <contrib contrib-type="author"><name><surname>Tester</surname><given-names>Ada</given-names></name></contrib>
      </contrib-group>
      <pub-date pub-type="epub"><year>{year}</year></pub-date>
    </article-meta>
  </front>
</article>"#
    )
}

/// A PMC EFetch document wrapping `articles`
pub fn pmc_articleset(articles: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" ?>\n<pmc-articleset>\n{}\n</pmc-articleset>",
        articles.join("\n")
    )
}

/// OA service response with one link
pub fn oa_response(pmcid: &str, format: &str, href: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OA><responseDate>2024-01-01 00:00:00</responseDate>
<request id="{pmcid}">oa.fcgi?id={pmcid}</request>
<records returned-count="1" total-count="1">
<record id="{pmcid}" citation="Test" license="CC BY" retracted="no">
<link format="{format}" updated="2024-01-01 00:00:00" href="{href}"/>
</record>
</records>
</OA>"#
    )
}

/// OA service response for an article outside the Open Access subset
pub fn oa_not_open_access(pmcid: &str) -> String {
    format!(
        r#"<OA><responseDate>2024-01-01 00:00:00</responseDate>
<request id="{pmcid}">oa.fcgi?id={pmcid}</request>
<error code="idIsNotOpenAccess">identifier '{pmcid}' is not Open Access</error>
</OA>"#
    )
}

/// Gzipped tar archive holding `entries` in order
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    let mut encoder = builder.into_inner().unwrap();
    encoder.flush().unwrap();
    encoder.finish().unwrap()
}
