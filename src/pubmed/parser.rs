//! Parser for PubMed EFetch XML (`<PubmedArticleSet>`)

use quick_xml::events::Event;
use tracing::{debug, instrument, warn};

use crate::common::xml::{get_attr, make_reader, read_text_content};
use crate::common::{ArticleRecord, PubMedId, UNKNOWN};
use crate::error::{CrawlerError, Result};

#[derive(Default)]
struct ArticleBuilder {
    pmid: Option<String>,
    title: Option<String>,
    authors: Vec<String>,
    journal: Option<String>,
    year: Option<String>,
    doi: Option<String>,
}

impl ArticleBuilder {
    fn build(self) -> Option<(PubMedId, ArticleRecord)> {
        let raw_pmid = self.pmid?;
        let pmid = match PubMedId::parse(&raw_pmid) {
            Ok(pmid) => pmid,
            Err(e) => {
                warn!(pmid = %raw_pmid, error = %e, "Skipping article with invalid PMID");
                return None;
            }
        };

        let record = ArticleRecord {
            id: pmid.to_string(),
            title: non_empty_or_unknown(self.title),
            authors: self.authors,
            journal: non_empty_or_unknown(self.journal),
            year: self.year.unwrap_or_else(|| UNKNOWN.to_string()),
            doi: self.doi,
        };
        Some((pmid, record))
    }
}

fn non_empty_or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Parse every `<PubmedArticle>` in an EFetch response
///
/// Articles are keyed by their own `<PMID>`, so response order does not
/// matter. Articles without a PMID are skipped.
///
/// # Errors
///
/// * `CrawlerError::XmlError` - If the document is not well-formed
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn parse_pubmed_articles(xml: &str) -> Result<Vec<(PubMedId, ArticleRecord)>> {
    let mut reader = make_reader(xml);
    let mut buf = Vec::new();
    let mut text_buf = Vec::new();

    let mut articles = Vec::new();
    let mut current: Option<ArticleBuilder> = None;

    let mut in_author = false;
    let mut in_journal = false;
    let mut in_pub_date = false;
    let mut in_pubmed_data = false;
    let mut in_references = false;
    let mut author_last: Option<String> = None;
    let mut author_fore: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let tag = name.as_ref();

                if tag == b"PubmedArticle" {
                    current = Some(ArticleBuilder::default());
                    buf.clear();
                    continue;
                }

                let Some(article) = current.as_mut() else {
                    buf.clear();
                    continue;
                };

                match tag {
                    b"PMID" if article.pmid.is_none() => {
                        article.pmid = Some(read_text_content(&mut reader, b"PMID", &mut text_buf)?);
                    }
                    b"ArticleTitle" if article.title.is_none() => {
                        article.title =
                            Some(read_text_content(&mut reader, b"ArticleTitle", &mut text_buf)?);
                    }
                    b"Author" => {
                        in_author = true;
                        author_last = None;
                        author_fore = None;
                    }
                    b"LastName" if in_author => {
                        author_last = Some(read_text_content(&mut reader, b"LastName", &mut text_buf)?);
                    }
                    b"ForeName" if in_author => {
                        author_fore = Some(read_text_content(&mut reader, b"ForeName", &mut text_buf)?);
                    }
                    b"Journal" => in_journal = true,
                    b"Title" if in_journal && article.journal.is_none() => {
                        article.journal = Some(read_text_content(&mut reader, b"Title", &mut text_buf)?);
                    }
                    b"PubDate" => in_pub_date = true,
                    b"Year" if in_pub_date && article.year.is_none() => {
                        article.year = Some(read_text_content(&mut reader, b"Year", &mut text_buf)?);
                    }
                    b"PubmedData" => in_pubmed_data = true,
                    b"ReferenceList" => in_references = true,
                    // the article's own ids, not those of its references
                    b"ArticleId" if in_pubmed_data && !in_references && article.doi.is_none() => {
                        let is_doi = get_attr(e, b"IdType").as_deref() == Some("doi");
                        let value = read_text_content(&mut reader, b"ArticleId", &mut text_buf)?;
                        if is_doi && !value.is_empty() {
                            article.doi = Some(value);
                        }
                    }
                    _ => {}
                }
                text_buf.clear();
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"Author" if in_author => {
                    in_author = false;
                    if let (Some(article), Some(last)) = (current.as_mut(), author_last.take()) {
                        if !last.is_empty() {
                            let name = match author_fore.take().filter(|f| !f.is_empty()) {
                                Some(fore) => format!("{fore} {last}"),
                                None => last,
                            };
                            article.authors.push(name);
                        }
                    }
                }
                b"Journal" => in_journal = false,
                b"PubDate" => in_pub_date = false,
                b"PubmedData" => in_pubmed_data = false,
                b"ReferenceList" => in_references = false,
                b"PubmedArticle" => {
                    if let Some(built) = current.take().and_then(ArticleBuilder::build) {
                        articles.push(built);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(CrawlerError::XmlError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    debug!(parsed = articles.len(), "Parsed PubMed articles");
    Ok(articles)
}
