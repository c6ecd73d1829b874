//! Metadata extraction from PMC EFetch XML (`<pmc-articleset>`)
//!
//! Only the bibliographic front matter is read. Each top-level `<article>`
//! yields one [`PmcArticleMeta`], in document order; nested `<sub-article>`
//! elements are skipped.

use quick_xml::events::Event;
use tracing::{debug, instrument};

use crate::common::xml::{get_attr, make_reader, read_text_content};
use crate::common::{ArticleRecord, PmcId, UNKNOWN};
use crate::error::{CrawlerError, Result};

/// Metadata of one `<article>` plus the PMC id it declares about itself
#[derive(Debug, Clone, PartialEq)]
pub struct PmcArticleMeta {
    /// `article-id` with `pub-id-type` `pmc` or `pmcid`, if present
    pub embedded_id: Option<PmcId>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<String>,
    pub doi: Option<String>,
}

impl PmcArticleMeta {
    fn empty() -> Self {
        Self {
            embedded_id: None,
            title: None,
            authors: Vec::new(),
            journal: None,
            year: None,
            doi: None,
        }
    }

    /// Build the record for `pmcid`, filling gaps with placeholders
    pub fn into_record(self, pmcid: PmcId) -> ArticleRecord {
        ArticleRecord {
            id: pmcid.to_string(),
            title: self.title.unwrap_or_else(|| UNKNOWN.to_string()),
            authors: self.authors,
            journal: self.journal.unwrap_or_else(|| UNKNOWN.to_string()),
            year: self.year.unwrap_or_default(),
            doi: self.doi,
        }
    }
}

#[derive(Default)]
struct ContribState {
    is_author: bool,
    surname: Option<String>,
    given_names: Option<String>,
}

impl ContribState {
    fn author_name(self) -> Option<String> {
        if !self.is_author {
            return None;
        }
        let surname = self.surname.filter(|s| !s.is_empty())?;
        Some(match self.given_names.filter(|g| !g.is_empty()) {
            Some(given) => format!("{given} {surname}"),
            None => surname,
        })
    }
}

/// Parse the top-level articles of a PMC EFetch response
///
/// # Errors
///
/// * `CrawlerError::XmlError` - If the document is not well-formed
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn parse_pmc_articles(xml: &str) -> Result<Vec<PmcArticleMeta>> {
    let mut reader = make_reader(xml);
    let mut buf = Vec::new();
    let mut text_buf = Vec::new();

    let mut articles = Vec::new();
    let mut current: Option<PmcArticleMeta> = None;
    let mut article_depth: u32 = 0;
    let mut sub_article_depth: u32 = 0;
    let mut in_front = false;
    let mut in_title_group = false;
    let mut in_pub_date = false;
    let mut contrib: Option<ContribState> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let tag = name.as_ref();

                if tag == b"sub-article" {
                    sub_article_depth += 1;
                }
                if sub_article_depth > 0 {
                    buf.clear();
                    continue;
                }

                if tag == b"article" {
                    article_depth += 1;
                    if article_depth == 1 {
                        current = Some(PmcArticleMeta::empty());
                    }
                }

                if tag == b"front" && current.is_some() {
                    in_front = true;
                }

                // back matter describes cited works, not this article
                if let Some(meta) = current.as_mut().filter(|_| in_front) {
                    match tag {
                        b"title-group" => in_title_group = true,
                        b"article-title" if in_title_group && meta.title.is_none() => {
                            let title =
                                read_text_content(&mut reader, b"article-title", &mut text_buf)?;
                            if !title.is_empty() {
                                meta.title = Some(title);
                            }
                        }
                        b"contrib" => {
                            contrib = Some(ContribState {
                                is_author: get_attr(e, b"contrib-type").as_deref()
                                    == Some("author"),
                                ..Default::default()
                            });
                        }
                        b"surname" => {
                            if let Some(state) = contrib.as_mut() {
                                state.surname =
                                    Some(read_text_content(&mut reader, b"surname", &mut text_buf)?);
                            }
                        }
                        b"given-names" => {
                            if let Some(state) = contrib.as_mut() {
                                state.given_names = Some(read_text_content(
                                    &mut reader,
                                    b"given-names",
                                    &mut text_buf,
                                )?);
                            }
                        }
                        b"journal-title" if meta.journal.is_none() => {
                            let journal =
                                read_text_content(&mut reader, b"journal-title", &mut text_buf)?;
                            if !journal.is_empty() {
                                meta.journal = Some(journal);
                            }
                        }
                        b"pub-date" => in_pub_date = true,
                        b"year" if in_pub_date && meta.year.is_none() => {
                            let year = read_text_content(&mut reader, b"year", &mut text_buf)?;
                            if !year.is_empty() {
                                meta.year = Some(year);
                            }
                        }
                        b"article-id" => {
                            let id_type = get_attr(e, b"pub-id-type");
                            let value = read_text_content(&mut reader, b"article-id", &mut text_buf)?;
                            match id_type.as_deref() {
                                Some("pmc") | Some("pmcid") if meta.embedded_id.is_none() => {
                                    meta.embedded_id = PmcId::parse(&value).ok();
                                }
                                Some("doi") if meta.doi.is_none() && !value.is_empty() => {
                                    meta.doi = Some(value);
                                }
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
                text_buf.clear();
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"sub-article" => sub_article_depth = sub_article_depth.saturating_sub(1),
                _ if sub_article_depth > 0 => {}
                b"article" => {
                    article_depth = article_depth.saturating_sub(1);
                    if article_depth == 0 {
                        if let Some(meta) = current.take() {
                            articles.push(meta);
                        }
                    }
                }
                b"contrib" => {
                    if let (Some(state), Some(meta)) = (contrib.take(), current.as_mut()) {
                        if let Some(name) = state.author_name() {
                            meta.authors.push(name);
                        }
                    }
                }
                b"pub-date" => in_pub_date = false,
                b"title-group" => in_title_group = false,
                b"front" => in_front = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(CrawlerError::XmlError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    debug!(parsed = articles.len(), "Parsed PMC articles");
    Ok(articles)
}
