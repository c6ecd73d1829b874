//! Thin wrappers around `quick_xml::Reader` used by the metadata parsers

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{CrawlerError, Result};

/// Create a reader that reports `<tag/>` as a `Start` + `End` pair
pub fn make_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().expand_empty_elements = true;
    reader
}

/// Read all text inside the element whose `Start` event was just consumed
///
/// Child tags are dropped and their text kept, so
/// `<title>CO<sub>2</sub> uptake</title>` reads as `CO2 uptake`.
/// Runs of whitespace are collapsed and the result is trimmed.
pub fn read_text_content(
    reader: &mut Reader<&[u8]>,
    parent_tag: &[u8],
    buf: &mut Vec<u8>,
) -> Result<String> {
    let mut text = String::new();
    let mut depth: u32 = 1;

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == parent_tag {
                    depth += 1;
                }
            }
            Ok(Event::Text(ref e)) => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| CrawlerError::XmlError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(ref e)) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == parent_tag {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
            }
            Ok(Event::Eof) => {
                return Err(CrawlerError::XmlError(format!(
                    "Unexpected end of document inside <{}>",
                    String::from_utf8_lossy(parent_tag)
                )));
            }
            Err(e) => return Err(CrawlerError::XmlError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Attribute value of a start tag, if present
pub fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()?
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}
