//! Markup helpers
//!
//! HTML goes in through `scraper` (html5ever underneath), XML goes out through
//! `quick-xml`'s writer. Parsed documents are not `Send`, so callers parse and
//! extract synchronously and never hold an [`Html`] across an `.await`.

use crate::error::{Result, WebUiError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Display;

/// Parse a full HTML document
pub fn parse_html(text: &str) -> Html {
    Html::parse_document(text)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| WebUiError::protocol(format!("bad selector {:?}: {}", css, e)))
}

/// All elements matching a CSS selector, in document order
pub fn select_all<'a>(html: &'a Html, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let selector = selector(css)?;
    Ok(html.select(&selector).collect())
}

/// First element matching a CSS selector, or a protocol error naming the selector
pub fn select_first<'a>(html: &'a Html, css: &str) -> Result<ElementRef<'a>> {
    let selector = selector(css)?;
    html.select(&selector)
        .next()
        .ok_or_else(|| WebUiError::protocol(format!("no element matches {:?}", css)))
}

/// Text nodes that precede the first child element
pub fn leading_text(element: &ElementRef<'_>) -> String {
    element
        .children()
        .map_while(|node| node.value().as_text().map(|t| t.to_string()))
        .collect()
}

pub(crate) fn xml_error(e: impl Display) -> WebUiError {
    WebUiError::Serialization(e.to_string())
}

// =============================================================================
// XML OUTPUT
// =============================================================================

/// Small wrapper around `quick_xml::Writer` for building request documents
pub struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    pub fn start(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<&mut Self> {
        let mut start = BytesStart::new(tag);
        for attr in attributes {
            start.push_attribute(*attr);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_error)?;
        Ok(self)
    }

    pub fn end(&mut self, tag: &str) -> Result<&mut Self> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(xml_error)?;
        Ok(self)
    }

    /// `<tag>text</tag>` with the text escaped
    pub fn text_element(&mut self, tag: &str, text: &str) -> Result<&mut Self> {
        self.start(tag, &[])?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.end(tag)
    }

    pub fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}
