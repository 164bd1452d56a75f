//! Per-marketplace extraction adapters
//!
//! Each adapter is a pure, total function from raw markup to a best-effort
//! `ProductRecord`: it never fails on malformed input, it returns
//! `price = None` when no price can be located. Site structure drifts
//! without notice, so adapters are fenced behind static-fixture tests
//! instead of any live-site assumption.

mod amazon;
mod ebay;
pub(crate) mod jiji;
mod jumia;
mod konga;
pub mod price;

pub use price::{find_currency_amount, parse_price_number};

use crate::types::Platform;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Stock state classified from marketplace-specific text heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

/// Normalized product data pulled from one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub currency: String,
    pub image: Option<String>,
    pub availability: Availability,
    /// Pre-discount "was" price when the page shows one
    pub reference_price: Option<f64>,
}

impl Platform {
    /// Extract a product record from raw page markup
    pub fn extract(&self, html: &str) -> ProductRecord {
        let doc = Html::parse_document(html);
        match self {
            Platform::Jumia => jumia::extract(&doc),
            Platform::Konga => konga::extract(&doc),
            Platform::Amazon => amazon::extract(&doc),
            Platform::Ebay => ebay::extract(&doc),
            Platform::Jiji => jiji::extract(&doc),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared selector helpers
// ---------------------------------------------------------------------------

/// Text of an element with whitespace collapsed, like a browser renders it
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty text matched by a prioritized selector list
pub(crate) fn select_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let Ok(parsed) = Selector::parse(sel) else {
            continue;
        };
        if let Some(el) = doc.select(&parsed).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First non-empty attribute matched by a prioritized selector list
pub(crate) fn select_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for sel in selectors {
        let Ok(parsed) = Selector::parse(sel) else {
            continue;
        };
        if let Some(value) = doc
            .select(&parsed)
            .next()
            .and_then(|el| el.value().attr(attr))
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// `src` of the first image on the page, if any
pub(crate) fn first_image(doc: &Html) -> Option<String> {
    select_attr(doc, &["img"], "src")
}

/// Case-insensitive needle search over the whole rendered page text
pub(crate) fn page_text_contains(doc: &Html, needle: &str) -> bool {
    let text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    text.to_lowercase().contains(needle)
}

/// Availability default shared by marketplaces without a stock element:
/// "out of stock" anywhere wins, else a detected price implies available.
pub(crate) fn availability_from_page(doc: &Html, price: Option<f64>) -> Availability {
    if page_text_contains(doc, "out of stock") {
        Availability::Unavailable
    } else if price.is_some() {
        Availability::Available
    } else {
        Availability::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_text_collapses_whitespace() {
        let doc = Html::parse_document("<p>  Apple\n   iPhone   15 </p>");
        let sel = Selector::parse("p").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(el), "Apple iPhone 15");
    }

    #[test]
    fn select_text_respects_priority() {
        let doc = Html::parse_document("<div class='b'>second</div><div class='a'>first</div>");
        assert_eq!(select_text(&doc, &[".a", ".b"]).unwrap(), "first");
        assert_eq!(select_text(&doc, &[".missing", ".b"]).unwrap(), "second");
        assert!(select_text(&doc, &[".missing"]).is_none());
    }

    #[test]
    fn extraction_is_total_on_garbage() {
        for platform in Platform::ALL {
            let record = platform.extract("<<<<not html at all");
            assert!(record.price.is_none());
        }
    }
}
