//! Jiji listing-page adapter
//!
//! Jiji pages are classifieds rather than a storefront: no stock element,
//! no reference price, and the layout shifts often, so the price chain ends
//! with a whole-page ₦ scan.

use super::{
    element_text, find_currency_amount, parse_price_number, select_attr, select_text,
    Availability, ProductRecord,
};
use scraper::{Html, Selector};

pub(super) fn extract(doc: &Html) -> ProductRecord {
    let title = select_text(doc, &["h1"])
        .or_else(|| select_attr(doc, &["meta[property=\"og:title\"]"], "content"));

    let price = select_text(
        doc,
        &[
            "[data-testid=\"ad-price\"]",
            ".qa-advert-price",
            ".b-advert-title__price",
            ".b-advert-price",
            ".price",
        ],
    )
    .and_then(|t| parse_price_number(&t))
    .or_else(|| {
        let text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
        find_currency_amount(&text, '₦')
    });

    let image = select_attr(doc, &["meta[property=\"og:image\"]"], "content")
        .or_else(|| first_http_image(doc));

    // a removed listing serves a soft 404 page with the old URL
    let title_lower = title.as_deref().unwrap_or("").to_lowercase();
    let availability = if title_lower.contains("not found") || title_lower.contains("404") {
        Availability::Unavailable
    } else {
        Availability::Available
    };

    ProductRecord {
        title,
        price,
        currency: "NGN".to_string(),
        image,
        availability,
        reference_price: None,
    }
}

/// First image with an absolute src (or lazy-loaded data-src)
fn first_http_image(doc: &Html) -> Option<String> {
    let Ok(sel) = Selector::parse("img") else {
        return None;
    };
    for img in doc.select(&sel) {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"));
        if let Some(src) = src {
            if src.starts_with("http") {
                return Some(src.to_string());
            }
        }
    }
    None
}

/// Title and nearby ₦ price for one search-result anchor; shared with the
/// search-page parser.
pub(crate) fn anchor_title(el: scraper::ElementRef<'_>) -> Option<String> {
    if let Some(label) = el
        .value()
        .attr("aria-label")
        .or_else(|| el.value().attr("title"))
    {
        let label = label.trim();
        if !label.is_empty() {
            return Some(label.to_string());
        }
    }
    let text = element_text(el);
    if text.len() >= 8 {
        Some(text)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::Availability;
    use crate::types::Platform;

    const FIXTURE: &str = r#"
<html><head>
  <meta property="og:title" content="Clean UK Used iPhone 13 128GB">
  <meta property="og:image" content="https://pictures-nigeria.example/iphone13.webp">
</head><body>
  <h1>Clean UK Used iPhone 13 128GB</h1>
  <div class="qa-advert-price">₦ 385,000</div>
</body></html>"#;

    #[test]
    fn extracts_listing_fields() {
        let record = Platform::Jiji.extract(FIXTURE);
        assert_eq!(record.title.as_deref(), Some("Clean UK Used iPhone 13 128GB"));
        assert_eq!(record.price, Some(385_000.0));
        assert_eq!(record.currency, "NGN");
        assert_eq!(record.reference_price, None);
        assert_eq!(record.availability, Availability::Available);
        assert_eq!(
            record.image.as_deref(),
            Some("https://pictures-nigeria.example/iphone13.webp")
        );
    }

    #[test]
    fn falls_back_to_page_wide_naira_scan() {
        let html = r#"<html><body><h1>Samsung A15</h1>
            <div>Going for ₦ 142,000 slightly negotiable</div></body></html>"#;
        let record = Platform::Jiji.extract(html);
        assert_eq!(record.price, Some(142_000.0));
    }

    #[test]
    fn soft_404_marks_unavailable() {
        let html = "<html><body><h1>Page not found</h1></body></html>";
        let record = Platform::Jiji.extract(html);
        assert_eq!(record.availability, Availability::Unavailable);
        assert_eq!(record.price, None);
    }

    #[test]
    fn no_title_anywhere_is_none() {
        let record = Platform::Jiji.extract("<html><body><div>bare</div></body></html>");
        assert!(record.title.is_none());
    }
}
