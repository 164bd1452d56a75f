//! Amazon product-page adapter

use super::{
    first_image, parse_price_number, select_attr, select_text, Availability, ProductRecord,
};
use scraper::Html;

pub(super) fn extract(doc: &Html) -> ProductRecord {
    let title = select_text(doc, &["#productTitle"]).unwrap_or_else(|| "Amazon Product".to_string());

    // price placement varies by listing type
    let price = select_text(
        doc,
        &[
            "#priceblock_ourprice",
            "#priceblock_dealprice",
            ".a-price .a-offscreen",
        ],
    )
    .and_then(|t| parse_price_number(&t));

    let image = select_attr(doc, &["#imgTagWrapperId img"], "src").or_else(|| first_image(doc));

    let availability = match select_text(doc, &["#availability"]) {
        Some(text) => {
            let text = text.to_lowercase();
            if text.contains("in stock") {
                Availability::Available
            } else if text.contains("out of stock") || text.contains("unavailable") {
                Availability::Unavailable
            } else {
                Availability::Unknown
            }
        }
        None => Availability::Unknown,
    };

    let reference_price =
        select_text(doc, &[".a-text-price .a-offscreen"]).and_then(|t| parse_price_number(&t));

    ProductRecord {
        title: Some(title),
        price,
        currency: "USD".to_string(),
        image,
        availability,
        reference_price,
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::Availability;
    use crate::types::Platform;

    const FIXTURE: &str = r#"
<html><body>
  <span id="productTitle"> Anker 737 Power Bank 24000mAh </span>
  <div id="imgTagWrapperId"><img src="https://m.media.example/anker737.jpg"></div>
  <span class="a-price"><span class="a-offscreen">$109.99</span></span>
  <span class="a-text-price"><span class="a-offscreen">$149.99</span></span>
  <div id="availability"><span>In Stock</span></div>
</body></html>"#;

    #[test]
    fn extracts_offscreen_price_and_stock_text() {
        let record = Platform::Amazon.extract(FIXTURE);
        assert_eq!(record.title.as_deref(), Some("Anker 737 Power Bank 24000mAh"));
        assert_eq!(record.price, Some(109.99));
        assert_eq!(record.reference_price, Some(149.99));
        assert_eq!(record.currency, "USD");
        assert_eq!(record.availability, Availability::Available);
        assert_eq!(record.image.as_deref(), Some("https://m.media.example/anker737.jpg"));
    }

    #[test]
    fn classifies_unavailable_stock_text() {
        let html = r#"<html><body><span id="productTitle">Gone</span>
            <div id="availability">Currently unavailable.</div></body></html>"#;
        let record = Platform::Amazon.extract(html);
        assert_eq!(record.availability, Availability::Unavailable);
        assert_eq!(record.price, None);
    }

    #[test]
    fn no_availability_element_is_unknown() {
        let record = Platform::Amazon.extract("<html><body></body></html>");
        assert_eq!(record.availability, Availability::Unknown);
        assert_eq!(record.title.as_deref(), Some("Amazon Product"));
    }
}
