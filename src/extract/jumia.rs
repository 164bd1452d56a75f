//! Jumia product-page adapter

use super::{
    availability_from_page, first_image, parse_price_number, select_text, ProductRecord,
};
use scraper::Html;

pub(super) fn extract(doc: &Html) -> ProductRecord {
    let title = select_text(doc, &["h1"]).unwrap_or_else(|| "Jumia Product".to_string());

    let price = select_text(doc, &["[data-price]", ".-b.-ltr.-tal.-fs24", ".-fs24"])
        .and_then(|t| parse_price_number(&t));

    let reference_price =
        select_text(doc, &["del", ".-tal.-gy5"]).and_then(|t| parse_price_number(&t));

    ProductRecord {
        title: Some(title),
        price,
        currency: "NGN".to_string(),
        image: first_image(doc),
        availability: availability_from_page(doc, price),
        reference_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Availability;
    use crate::types::Platform;

    const FIXTURE: &str = r#"
<html><body>
  <h1>Infinix Hot 40i 128GB</h1>
  <img src="https://img.jumia.is/hot40i.jpg">
  <span class="-b -ltr -tal -fs24" dir="ltr">₦ 112,500</span>
  <span class="-tal -gy5" dir="ltr">₦ 150,000</span>
</body></html>"#;

    #[test]
    fn extracts_price_title_and_reference() {
        let record = Platform::Jumia.extract(FIXTURE);
        assert_eq!(record.title.as_deref(), Some("Infinix Hot 40i 128GB"));
        assert_eq!(record.price, Some(112_500.0));
        assert_eq!(record.reference_price, Some(150_000.0));
        assert_eq!(record.currency, "NGN");
        assert_eq!(record.availability, Availability::Available);
        assert_eq!(record.image.as_deref(), Some("https://img.jumia.is/hot40i.jpg"));
    }

    #[test]
    fn out_of_stock_wins_over_price() {
        let html = r#"<html><body><h1>Gadget</h1>
            <span class="-fs24">₦ 10,000</span>
            <p>This item is currently Out of Stock</p></body></html>"#;
        let record = Platform::Jumia.extract(html);
        assert_eq!(record.availability, Availability::Unavailable);
    }

    #[test]
    fn missing_price_is_none_with_fallback_title() {
        let record = Platform::Jumia.extract("<html><body><p>nothing here</p></body></html>");
        assert_eq!(record.title.as_deref(), Some("Jumia Product"));
        assert_eq!(record.price, None);
        assert_eq!(record.availability, Availability::Unknown);
    }
}
