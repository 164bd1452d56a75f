//! Konga product-page adapter

use super::{
    availability_from_page, first_image, parse_price_number, select_text, ProductRecord,
};
use scraper::Html;

pub(super) fn extract(doc: &Html) -> ProductRecord {
    let title = select_text(doc, &["h1"]).unwrap_or_else(|| "Konga Product".to_string());

    let price = select_text(doc, &["[data-testid=\"price\"]", ".f6", "span"])
        .and_then(|t| parse_price_number(&t));

    let reference_price =
        select_text(doc, &["del", ".old"]).and_then(|t| parse_price_number(&t));

    ProductRecord {
        title: Some(title),
        price,
        currency: "NGN".to_string(),
        image: first_image(doc),
        availability: availability_from_page(doc, price),
        reference_price,
    }
}
