//! eBay product-page adapter

use super::{
    availability_from_page, first_image, parse_price_number, select_attr, select_text,
    ProductRecord,
};
use scraper::Html;

pub(super) fn extract(doc: &Html) -> ProductRecord {
    let title = select_text(doc, &["h1#itemTitle", "h1"])
        .map(|t| t.replace("Details about", "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "eBay Product".to_string());

    let price = select_text(
        doc,
        &["#prcIsum", ".x-price-primary span", "[itemprop=price]"],
    )
    .and_then(|t| parse_price_number(&t));

    // currency usually lives in a meta tag rather than the price element
    let currency = select_attr(doc, &["meta[itemprop=\"priceCurrency\"]"], "content")
        .unwrap_or_else(|| "USD".to_string());

    let image = select_attr(doc, &["#icImg"], "src").or_else(|| first_image(doc));

    let reference_price =
        select_text(doc, &[".notranslate.ms-2", "del"]).and_then(|t| parse_price_number(&t));

    ProductRecord {
        title: Some(title),
        price,
        currency,
        image,
        availability: availability_from_page(doc, price),
        reference_price,
    }
}
