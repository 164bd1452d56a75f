//! Jiji search-page URL building and result parsing
//!
//! Search pages are anchor soup; the parser keeps only listing-shaped URLs
//! and requires either a nearby ₦ price or a meaningful title before a link
//! counts as a candidate.

use crate::extract::jiji::anchor_title;
use crate::extract::{element_text, find_currency_amount};
use crate::types::SearchCandidate;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

pub const BASE_URL: &str = "https://jiji.ng";

/// Raw candidates taken from one page before ranking
const PAGE_CANDIDATE_CAP: usize = 40;

/// Titles shorter than this are navigation chrome ("Open", "View")
const MIN_TITLE_LEN: usize = 8;

/// Paged search URL, optionally scoped to a location slug
/// (`https://jiji.ng/lagos/search?query=...&page=2`).
pub fn build_search_url(query: &str, location: Option<&str>, page: usize) -> Url {
    let mut url = Url::parse(BASE_URL).expect("static base url");

    let path = match location.map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => format!("/{}/search", slug),
        None => "/search".to_string(),
    };
    url.set_path(&path);

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("query", query.trim());
        if page > 1 {
            pairs.append_pair("page", &page.to_string());
        }
    }
    url
}

/// Location names arrive free-form ("Port Harcourt"); Jiji paths want slugs
fn slugify(location: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for c in location.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !slug.is_empty() {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Parse one search-results page into raw candidates
pub fn parse_search_results(html: &str) -> Vec<SearchCandidate> {
    let doc = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = Url::parse(BASE_URL).expect("static base url");

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href) else {
            continue;
        };
        let url = url.to_string();

        if !seen.insert(url.clone()) {
            continue;
        }
        if !is_probably_listing_url(&url) {
            continue;
        }

        let title = anchor_title(anchor).filter(|t| t.len() >= MIN_TITLE_LEN);
        let price = price_near(anchor);

        // a bare anchor with neither is menu/footer junk
        if price.is_none() && title.is_none() {
            continue;
        }

        let image = anchor_image(anchor);

        candidates.push(SearchCandidate {
            title,
            price,
            currency: "NGN".to_string(),
            url,
            image,
        });

        if candidates.len() >= PAGE_CANDIDATE_CAP {
            break;
        }
    }

    candidates
}

/// Listing pages have long slug paths, `/ad/` segments or `.html` suffixes;
/// everything else (menus, auth, footer links) is rejected.
fn is_probably_listing_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();

    if path.is_empty() || path == "/" {
        return false;
    }

    const NON_LISTING: &[&str] = &[
        "login", "signup", "register", "privacy", "terms", "about", "help", "contact", "search",
    ];
    if NON_LISTING.iter().any(|x| path.contains(x)) {
        return false;
    }

    if path.contains("/ad/") || path.ends_with(".html") {
        return true;
    }

    // long slug-like paths are usually listings too
    path.len() >= 20 && path.matches('/').count() >= 2
}

/// ₦ amount in the anchor or its two nearest ancestors
fn price_near(anchor: ElementRef<'_>) -> Option<f64> {
    let mut node = Some(anchor);
    for _ in 0..3 {
        let el = node?;
        if let Some(price) = find_currency_amount(&element_text(el), '₦') {
            return Some(price);
        }
        node = el.parent().and_then(ElementRef::wrap);
    }
    None
}

fn anchor_image(anchor: ElementRef<'_>) -> Option<String> {
    let Ok(sel) = Selector::parse("img") else {
        return None;
    };
    let img = anchor.select(&sel).next()?;
    img.value()
        .attr("src")
        .or_else(|| img.value().attr("data-src"))
        .map(str::to_string)
}
