//! Shared price-text normalization
//!
//! Marketplace price strings mix currency symbols, thousands separators and
//! decimal commas ("₦ 120,000", "$1,234.56", "120,50"). Normalization rules:
//! with both separators present the comma groups thousands; a lone comma
//! followed by one or two digits is a decimal point, otherwise it groups
//! thousands. Parse failure is `None`, never an error.

/// Parse a human price string into a number, best effort.
pub fn parse_price_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');

    let normalized = if has_comma && has_dot {
        // "1,234.56" style: commas group thousands
        cleaned.replace(',', "")
    } else if has_comma {
        if cleaned.matches(',').count() == 1 {
            match cleaned.split_once(',') {
                Some((whole, frac)) if frac.len() == 1 || frac.len() == 2 => {
                    format!("{}.{}", whole, frac)
                }
                _ => cleaned.replace(',', ""),
            }
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok()
}

/// Find an amount introduced by a currency symbol ("₦ 120,000") anywhere in
/// a text blob and normalize it.
pub fn find_currency_amount(text: &str, symbol: char) -> Option<f64> {
    let idx = text.find(symbol)?;
    let after = &text[idx + symbol.len_utf8()..];

    let mut run = String::new();
    for c in after.chars() {
        if c.is_ascii_digit() || c == ',' || c == '.' {
            run.push(c);
        } else if c.is_whitespace() && run.is_empty() {
            continue; // allow "₦ 120,000"
        } else {
            break;
        }
    }

    if run.chars().any(|c| c.is_ascii_digit()) {
        parse_price_number(&run)
    } else {
        None
    }
}
