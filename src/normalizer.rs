use crate::model::ProductSnapshot;

const UNKNOWN_TITLE: &str = "Unknown Product";

pub fn normalize_snapshot(snapshot: &mut ProductSnapshot) {
    snapshot.title = normalize_title(&snapshot.title);
    snapshot.currency = snapshot.currency.trim().to_uppercase();
}

/// Collapses runs of whitespace; empty titles fall back to a placeholder.
pub fn normalize_title(raw: &str) -> String {
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        title
    }
}

/// Pulls the first number out of a price label like `$1,299.99`, `29,99 €`
/// or `1.299,00 €`. The last separator is the decimal one when both kinds
/// appear; a lone separator followed by exactly three digits groups thousands.
pub fn parse_price_text(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let token: &str = {
        let rest = &text[start..];
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
            .unwrap_or(rest.len());
        rest[..end].trim_end_matches([',', '.'])
    };

    let decimal = match (token.rfind(','), token.rfind('.')) {
        (Some(comma), Some(dot)) => Some(if comma > dot { ',' } else { '.' }),
        (Some(pos), None) | (None, Some(pos)) => {
            let sep = if token[pos..].starts_with(',') { ',' } else { '.' };
            let repeated = token.matches(sep).count() > 1;
            let fraction_len = token.len() - pos - 1;
            if repeated || fraction_len == 3 { None } else { Some(sep) }
        }
        (None, None) => None,
    };

    let digits: String = token
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            c if Some(c) == decimal => Some('.'),
            _ => None,
        })
        .collect();
    digits.parse::<f64>().ok()
}

/// Guesses the ISO currency code from the symbol in a price label.
pub fn detect_currency(text: &str) -> Option<&'static str> {
    if text.contains('$') {
        Some("USD")
    } else if text.contains('€') {
        Some("EUR")
    } else if text.contains('£') {
        Some("GBP")
    } else if text.contains('¥') {
        Some("JPY")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_common_price_labels() {
        assert_eq!(parse_price_text("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price_text("29."), Some(29.0));
        assert_eq!(parse_price_text("  € 45.50 "), Some(45.5));
        assert_eq!(parse_price_text("Price: 12.5 today"), Some(12.5));
        assert_eq!(parse_price_text("Currently unavailable"), None);
    }

    #[test]
    fn parses_decimal_comma_labels() {
        assert_eq!(parse_price_text("29,99 €"), Some(29.99));
        assert_eq!(parse_price_text("1.299,00 €"), Some(1299.0));
        assert_eq!(parse_price_text("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price_text("1.234.567 ¥"), Some(1234567.0));
        assert_eq!(parse_price_text("£1,299"), Some(1299.0));
        assert_eq!(parse_price_text("EUR 5,5"), Some(5.5));
    }

    #[test]
    fn detects_currency_symbols() {
        assert_eq!(detect_currency("$19.99"), Some("USD"));
        assert_eq!(detect_currency("19,99 €"), Some("EUR"));
        assert_eq!(detect_currency("£5"), Some("GBP"));
        assert_eq!(detect_currency("19.99"), None);
    }

    #[test]
    fn normalizes_snapshot_fields() {
        let mut snapshot = ProductSnapshot {
            id: "B08N5WRWNW".into(),
            title: "  Echo   Dot\n (4th Gen) ".into(),
            price: 49.99,
            currency: " usd".into(),
            timestamp: Utc::now(),
            url: "https://www.amazon.com/dp/B08N5WRWNW".into(),
        };
        normalize_snapshot(&mut snapshot);
        assert_eq!(snapshot.title, "Echo Dot (4th Gen)");
        assert_eq!(snapshot.currency, "USD");
    }

    #[test]
    fn blank_title_becomes_placeholder() {
        assert_eq!(normalize_title(" \n\t "), UNKNOWN_TITLE);
    }
}
