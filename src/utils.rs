// Utility functions
use chrono::{DateTime, Utc};

const PRODUCT_ID_LEN: usize = 10;
const PRODUCT_PATH_MARKERS: [&str; 2] = ["/dp/", "/gp/product/"];

/// Parses an RFC 3339 string into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extracts the ASIN from a product URL such as `/dp/B08N5WRWNW` or
/// `/gp/product/B08N5WRWNW/ref=...`.
pub fn extract_product_id(url: &str) -> Option<String> {
    for marker in PRODUCT_PATH_MARKERS {
        let mut rest = url;
        while let Some(pos) = rest.find(marker) {
            let tail = &rest[pos + marker.len()..];
            let candidate: String = tail.chars().take(PRODUCT_ID_LEN).collect();
            if candidate.len() == PRODUCT_ID_LEN
                && candidate
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            {
                return Some(candidate);
            }
            rest = tail;
        }
    }
    None
}
