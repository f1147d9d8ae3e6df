// Amazon product page parsing
use crate::model::{ParserError, ProductSnapshot};
use crate::normalizer::{detect_currency, parse_price_text};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

const TITLE_SELECTOR: &str = "span#productTitle";

/// Price locations in the order they are tried. The offscreen label carries
/// the full amount; the whole-number span drops the cents.
const PRICE_SELECTORS: [&str; 4] = [
    "span.a-offscreen",
    "span.a-price-whole",
    "span#priceblock_ourprice",
    "span#priceblock_dealprice",
];

pub trait Parser {
    fn parse(
        &self,
        html: &str,
        id: &str,
        url: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<ProductSnapshot, ParserError>;
}

pub struct AmazonParser {
    default_currency: String,
}

impl AmazonParser {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
        }
    }

    fn selector(css: &str) -> Result<Selector, ParserError> {
        Selector::parse(css).map_err(|e| ParserError::Selector(e.to_string()))
    }
}

impl Parser for AmazonParser {
    fn parse(
        &self,
        html: &str,
        id: &str,
        url: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<ProductSnapshot, ParserError> {
        let document = Html::parse_document(html);

        let title_selector = Self::selector(TITLE_SELECTOR)?;
        let title = document
            .select(&title_selector)
            .next()
            .map(|node| node.text().collect::<String>())
            .unwrap_or_default();

        let mut found = None;
        for css in PRICE_SELECTORS {
            let selector = Self::selector(css)?;
            let Some(node) = document.select(&selector).next() else {
                continue;
            };
            let text = node.text().collect::<String>();
            if let Some(price) = parse_price_text(&text) {
                found = Some((price, text));
                break;
            }
        }

        let (price, price_text) = found.ok_or_else(|| ParserError::MissingField("price".into()))?;

        // The whole-number span carries no symbol; look for one in any offscreen label.
        let currency = detect_currency(&price_text)
            .or_else(|| {
                let offscreen = Self::selector("span.a-offscreen").ok()?;
                let text = document.select(&offscreen).next()?.text().collect::<String>();
                detect_currency(&text)
            })
            .map(str::to_string)
            .unwrap_or_else(|| self.default_currency.clone());

        Ok(ProductSnapshot {
            id: id.to_string(),
            title,
            price,
            currency,
            timestamp: fetched_at,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.amazon.com/dp/B08N5WRWNW";

    fn parse(html: &str) -> Result<ProductSnapshot, ParserError> {
        AmazonParser::new("USD").parse(html, "B08N5WRWNW", URL, Utc::now())
    }

    #[test]
    fn parses_title_and_offscreen_price() {
        let html = r#"
            <html><body>
              <span id="productTitle">  Echo Dot (4th Gen)  </span>
              <span class="a-price"><span class="a-offscreen">$1,049.99</span></span>
            </body></html>"#;
        let snapshot = parse(html).unwrap();
        assert_eq!(snapshot.title.trim(), "Echo Dot (4th Gen)");
        assert_eq!(snapshot.price, 1049.99);
        assert_eq!(snapshot.currency, "USD");
        assert_eq!(snapshot.id, "B08N5WRWNW");
        assert_eq!(snapshot.url, URL);
    }

    #[test]
    fn offscreen_label_keeps_the_cents() {
        let html = r#"
            <span id="productTitle">Kettle</span>
            <span class="a-price-whole">29,</span><span class="a-price-fraction">99</span>
            <span class="a-offscreen">29,99 €</span>"#;
        let snapshot = parse(html).unwrap();
        assert_eq!(snapshot.price, 29.99);
        assert_eq!(snapshot.currency, "EUR");
    }

    #[test]
    fn whole_price_is_used_without_offscreen_label() {
        let html = r#"
            <span id="productTitle">Kettle</span>
            <span class="a-price-whole">1.299,</span>"#;
        let snapshot = parse(html).unwrap();
        assert_eq!(snapshot.price, 1299.0);
        assert_eq!(snapshot.currency, "USD");
    }

    #[test]
    fn falls_back_to_legacy_price_blocks() {
        let html = r#"<span id="priceblock_dealprice">£15.00</span>"#;
        let snapshot = parse(html).unwrap();
        assert_eq!(snapshot.price, 15.0);
        assert_eq!(snapshot.currency, "GBP");
        assert_eq!(snapshot.title, "");
    }

    #[test]
    fn missing_price_is_an_error() {
        let html = r#"<span id="productTitle">No price here</span>"#;
        assert!(matches!(parse(html), Err(ParserError::MissingField(_))));
    }
}
