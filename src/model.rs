// Core structs: Observation, History, ProductSnapshot, plus per-layer errors
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A single timestamped price sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub price: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(price: f64, currency: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            price,
            currency: currency.into(),
            timestamp,
        }
    }

    /// Checks the fields a stored observation must satisfy.
    pub fn validate(&self) -> Result<(), ObservationError> {
        if !self.price.is_finite() {
            return Err(ObservationError::NonFinitePrice);
        }
        if self.price < 0.0 {
            return Err(ObservationError::NegativePrice(self.price));
        }
        if self.currency.trim().is_empty() {
            return Err(ObservationError::MissingCurrency);
        }
        Ok(())
    }
}

/// Full price history of one product, in append order.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub id: String,
    pub title: String,
    pub source_url: String,
    pub observations: Vec<Observation>,
}

impl History {
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }
}

/// Structured record produced by the fetch adapter for one product page.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

impl ProductSnapshot {
    pub fn observation(&self) -> Observation {
        Observation::new(self.price, self.currency.clone(), self.timestamp)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("product identifier is empty")]
    EmptyIdentifier,
    #[error("price {0} is negative")]
    NegativePrice(f64),
    #[error("price is not a finite number")]
    NonFinitePrice,
    #[error("currency is missing")]
    MissingCurrency,
    #[error("timestamp {new} is earlier than the last stored observation ({last})")]
    OutOfOrder {
        last: DateTime<Utc>,
        new: DateTime<Utc>,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt record for {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("malformed observation rejected: {0}")]
    Malformed(#[from] ObservationError),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response status {0}")]
    InvalidResponse(u16),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("missing field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("could not extract a product id from {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(price: f64, currency: &str) -> Observation {
        Observation::new(price, currency, Utc::now())
    }

    #[test]
    fn validate_accepts_zero_price() {
        assert_eq!(obs(0.0, "USD").validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_fields() {
        assert_eq!(obs(-1.0, "USD").validate(), Err(ObservationError::NegativePrice(-1.0)));
        assert_eq!(obs(f64::NAN, "USD").validate(), Err(ObservationError::NonFinitePrice));
        assert_eq!(obs(f64::INFINITY, "USD").validate(), Err(ObservationError::NonFinitePrice));
        assert_eq!(obs(5.0, "  ").validate(), Err(ObservationError::MissingCurrency));
    }
}
