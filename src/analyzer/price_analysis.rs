use crate::model::{History, StorageError};
use crate::storage::HistoryStore;
use std::fmt;

/// Direction of the most recent price movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Increasing
        } else if change < 0.0 {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics derived from a history with at least two observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub id: String,
    pub title: String,
    /// Currency of the latest observation.
    pub currency: String,
    pub current_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub num_data_points: usize,
    pub price_change: f64,
    /// `None` when the previous price is zero.
    pub price_change_percent: Option<f64>,
    pub trend: Trend,
    pub potential_savings: f64,
    pub savings_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Ready(Analysis),
    /// Fewer than two observations; zero when the product is not tracked.
    InsufficientData { data_points: usize },
}

pub const MIN_DATA_POINTS: usize = 2;

/// Trait defining the interface for a price history analyzer.
pub trait Analyzer {
    fn analyze_history(&self, history: &History) -> AnalysisOutcome;

    /// Loads the history of `id` from `store` and analyzes it.
    fn analyze(&self, store: &dyn HistoryStore, id: &str) -> Result<AnalysisOutcome, StorageError> {
        Ok(match store.get(id)? {
            Some(history) => self.analyze_history(&history),
            None => AnalysisOutcome::InsufficientData { data_points: 0 },
        })
    }
}

/// Implementation of the price history analyzer.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    /// Computes all-time range and average, then the trend from the last two points.
    fn analyze_history(&self, history: &History) -> AnalysisOutcome {
        let prices = history.prices();
        let count = prices.len();
        if count < MIN_DATA_POINTS {
            return AnalysisOutcome::InsufficientData { data_points: count };
        }

        let current_price = prices[count - 1];
        let previous_price = prices[count - 2];
        let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Running mean; a plain sum overflows for very large prices.
        let avg_price = prices
            .iter()
            .enumerate()
            .fold(0.0, |mean, (i, p)| mean + (p - mean) / (i + 1) as f64)
            .clamp(min_price, max_price);

        let price_change = current_price - previous_price;
        let price_change_percent = if previous_price == 0.0 {
            None
        } else {
            Some(price_change / previous_price * 100.0)
        };

        let potential_savings = current_price - min_price;
        let savings_percent = if current_price > 0.0 {
            potential_savings / current_price * 100.0
        } else {
            0.0
        };

        let currency = history
            .latest()
            .map(|o| o.currency.clone())
            .unwrap_or_default();

        AnalysisOutcome::Ready(Analysis {
            id: history.id.clone(),
            title: history.title.clone(),
            currency,
            current_price,
            min_price,
            max_price,
            avg_price,
            num_data_points: count,
            price_change,
            price_change_percent,
            trend: Trend::from_change(price_change),
            potential_savings,
            savings_percent,
        })
    }
}
