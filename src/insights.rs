// Human-readable rendering of analyzer output
use crate::analyzer::{Analysis, AnalysisOutcome};

pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "Insufficient data for analysis. Track the product for more insights.";

pub const DEFAULT_WAIT_THRESHOLD_PERCENT: f64 = 10.0;

pub struct InsightFormatter {
    wait_threshold_percent: f64,
}

impl InsightFormatter {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_WAIT_THRESHOLD_PERCENT)
    }

    pub fn with_threshold(wait_threshold_percent: f64) -> Self {
        Self {
            wait_threshold_percent,
        }
    }

    pub fn format(&self, outcome: &AnalysisOutcome) -> String {
        match outcome {
            AnalysisOutcome::InsufficientData { .. } => INSUFFICIENT_DATA_MESSAGE.to_string(),
            AnalysisOutcome::Ready(analysis) => self.format_analysis(analysis),
        }
    }

    fn format_analysis(&self, a: &Analysis) -> String {
        let money = |value: f64| format_money(&a.currency, value);

        let mut lines = vec![
            format!("Product: {}", a.title),
            format!("ASIN: {}", a.id),
            String::new(),
            format!("Current Price: {}", money(a.current_price)),
            format!("Price Range: {} - {}", money(a.min_price), money(a.max_price)),
            format!("Average Price: {}", money(a.avg_price)),
            String::new(),
            format!("Price Trend: {}", a.trend.as_str().to_uppercase()),
        ];

        if a.price_change != 0.0 {
            let sign = if a.price_change > 0.0 { "+" } else { "" };
            let change = match a.price_change_percent {
                Some(pct) => format!("{}{} ({}{:.1}%)", sign, money(a.price_change), sign, pct),
                None => format!("{}{}", sign, money(a.price_change)),
            };
            lines.push(format!("Recent Change: {}", change));
        }

        lines.push(String::new());
        lines.push("Buying Recommendation:".to_string());
        lines.push(self.recommendation(a));

        lines.push(String::new());
        lines.push(format!("Data Points: {}", a.num_data_points));

        lines.join("\n")
    }

    fn recommendation(&self, a: &Analysis) -> String {
        if a.current_price == a.min_price {
            "  ✓ Current price is at the lowest recorded! Good time to buy.".to_string()
        } else if a.savings_percent > self.wait_threshold_percent {
            format!(
                "  ⚠ Price is {:.1}% above lowest. Consider waiting.",
                a.savings_percent
            )
        } else {
            "  → Price is close to the lowest recorded.".to_string()
        }
    }
}

/// Renders an amount with its currency symbol, e.g. `$90.00` or `CHF 12.50`.
pub fn format_money(currency: &str, value: f64) -> String {
    match currency_symbol(currency) {
        Some(symbol) => format!("{}{:.2}", symbol, value),
        None => format!("{} {:.2}", currency, value),
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}
