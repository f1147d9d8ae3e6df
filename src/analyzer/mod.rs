// Analyzer module: trend and savings statistics over a stored price history.

pub mod price_analysis;

// Re-export the main Analyzer implementation for ease of use.
pub use price_analysis::{Analysis, AnalysisOutcome, Analyzer, AnalyzerImpl};
