pub mod fetcher;
pub mod traits;

pub use fetcher::HttpFetcher;
pub use traits::PageFetcher;
