pub mod classify;
pub mod client;
pub mod error;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod pipeline;
pub mod retry;

pub use classify::{classify_page, is_product_page, ProductSignal};
pub use client::{FetchOutcome, FetchSettings, ProductPageClient};
pub use error::ScraperError;
pub use extract::extract_product;
pub use input::load_targets;
pub use normalize::{barcode_from_url, UrlNormalizer};
pub use pipeline::{ScrapeReport, ScrapeSession, Stage, TargetFailure};
pub use retry::RetryPolicy;
