//! Single-call pages: health check, price monitoring, search and image
//! analysis.

pub mod agents;
pub mod health;
pub mod monitoring;
pub mod search;

pub use agents::{analyze_image, ImageAnalysis};
pub use health::check_health;
pub use monitoring::{price_history, PriceRecord};
pub use search::{search, SearchResult};
