//! Domain types for the screener.

pub mod bar;
pub mod ids;
pub mod series;

pub use bar::{PriceBar, MAX_PRICE};
pub use ids::{ConfigHash, DatasetHash};
pub use series::{PriceSeries, SeriesError};

/// Symbol type alias
pub type Symbol = String;
