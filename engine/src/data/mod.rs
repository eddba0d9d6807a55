// Price data: CSV loading, per-symbol series storage and date offset resolution
pub mod csv_parser;
pub mod market_data;
pub mod offset;
pub mod price_series;

pub use market_data::{MarketDataStore, TimeSeriesStore};
pub use offset::{lower_bound_offset, OffsetResolver};
pub use price_series::{PriceArrays, PriceSeries};
