mod interval;
mod series;

pub use interval::{IntervalClass, RequestWindow};
pub use series::{Bar, OhlcColumns, RawSeries};

/// Opaque provider API key.
pub type Credential = String;
