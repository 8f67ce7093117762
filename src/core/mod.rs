//! Core data structures: signal tables, model series and forecasts.

mod forecast;
mod signal_table;
mod time_series;

pub use forecast::{Forecast, PredictionInterval};
pub use signal_table::{ColumnData, ColumnKind, ColumnSpec, SignalTable, SignalTableBuilder};
pub use time_series::{SeriesIndex, TimeSeries};
