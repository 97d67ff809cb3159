//! Pure aggregation over transaction snapshots. Nothing here reads the clock or storage.

pub mod aggregate;
pub mod forecast;

pub use aggregate::{average_check, daily_revenue, top_products, window_bounds};
pub use forecast::{active_days, forecast_next_day};
