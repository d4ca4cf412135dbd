pub mod season;
pub mod timeseries;

pub use season::{aggregate_by_season, AreaUnit, Season, SeasonalSummary};
pub use timeseries::{build_time_series, TimeSeriesRow};
