//! Display ordering for the forecast strip.

use serde::{Deserialize, Serialize};

use crate::model::ForecastEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// API order, oldest first.
    #[default]
    Chronological,
    /// Warmest first; equal temperatures keep their chronological order.
    TemperatureDesc,
}

impl SortCriterion {
    pub fn label(&self) -> &'static str {
        match self {
            SortCriterion::Chronological => "Date",
            SortCriterion::TemperatureDesc => "Temperature",
        }
    }
}

/// Derive a display ordering from the canonical forecast set.
///
/// The input is never touched; callers always pass the set as received from the
/// provider so orderings are never compounded on top of each other.
pub fn sort_forecast(entries: &[ForecastEntry], criterion: SortCriterion) -> Vec<ForecastEntry> {
    let mut sorted = entries.to_vec();
    match criterion {
        SortCriterion::Chronological => {}
        SortCriterion::TemperatureDesc => {
            // `sort_by` is stable. Adding 0.0 folds -0.0 into 0.0 so they tie.
            sorted.sort_by(|a, b| (b.temp + 0.0).total_cmp(&(a.temp + 0.0)));
        }
    }
    sorted
}
