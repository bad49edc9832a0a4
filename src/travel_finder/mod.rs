// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

pub mod clustered;
pub mod facade;
pub mod simple;
pub mod travel_path;

pub use clustered::ClusteredTravelSearchStrategy;
pub use facade::{SearchOutcome, TravelSearchService, DEFAULT_SEARCH_TIMEOUT};
pub use simple::SimpleTravelSearchStrategy;
pub use travel_path::{TransferSequence, TravelPath};

use crate::dao::StoreError;
use crate::filters::TravelFilter;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("unsupported TravelCount: {0}")]
    UnsupportedTravelCount(u8),

    #[error("unsupported MaxConnectionTime: {0} hours")]
    UnsupportedMaxConnectionTime(i64),

    #[error("search timeout")]
    Timeout,

    #[error("search canceled")]
    Canceled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> SearchError {
        match err {
            // the store cancelled the statement itself; surface the same
            // timeout the wall-clock guard produces
            StoreError::DeadlineExceeded => SearchError::Timeout,
            StoreError::UnsupportedClusterWidth(w) => SearchError::UnsupportedMaxConnectionTime(w),
            other => SearchError::Store(other),
        }
    }
}

/// A path search implementation. Strategies are stateless and safe to
/// share across concurrent searches.
#[async_trait]
pub trait TravelSearchStrategy: Send + Sync {
    async fn find_paths(&self, filter: &TravelFilter) -> Result<Vec<TravelPath>, SearchError>;

    fn name(&self) -> &'static str;
}

/// Deterministic result order: final arrival, then total duration, then
/// the leg-id tuple as a stable tie break.
pub(crate) fn sort_paths(paths: &mut [TravelPath]) {
    paths.sort_by(|a, b| {
        a.final_arrival()
            .cmp(&b.final_arrival())
            .then_with(|| a.total_duration.cmp(&b.total_duration))
            .then_with(|| a.leg_ids().cmp(&b.leg_ids()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Travel;
    use chrono::NaiveDate;

    fn path(id: &str, dep_h: u32, arr_h: u32) -> TravelPath {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        TravelPath::from_sequence(TransferSequence::new(vec![Travel::new(
            id.to_string(),
            "1".to_string(),
            "2".to_string(),
            day.and_hms_opt(dep_h, 0, 0).unwrap(),
            day.and_hms_opt(arr_h, 0, 0).unwrap(),
        )]))
    }

    #[test]
    fn paths_order_by_arrival_then_duration_then_ids() {
        // b arrives first; a and c tie on arrival, c is shorter; d ties
        // with a completely and loses on id
        let mut paths = vec![path("d", 2, 8), path("a", 2, 8), path("c", 4, 8), path("b", 0, 4)];
        sort_paths(&mut paths);
        let ids: Vec<String> = paths.iter().map(|p| p.transfers[0].id.clone()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
    }
}
