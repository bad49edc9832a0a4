// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::TravelDao;
use crate::filters::TravelFilter;
use crate::travel_finder::travel_path::{TransferSequence, TravelPath};
use crate::travel_finder::{sort_paths, SearchError, TravelSearchStrategy};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

/// Joins the raw travels relation against itself once per additional leg.
/// Supports up to three legs; beyond that the join fans out too hard and
/// the clustered strategy takes over.
pub struct SimpleTravelSearchStrategy {
    travel_dao: Arc<TravelDao>,
}

impl SimpleTravelSearchStrategy {
    pub fn new(travel_dao: Arc<TravelDao>) -> SimpleTravelSearchStrategy {
        SimpleTravelSearchStrategy { travel_dao }
    }
}

#[async_trait]
impl TravelSearchStrategy for SimpleTravelSearchStrategy {
    async fn find_paths(&self, filter: &TravelFilter) -> Result<Vec<TravelPath>, SearchError> {
        let sequences = match filter.travel_count {
            1 => self.travel_dao.find_path_simple1(filter).await?,
            2 => self.travel_dao.find_path_simple2(filter).await?,
            3 => self.travel_dao.find_path_simple3(filter).await?,
            n => return Err(SearchError::UnsupportedTravelCount(n)),
        };

        Ok(finish_sequences(sequences, filter))
    }

    fn name(&self) -> &'static str {
        "Simple"
    }
}

/// Shared tail of both strategies' direct path: enforce the minimum
/// connection time (the join predicate only guarantees non-negative
/// layovers) and emit deterministically ordered paths.
pub(crate) fn finish_sequences(
    sequences: Vec<TransferSequence>,
    filter: &TravelFilter,
) -> Vec<TravelPath> {
    let min_connection = Duration::minutes(filter.min_connection_time_minutes);

    let mut paths: Vec<TravelPath> = sequences
        .into_iter()
        .filter(|seq| seq.validate_min_connection_time(min_connection))
        .map(TravelPath::from_sequence)
        .collect();

    sort_paths(&mut paths);
    paths.truncate(filter.limit.max(0) as usize);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Travel;
    use chrono::NaiveDate;

    fn filter(count: u8) -> TravelFilter {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        TravelFilter::new(
            "1",
            "9",
            day.and_hms_opt(0, 0, 0).unwrap(),
            day.and_hms_opt(23, 59, 59).unwrap(),
            count,
        )
    }

    fn leg(id: &str, from: &str, to: &str, dep_min: i64, arr_min: i64) -> Travel {
        let base = NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Travel::new(
            id.to_string(),
            from.to_string(),
            to.to_string(),
            base + Duration::minutes(dep_min),
            base + Duration::minutes(arr_min),
        )
    }

    #[test]
    fn finish_drops_connections_shorter_than_minimum() {
        // 20 minute layover loses against the default 30
        let tight = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 140, 240),
        ]);
        let roomy = TransferSequence::new(vec![
            leg("c", "1", "5", 0, 120),
            leg("d", "5", "9", 160, 260),
        ]);

        let paths = finish_sequences(vec![tight, roomy], &filter(2));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].leg_ids(), vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn finish_applies_the_limit_after_sorting() {
        let mut f = filter(1);
        f.limit = 2;
        let sequences = vec![
            TransferSequence::new(vec![leg("late", "1", "9", 0, 500)]),
            TransferSequence::new(vec![leg("early", "1", "9", 0, 100)]),
            TransferSequence::new(vec![leg("mid", "1", "9", 0, 300)]),
        ];
        let paths = finish_sequences(sequences, &f);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].leg_ids(), vec!["early".to_string()]);
        assert_eq!(paths[1].leg_ids(), vec!["mid".to_string()]);
    }

    #[test]
    fn single_leg_paths_have_no_connection_to_validate() {
        let paths = finish_sequences(
            vec![TransferSequence::new(vec![leg("a", "1", "9", 0, 100)])],
            &filter(1),
        );
        assert_eq!(paths.len(), 1);
    }
}
