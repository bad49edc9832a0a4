// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::TravelDao;
use crate::filters::{MAX_CLUSTERED_CONNECTION_TIME_RANGE, TravelFilter};
use crate::models::Travel;
use crate::travel_finder::simple::finish_sequences;
use crate::travel_finder::travel_path::{TransferSequence, TravelPath};
use crate::travel_finder::{sort_paths, SearchError, TravelSearchStrategy};
use async_trait::async_trait;
use chrono::Duration;
use log::error;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Searches over the precomputed `clustered_arrival_travels{w}` tables.
/// The index join yields candidates in coarse hour buckets; exact
/// timestamps come back through one batched rehydration, after which the
/// real connection-time and window predicates are applied.
pub struct ClusteredTravelSearchStrategy {
    travel_dao: Arc<TravelDao>,
}

impl ClusteredTravelSearchStrategy {
    pub fn new(travel_dao: Arc<TravelDao>) -> ClusteredTravelSearchStrategy {
        ClusteredTravelSearchStrategy { travel_dao }
    }

    /// Replaces every cluster-index leg with its exact travels row.
    /// Duplicated index rows share the leg id, so collecting the distinct
    /// ids deduplicates the lookup for free. A candidate whose leg id is
    /// missing from the store indicates a stale index; it is logged and
    /// dropped.
    async fn reload_actual_transfers(
        &self,
        sequences: Vec<TransferSequence>,
    ) -> Result<Vec<TransferSequence>, SearchError> {
        let ids: BTreeSet<String> = sequences
            .iter()
            .flat_map(|seq| seq.transfers.iter().map(|t| t.id.clone()))
            .collect();
        let ids: Vec<String> = ids.into_iter().collect();

        let actual = self.travel_dao.find_by_ids(&ids).await?;
        let by_id: HashMap<&str, &Travel> =
            actual.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut rehydrated = Vec::with_capacity(sequences.len());
        'sequences: for mut sequence in sequences {
            for transfer in sequence.transfers.iter_mut() {
                match by_id.get(transfer.id.as_str()) {
                    Some(actual_transfer) => *transfer = (*actual_transfer).clone(),
                    None => {
                        error!(
                            "cluster index row references missing travel id {}; dropping candidate",
                            transfer.id
                        );
                        continue 'sequences;
                    }
                }
            }
            rehydrated.push(sequence);
        }

        Ok(rehydrated)
    }
}

#[async_trait]
impl TravelSearchStrategy for ClusteredTravelSearchStrategy {
    async fn find_paths(&self, filter: &TravelFilter) -> Result<Vec<TravelPath>, SearchError> {
        let leg_count = match filter.travel_count {
            // no cluster benefit for direct legs
            1 => {
                let sequences = self.travel_dao.find_path_simple1(filter).await?;
                return Ok(finish_sequences(sequences, filter));
            }
            n @ 2..=5 => n as usize,
            n => return Err(SearchError::UnsupportedTravelCount(n)),
        };

        if !MAX_CLUSTERED_CONNECTION_TIME_RANGE.contains(&filter.max_connection_time_hours) {
            return Err(SearchError::UnsupportedMaxConnectionTime(
                filter.max_connection_time_hours,
            ));
        }

        let sequences = self
            .travel_dao
            .find_path_clustered(
                leg_count,
                &filter.source,
                &filter.destination,
                filter.arrival_time_from,
                filter.arrival_time_to,
                filter.max_connection_time_hours,
            )
            .await?;

        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let sequences = self.reload_actual_transfers(sequences).await?;

        Ok(post_filter(sequences, filter))
    }

    fn name(&self) -> &'static str {
        "Clustered"
    }
}

/// Applies the exact-time predicates the cluster join only approximated,
/// deduplicates itineraries that differ solely in which duplicated index
/// row produced them, and orders the result.
fn post_filter(sequences: Vec<TransferSequence>, filter: &TravelFilter) -> Vec<TravelPath> {
    let min_connection = Duration::minutes(filter.min_connection_time_minutes);
    let max_connection = Duration::hours(filter.max_connection_time_hours);

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut paths: Vec<TravelPath> = Vec::new();

    for sequence in sequences {
        // the join guarantees connectivity, but duplicated rows can
        // masquerade as each other, so the check is repeated on real data
        if !sequence.are_locations_connected() || !sequence.is_valid() {
            continue;
        }
        if !sequence.validate_min_connection_time(min_connection) {
            continue;
        }
        if !sequence.validate_max_connection_time(max_connection) {
            continue;
        }
        let arrival = match sequence.last() {
            Some(last) => last.arrival,
            None => continue,
        };
        if arrival < filter.arrival_time_from || arrival > filter.arrival_time_to {
            continue;
        }
        if !seen.insert(sequence.leg_ids()) {
            continue;
        }
        paths.push(TravelPath::from_sequence(sequence));
    }

    sort_paths(&mut paths);
    paths.truncate(filter.limit.max(0) as usize);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filter() -> TravelFilter {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let mut f = TravelFilter::new(
            "1",
            "9",
            day.and_hms_opt(0, 0, 0).unwrap(),
            day.and_hms_opt(12, 0, 0).unwrap(),
            2,
        );
        f.max_connection_time_hours = 8;
        f
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
    fn post_filter_enforces_exact_connection_bounds() {
        let ok = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 180, 300),
        ]);
        // 20 minutes is under the minimum connection time
        let too_tight = TransferSequence::new(vec![
            leg("c", "1", "5", 0, 120),
            leg("d", "5", "9", 140, 300),
        ]);
        // nine hours is over the eight hour window
        let too_loose = TransferSequence::new(vec![
            leg("e", "1", "5", 0, 60),
            leg("f", "5", "9", 600, 700),
        ]);

        let paths = post_filter(vec![ok, too_tight, too_loose], &filter());
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].leg_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn post_filter_rechecks_the_arrival_window() {
        // bucket-level matching can admit arrivals just outside the
        // window; the exact timestamp lands at 12:30
        let outside = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 180, 750),
        ]);
        let paths = post_filter(vec![outside], &filter());
        assert!(paths.is_empty());
    }

    #[test]
    fn post_filter_drops_disconnected_candidates() {
        let disconnected = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "6", "9", 180, 300),
        ]);
        assert!(post_filter(vec![disconnected], &filter()).is_empty());
    }

    #[test]
    fn duplicate_leg_id_tuples_collapse_to_one_path() {
        let first = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 180, 300),
        ]);
        let second = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 180, 300),
        ]);
        let paths = post_filter(vec![first, second], &filter());
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn degenerate_window_keeps_exact_arrivals() {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let mut f = filter();
        f.arrival_time_from = day.and_hms_opt(5, 0, 0).unwrap();
        f.arrival_time_to = day.and_hms_opt(5, 0, 0).unwrap();

        let on_the_dot = TransferSequence::new(vec![
            leg("a", "1", "5", 0, 120),
            leg("b", "5", "9", 180, 300),
        ]);
        let paths = post_filter(vec![on_the_dot], &f);
        assert_eq!(paths.len(), 1);
    }
}
