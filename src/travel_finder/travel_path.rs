// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::models::Travel;
use chrono::Duration;

/// An ordered sequence of legs forming a single candidate itinerary.
#[derive(Clone, Debug)]
pub struct TransferSequence {
    pub transfers: Vec<Travel>,
}

impl TransferSequence {
    pub fn new(transfers: Vec<Travel>) -> TransferSequence {
        TransferSequence { transfers }
    }

    pub fn first(&self) -> Option<&Travel> {
        self.transfers.first()
    }

    pub fn last(&self) -> Option<&Travel> {
        self.transfers.last()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    /// Total journey time from first departure to last arrival.
    pub fn total_duration(&self) -> Duration {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.arrival - first.departure,
            _ => Duration::zero(),
        }
    }

    /// Waiting time between leg `index` and the next one. Zero when the
    /// index is out of range or points at the last leg.
    pub fn connection_time(&self, index: usize) -> Duration {
        if index + 1 >= self.transfers.len() {
            return Duration::zero();
        }
        self.transfers[index + 1].departure - self.transfers[index].arrival
    }

    pub fn total_connection_time(&self) -> Duration {
        let mut total = Duration::zero();
        for i in 0..self.transfers.len().saturating_sub(1) {
            total += self.connection_time(i);
        }
        total
    }

    pub fn are_locations_connected(&self) -> bool {
        self.transfers
            .windows(2)
            .all(|pair| pair[0].to_point == pair[1].from_point)
    }

    /// A sequence is valid when every leg lands where the next one takes
    /// off and no leg departs before the previous one has arrived.
    pub fn is_valid(&self) -> bool {
        self.are_locations_connected()
            && (0..self.transfers.len().saturating_sub(1))
                .all(|i| self.connection_time(i) >= Duration::zero())
    }

    pub fn validate_min_connection_time(&self, min_connection: Duration) -> bool {
        (0..self.transfers.len().saturating_sub(1))
            .all(|i| self.connection_time(i) >= min_connection)
    }

    pub fn validate_max_connection_time(&self, max_connection: Duration) -> bool {
        (0..self.transfers.len().saturating_sub(1))
            .all(|i| self.connection_time(i) <= max_connection)
    }

    /// Leg ids in order. Two sequences describing the same itinerary share
    /// this tuple even when they came from different duplicated index rows.
    pub fn leg_ids(&self) -> Vec<String> {
        self.transfers.iter().map(|t| t.id.clone()).collect()
    }
}

/// A found itinerary with its derived totals.
#[derive(Clone, Debug)]
pub struct TravelPath {
    pub transfers: Vec<Travel>,
    pub transfer_count: usize,
    pub total_duration: Duration,
}

impl TravelPath {
    pub fn from_sequence(sequence: TransferSequence) -> TravelPath {
        let transfer_count = sequence.transfer_count();
        let total_duration = sequence.total_duration();
        TravelPath {
            transfers: sequence.transfers,
            transfer_count,
            total_duration,
        }
    }

    pub fn final_arrival(&self) -> Option<chrono::NaiveDateTime> {
        self.transfers.last().map(|t| t.arrival)
    }

    pub fn leg_ids(&self) -> Vec<String> {
        self.transfers.iter().map(|t| t.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn leg(id: &str, from: &str, to: &str, dep_h: u32, arr_h: u32) -> Travel {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        Travel::new(
            id.to_string(),
            from.to_string(),
            to.to_string(),
            day.and_hms_opt(dep_h, 0, 0).unwrap(),
            day.and_hms_opt(arr_h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn totals_over_two_legs() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 2), leg("b", "5", "9", 4, 7)]);
        assert_eq!(seq.total_duration(), Duration::hours(7));
        assert_eq!(seq.connection_time(0), Duration::hours(2));
        assert_eq!(seq.connection_time(1), Duration::zero());
        assert_eq!(seq.total_connection_time(), Duration::hours(2));
    }

    #[test]
    fn detects_disconnected_sequences() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 2), leg("b", "6", "9", 4, 7)]);
        assert!(!seq.are_locations_connected());
        assert!(!seq.is_valid());
    }

    #[test]
    fn rejects_negative_connection_time() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 4), leg("b", "5", "9", 3, 7)]);
        assert!(seq.are_locations_connected());
        assert!(!seq.is_valid());
    }

    #[test]
    fn min_connection_time_boundary() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 2), leg("b", "5", "9", 2, 5)]);
        assert!(seq.is_valid());
        assert!(seq.validate_min_connection_time(Duration::zero()));
        assert!(!seq.validate_min_connection_time(Duration::minutes(30)));
    }

    #[test]
    fn max_connection_time_boundary() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 2), leg("b", "5", "9", 10, 13)]);
        assert!(seq.validate_max_connection_time(Duration::hours(8)));
        assert!(!seq.validate_max_connection_time(Duration::hours(7)));
    }

    #[test]
    fn empty_and_single_leg_sequences_are_valid() {
        assert!(TransferSequence::new(vec![]).is_valid());
        let single = TransferSequence::new(vec![leg("a", "1", "2", 0, 2)]);
        assert!(single.is_valid());
        assert_eq!(single.total_duration(), Duration::hours(2));
        assert!(single.validate_min_connection_time(Duration::minutes(30)));
    }

    #[test]
    fn path_from_sequence_carries_totals() {
        let seq = TransferSequence::new(vec![leg("a", "1", "5", 0, 2), leg("b", "5", "9", 4, 7)]);
        let path = TravelPath::from_sequence(seq);
        assert_eq!(path.transfer_count, 2);
        assert_eq!(path.total_duration, Duration::hours(7));
        assert_eq!(path.leg_ids(), vec!["a".to_string(), "b".to_string()]);
    }
}
