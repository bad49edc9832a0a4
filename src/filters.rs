// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use chrono::NaiveDateTime;

/// Widths (hours) for which a clustered arrival table exists.
pub const MAX_CLUSTERED_CONNECTION_TIME_RANGE: [i64; 5] = [2, 4, 8, 16, 32];

/// A search request. Validated by the search facade, not by the strategies.
#[derive(Clone, Debug)]
pub struct TravelFilter {
    pub source: String,
    pub destination: String,
    pub arrival_time_from: NaiveDateTime,
    pub arrival_time_to: NaiveDateTime,
    pub travel_count: u8,
    pub limit: i64,
    pub min_connection_time_minutes: i64,
    pub max_connection_time_hours: i64,
}

impl TravelFilter {
    /// Builds a filter with the default limit (100), minimum connection
    /// time (30 minutes) and maximum connection time (32 hours).
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        arrival_time_from: NaiveDateTime,
        arrival_time_to: NaiveDateTime,
        travel_count: u8,
    ) -> TravelFilter {
        TravelFilter {
            source: source.into(),
            destination: destination.into(),
            arrival_time_from,
            arrival_time_to,
            travel_count,
            limit: 100,
            min_connection_time_minutes: 30,
            max_connection_time_hours: 32,
        }
    }
}

/// Filter for point lookups (autocomplete and coordinate resolution).
#[derive(Clone, Debug, Default)]
pub struct PointsFilter {
    pub limit: i64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub name_part: String,
    pub id_part: String,
}

impl PointsFilter {
    pub fn new() -> PointsFilter {
        PointsFilter {
            limit: 10,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn travel_filter_defaults() {
        let from = NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let to = NaiveDate::from_ymd_opt(2027, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let filter = TravelFilter::new("VNO", "JFK", from, to, 2);
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.min_connection_time_minutes, 30);
        assert_eq!(filter.max_connection_time_hours, 32);
    }

    #[test]
    fn points_filter_default_limit() {
        assert_eq!(PointsFilter::new().limit, 10);
    }
}
