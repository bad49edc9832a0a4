// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::{PointDao, TravelDao};
use crate::filters::{MAX_CLUSTERED_CONNECTION_TIME_RANGE, TravelFilter};
use crate::models::Point;
use crate::postgres_tools::StopoverPostgresPool;
use crate::travel_finder::{
    ClusteredTravelSearchStrategy, SearchError, SimpleTravelSearchStrategy, TravelPath,
    TravelSearchStrategy,
};
use chrono::Duration as ChronoDuration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// A leg rendered for display, with point labels resolved to
/// `Name (x_y)` where the point is known.
#[derive(Clone, Debug)]
pub struct DisplayTransfer {
    pub from: String,
    pub to: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
}

#[derive(Clone, Debug)]
pub struct DisplayPath {
    pub transfers: Vec<DisplayTransfer>,
    pub total_duration: String,
    pub transfer_count: usize,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub paths: Vec<TravelPath>,
    pub display: Vec<DisplayPath>,
}

/// Entry point for path searches: validates the filter, picks a strategy,
/// runs it under a wall-clock guard independent of the store-side
/// statement timeout, and hydrates display labels on success.
pub struct TravelSearchService {
    travel_dao: Arc<TravelDao>,
    point_dao: Arc<PointDao>,
    simple: Arc<SimpleTravelSearchStrategy>,
    clustered: Arc<ClusteredTravelSearchStrategy>,
    search_timeout: Duration,
}

impl TravelSearchService {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> TravelSearchService {
        TravelSearchService::with_timeout(pool, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(
        pool: Arc<StopoverPostgresPool>,
        search_timeout: Duration,
    ) -> TravelSearchService {
        let mut travel_dao = TravelDao::new(pool.clone());
        travel_dao.timeout = Some(search_timeout);
        let travel_dao = Arc::new(travel_dao);

        TravelSearchService {
            simple: Arc::new(SimpleTravelSearchStrategy::new(travel_dao.clone())),
            clustered: Arc::new(ClusteredTravelSearchStrategy::new(travel_dao.clone())),
            point_dao: Arc::new(PointDao::new(pool)),
            travel_dao,
            search_timeout,
        }
    }

    pub fn travel_dao(&self) -> Arc<TravelDao> {
        self.travel_dao.clone()
    }

    fn strategy_by_name(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<dyn TravelSearchStrategy>, SearchError> {
        match name.unwrap_or("clustered") {
            "clustered" => Ok(self.clustered.clone()),
            "simple" => Ok(self.simple.clone()),
            other => Err(SearchError::InvalidFilter(format!(
                "unknown strategy: {}",
                other
            ))),
        }
    }

    pub async fn search(
        &self,
        filter: TravelFilter,
        strategy_name: Option<&str>,
    ) -> Result<SearchOutcome, SearchError> {
        // the sender half lives for the whole call, so the receiver
        // never fires and the search runs uncancelled
        let (_keep_alive, never_cancel) = oneshot::channel();
        self.search_with_cancel(filter, strategy_name, never_cancel)
            .await
    }

    /// Runs a search that can be aborted by dropping a message into the
    /// cancel channel. Cancellation aborts the in-flight query task and
    /// returns without partial results.
    pub async fn search_with_cancel(
        &self,
        filter: TravelFilter,
        strategy_name: Option<&str>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<SearchOutcome, SearchError> {
        validate_filter(&filter)?;
        let strategy = self.strategy_by_name(strategy_name)?;

        // race the strategy against a wall clock armed two seconds before
        // the store-side statement timeout; if the store hint is silently
        // ignored the facade still comes back in time
        let wall_clock = self
            .search_timeout
            .checked_sub(Duration::from_secs(2))
            .unwrap_or(self.search_timeout);

        let worker_filter = filter.clone();
        let mut worker = tokio::spawn(async move {
            strategy.find_paths(&worker_filter).await
        });

        let timer = tokio::time::sleep(wall_clock);
        tokio::pin!(timer);

        let mut cancel_closed = false;
        let paths = loop {
            tokio::select! {
                joined = &mut worker => {
                    match joined {
                        Ok(result) => break result?,
                        Err(join_error) => {
                            return Err(SearchError::Internal(format!(
                                "search worker failed: {}",
                                join_error
                            )));
                        }
                    }
                }
                _ = &mut timer => {
                    worker.abort();
                    return Err(SearchError::Timeout);
                }
                received = &mut cancel, if !cancel_closed => {
                    match received {
                        Ok(()) => {
                            worker.abort();
                            return Err(SearchError::Canceled);
                        }
                        // sender dropped without cancelling; keep waiting
                        // on the worker and the timer
                        Err(_) => cancel_closed = true,
                    }
                }
            }
        };

        let display = self.hydrate_display(&paths).await?;

        Ok(SearchOutcome { paths, display })
    }

    /// Loads the point map lazily, once per request with results.
    async fn hydrate_display(
        &self,
        paths: &[TravelPath],
    ) -> Result<Vec<DisplayPath>, SearchError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let points = self.point_dao.select_all().await?;
        let point_map: HashMap<&str, &Point> =
            points.iter().map(|p| (p.id.as_str(), p)).collect();

        Ok(paths
            .iter()
            .map(|path| render_path(path, &point_map))
            .collect())
    }
}

fn point_label(point_id: &str, point_map: &HashMap<&str, &Point>) -> String {
    match point_map.get(point_id) {
        Some(point) => format!("{} ({})", point.name, point.build_location_key()),
        None => point_id.to_string(),
    }
}

fn format_duration(duration: ChronoDuration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h{:02}m", minutes / 60, (minutes % 60).abs())
}

fn render_path(path: &TravelPath, point_map: &HashMap<&str, &Point>) -> DisplayPath {
    let transfers = path
        .transfers
        .iter()
        .map(|transfer| DisplayTransfer {
            from: point_label(&transfer.from_point, point_map),
            to: point_label(&transfer.to_point, point_map),
            departure: transfer.departure.format("%Y-%m-%d %H:%M:%S").to_string(),
            arrival: transfer.arrival.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration: format_duration(transfer.arrival - transfer.departure),
        })
        .collect();

    DisplayPath {
        transfers,
        total_duration: format_duration(path.total_duration),
        transfer_count: path.transfer_count,
    }
}

fn validate_filter(filter: &TravelFilter) -> Result<(), SearchError> {
    if filter.source.is_empty() {
        return Err(SearchError::InvalidFilter("source is required".to_string()));
    }
    if filter.destination.is_empty() {
        return Err(SearchError::InvalidFilter(
            "destination is required".to_string(),
        ));
    }
    if filter.arrival_time_from > filter.arrival_time_to {
        return Err(SearchError::InvalidFilter(
            "arrival window end precedes its start".to_string(),
        ));
    }
    if filter.travel_count == 0 {
        return Err(SearchError::InvalidFilter(
            "TravelCount must be at least 1".to_string(),
        ));
    }
    if filter.travel_count > 5 {
        return Err(SearchError::UnsupportedTravelCount(filter.travel_count));
    }
    if filter.limit <= 0 {
        return Err(SearchError::InvalidFilter(
            "limit must be positive".to_string(),
        ));
    }
    if filter.min_connection_time_minutes < 0 {
        return Err(SearchError::InvalidFilter(
            "minimum connection time cannot be negative".to_string(),
        ));
    }
    if !MAX_CLUSTERED_CONNECTION_TIME_RANGE.contains(&filter.max_connection_time_hours) {
        return Err(SearchError::UnsupportedMaxConnectionTime(
            filter.max_connection_time_hours,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Travel;
    use crate::travel_finder::TransferSequence;
    use chrono::NaiveDate;

    fn base_filter() -> TravelFilter {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        TravelFilter::new(
            "1",
            "9",
            day.and_hms_opt(0, 0, 0).unwrap(),
            day.and_hms_opt(23, 0, 0).unwrap(),
            2,
        )
    }

    #[test]
    fn accepts_a_well_formed_filter() {
        assert!(validate_filter(&base_filter()).is_ok());
    }

    #[test]
    fn equal_window_bounds_are_a_valid_degenerate_window() {
        let mut filter = base_filter();
        filter.arrival_time_to = filter.arrival_time_from;
        assert!(validate_filter(&filter).is_ok());
    }

    #[test]
    fn rejects_missing_endpoints_and_reversed_window() {
        let mut filter = base_filter();
        filter.source = String::new();
        assert!(matches!(
            validate_filter(&filter),
            Err(SearchError::InvalidFilter(_))
        ));

        let mut filter = base_filter();
        filter.destination = String::new();
        assert!(matches!(
            validate_filter(&filter),
            Err(SearchError::InvalidFilter(_))
        ));

        let mut filter = base_filter();
        std::mem::swap(&mut filter.arrival_time_from, &mut filter.arrival_time_to);
        // from > to after the swap since from < to before
        assert!(matches!(
            validate_filter(&filter),
            Err(SearchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn rejects_unsupported_counts_and_widths() {
        let mut filter = base_filter();
        filter.travel_count = 6;
        assert!(matches!(
            validate_filter(&filter),
            Err(SearchError::UnsupportedTravelCount(6))
        ));

        let mut filter = base_filter();
        filter.max_connection_time_hours = 12;
        assert!(matches!(
            validate_filter(&filter),
            Err(SearchError::UnsupportedMaxConnectionTime(12))
        ));
    }

    #[test]
    fn renders_labels_through_the_point_map() {
        let day = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let path = TravelPath::from_sequence(TransferSequence::new(vec![Travel::new(
            "t1".to_string(),
            "1".to_string(),
            "9".to_string(),
            day.and_hms_opt(0, 0, 0).unwrap(),
            day.and_hms_opt(2, 30, 0).unwrap(),
        )]));

        let origin = Point {
            id: "1".to_string(),
            x: 0.0,
            y: 0.0,
            name: "Origin".to_string(),
        };
        let mut point_map: HashMap<&str, &Point> = HashMap::new();
        point_map.insert("1", &origin);

        let display = render_path(&path, &point_map);
        assert_eq!(display.transfer_count, 1);
        assert_eq!(display.transfers[0].from, "Origin (0.00000_0.00000)");
        // unknown points fall back to the raw id
        assert_eq!(display.transfers[0].to, "9");
        assert_eq!(display.transfers[0].duration, "2h30m");
        assert_eq!(display.total_duration, "2h30m");
    }
}
