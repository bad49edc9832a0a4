// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::aviation_edge::consumers::ScheduleConsumer;
use crate::aviation_edge::models::ScheduleResponse;
use crate::aviation_edge::params::FutureSchedulesParams;
use crate::aviation_edge::{AviationEdgeClient, ClientError};
use crate::dao::{AirportsDao, AirportsMetaDao};
use crate::models::AirportMeta;
use anyhow::Context;
use chrono::{Duration, NaiveDate};
use log::{error, info};
use std::sync::Arc;

/// What an import request resolves to once the stored coverage interval
/// has been consulted.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportPlan {
    pub skip_import: bool,
    pub import_start_date: NaiveDate,
    pub import_end_date: NaiveDate,
    /// Coverage to record after a successful import: the union of the
    /// existing interval and the request.
    pub meta_start_date: NaiveDate,
    pub meta_end_date: NaiveDate,
    pub already_covered_by: Option<String>,
}

/// Decides whether `[start, end]` needs fetching. Full coverage means
/// skip; partial or no coverage means the whole requested range is
/// re-fetched (upserts make that idempotent) and the recorded interval
/// grows to the union.
pub fn calculate_import_plan(
    start_date: NaiveDate,
    end_date: NaiveDate,
    meta: Option<&AirportMeta>,
) -> ImportPlan {
    let mut plan = ImportPlan {
        skip_import: false,
        import_start_date: start_date,
        import_end_date: end_date,
        meta_start_date: start_date,
        meta_end_date: end_date,
        already_covered_by: None,
    };

    if let Some(meta) = meta {
        if let (Some(imported_from), Some(imported_to)) = (meta.imported_from, meta.imported_to) {
            let covered_from = imported_from.date();
            let covered_to = imported_to.date();

            if covered_from <= start_date && covered_to >= end_date {
                plan.skip_import = true;
                plan.already_covered_by = Some(format!("{} to {}", covered_from, covered_to));
                return plan;
            }

            plan.meta_start_date = covered_from.min(start_date);
            plan.meta_end_date = covered_to.max(end_date);
        }
    }

    plan
}

/// Stamps a fetched batch with the request day: scheduled times become
/// full datetimes, arrivals whose time-of-day sorts before the departure
/// roll over to the next day, and the upsert key columns get a `-`
/// sentinel when the provider left them blank.
pub fn normalize_day_schedules(
    day: NaiveDate,
    schedules: Vec<ScheduleResponse>,
) -> Vec<ScheduleResponse> {
    let next_day = day + Duration::days(1);

    schedules
        .into_iter()
        .map(|mut s| {
            s.schedule_type = "departure".to_string();
            s.status = "future".to_string();

            // plain HH:MM strings compare correctly as text
            let arrival_day = if s.arrival.scheduled_time < s.departure.scheduled_time {
                next_day
            } else {
                day
            };

            s.departure.scheduled_time = format!("{} {}", day, s.departure.scheduled_time);
            s.arrival.scheduled_time = format!("{} {}", arrival_day, s.arrival.scheduled_time);

            if s.airline.name.is_empty() {
                s.airline.name = "-".to_string();
            }
            if s.airline.iata_code.is_empty() {
                s.airline.iata_code = "-".to_string();
            }
            if s.flight.iata_number.is_empty() {
                s.flight.iata_number = "-".to_string();
            }

            s
        })
        .collect()
}

/// Drives the provider day by day and feeds the consumer chain.
pub struct DataCollector {
    client: Arc<AviationEdgeClient>,
    consumer: Arc<dyn ScheduleConsumer>,
    airports_dao: Arc<AirportsDao>,
    airports_meta_dao: Arc<AirportsMetaDao>,
    /// Pause between provider calls. The client itself does not rate
    /// limit; the pipeline does.
    pub rate_limit: std::time::Duration,
}

impl DataCollector {
    pub fn new(
        client: Arc<AviationEdgeClient>,
        consumer: Arc<dyn ScheduleConsumer>,
        airports_dao: Arc<AirportsDao>,
        airports_meta_dao: Arc<AirportsMetaDao>,
    ) -> DataCollector {
        DataCollector {
            client,
            consumer,
            airports_dao,
            airports_meta_dao,
            rate_limit: std::time::Duration::from_secs(1),
        }
    }

    pub fn consumer(&self) -> Arc<dyn ScheduleConsumer> {
        self.consumer.clone()
    }

    pub async fn collect_departure_schedules_for_one_day(
        &self,
        airport_code: &str,
        day: NaiveDate,
    ) -> anyhow::Result<()> {
        info!(
            "Collecting future schedules for airport: {}, day {}",
            airport_code, day
        );

        let schedules = self
            .client
            .get_future_schedules(FutureSchedulesParams {
                iata_code: airport_code.to_string(),
                schedule_type: "departure".to_string(),
                date: day.to_string(),
                ..Default::default()
            })
            .await
            .context("failed to get departure schedules")?;

        let schedules = normalize_day_schedules(day, schedules);

        info!("Found {} departure schedules", schedules.len());

        if schedules.is_empty() {
            info!("No schedules found");
            return Ok(());
        }

        self.consumer
            .consume(&schedules)
            .await
            .context("consumer failed")?;

        Ok(())
    }

    /// Day-by-day fetch over an inclusive range. A provider failure loses
    /// that day and the sweep moves on; a store or consumer failure
    /// aborts the batch. Either way the range is reported failed, the
    /// caller leaves the metadata untouched, and the next run retries the
    /// same range (upserts make the overlap harmless).
    pub async fn collect_departure_schedules(
        &self,
        airport_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut failed_days: Vec<NaiveDate> = Vec::new();

        let mut day = from;
        while day <= to {
            if let Err(err) = self
                .collect_departure_schedules_for_one_day(airport_code, day)
                .await
            {
                if err.downcast_ref::<ClientError>().is_none() {
                    return Err(err);
                }
                error!("airport {} day {}: {:#}", airport_code, day, err);
                failed_days.push(day);
            }
            day += Duration::days(1);
            if day <= to {
                tokio::time::sleep(self.rate_limit).await;
            }
        }

        if !failed_days.is_empty() {
            anyhow::bail!(
                "{} of {} days failed for airport {} (first: {})",
                failed_days.len(),
                (to - from).num_days() + 1,
                airport_code,
                failed_days[0]
            );
        }
        Ok(())
    }

    /// Consults the coverage metadata, imports what is missing, and
    /// extends the recorded interval only after the whole range
    /// succeeded.
    pub async fn import_departure_schedules(
        &self,
        airport_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<ImportPlan> {
        let meta = self.airports_meta_dao.get(airport_code).await?;
        let plan = calculate_import_plan(from, to, meta.as_ref());

        if plan.skip_import {
            info!(
                "Airport {} is already imported in the range {} (requested: {} to {})",
                airport_code,
                plan.already_covered_by.as_deref().unwrap_or("?"),
                from,
                to
            );
            return Ok(plan);
        }

        self.collect_departure_schedules(airport_code, plan.import_start_date, plan.import_end_date)
            .await?;
        if let Err(err) = self.consumer.flush().await {
            return Err(err.context("consumer flush failed"));
        }

        let updated = AirportMeta {
            airport_code: airport_code.to_string(),
            imported_from: plan.meta_start_date.and_hms_opt(0, 0, 0),
            imported_to: plan.meta_end_date.and_hms_opt(0, 0, 0),
        };
        self.airports_meta_dao.upsert(&updated, true).await?;

        info!(
            "Import completed, airport {} metadata updated with range {} to {}",
            airport_code, plan.meta_start_date, plan.meta_end_date
        );

        Ok(plan)
    }

    /// Imports several airports concurrently, one task per airport. Each
    /// airport keeps its own coverage bookkeeping and the store key makes
    /// concurrent upserts safe, so failures are reported per airport
    /// instead of aborting the whole sweep.
    pub async fn import_departure_schedules_for_airports(
        self: Arc<Self>,
        airport_codes: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(String, anyhow::Result<ImportPlan>)> {
        let mut tasks = tokio::task::JoinSet::new();

        for code in airport_codes {
            let collector = self.clone();
            let code = code.clone();
            tasks.spawn(async move {
                let result = collector.import_departure_schedules(&code, from, to).await;
                (code, result)
            });
        }

        let mut results = Vec::with_capacity(airport_codes.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => results.push(outcome),
                Err(join_error) => results.push((
                    "?".to_string(),
                    Err(anyhow::anyhow!("import task failed: {}", join_error)),
                )),
            }
        }

        // deterministic report order regardless of completion order
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Creates (or touches) a coverage record for every airport in the
    /// given countries without overwriting existing intervals.
    pub async fn initialize_airports_meta(&self, country_codes: &[&str]) -> anyhow::Result<usize> {
        let airports = self
            .airports_dao
            .get_by_countries(country_codes)
            .await
            .context("failed to load airports for meta initialization")?;

        info!("Found {} airports for meta initialization", airports.len());

        for airport in &airports {
            let meta = AirportMeta {
                airport_code: airport.code_iata_airport.clone(),
                imported_from: None,
                imported_to: None,
            };
            self.airports_meta_dao
                .upsert(&meta, false)
                .await
                .with_context(|| {
                    format!(
                        "failed to upsert metadata for airport {}",
                        airport.code_iata_airport
                    )
                })?;
        }

        Ok(airports.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aviation_edge::models::{Airline, Arrival, Departure, Flight};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meta(from: NaiveDate, to: NaiveDate) -> AirportMeta {
        AirportMeta {
            airport_code: "VNO".to_string(),
            imported_from: from.and_hms_opt(0, 0, 0),
            imported_to: to.and_hms_opt(0, 0, 0),
        }
    }

    #[test]
    fn fully_covered_request_is_skipped() {
        let stored = meta(date(2025, 12, 27), date(2025, 12, 31));
        let plan =
            calculate_import_plan(date(2025, 12, 27), date(2025, 12, 30), Some(&stored));
        assert!(plan.skip_import);
        assert_eq!(
            plan.already_covered_by.as_deref(),
            Some("2025-12-27 to 2025-12-31")
        );
    }

    #[test]
    fn partially_covered_request_imports_whole_range_and_merges_meta() {
        let stored = meta(date(2025, 12, 27), date(2025, 12, 31));
        let plan =
            calculate_import_plan(date(2025, 12, 25), date(2025, 12, 29), Some(&stored));
        assert!(!plan.skip_import);
        assert_eq!(plan.import_start_date, date(2025, 12, 25));
        assert_eq!(plan.import_end_date, date(2025, 12, 29));
        assert_eq!(plan.meta_start_date, date(2025, 12, 25));
        assert_eq!(plan.meta_end_date, date(2025, 12, 31));
    }

    #[test]
    fn missing_meta_imports_the_requested_range() {
        let plan = calculate_import_plan(date(2026, 1, 1), date(2026, 1, 5), None);
        assert!(!plan.skip_import);
        assert_eq!(plan.meta_start_date, date(2026, 1, 1));
        assert_eq!(plan.meta_end_date, date(2026, 1, 5));
    }

    #[test]
    fn meta_without_interval_behaves_like_missing_meta() {
        let empty = AirportMeta {
            airport_code: "VNO".to_string(),
            imported_from: None,
            imported_to: None,
        };
        let plan = calculate_import_plan(date(2026, 1, 1), date(2026, 1, 5), Some(&empty));
        assert!(!plan.skip_import);
        assert_eq!(plan.import_start_date, date(2026, 1, 1));
    }

    #[test]
    fn coverage_never_shrinks() {
        let stored = meta(date(2025, 12, 1), date(2025, 12, 31));
        let plan =
            calculate_import_plan(date(2025, 12, 10), date(2025, 12, 12), Some(&stored));
        assert!(plan.skip_import);

        // a request wider on both sides keeps nothing of the old interval
        let plan = calculate_import_plan(date(2025, 11, 1), date(2026, 1, 31), Some(&stored));
        assert_eq!(plan.meta_start_date, date(2025, 11, 1));
        assert_eq!(plan.meta_end_date, date(2026, 1, 31));
    }

    fn raw_schedule(dep_time: &str, arr_time: &str) -> ScheduleResponse {
        ScheduleResponse {
            departure: Departure {
                iata_code: "VNO".to_string(),
                scheduled_time: dep_time.to_string(),
                ..Default::default()
            },
            arrival: Arrival {
                iata_code: "JFK".to_string(),
                scheduled_time: arr_time.to_string(),
                ..Default::default()
            },
            airline: Airline::default(),
            flight: Flight::default(),
            ..Default::default()
        }
    }

    #[test]
    fn normalization_prepends_the_day() {
        let day = date(2026, 8, 20);
        let normalized = normalize_day_schedules(day, vec![raw_schedule("06:25", "09:40")]);
        assert_eq!(normalized[0].departure.scheduled_time, "2026-08-20 06:25");
        assert_eq!(normalized[0].arrival.scheduled_time, "2026-08-20 09:40");
        assert_eq!(normalized[0].schedule_type, "departure");
        assert_eq!(normalized[0].status, "future");
    }

    #[test]
    fn overnight_arrivals_roll_to_the_next_day() {
        let day = date(2026, 8, 20);
        let normalized = normalize_day_schedules(day, vec![raw_schedule("23:50", "01:20")]);
        assert_eq!(normalized[0].departure.scheduled_time, "2026-08-20 23:50");
        assert_eq!(normalized[0].arrival.scheduled_time, "2026-08-21 01:20");
    }

    #[test]
    fn blank_key_fields_get_the_sentinel() {
        let day = date(2026, 8, 20);
        let normalized = normalize_day_schedules(day, vec![raw_schedule("06:25", "09:40")]);
        assert_eq!(normalized[0].airline.name, "-");
        assert_eq!(normalized[0].airline.iata_code, "-");
        assert_eq!(normalized[0].flight.iata_number, "-");
    }

    /// Every normalized leg departs inside the requested day and arrives
    /// before the end of the following one.
    #[test]
    fn normalized_times_stay_in_the_two_day_envelope() {
        use crate::aviation_edge::consumers::travel_projection;

        let day = date(2026, 8, 20);
        let schedules = vec![
            raw_schedule("00:00", "00:01"),
            raw_schedule("12:30", "14:00"),
            raw_schedule("23:59", "06:00"),
        ];
        let mut normalized = normalize_day_schedules(day, schedules);
        for s in normalized.iter_mut() {
            s.flight.iata_number = "T7".to_string();
        }

        for schedule in &normalized {
            let travel = travel_projection(schedule).unwrap();
            assert!(travel.departure.date() == day);
            assert!(travel.arrival.date() <= day + Duration::days(1));
            assert!(travel.arrival > travel.departure);
        }
    }
}
