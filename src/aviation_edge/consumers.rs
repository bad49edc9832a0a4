// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::aviation_edge::models::ScheduleResponse;
use crate::dao::{FlightSchedulesDao, TravelDao};
use crate::models::{FlightSchedule, Travel};
use crate::timehelper;
use anyhow::Context;
use async_trait::async_trait;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

/// A sink for schedule batches. Ingestion may run one task per airport,
/// so implementations synchronize their own state.
#[async_trait]
pub trait ScheduleConsumer: Send + Sync {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()>;

    /// Drains whatever the consumer buffered. A no-op for unbuffered sinks.
    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Prints one line per leg to stdout.
#[derive(Default)]
pub struct PrintConsumer {
    total_count: Mutex<usize>,
}

impl PrintConsumer {
    pub fn new() -> PrintConsumer {
        PrintConsumer::default()
    }

    pub fn total(&self) -> usize {
        *self.total_count.lock().unwrap()
    }
}

#[async_trait]
impl ScheduleConsumer for PrintConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        let mut total = self.total_count.lock().unwrap();
        for schedule in schedules {
            println!(
                "Flight {} ({}): {} -> {} | Type: {} | Status: {}",
                schedule.flight.iata_number,
                schedule.airline.name,
                schedule.departure.iata_code,
                schedule.arrival.iata_code,
                schedule.schedule_type,
                schedule.status
            );
        }
        *total += schedules.len();
        Ok(())
    }
}

/// Collects every batch into memory. Test and tooling helper.
#[derive(Default)]
pub struct SliceConsumer {
    schedules: Mutex<Vec<ScheduleResponse>>,
}

impl SliceConsumer {
    pub fn new() -> SliceConsumer {
        SliceConsumer::default()
    }

    pub fn take(&self) -> Vec<ScheduleResponse> {
        std::mem::take(&mut *self.schedules.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.schedules.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScheduleConsumer for SliceConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        self.schedules
            .lock()
            .unwrap()
            .extend(schedules.iter().cloned());
        Ok(())
    }
}

/// Accumulates batches and serializes the whole backlog to one JSON file
/// when it reaches the flush threshold (or on explicit flush). The write
/// goes through a temp file and a rename. Not meant for streams larger
/// than memory.
pub struct FileConsumer {
    file_path: PathBuf,
    schedules: Mutex<Vec<ScheduleResponse>>,
    auto_flush: bool,
    flush_threshold: usize,
}

impl FileConsumer {
    pub fn new(file_path: impl Into<PathBuf>, auto_flush: bool) -> FileConsumer {
        FileConsumer {
            file_path: file_path.into(),
            schedules: Mutex::new(Vec::new()),
            auto_flush,
            flush_threshold: 1000,
        }
    }

    fn flush_locked(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        if schedules.is_empty() {
            return Ok(());
        }

        let data = serde_json::to_vec_pretty(schedules).context("failed to marshal schedules")?;

        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, data).context("failed to write schedule file")?;
        fs::rename(&tmp_path, &self.file_path).context("failed to move schedule file in place")?;

        info!(
            "Flushed {} schedules to {}",
            schedules.len(),
            self.file_path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl ScheduleConsumer for FileConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        let mut buffered = self.schedules.lock().unwrap();
        buffered.extend(schedules.iter().cloned());

        if self.auto_flush && buffered.len() >= self.flush_threshold {
            return self.flush_locked(&buffered);
        }

        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let buffered = self.schedules.lock().unwrap();
        self.flush_locked(&buffered)
    }
}

/// Upserts each batch into the store: the raw provider row, plus the
/// `travels` projection the path search runs on.
pub struct DatabaseConsumer {
    flight_schedules_dao: Arc<FlightSchedulesDao>,
    travel_dao: Arc<TravelDao>,
    total_count: Mutex<usize>,
}

impl DatabaseConsumer {
    pub fn new(
        flight_schedules_dao: Arc<FlightSchedulesDao>,
        travel_dao: Arc<TravelDao>,
    ) -> DatabaseConsumer {
        DatabaseConsumer {
            flight_schedules_dao,
            travel_dao,
            total_count: Mutex::new(0),
        }
    }

    pub fn total(&self) -> usize {
        *self.total_count.lock().unwrap()
    }
}

#[async_trait]
impl ScheduleConsumer for DatabaseConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        if schedules.is_empty() {
            return Ok(());
        }

        let rows: Vec<FlightSchedule> = schedules.iter().map(flight_schedule_row).collect();
        self.flight_schedules_dao.upsert_many(&rows).await?;

        let travels: Vec<Travel> = schedules.iter().filter_map(travel_projection).collect();
        if travels.len() < schedules.len() {
            warn!(
                "{} of {} schedules had no usable timestamps and were not projected to travels",
                schedules.len() - travels.len(),
                schedules.len()
            );
        }
        self.travel_dao.upsert_many(&travels).await?;

        let total = {
            let mut total = self.total_count.lock().unwrap();
            *total += schedules.len();
            *total
        };
        info!(
            "Inserted/updated {} schedules to database (total: {})",
            schedules.len(),
            total
        );

        Ok(())
    }
}

/// Forwards only the legs matching a predicate.
pub struct FilterConsumer {
    predicate: Box<dyn Fn(&ScheduleResponse) -> bool + Send + Sync>,
    next: Arc<dyn ScheduleConsumer>,
}

impl FilterConsumer {
    pub fn new(
        predicate: impl Fn(&ScheduleResponse) -> bool + Send + Sync + 'static,
        next: Arc<dyn ScheduleConsumer>,
    ) -> FilterConsumer {
        FilterConsumer {
            predicate: Box::new(predicate),
            next,
        }
    }
}

#[async_trait]
impl ScheduleConsumer for FilterConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        let matching: Vec<ScheduleResponse> = schedules
            .iter()
            .filter(|s| (self.predicate)(s))
            .cloned()
            .collect();
        if matching.is_empty() {
            return Ok(());
        }
        self.next.consume(&matching).await
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.next.flush().await
    }
}

/// Fans a batch out to several downstreams, sequentially so ordering is
/// preserved. A downstream failure is logged and swallowed: the fan-out
/// is diagnostic, not transactional.
pub struct BroadcastConsumer {
    downstreams: Vec<Arc<dyn ScheduleConsumer>>,
}

impl BroadcastConsumer {
    pub fn new(downstreams: Vec<Arc<dyn ScheduleConsumer>>) -> BroadcastConsumer {
        BroadcastConsumer { downstreams }
    }
}

#[async_trait]
impl ScheduleConsumer for BroadcastConsumer {
    async fn consume(&self, schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
        for downstream in &self.downstreams {
            if let Err(err) = downstream.consume(schedules).await {
                warn!("broadcast downstream failed: {}", err);
            }
        }
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        for downstream in &self.downstreams {
            if let Err(err) = downstream.flush().await {
                warn!("broadcast downstream flush failed: {}", err);
            }
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Maps a provider schedule onto the flight_schedules row, one column per
/// JSON field, empty strings becoming NULLs.
pub fn flight_schedule_row(schedule: &ScheduleResponse) -> FlightSchedule {
    let codeshared = schedule.codeshared.as_ref();
    FlightSchedule {
        schedule_type: schedule.schedule_type.clone(),
        status: schedule.status.clone(),
        dep_iata_code: schedule.departure.iata_code.clone(),
        dep_icao_code: optional(&schedule.departure.icao_code),
        dep_terminal: optional(&schedule.departure.terminal),
        dep_gate: optional(&schedule.departure.gate),
        dep_delay: schedule.departure.delay.clone(),
        dep_scheduled_time: schedule.departure.scheduled_time.clone(),
        dep_estimated_time: optional(&schedule.departure.estimated_time),
        dep_actual_time: optional(&schedule.departure.actual_time),
        dep_estimated_runway: optional(&schedule.departure.estimated_runway),
        dep_actual_runway: optional(&schedule.departure.actual_runway),
        arr_iata_code: schedule.arrival.iata_code.clone(),
        arr_icao_code: optional(&schedule.arrival.icao_code),
        arr_terminal: optional(&schedule.arrival.terminal),
        arr_gate: optional(&schedule.arrival.gate),
        arr_baggage: optional(&schedule.arrival.baggage),
        arr_delay: schedule.arrival.delay.clone(),
        arr_scheduled_time: schedule.arrival.scheduled_time.clone(),
        arr_estimated_time: optional(&schedule.arrival.estimated_time),
        arr_actual_time: optional(&schedule.arrival.actual_time),
        arr_estimated_runway: optional(&schedule.arrival.estimated_runway),
        arr_actual_runway: optional(&schedule.arrival.actual_runway),
        airline_name: schedule.airline.name.clone(),
        airline_iata_code: schedule.airline.iata_code.clone(),
        airline_icao_code: optional(&schedule.airline.icao_code),
        flight_number: optional(&schedule.flight.number),
        flight_iata_number: schedule.flight.iata_number.clone(),
        flight_icao_number: optional(&schedule.flight.icao_number),
        aircraft_reg_number: optional(&schedule.aircraft.reg_number),
        aircraft_icao_code: optional(&schedule.aircraft.icao_code),
        aircraft_icao_code_hex: optional(&schedule.aircraft.icao_code_hex),
        aircraft_iata_code: optional(&schedule.aircraft.iata_code),
        aircraft_model_code: optional(&schedule.aircraft.model_code),
        aircraft_model_text: optional(&schedule.aircraft.model_text),
        codeshared_airline_name: codeshared.and_then(|c| optional(&c.airline.name)),
        codeshared_airline_iata: codeshared.and_then(|c| optional(&c.airline.iata_code)),
        codeshared_airline_icao: codeshared.and_then(|c| optional(&c.airline.icao_code)),
        codeshared_flight_number: codeshared.and_then(|c| optional(&c.flight.number)),
        codeshared_flight_iata: codeshared.and_then(|c| optional(&c.flight.iata_number)),
        codeshared_flight_icao: codeshared.and_then(|c| optional(&c.flight.icao_number)),
    }
}

const SCHEDULE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.3f",
];

/// Projects a normalized schedule onto the travels relation the path
/// search joins over. Legs without parseable timestamps, without both
/// airport codes, or arriving no later than they depart are skipped.
pub fn travel_projection(schedule: &ScheduleResponse) -> Option<Travel> {
    if schedule.departure.iata_code.is_empty() || schedule.arrival.iata_code.is_empty() {
        return None;
    }

    let departure = timehelper::try_to_parse_date_time(
        &schedule.departure.scheduled_time,
        &SCHEDULE_TIME_FORMATS,
    )
    .ok()?;
    let arrival = timehelper::try_to_parse_date_time(
        &schedule.arrival.scheduled_time,
        &SCHEDULE_TIME_FORMATS,
    )
    .ok()?;

    if arrival <= departure {
        return None;
    }

    Some(Travel::new(
        format!(
            "{}_{}",
            schedule.flight.iata_number, schedule.departure.scheduled_time
        ),
        schedule.departure.iata_code.to_uppercase(),
        schedule.arrival.iata_code.to_uppercase(),
        departure,
        arrival,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aviation_edge::models::{Airline, Arrival, Departure, Flight};

    fn schedule(flight: &str, dep: &str, arr: &str, dep_time: &str, arr_time: &str) -> ScheduleResponse {
        ScheduleResponse {
            schedule_type: "departure".to_string(),
            status: "future".to_string(),
            departure: Departure {
                iata_code: dep.to_string(),
                scheduled_time: dep_time.to_string(),
                ..Default::default()
            },
            arrival: Arrival {
                iata_code: arr.to_string(),
                scheduled_time: arr_time.to_string(),
                ..Default::default()
            },
            airline: Airline {
                name: "Test Air".to_string(),
                iata_code: "T7".to_string(),
                ..Default::default()
            },
            flight: Flight {
                iata_number: flight.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn filter_forwards_only_matching_legs() {
        let sink = Arc::new(SliceConsumer::new());
        let filter = FilterConsumer::new(
            |s: &ScheduleResponse| s.departure.iata_code == "VNO",
            sink.clone(),
        );

        let batch = vec![
            schedule("T71", "VNO", "FRA", "2026-08-20 06:00", "2026-08-20 08:00"),
            schedule("T72", "KUN", "FRA", "2026-08-20 06:00", "2026-08-20 08:00"),
        ];
        filter.consume(&batch).await.unwrap();

        let seen = sink.take();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].flight.iata_number, "T71");
    }

    #[tokio::test]
    async fn broadcast_swallows_downstream_failures() {
        struct FailingConsumer;

        #[async_trait]
        impl ScheduleConsumer for FailingConsumer {
            async fn consume(&self, _schedules: &[ScheduleResponse]) -> anyhow::Result<()> {
                anyhow::bail!("sink on fire")
            }
        }

        let sink = Arc::new(SliceConsumer::new());
        let broadcast =
            BroadcastConsumer::new(vec![Arc::new(FailingConsumer), sink.clone()]);

        let batch = vec![schedule(
            "T71",
            "VNO",
            "FRA",
            "2026-08-20 06:00",
            "2026-08-20 08:00",
        )];
        broadcast.consume(&batch).await.unwrap();

        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn file_consumer_flushes_accumulated_set() {
        let path = std::env::temp_dir().join("stopover_file_consumer_test.json");
        let _ = fs::remove_file(&path);

        let consumer = FileConsumer::new(&path, false);
        consumer
            .consume(&[schedule(
                "T71",
                "VNO",
                "FRA",
                "2026-08-20 06:00",
                "2026-08-20 08:00",
            )])
            .await
            .unwrap();
        consumer
            .consume(&[schedule(
                "T72",
                "VNO",
                "OSL",
                "2026-08-20 09:00",
                "2026-08-20 11:00",
            )])
            .await
            .unwrap();

        assert!(!path.exists());
        consumer.flush().await.unwrap();

        let written: Vec<ScheduleResponse> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].flight.iata_number, "T72");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn travel_projection_builds_leg_from_schedule() {
        let s = schedule("LH887", "vno", "FRA", "2026-08-20 06:25", "2026-08-20 07:40");
        let travel = travel_projection(&s).unwrap();
        assert_eq!(travel.id, "LH887_2026-08-20 06:25");
        assert_eq!(travel.from_point, "VNO");
        assert_eq!(travel.to_point, "FRA");
        assert_eq!(travel.duration(), chrono::Duration::minutes(75));
    }

    #[test]
    fn travel_projection_rejects_inverted_times() {
        let s = schedule("T71", "VNO", "FRA", "2026-08-20 08:00", "2026-08-20 06:00");
        assert!(travel_projection(&s).is_none());
        let eq = schedule("T71", "VNO", "FRA", "2026-08-20 08:00", "2026-08-20 08:00");
        assert!(travel_projection(&eq).is_none());
    }

    #[test]
    fn travel_projection_requires_airport_codes() {
        let s = schedule("T71", "", "FRA", "2026-08-20 06:00", "2026-08-20 08:00");
        assert!(travel_projection(&s).is_none());
    }

    #[test]
    fn flight_schedule_row_nulls_empty_fields() {
        let s = schedule("LH887", "VNO", "FRA", "2026-08-20 06:25", "2026-08-20 07:40");
        let row = flight_schedule_row(&s);
        assert_eq!(row.flight_iata_number, "LH887");
        assert_eq!(row.dep_terminal, None);
        assert_eq!(row.codeshared_flight_iata, None);
        assert_eq!(row.airline_name, "Test Air");
    }
}
