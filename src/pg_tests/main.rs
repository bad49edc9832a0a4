// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! End-to-end scenarios against a live database (`DATABASE_URL`):
//! generates the 3x3 grid network, builds the cluster tables, and drives
//! both search strategies through the canonical checks. Destructive on
//! the points/travels/flight_schedules/airports_meta tables; point it at
//! a scratch database.

mod gridgen;

use anyhow::{ensure, Context};
use chrono::{Duration, NaiveDate};
use diesel_async::RunQueryDsl;
use gridgen::GridGenerator;
use log::info;
use std::sync::Arc;
use stopover::aviation_edge::models::{Airline, Arrival, Departure, Flight, ScheduleResponse};
use stopover::clusters::ClustersCreator;
use stopover::dao::{AirportsMetaDao, FlightSchedulesDao, PointDao, TravelDao};
use stopover::filters::TravelFilter;
use stopover::import_schedules::calculate_import_plan;
use stopover::models::AirportMeta;
use stopover::postgres_tools::{make_async_pool, StopoverPostgresPool};
use stopover::travel_finder::TravelSearchService;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(err) = run().await {
        eprintln!("pg_tests failed: {:#}", err);
        std::process::exit(1);
    }
    println!("pg_tests passed");
}

async fn run() -> anyhow::Result<()> {
    let pool = Arc::new(
        make_async_pool()
            .await
            .map_err(|e| anyhow::anyhow!("database pool: {}", e))?,
    );

    wipe_tables(&pool).await?;

    let travel_dao = Arc::new(TravelDao::new(pool.clone()));
    let point_dao = PointDao::new(pool.clone());

    // scenario: grid generation
    let generator = GridGenerator::new(5, 1000.0);
    let points = generator.generate_points();
    let from = NaiveDate::from_ymd_opt(2027, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let to = from + Duration::hours(24);
    let travels = generator.generate_travels(&points, from, to, 1000.0, 2);

    point_dao.insert_many(&points).await?;
    travel_dao.insert_many(&travels).await?;

    ensure!(point_dao.count().await? == 9, "expected 9 grid points");
    ensure!(travel_dao.count().await? == 112, "expected 112 grid legs");
    info!("grid generation: 9 points, 112 legs");

    // cluster build + duplication invariant
    let creator = ClustersCreator::new(pool.clone());
    creator.update_clusters_on_travels().await?;
    creator.create_clusters_tables().await?;
    creator.insert_clusters_data().await?;

    let mut parent_count = travel_dao.count().await?;
    for width in [2i64, 4, 8, 16, 32] {
        let count = creator.count_cluster_rows(width).await?;
        ensure!(
            count == 2 * parent_count,
            "cluster table {} holds {} rows, expected {}",
            width,
            count,
            2 * parent_count
        );
        parent_count = count;
    }
    info!("cluster duplication invariant holds up to width 32");

    let service = TravelSearchService::new(pool.clone());

    // scenario: direct leg
    let filter = TravelFilter::new("1", "2", from, to, 1);
    let direct = service.search(filter, Some("simple")).await?;
    ensure!(!direct.paths.is_empty(), "no direct path from 1 to 2");
    let first = &direct.paths[0].transfers[0];
    ensure!(
        first.departure == from && first.arrival == from + Duration::hours(2),
        "direct leg expected 00:00 -> 02:00, got {} -> {}",
        first.departure,
        first.arrival
    );
    info!("direct scenario: 1 -> 2 departs at window start, 2h duration");

    // both strategies take the direct path for a single leg and must agree
    let filter1 = TravelFilter::new("1", "2", from, to, 1);
    let direct_clustered = service.search(filter1, Some("clustered")).await?;
    ensure!(
        direct_clustered
            .paths
            .iter()
            .map(|p| p.leg_ids())
            .collect::<Vec<_>>()
            == direct.paths.iter().map(|p| p.leg_ids()).collect::<Vec<_>>(),
        "strategies disagree on single-leg paths"
    );

    // scenario: diagonal via the hub
    let filter2 = TravelFilter::new("1", "9", from, to, 2);
    let via_hub = service.search(filter2.clone(), Some("simple")).await?;
    ensure!(!via_hub.paths.is_empty(), "no 2-leg path from 1 to 9");
    ensure!(
        via_hub.paths.iter().any(|p| p.transfers[0].to_point == "5"),
        "expected at least one path through the center point 5"
    );
    for path in &via_hub.paths {
        ensure!(
            path.transfers[1].departure >= path.transfers[0].arrival,
            "second leg departs before the first arrives"
        );
    }
    info!("hub scenario: {} paths from 1 to 9", via_hub.paths.len());

    // scenario: cluster parity against the simple reference
    let clustered = service.search(filter2, Some("clustered")).await?;
    let reference_ids: Vec<Vec<String>> = via_hub.paths.iter().map(|p| p.leg_ids()).collect();
    let clustered_ids: Vec<Vec<String>> = clustered.paths.iter().map(|p| p.leg_ids()).collect();
    ensure!(
        is_subsequence(&clustered_ids, &reference_ids),
        "clustered results are not a subsequence of the simple reference"
    );
    ensure!(
        !clustered.paths.is_empty(),
        "clustered strategy found nothing where simple did"
    );
    for path in &clustered.paths {
        for pair in path.transfers.windows(2) {
            let connection = pair[1].departure - pair[0].arrival;
            ensure!(
                connection >= Duration::zero() && connection <= Duration::hours(32),
                "connection time {} outside [0, 32h]",
                connection
            );
        }
    }
    info!(
        "cluster parity: {} clustered paths within {} simple paths",
        clustered.paths.len(),
        via_hub.paths.len()
    );

    // same parity with three legs, the deepest count the simple join does
    let filter3 = TravelFilter::new("1", "9", from, to, 3);
    let simple3 = service.search(filter3.clone(), Some("simple")).await?;
    let clustered3 = service.search(filter3, Some("clustered")).await?;
    let simple3_ids: Vec<Vec<String>> = simple3.paths.iter().map(|p| p.leg_ids()).collect();
    let clustered3_ids: Vec<Vec<String>> = clustered3.paths.iter().map(|p| p.leg_ids()).collect();
    ensure!(
        is_subsequence(&clustered3_ids, &simple3_ids),
        "3-leg clustered results diverge from the simple reference"
    );
    info!(
        "3-leg parity: {} clustered paths within {} simple paths",
        clustered3.paths.len(),
        simple3.paths.len()
    );

    // ordering: final arrival ascending, duration breaking ties
    for outcome in [&via_hub, &clustered] {
        for pair in outcome.paths.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            ensure!(
                a.final_arrival() < b.final_arrival()
                    || (a.final_arrival() == b.final_arrival()
                        && a.total_duration <= b.total_duration),
                "paths are not ordered by (arrival, duration)"
            );
        }
    }
    info!("result ordering verified");

    // scenario: upsert idempotence on travels
    let mut before = travel_dao.select_all().await?;
    travel_dao.upsert_many(&travels).await?;
    ensure!(
        travel_dao.count().await? == 112,
        "travel upsert created duplicates"
    );
    let mut after = travel_dao.select_all().await?;
    before.sort_by(|a, b| a.id.cmp(&b.id));
    after.sort_by(|a, b| a.id.cmp(&b.id));
    for (a, b) in before.iter().zip(after.iter()) {
        ensure!(
            a.id == b.id && a.departure == b.departure && a.arrival == b.arrival,
            "upsert changed rows"
        );
    }
    info!("travel upsert is idempotent");

    // scenario: flight schedule upsert updates in place
    check_flight_schedule_upsert(&pool).await?;

    // scenario: import plan against live metadata
    check_import_plan_merge(&pool).await?;

    Ok(())
}

/// `needle` must appear inside `haystack` in order (gaps allowed).
fn is_subsequence(needle: &[Vec<String>], haystack: &[Vec<String>]) -> bool {
    let mut position = 0usize;
    for item in needle {
        loop {
            if position >= haystack.len() {
                return false;
            }
            position += 1;
            if &haystack[position - 1] == item {
                break;
            }
        }
    }
    true
}

async fn wipe_tables(pool: &Arc<StopoverPostgresPool>) -> anyhow::Result<()> {
    let conn = &mut pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("pool: {}", e))?;
    for table in ["travels", "points", "flight_schedules", "airports_meta"] {
        diesel::sql_query(format!("DELETE FROM {}", table))
            .execute(conn)
            .await
            .with_context(|| format!("failed to clear table {}", table))?;
    }
    Ok(())
}

fn af1234(gate: &str) -> ScheduleResponse {
    ScheduleResponse {
        schedule_type: "departure".to_string(),
        status: "future".to_string(),
        departure: Departure {
            iata_code: "CDG".to_string(),
            gate: gate.to_string(),
            scheduled_time: "2027-01-05 09:00".to_string(),
            ..Default::default()
        },
        arrival: Arrival {
            iata_code: "VNO".to_string(),
            scheduled_time: "2027-01-05 13:10".to_string(),
            ..Default::default()
        },
        airline: Airline {
            name: "Air France".to_string(),
            iata_code: "AF".to_string(),
            ..Default::default()
        },
        flight: Flight {
            iata_number: "AF1234".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn check_flight_schedule_upsert(pool: &Arc<StopoverPostgresPool>) -> anyhow::Result<()> {
    use stopover::aviation_edge::consumers::flight_schedule_row;

    let dao = FlightSchedulesDao::new(pool.clone());

    dao.upsert_many(&[flight_schedule_row(&af1234("A1"))])
        .await?;
    dao.upsert_many(&[flight_schedule_row(&af1234("A3"))])
        .await?;

    let all = dao.get_all().await?;
    ensure!(
        all.len() == 1,
        "expected one flight schedule row, got {}",
        all.len()
    );
    ensure!(
        all[0].dep_gate.as_deref() == Some("A3"),
        "expected updated gate A3, got {:?}",
        all[0].dep_gate
    );
    info!("flight schedule upsert replaces the gate in place");
    Ok(())
}

async fn check_import_plan_merge(pool: &Arc<StopoverPostgresPool>) -> anyhow::Result<()> {
    let dao = AirportsMetaDao::new(pool.clone());

    let stored = AirportMeta {
        airport_code: "VNO".to_string(),
        imported_from: NaiveDate::from_ymd_opt(2025, 12, 27)
            .unwrap()
            .and_hms_opt(0, 0, 0),
        imported_to: NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0),
    };
    dao.upsert(&stored, true).await?;

    let meta = dao.get("VNO").await?;
    let covered = calculate_import_plan(
        NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(),
        NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
        meta.as_ref(),
    );
    ensure!(covered.skip_import, "fully covered range should be skipped");

    let widened = calculate_import_plan(
        NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
        NaiveDate::from_ymd_opt(2025, 12, 29).unwrap(),
        meta.as_ref(),
    );
    ensure!(!widened.skip_import, "partially covered range must import");

    // simulate the successful import writing the merged interval back
    let merged = AirportMeta {
        airport_code: "VNO".to_string(),
        imported_from: widened.meta_start_date.and_hms_opt(0, 0, 0),
        imported_to: widened.meta_end_date.and_hms_opt(0, 0, 0),
    };
    dao.upsert(&merged, true).await?;

    let reloaded = dao.get("VNO").await?.context("meta row vanished")?;
    ensure!(
        reloaded.imported_from
            == NaiveDate::from_ymd_opt(2025, 12, 25)
                .unwrap()
                .and_hms_opt(0, 0, 0)
            && reloaded.imported_to
                == NaiveDate::from_ymd_opt(2025, 12, 31)
                    .unwrap()
                    .and_hms_opt(0, 0, 0),
        "merged coverage interval is wrong: {:?} - {:?}",
        reloaded.imported_from,
        reloaded.imported_to
    );
    info!("import coverage merges monotonically");
    Ok(())
}
