// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Ingestion CLI: plans and imports departure schedules for one or more
//! airports over a date range, tracking per-airport coverage so repeated
//! runs are idempotent.

use clap::Parser;
use std::sync::Arc;
use stopover::aviation_edge::consumers::DatabaseConsumer;
use stopover::aviation_edge::AviationEdgeClient;
use stopover::countries::EUROPEAN_COUNTRY_CODES;
use stopover::dao::{AirportsDao, AirportsMetaDao, FlightSchedulesDao, TravelDao};
use stopover::import_schedules::DataCollector;
use stopover::postgres_tools::make_async_pool;
use stopover::timehelper;

#[derive(Parser, Debug)]
#[command(
    name = "collect_schedules",
    about = "Import departure schedules for an airport over a date range"
)]
struct Args {
    /// Airport IATA code, or a comma-separated list for a parallel
    /// import (e.g. VNO or VNO,KUN,RIX)
    #[arg(long)]
    airport: String,

    /// Start date, YYYY-MM-DD
    #[arg(long)]
    start: String,

    /// End date, YYYY-MM-DD
    #[arg(long)]
    end: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args).await {
        eprintln!("collect_schedules failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let start = timehelper::parse_date(&args.start)
        .map_err(|e| anyhow::anyhow!("invalid start date {}: {}", args.start, e))?;
    let end = timehelper::parse_date(&args.end)
        .map_err(|e| anyhow::anyhow!("invalid end date {}: {}", args.end, e))?;
    anyhow::ensure!(start <= end, "start date is after end date");

    let api_key = std::env::var("AVIATION_EDGE_API_KEY")
        .map_err(|_| anyhow::anyhow!("AVIATION_EDGE_API_KEY must be set"))?;

    let pool = Arc::new(
        make_async_pool()
            .await
            .map_err(|e| anyhow::anyhow!("database pool: {}", e))?,
    );

    let consumer = Arc::new(DatabaseConsumer::new(
        Arc::new(FlightSchedulesDao::new(pool.clone())),
        Arc::new(TravelDao::new(pool.clone())),
    ));

    let collector = Arc::new(DataCollector::new(
        Arc::new(AviationEdgeClient::new(api_key)),
        consumer.clone(),
        Arc::new(AirportsDao::new(pool.clone())),
        Arc::new(AirportsMetaDao::new(pool)),
    ));

    collector
        .initialize_airports_meta(&EUROPEAN_COUNTRY_CODES)
        .await?;

    let airports: Vec<String> = args
        .airport
        .split(',')
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect();
    anyhow::ensure!(!airports.is_empty(), "no airport codes given");

    let results = collector
        .clone()
        .import_departure_schedules_for_airports(&airports, start, end)
        .await;

    let mut failed = 0usize;
    for (airport, result) in results {
        match result {
            Ok(plan) if plan.skip_import => println!(
                "Airport {} is already imported in the range {} (requested: {} to {})",
                airport,
                plan.already_covered_by.as_deref().unwrap_or("?"),
                start,
                end
            ),
            Ok(plan) => println!(
                "Airport {} imported, metadata updated with range {} to {}",
                airport, plan.meta_start_date, plan.meta_end_date
            ),
            Err(err) => {
                failed += 1;
                eprintln!("Airport {} failed: {:#}", airport, err);
            }
        }
    }

    println!("Total schedules written: {}", consumer.total());
    anyhow::ensure!(failed == 0, "{} airport import(s) failed", failed);

    Ok(())
}
