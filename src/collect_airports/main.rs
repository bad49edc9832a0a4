// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Pulls the provider's airport database country by country, upserting
//! the airports relation and mirroring each airport into the points
//! relation (id = IATA code, x/y = longitude/latitude) so searches can
//! resolve and label endpoints.

use clap::Parser;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use stopover::aviation_edge::models::AirportResponse;
use stopover::aviation_edge::AviationEdgeClient;
use stopover::countries::EUROPEAN_COUNTRY_CODES;
use stopover::dao::{AirportsDao, PointDao};
use stopover::models::{Airport, Point};
use stopover::postgres_tools::make_async_pool;

#[derive(Parser, Debug)]
#[command(
    name = "collect_airports",
    about = "Import the airport database for a list of countries"
)]
struct Args {
    /// Comma-separated ISO2 country codes; defaults to all of Europe
    #[arg(long)]
    countries: Option<String>,
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
        eprintln!("collect_airports failed: {:#}", err);
        std::process::exit(1);
    }
}

fn airport_row(response: &AirportResponse) -> Option<Airport> {
    if response.code_iata_airport.is_empty() {
        return None;
    }
    let airport_id = response.airport_id.as_deref()?.parse::<i32>().ok()?;

    fn optional(value: &str) -> Option<String> {
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    Some(Airport {
        airport_id,
        name_airport: response.name_airport.clone(),
        code_iata_airport: response.code_iata_airport.clone(),
        code_icao_airport: response.code_icao_airport.clone(),
        name_translations: response
            .name_translations
            .as_ref()
            .and_then(|t| serde_json::to_value(t).ok()),
        latitude_airport: response.latitude_airport,
        longitude_airport: response.longitude_airport,
        geoname_id: optional(&response.geoname_id),
        timezone: optional(&response.timezone),
        gmt: optional(&response.gmt),
        phone: optional(&response.phone),
        name_country: optional(&response.name_country),
        code_iso2_country: optional(&response.code_iso2_country),
        code_iata_city: optional(&response.code_iata_city),
    })
}

fn airport_point(airport: &Airport) -> Point {
    Point {
        id: airport.code_iata_airport.clone(),
        x: airport.longitude_airport,
        y: airport.latitude_airport,
        name: airport.name_airport.clone(),
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let api_key = std::env::var("AVIATION_EDGE_API_KEY")
        .map_err(|_| anyhow::anyhow!("AVIATION_EDGE_API_KEY must be set"))?;

    let countries: Vec<String> = match &args.countries {
        Some(list) => list
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect(),
        None => EUROPEAN_COUNTRY_CODES.iter().map(|c| c.to_string()).collect(),
    };
    anyhow::ensure!(!countries.is_empty(), "no countries to import");

    let pool = Arc::new(
        make_async_pool()
            .await
            .map_err(|e| anyhow::anyhow!("database pool: {}", e))?,
    );
    let airports_dao = AirportsDao::new(pool.clone());
    let point_dao = PointDao::new(pool);
    let client = AviationEdgeClient::new(api_key);

    let mut total = 0usize;
    for (index, country) in countries.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let responses = match client.get_airports_by_country(country).await {
            Ok(responses) => responses,
            Err(err) => {
                // a country without airports comes back as a provider
                // error; log and keep sweeping
                warn!("country {}: {}", country, err);
                continue;
            }
        };

        let airports: Vec<Airport> = responses.iter().filter_map(airport_row).collect();
        if airports.len() < responses.len() {
            warn!(
                "country {}: {} of {} airports had no usable id or IATA code",
                country,
                responses.len() - airports.len(),
                responses.len()
            );
        }

        airports_dao.upsert_many(&airports).await?;
        let points: Vec<Point> = airports.iter().map(airport_point).collect();
        point_dao.upsert_many(&points).await?;

        info!("country {}: {} airports", country, airports.len());
        total += airports.len();
    }

    println!("Imported {} airports from {} countries", total, countries.len());
    Ok(())
}
