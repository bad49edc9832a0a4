// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

//! Offline cluster index build: stamps hour buckets on the raw travels,
//! then rebuilds every clustered_arrival_travels table in doubling order.
//! Run after bulk ingest; writers must stay away from the cluster tables
//! while this runs.

use clap::Parser;
use log::info;
use std::sync::Arc;
use stopover::clusters::ClustersCreator;
use stopover::dao::TravelDao;
use stopover::filters::MAX_CLUSTERED_CONNECTION_TIME_RANGE;
use stopover::postgres_tools::make_async_pool;

#[derive(Parser, Debug)]
#[command(
    name = "create_clusters",
    about = "Rebuild the time-clustered index tables from the travels relation"
)]
struct Args {
    /// Skip phase 1 (hour bucket stamping) and only rebuild the tables
    #[arg(long)]
    skip_update: bool,
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
        eprintln!("create_clusters failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let pool = Arc::new(
        make_async_pool()
            .await
            .map_err(|e| anyhow::anyhow!("database pool: {}", e))?,
    );

    let creator = ClustersCreator::new(pool.clone());
    let travel_dao = TravelDao::new(pool);

    if args.skip_update {
        info!("Skipping hour bucket update (phase 1)");
    } else {
        creator.update_clusters_on_travels().await?;
    }

    creator.create_clusters_tables().await?;
    creator.insert_clusters_data().await?;

    // report the duplication ratios so a broken build is visible at once
    let mut parent_count = travel_dao.count().await?;
    println!("travels: {} rows", parent_count);
    for width in MAX_CLUSTERED_CONNECTION_TIME_RANGE {
        let count = creator.count_cluster_rows(width).await?;
        let expected = 2 * parent_count;
        println!(
            "clustered_arrival_travels{}: {} rows (expected {}){}",
            width,
            count,
            expected,
            if count == expected { "" } else { "  <-- MISMATCH" }
        );
        parent_count = count;
    }

    Ok(())
}
