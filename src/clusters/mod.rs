// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::filters::MAX_CLUSTERED_CONNECTION_TIME_RANGE;
use crate::postgres_tools::StopoverPostgresPool;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use log::info;
use std::sync::Arc;
use std::time::Instant;

/// Builds the family of `clustered_arrival_travels{w}` tables.
///
/// Phase 1 stamps the hour buckets on the raw travels. Phase 2 rebuilds
/// the widths in doubling order: `C_2` duplicates every leg with a
/// one-hour arrival shift, and each `C_{2k}` is `C_k` plus `C_k` shifted
/// by `k` hours. An equi-join on the shifted buckets then approximates
/// "next departure within w hours of previous arrival".
///
/// Once a phase 2 insert has started the build is not cancellable;
/// callers must tolerate phase completion.
pub struct ClustersCreator {
    pool: Arc<StopoverPostgresPool>,
}

pub fn update_clusters_sql() -> &'static str {
    "UPDATE travels SET \
     departure_cl = floor(extract(epoch from departure) / 3600)::bigint, \
     arrival_cl = floor(extract(epoch from arrival) / 3600)::bigint"
}

pub fn create_clusters_table_sqls(width: i64) -> Vec<String> {
    vec![
        format!("DROP TABLE IF EXISTS clustered_arrival_travels{}", width),
        format!(
            "CREATE TABLE clustered_arrival_travels{w} (\
             travel_id varchar(64) NOT NULL, \
             from_point varchar(64) NOT NULL, \
             to_point varchar(64) NOT NULL, \
             departure_cl bigint, \
             arrival_cl bigint)",
            w = width
        ),
        format!(
            "CREATE INDEX clustered_arrival_travels{w}_from_dep_idx \
             ON clustered_arrival_travels{w} (from_point, departure_cl)",
            w = width
        ),
        format!(
            "CREATE INDEX clustered_arrival_travels{w}_to_arr_idx \
             ON clustered_arrival_travels{w} (to_point, arrival_cl)",
            w = width
        ),
    ]
}

/// The two inserts that realize `C_w = parent ∪ shift(parent, w/2)`,
/// bracketed by index drops and rebuilds so the bulk load stays
/// sequential.
pub fn insert_clusters_data_sqls(width: i64) -> Vec<String> {
    let (parent_table, parent_id) = if width > 2 {
        (format!("clustered_arrival_travels{}", width / 2), "t.travel_id")
    } else {
        ("travels".to_string(), "t.id")
    };

    vec![
        format!(
            "DROP INDEX IF EXISTS clustered_arrival_travels{}_from_dep_idx",
            width
        ),
        format!(
            "DROP INDEX IF EXISTS clustered_arrival_travels{}_to_arr_idx",
            width
        ),
        format!(
            "INSERT INTO clustered_arrival_travels{w} \
             SELECT {id}, t.from_point, t.to_point, t.departure_cl, t.arrival_cl \
             FROM {parent} t",
            w = width,
            id = parent_id,
            parent = parent_table
        ),
        format!(
            "INSERT INTO clustered_arrival_travels{w} \
             SELECT {id}, t.from_point, t.to_point, t.departure_cl, t.arrival_cl + {shift} \
             FROM {parent} t",
            w = width,
            id = parent_id,
            parent = parent_table,
            shift = width / 2
        ),
        format!(
            "CREATE INDEX clustered_arrival_travels{w}_from_dep_idx \
             ON clustered_arrival_travels{w} (from_point, departure_cl)",
            w = width
        ),
        format!(
            "CREATE INDEX clustered_arrival_travels{w}_to_arr_idx \
             ON clustered_arrival_travels{w} (to_point, arrival_cl)",
            w = width
        ),
    ]
}

#[derive(diesel::QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

impl ClustersCreator {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> ClustersCreator {
        ClustersCreator { pool }
    }

    async fn run_sql(&self, sql: &str) -> Result<(), StoreError> {
        let conn = &mut self.pool.get().await?;
        info!("Running sql : {}", sql);
        let started = Instant::now();
        diesel::sql_query(sql).execute(conn).await?;
        info!("sql execution duration {:?}", started.elapsed());
        Ok(())
    }

    /// Phase 1: stamp `departure_cl` / `arrival_cl` on every travel row.
    pub async fn update_clusters_on_travels(&self) -> Result<(), StoreError> {
        self.run_sql(update_clusters_sql()).await
    }

    /// Recreates the empty cluster tables for every width.
    pub async fn create_clusters_tables(&self) -> Result<(), StoreError> {
        for width in MAX_CLUSTERED_CONNECTION_TIME_RANGE {
            for sql in create_clusters_table_sqls(width) {
                self.run_sql(&sql).await?;
            }
        }
        Ok(())
    }

    /// Phase 2: populate `C_2` through `C_32`, narrowest first, each
    /// width doubling from its parent.
    pub async fn insert_clusters_data(&self) -> Result<(), StoreError> {
        for width in MAX_CLUSTERED_CONNECTION_TIME_RANGE {
            for sql in insert_clusters_data_sqls(width) {
                self.run_sql(&sql).await?;
            }
        }
        Ok(())
    }

    /// Row count of one cluster table; the duplication invariant check
    /// (`|C_w| = 2 |C_{w/2}|`) runs on these.
    pub async fn count_cluster_rows(&self, width: i64) -> Result<i64, StoreError> {
        let table = crate::dao::travel_dao::clustered_table_name(width)?;
        let conn = &mut self.pool.get().await?;
        let row: CountRow =
            diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {}", table))
                .get_result(conn)
                .await?;
        Ok(row.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_double_from_two_to_thirty_two() {
        assert_eq!(MAX_CLUSTERED_CONNECTION_TIME_RANGE, [2, 4, 8, 16, 32]);
    }

    #[test]
    fn base_width_reads_from_raw_travels() {
        let sqls = insert_clusters_data_sqls(2);
        assert!(sqls[2].contains("FROM travels t"));
        assert!(sqls[2].contains("SELECT t.id,"));
        assert!(sqls[3].contains("t.arrival_cl + 1"));
    }

    #[test]
    fn wider_tables_read_from_their_parent() {
        let sqls = insert_clusters_data_sqls(16);
        assert!(sqls[2].contains("FROM clustered_arrival_travels8 t"));
        assert!(sqls[2].contains("SELECT t.travel_id,"));
        assert!(sqls[3].contains("t.arrival_cl + 8"));
        assert!(sqls[2].contains("INSERT INTO clustered_arrival_travels16"));
    }

    #[test]
    fn bulk_load_is_bracketed_by_index_rebuild() {
        let sqls = insert_clusters_data_sqls(4);
        assert!(sqls[0].starts_with("DROP INDEX"));
        assert!(sqls[1].starts_with("DROP INDEX"));
        assert!(sqls[4].starts_with("CREATE INDEX"));
        assert!(sqls[5].starts_with("CREATE INDEX"));
    }

    #[test]
    fn phase_one_floors_epoch_hours() {
        let sql = update_clusters_sql();
        assert!(sql.contains("floor(extract(epoch from departure) / 3600)"));
        assert!(sql.contains("floor(extract(epoch from arrival) / 3600)"));
    }

    /// In-memory model of the doubling recurrence: starting from one row
    /// per leg, applying the per-width duplication yields w rows per leg
    /// covering every shift 0..w-1, so each table doubles its parent.
    #[test]
    fn doubling_recurrence_covers_every_hour_shift() {
        let legs: Vec<i64> = vec![100, 205, 309];

        let mut parent: Vec<(usize, i64)> = legs.iter().copied().enumerate().collect();

        for width in MAX_CLUSTERED_CONNECTION_TIME_RANGE {
            let shift = width / 2;
            let mut table = parent.clone();
            table.extend(parent.iter().map(|&(id, arr)| (id, arr + shift)));

            assert_eq!(table.len(), 2 * parent.len());
            assert_eq!(table.len() as i64, width * legs.len() as i64);

            // every leg appears once per shift 0..width-1
            for (leg_index, base_arrival) in legs.iter().enumerate() {
                let mut shifts: Vec<i64> = table
                    .iter()
                    .filter(|&&(id, _)| id == leg_index)
                    .map(|&(_, arr)| arr - base_arrival)
                    .collect();
                shifts.sort_unstable();
                let expected: Vec<i64> = (0..width).collect();
                assert_eq!(shifts, expected);
            }

            parent = table;
        }

        assert_eq!(parent.len(), 32 * legs.len());
    }
}
