// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::filters::{MAX_CLUSTERED_CONNECTION_TIME_RANGE, TravelFilter};
use crate::models::Travel;
use crate::postgres_tools::StopoverPostgresPool;
use crate::travel_finder::travel_path::TransferSequence;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text, Timestamp};
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use std::sync::Arc;
use std::time::Duration;

/// Typed access to the `travels` relation and the clustered index tables.
///
/// Path queries run inside a transaction that first arms the server-side
/// statement timeout, so a runaway join is cancelled by the store itself;
/// the search facade keeps its own, shorter wall-clock guard.
pub struct TravelDao {
    pool: Arc<StopoverPostgresPool>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TravelTimeBounds {
    pub min_departure: NaiveDateTime,
    pub max_departure: NaiveDateTime,
    pub min_arrival: NaiveDateTime,
    pub max_arrival: NaiveDateTime,
}

/// Returns the name of the clustered index table for the given width, or
/// an error when the width is not one the builder materializes. This also
/// guards the only place where a table name is assembled dynamically.
pub fn clustered_table_name(max_connection_time_hours: i64) -> Result<String, StoreError> {
    if !MAX_CLUSTERED_CONNECTION_TIME_RANGE.contains(&max_connection_time_hours) {
        return Err(StoreError::UnsupportedClusterWidth(
            max_connection_time_hours,
        ));
    }
    Ok(format!(
        "clustered_arrival_travels{}",
        max_connection_time_hours
    ))
}

fn hour_bucket(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp().div_euclid(3600)
}

fn bucket_to_naive(cl: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(cl * 3600, 0)
        .expect("hour bucket out of chrono range")
        .naive_utc()
}

#[derive(QueryableByName)]
struct SimplePathRow1 {
    #[diesel(sql_type = Text)]
    t1_id: String,
    #[diesel(sql_type = Text)]
    t1_from_point: String,
    #[diesel(sql_type = Text)]
    t1_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t1_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t1_arrival: NaiveDateTime,
}

#[derive(QueryableByName)]
struct SimplePathRow2 {
    #[diesel(sql_type = Text)]
    t1_id: String,
    #[diesel(sql_type = Text)]
    t1_from_point: String,
    #[diesel(sql_type = Text)]
    t1_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t1_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t1_arrival: NaiveDateTime,
    #[diesel(sql_type = Text)]
    t2_id: String,
    #[diesel(sql_type = Text)]
    t2_from_point: String,
    #[diesel(sql_type = Text)]
    t2_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t2_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t2_arrival: NaiveDateTime,
}

#[derive(QueryableByName)]
struct SimplePathRow3 {
    #[diesel(sql_type = Text)]
    t1_id: String,
    #[diesel(sql_type = Text)]
    t1_from_point: String,
    #[diesel(sql_type = Text)]
    t1_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t1_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t1_arrival: NaiveDateTime,
    #[diesel(sql_type = Text)]
    t2_id: String,
    #[diesel(sql_type = Text)]
    t2_from_point: String,
    #[diesel(sql_type = Text)]
    t2_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t2_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t2_arrival: NaiveDateTime,
    #[diesel(sql_type = Text)]
    t3_id: String,
    #[diesel(sql_type = Text)]
    t3_from_point: String,
    #[diesel(sql_type = Text)]
    t3_to_point: String,
    #[diesel(sql_type = Timestamp)]
    t3_departure: NaiveDateTime,
    #[diesel(sql_type = Timestamp)]
    t3_arrival: NaiveDateTime,
}

#[derive(QueryableByName)]
struct ClusterLegRow {
    #[diesel(sql_type = Text)]
    travel_id: String,
    #[diesel(sql_type = Text)]
    from_point: String,
    #[diesel(sql_type = Text)]
    to_point: String,
    #[diesel(sql_type = BigInt)]
    departure_cl: i64,
    #[diesel(sql_type = BigInt)]
    arrival_cl: i64,
    #[diesel(sql_type = BigInt)]
    row_number: i64,
}

impl ClusterLegRow {
    /// Hour buckets are widened back into coarse timestamps; the exact
    /// times arrive later through rehydration.
    fn into_travel(self) -> Travel {
        Travel {
            id: self.travel_id,
            from_point: self.from_point,
            to_point: self.to_point,
            departure: bucket_to_naive(self.departure_cl),
            arrival: bucket_to_naive(self.arrival_cl),
            departure_cl: Some(self.departure_cl),
            arrival_cl: Some(self.arrival_cl),
        }
    }
}

impl TravelDao {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> TravelDao {
        TravelDao {
            pool,
            timeout: None,
        }
    }

    fn statement_timeout_sql(&self) -> Option<String> {
        self.timeout
            .map(|t| format!("SET LOCAL statement_timeout = {}", t.as_millis()))
    }

    /// Client-side safety net, two seconds behind the server-side
    /// statement timeout so the store cancels first and the error stays
    /// distinguishable from a dead connection.
    async fn with_client_guard<T>(
        &self,
        query: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match self.timeout {
            Some(t) => tokio::time::timeout(t + Duration::from_secs(2), query)
                .await
                .map_err(|_| StoreError::DeadlineExceeded)?,
            None => query.await,
        }
    }

    pub async fn insert_many(&self, travels: &[Travel]) -> Result<usize, StoreError> {
        use crate::schema::travels::dsl;

        if travels.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let inserted = diesel::insert_into(dsl::travels)
            .values(travels)
            .execute(conn)
            .await?;
        Ok(inserted)
    }

    /// Insert-or-update keyed on the leg id. The hour buckets are left
    /// untouched on conflict; the cluster builder rewrites them wholesale.
    pub async fn upsert_many(&self, travels: &[Travel]) -> Result<usize, StoreError> {
        use crate::schema::travels::dsl;

        if travels.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let affected = diesel::insert_into(dsl::travels)
            .values(travels)
            .on_conflict(dsl::id)
            .do_update()
            .set((
                dsl::from_point.eq(excluded(dsl::from_point)),
                dsl::to_point.eq(excluded(dsl::to_point)),
                dsl::departure.eq(excluded(dsl::departure)),
                dsl::arrival.eq(excluded(dsl::arrival)),
            ))
            .execute(conn)
            .await?;
        Ok(affected)
    }

    /// Loads every travel. Should be avoided outside tests and tooling.
    pub async fn select_all(&self) -> Result<Vec<Travel>, StoreError> {
        use crate::schema::travels::dsl;

        let conn = &mut self.pool.get().await?;
        let rows = dsl::travels
            .select(Travel::as_select())
            .load::<Travel>(conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        use crate::schema::travels::dsl;

        let conn = &mut self.pool.get().await?;
        let n = dsl::travels.count().get_result::<i64>(conn).await?;
        Ok(n)
    }

    pub async fn find_by_id(&self, travel_id: &str) -> Result<Option<Travel>, StoreError> {
        use crate::schema::travels::dsl;

        let conn = &mut self.pool.get().await?;
        let row = dsl::travels
            .filter(dsl::id.eq(travel_id))
            .select(Travel::as_select())
            .first::<Travel>(conn)
            .await
            .optional()?;
        Ok(row)
    }

    /// One batched lookup; the rehydration step of the clustered strategy
    /// funnels every distinct leg id through here.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Travel>, StoreError> {
        use crate::schema::travels::dsl;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = &mut self.pool.get().await?;
        let rows = dsl::travels
            .filter(dsl::id.eq_any(ids))
            .select(Travel::as_select())
            .load::<Travel>(conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_time_bounds(&self) -> Result<Option<TravelTimeBounds>, StoreError> {
        use crate::schema::travels::dsl;
        use diesel::dsl::{max, min};

        let conn = &mut self.pool.get().await?;
        let (min_dep, max_dep, min_arr, max_arr) = dsl::travels
            .select((
                min(dsl::departure),
                max(dsl::departure),
                min(dsl::arrival),
                max(dsl::arrival),
            ))
            .first::<(
                Option<NaiveDateTime>,
                Option<NaiveDateTime>,
                Option<NaiveDateTime>,
                Option<NaiveDateTime>,
            )>(conn)
            .await?;

        Ok(
            match (min_dep, max_dep, min_arr, max_arr) {
                (Some(min_departure), Some(max_departure), Some(min_arrival), Some(max_arrival)) => {
                    Some(TravelTimeBounds {
                        min_departure,
                        max_departure,
                        min_arrival,
                        max_arrival,
                    })
                }
                _ => None,
            },
        )
    }

    /// Direct legs from source to destination, ordered by arrival.
    pub async fn find_path_simple1(
        &self,
        filter: &TravelFilter,
    ) -> Result<Vec<TransferSequence>, StoreError> {
        const QUERY: &str = "SELECT \
             t1.id AS t1_id, t1.from_point AS t1_from_point, t1.to_point AS t1_to_point, \
             t1.departure AS t1_departure, t1.arrival AS t1_arrival \
             FROM travels t1 \
             WHERE t1.from_point = $1 \
               AND t1.to_point = $2 \
               AND t1.arrival >= $3 \
               AND t1.arrival <= $4 \
             ORDER BY t1.arrival ASC, t1.arrival - t1.departure ASC \
             LIMIT $5";

        let timeout_sql = self.statement_timeout_sql();
        let filter = filter.clone();
        let conn = &mut self.pool.get().await?;

        let rows = self
            .with_client_guard(conn.transaction::<Vec<SimplePathRow1>, StoreError, _>(|conn| {
                async move {
                    if let Some(sql) = timeout_sql {
                        diesel::sql_query(sql).execute(conn).await?;
                    }
                    let rows = diesel::sql_query(QUERY)
                        .bind::<Text, _>(filter.source)
                        .bind::<Text, _>(filter.destination)
                        .bind::<Timestamp, _>(filter.arrival_time_from)
                        .bind::<Timestamp, _>(filter.arrival_time_to)
                        .bind::<BigInt, _>(filter.limit)
                        .load::<SimplePathRow1>(conn)
                        .await?;
                    Ok(rows)
                }
                .scope_boxed()
            }))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                TransferSequence::new(vec![Travel::new(
                    r.t1_id,
                    r.t1_from_point,
                    r.t1_to_point,
                    r.t1_departure,
                    r.t1_arrival,
                )])
            })
            .collect())
    }

    /// Two legs with one connection, joined in the store.
    pub async fn find_path_simple2(
        &self,
        filter: &TravelFilter,
    ) -> Result<Vec<TransferSequence>, StoreError> {
        const QUERY: &str = "SELECT \
             t1.id AS t1_id, t1.from_point AS t1_from_point, t1.to_point AS t1_to_point, \
             t1.departure AS t1_departure, t1.arrival AS t1_arrival, \
             t2.id AS t2_id, t2.from_point AS t2_from_point, t2.to_point AS t2_to_point, \
             t2.departure AS t2_departure, t2.arrival AS t2_arrival \
             FROM travels t1 \
             INNER JOIN travels t2 ON t1.to_point = t2.from_point \
               AND t2.departure >= t1.arrival \
               AND t2.departure <= t1.arrival + make_interval(hours => $3::int) \
             WHERE t1.from_point = $1 \
               AND t2.to_point = $2 \
               AND t2.arrival >= $4 \
               AND t2.arrival <= $5 \
             ORDER BY t2.arrival ASC, t2.arrival - t1.departure ASC \
             LIMIT $6";

        let timeout_sql = self.statement_timeout_sql();
        let filter = filter.clone();
        let conn = &mut self.pool.get().await?;

        let rows = self
            .with_client_guard(conn.transaction::<Vec<SimplePathRow2>, StoreError, _>(|conn| {
                async move {
                    if let Some(sql) = timeout_sql {
                        diesel::sql_query(sql).execute(conn).await?;
                    }
                    let rows = diesel::sql_query(QUERY)
                        .bind::<Text, _>(filter.source)
                        .bind::<Text, _>(filter.destination)
                        .bind::<BigInt, _>(filter.max_connection_time_hours)
                        .bind::<Timestamp, _>(filter.arrival_time_from)
                        .bind::<Timestamp, _>(filter.arrival_time_to)
                        .bind::<BigInt, _>(filter.limit)
                        .load::<SimplePathRow2>(conn)
                        .await?;
                    Ok(rows)
                }
                .scope_boxed()
            }))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                TransferSequence::new(vec![
                    Travel::new(
                        r.t1_id,
                        r.t1_from_point,
                        r.t1_to_point,
                        r.t1_departure,
                        r.t1_arrival,
                    ),
                    Travel::new(
                        r.t2_id,
                        r.t2_from_point,
                        r.t2_to_point,
                        r.t2_departure,
                        r.t2_arrival,
                    ),
                ])
            })
            .collect())
    }

    /// Three legs with two connections.
    pub async fn find_path_simple3(
        &self,
        filter: &TravelFilter,
    ) -> Result<Vec<TransferSequence>, StoreError> {
        const QUERY: &str = "SELECT \
             t1.id AS t1_id, t1.from_point AS t1_from_point, t1.to_point AS t1_to_point, \
             t1.departure AS t1_departure, t1.arrival AS t1_arrival, \
             t2.id AS t2_id, t2.from_point AS t2_from_point, t2.to_point AS t2_to_point, \
             t2.departure AS t2_departure, t2.arrival AS t2_arrival, \
             t3.id AS t3_id, t3.from_point AS t3_from_point, t3.to_point AS t3_to_point, \
             t3.departure AS t3_departure, t3.arrival AS t3_arrival \
             FROM travels t1 \
             INNER JOIN travels t2 ON t1.to_point = t2.from_point \
               AND t2.departure >= t1.arrival \
               AND t2.departure <= t1.arrival + make_interval(hours => $3::int) \
             INNER JOIN travels t3 ON t2.to_point = t3.from_point \
               AND t3.departure >= t2.arrival \
               AND t3.departure <= t2.arrival + make_interval(hours => $3::int) \
             WHERE t1.from_point = $1 \
               AND t3.to_point = $2 \
               AND t3.arrival >= $4 \
               AND t3.arrival <= $5 \
             ORDER BY t3.arrival ASC, t3.arrival - t1.departure ASC \
             LIMIT $6";

        let timeout_sql = self.statement_timeout_sql();
        let filter = filter.clone();
        let conn = &mut self.pool.get().await?;

        let rows = self
            .with_client_guard(conn.transaction::<Vec<SimplePathRow3>, StoreError, _>(|conn| {
                async move {
                    if let Some(sql) = timeout_sql {
                        diesel::sql_query(sql).execute(conn).await?;
                    }
                    let rows = diesel::sql_query(QUERY)
                        .bind::<Text, _>(filter.source)
                        .bind::<Text, _>(filter.destination)
                        .bind::<BigInt, _>(filter.max_connection_time_hours)
                        .bind::<Timestamp, _>(filter.arrival_time_from)
                        .bind::<Timestamp, _>(filter.arrival_time_to)
                        .bind::<BigInt, _>(filter.limit)
                        .load::<SimplePathRow3>(conn)
                        .await?;
                    Ok(rows)
                }
                .scope_boxed()
            }))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                TransferSequence::new(vec![
                    Travel::new(
                        r.t1_id,
                        r.t1_from_point,
                        r.t1_to_point,
                        r.t1_departure,
                        r.t1_arrival,
                    ),
                    Travel::new(
                        r.t2_id,
                        r.t2_from_point,
                        r.t2_to_point,
                        r.t2_departure,
                        r.t2_arrival,
                    ),
                    Travel::new(
                        r.t3_id,
                        r.t3_from_point,
                        r.t3_to_point,
                        r.t3_departure,
                        r.t3_arrival,
                    ),
                ])
            })
            .collect())
    }

    /// Candidate sequences of `leg_count` legs over the clustered index
    /// table for the requested width. The equi-join on hour buckets
    /// over-approximates the layover constraint; the caller rehydrates
    /// exact timestamps and filters afterwards.
    pub async fn find_path_clustered(
        &self,
        leg_count: usize,
        source: &str,
        destination: &str,
        arrival_time_from: NaiveDateTime,
        arrival_time_to: NaiveDateTime,
        max_connection_time_hours: i64,
    ) -> Result<Vec<TransferSequence>, StoreError> {
        debug_assert!((2..=5).contains(&leg_count));

        let table = clustered_table_name(max_connection_time_hours)?;
        let min_cluster = hour_bucket(arrival_time_from);
        let max_cluster = hour_bucket(arrival_time_to);

        // each candidate row is unnested into one output row per leg so a
        // single QueryableByName struct serves every leg count
        let query = build_clustered_query(&table, leg_count);

        let timeout_sql = self.statement_timeout_sql();
        let source = source.to_string();
        let destination = destination.to_string();
        let conn = &mut self.pool.get().await?;

        let rows = self
            .with_client_guard(conn.transaction::<Vec<ClusterLegRow>, StoreError, _>(|conn| {
                async move {
                    if let Some(sql) = timeout_sql {
                        diesel::sql_query(sql).execute(conn).await?;
                    }
                    let rows = diesel::sql_query(query)
                        .bind::<Text, _>(source)
                        .bind::<Text, _>(destination)
                        .bind::<BigInt, _>(min_cluster)
                        .bind::<BigInt, _>(max_cluster)
                        .load::<ClusterLegRow>(conn)
                        .await?;
                    Ok(rows)
                }
                .scope_boxed()
            }))
            .await?;

        Ok(group_cluster_rows(rows, leg_count))
    }
}

/// Assembles the self-join over `leg_count` copies of a clustered table.
/// The result set is flattened to one row per (candidate, leg) pair,
/// tagged with a row number and the leg index, so decoding stays uniform
/// across leg counts.
fn build_clustered_query(table: &str, leg_count: usize) -> String {
    let mut joins = String::new();
    for i in 2..=leg_count {
        joins.push_str(&format!(
            " JOIN {table} c{i} ON c{prev}.to_point = c{i}.from_point \
             AND c{prev}.arrival_cl = c{i}.departure_cl",
            table = table,
            i = i,
            prev = i - 1
        ));
    }

    let mut per_leg_selects = Vec::with_capacity(leg_count);
    for i in 1..=leg_count {
        per_leg_selects.push(format!(
            "SELECT candidates.row_number, {i}::bigint AS leg_index, \
             candidates.c{i}_travel_id AS travel_id, candidates.c{i}_from_point AS from_point, \
             candidates.c{i}_to_point AS to_point, candidates.c{i}_departure_cl AS departure_cl, \
             candidates.c{i}_arrival_cl AS arrival_cl FROM candidates",
            i = i
        ));
    }

    let mut candidate_columns = Vec::with_capacity(leg_count * 5);
    for i in 1..=leg_count {
        candidate_columns.push(format!(
            "c{i}.travel_id AS c{i}_travel_id, c{i}.from_point AS c{i}_from_point, \
             c{i}.to_point AS c{i}_to_point, c{i}.departure_cl AS c{i}_departure_cl, \
             c{i}.arrival_cl AS c{i}_arrival_cl",
            i = i
        ));
    }

    format!(
        "WITH candidates AS (SELECT ROW_NUMBER() OVER () AS row_number, {columns} \
         FROM {table} c1{joins} \
         WHERE c1.from_point = $1 \
           AND c{last}.to_point = $2 \
           AND c{last}.arrival_cl >= $3 \
           AND c{last}.arrival_cl <= $4) \
         {unions} ORDER BY row_number, leg_index",
        columns = candidate_columns.join(", "),
        table = table,
        joins = joins,
        last = leg_count,
        unions = per_leg_selects.join(" UNION ALL ")
    )
}

/// Reassembles the flattened (candidate, leg) rows into ordered sequences.
fn group_cluster_rows(rows: Vec<ClusterLegRow>, leg_count: usize) -> Vec<TransferSequence> {
    let mut sequences = Vec::with_capacity(rows.len() / leg_count.max(1));
    let mut current: Vec<Travel> = Vec::with_capacity(leg_count);
    let mut current_row: Option<i64> = None;

    for row in rows {
        if current_row != Some(row.row_number) {
            if current.len() == leg_count {
                sequences.push(TransferSequence::new(std::mem::take(&mut current)));
            } else {
                current.clear();
            }
            current_row = Some(row.row_number);
        }
        current.push(row.into_travel());
    }
    if current.len() == leg_count {
        sequences.push(TransferSequence::new(current));
    }

    sequences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clustered_table_name_accepts_only_known_widths() {
        assert_eq!(
            clustered_table_name(32).unwrap(),
            "clustered_arrival_travels32"
        );
        assert_eq!(
            clustered_table_name(2).unwrap(),
            "clustered_arrival_travels2"
        );
        assert!(clustered_table_name(7).is_err());
        assert!(clustered_table_name(64).is_err());
        assert!(clustered_table_name(0).is_err());
    }

    #[test]
    fn hour_bucket_floors_epoch_seconds() {
        let t = chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(1, 59, 59)
            .unwrap();
        assert_eq!(hour_bucket(t), 1);
        let t2 = chrono::NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(hour_bucket(t2), t2.and_utc().timestamp() / 3600);
    }

    #[test]
    fn bucket_round_trips_to_naive_time() {
        let t = chrono::NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        assert_eq!(bucket_to_naive(hour_bucket(t)), t);
    }

    #[test]
    fn clustered_query_joins_n_copies() {
        let q = build_clustered_query("clustered_arrival_travels32", 3);
        assert_eq!(q.matches("JOIN clustered_arrival_travels32").count(), 2);
        assert!(q.contains("c1.from_point = $1"));
        assert!(q.contains("c3.to_point = $2"));
        assert!(q.contains("c3.arrival_cl >= $3"));
        assert!(q.contains("c2.arrival_cl = c3.departure_cl"));
        assert!(q.contains("UNION ALL"));
    }

    fn row(n: i64, id: &str) -> ClusterLegRow {
        ClusterLegRow {
            travel_id: id.to_string(),
            from_point: "a".to_string(),
            to_point: "b".to_string(),
            departure_cl: 10,
            arrival_cl: 12,
            row_number: n,
        }
    }

    #[test]
    fn grouping_rebuilds_sequences_in_leg_order() {
        let rows = vec![row(1, "x"), row(1, "y"), row(2, "p"), row(2, "q")];
        let seqs = group_cluster_rows(rows, 2);
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].leg_ids(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(seqs[1].leg_ids(), vec!["p".to_string(), "q".to_string()]);
    }

    #[test]
    fn grouping_drops_incomplete_candidates() {
        let rows = vec![row(1, "x"), row(2, "p"), row(2, "q")];
        let seqs = group_cluster_rows(rows, 2);
        assert_eq!(seqs.len(), 1);
        assert_eq!(seqs[0].leg_ids(), vec!["p".to_string(), "q".to_string()]);
    }
}
