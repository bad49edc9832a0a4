// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::models::AirportMeta;
use crate::postgres_tools::StopoverPostgresPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::sync::Arc;

/// Per-airport import coverage bookkeeping.
pub struct AirportsMetaDao {
    pool: Arc<StopoverPostgresPool>,
}

impl AirportsMetaDao {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> AirportsMetaDao {
        AirportsMetaDao { pool }
    }

    /// Inserts or updates one coverage record. With `update_dates` the
    /// stored interval is overwritten; without it an existing row is only
    /// touched (`updated_at` advances), which is what the lazy
    /// initialization path wants.
    pub async fn upsert(&self, meta: &AirportMeta, update_dates: bool) -> Result<(), StoreError> {
        use crate::schema::airports_meta::dsl;

        let conn = &mut self.pool.get().await?;

        if update_dates {
            diesel::insert_into(dsl::airports_meta)
                .values(meta)
                .on_conflict(dsl::airport_code)
                .do_update()
                .set((
                    dsl::imported_from.eq(excluded(dsl::imported_from)),
                    dsl::imported_to.eq(excluded(dsl::imported_to)),
                    dsl::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;
        } else {
            diesel::insert_into(dsl::airports_meta)
                .values(meta)
                .on_conflict(dsl::airport_code)
                .do_update()
                .set(dsl::updated_at.eq(diesel::dsl::now))
                .execute(conn)
                .await?;
        }

        Ok(())
    }

    pub async fn get(&self, airport_code: &str) -> Result<Option<AirportMeta>, StoreError> {
        use crate::schema::airports_meta::dsl;

        let conn = &mut self.pool.get().await?;
        let row = dsl::airports_meta
            .filter(dsl::airport_code.eq(airport_code))
            .select(AirportMeta::as_select())
            .first::<AirportMeta>(conn)
            .await
            .optional()?;
        Ok(row)
    }
}
