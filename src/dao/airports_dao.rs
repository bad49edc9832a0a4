// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::models::Airport;
use crate::postgres_tools::StopoverPostgresPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::sync::Arc;

pub struct AirportsDao {
    pool: Arc<StopoverPostgresPool>,
}

impl AirportsDao {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> AirportsDao {
        AirportsDao { pool }
    }

    /// Insert-or-update keyed on the IATA code; every provider field is
    /// overwritten on conflict and `updated_at` is refreshed.
    pub async fn upsert_many(&self, airports: &[Airport]) -> Result<usize, StoreError> {
        use crate::schema::airports::dsl;

        if airports.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let affected = diesel::insert_into(dsl::airports)
            .values(airports)
            .on_conflict(dsl::code_iata_airport)
            .do_update()
            .set((
                dsl::name_airport.eq(excluded(dsl::name_airport)),
                dsl::code_icao_airport.eq(excluded(dsl::code_icao_airport)),
                dsl::name_translations.eq(excluded(dsl::name_translations)),
                dsl::latitude_airport.eq(excluded(dsl::latitude_airport)),
                dsl::longitude_airport.eq(excluded(dsl::longitude_airport)),
                dsl::geoname_id.eq(excluded(dsl::geoname_id)),
                dsl::timezone.eq(excluded(dsl::timezone)),
                dsl::gmt.eq(excluded(dsl::gmt)),
                dsl::phone.eq(excluded(dsl::phone)),
                dsl::name_country.eq(excluded(dsl::name_country)),
                dsl::code_iso2_country.eq(excluded(dsl::code_iso2_country)),
                dsl::code_iata_city.eq(excluded(dsl::code_iata_city)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await?;
        Ok(affected)
    }

    pub async fn get(&self, iata_code: &str) -> Result<Option<Airport>, StoreError> {
        use crate::schema::airports::dsl;

        let conn = &mut self.pool.get().await?;
        let row = dsl::airports
            .filter(dsl::code_iata_airport.eq(iata_code))
            .select(Airport::as_select())
            .first::<Airport>(conn)
            .await
            .optional()?;
        Ok(row)
    }

    pub async fn get_by_countries(&self, country_codes: &[&str]) -> Result<Vec<Airport>, StoreError> {
        use crate::schema::airports::dsl;

        if country_codes.is_empty() {
            return Ok(Vec::new());
        }

        let codes: Vec<String> = country_codes.iter().map(|c| c.to_string()).collect();

        let conn = &mut self.pool.get().await?;
        let rows = dsl::airports
            .filter(dsl::code_iso2_country.eq_any(codes))
            .select(Airport::as_select())
            .load::<Airport>(conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        use crate::schema::airports::dsl;

        let conn = &mut self.pool.get().await?;
        let n = dsl::airports.count().get_result::<i64>(conn).await?;
        Ok(n)
    }
}
