// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::dao::StoreError;
use crate::models::FlightSchedule;
use crate::postgres_tools::StopoverPostgresPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::sync::Arc;

/// Raw provider schedule rows, upserted on the natural key
/// `(flight_iata_number, dep_scheduled_time, dep_iata_code, arr_iata_code)`.
pub struct FlightSchedulesDao {
    pool: Arc<StopoverPostgresPool>,
}

impl FlightSchedulesDao {
    pub fn new(pool: Arc<StopoverPostgresPool>) -> FlightSchedulesDao {
        FlightSchedulesDao { pool }
    }

    pub async fn upsert_many(&self, schedules: &[FlightSchedule]) -> Result<usize, StoreError> {
        use crate::schema::flight_schedules::dsl;

        if schedules.is_empty() {
            return Ok(0);
        }

        let conn = &mut self.pool.get().await?;
        let affected = diesel::insert_into(dsl::flight_schedules)
            .values(schedules)
            .on_conflict((
                dsl::flight_iata_number,
                dsl::dep_scheduled_time,
                dsl::dep_iata_code,
                dsl::arr_iata_code,
            ))
            .do_update()
            .set((
                dsl::type_.eq(excluded(dsl::type_)),
                dsl::status.eq(excluded(dsl::status)),
                dsl::dep_icao_code.eq(excluded(dsl::dep_icao_code)),
                dsl::dep_terminal.eq(excluded(dsl::dep_terminal)),
                dsl::dep_gate.eq(excluded(dsl::dep_gate)),
                dsl::dep_delay.eq(excluded(dsl::dep_delay)),
                dsl::dep_estimated_time.eq(excluded(dsl::dep_estimated_time)),
                dsl::dep_actual_time.eq(excluded(dsl::dep_actual_time)),
                dsl::dep_estimated_runway.eq(excluded(dsl::dep_estimated_runway)),
                dsl::dep_actual_runway.eq(excluded(dsl::dep_actual_runway)),
                dsl::arr_icao_code.eq(excluded(dsl::arr_icao_code)),
                dsl::arr_terminal.eq(excluded(dsl::arr_terminal)),
                dsl::arr_gate.eq(excluded(dsl::arr_gate)),
                dsl::arr_baggage.eq(excluded(dsl::arr_baggage)),
                dsl::arr_delay.eq(excluded(dsl::arr_delay)),
                dsl::arr_scheduled_time.eq(excluded(dsl::arr_scheduled_time)),
                dsl::arr_estimated_time.eq(excluded(dsl::arr_estimated_time)),
                dsl::arr_actual_time.eq(excluded(dsl::arr_actual_time)),
                dsl::arr_estimated_runway.eq(excluded(dsl::arr_estimated_runway)),
                dsl::arr_actual_runway.eq(excluded(dsl::arr_actual_runway)),
                dsl::airline_name.eq(excluded(dsl::airline_name)),
                dsl::airline_iata_code.eq(excluded(dsl::airline_iata_code)),
                dsl::airline_icao_code.eq(excluded(dsl::airline_icao_code)),
                dsl::flight_number.eq(excluded(dsl::flight_number)),
                dsl::flight_icao_number.eq(excluded(dsl::flight_icao_number)),
                dsl::aircraft_reg_number.eq(excluded(dsl::aircraft_reg_number)),
                dsl::aircraft_icao_code.eq(excluded(dsl::aircraft_icao_code)),
                dsl::aircraft_icao_code_hex.eq(excluded(dsl::aircraft_icao_code_hex)),
                dsl::aircraft_iata_code.eq(excluded(dsl::aircraft_iata_code)),
                dsl::aircraft_model_code.eq(excluded(dsl::aircraft_model_code)),
                dsl::aircraft_model_text.eq(excluded(dsl::aircraft_model_text)),
                dsl::codeshared_airline_name.eq(excluded(dsl::codeshared_airline_name)),
                dsl::codeshared_airline_iata.eq(excluded(dsl::codeshared_airline_iata)),
                dsl::codeshared_airline_icao.eq(excluded(dsl::codeshared_airline_icao)),
                dsl::codeshared_flight_number.eq(excluded(dsl::codeshared_flight_number)),
                dsl::codeshared_flight_iata.eq(excluded(dsl::codeshared_flight_iata)),
                dsl::codeshared_flight_icao.eq(excluded(dsl::codeshared_flight_icao)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await?;
        Ok(affected)
    }

    pub async fn get_all(&self) -> Result<Vec<FlightSchedule>, StoreError> {
        use crate::schema::flight_schedules::dsl;

        let conn = &mut self.pool.get().await?;
        let rows = dsl::flight_schedules
            .order(dsl::id)
            .select(FlightSchedule::as_select())
            .load::<FlightSchedule>(conn)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        use crate::schema::flight_schedules::dsl;

        let conn = &mut self.pool.get().await?;
        let n = dsl::flight_schedules.count().get_result::<i64>(conn).await?;
        Ok(n)
    }
}
