// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Deserialize;
use serde::Serialize;

/// A node of the transport network. Airports imported from the provider and
/// synthetic grid points share this table.
#[derive(Queryable, Selectable, Insertable, Clone, Serialize, Deserialize, Debug, PartialEq)]
#[diesel(table_name = crate::schema::points)]
pub struct Point {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub name: String,
}

impl Point {
    pub fn calculate_distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn build_location_key(&self) -> String {
        crate::build_location_key(self.x, self.y)
    }
}

/// One scheduled, timed, directed leg between two points.
///
/// `departure_cl` / `arrival_cl` are the hour buckets
/// (`floor(epoch_seconds / 3600)`) stamped by the cluster builder; they are
/// null until the first cluster build runs.
#[derive(Queryable, Selectable, Insertable, Clone, Serialize, Deserialize, Debug, PartialEq)]
#[diesel(table_name = crate::schema::travels)]
pub struct Travel {
    pub id: String,
    pub from_point: String,
    pub to_point: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub departure_cl: Option<i64>,
    pub arrival_cl: Option<i64>,
}

impl Travel {
    pub fn new(
        id: String,
        from_point: String,
        to_point: String,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
    ) -> Travel {
        Travel {
            id,
            from_point,
            to_point,
            departure,
            arrival,
            departure_cl: None,
            arrival_cl: None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.arrival - self.departure
    }
}

#[derive(Queryable, Selectable, Insertable, Clone, Serialize, Deserialize, Debug)]
#[diesel(table_name = crate::schema::airports)]
pub struct Airport {
    pub airport_id: i32,
    pub name_airport: String,
    pub code_iata_airport: String,
    pub code_icao_airport: String,
    pub name_translations: Option<serde_json::Value>,
    pub latitude_airport: f64,
    pub longitude_airport: f64,
    pub geoname_id: Option<String>,
    pub timezone: Option<String>,
    pub gmt: Option<String>,
    pub phone: Option<String>,
    pub name_country: Option<String>,
    pub code_iso2_country: Option<String>,
    pub code_iata_city: Option<String>,
}

/// Per-airport ingestion coverage. The interval is inclusive on both ends
/// and only ever grows.
#[derive(Queryable, Selectable, Insertable, Clone, Serialize, Deserialize, Debug, PartialEq)]
#[diesel(table_name = crate::schema::airports_meta)]
pub struct AirportMeta {
    pub airport_code: String,
    pub imported_from: Option<NaiveDateTime>,
    pub imported_to: Option<NaiveDateTime>,
}

/// Raw provider schedule row, one column per provider JSON field.
#[derive(Queryable, Selectable, Insertable, Clone, Serialize, Deserialize, Debug)]
#[diesel(table_name = crate::schema::flight_schedules)]
pub struct FlightSchedule {
    #[diesel(column_name = type_)]
    pub schedule_type: String,
    pub status: String,
    pub dep_iata_code: String,
    pub dep_icao_code: Option<String>,
    pub dep_terminal: Option<String>,
    pub dep_gate: Option<String>,
    pub dep_delay: Option<String>,
    pub dep_scheduled_time: String,
    pub dep_estimated_time: Option<String>,
    pub dep_actual_time: Option<String>,
    pub dep_estimated_runway: Option<String>,
    pub dep_actual_runway: Option<String>,
    pub arr_iata_code: String,
    pub arr_icao_code: Option<String>,
    pub arr_terminal: Option<String>,
    pub arr_gate: Option<String>,
    pub arr_baggage: Option<String>,
    pub arr_delay: Option<String>,
    pub arr_scheduled_time: String,
    pub arr_estimated_time: Option<String>,
    pub arr_actual_time: Option<String>,
    pub arr_estimated_runway: Option<String>,
    pub arr_actual_runway: Option<String>,
    pub airline_name: String,
    pub airline_iata_code: String,
    pub airline_icao_code: Option<String>,
    pub flight_number: Option<String>,
    pub flight_iata_number: String,
    pub flight_icao_number: Option<String>,
    pub aircraft_reg_number: Option<String>,
    pub aircraft_icao_code: Option<String>,
    pub aircraft_icao_code_hex: Option<String>,
    pub aircraft_iata_code: Option<String>,
    pub aircraft_model_code: Option<String>,
    pub aircraft_model_text: Option<String>,
    pub codeshared_airline_name: Option<String>,
    pub codeshared_airline_iata: Option<String>,
    pub codeshared_airline_icao: Option<String>,
    pub codeshared_flight_number: Option<String>,
    pub codeshared_flight_iata: Option<String>,
    pub codeshared_flight_icao: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn point_distance_is_euclidean() {
        let a = Point {
            id: "1".to_string(),
            x: 0.0,
            y: 0.0,
            name: "a".to_string(),
        };
        let b = Point {
            id: "2".to_string(),
            x: 3000.0,
            y: 4000.0,
            name: "b".to_string(),
        };
        assert_eq!(a.calculate_distance(&b), 5000.0);
        assert_eq!(b.calculate_distance(&a), 5000.0);
    }

    #[test]
    fn travel_duration() {
        let dep = NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let arr = NaiveDate::from_ymd_opt(2027, 1, 1)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        let t = Travel::new(
            "t1".to_string(),
            "1".to_string(),
            "2".to_string(),
            dep,
            arr,
        );
        assert_eq!(t.duration(), chrono::Duration::hours(2));
    }
}
