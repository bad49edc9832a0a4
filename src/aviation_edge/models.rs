// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Delay and a few other numeric-looking fields arrive sometimes as
/// numbers, sometimes as strings, sometimes not at all.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Departure {
    #[serde(default, rename = "iataCode")]
    pub iata_code: String,
    #[serde(default, rename = "icaoCode")]
    pub icao_code: String,
    #[serde(default)]
    pub terminal: String,
    #[serde(default)]
    pub gate: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub delay: Option<String>,
    #[serde(default, rename = "scheduledTime")]
    pub scheduled_time: String,
    #[serde(default, rename = "estimatedTime")]
    pub estimated_time: String,
    #[serde(default, rename = "actualTime")]
    pub actual_time: String,
    #[serde(default, rename = "estimatedRunway")]
    pub estimated_runway: String,
    #[serde(default, rename = "actualRunway")]
    pub actual_runway: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Arrival {
    #[serde(default, rename = "iataCode")]
    pub iata_code: String,
    #[serde(default, rename = "icaoCode")]
    pub icao_code: String,
    #[serde(default)]
    pub terminal: String,
    #[serde(default)]
    pub gate: String,
    #[serde(default)]
    pub baggage: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub delay: Option<String>,
    #[serde(default, rename = "scheduledTime")]
    pub scheduled_time: String,
    #[serde(default, rename = "estimatedTime")]
    pub estimated_time: String,
    #[serde(default, rename = "actualTime")]
    pub actual_time: String,
    #[serde(default, rename = "estimatedRunway")]
    pub estimated_runway: String,
    #[serde(default, rename = "actualRunway")]
    pub actual_runway: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Airline {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "iataCode")]
    pub iata_code: String,
    #[serde(default, rename = "icaoCode")]
    pub icao_code: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Flight {
    #[serde(default)]
    pub number: String,
    #[serde(default, rename = "iataNumber")]
    pub iata_number: String,
    #[serde(default, rename = "icaoNumber")]
    pub icao_number: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Aircraft {
    #[serde(default, rename = "regNumber")]
    pub reg_number: String,
    #[serde(default, rename = "icaoCode")]
    pub icao_code: String,
    #[serde(default, rename = "icaoCodeHex")]
    pub icao_code_hex: String,
    #[serde(default, rename = "iataCode")]
    pub iata_code: String,
    #[serde(default, rename = "modelCode")]
    pub model_code: String,
    #[serde(default, rename = "modelText")]
    pub model_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Codeshared {
    #[serde(default)]
    pub airline: Airline,
    #[serde(default)]
    pub flight: Flight,
}

/// One row of the `timetable` / `flightsFuture` / `flightsHistory`
/// responses. Field names are part of the provider contract.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ScheduleResponse {
    #[serde(default, rename = "type")]
    pub schedule_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub departure: Departure,
    #[serde(default)]
    pub arrival: Arrival,
    #[serde(default)]
    pub airline: Airline,
    #[serde(default)]
    pub flight: Flight,
    #[serde(default)]
    pub aircraft: Aircraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codeshared: Option<Codeshared>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Geography {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    #[serde(default)]
    pub direction: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Speed {
    #[serde(default)]
    pub horizontal: f64,
    #[serde(default, rename = "isGround")]
    pub is_ground: f64,
    #[serde(default)]
    pub vertical: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct System {
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub squawk: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FlightTrackerResponse {
    #[serde(default)]
    pub geography: Geography,
    #[serde(default)]
    pub speed: Speed,
    #[serde(default)]
    pub departure: Departure,
    #[serde(default)]
    pub arrival: Arrival,
    #[serde(default)]
    pub aircraft: Aircraft,
    #[serde(default)]
    pub airline: Airline,
    #[serde(default)]
    pub flight: Flight,
    #[serde(default)]
    pub system: System,
    #[serde(default)]
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RouteResponse {
    #[serde(default, rename = "departureIata")]
    pub departure_iata: String,
    #[serde(default, rename = "departureIcao")]
    pub departure_icao: String,
    #[serde(default, rename = "departureTerminal")]
    pub departure_terminal: String,
    #[serde(default, rename = "departureTime")]
    pub departure_time: String,
    #[serde(default, rename = "arrivalIata")]
    pub arrival_iata: String,
    #[serde(default, rename = "arrivalIcao")]
    pub arrival_icao: String,
    #[serde(default, rename = "arrivalTerminal")]
    pub arrival_terminal: String,
    #[serde(default, rename = "arrivalTime")]
    pub arrival_time: String,
    #[serde(default, rename = "airlineIata")]
    pub airline_iata: String,
    #[serde(default, rename = "airlineIcao")]
    pub airline_icao: String,
    #[serde(default, rename = "flightNumber")]
    pub flight_number: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codeshares: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AirportResponse {
    #[serde(default, rename = "airportId", deserialize_with = "string_or_number")]
    pub airport_id: Option<String>,
    #[serde(default, rename = "nameAirport")]
    pub name_airport: String,
    #[serde(default, rename = "codeIataAirport")]
    pub code_iata_airport: String,
    #[serde(default, rename = "codeIcaoAirport")]
    pub code_icao_airport: String,
    #[serde(default, rename = "nameTranslations", skip_serializing_if = "Option::is_none")]
    pub name_translations: Option<std::collections::HashMap<String, String>>,
    #[serde(default, rename = "latitudeAirport")]
    pub latitude_airport: f64,
    #[serde(default, rename = "longitudeAirport")]
    pub longitude_airport: f64,
    #[serde(default, rename = "geonameId")]
    pub geoname_id: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default, rename = "GMT")]
    pub gmt: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, rename = "nameCountry")]
    pub name_country: String,
    #[serde(default, rename = "codeIso2Country")]
    pub code_iso2_country: String,
    #[serde(default, rename = "codeIataCity")]
    pub code_iata_city: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AirlineResponse {
    #[serde(default, rename = "airlineId", deserialize_with = "string_or_number")]
    pub airline_id: Option<String>,
    #[serde(default, rename = "nameAirline")]
    pub name_airline: String,
    #[serde(default, rename = "codeIataAirline")]
    pub code_iata_airline: String,
    #[serde(default, rename = "codeIcaoAirline")]
    pub code_icao_airline: String,
    #[serde(default, rename = "callsign")]
    pub call_sign: String,
    #[serde(default, rename = "statusAirline")]
    pub status_airline: String,
    #[serde(default, rename = "type")]
    pub airline_type: String,
    #[serde(default, rename = "sizeAirline", deserialize_with = "string_or_number")]
    pub size_airline: Option<String>,
    #[serde(default, rename = "ageFleet")]
    pub age_fleet: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub founding: Option<String>,
    #[serde(default, rename = "codeHub")]
    pub code_hub: String,
    #[serde(default, rename = "nameCountry")]
    pub name_country: String,
    #[serde(default, rename = "codeIso2Country")]
    pub code_iso2_country: String,
}

/// The provider's error payload. Returned with non-2xx statuses and,
/// occasionally, with HTTP 200 where an array was expected.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl ErrorResponse {
    pub fn is_error(&self) -> bool {
        if self.success == Some(false) {
            return true;
        }
        if let Some(message) = &self.message {
            if !message.is_empty() {
                return true;
            }
        }
        match &self.error {
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Null) | None => false,
            Some(_) => true,
        }
    }

    pub fn error_message(&self) -> String {
        if let Some(message) = &self.message {
            if !message.is_empty() {
                return message.clone();
            }
        }
        match &self.error {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown provider error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_round_trips_through_json() {
        let raw = r#"{
            "type": "departure",
            "status": "scheduled",
            "departure": {"iataCode": "VNO", "scheduledTime": "06:25", "delay": 15},
            "arrival": {"iataCode": "FRA", "scheduledTime": "07:40"},
            "airline": {"name": "Lufthansa", "iataCode": "LH"},
            "flight": {"iataNumber": "LH887"}
        }"#;
        let schedule: ScheduleResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(schedule.schedule_type, "departure");
        assert_eq!(schedule.departure.iata_code, "VNO");
        assert_eq!(schedule.departure.delay.as_deref(), Some("15"));
        assert_eq!(schedule.arrival.scheduled_time, "07:40");
        assert!(schedule.codeshared.is_none());
    }

    #[test]
    fn delay_accepts_strings_and_numbers() {
        let a: Departure = serde_json::from_str(r#"{"delay": "5"}"#).unwrap();
        assert_eq!(a.delay.as_deref(), Some("5"));
        let b: Departure = serde_json::from_str(r#"{"delay": 5}"#).unwrap();
        assert_eq!(b.delay.as_deref(), Some("5"));
        let c: Departure = serde_json::from_str(r#"{"delay": null}"#).unwrap();
        assert_eq!(c.delay, None);
    }

    #[test]
    fn error_response_predicate() {
        let explicit: ErrorResponse =
            serde_json::from_str(r#"{"error": "No Record Found", "success": false}"#).unwrap();
        assert!(explicit.is_error());
        assert_eq!(explicit.error_message(), "No Record Found");

        let message_only: ErrorResponse =
            serde_json::from_str(r#"{"message": "API key expired"}"#).unwrap();
        assert!(message_only.is_error());

        let empty: ErrorResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!empty.is_error());

        // an arbitrary success payload decoded into the error shape must
        // not look like an error
        let benign: ErrorResponse =
            serde_json::from_str(r#"{"somethingElse": [1, 2, 3]}"#).unwrap();
        assert!(!benign.is_error());
    }
}
