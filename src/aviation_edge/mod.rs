// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

pub mod consumers;
pub mod error_logger;
pub mod models;
pub mod params;

use self::error_logger::log_unexpected_response;
use self::models::{
    AirlineResponse, AirportResponse, ErrorResponse, FlightTrackerResponse, RouteResponse,
    ScheduleResponse,
};
use self::params::{
    AirlineRoutesParams, AirlinesParams, AirportsParams, AutocompleteParams, FlightSchedulesParams,
    FlightTrackerParams, FutureSchedulesParams, HistoricalSchedulesParams,
};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const BASE_URL: &str = "https://aviation-edge.com/v2/public";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SNIPPET_LEN: usize = 100;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider body unreadable: {0}")]
    BodyUnreadable(String),

    #[error("provider error (status={status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider unexpected JSON (status={status}, log={})", .log_path.display())]
    UnexpectedJson { status: u16, log_path: PathBuf },

    #[error("provider non-JSON (status={status}, snippet={snippet:?}, log={})", .log_path.display())]
    NonJson {
        status: u16,
        snippet: String,
        log_path: PathBuf,
    },
}

/// Single-base-URL client for the Aviation Edge REST API.
pub struct AviationEdgeClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl AviationEdgeClient {
    pub fn new(api_key: impl Into<String>) -> AviationEdgeClient {
        AviationEdgeClient::with_base_url(api_key, BASE_URL)
    }

    /// Base URL override for tests and mirrors.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> AviationEdgeClient {
        AviationEdgeClient {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to construct http client"),
        }
    }

    /// Composes the endpoint URL, always injecting the API key and
    /// dropping empty parameters.
    fn build_url(&self, endpoint: &str, pairs: &[(&'static str, String)]) -> String {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))
            .expect("provider base url must parse");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.api_key);
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }
        url.to_string()
    }

    async fn do_request(&self, url: &str, endpoint: &str) -> Result<(u16, Vec<u8>), ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::BodyUnreadable(e.to_string()))?;

        if status != 200 {
            return Err(classify_error_body(&body, status, endpoint));
        }

        Ok((status, body.to_vec()))
    }

    async fn get_array<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        pairs: Vec<(&'static str, String)>,
    ) -> Result<Vec<T>, ClientError> {
        let url = self.build_url(endpoint, &pairs);
        let (status, body) = self.do_request(&url, endpoint).await?;
        decode_array_body(&body, status, endpoint)
    }

    /// Real-time flight positions (`flights`).
    pub async fn get_flight_tracker(
        &self,
        params: FlightTrackerParams,
    ) -> Result<Vec<FlightTrackerResponse>, ClientError> {
        self.get_array("flights", params.to_query_pairs()).await
    }

    /// Current timetable of an airport (`timetable`).
    pub async fn get_flight_schedules(
        &self,
        params: FlightSchedulesParams,
    ) -> Result<Vec<ScheduleResponse>, ClientError> {
        self.get_array("timetable", params.to_query_pairs()).await
    }

    pub async fn get_airport_schedule(
        &self,
        airport_iata: &str,
    ) -> Result<Vec<ScheduleResponse>, ClientError> {
        self.get_flight_schedules(FlightSchedulesParams {
            iata_code: airport_iata.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Past schedules (`flightsHistory`).
    pub async fn get_historical_schedules(
        &self,
        params: HistoricalSchedulesParams,
    ) -> Result<Vec<ScheduleResponse>, ClientError> {
        self.get_array("flightsHistory", params.to_query_pairs())
            .await
    }

    /// Future schedules (`flightsFuture`); the ingestion pipeline's
    /// workhorse.
    pub async fn get_future_schedules(
        &self,
        params: FutureSchedulesParams,
    ) -> Result<Vec<ScheduleResponse>, ClientError> {
        self.get_array("flightsFuture", params.to_query_pairs())
            .await
    }

    /// Route database (`routes`).
    pub async fn get_airline_routes(
        &self,
        params: AirlineRoutesParams,
    ) -> Result<Vec<RouteResponse>, ClientError> {
        self.get_array("routes", params.to_query_pairs()).await
    }

    /// Airport database (`airportDatabase`).
    pub async fn get_airports(
        &self,
        params: AirportsParams,
    ) -> Result<Vec<AirportResponse>, ClientError> {
        self.get_array("airportDatabase", params.to_query_pairs())
            .await
    }

    pub async fn get_airports_by_country(
        &self,
        country_iso2: &str,
    ) -> Result<Vec<AirportResponse>, ClientError> {
        self.get_airports(AirportsParams {
            code_iso2_country: country_iso2.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Airline database (`airlineDatabase`).
    pub async fn get_airlines(
        &self,
        params: AirlinesParams,
    ) -> Result<Vec<AirlineResponse>, ClientError> {
        self.get_array("airlineDatabase", params.to_query_pairs())
            .await
    }

    /// Free-text lookup over cities, airports, railway and bus stations
    /// (`autocomplete`). The response mixes several entity shapes, so the
    /// raw body is handed back.
    pub async fn get_autocomplete(
        &self,
        params: AutocompleteParams,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.build_url("autocomplete", &params.to_query_pairs());
        let (_, body) = self.do_request(&url, "autocomplete").await?;
        Ok(body)
    }
}

/// Decodes an expected-array payload with the three-step fallback: typed
/// array, then the provider's error shape, then a generic JSON object.
/// The provider occasionally answers HTTP 200 with a single error object
/// where an array was expected, so this runs even on success statuses.
fn decode_array_body<T: DeserializeOwned>(
    body: &[u8],
    status: u16,
    endpoint: &str,
) -> Result<Vec<T>, ClientError> {
    match serde_json::from_slice::<Vec<T>>(body) {
        Ok(items) => Ok(items),
        Err(_) => Err(classify_error_body(body, status, endpoint)),
    }
}

/// Distinguishes a structured provider error from an unexpected-but-valid
/// JSON payload and from a body that is not JSON at all. The latter two
/// are persisted for diagnosis.
fn classify_error_body(body: &[u8], status: u16, endpoint: &str) -> ClientError {
    if let Ok(api_error) = serde_json::from_slice::<ErrorResponse>(body) {
        if api_error.is_error() {
            return ClientError::Api {
                status,
                message: api_error.error_message(),
            };
        }
    }

    if let Ok(serde_json::Value::Object(_)) = serde_json::from_slice::<serde_json::Value>(body) {
        let log_path = log_unexpected_response(body, status, endpoint);
        return ClientError::UnexpectedJson { status, log_path };
    }

    let log_path = log_unexpected_response(body, status, endpoint);
    let text = String::from_utf8_lossy(body);
    let snippet = if text.chars().count() > SNIPPET_LEN {
        let truncated: String = text.chars().take(SNIPPET_LEN).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    };

    ClientError::NonJson {
        status,
        snippet,
        log_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_contains_key_and_skips_empty_params() {
        let client = AviationEdgeClient::new("secret123");
        let url = client.build_url(
            "flightsFuture",
            &FutureSchedulesParams {
                iata_code: "VNO".to_string(),
                schedule_type: "departure".to_string(),
                date: "2026-08-20".to_string(),
                ..Default::default()
            }
            .to_query_pairs(),
        );
        assert!(url.starts_with("https://aviation-edge.com/v2/public/flightsFuture?"));
        assert!(url.contains("key=secret123"));
        assert!(url.contains("iataCode=VNO"));
        assert!(url.contains("type=departure"));
        assert!(url.contains("date=2026-08-20"));
        assert!(!url.contains("flight_num"));
        assert!(!url.contains("dep_iataCode"));
    }

    #[test]
    fn decodes_typed_arrays() {
        let body = br#"[{"type": "departure", "status": "scheduled"}]"#;
        let items: Vec<ScheduleResponse> = decode_array_body(body, 200, "timetable").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].schedule_type, "departure");
    }

    #[test]
    fn empty_array_is_a_valid_response() {
        let items: Vec<ScheduleResponse> = decode_array_body(b"[]", 200, "timetable").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn error_object_on_http_200_is_still_an_error() {
        let body = br#"{"error": "No Record Found", "success": false}"#;
        let result: Result<Vec<ScheduleResponse>, _> = decode_array_body(body, 200, "timetable");
        match result {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "No Record Found");
            }
            other => panic!("expected Api error, got {:?}", other.err()),
        }
    }

    #[test]
    fn unexpected_json_object_is_logged() {
        let body = br#"{"data": {"everything": 42}}"#;
        let result: Result<Vec<ScheduleResponse>, _> =
            decode_array_body(body, 502, "flightsFuture");
        match result {
            Err(ClientError::UnexpectedJson { status, log_path }) => {
                assert_eq!(status, 502);
                assert!(log_path.to_string_lossy().contains("status502"));
                let _ = std::fs::remove_file(log_path);
            }
            other => panic!("expected UnexpectedJson, got {:?}", other.err()),
        }
    }

    #[test]
    fn html_body_reports_snippet() {
        let body = b"<html><body>504 Gateway Timeout</body></html>";
        let result: Result<Vec<ScheduleResponse>, _> = decode_array_body(body, 504, "timetable");
        match result {
            Err(ClientError::NonJson {
                status,
                snippet,
                log_path,
            }) => {
                assert_eq!(status, 504);
                assert!(snippet.contains("504 Gateway Timeout"));
                let _ = std::fs::remove_file(log_path);
            }
            other => panic!("expected NonJson, got {:?}", other.err()),
        }
    }

    #[test]
    fn long_non_json_bodies_are_truncated() {
        let body = "x".repeat(500);
        let result: Result<Vec<ScheduleResponse>, _> =
            decode_array_body(body.as_bytes(), 500, "timetable");
        match result {
            Err(ClientError::NonJson { snippet, log_path, .. }) => {
                assert_eq!(snippet.len(), SNIPPET_LEN + 3);
                assert!(snippet.ends_with("..."));
                let _ = std::fs::remove_file(log_path);
            }
            other => panic!("expected NonJson, got {:?}", other.err()),
        }
    }
}
