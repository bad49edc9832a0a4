// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

/// Query parameters per endpoint. Each struct knows how to render itself
/// into `(name, value)` pairs; empty values are dropped so the URLs stay
/// clean and the provider does not choke on blank selectors.

fn push_pair(pairs: &mut Vec<(&'static str, String)>, name: &'static str, value: &str) {
    if !value.is_empty() {
        pairs.push((name, value.to_string()));
    }
}

/// `flights` endpoint (real-time tracker).
#[derive(Clone, Debug, Default)]
pub struct FlightTrackerParams {
    pub flight_iata: String,
    pub airline_iata: String,
    pub dep_iata: String,
    pub arr_iata: String,
}

impl FlightTrackerParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "flight_iata", &self.flight_iata);
        push_pair(&mut pairs, "airline_iata", &self.airline_iata);
        push_pair(&mut pairs, "dep_iata", &self.dep_iata);
        push_pair(&mut pairs, "arr_iata", &self.arr_iata);
        pairs
    }
}

/// `timetable` endpoint (current schedules).
#[derive(Clone, Debug, Default)]
pub struct FlightSchedulesParams {
    pub iata_code: String,
    pub schedule_type: String,
}

impl FlightSchedulesParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "iataCode", &self.iata_code);
        push_pair(&mut pairs, "type", &self.schedule_type);
        pairs
    }
}

/// `flightsHistory` endpoint. Dates are `YYYY-MM-DD`.
#[derive(Clone, Debug, Default)]
pub struct HistoricalSchedulesParams {
    pub code: String,
    pub schedule_type: String,
    pub date_from: String,
    pub date_to: String,
}

impl HistoricalSchedulesParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "code", &self.code);
        push_pair(&mut pairs, "type", &self.schedule_type);
        push_pair(&mut pairs, "date_from", &self.date_from);
        push_pair(&mut pairs, "date_to", &self.date_to);
        pairs
    }
}

/// `flightsFuture` endpoint. The provider requires the date to be at
/// least a week ahead.
#[derive(Clone, Debug, Default)]
pub struct FutureSchedulesParams {
    pub iata_code: String,
    pub schedule_type: String,
    pub date: String,
    pub flight_num: String,
    pub arr_iata_code: String,
    pub dep_iata_code: String,
}

impl FutureSchedulesParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "iataCode", &self.iata_code);
        push_pair(&mut pairs, "type", &self.schedule_type);
        push_pair(&mut pairs, "date", &self.date);
        push_pair(&mut pairs, "flight_num", &self.flight_num);
        push_pair(&mut pairs, "arr_iataCode", &self.arr_iata_code);
        push_pair(&mut pairs, "dep_iataCode", &self.dep_iata_code);
        pairs
    }
}

/// `routes` endpoint.
#[derive(Clone, Debug, Default)]
pub struct AirlineRoutesParams {
    pub airline_iata: String,
    pub departure_iata: String,
}

impl AirlineRoutesParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "airlineIata", &self.airline_iata);
        push_pair(&mut pairs, "departureIata", &self.departure_iata);
        pairs
    }
}

/// `airportDatabase` endpoint.
#[derive(Clone, Debug, Default)]
pub struct AirportsParams {
    pub code_iata_airport: String,
    pub code_iso2_country: String,
}

impl AirportsParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "codeIataAirport", &self.code_iata_airport);
        push_pair(&mut pairs, "codeIso2Country", &self.code_iso2_country);
        pairs
    }
}

/// `airlineDatabase` endpoint.
#[derive(Clone, Debug, Default)]
pub struct AirlinesParams {
    pub code_iata_airline: String,
    pub code_iso2_country: String,
}

impl AirlinesParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "codeIataAirline", &self.code_iata_airline);
        push_pair(&mut pairs, "codeIso2Country", &self.code_iso2_country);
        pairs
    }
}

/// `autocomplete` endpoint (cities, airports, railway and bus stations).
#[derive(Clone, Debug, Default)]
pub struct AutocompleteParams {
    pub query: String,
}

impl AutocompleteParams {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_pair(&mut pairs, "query", &self.query);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_render_to_nothing() {
        assert!(FutureSchedulesParams::default().to_query_pairs().is_empty());
        assert!(FlightTrackerParams::default().to_query_pairs().is_empty());
    }

    #[test]
    fn future_schedule_pairs_use_provider_names() {
        let params = FutureSchedulesParams {
            iata_code: "VNO".to_string(),
            schedule_type: "departure".to_string(),
            date: "2026-08-20".to_string(),
            ..Default::default()
        };
        assert_eq!(
            params.to_query_pairs(),
            vec![
                ("iataCode", "VNO".to_string()),
                ("type", "departure".to_string()),
                ("date", "2026-08-20".to_string()),
            ]
        );
    }
}
