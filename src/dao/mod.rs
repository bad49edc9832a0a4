// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

pub mod airports_dao;
pub mod airports_meta_dao;
pub mod flight_schedules_dao;
pub mod point_dao;
pub mod travel_dao;

pub use airports_dao::AirportsDao;
pub use airports_meta_dao::AirportsMetaDao;
pub use flight_schedules_dao::FlightSchedulesDao;
pub use point_dao::PointDao;
pub use travel_dao::TravelDao;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("query error: {0}")]
    Query(diesel::result::Error),

    #[error("store deadline exceeded")]
    DeadlineExceeded,

    #[error("no clustered table for width {0}")]
    UnsupportedClusterWidth(i64),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> StoreError {
        // statement_timeout cancellation surfaces as a plain database error;
        // the message is the only stable discriminator tokio-postgres exposes
        if let diesel::result::Error::DatabaseError(_, ref info) = err {
            if info.message().contains("statement timeout") {
                return StoreError::DeadlineExceeded;
            }
        }
        StoreError::Query(err)
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for StoreError {
    fn from(err: bb8::RunError<E>) -> StoreError {
        StoreError::Pool(err.to_string())
    }
}
