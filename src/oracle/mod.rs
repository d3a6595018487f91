mod client;
mod error;
mod types;

pub use client::{OverpassOracle, UsgsOracle};
pub use error::OracleError;
pub use types::{Overpass, SatelliteFamily};
