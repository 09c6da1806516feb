//! Measurement components: frame-interval estimator, decode counter, refresh
//! rate counter and their telemetry.

pub mod decode;
pub mod estimator;
pub mod refresh;
pub mod telemetry;
