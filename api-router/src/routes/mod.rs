pub mod download;
pub mod generate;
pub mod liveness;
pub mod readiness;
pub mod status;
