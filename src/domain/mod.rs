// Domain layer: persisted models and the ports the application talks through.

pub mod model;
pub mod ports;
