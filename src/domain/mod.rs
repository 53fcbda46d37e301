// Domain layer: AFIP models and ports (interfaces). No HTTP or filesystem here.

pub mod model;
pub mod ports;
