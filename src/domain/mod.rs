// Domain layer: boot models and ports. Adapters implement the ports; the core only sees traits.

pub mod model;
pub mod ports;
