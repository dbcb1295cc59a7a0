// Domain layer: filesystem model and the port utilities program against.
// Nothing here touches the host directly.

pub mod model;
pub mod ports;
