//! Shared application state for the gateway

use parlor_bus::FanOutBus;

use crate::rooms::RoomRegistry;

/// State shared by every WebSocket session on this instance.
#[derive(Clone)]
pub struct GatewayState {
    /// Local session/room membership.
    pub registry: RoomRegistry,
    /// Publisher side of the fan-out bus.
    pub bus: FanOutBus,
}

impl GatewayState {
    pub fn new(bus: FanOutBus) -> Self {
        Self {
            registry: RoomRegistry::new(),
            bus,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }
}
