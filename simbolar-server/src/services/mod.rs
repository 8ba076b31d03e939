mod command_service;
mod state_service;
mod telemetry_service;

pub use command_service::*;
pub use state_service::*;
pub use telemetry_service::*;
