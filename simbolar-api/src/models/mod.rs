mod command;
mod sensor;

pub use command::*;
pub use sensor::*;

use serde::{Deserialize, Serialize};

/// Acknowledgement carried by every write response.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Write applied
    Ok,
    /// Reading dropped by the delta filter, retry on the next cycle
    IgnoredByDelta,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedState {
    /// Last derived sensor state
    pub sensors: SensorState,
    /// Last requested actuator state
    pub commands: CommandState,
}
