use serde::{Deserialize, Serialize};

use super::Status;
use crate::bits::{RELAY_COUNT, pack_control};

/// Desired actuator states sent by the dashboard. Absent fields are `None`.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub relay1: Option<bool>,
    pub relay2: Option<bool>,
    pub relay3: Option<bool>,
    pub relay4: Option<bool>,
    /// LCD backlight
    pub lcd_on: Option<bool>,
}

impl CommandRequest {
    fn relays(&self) -> [Option<bool>; RELAY_COUNT] {
        [self.relay1, self.relay2, self.relay3, self.relay4]
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandState {
    pub relay1: bool,
    pub relay2: bool,
    pub relay3: bool,
    pub relay4: bool,
    /// LCD backlight
    pub lcd_on: bool,
    /// Control byte: relay 1..4 in bit 0..3, LCD in bit 4
    pub packed_byte: u8,
    /// Unix time of the last command update
    pub updated_at: Option<i64>,
}

impl CommandState {
    pub fn new(relays: [bool; RELAY_COUNT], lcd_on: bool) -> Self {
        let [relay1, relay2, relay3, relay4] = relays;

        Self {
            relay1,
            relay2,
            relay3,
            relay4,
            lcd_on,
            packed_byte: pack_control(relays, lcd_on),
            updated_at: None,
        }
    }

    pub fn relays(&self) -> [bool; RELAY_COUNT] {
        [self.relay1, self.relay2, self.relay3, self.relay4]
    }

    /// Applies the fields present in `request`, keeping the others.
    pub fn merge(&self, request: &CommandRequest) -> Self {
        let current = self.relays();
        let mut relays = [false; RELAY_COUNT];
        for (index, requested) in request.relays().into_iter().enumerate() {
            relays[index] = requested.unwrap_or(current[index]);
        }

        Self::new(relays, request.lcd_on.unwrap_or(self.lcd_on))
    }

    /// Builds the state `request` describes, absent fields switched off.
    pub fn replace(request: &CommandRequest) -> Self {
        Self::new(
            request.relays().map(|relay| relay.unwrap_or(false)),
            request.lcd_on.unwrap_or(false),
        )
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub status: Status,
    /// Control byte after the update
    pub packed_byte: u8,
}
