use std::sync::Arc;

use simbolar_api::models::{CommandRequest, CommandResponse, CommandState, Status};
use time::OffsetDateTime;

use super::StateStore;

/// How a command request combines with the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Absent fields keep their stored value
    Merge,
    /// Absent fields are switched off
    Replace,
}

/// Reconciler side of the relay: keeps the packed control byte in step with
/// the actuator flags requested by the dashboard.
pub struct CommandService {
    store: Arc<StateStore>,
}

impl CommandService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub async fn set(&self, request: &CommandRequest, mode: UpdateMode) -> CommandResponse {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let next = self
            .store
            .update_commands(|current| {
                let next = match mode {
                    UpdateMode::Merge => current.merge(request),
                    UpdateMode::Replace => CommandState::replace(request),
                };

                CommandState {
                    updated_at: Some(now),
                    ..next
                }
            })
            .await;

        tracing::info!(
            packed_byte = next.packed_byte,
            ?mode,
            "commands updated: relays {:?}, lcd {}",
            next.relays(),
            next.lcd_on
        );

        CommandResponse {
            status: Status::Ok,
            packed_byte: next.packed_byte,
        }
    }

    pub async fn get(&self) -> CommandState {
        self.store.commands().await
    }
}
