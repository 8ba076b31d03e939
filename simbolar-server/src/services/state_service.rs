use simbolar_api::models::{CombinedState, CommandState, SensorState};
use tokio::sync::{RwLock, broadcast};

const EVENT_CAPACITY: usize = 16;

/// Owner of the process-wide sensor and command records.
///
/// Each record sits behind its own lock and is only ever replaced as a whole,
/// so readers see either the previous or the next record, never a mix. Guards
/// are never held across an await point and never held together.
pub struct StateStore {
    sensors: RwLock<SensorState>,
    commands: RwLock<CommandState>,
    sender: broadcast::Sender<CombinedState>,
}

impl StateStore {
    pub fn new(sensors: SensorState, commands: CommandState) -> Self {
        let (sender, _receiver) = broadcast::channel(EVENT_CAPACITY);

        Self {
            sensors: RwLock::new(sensors),
            commands: RwLock::new(commands),
            sender,
        }
    }

    pub async fn sensors(&self) -> SensorState {
        self.sensors.read().await.clone()
    }

    pub async fn commands(&self) -> CommandState {
        self.commands.read().await.clone()
    }

    pub async fn packed_byte(&self) -> u8 {
        self.commands.read().await.packed_byte
    }

    pub async fn snapshot(&self) -> CombinedState {
        CombinedState {
            sensors: self.sensors().await,
            commands: self.commands().await,
        }
    }

    /// Receives a snapshot after every applied change.
    pub fn subscribe(&self) -> broadcast::Receiver<CombinedState> {
        self.sender.subscribe()
    }

    /// Replaces the sensor record with the one `update` derives from it.
    ///
    /// `update` runs under the write guard. Returning `None` as the record
    /// leaves it untouched; an error leaves it untouched as well.
    pub async fn update_sensors<T, E, F>(&self, update: F) -> Result<T, E>
    where
        F: FnOnce(&SensorState) -> Result<(Option<SensorState>, T), E>,
    {
        let (changed, output) = {
            let mut sensors = self.sensors.write().await;
            let (next, output) = update(&*sensors)?;
            let changed = next.is_some();
            if let Some(next) = next {
                *sensors = next;
            }
            (changed, output)
        };

        if changed {
            self.publish().await;
        }

        Ok(output)
    }

    /// Replaces the command record with the one `update` derives from it.
    pub async fn update_commands<F>(&self, update: F) -> CommandState
    where
        F: FnOnce(&CommandState) -> CommandState,
    {
        let next = {
            let mut commands = self.commands.write().await;
            let next = update(&*commands);
            *commands = next.clone();
            next
        };

        self.publish().await;

        next
    }

    async fn publish(&self) {
        if self.sender.receiver_count() == 0 {
            return;
        }

        // A send only fails when the last receiver went away meanwhile
        let _ = self.sender.send(self.snapshot().await);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(SensorState::default(), CommandState::default())
    }
}
