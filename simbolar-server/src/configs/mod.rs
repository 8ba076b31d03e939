mod settings;

pub use settings::{Commands, Logger, Server, Settings, Tank};
