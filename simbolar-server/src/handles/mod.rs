mod command_handle;
mod legacy_handle;
mod sensor_handle;
mod system_handle;

pub use command_handle::*;
pub use legacy_handle::*;
pub use sensor_handle::*;
pub use system_handle::*;
