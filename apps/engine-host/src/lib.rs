// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod logger;
pub mod status;


/// Settings directory name under the platform config directory.
pub const APP_NAME: &str = "engine-host";

/// Port used when the settings file names neither a port nor a pipe path.
pub const DEFAULT_PORT: u16 = 3000;
