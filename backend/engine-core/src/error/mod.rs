pub mod engine;
pub mod proxy;
pub mod settings;

pub use engine::EngineError;
pub use proxy::ProxyError;
pub use settings::SettingsError;
