//! Shared data model, error taxonomy, configuration, and OS capability
//! interfaces for the ambient memory agent.

pub mod capability;
pub mod config;
pub mod error;
pub mod model;

pub use config::{
    AppConfig, CaptureConfig, Config, ConfigRepository, Dialect, ExtensionConfig, LlmConfig,
    MemoryConfig,
};
pub use error::{
    CapabilityError, CaptureError, ConfigError, HotkeyError, LlmError, MemError, StartupError,
};
pub use model::{
    AnalysisResult, Capture, EnhancementResult, EnhancementType, Memory, MemoryMetadata,
    SearchResult,
};
