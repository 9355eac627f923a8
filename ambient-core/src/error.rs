//! Error taxonomy (§7). Each variant corresponds to one failure mode named
//! in the spec; callers are expected to match on these rather than format
//! opaque `anyhow::Error`s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no active displays found")]
    NoDisplay,
    #[error("screen grab failed: {0}")]
    GrabFailed(String),
    #[error("image encode failed: {0}")]
    EncodeFailed(String),
}

/// Network/protocol failures talking to C2 (vision) or C3 (chat). Non-fatal
/// in the capture loop, surfaced as 5xx from the HTTP API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to LLM endpoint failed: {0}")]
    Request(String),
    #[error("LLM endpoint returned non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM response contained no choices")]
    NoChoices,
}

/// Network/protocol failures talking to C4 (memory store). Non-fatal in the
/// capture loop, surfaced as 5xx from the HTTP API.
#[derive(Debug, Error)]
pub enum MemError {
    #[error("request to memory store failed: {0}")]
    Request(String),
    #[error("memory store returned non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("memory store returned an unrecognized response shape: {0}")]
    BadShape(String),
}

/// Hotkey registration failure. Logged as a startup warning; never prevents
/// service startup (§7).
#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("failed to register hotkey {combo}: {reason}")]
    RegistrationFailed { combo: String, reason: String },
    #[error("hotkey handle was already unregistered")]
    AlreadyUnregistered,
}

/// Failures from the other OS capability interfaces (clipboard, key
/// synthesis, overlay). Not part of the spec's named taxonomy — these are
/// plumbing around abstract interfaces the spec leaves unimplemented — but
/// every capability call still needs a typed result instead of panicking.
#[derive(Debug, Error)]
#[error("OS capability call failed: {0}")]
pub struct CapabilityError(pub String);

/// Startup failure: bad config or a failed health check. Fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("startup health check failed for {component}: {source}")]
    HealthCheck {
        component: String,
        #[source]
        source: anyhow::Error,
    },
}
