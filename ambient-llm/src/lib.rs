//! Vision (C2) and chat (C3) clients against an OpenAI-compatible
//! chat-completions endpoint.

mod chat;
mod client;
mod vision;

pub use chat::ChatClient;
pub use client::OpenAiCompatibleClient;
pub use vision::VisionClient;
