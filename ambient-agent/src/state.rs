//! Shared orchestrator state (§5 "Shared-resource policy"): configuration
//! is read-only after startup, `last_state` and enhancer stats are guarded
//! by lightweight async locks, exposed read-only to the HTTP layer.

use std::sync::Arc;

use ambient_capture::CaptureSource;
use ambient_core::Config;
use ambient_enhance::Enhancer;
use ambient_llm::{ChatClient, VisionClient};
use ambient_store::MemoryStoreClient;
use tokio::sync::RwLock;

pub struct AppState {
    pub config: Config,
    pub capture: CaptureSource,
    pub vision: VisionClient,
    pub chat: ChatClient,
    pub store: MemoryStoreClient,
    pub enhancer: Enhancer,
    pub last_state: RwLock<Option<String>>,
}

pub type SharedState = Arc<AppState>;
