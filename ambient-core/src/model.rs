//! Wire/domain types shared by every crate in the workspace (§3 of the spec).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One screenshot event. Transient: created by capture, consumed once by the
/// orchestrator, never persisted.
#[derive(Debug, Clone)]
pub struct Capture {
    pub captured_at: DateTime<Utc>,
    /// 0 = primary display.
    pub display_index: u32,
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Structured output of the vision client (C2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub summary: String,
    pub context: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub key_elements: Vec<String>,
    pub user_intent: String,
}

impl AnalysisResult {
    pub const UNKNOWN_CONTEXT: &'static str = "unknown";

    /// The fallback used when the vision model's reply does not parse as the
    /// expected JSON shape (§4.2 "Parsing").
    pub fn from_raw_text(raw: &str) -> Self {
        const MAX_LEN: usize = 500;
        let summary = if raw.chars().count() > MAX_LEN {
            let truncated: String = raw.chars().take(MAX_LEN).collect();
            format!("{truncated}...")
        } else {
            raw.to_string()
        };

        Self {
            summary,
            context: Self::UNKNOWN_CONTEXT.to_string(),
            activities: Vec::new(),
            key_elements: Vec::new(),
            user_intent: Self::UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// The `"{summary} | Context: {context} | Intent: {user_intent}"` form
    /// stored as a Memory's content (§4.6 step 3).
    pub fn to_memory_content(&self) -> String {
        format!(
            "{} | Context: {} | Intent: {}",
            self.summary, self.context, self.user_intent
        )
    }
}

/// Metadata attached to every stored Memory (§3 "Metadata").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub key_elements: Vec<String>,
    pub user_intent: String,
    pub display_num: u32,
}

/// One persisted unit in the external vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub metadata: MemoryMetadata,
    pub created_at: DateTime<Utc>,
}

/// A Memory plus its relevance to a particular query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: Memory,
    /// Higher is more relevant, >= 0.
    pub score: f64,
    /// Lower is closer, >= 0.
    pub distance: f64,
}

/// §4.5 step 4 classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementType {
    None,
    Contextual,
    Detailed,
    Minimal,
}

/// Output of the enhancer (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementResult {
    pub original_prompt: String,
    pub enhanced_prompt: String,
    /// Content of every SearchResult that fed the retrieval, highest-score first.
    pub memories_used: Vec<String>,
    pub enhancement_type: EnhancementType,
}
