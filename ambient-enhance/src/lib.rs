//! Enhancer (C5, §4.5): turns a prompt plus retrieved memories into a
//! prompt with injected context, gated by match confidence.

use ambient_core::error::MemError;
use ambient_core::{EnhancementResult, EnhancementType, SearchResult};
use ambient_store::MemoryStoreClient;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

const HIGH_SCORE_THRESHOLD: f64 = 0.85;
const CONTEXTUAL_HIGH_CAP: usize = 3;
const CONTEXTUAL_CTX_CAP: usize = 2;
const DETAILED_CAP: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct EnhancerStats {
    pub enhancements_made: u64,
    pub last_enhancement: Option<DateTime<Utc>>,
}

/// Per-process counters reported by C7's `/api/status` (§4.5 "Stats").
#[derive(Default)]
pub struct Enhancer {
    stats: RwLock<EnhancerStats>,
}

impl Enhancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stats(&self) -> EnhancerStats {
        self.stats.read().await.clone()
    }

    /// §4.5 "Algorithm": search, gate by score, build the type-specific
    /// appendix. Never degrades empty memory into a fake success; a backend
    /// failure propagates as `Err` so the HTTP layer can surface it as a
    /// 500 (§4.7). `page_context` is part of the contract for callers that
    /// have it available but, per §4.5, the retrieval query is the prompt
    /// alone.
    pub async fn enhance(
        &self,
        store: &MemoryStoreClient,
        prompt: &str,
        _page_context: Option<&str>,
        max_memories: usize,
    ) -> Result<EnhancementResult, MemError> {
        let results = store.search(prompt, max_memories).await?;

        let result = build_result(prompt, &results);

        let mut stats = self.stats.write().await;
        stats.enhancements_made += 1;
        stats.last_enhancement = Some(Utc::now());

        Ok(result)
    }
}

fn build_result(prompt: &str, results: &[SearchResult]) -> EnhancementResult {
    if results.is_empty() {
        return EnhancementResult {
            original_prompt: prompt.to_string(),
            enhanced_prompt: prompt.to_string(),
            memories_used: Vec::new(),
            enhancement_type: EnhancementType::None,
        };
    }

    let high: Vec<&SearchResult> = results
        .iter()
        .filter(|r| r.score > HIGH_SCORE_THRESHOLD)
        .collect();
    let ctx: Vec<&SearchResult> = results
        .iter()
        .filter(|r| r.score <= HIGH_SCORE_THRESHOLD)
        .collect();

    let enhancement_type = classify(high.len(), ctx.len());
    let enhanced_prompt = match enhancement_type {
        EnhancementType::Contextual => append_contextual(prompt, &high, &ctx),
        EnhancementType::Detailed => append_detailed(prompt, results),
        EnhancementType::Minimal => append_minimal(prompt, results),
        EnhancementType::None => prompt.to_string(),
    };

    EnhancementResult {
        original_prompt: prompt.to_string(),
        enhanced_prompt,
        memories_used: results.iter().map(|r| r.memory.content.clone()).collect(),
        enhancement_type,
    }
}

/// §4.5 step 4.
fn classify(high_len: usize, ctx_len: usize) -> EnhancementType {
    if high_len >= 2 {
        EnhancementType::Contextual
    } else if high_len == 1 && ctx_len >= 2 {
        EnhancementType::Detailed
    } else if high_len == 0 && ctx_len >= 1 {
        EnhancementType::Minimal
    } else {
        EnhancementType::Contextual
    }
}

fn append_contextual(prompt: &str, high: &[&SearchResult], ctx: &[&SearchResult]) -> String {
    let mut out = prompt.to_string();
    out.push_str("\n\n[Context from previous sessions]\n");
    for entry in high.iter().take(CONTEXTUAL_HIGH_CAP) {
        out.push_str("- ");
        out.push_str(&entry.memory.content);
        out.push('\n');
    }
    if !ctx.is_empty() {
        out.push_str("\nAdditional context:\n");
        for entry in ctx.iter().take(CONTEXTUAL_CTX_CAP) {
            out.push_str("- ");
            out.push_str(&entry.memory.content);
            out.push('\n');
        }
    }
    out
}

fn append_detailed(prompt: &str, results: &[SearchResult]) -> String {
    let mut out = prompt.to_string();
    out.push_str("\n\n[Relevant background]\n");
    for entry in results.iter().take(DETAILED_CAP) {
        out.push_str("- ");
        out.push_str(&entry.memory.content);
        out.push('\n');
    }
    out
}

fn append_minimal(prompt: &str, results: &[SearchResult]) -> String {
    let first = &results[0].memory.content;
    if results.len() > 1 {
        format!("{prompt}\n\n[Note: Consider previous context: {first} and related activities]")
    } else {
        format!("{prompt}\n\n[Note: Consider previous context: {first}]")
    }
}
