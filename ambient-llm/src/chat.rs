//! Chat client (C3, §4.3): answers a prompt strictly from supplied memory
//! contexts.

use ambient_core::error::LlmError;
use ambient_core::LlmConfig;
use serde_json::json;

use crate::client::OpenAiCompatibleClient;

const SYSTEM_PROMPT: &str = "Answer the user's question using only the memory context provided \
below. If the answer is not contained in that context, say you don't know from the available \
history. Do not invent information.";

pub struct ChatClient {
    client: OpenAiCompatibleClient,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: OpenAiCompatibleClient::for_chat(config),
        }
    }

    /// §4.3 "Behavior": one bulleted line per memory, followed by the
    /// question and a reminder to answer from history alone.
    pub async fn generate(
        &self,
        prompt: &str,
        memory_contexts: &[String],
    ) -> Result<String, LlmError> {
        let mut user_message = String::new();
        for memory in memory_contexts {
            user_message.push_str("- ");
            user_message.push_str(memory);
            user_message.push('\n');
        }
        user_message.push_str(&format!("User question: {prompt}\n"));
        user_message.push_str("Answer using only the memory history above.");

        let messages = vec![
            json!({"role": "system", "content": SYSTEM_PROMPT}),
            json!({"role": "user", "content": user_message}),
        ];

        self.client.chat_completion(messages).await
    }
}
