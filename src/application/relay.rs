//! Conversation composition ahead of the upstream call.
//!
//! The relay always speaks first: one or two fixed system turns go ahead of
//! whatever the caller sent, and callers cannot override or remove them.

use crate::config::AssistantConfig;
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::{CompletionAttempt, CompletionClient, UpstreamError};
use tracing::debug;

const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful study assistant for past papers and \
     subjects. You help students with their academic questions, provide explanations, and guide \
     them through learning materials.";

const CITED_ASSISTANT_INSTRUCTIONS: &str = "You are a helpful study assistant for past papers \
     and subjects. Provide clear, step-by-step answers. When applicable, cite relevant sources \
     from the provided reference list using their URLs as citations. If you don't know, say you \
     don't know. Keep answers concise and useful.";

const REFERENCE_LINKS: [&str; 7] = [
    "https://platform.openai.com/docs/api-reference/chat",
    "https://help.openai.com/en/articles/6643167-how-to-use-the-openai-api-for-q-a-or-to-build-a-chatbot",
    "https://www.leanware.co/insights/integrate-chatgpt-to-web-app",
    "https://www.brihaspatitech.com/blog/build-a-chatbot-using-openai-rag-2025-guide/",
    "https://blog.hubspot.com/website/chatgpt-integration",
    "https://community.openai.com/t/creating-a-chatbot-with-openai-api/721246",
    "https://community.openai.com/t/integrating-data-from-chatgpt-to-a-website-app-via-predefined-prompts/840215",
];

pub struct ChatRelay {
    client: CompletionClient,
    instructions: String,
    cited_instructions: String,
    references: Vec<String>,
}

impl ChatRelay {
    pub fn new(client: CompletionClient, assistant: &AssistantConfig) -> Self {
        Self {
            client,
            instructions: assistant
                .instructions
                .clone()
                .unwrap_or_else(|| ASSISTANT_INSTRUCTIONS.to_string()),
            cited_instructions: assistant
                .cited_instructions
                .clone()
                .unwrap_or_else(|| CITED_ASSISTANT_INSTRUCTIONS.to_string()),
            references: assistant
                .references
                .clone()
                .unwrap_or_else(|| REFERENCE_LINKS.iter().map(|r| r.to_string()).collect()),
        }
    }

    /// Relay a conversation with the plain study-assistant persona.
    pub async fn assist(
        &self,
        turns: Vec<ChatMessage>,
        stream: bool,
    ) -> Result<CompletionAttempt, UpstreamError> {
        let composed = self.compose_plain(turns);
        debug!(turns = composed.len(), stream, "composed plain conversation");
        self.client.complete(&composed, stream).await
    }

    /// Relay a conversation with the citation-aware persona, which also
    /// carries the list of reference URLs the assistant may cite.
    pub async fn assist_with_citations(
        &self,
        turns: Vec<ChatMessage>,
        stream: bool,
    ) -> Result<CompletionAttempt, UpstreamError> {
        let composed = self.compose_cited(turns);
        debug!(turns = composed.len(), stream, "composed cited conversation");
        self.client.complete(&composed, stream).await
    }

    fn compose_plain(&self, turns: Vec<ChatMessage>) -> Vec<ChatMessage> {
        let mut composed = Vec::with_capacity(turns.len() + 1);
        composed.push(ChatMessage::system(self.instructions.clone()));
        composed.extend(turns);
        composed
    }

    fn compose_cited(&self, turns: Vec<ChatMessage>) -> Vec<ChatMessage> {
        let mut composed = Vec::with_capacity(turns.len() + 2);
        composed.push(ChatMessage::system(self.cited_instructions.clone()));
        composed.push(ChatMessage::system(self.reference_block()));
        composed.extend(turns);
        composed
    }

    fn reference_block(&self) -> String {
        let listing = self
            .references
            .iter()
            .enumerate()
            .map(|(index, link)| format!("{}. {}", index + 1, link))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Reference links you may cite when relevant (do not invent links):\n{listing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::domain::types::MessageRole;

    fn relay() -> ChatRelay {
        let client = CompletionClient::new(&UpstreamConfig::default(), "test-key".to_string())
            .expect("client builds");
        ChatRelay::new(client, &AssistantConfig::default())
    }

    #[test]
    fn plain_composition_prepends_one_system_turn() {
        let relay = relay();
        let turns = vec![ChatMessage::user("what is osmosis?")];
        let composed = relay.compose_plain(turns);
        assert_eq!(composed.len(), 2);
        assert_eq!(composed[0].role, MessageRole::System);
        assert_eq!(composed[1].content, "what is osmosis?");
    }

    #[test]
    fn cited_composition_prepends_instructions_then_references() {
        let relay = relay();
        let turns = vec![
            ChatMessage::user("hello"),
            ChatMessage::new(MessageRole::Assistant, "hi"),
            ChatMessage::user("cite something"),
        ];
        let composed = relay.compose_cited(turns);
        assert_eq!(composed.len(), 5);
        assert_eq!(composed[0].role, MessageRole::System);
        assert_eq!(composed[1].role, MessageRole::System);
        assert!(composed[1].content.starts_with("Reference links"));
        assert!(composed[1].content.contains("1. https://"));
        // Caller turns keep their order behind the fixed prefix.
        assert_eq!(composed[2].content, "hello");
        assert_eq!(composed[4].content, "cite something");
    }

    #[test]
    fn config_overrides_replace_the_default_persona() {
        let client = CompletionClient::new(&UpstreamConfig::default(), "test-key".to_string())
            .expect("client builds");
        let assistant = AssistantConfig {
            instructions: Some("You are terse.".to_string()),
            cited_instructions: None,
            references: Some(vec!["https://example.com/syllabus".to_string()]),
        };
        let relay = ChatRelay::new(client, &assistant);
        let composed = relay.compose_plain(vec![ChatMessage::user("q")]);
        assert_eq!(composed[0].content, "You are terse.");
        let cited = relay.compose_cited(vec![ChatMessage::user("q")]);
        assert!(cited[1].content.contains("1. https://example.com/syllabus"));
    }
}
