use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Single chat turn as exchanged with the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Bounded transcript of one conversation, with the persona's system message pinned
#[derive(Debug, Clone)]
pub struct ConversationContext {
    messages: VecDeque<Message>,
    max_messages: usize,
    max_tokens: usize,
    system_message: Option<Message>,
}

impl ConversationContext {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
            max_tokens,
            system_message: None,
        }
    }

    pub fn set_system_message(&mut self, content: impl Into<String>) {
        self.system_message = Some(Message::system(content));
    }

    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_ref().map(|m| m.content.as_str())
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);
        self.trim_context();
    }

    /// All messages for an API call, system message first
    pub fn get_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if let Some(ref system_msg) = self.system_message {
            messages.push(system_msg.clone());
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }

    /// Conversation length (excluding system message)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn estimate_tokens(&self) -> usize {
        self.system_message
            .iter()
            .chain(self.messages.iter())
            .map(Self::estimate_message_tokens)
            .sum()
    }

    // ~4 characters per token plus a little overhead for the role
    fn estimate_message_tokens(message: &Message) -> usize {
        (message.content.len() / 4) + (message.role.len() / 4) + 10
    }

    fn trim_context(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }

        while self.estimate_tokens() > self.max_tokens && !self.messages.is_empty() {
            self.messages.pop_front();
        }
    }

    /// Context summary for debugging
    pub fn summary(&self) -> String {
        format!(
            "Context: {} messages, ~{} tokens (limits: {} messages, {} tokens)",
            self.len(),
            self.estimate_tokens(),
            self.max_messages,
            self.max_tokens
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_addition() {
        let mut context = ConversationContext::new(5, 1000);

        context.set_system_message("You are a barista");
        context.add_user_message("A latte please");
        context.add_assistant_message("What size?");

        assert_eq!(context.len(), 2);

        let messages = context.get_messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_message_trimming() {
        let mut context = ConversationContext::new(3, 10000);

        for i in 0..5 {
            context.add_user_message(format!("Message {}", i));
        }

        assert_eq!(context.len(), 3);
        let messages = context.get_messages();
        assert_eq!(messages.first().unwrap().content, "Message 2");
        assert_eq!(messages.last().unwrap().content, "Message 4");
    }

    #[test]
    fn test_token_trimming_keeps_system_message() {
        let mut context = ConversationContext::new(100, 60);
        context.set_system_message("System");

        for _ in 0..10 {
            context.add_user_message("x".repeat(40));
        }

        assert!(context.len() < 10);
        assert_eq!(context.system_message(), Some("System"));
    }
}
