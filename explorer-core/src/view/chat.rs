use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    model::{ChatMessage, ChatReply, ChatRole},
    remote::ExplorerApi,
};

use super::{require_text, sanitize, vietnam_time};

pub const TITLE: &str = "💬 AI Chatbot";
pub const GREETING: &str = "Xin chào! Tôi có thể giúp gì cho bạn?";
pub const FALLBACK_REPLY: &str = "Xin lỗi, tôi không thể trả lời lúc này. Vui lòng thử lại.";
pub const INPUT_PLACEHOLDER: &str = "Nhập tin nhắn...";

#[derive(Debug)]
pub struct ChatJob {
    api: Arc<dyn ExplorerApi>,
    message: String,
    session_id: String,
}

impl ChatJob {
    pub async fn run(self) -> Option<ChatReply> {
        self.api.chat(&self.message, &self.session_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    /// `HH:MM:SS`, Vietnam local time.
    pub time: String,
}

impl ChatEntry {
    fn new(role: ChatRole, content: &str, at: DateTime<Utc>) -> Self {
        Self {
            role,
            content: sanitize(content),
            time: vietnam_time(at).format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub collapsed: bool,
    pub toggle_label: &'static str,
    /// Greeting first, then the transcript.
    pub entries: Vec<ChatEntry>,
    /// A reply is on its way; render the typing placeholder.
    pub loading: bool,
}

#[derive(Debug)]
pub struct ChatPanel {
    api: Arc<dyn ExplorerApi>,
    session_id: String,
    greeted_at: DateTime<Utc>,
    history: Vec<ChatMessage>,
    pending: bool,
    collapsed: bool,
}

impl ChatPanel {
    pub fn new(api: Arc<dyn ExplorerApi>) -> Self {
        let now = Utc::now();
        Self {
            api,
            session_id: format!("user_{}", now.timestamp_millis()),
            greeted_at: now,
            history: Vec::new(),
            pending: false,
            collapsed: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Append the user's message and hand back the request to make.
    ///
    /// Blank input is ignored, and so is a send while a reply is pending.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatJob> {
        if self.pending {
            return None;
        }
        let message = require_text(input).ok()?.to_string();

        self.push(ChatRole::User, message.clone());
        self.pending = true;

        Some(ChatJob {
            api: Arc::clone(&self.api),
            message,
            session_id: self.session_id.clone(),
        })
    }

    pub fn finish_send(&mut self, reply: Option<ChatReply>) {
        self.pending = false;
        let content = reply
            .map(|r| r.reply)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        self.push(ChatRole::Bot, content);
    }

    pub async fn send(&mut self, input: &str) {
        if let Some(job) = self.begin_send(input) {
            let reply = job.run().await;
            self.finish_send(reply);
        }
    }

    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.greeted_at = Utc::now();
    }

    pub fn view(&self) -> ChatView {
        let greeting = ChatEntry::new(ChatRole::Bot, GREETING, self.greeted_at);
        let entries = std::iter::once(greeting)
            .chain(
                self.history
                    .iter()
                    .map(|m| ChatEntry::new(m.role, &m.content, m.timestamp)),
            )
            .collect();

        ChatView {
            collapsed: self.collapsed,
            toggle_label: if self.collapsed { "+" } else { "−" },
            entries,
            loading: self.pending,
        }
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.history.push(ChatMessage {
            role,
            content,
            timestamp: Utc::now(),
        });
    }
}
