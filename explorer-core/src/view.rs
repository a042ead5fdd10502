//! Toolkit-agnostic view models for every panel of the explorer.
//!
//! Each panel owns its state, exposes update methods, and hands out a typed
//! snapshot through `view()`. Front-ends render the snapshots; no panel reads
//! another panel's state.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::ValidationError;

pub mod auth;
pub mod chat;
pub mod map;
pub mod poi_list;
pub mod search;
pub mod translate;
pub mod weather;

pub use auth::{AuthPanel, AuthView};
pub use chat::{ChatPanel, ChatView};
pub use map::MapView;
pub use poi_list::{PoiCard, PoiList, PoiListView};
pub use search::{SearchBar, SearchEvent};
pub use translate::{TranslateMode, TranslatePanel};
pub use weather::{WeatherPanel, WeatherView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "ℹ️",
            NoticeLevel::Warning => "⚠️",
            NoticeLevel::Error => "❌",
        }
    }
}

/// A message the user has to acknowledge (modal alert in a browser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Inline status line states, each with its own style class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    None,
    Loading,
    Success,
    Error,
    Warning,
}

impl StatusKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            StatusKind::None => "",
            StatusKind::Loading => "loading",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
            StatusKind::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Trimmed input, or [`ValidationError::Blank`].
pub fn require_text(input: &str) -> Result<&str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Blank)
    } else {
        Ok(trimmed)
    }
}

/// Strip control characters so remote or user text cannot smuggle escape
/// sequences into the rendered output. Newlines and tabs survive.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

/// Vietnam is UTC+7 all year.
pub fn vietnam_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    match FixedOffset::east_opt(7 * 3600) {
        Some(offset) => at.with_timezone(&offset),
        None => at.fixed_offset(),
    }
}
