use super::require_text;

pub const PLACEHOLDER: &str = "Nhập tên địa điểm ở Việt Nam (VD: Hà Nội, Đà Lạt, Hội An...)";
pub const BUTTON_LABEL: &str = "🔍 Tìm kiếm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Input(String),
    Click,
    KeyPress(Key),
}

/// One text input plus a submit control.
#[derive(Debug, Clone, Default)]
pub struct SearchBar {
    input: String,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the trimmed query when the event submits non-blank input.
    pub fn handle(&mut self, event: SearchEvent) -> Option<String> {
        match event {
            SearchEvent::Input(text) => {
                self.input = text;
                None
            }
            SearchEvent::Click | SearchEvent::KeyPress(Key::Enter) => self.submit(),
            SearchEvent::KeyPress(Key::Other) => None,
        }
    }

    fn submit(&self) -> Option<String> {
        require_text(&self.input).ok().map(str::to_string)
    }
}
