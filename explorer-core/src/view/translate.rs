use std::sync::Arc;

use crate::{
    lang,
    model::{Language, TranslationResult},
    remote::ExplorerApi,
};

use super::{Status, StatusKind, require_text, sanitize};

pub const TITLE: &str = "🌐 Dịch Thuật";
pub const BLANK_INPUT: &str = "⚠️ Vui lòng nhập văn bản cần dịch";
pub const IN_FLIGHT: &str = "⏳ Đang dịch...";
pub const FAILED: &str = "❌ Không thể dịch văn bản. Vui lòng thử lại.";

/// Translation direction. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslateMode {
    #[default]
    EnToVi,
    ViToEn,
}

impl TranslateMode {
    pub fn languages(&self) -> (Language, Language) {
        match self {
            TranslateMode::EnToVi => (Language::English, Language::Vietnamese),
            TranslateMode::ViToEn => (Language::Vietnamese, Language::English),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TranslateMode::EnToVi => "Anh → Việt",
            TranslateMode::ViToEn => "Việt → Anh",
        }
    }

    /// Vietnamese text goes to English, anything else to Vietnamese.
    pub fn detect(text: &str) -> Self {
        match lang::detect_direction(text) {
            (Language::Vietnamese, _) => TranslateMode::ViToEn,
            _ => TranslateMode::EnToVi,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TranslateMode::EnToVi => TranslateMode::ViToEn,
            TranslateMode::ViToEn => TranslateMode::EnToVi,
        }
    }
}

/// A translation request detached from the panel, so the panel is not
/// borrowed while the request is in flight.
#[derive(Debug)]
pub struct TranslateJob {
    api: Arc<dyn ExplorerApi>,
    text: String,
    source: Language,
    target: Language,
}

impl TranslateJob {
    pub async fn run(self) -> Option<TranslationResult> {
        self.api.translate(&self.text, self.source, self.target).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateView<'a> {
    pub mode: TranslateMode,
    pub source_text: &'a str,
    pub target_text: &'a str,
    pub status: &'a Status,
    pub busy: bool,
}

#[derive(Debug)]
pub struct TranslatePanel {
    api: Arc<dyn ExplorerApi>,
    mode: TranslateMode,
    source_text: String,
    target_text: String,
    in_flight: bool,
    status: Status,
}

impl TranslatePanel {
    pub fn new(api: Arc<dyn ExplorerApi>) -> Self {
        Self {
            api,
            mode: TranslateMode::default(),
            source_text: String::new(),
            target_text: String::new(),
            in_flight: false,
            status: Status::default(),
        }
    }

    pub fn mode(&self) -> TranslateMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TranslateMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn set_source(&mut self, text: impl Into<String>) {
        self.source_text = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Validate the input and mark the panel busy.
    ///
    /// Returns `None` while another translation is in flight, or after
    /// posting a warning for blank input.
    pub fn begin(&mut self) -> Option<TranslateJob> {
        if self.in_flight {
            return None;
        }

        let text = match require_text(&self.source_text) {
            Ok(text) => text.to_string(),
            Err(_) => {
                self.status = Status::new(StatusKind::Warning, BLANK_INPUT);
                return None;
            }
        };

        let (source, target) = self.mode.languages();
        self.in_flight = true;
        self.status = Status::new(StatusKind::Loading, IN_FLIGHT);

        Some(TranslateJob {
            api: Arc::clone(&self.api),
            text,
            source,
            target,
        })
    }

    pub fn finish(&mut self, result: Option<TranslationResult>) {
        self.in_flight = false;
        self.status = match result {
            Some(result) => {
                self.target_text = sanitize(&result.translated_text);
                Status::new(
                    StatusKind::Success,
                    format!(
                        "✅ Đã dịch từ {} sang {}",
                        language_name(&result.source_language),
                        language_name(&result.target_language)
                    ),
                )
            }
            None => Status::new(StatusKind::Error, FAILED),
        };
    }

    pub async fn translate(&mut self) {
        if let Some(job) = self.begin() {
            let result = job.run().await;
            self.finish(result);
        }
    }

    /// Switch to the direction the source text suggests, then translate.
    pub async fn auto_translate(&mut self) {
        if !self.in_flight {
            self.mode = TranslateMode::detect(&self.source_text);
        }
        self.translate().await;
    }

    pub fn clear(&mut self) {
        self.source_text.clear();
        self.target_text.clear();
        self.status = Status::default();
    }

    pub fn view(&self) -> TranslateView<'_> {
        TranslateView {
            mode: self.mode,
            source_text: &self.source_text,
            target_text: &self.target_text,
            status: &self.status,
            busy: self.in_flight,
        }
    }
}

fn language_name(code: &str) -> String {
    Language::display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| sanitize(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeApi};

    fn panel_with(translated: Option<&str>) -> (Arc<FakeApi>, TranslatePanel) {
        let api = Arc::new(FakeApi {
            translated: translated.map(str::to_string),
            ..FakeApi::default()
        });
        let panel = TranslatePanel::new(api.clone());
        (api, panel)
    }

    #[tokio::test]
    async fn translates_in_the_selected_direction() {
        let (api, mut panel) = panel_with(Some("Xin chào"));
        panel.set_source("  Hello ");

        panel.translate().await;

        let view = panel.view();
        assert_eq!(view.target_text, "Xin chào");
        assert_eq!(view.status.kind, StatusKind::Success);
        assert_eq!(view.status.message, "✅ Đã dịch từ Tiếng Anh sang Tiếng Việt");
        assert!(!view.busy);
        assert_eq!(
            api.calls(),
            vec![Call::Translate(
                "Hello".into(),
                Language::English,
                Language::Vietnamese
            )]
        );
    }

    #[tokio::test]
    async fn toggled_mode_translates_vietnamese_to_english() {
        let (api, mut panel) = panel_with(Some("Hello"));
        panel.toggle_mode();
        panel.set_source("Xin chào");

        panel.translate().await;

        assert_eq!(panel.mode(), TranslateMode::ViToEn);
        assert_eq!(api.translations(), vec![(Language::Vietnamese, Language::English)]);
        assert_eq!(
            panel.view().status.message,
            "✅ Đã dịch từ Tiếng Việt sang Tiếng Anh"
        );
    }

    #[tokio::test]
    async fn auto_translate_follows_the_source_language() {
        let (api, mut panel) = panel_with(Some("Hello"));
        panel.set_source("Xin chào");

        panel.auto_translate().await;

        let view = panel.view();
        assert_eq!(view.mode, TranslateMode::ViToEn);
        assert_eq!(view.mode.label(), "Việt → Anh");
        assert_eq!(view.status.message, "✅ Đã dịch từ Tiếng Việt sang Tiếng Anh");
        assert_eq!(api.translations(), vec![(Language::Vietnamese, Language::English)]);

        panel.set_source("Good morning");
        panel.auto_translate().await;
        assert_eq!(panel.mode(), TranslateMode::EnToVi);
    }

    #[tokio::test]
    async fn blank_input_warns_without_calling() {
        let (api, mut panel) = panel_with(Some("unused"));
        panel.set_source("   ");

        panel.translate().await;

        assert_eq!(panel.view().status.kind, StatusKind::Warning);
        assert_eq!(panel.view().status.message, BLANK_INPUT);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failure_sets_error_status() {
        let (_, mut panel) = panel_with(None);
        panel.set_source("Hello");

        panel.translate().await;

        assert_eq!(panel.view().status.kind, StatusKind::Error);
        assert_eq!(panel.view().status.message, FAILED);
        assert_eq!(panel.view().target_text, "");
    }

    #[test]
    fn second_begin_is_refused_while_in_flight() {
        let (_, mut panel) = panel_with(Some("x"));
        panel.set_source("Hello");

        let first = panel.begin();
        assert!(first.is_some());
        assert!(panel.is_busy());
        assert_eq!(panel.view().status.kind, StatusKind::Loading);
        assert_eq!(panel.view().status.message, "⏳ Đang dịch...");

        assert!(panel.begin().is_none());

        panel.finish(None);
        assert!(panel.begin().is_some());
    }

    #[test]
    fn unknown_language_codes_are_shown_verbatim() {
        let (_, mut panel) = panel_with(None);
        panel.set_source("Bonjour");
        let _job = panel.begin();

        panel.finish(Some(TranslationResult {
            original_text: "Bonjour".into(),
            translated_text: "Xin chào".into(),
            source_language: "fr".into(),
            target_language: "vi".into(),
        }));

        assert_eq!(panel.view().status.message, "✅ Đã dịch từ fr sang Tiếng Việt");
    }

    #[test]
    fn clear_empties_boxes_and_status() {
        let (_, mut panel) = panel_with(None);
        panel.set_source("Hello");
        let _job = panel.begin();
        panel.finish(None);

        panel.clear();

        let view = panel.view();
        assert_eq!(view.source_text, "");
        assert_eq!(view.target_text, "");
        assert_eq!(view.status, &Status::default());
    }
}
