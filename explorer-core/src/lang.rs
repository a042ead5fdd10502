//! Crude English/Vietnamese direction detection.
//!
//! Any Vietnamese diacritic letter in the text means "Vietnamese"; anything
//! else is treated as English. Callers rely on exactly this behaviour.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::Language;

static VIETNAMESE_DIACRITIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "(?i)[àáạảãâầấậẩẫăằắặẳẵèéẹẻẽêềếệểễìíịỉĩòóọỏõôồốộổỗơờớợởỡùúụủũưừứựửữỳýỵỷỹđ]",
    )
    .expect("static pattern is valid")
});

pub fn looks_vietnamese(text: &str) -> bool {
    VIETNAMESE_DIACRITIC.is_match(text)
}

/// `(source, target)` for an automatic translation of `text`.
pub fn detect_direction(text: &str) -> (Language, Language) {
    if looks_vietnamese(text) {
        (Language::Vietnamese, Language::English)
    } else {
        (Language::English, Language::Vietnamese)
    }
}
