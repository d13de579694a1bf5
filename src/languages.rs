//! Languages the backend can write prompts in.

use crate::constants::DEFAULT_LANGUAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Display name in the language itself (e.g. "Deutsch").
    pub name: &'static str,
    /// Code sent to the backend (e.g. "de", "zh-CN").
    pub code: &'static str,
}

pub static SUPPORTED_LANGUAGES: &[Language] = &[
    Language { name: "English", code: "en" },
    Language { name: "Español", code: "es" },
    Language { name: "Deutsch", code: "de" },
    Language { name: "Français", code: "fr" },
    Language { name: "Português", code: "pt" },
    Language { name: "简体中文", code: "zh-CN" },
    Language { name: "繁體中文", code: "zh-TW" },
    Language { name: "العربية", code: "ar" },
    Language { name: "Русский", code: "ru" },
    Language { name: "日本語", code: "ja" },
    Language { name: "한국어", code: "ko" },
];

pub fn find_by_code(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|lang| lang.code == code)
}

pub fn default_language() -> &'static Language {
    find_by_code(DEFAULT_LANGUAGE).unwrap_or(&SUPPORTED_LANGUAGES[0])
}
