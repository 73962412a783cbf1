//! Translation loader and i18n management
//!
//! This module provides catalog loading, language detection, nested key
//! lookup with fallback to the default language, and `{param}` interpolation.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::I18nConfig;
use crate::utils::errors::{RegistrationDeskError, Result};

const BUILTIN_CATALOGS: [(&str, &str); 2] = [
    ("ru", include_str!("../../translations/ru.json")),
    ("en", include_str!("../../translations/en.json")),
];

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    default_language: String,
    supported_languages: Vec<String>,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    pub fn new(config: &I18nConfig) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
        }
    }

    /// Catalogs compiled into the binary, for tests and runs without a translations directory
    pub fn builtin(config: &I18nConfig) -> Result<Self> {
        let mut i18n = Self::new(config);
        for (lang_code, content) in BUILTIN_CATALOGS {
            if i18n.is_language_supported(lang_code) {
                i18n.insert_catalog(lang_code, content)?;
            }
        }
        Ok(i18n)
    }

    /// Load every supported language from `<dir>/<code>.json`.
    ///
    /// A missing or broken default catalog is fatal; other languages are skipped.
    pub async fn load_translations(&mut self, dir: &Path) -> Result<()> {
        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = dir.join(format!("{}.json", lang_code));

            if !file_path.exists() {
                warn!("Translation file not found: {}", file_path.display());
                if lang_code == &self.default_language {
                    return Err(RegistrationDeskError::Config(format!(
                        "Default language translation file not found: {}",
                        file_path.display()
                    )));
                }
                continue;
            }

            let loaded = match fs::read_to_string(&file_path).await {
                Ok(content) => self.insert_catalog(lang_code, &content),
                Err(e) => Err(e.into()),
            };
            match loaded {
                Ok(()) => info!("Loaded translations for language: {}", lang_code),
                Err(e) => {
                    error!("Failed to load translations for {}: {}", lang_code, e);
                    if lang_code == &self.default_language {
                        return Err(RegistrationDeskError::Config(format!(
                            "Failed to load default language translations: {}",
                            e
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn insert_catalog(&mut self, lang_code: &str, content: &str) -> Result<()> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => {
                debug!("Loaded {} top-level translation sections for {}", map.len(), lang_code);
                self.translations.insert(lang_code.to_string(), map);
                Ok(())
            }
            _ => Err(RegistrationDeskError::Config(format!(
                "Invalid translation file format for {}",
                lang_code
            ))),
        }
    }

    /// Get a translated message; unknown keys come back verbatim
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let text = self
            .get_translation_value(key, effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match text {
            Some(text) => format_message(text, params),
            None => {
                warn!("Translation key '{}' not found in any language", key);
                key.to_string()
            }
        }
    }

    /// Shorthand for a single `{name}` parameter set
    pub fn t_with(&self, key: &str, lang: &str, params: &[(&str, &str)]) -> String {
        let params: TranslationParams =
            params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.t(key, lang, Some(&params))
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    /// Requested language if it is loaded, otherwise the default
    fn get_effective_language<'a>(&'a self, lang: &'a str) -> &'a str {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang
        } else {
            &self.default_language
        }
    }

    /// Look up a dotted key like `prompts.edit.name`
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&str> {
        let mut parts = key.split('.');
        let mut current = self.translations.get(lang)?.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        current.as_str()
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Detect user language from Telegram language code
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        if let Some(lang) = telegram_lang {
            // "en-US" -> "en"
            let lang_code = lang.split('-').next().unwrap_or(lang);

            if self.is_language_supported(lang_code) {
                return lang_code.to_string();
            }
        }

        self.default_language.clone()
    }

    /// Get translation statistics
    pub fn get_stats(&self) -> TranslationStats {
        let mut stats = TranslationStats { languages: Vec::new(), total_keys: 0 };

        for (lang, translations) in &self.translations {
            let key_count = count_keys(translations);
            stats.languages.push(LanguageStats { code: lang.clone(), key_count });
            if lang == &self.default_language {
                stats.total_keys = key_count;
            }
        }

        stats
    }
}

fn format_message(template: &str, params: Option<&TranslationParams>) -> String {
    let Some(params) = params else {
        return template.to_string();
    };
    let mut result = template.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

fn count_keys(obj: &Map<String, Value>) -> usize {
    obj.values()
        .map(|value| match value {
            Value::Object(nested) => count_keys(nested),
            _ => 1,
        })
        .sum()
}

/// Translation statistics
#[derive(Debug, Clone)]
pub struct TranslationStats {
    pub languages: Vec<LanguageStats>,
    pub total_keys: usize,
}

/// Language-specific statistics
#[derive(Debug, Clone)]
pub struct LanguageStats {
    pub code: String,
    pub key_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> I18nConfig {
        I18nConfig {
            default_language: "ru".to_string(),
            supported_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }

    #[test]
    fn test_language_detection() {
        let i18n = I18n::new(&create_test_config());

        assert_eq!(i18n.detect_user_language(Some("en-US")), "en");
        assert_eq!(i18n.detect_user_language(Some("ru")), "ru");
        assert_eq!(i18n.detect_user_language(Some("fr")), "ru");
        assert_eq!(i18n.detect_user_language(None), "ru");
    }

    #[test]
    fn test_message_formatting() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), "John".to_string());
        params.insert("count".to_string(), "5".to_string());

        let result = format_message("Hello {name}, you have {count} messages", Some(&params));
        assert_eq!(result, "Hello John, you have 5 messages");
    }

    #[test]
    fn builtin_catalogs_resolve_nested_keys() {
        let i18n = I18n::builtin(&create_test_config()).unwrap();
        assert_eq!(i18n.t("roles.voter", "ru", None), "Судья");
        assert_eq!(i18n.t("roles.voter", "en", None), "Voter");
        assert_eq!(i18n.t("prompts.edit.name", "ru", None), "Введите ваше имя и фамилию:");
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let i18n = I18n::builtin(&create_test_config()).unwrap();
        assert_eq!(i18n.t("common.cancelled", "de", None), "Операция отменена.");
        assert_eq!(i18n.t("no.such.key", "en", None), "no.such.key");
    }

    #[test]
    fn catalogs_share_the_same_keys() {
        let i18n = I18n::builtin(&create_test_config()).unwrap();
        let stats = i18n.get_stats();
        assert_eq!(stats.languages.len(), 2);
        assert!(stats.languages.iter().all(|l| l.key_count == stats.total_keys));
    }

    #[tokio::test]
    async fn missing_default_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut i18n = I18n::new(&create_test_config());
        assert!(matches!(
            i18n.load_translations(dir.path()).await,
            Err(RegistrationDeskError::Config(_))
        ));
    }

    #[tokio::test]
    async fn loads_catalogs_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ru.json"), r#"{"greeting": {"hello": "Привет, {name}"}}"#).unwrap();

        let mut i18n = I18n::new(&create_test_config());
        i18n.load_translations(dir.path()).await.unwrap();
        assert_eq!(i18n.t_with("greeting.hello", "en", &[("name", "Ivan")]), "Привет, Ivan");
    }
}
