//! Language tagging for post bodies.
//!
//! Detection is best effort: callers store no tag when it fails, and a
//! failure never blocks the write it belongs to.

use std::sync::Arc;

use crate::config::PostsConfig;

/// Longest language code the `posts.language` column accepts.
pub const MAX_CODE_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectionError {
    #[error("no text to classify")]
    Empty,

    #[error("language could not be determined")]
    Undetermined,

    #[error("language detection is disabled")]
    Disabled,
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

/// Tag `text`, mapping every failure to `None`.
pub fn tag(detector: &dyn LanguageDetector, text: &str) -> Option<String> {
    match detector.detect(text) {
        Ok(code) if !code.is_empty() && code.len() <= MAX_CODE_LEN => Some(code),
        Ok(code) => {
            tracing::debug!("Discarding unusable language code {:?}", code);
            None
        }
        Err(e) => {
            tracing::debug!("Language detection failed: {}", e);
            None
        }
    }
}

pub fn from_config(config: &PostsConfig) -> Arc<dyn LanguageDetector> {
    if config.detect_language {
        Arc::new(TrigramDetector)
    } else {
        Arc::new(DisabledDetector)
    }
}

pub struct DisabledDetector;

impl LanguageDetector for DisabledDetector {
    fn detect(&self, _text: &str) -> Result<String, DetectionError> {
        Err(DetectionError::Disabled)
    }
}

/// Backed by `whatlang` trigram profiles. Codes are reported in ISO 639-1
/// where one exists, otherwise in the three-letter form `whatlang` uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrigramDetector;

impl LanguageDetector for TrigramDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        if !text.chars().any(char::is_alphabetic) {
            return Err(DetectionError::Empty);
        }

        let lang = whatlang::detect_lang(text).ok_or(DetectionError::Undetermined)?;
        Ok(iso639_1(lang.code()).unwrap_or(lang.code()).to_string())
    }
}

fn iso639_1(code: &str) -> Option<&'static str> {
    Some(match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english() {
        assert_eq!(
            TrigramDetector
                .detect("The quick brown fox jumps over the lazy dog near the river bank")
                .unwrap(),
            "en"
        );
    }

    #[test]
    fn detects_spanish() {
        assert_eq!(
            TrigramDetector
                .detect("El perro es muy grande y los gatos son pequeños, pero todos viven juntos en la casa")
                .unwrap(),
            "es"
        );
    }

    #[test]
    fn detects_german() {
        assert_eq!(
            TrigramDetector
                .detect("Ich bin heute nicht müde, und das Wetter ist wirklich sehr schön draußen")
                .unwrap(),
            "de"
        );
    }

    #[test]
    fn text_without_letters_is_empty() {
        assert_eq!(TrigramDetector.detect("  12345 !!"), Err(DetectionError::Empty));
        assert_eq!(TrigramDetector.detect(""), Err(DetectionError::Empty));
    }

    #[test]
    fn short_posts_still_get_a_code() {
        let code = TrigramDetector.detect("Rust is great").unwrap();
        assert!(!code.is_empty() && code.len() <= MAX_CODE_LEN);
    }

    #[test]
    fn unmapped_codes_pass_through() {
        assert_eq!(iso639_1("eng"), Some("en"));
        assert_eq!(iso639_1("xyz"), None);
    }

    #[test]
    fn from_config_respects_the_switch() {
        let off = from_config(&PostsConfig {
            detect_language: false,
        });
        assert_eq!(off.detect("anything at all"), Err(DetectionError::Disabled));

        let on = from_config(&PostsConfig {
            detect_language: true,
        });
        assert_eq!(
            on.detect("The weather is lovely today and we are going for a long walk")
                .unwrap(),
            "en"
        );
    }

    #[test]
    fn tag_swallows_failures() {
        assert_eq!(tag(&DisabledDetector, "the cat is here"), None);
        assert_eq!(tag(&TrigramDetector, "!!!"), None);
        assert_eq!(
            tag(&TrigramDetector, "What a wonderful morning it is for a walk in the park"),
            Some("en".to_string())
        );
    }

    struct Fixed(&'static str);

    impl LanguageDetector for Fixed {
        fn detect(&self, _text: &str) -> Result<String, DetectionError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn tag_drops_codes_that_do_not_fit_the_column() {
        assert_eq!(tag(&Fixed("zh-Hant"), "text"), None);
        assert_eq!(tag(&Fixed("pt-BR"), "text"), Some("pt-BR".to_string()));
    }
}
