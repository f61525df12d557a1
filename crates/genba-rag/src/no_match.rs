//! Post-generation "no relevant information" detection

use genba_core::locale::{messages, Locale};

/// Rule table mapping locale to the phrases that indicate the generator
/// found no relevant context.
///
/// Injected configuration rather than logic baked into the pipeline. The
/// check is a case-insensitive substring scan over the generated answer; on a
/// hit the whole answer is replaced with the canonical no-document-match
/// message for the locale.
#[derive(Debug, Clone)]
pub struct NoMatchRules {
    rules: Vec<(Locale, Vec<String>)>,
}

impl Default for NoMatchRules {
    fn default() -> Self {
        Self::new(vec![
            (
                Locale::Ja,
                vec![
                    "回答に必要な情報が見つかりませんでした".to_string(),
                    "情報が見つかりませんでした".to_string(),
                ],
            ),
            (
                Locale::En,
                vec![
                    "not found".to_string(),
                    "information necessary".to_string(),
                    "was not found".to_string(),
                ],
            ),
        ])
    }
}

impl NoMatchRules {
    pub fn new(rules: Vec<(Locale, Vec<String>)>) -> Self {
        Self { rules }
    }

    pub fn phrases(&self, locale: Locale) -> &[String] {
        self.rules
            .iter()
            .find(|(l, _)| *l == locale)
            .map(|(_, phrases)| phrases.as_slice())
            .unwrap_or(&[])
    }

    /// Substitute the canonical fallback when any trigger phrase matches
    pub fn apply(&self, locale: Locale, answer: String) -> String {
        let lowered = answer.to_lowercase();
        let triggered = self
            .phrases(locale)
            .iter()
            .any(|phrase| lowered.contains(&phrase.to_lowercase()));

        if triggered {
            messages::no_doc_match(locale).to_string()
        } else {
            answer
        }
    }
}
