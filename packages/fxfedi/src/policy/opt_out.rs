//! Author opt-out from proxying.
//!
//! An author opts out either through an actor-level flag or by putting one of
//! the configured phrases in their bio. Once set it is final for the request.

use crate::text::html_to_text;
use crate::types::config::DEFAULT_OPT_OUT_PHRASES;
use crate::types::metadata::AttributionMetadata;
use crate::types::object::Actor;

/// Phrase matching for actor bios.
///
/// Matching is a case-insensitive substring test against the bio rendered as
/// plain text.
#[derive(Debug, Clone)]
pub struct OptOutPolicy {
    phrases: Vec<String>,
}

impl Default for OptOutPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_OPT_OUT_PHRASES.iter().copied())
    }
}

impl OptOutPolicy {
    pub fn new(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| {
                    let phrase: String = p.into();
                    phrase.trim().to_lowercase()
                })
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Whether the bio contains any opt-out phrase.
    pub fn matches_summary(&self, summary_html: &str) -> bool {
        let text = html_to_text(summary_html).to_lowercase();
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }

    /// Actor flag OR bio phrase.
    pub fn actor_opted_out(&self, actor: &Actor) -> bool {
        actor.opt_out
            || actor
                .summary
                .as_deref()
                .is_some_and(|summary| self.matches_summary(summary))
    }
}

/// Whether the author has opted out of proxying.
pub fn is_opted_out(attribution: Option<&AttributionMetadata>) -> bool {
    attribution.is_some_and(|a| a.opt_out)
}
