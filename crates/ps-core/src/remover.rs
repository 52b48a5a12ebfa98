//! Tracking removal over free text
//!
//! Finds URLs in a message, runs every cached rule against each of them, and
//! substitutes the rewritten URLs back into the message.

use std::collections::HashMap;
use std::sync::Arc;

use crate::store::RuleStore;
use crate::url::{TextUrlDetector, UrlDetector, UrlModel};

/// Behaviour switches for [`TrackingRemover`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoverOptions {
    /// Stop scanning a message at the first URL no rule touched. Off by
    /// default: every URL is then handled independently.
    pub stop_at_first_untouched: bool,
}

/// Result of a rewrite call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub text: String,
    pub changed: bool,
}

/// Applies the store's current rules to URLs found in text.
pub struct TrackingRemover<D = TextUrlDetector> {
    store: Arc<RuleStore>,
    detector: D,
    options: RemoverOptions,
}

impl TrackingRemover<TextUrlDetector> {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self::with_detector(store, TextUrlDetector)
    }
}

impl<D: UrlDetector> TrackingRemover<D> {
    pub fn with_detector(store: Arc<RuleStore>, detector: D) -> Self {
        Self {
            store,
            detector,
            options: RemoverOptions::default(),
        }
    }

    pub fn options(mut self, options: RemoverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Strip tracking parameters from every URL in `text`.
    ///
    /// Never fails; without URLs or matching rules the text comes back as is.
    pub fn remove_tracking(&self, text: &str) -> Cleaned {
        let urls = self.detector.detect(text);
        if urls.is_empty() {
            log::debug!("No URLs found in {text}");
            return Cleaned {
                text: text.to_string(),
                changed: false,
            };
        }

        let rule_sets = self.store.snapshot();
        let mut rewrites: HashMap<&str, String> = HashMap::new();

        for detected in &urls {
            if rewrites.contains_key(detected.original()) {
                continue;
            }

            let mut url = UrlModel::new(detected.clone());
            let hits = rule_sets
                .iter()
                .flat_map(|rules| rules.iter())
                .filter(|rule| rule.apply(&mut url))
                .count();

            if hits == 0 {
                if self.options.stop_at_first_untouched {
                    break;
                }
                continue;
            }

            let finalized = url.finalize();
            log::debug!("Replacing URL {} with {finalized} ({hits} rules hit)", url.original());
            rewrites.insert(detected.original(), finalized);
        }

        // Splice right to left so earlier offsets stay valid. Only detected
        // occurrences are rewritten, never a substring of another URL.
        let mut out = text.to_string();
        let mut changed = false;
        for detected in urls.iter().rev() {
            let Some(finalized) = rewrites.get(detected.original()) else {
                continue;
            };
            let span = detected.offset()..detected.offset() + detected.original().len();
            if out.get(span.clone()) != Some(detected.original()) {
                log::warn!("Detected URL {} not found at offset {}", detected.original(), detected.offset());
                continue;
            }
            out.replace_range(span, finalized);
            changed = true;
        }

        log::debug!("Changed: {changed}, new text: {out}");
        Cleaned { text: out, changed }
    }
}
