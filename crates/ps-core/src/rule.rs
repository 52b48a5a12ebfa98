//! Removeparam rules

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::matcher::ValueMatcher;
use crate::url::UrlModel;

/// A compiled `$removeparam` directive.
///
/// Rules are immutable; applying one only mutates the URL it is given.
/// Two rules are equal when they render to the same string.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Strips matching query pairs from every URL.
    General(ValueMatcher),
    /// Strips matching query pairs only when the domain matcher accepts the
    /// URL's full original text.
    Specific {
        domain: ValueMatcher,
        param: ValueMatcher,
    },
}

impl Rule {
    pub fn general(param: ValueMatcher) -> Self {
        Self::General(param)
    }

    pub fn specific(domain: ValueMatcher, param: ValueMatcher) -> Self {
        Self::Specific { domain, param }
    }

    /// Remove every query pair the parameter matcher accepts. Returns whether
    /// anything was removed.
    pub fn apply(&self, url: &mut UrlModel) -> bool {
        let param = match self {
            Self::General(param) => param,
            Self::Specific { domain, param } => {
                if !domain.is_match(url.original()) {
                    return false;
                }
                param
            }
        };

        url.remove_pairs(|pair| param.is_match(pair))
    }

    pub fn param(&self) -> &ValueMatcher {
        match self {
            Self::General(param) | Self::Specific { param, .. } => param,
        }
    }

    pub fn domain(&self) -> Option<&ValueMatcher> {
        match self {
            Self::General(_) => None,
            Self::Specific { domain, .. } => Some(domain),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General(param) => write!(f, "General: {param}"),
            Self::Specific { domain, param } => write!(f, "Specific: [{domain}] - {param}"),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
