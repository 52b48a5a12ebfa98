//! URL detection and the mutable URL model
//!
//! Detection finds URL occurrences in free text and keeps their original
//! surface form. Component splitting works on string slices without a full
//! URL parse; the rewrite path only ever needs the query span.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Detected URL
// =============================================================================

/// One URL occurrence inside a scanned text.
///
/// All spans are byte ranges into [`DetectedUrl::original`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedUrl {
    original: String,
    offset: usize,
    scheme_end: Option<usize>,
    host: Range<usize>,
    path: Range<usize>,
    query: Option<Range<usize>>,
    fragment: Option<Range<usize>>,
}

impl DetectedUrl {
    /// Split `original` into its components. `offset` is where the occurrence
    /// starts in the text it was found in.
    pub fn new(original: impl Into<String>, offset: usize) -> Self {
        let original = original.into();
        let len = original.len();

        let fragment_start = original.find('#');
        let before_fragment = fragment_start.unwrap_or(len);
        let query_start = original[..before_fragment].find('?');
        let resource_end = query_start.unwrap_or(before_fragment);

        let scheme_end = get_scheme_end(&original[..resource_end]);
        let authority_start = scheme_end.unwrap_or(0);
        let (host_start, host_end) = get_host_position(&original[..resource_end], authority_start);

        let path_start = original[host_end..resource_end]
            .find('/')
            .map_or(resource_end, |pos| host_end + pos);

        Self {
            offset,
            scheme_end,
            host: host_start..host_end,
            path: path_start..resource_end,
            query: query_start.map(|start| start..before_fragment),
            fragment: fragment_start.map(|start| start..len),
            original,
        }
    }

    /// The surface text exactly as it appeared.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Byte offset of the occurrence in the scanned text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Scheme without `://`, if the occurrence spelled one out.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme_end.map(|end| &self.original[..end - 3])
    }

    pub fn host(&self) -> &str {
        &self.original[self.host.clone()]
    }

    /// Path, empty when the URL has none.
    pub fn path(&self) -> &str {
        &self.original[self.path.clone()]
    }

    /// Query component including its leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.clone().map(|span| &self.original[span])
    }

    /// Fragment including its leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.clone().map(|span| &self.original[span])
    }

    /// Byte span of the query component (with `?`) inside the original text.
    pub fn query_span(&self) -> Option<Range<usize>> {
        self.query.clone()
    }
}

/// Position right after `scheme://`, when the prefix is a well-formed scheme.
#[inline]
fn get_scheme_end(url: &str) -> Option<usize> {
    let colon_pos = url.find("://")?;
    let scheme = url[..colon_pos].as_bytes();

    let (first, rest) = scheme.split_first()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !rest
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }

    Some(colon_pos + 3)
}

/// Start and end of the hostname, skipping userinfo and stopping at a port.
#[inline]
fn get_host_position(url: &str, authority_start: usize) -> (usize, usize) {
    let bytes = url.as_bytes();

    let authority_end = bytes[authority_start..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(bytes.len(), |pos| authority_start + pos);

    let host_start = bytes[authority_start..authority_end]
        .iter()
        .rposition(|&b| b == b'@')
        .map_or(authority_start, |pos| authority_start + pos + 1);

    let host_end = bytes[host_start..authority_end]
        .iter()
        .position(|&b| b == b':')
        .map_or(authority_end, |pos| host_start + pos);

    (host_start, host_end)
}

// =============================================================================
// Detection
// =============================================================================

/// Finds URL occurrences in free text.
pub trait UrlDetector {
    /// Occurrences in left-to-right order.
    fn detect(&self, text: &str) -> Vec<DetectedUrl>;
}

static URL_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"\b[a-z][a-z0-9+.\-]*://[^\s<>]+",
        r"|\bwww\.[^\s<>]+",
        r"|\b(?:[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?\.)+[a-z]{2,}(?::[0-9]{1,5})?[/?][^\s<>]*",
    ))
    .expect("static URL pattern")
});

/// Regex-driven detector for chat-style text.
///
/// Recognises `scheme://...`, `www....` and bare `host.tld/...` forms. Trailing
/// sentence punctuation and unbalanced closing brackets are not part of a URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextUrlDetector;

impl UrlDetector for TextUrlDetector {
    fn detect(&self, text: &str) -> Vec<DetectedUrl> {
        URL_CANDIDATE
            .find_iter(text)
            .filter_map(|m| {
                let candidate = trim_trailing(m.as_str());
                if candidate.ends_with("://") || candidate.is_empty() {
                    return None;
                }
                Some(DetectedUrl::new(candidate, m.start()))
            })
            .collect()
    }
}

fn trim_trailing(candidate: &str) -> &str {
    let mut end = candidate.len();
    while let Some(last) = candidate[..end].chars().next_back() {
        let current = &candidate[..end];
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' => true,
            ')' => unbalanced(current, '(', ')'),
            ']' => unbalanced(current, '[', ']'),
            '}' => unbalanced(current, '{', '}'),
            _ => false,
        };
        if !strip {
            break;
        }
        end -= last.len_utf8();
    }
    &candidate[..end]
}

fn unbalanced(s: &str, open: char, close: char) -> bool {
    s.matches(close).count() > s.matches(open).count()
}

// =============================================================================
// URL Model
// =============================================================================

/// A detected URL with its query split into removable `key=value` pairs.
///
/// Lives for one rewrite pass. Pairs keep their source order and can only be
/// removed, never added.
#[derive(Debug, Clone)]
pub struct UrlModel {
    url: DetectedUrl,
    pairs: Vec<String>,
}

impl UrlModel {
    pub fn new(url: DetectedUrl) -> Self {
        let pairs = url.query().map(split_query).unwrap_or_default();
        Self { url, pairs }
    }

    /// Convenience for tests and callers that already hold one URL.
    pub fn parse(original: &str) -> Self {
        Self::new(DetectedUrl::new(original, 0))
    }

    pub fn original(&self) -> &str {
        self.url.original()
    }

    pub fn detected(&self) -> &DetectedUrl {
        &self.url
    }

    pub fn query_pairs(&self) -> &[String] {
        &self.pairs
    }

    /// Drop every pair for which `pred` holds. Returns whether any was dropped.
    pub fn remove_pairs(&mut self, mut pred: impl FnMut(&str) -> bool) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|pair| !pred(pair));
        self.pairs.len() != before
    }

    /// Re-serialize with the remaining pairs. The fragment is left in place.
    pub fn finalize(&self) -> String {
        let original = self.url.original();
        let Some(span) = self.url.query_span() else {
            return original.to_string();
        };

        let mut out = String::with_capacity(original.len());
        out.push_str(&original[..span.start]);
        if !self.pairs.is_empty() {
            out.push('?');
            out.push_str(&self.pairs.join("&"));
        }
        out.push_str(&original[span.end..]);
        out
    }
}

/// Split a query (with or without its leading `?`) into non-empty segments.
pub fn split_query(query: &str) -> Vec<String> {
    query
        .strip_prefix('?')
        .unwrap_or(query)
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(str::to_string)
        .collect()
}
