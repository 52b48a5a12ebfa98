//! ParamScrub Core Library
//!
//! Rule model and rewrite engine for stripping tracking query parameters from
//! URLs embedded in free text.
//!
//! # Architecture
//!
//! Filter lists are compiled elsewhere (see `ps-compiler`) into [`Rule`]s
//! and cached per source in a [`RuleStore`], which skips sources whose content
//! hash has not changed. A [`TrackingRemover`] borrows the store's current
//! rules, detects URLs in a message and rewrites their query strings.
//!
//! # Modules
//!
//! - `matcher`: literal, token and pattern value matchers
//! - `rule`: general and domain-scoped removeparam rules
//! - `url`: URL detection and the mutable URL model
//! - `hash`: xxHash64 content hashing for change detection
//! - `store`: per-source rule cache
//! - `remover`: text rewriting entry point
//! - `error`: shared error type

pub mod error;
pub mod hash;
pub mod matcher;
pub mod remover;
pub mod rule;
pub mod store;
pub mod url;

// Re-export commonly used types
pub use error::{Error, Result};
pub use hash::content_hash;
pub use matcher::ValueMatcher;
pub use remover::{Cleaned, RemoverOptions, TrackingRemover};
pub use rule::Rule;
pub use store::{LineCompiler, RawSource, RuleStore, UpdateSummary};
pub use url::{DetectedUrl, TextUrlDetector, UrlDetector, UrlModel};
