//! Per-source rule cache
//!
//! Each filter source maps to the rules compiled from its last-seen bytes and
//! the content hash of those bytes. Unchanged sources are never recompiled.
//!
//! Updates compile outside the lock and then swap the whole entry in under a
//! write lock, so readers see either the old rule list or the new one.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::hash::content_hash;
use crate::rule::Rule;

/// Turns one filter-list line into rules, or `None` when it is not a rule.
pub trait LineCompiler {
    fn compile_line(&self, line: &str) -> Option<Vec<Rule>>;
}

impl<F> LineCompiler for F
where
    F: Fn(&str) -> Option<Vec<Rule>>,
{
    fn compile_line(&self, line: &str) -> Option<Vec<Rule>> {
        self(line)
    }
}

/// Raw bytes of one fetched filter source.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub id: String,
    pub bytes: Vec<u8>,
}

impl RawSource {
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug)]
struct SourceEntry {
    source_id: String,
    hash: String,
    rules: Arc<[Rule]>,
}

/// Outcome of [`RuleStore::update_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub sources: usize,
    pub recompiled: usize,
    pub skipped: usize,
    pub total_rules: usize,
    pub cancelled: bool,
}

/// Cache of compiled rules keyed by source identifier.
#[derive(Debug, Default)]
pub struct RuleStore {
    entries: RwLock<Vec<SourceEntry>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `lines` for `source_id` unless `hash` matches the cached entry.
    ///
    /// Returns the number of rules now held for the source.
    pub fn update<C, I, S>(&self, compiler: &C, source_id: &str, hash: &str, lines: I) -> usize
    where
        C: LineCompiler + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let entries = self.entries.read();
            match entries.iter().find(|e| e.source_id == source_id) {
                Some(entry) if entry.hash == hash => {
                    log::info!("Source {source_id}: hash {hash} unchanged, skipping");
                    return entry.rules.len();
                }
                Some(_) => log::info!("Source {source_id}: hash changed to {hash}, recompiling"),
                None => log::info!("Source {source_id}: hash {hash} not cached, compiling"),
            }
        }

        let mut rules = Vec::new();
        for line in lines {
            if let Some(compiled) = compiler.compile_line(line.as_ref()) {
                rules.extend(compiled);
            }
        }
        let count = rules.len();

        let entry = SourceEntry {
            source_id: source_id.to_string(),
            hash: hash.to_string(),
            rules: rules.into(),
        };

        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.source_id == source_id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        drop(entries);

        log::info!("Source {source_id}: {count} rules");
        count
    }

    /// Hash and decode `bytes`, then [`update`](Self::update).
    pub fn update_bytes<C>(&self, compiler: &C, source_id: &str, bytes: &[u8]) -> Result<usize>
    where
        C: LineCompiler + ?Sized,
    {
        let text = decode(source_id, bytes)?;
        Ok(self.update(compiler, source_id, &content_hash(bytes), text.lines()))
    }

    /// Update every source in order, checking `cancel` between sources.
    ///
    /// Every source must be available and decodable before any entry is
    /// touched: the first failure aborts the cycle and the cache is left as it
    /// was.
    pub fn update_all<C, I>(&self, compiler: &C, sources: I, cancel: &AtomicBool) -> Result<UpdateSummary>
    where
        C: LineCompiler + ?Sized,
        I: IntoIterator<Item = Result<RawSource>>,
    {
        let sources = sources.into_iter().collect::<Result<Vec<_>>>()?;
        for source in &sources {
            decode(&source.id, &source.bytes)?;
        }

        let mut summary = UpdateSummary::default();

        for source in &sources {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Update cancelled after {} sources", summary.sources);
                summary.cancelled = true;
                break;
            }

            let before = self.hash_for(&source.id);
            self.update_bytes(compiler, &source.id, &source.bytes)?;
            if before.as_deref() == self.hash_for(&source.id).as_deref() {
                summary.skipped += 1;
            } else {
                summary.recompiled += 1;
            }
            summary.sources += 1;
        }

        summary.total_rules = self.total_rules();
        log::info!(
            "Filters updated, total {} rules from {} sources ({} recompiled, {} unchanged)",
            summary.total_rules,
            summary.sources,
            summary.recompiled,
            summary.skipped
        );
        Ok(summary)
    }

    /// Rules currently held for `source_id`.
    pub fn rules_for(&self, source_id: &str) -> Option<Arc<[Rule]>> {
        self.entries
            .read()
            .iter()
            .find(|e| e.source_id == source_id)
            .map(|e| Arc::clone(&e.rules))
    }

    pub fn hash_for(&self, source_id: &str) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|e| e.source_id == source_id)
            .map(|e| e.hash.clone())
    }

    /// Every source's rule list, in the order sources were first seen.
    pub fn snapshot(&self) -> Vec<Arc<[Rule]>> {
        self.entries.read().iter().map(|e| Arc::clone(&e.rules)).collect()
    }

    pub fn total_rules(&self) -> usize {
        self.entries.read().iter().map(|e| e.rules.len()).sum()
    }

    pub fn source_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Human-readable listing of every cached rule, grouped by source.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.read().iter() {
            let _ = writeln!(out, "Source: {} ({})", entry.source_id, entry.hash);
            for rule in entry.rules.iter() {
                let _ = writeln!(out, "\t{rule}");
            }
            out.push('\n');
        }
        out
    }
}

fn decode<'a>(source_id: &str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| Error::SourceDecode {
        source_id: source_id.to_string(),
        valid_up_to: e.valid_up_to(),
    })
}
