use std::collections::HashSet;

use ps_core::rule::Rule;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Drop rules whose rendered form was already seen, keeping first occurrences.
pub fn optimize_rules(rules: &mut Vec<Rule>) -> OptimizeStats {
    let before = rules.len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        if seen.insert(rule.to_string()) {
            true
        } else {
            deduped += 1;
            false
        }
    });

    let after = rules.len();

    OptimizeStats {
        before,
        after,
        deduped,
    }
}
