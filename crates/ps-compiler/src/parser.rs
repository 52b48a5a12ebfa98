use once_cell::sync::Lazy;
use regex::Regex;

use ps_core::matcher::ValueMatcher;
use ps_core::rule::Rule;
use ps_core::store::LineCompiler;

static REMOVEPARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"removeparam=([^,\n]+)").expect("static removeparam pattern"));

// Either an explicit `domain=` option or the rule anchor (`||host^`, `^...`,
// or a bare leading token) up to the first `^` or `$`.
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"domain=([^,\n]+)|^(?:\|\|)?\^?([^\^\$]+)").expect("static domain pattern")
});

/// Compiles `$removeparam` filter lines into [`Rule`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler;

impl FilterCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile one line. `None` means the line is not a removeparam rule.
    pub fn compile_line(&self, line: &str) -> Option<Vec<Rule>> {
        compile_line(line)
    }
}

impl LineCompiler for FilterCompiler {
    fn compile_line(&self, line: &str) -> Option<Vec<Rule>> {
        compile_line(line)
    }
}

/// Compile every rule line of a filter list, in order.
pub fn parse_filter_list(text: &str) -> Vec<Rule> {
    let mut rules = Vec::new();

    for line in text.lines() {
        if let Some(compiled) = compile_line(line) {
            rules.extend(compiled);
        }
    }

    rules
}

/// Compile one filter-list line.
///
/// A line expands into the cross product of its domain matchers and parameter
/// matchers, domain-major. Without a domain each parameter matcher becomes a
/// general rule.
pub fn compile_line(line: &str) -> Option<Vec<Rule>> {
    if line.trim().is_empty() || is_comment_line(line) {
        return None;
    }

    let (domain, param) = extract_domain_and_param(line)?;

    let params = param_matchers(param);

    if domain.trim().is_empty() {
        return Some(params.into_iter().map(Rule::general).collect());
    }

    let domains = domain_matchers(domain);

    let mut rules = Vec::with_capacity(domains.len() * params.len());
    for domain in &domains {
        for param in &params {
            rules.push(Rule::specific(domain.clone(), param.clone()));
        }
    }

    Some(rules)
}

/// Pull the domain clause and the removeparam clause out of a line.
///
/// The domain is empty when the line names none. Returns `None` when the line
/// carries no `removeparam=` option.
pub fn extract_domain_and_param(line: &str) -> Option<(&str, &str)> {
    let param = REMOVEPARAM_RE.captures(line)?.get(1)?.as_str();

    let matches: Vec<_> = DOMAIN_RE.captures_iter(line).collect();
    let domain = match matches.as_slice() {
        [] => "",
        // An anchor followed by an explicit `domain=`: the option wins.
        [_, second, ..] => second.get(1).map_or("", |m| m.as_str()),
        [only] => only
            .get(1)
            .or_else(|| only.get(2))
            .map_or("", |m| m.as_str()),
    };

    Some((domain, param))
}

fn param_matchers(param: &str) -> Vec<ValueMatcher> {
    if is_regex(param) {
        return pattern_matcher(strip_regex(param)).into_iter().collect();
    }

    param.split('|').map(ValueMatcher::token).collect()
}

fn domain_matchers(domain: &str) -> Vec<ValueMatcher> {
    if is_regex(domain) {
        return pattern_matcher(strip_regex(domain)).into_iter().collect();
    }

    domain
        .split('|')
        .filter_map(|segment| {
            let expanded = wildcard_to_regex(segment);
            if is_regex(&expanded) {
                pattern_matcher(strip_regex(&expanded))
            } else {
                Some(ValueMatcher::literal(segment))
            }
        })
        .collect()
}

fn pattern_matcher(pattern: &str) -> Option<ValueMatcher> {
    match ValueMatcher::pattern(pattern) {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            log::warn!("Skipping rules for clause: {e}");
            None
        }
    }
}

/// Whether a clause is written as `/regex/`.
pub fn is_regex(input: &str) -> bool {
    input.len() >= 2 && input.starts_with('/') && input.ends_with('/')
}

/// The pattern between the slashes of a `/regex/` clause.
pub fn strip_regex(input: &str) -> &str {
    &input[1..input.len() - 1]
}

/// Expand `*` wildcards of a domain into a `/regex/` clause.
///
/// `*` becomes a lazy `.*?`, everything else is matched literally. A domain
/// without wildcards is returned unchanged.
pub fn wildcard_to_regex(domain: &str) -> String {
    if !domain.contains('*') {
        return domain.to_string();
    }

    let pattern = domain
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*?");
    format!("/{pattern}/")
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!')
}
