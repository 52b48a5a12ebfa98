use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use ps_core::{RawSource, RemoverOptions, Rule, RuleStore, TrackingRemover, ValueMatcher};

fn compile(line: &str) -> Option<Vec<Rule>> {
    let (domain, param) = line.split_once(' ')?;
    Some(vec![Rule::specific(
        ValueMatcher::literal(domain),
        ValueMatcher::token(param),
    )])
}

#[test]
fn rewrites_never_see_a_torn_rule_list() {
    let store = Arc::new(RuleStore::new());
    let cancel = AtomicBool::new(false);
    store
        .update_all(&compile, vec![Ok(RawSource::new("list", "youtu.be si\nyoutu.be pp"))], &cancel)
        .unwrap();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for round in 0..200 {
                let text = if round % 2 == 0 {
                    "youtu.be si\nyoutu.be pp\n"
                } else {
                    "youtu.be si\nyoutu.be pp"
                };
                store.update(&compile, "list", &round.to_string(), text.lines());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let remover = TrackingRemover::new(Arc::clone(&store));
            thread::spawn(move || {
                for _ in 0..200 {
                    let cleaned = remover.remove_tracking("https://youtu.be/x?si=1&pp=2&t=3");
                    assert_eq!(cleaned.text, "https://youtu.be/x?t=3");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.total_rules(), 2);
}

#[test]
fn parity_mode_matches_default_when_every_url_hits() {
    let store = Arc::new(RuleStore::new());
    store.update(&compile, "list", "h", ["youtu.be si", "twitter.com t"]);

    let text = "https://youtu.be/x?si=1 and https://twitter.com/a/status/1?t=abc&s=19";
    let default = TrackingRemover::new(Arc::clone(&store)).remove_tracking(text);
    let parity = TrackingRemover::new(store)
        .options(RemoverOptions { stop_at_first_untouched: true })
        .remove_tracking(text);

    assert_eq!(default, parity);
    assert_eq!(default.text, "https://youtu.be/x and https://twitter.com/a/status/1?s=19");
}
