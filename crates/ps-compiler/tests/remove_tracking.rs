use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use ps_compiler::FilterCompiler;
use ps_core::{RawSource, RuleStore, TrackingRemover};

const FIXTURE: &str = include_str!("fixtures/trackparam.txt");

fn remover() -> TrackingRemover {
    let store = Arc::new(RuleStore::new());
    store
        .update_bytes(&FilterCompiler::new(), "trackparam.txt", FIXTURE.as_bytes())
        .unwrap();
    TrackingRemover::new(store)
}

#[test]
fn fixture_compiles_expected_rule_count() {
    let store = RuleStore::new();
    let count = store
        .update_bytes(&FilterCompiler::new(), "trackparam.txt", FIXTURE.as_bytes())
        .unwrap();
    // 4 general + si + pp + 2x2 twitter + 2 weibo + from + abtest + tag
    assert_eq!(count, 15);
}

#[test]
fn removes_tracking() {
    let remover = remover();
    let cases = [
        ("https://youtu.be/dQw4w9WgXcQ?si=ABCDEF", "https://youtu.be/dQw4w9WgXcQ"),
        ("https://youtu.be/dQw4w9WgXcQ?si=ABCDEF#123", "https://youtu.be/dQw4w9WgXcQ#123"),
        (
            "https://youtu.be/dQw4w9WgXcQ?si=ABCDEF&silly=this_is_fake",
            "https://youtu.be/dQw4w9WgXcQ?silly=this_is_fake",
        ),
        ("https://youtu.be/dQw4w9WgXcQ?si=ABCDEF&t=42", "https://youtu.be/dQw4w9WgXcQ?t=42"),
        (
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&pp=ABCDEFG&t=42s",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        ),
        (
            "https://twitter.com/example/status/1234567890?t=abcdefghij&s=19",
            "https://twitter.com/example/status/1234567890",
        ),
        ("https://weibo.com/test?weibo_id=1234&dt_dapp=1234", "https://weibo.com/test"),
        ("https://weibo.cn/test?weibo_id=1234&dt_dapp=1234", "https://weibo.cn/test"),
        ("https://daraz.com/test?from=abc&abtest=123", "https://daraz.com/test"),
        ("https://daraz.com/test?from=abc&notabtest=123", "https://daraz.com/test?notabtest=123"),
        ("https://www.amazon.de/dp/B0?tag=aff-21&th=1", "https://www.amazon.de/dp/B0?th=1"),
        (
            "Hey check out this cool video I found: https://youtu.be/dQw4w9WgXcQ?si=ABCDEF&t=42, you will like it!",
            "Hey check out this cool video I found: https://youtu.be/dQw4w9WgXcQ?t=42, you will like it!",
        ),
        (
            "Hey check out this cool video I found: https://youtu.be/dQw4w9WgXcQ?si=ABCDEF&t=42, you will like it! Also, check out this tweet: https://twitter.com/example/status/1234567890?t=abcdefghij&s=19",
            "Hey check out this cool video I found: https://youtu.be/dQw4w9WgXcQ?t=42, you will like it! Also, check out this tweet: https://twitter.com/example/status/1234567890",
        ),
    ];

    for (input, expected) in cases {
        let cleaned = remover.remove_tracking(input);
        assert!(cleaned.changed, "did not remove tracking from {input}");
        assert_eq!(cleaned.text, expected);
    }
}

#[test]
fn leaves_clean_links_alone() {
    let remover = remover();
    for input in [
        "https://twitter.com/example/status/1234567890",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://google.com/#1234",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        "https://ebay.com?tag=1",
    ] {
        let cleaned = remover.remove_tracking(input);
        assert!(!cleaned.changed, "removed tracking unexpectedly from {input}");
        assert_eq!(cleaned.text, input);
    }
}

#[test]
fn second_pass_is_a_no_op() {
    let remover = remover();
    let first = remover.remove_tracking("see https://x.com/a/status/1?t=1&s=2&utm_source=feed&keep=1");
    assert_eq!(first.text, "see https://x.com/a/status/1?keep=1");
    let second = remover.remove_tracking(&first.text);
    assert!(!second.changed);
    assert_eq!(second.text, first.text);
}

#[test]
fn unchanged_list_is_not_recompiled() {
    let store = RuleStore::new();
    let cancel = AtomicBool::new(false);
    let compiler = FilterCompiler::new();
    let sources = || vec![Ok(RawSource::new("trackparam.txt", FIXTURE))];

    store.update_all(&compiler, sources(), &cancel).unwrap();
    let first = store.rules_for("trackparam.txt").unwrap();

    let summary = store.update_all(&compiler, sources(), &cancel).unwrap();
    assert_eq!(summary.skipped, 1);
    assert!(Arc::ptr_eq(&first, &store.rules_for("trackparam.txt").unwrap()));
}
