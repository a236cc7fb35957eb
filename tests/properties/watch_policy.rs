//! Property tests for path filtering.

use std::time::Instant;

use proptest::prelude::*;

use relaunch::{ChangeEvent, ChangeKind, FilterVerdict, WatchPolicy};

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_.-]{1,12}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a path under an excluded directory is never eligible.
    #[test]
    fn property_excluded_segment_never_eligible(
        before in proptest::collection::vec(segment(), 0..=3),
        after in proptest::collection::vec(segment(), 0..=2),
        stem in "[a-z]{1,8}",
    ) {
        let mut parts = before;
        parts.push("__pycache__".to_string());
        parts.extend(after);
        parts.push(format!("{stem}.py"));
        let path = parts.join("/");

        let verdict = WatchPolicy::default()
            .evaluate(&ChangeEvent::new(path.as_str(), ChangeKind::Modified, Instant::now()));
        prop_assert!(!verdict.is_eligible(), "{} was eligible", path);
    }

    /// PROPERTY: directory events are never eligible, whatever their name.
    #[test]
    fn property_directories_never_eligible(
        parts in proptest::collection::vec(segment(), 1..=4),
    ) {
        let event = ChangeEvent::new(parts.join("/"), ChangeKind::Created, Instant::now()).directory();
        prop_assert_eq!(WatchPolicy::default().evaluate(&event), FilterVerdict::Directory);
    }

    /// PROPERTY: only the configured extensions pass, case-insensitively.
    #[test]
    fn property_extension_gate(
        stem in "[a-z]{1,8}",
        ext in "[A-Za-z]{1,4}",
    ) {
        let path = format!("src/{stem}.{ext}");
        let verdict = WatchPolicy::new(["py"], Vec::<String>::new())
            .evaluate(&ChangeEvent::new(path.as_str(), ChangeKind::Modified, Instant::now()));
        prop_assert_eq!(verdict.is_eligible(), ext.eq_ignore_ascii_case("py"));
    }
}
