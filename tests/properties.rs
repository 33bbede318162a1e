//! Property tests for rbgen.
//!
//! Properties use randomized input generation to protect invariants like
//! "translation is deterministic" and "package names map cleanly onto
//! directory chains".

use std::path::Path;

use proptest::prelude::*;

use rbgen::{BuildTree, ChangeDetector, ClassBindingTranslator, OutputUnit, Translator};

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,8}").unwrap()
}

fn const_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z][A-Za-z0-9_]{0,8}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: dotted and slash-separated package names split to the same
    /// segments, and no segment is ever empty.
    #[test]
    fn property_package_segments_separator_agnostic(
        segments in proptest::collection::vec(segment(), 0..=5),
    ) {
        let dotted = segments.join(".");
        let slashed = segments.join("/");

        let from_dotted = BuildTree::package_segments(&dotted);
        let from_slashed = BuildTree::package_segments(&slashed);

        prop_assert_eq!(&from_dotted, &from_slashed);
        prop_assert_eq!(from_dotted.len(), segments.len());
        prop_assert!(from_dotted.iter().all(|s| !s.is_empty()));
    }

    /// PROPERTY: a unit's file path always sits under the package chain and
    /// ends with the simple name plus the host extension.
    #[test]
    fn property_unit_path_mirrors_package(
        segments in proptest::collection::vec(segment(), 0..=4),
        name in const_name(),
    ) {
        let package = segments.join(".");
        let qualified = if package.is_empty() {
            name.clone()
        } else {
            format!("{package}.{name}")
        };
        let unit = OutputUnit::new(qualified, package, "");

        let tree = BuildTree::new("build", "java");
        let path = tree.unit_path(&unit);

        let mut expected = std::path::PathBuf::from("build");
        for s in &segments {
            expected.push(s);
        }
        expected.push(format!("{name}.java"));
        prop_assert_eq!(path, expected);
    }

    /// PROPERTY: the candidate filter accepts exactly the source-rooted
    /// paths with the source extension.
    #[test]
    fn property_candidate_filter(
        dirs in proptest::collection::vec(segment(), 0..=3),
        stem in segment(),
        under_root in any::<bool>(),
        ruby_ext in any::<bool>(),
    ) {
        let mut path = std::path::PathBuf::from(if under_root { "src" } else { "lib" });
        for d in &dirs {
            path.push(d);
        }
        path.push(format!("{stem}.{}", if ruby_ext { "rb" } else { "txt" }));

        let detector = ChangeDetector::new("src", "rb");
        prop_assert_eq!(detector.is_candidate_path(&path), under_root && ruby_ext);
    }

    /// PROPERTY: translation is a pure function of (source, script name):
    /// two runs, on the same or fresh translator instances, emit identical
    /// bytes.
    #[test]
    fn property_translation_deterministic(
        module in const_name(),
        class in const_name(),
        body_lines in proptest::collection::vec("[a-z @=0-9'\"\\\\]{0,20}", 0..=6),
    ) {
        let mut source = format!("module {module}\n  class {class}\n");
        for line in &body_lines {
            // Indent as a comment so arbitrary text cannot open blocks
            source.push_str(&format!("    # {line}\n"));
        }
        source.push_str("  end\nend\n");

        let translator = ClassBindingTranslator::new();
        let first = translator.translate(&source, "pkg/gen.rb");
        let second = translator.translate(&source, "pkg/gen.rb");
        let fresh = ClassBindingTranslator::new().translate(&source, "pkg/gen.rb");

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &fresh);

        let units = first.unwrap();
        prop_assert_eq!(units.len(), 1);
        prop_assert_eq!(units[0].package.as_str(), module.to_lowercase());
    }
}

#[test]
fn property_suite_smoke() {
    // Anchor for the filter in CI: `cargo test --test properties`
    let detector = ChangeDetector::new("src", "rb");
    assert!(detector.is_candidate_path(Path::new("src/a.rb")));
}
