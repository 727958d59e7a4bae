//! Property tests for destination computation.

use std::path::PathBuf;

use proptest::prelude::*;

use lathe::domain::value_objects::{OutputLayout, RenameRule};

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,7}"
}

fn layout(rename: &str) -> OutputLayout {
    OutputLayout::new(vec![PathBuf::from("/p/src")], PathBuf::from("/p/build"))
        .with_rename(RenameRule::new(rename))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: A destination depends only on path, layout and rename rule,
    /// and always lands inside the output directory.
    #[test]
    fn property_destination_is_pure_and_contained(
        dirs in proptest::collection::vec(segment(), 0..=4),
        name in segment(),
        label in "[a-z]{0,4}",
        rename in prop_oneof![
            Just("{dir}/{name}.{ext}"),
            Just("{dir}/{fname}"),
            Just("flat/{name}.{ext}"),
            Just("{ext}/{dir}/{name}"),
        ],
    ) {
        let mut source = PathBuf::from("/p/src");
        source.extend(&dirs);
        source.push(format!("{}.src", name));

        let first = layout(rename).destination(&source, &name, &label);
        let second = layout(rename).destination(&source, &name, &label);

        prop_assert_eq!(&first, &second);
        prop_assert!(first.starts_with("/p/build"));
        prop_assert!(first.components().all(|c| c.as_os_str() != ".."));
        prop_assert!(!first.to_string_lossy().ends_with('.'));
    }

    /// PROPERTY: The default rule mirrors the source tree.
    #[test]
    fn property_default_rule_mirrors_tree(
        dirs in proptest::collection::vec(segment(), 0..=4),
        name in segment(),
    ) {
        let mut source = PathBuf::from("/p/src");
        source.extend(&dirs);
        source.push(format!("{}.md", name));

        let mut expected = PathBuf::from("/p/build");
        expected.extend(&dirs);
        expected.push(format!("{}.html", name));

        prop_assert_eq!(layout("{dir}/{name}.{ext}").destination(&source, &name, "html"), expected);
    }
}
