//! Property tests for front matter extraction.

use std::path::Path;

use proptest::prelude::*;

use lathe::parse_source;
use lathe::parser::extract_frontmatter;

fn small_line() -> impl Strategy<Value = String> {
    // Small printable lines that are never a delimiter
    proptest::string::string_regex("[A-Za-z0-9 _#\\-]{0,40}")
        .unwrap()
        .prop_filter("not a delimiter", |s| s.trim_end() != "---")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: The body after a closed block is returned byte for byte.
    #[test]
    fn property_body_survives_extraction(
        yaml_lines in proptest::collection::vec(small_line(), 0..=6),
        body in "[A-Za-z0-9 \\n#*_]{0,200}",
    ) {
        let mut content = String::from("---\n");
        for line in &yaml_lines {
            content.push_str(line);
            content.push('\n');
        }
        content.push_str("---\n");
        content.push_str(&body);

        let extracted = extract_frontmatter(&content, Path::new("a.md")).unwrap().unwrap();
        prop_assert_eq!(extracted.body, body);
        prop_assert_eq!(extracted.end_line, yaml_lines.len() + 2);
    }

    /// PROPERTY: Text that does not open with a delimiter is all body.
    #[test]
    fn property_no_frontmatter_means_whole_body(content in "[A-Za-z0-9 \\n#]{0,200}") {
        prop_assume!(!content.starts_with("---"));
        let parsed = parse_source(&content, Path::new("page.md")).unwrap();
        prop_assert_eq!(parsed.body, content);
        prop_assert!(parsed.data.as_object().is_some_and(|m| m.is_empty()));
    }

    /// PROPERTY: Arbitrary input never panics the parser.
    #[test]
    fn property_parse_never_panics(content in "\\PC{0,300}") {
        let _ = parse_source(&content, Path::new("page.html"));
        let _ = parse_source(&content, Path::new("data.yml"));
    }
}
