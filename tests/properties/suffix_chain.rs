//! Property tests for suffix chains and output labels.

use proptest::prelude::*;

use lathe::application::ExtensionRegistry;
use lathe::domain::value_objects::{SuffixChain, MODIFIER_TOKENS};

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("md".to_string()),
        Just("html".to_string()),
        Just("js".to_string()),
        Just("yml".to_string()),
        Just("coffee".to_string()),
        Just("png".to_string()),
        proptest::sample::select(MODIFIER_TOKENS).prop_map(String::from),
        "[a-z]{1,6}",
    ]
}

fn file_name() -> impl Strategy<Value = (String, Vec<String>)> {
    ("[a-z][a-z0-9_-]{0,8}", proptest::collection::vec(token(), 0..=4)).prop_map(|(name, tokens)| {
        let mut file = name.clone();
        for t in &tokens {
            file.push('.');
            file.push_str(t);
        }
        (file, tokens)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Parsing splits the base name from the tokens, in order.
    #[test]
    fn property_chain_preserves_token_order((file, tokens) in file_name()) {
        let chain = SuffixChain::from_file_name(&file);
        prop_assert_eq!(chain.tokens(), tokens.as_slice());
        prop_assert!(!chain.name().contains('.'));
        prop_assert_eq!(chain.full(), tokens.join("."));
    }

    /// PROPERTY: A chain with suffixes always settles to a non-empty label,
    /// and one without suffixes to an empty one.
    #[test]
    fn property_label_empty_iff_chain_empty((file, _) in file_name()) {
        let registry = ExtensionRegistry::with_builtins();
        let chain = SuffixChain::from_file_name(&file);
        let label = registry.predict_label(&chain, &[], &[]);
        prop_assert_eq!(label.is_empty(), chain.is_empty());
    }

    /// PROPERTY: A label is always a suffix of the original dotted chain or a
    /// label some stage declares.
    #[test]
    fn property_label_comes_from_chain_or_stage((file, _) in file_name()) {
        let registry = ExtensionRegistry::with_builtins();
        let chain = SuffixChain::from_file_name(&file);
        let label = registry.predict_label(&chain, &[], &[]);
        prop_assume!(!label.is_empty());

        let declared = registry
            .bindings()
            .any(|(suffix, binding)| label.ends_with(binding.label_for(suffix)));
        let from_chain = chain.tokens().iter().any(|t| label.split('.').any(|part| part == t));
        prop_assert!(declared || from_chain, "label {} for {}", label, file);
    }

    /// PROPERTY: Exempting the settled label expands it to the full suffix.
    #[test]
    fn property_exempt_label_is_full_suffix((file, _) in file_name()) {
        let registry = ExtensionRegistry::with_builtins();
        let chain = SuffixChain::from_file_name(&file);
        let label = registry.predict_label(&chain, &[], &[]);
        prop_assume!(!label.is_empty() && !label.contains('.'));

        let exempt = registry.predict_label(&chain, &[], &[label.clone()]);
        prop_assert!(exempt == chain.full() || exempt == label);
    }
}
