//! Property-based tests for module duplication.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use crate::catalog::types::{ModuleContent, PricingType};

fn arb_pricing() -> impl Strategy<Value = PricingType> {
    prop_oneof![
        Just(PricingType::Hourly),
        Just(PricingType::Fixed),
        Just(PricingType::Negotiable),
    ]
}

fn arb_terms() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,12}", 0..6)
}

fn arb_module() -> impl Strategy<Value = ModuleContent> {
    (
        "[A-Z]{2,4}-[0-9]{3}",
        "[A-Za-z ]{1,40}",
        1i64..10_000,
        arb_pricing(),
        prop::option::of(0i64..100_000),
        arb_terms(),
        arb_terms(),
        arb_terms(),
        any::<bool>(),
        "[a-z]{0,10}",
    )
        .prop_map(
            |(code, title, minutes, pricing_type, price, skills, categories, objectives, is_active, level)| {
                ModuleContent {
                    code,
                    title,
                    description: None,
                    duration_hours: Decimal::new(minutes, 2),
                    pricing_type,
                    price: price.map(|p| Decimal::new(p, 2)),
                    objectives,
                    prerequisites: vec![],
                    rncp_code: None,
                    metadata: json!({ "level": level }),
                    skills,
                    categories,
                    is_active,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The copy carries every metadata and taxonomy field of the original.
    #[test]
    fn prop_duplicate_copies_everything(original in arb_module()) {
        let copy = original.duplicate();
        prop_assert_eq!(&copy.description, &original.description);
        prop_assert_eq!(copy.duration_hours, original.duration_hours);
        prop_assert_eq!(copy.pricing_type, original.pricing_type);
        prop_assert_eq!(copy.price, original.price);
        prop_assert_eq!(&copy.objectives, &original.objectives);
        prop_assert_eq!(&copy.prerequisites, &original.prerequisites);
        prop_assert_eq!(&copy.rncp_code, &original.rncp_code);
        prop_assert_eq!(&copy.metadata, &original.metadata);
        prop_assert_eq!(&copy.skills, &original.skills);
        prop_assert_eq!(&copy.categories, &original.categories);
        prop_assert!(copy.code.starts_with(&original.code));
        prop_assert!(copy.title.starts_with(&original.title));
        prop_assert!(!copy.is_active);
    }

    /// Duplicating never mutates the source.
    #[test]
    fn prop_duplicate_leaves_original(original in arb_module()) {
        let snapshot = original.clone();
        let _copy = original.duplicate();
        prop_assert_eq!(original, snapshot);
    }
}
