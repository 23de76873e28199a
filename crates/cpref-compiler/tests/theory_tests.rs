use cpref_compiler::normalize::{is_normalized, normalize};
use cpref_compiler::{Inconsistency, Theory, TheoryError, TheoryLimits};
use cpref_ir::{Tuple, Value};

fn tuple(pairs: &[(&str, Value)]) -> Tuple {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

/// Every combination of region, price, brand and color values.
fn shop_tuples() -> Vec<Tuple> {
    let mut tuples = Vec::new();
    for region in ["us", "eu"] {
        for price in [50, 80, 150] {
            for brand in ["a", "b", "c"] {
                for color in ["red", "blue"] {
                    tuples.push(
                        Tuple::new()
                            .with("region", region)
                            .with("price", price)
                            .with("brand", brand)
                            .with("color", color),
                    );
                }
            }
        }
    }
    tuples
}

#[test]
fn test_conditional_price_preference() {
    let theory = Theory::parse("IF region = 'US' THEN price < 100 > price >= 100").unwrap();
    assert!(theory.is_consistent());

    let cheap_us = tuple(&[("region", "US".into()), ("price", 50.into())]);
    let pricey_us = tuple(&[("region", "US".into()), ("price", 150.into())]);
    let cheap_eu = tuple(&[("region", "EU".into()), ("price", 50.into())]);

    assert!(theory.naive_dominates(&cheap_us, &pricey_us));
    assert!(theory.compiled_dominates(&cheap_us, &pricey_us).unwrap());
    assert!(!theory.naive_dominates(&cheap_us, &cheap_eu));
    assert!(!theory.compiled_dominates(&cheap_us, &cheap_eu).unwrap());
    assert!(!theory.naive_dominates(&pricey_us, &cheap_us));
    assert!(!theory.compiled_dominates(&pricey_us, &cheap_us).unwrap());
}

#[test]
fn test_equal_tuples_never_dominate() {
    let theory = Theory::parse("x = 1 > x = 2").unwrap();
    let t = tuple(&[("x", 1.into())]);
    assert!(!theory.naive_dominates(&t, &t));
    assert!(!theory.compiled_dominates(&t, &t).unwrap());
}

#[test]
fn test_attribute_mismatch_is_not_dominance() {
    let theory = Theory::parse("x = 1 > x = 2").unwrap();
    let t1 = tuple(&[("x", 1.into()), ("y", 0.into())]);
    let t2 = tuple(&[("x", 2.into())]);
    assert!(!theory.naive_dominates(&t1, &t2));
    assert!(!theory.compiled_dominates(&t1, &t2).unwrap());
}

#[test]
fn test_opposite_preferences_are_locally_inconsistent() {
    let theory = Theory::parse("x = 'a' > x = 'b' AND x = 'b' > x = 'a'").unwrap();
    assert!(!theory.is_consistent());
    assert_eq!(
        theory.inconsistency(),
        Some(&Inconsistency::Local {
            attribute: "x".into()
        })
    );
    assert!(theory.comparisons().is_empty());
    assert_eq!(theory.len(), 2);

    let a = tuple(&[("x", "a".into())]);
    let b = tuple(&[("x", "b".into())]);
    assert!(matches!(
        theory.compiled_dominates(&a, &b),
        Err(TheoryError::Inconsistent(Inconsistency::Local { .. }))
    ));
    // the naive test only needs the rules
    assert!(theory.naive_dominates(&a, &b));
}

#[test]
fn test_overlapping_contexts_are_combined() {
    let theory =
        Theory::parse("IF a = 1 THEN x = 1 > x = 2 AND IF b = 1 THEN x = 2 > x = 1").unwrap();
    assert!(matches!(
        theory.inconsistency(),
        Some(Inconsistency::Local { attribute }) if attribute == "x"
    ));
}

#[test]
fn test_conflicting_contexts_stay_apart() {
    let theory =
        Theory::parse("IF a = 1 THEN x = 1 > x = 2 AND IF a = 2 THEN x = 2 > x = 1").unwrap();
    assert!(theory.is_consistent());
    assert_eq!(theory.comparisons().len(), 2);

    let t = |a: i32, x: i32| tuple(&[("a", a.into()), ("x", x.into())]);
    assert!(theory.compiled_dominates(&t(1, 1), &t(1, 2)).unwrap());
    assert!(theory.compiled_dominates(&t(2, 2), &t(2, 1)).unwrap());
    assert!(!theory.compiled_dominates(&t(1, 2), &t(1, 1)).unwrap());
}

#[test]
fn test_mutual_dependency_is_globally_inconsistent() {
    let theory =
        Theory::parse("IF a = 1 THEN b = 1 > b = 2 AND IF b = 1 THEN a = 1 > a = 2").unwrap();
    assert!(matches!(
        theory.inconsistency(),
        Some(Inconsistency::Global { .. })
    ));
    assert!(theory.ensure_consistent().is_err());
}

#[test]
fn test_indifference_cycle_is_globally_inconsistent() {
    let theory = Theory::parse("x = 1 > x = 2 [y] AND y = 1 > y = 2 [x]").unwrap();
    assert!(matches!(
        theory.inconsistency(),
        Some(Inconsistency::Global { .. })
    ));
}

#[test]
fn test_normalization_splits_overlapping_antecedents() {
    let theory =
        Theory::parse("IF 1 < a < 9 THEN x = 1 > x = 2 AND IF 2 < a < 10 THEN x = 2 > x = 3")
            .unwrap();
    assert_eq!(theory.len(), 4);
    assert!(is_normalized(theory.rules()));
    assert!(theory.is_consistent());

    let again = normalize(theory.rules().to_vec(), &TheoryLimits::default()).unwrap();
    assert_eq!(again, theory.rules());
}

#[test]
fn test_chain_comparisons_are_closed_and_sorted() {
    let theory = Theory::parse("x = 1 > x = 2 AND x = 2 > x = 3").unwrap();
    let shown: Vec<String> = theory.comparisons().iter().map(|c| c.to_string()).collect();
    assert_eq!(
        shown,
        vec![
            "(x = 1) > (x = 2)",
            "(x = 1) > (x = 3)",
            "(x = 2) > (x = 3)",
        ]
    );
    let one = tuple(&[("x", 1.into())]);
    let three = tuple(&[("x", 3.into())]);
    assert!(theory.compiled_dominates(&one, &three).unwrap());
    assert!(theory.naive_dominates(&one, &three));
}

#[test]
fn test_cross_attribute_chain() {
    let theory = Theory::parse("x = 1 > x = 2 AND IF x = 2 THEN y = 1 > y = 2").unwrap();
    let t1 = tuple(&[("x", 1.into()), ("y", 1.into())]);
    let t2 = tuple(&[("x", 2.into()), ("y", 2.into())]);
    assert!(theory.naive_dominates(&t1, &t2));
    assert!(theory.compiled_dominates(&t1, &t2).unwrap());
    assert!(!theory.compiled_dominates(&t2, &t1).unwrap());
}

#[test]
fn test_attribute_sets() {
    let theory = Theory::from_json(include_str!("fixtures/shop.json")).unwrap();
    let names = |set: &std::collections::BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>();
    assert_eq!(names(theory.antecedent_attributes()), vec!["region"]);
    assert_eq!(names(theory.preference_attributes()), vec!["brand", "price"]);
    assert_eq!(names(theory.indifferent_attributes()), vec!["color"]);
    // every partial assignment over brand (3), price (2) and region (2)
    assert_eq!(theory.formulas().len(), 35);
}

#[test]
fn test_naive_and_compiled_agree_on_shop_theory() {
    let theory = Theory::from_json(include_str!("fixtures/shop.json")).unwrap();
    assert!(theory.is_consistent());
    let tuples = shop_tuples();
    for t1 in &tuples {
        for t2 in &tuples {
            let naive = theory.naive_dominates(t1, t2);
            let compiled = theory.compiled_dominates(t1, t2).unwrap();
            assert_eq!(naive, compiled, "{t1:?} vs {t2:?}");
            if naive {
                assert!(!theory.naive_dominates(t2, t1), "{t1:?} and {t2:?} dominate each other");
            }
        }
    }
}

#[test]
fn test_shop_theory_dominance() {
    let theory = Theory::from_json(include_str!("fixtures/shop.json")).unwrap();
    let t = |region: &str, price: i32, brand: &str, color: &str| {
        Tuple::new()
            .with("region", region)
            .with("price", price)
            .with("brand", brand)
            .with("color", color)
    };
    // brand chain frees color on its second step
    assert!(theory.compiled_dominates(&t("us", 50, "b", "red"), &t("us", 150, "c", "blue")).unwrap());
    assert!(theory.compiled_dominates(&t("us", 50, "a", "red"), &t("us", 150, "c", "blue")).unwrap());
    // a -> b keeps color fixed
    assert!(!theory.compiled_dominates(&t("us", 50, "a", "red"), &t("us", 150, "b", "blue")).unwrap());
    // prices inside the same interval must still match
    assert!(!theory.compiled_dominates(&t("us", 50, "a", "red"), &t("us", 80, "b", "red")).unwrap());
    // the reversed price preference in the EU
    assert!(theory.compiled_dominates(&t("eu", 150, "a", "red"), &t("eu", 50, "a", "red")).unwrap());
}

#[test]
fn test_build_errors() {
    assert!(matches!(
        Theory::parse("x = 1 >"),
        Err(cpref_compiler::BuildError::Parse(_))
    ));
    assert!(matches!(
        Theory::parse("x = 1 > x = 2 AND x = 1 > y = 2"),
        Err(cpref_compiler::BuildError::Rule { index: 1, .. })
    ));
    let tight = TheoryLimits {
        max_formulas: 3,
        ..Default::default()
    };
    let rules = cpref_ir::parse::parse_rules("IF a = 1 THEN x = 1 > x = 2").unwrap();
    assert!(matches!(
        Theory::build_with_limits(&rules, tight),
        Err(cpref_compiler::BuildError::LimitExceeded(_))
    ));
}

#[test]
fn test_derivation_budget_gives_up() {
    let limits = TheoryLimits {
        max_derived_tuples: 1,
        ..Default::default()
    };
    let rules =
        cpref_ir::parse::parse_rules("x = 1 > x = 2 AND x = 2 > x = 3 AND x = 3 > x = 4").unwrap();
    let theory = Theory::build_with_limits(&rules, limits).unwrap();
    let one = tuple(&[("x", 1.into())]);
    let four = tuple(&[("x", 4.into())]);
    assert!(!theory.naive_dominates(&one, &four));
    assert!(theory.compiled_dominates(&one, &four).unwrap());
}

#[test]
fn test_budget_is_checked_as_states_are_derived() {
    let limits = TheoryLimits {
        max_derived_tuples: 2,
        ..Default::default()
    };
    let rules = cpref_ir::parse::parse_rules("x = 1 > x = 2 AND y = 1 > y = 2 AND z = 1 > z = 2")
        .unwrap();
    let theory = Theory::build_with_limits(&rules, limits).unwrap();
    let t1 = tuple(&[("x", 1.into()), ("y", 1.into()), ("z", 1.into())]);
    let t2 = tuple(&[("x", 1.into()), ("y", 1.into()), ("z", 2.into())]);
    // the y flip overruns the budget before the z flip is tried
    assert!(!theory.naive_dominates(&t1, &t2));
    assert!(theory.compiled_dominates(&t1, &t2).unwrap());
    let unlimited = Theory::build(&rules).unwrap();
    assert!(unlimited.naive_dominates(&t1, &t2));
}

#[test]
fn test_range_antecedent_keeps_its_attribute_fixed() {
    let theory = Theory::parse("IF a < 10 THEN b = 1 > b = 2").unwrap();
    let t1 = tuple(&[("a", 5.into()), ("b", 1.into())]);
    let t2 = tuple(&[("a", 7.into()), ("b", 2.into())]);
    assert!(!theory.naive_dominates(&t1, &t2));
    assert!(!theory.compiled_dominates(&t1, &t2).unwrap());

    let same_a = tuple(&[("a", 5.into()), ("b", 2.into())]);
    assert!(theory.naive_dominates(&t1, &same_a));
    assert!(theory.compiled_dominates(&t1, &same_a).unwrap());
}

#[test]
fn test_chain_frees_only_the_last_rules_indifference() {
    let theory = Theory::parse("a = 1 > a = 2 [c] AND a = 2 > a = 3 [d]").unwrap();
    let shown: Vec<String> = theory.comparisons().iter().map(|c| c.to_string()).collect();
    assert!(
        shown.contains(&"(a = 1)[c] > (a = 3)[d]".to_string()),
        "{shown:?}"
    );

    let t1 = tuple(&[("a", 1.into()), ("c", 0.into()), ("d", 0.into())]);
    let t2 = tuple(&[("a", 3.into()), ("c", 1.into()), ("d", 1.into())]);
    assert!(theory.naive_dominates(&t1, &t2));
    assert!(theory.compiled_dominates(&t1, &t2).unwrap());
}

#[test]
fn test_dropped_indifference_stays_free_along_a_chain() {
    let theory = Theory::parse("x = 1 > x = 2 AND x = 2 > x = 3 [d] AND x = 3 > x = 4").unwrap();
    let t1 = tuple(&[("x", 1.into()), ("d", 0.into())]);
    let t4 = tuple(&[("x", 4.into()), ("d", 1.into())]);
    assert!(theory.naive_dominates(&t1, &t4));
    assert!(theory.compiled_dominates(&t1, &t4).unwrap());

    // the first step alone does not free d
    let t2 = tuple(&[("x", 2.into()), ("d", 1.into())]);
    assert!(!theory.naive_dominates(&t1, &t2));
    assert!(!theory.compiled_dominates(&t1, &t2).unwrap());
}

#[test]
fn test_interval_restored_by_a_chain_is_still_free() {
    let theory = Theory::parse(
        "IF y = 1 THEN x < 4 > x >= 4 AND IF y = 2 THEN x >= 4 > x < 4 AND y = 1 > y = 2",
    )
    .unwrap();
    assert!(theory.is_consistent());
    let t1 = tuple(&[("x", 0.into()), ("y", 1.into())]);
    let t2 = tuple(&[("x", 2.into()), ("y", 2.into())]);
    assert!(theory.naive_dominates(&t1, &t2));
    assert!(theory.compiled_dominates(&t1, &t2).unwrap());

    let mut tuples = Vec::new();
    for x in 0..6 {
        for y in 1..3 {
            tuples.push(tuple(&[("x", x.into()), ("y", y.into())]));
        }
    }
    for t1 in &tuples {
        for t2 in &tuples {
            assert_eq!(
                theory.naive_dominates(t1, t2),
                theory.compiled_dominates(t1, t2).unwrap(),
                "{t1:?} vs {t2:?}"
            );
        }
    }
}

#[test]
fn test_display_round_trips() {
    let text = "IF region = 'US' THEN price < 100 > price >= 100 [color] AND brand = 'a' > brand = 'b'";
    let theory = Theory::parse(text).unwrap();
    let reparsed = Theory::parse(&theory.to_string()).unwrap();
    assert_eq!(reparsed.rules(), theory.rules());
}

#[test]
fn test_theory_serializes() {
    let theory = Theory::parse("x = 1 > x = 2").unwrap();
    let json = serde_json::to_value(&theory).unwrap();
    assert_eq!(json["comparisons"].as_array().unwrap().len(), 1);
    assert!(json["inconsistency"].is_null());
}
