//! Property-based tests for theory construction and dominance.

use cpref_compiler::normalize::{is_normalized, normalize};
use cpref_compiler::{Theory, TheoryLimits};
use cpref_ir::Tuple;
use proptest::prelude::*;

const ATTRIBUTES: [&str; 3] = ["a", "x", "y"];

fn condition(attribute: &str, kind: u8, value: u8) -> String {
    match kind {
        0 => format!("{attribute} < {}", value + 1),
        1 => format!("{attribute} >= {}", value + 1),
        _ => format!("{attribute} = {value}"),
    }
}

/// Rule text over preference attributes `x` and `y`, with an optional
/// equality or range antecedent and an optional indifferent attribute `c`
/// that no rule constrains.
fn arb_rule() -> impl Strategy<Value = String> {
    (
        0..2usize,
        proptest::option::of((0..3usize, 0..3u8, 0..4u8)),
        (0..3u8, 0..4u8),
        (0..3u8, 0..4u8),
        any::<bool>(),
    )
        .prop_map(|(target, context, (pk, pv), (nk, nv), indifferent)| {
            let attribute = ["x", "y"][target];
            let mut text = String::new();
            if let Some((ci, ck, cv)) = context {
                let context_attribute = ATTRIBUTES[ci];
                if context_attribute != attribute {
                    text.push_str("IF ");
                    text.push_str(&condition(context_attribute, ck, cv));
                    text.push_str(" THEN ");
                }
            }
            text.push_str(&condition(attribute, pk, pv));
            text.push_str(" > ");
            text.push_str(&condition(attribute, nk, nv));
            if indifferent {
                text.push_str(" [c]");
            }
            text
        })
}

fn arb_theory() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_rule(), 1..4).prop_map(|rules| rules.join(" AND "))
}

fn arb_tuple() -> impl Strategy<Value = Tuple> {
    (0..3i32, 0..5i32, 0..5i32, 0..2i32).prop_map(|(a, x, y, c)| {
        Tuple::new()
            .with("a", a)
            .with("x", x)
            .with("y", y)
            .with("c", c)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalization_is_idempotent(text in arb_theory()) {
        let theory = Theory::parse(&text).unwrap();
        prop_assert!(is_normalized(theory.rules()));
        let mut again = normalize(theory.rules().to_vec(), &TheoryLimits::default()).unwrap();
        let mut once = theory.rules().to_vec();
        again.sort();
        once.sort();
        prop_assert_eq!(again, once);
    }

    #[test]
    fn naive_and_compiled_agree(
        text in arb_theory(),
        pairs in proptest::collection::vec((arb_tuple(), arb_tuple()), 1..24),
    ) {
        let theory = Theory::parse(&text).unwrap();
        prop_assume!(theory.is_consistent());
        for (t1, t2) in &pairs {
            let naive = theory.naive_dominates(t1, t2);
            let compiled = theory.compiled_dominates(t1, t2).unwrap();
            prop_assert_eq!(naive, compiled, "{:?} vs {:?} under {}", t1, t2, text);
        }
    }

    #[test]
    fn dominance_is_antisymmetric(
        text in arb_theory(),
        pairs in proptest::collection::vec((arb_tuple(), arb_tuple()), 1..24),
    ) {
        let theory = Theory::parse(&text).unwrap();
        prop_assume!(theory.is_consistent());
        for (t1, t2) in &pairs {
            prop_assert!(
                !(theory.naive_dominates(t1, t2) && theory.naive_dominates(t2, t1)),
                "{:?} and {:?} beat each other under {}", t1, t2, text
            );
            prop_assert!(
                !(theory.compiled_dominates(t1, t2).unwrap()
                    && theory.compiled_dominates(t2, t1).unwrap()),
                "{:?} and {:?} beat each other under {}", t1, t2, text
            );
        }
    }

    #[test]
    fn dominance_is_irreflexive(text in arb_theory(), t in arb_tuple()) {
        let theory = Theory::parse(&text).unwrap();
        prop_assert!(!theory.naive_dominates(&t, &t));
        if theory.is_consistent() {
            prop_assert!(!theory.compiled_dominates(&t, &t).unwrap());
        }
    }
}
