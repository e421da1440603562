//! Property-based tests: determinism, prefix idempotence, and ordered
//! choice, over generated inputs.

use pegma::{ActionError, Capture, Grammar, GrammarBuilder, Rule};
use proptest::prelude::*;

/// Sum/product grammar with left recursion at both precedence levels.
fn arithmetic() -> Grammar<f64> {
    fn fold(b: pegma::Binding<'_, f64>) -> Result<f64, ActionError> {
        let (tag, inner) = b.variant()?;
        if tag == "binary" {
            let lhs = inner
                .field("lhs")
                .and_then(Capture::value)
                .copied()
                .ok_or_else(|| ActionError::new("missing lhs"))?;
            let op = inner
                .field("op")
                .and_then(Capture::text)
                .ok_or_else(|| ActionError::new("missing op"))?
                .to_string();
            let rhs = inner
                .field("rhs")
                .and_then(Capture::value)
                .copied()
                .ok_or_else(|| ActionError::new("missing rhs"))?;
            Ok(match op.as_str() {
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                "*" => lhs * rhs,
                _ => lhs / rhs,
            })
        } else {
            inner
                .value()
                .copied()
                .ok_or_else(|| ActionError::new("missing operand"))
        }
    }

    GrammarBuilder::new()
        .define(
            "Expr",
            Rule::choice([
                (
                    "binary",
                    Rule::sequence([
                        Rule::reference("Expr").named("lhs"),
                        Rule::pattern("[-+]").named("op"),
                        Rule::reference("Term").named("rhs"),
                    ]),
                ),
                ("term", Rule::reference("Term")),
            ])
            .map(fold),
        )
        .define(
            "Term",
            Rule::choice([
                (
                    "binary",
                    Rule::sequence([
                        Rule::reference("Term").named("lhs"),
                        Rule::pattern("[*/]").named("op"),
                        Rule::reference("Atom").named("rhs"),
                    ]),
                ),
                ("atom", Rule::reference("Atom")),
            ])
            .map(fold),
        )
        .define(
            "Atom",
            Rule::choice([
                (
                    "group",
                    Rule::sequence([
                        Rule::literal("("),
                        Rule::reference("Expr").named("inner"),
                        Rule::literal(")"),
                    ]),
                ),
                (
                    "number",
                    Rule::pattern("[0-9]{1,3}").map(|b| {
                        b.text()
                            .parse::<f64>()
                            .map_err(|e| ActionError::new(e.to_string()))
                    }),
                ),
            ])
            .map(|b| {
                let (tag, inner) = b.variant()?;
                let value = if tag == "group" {
                    inner.field("inner").and_then(Capture::value).copied()
                } else {
                    inner.value().copied()
                };
                value.ok_or_else(|| ActionError::new("missing atom value"))
            }),
        )
        .entry("Expr")
        .build()
        .expect("arithmetic grammar builds")
}

/// Well-formed arithmetic expressions as strings.
fn arb_expression() -> impl Strategy<Value = String> {
    let leaf = "[0-9]{1,3}".prop_map(|digits| digits);
    leaf.prop_recursive(4, 48, 3, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")],
                inner.clone(),
            )
                .prop_map(|(lhs, op, rhs)| format!("{lhs} {op} {rhs}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

proptest! {
    #[test]
    fn parsing_is_deterministic(expr in arb_expression()) {
        let grammar = arithmetic();
        let first = grammar.parse(&expr).expect("generated input parses");
        let second = grammar.parse(&expr).expect("generated input parses");
        prop_assert_eq!(first.consumed, second.consumed);
        let a = first.value.into_value().expect("value");
        let b = second.value.into_value().expect("value");
        prop_assert!(same_value(a, b), "{} != {}", a, b);
    }

    #[test]
    fn reparsing_the_consumed_prefix_is_idempotent(
        expr in arb_expression(),
        tail in "[ a-z?!]{0,8}",
    ) {
        let grammar = arithmetic();
        let input = format!("{expr}{tail}");
        let first = grammar.parse(&input).expect("generated input parses");
        let prefix = &input[..first.consumed];
        let second = grammar.parse(prefix).expect("consumed prefix parses");
        prop_assert_eq!(second.consumed, first.consumed);
        let a = first.value.into_value().expect("value");
        let b = second.value.into_value().expect("value");
        prop_assert!(same_value(a, b), "{} != {}", a, b);
    }

    #[test]
    fn ordered_choice_prefers_the_first_alternative(word in "[a-z]{2,6}") {
        // Both alternatives match at position zero; the first must win even
        // though the second consumes more.
        let prefix = word[..1].to_string();
        let grammar: Grammar<()> = GrammarBuilder::new()
            .define(
                "Start",
                Rule::choice([
                    ("prefix", Rule::literal(prefix.clone())),
                    ("word", Rule::literal(word.clone())),
                ]),
            )
            .entry("Start")
            .build()
            .expect("grammar builds");
        let outcome = grammar.parse(&word).expect("word parses");
        prop_assert_eq!(outcome.consumed, prefix.len());
        let (tag, _) = outcome.value.into_variant().expect("variant");
        prop_assert_eq!(tag.as_str(), "prefix");
    }

    #[test]
    fn zero_repetitions_consume_nothing(noise in "[A-Z]{0,5}") {
        let grammar: Grammar<()> = GrammarBuilder::new()
            .define("Start", Rule::star(Rule::literal("x")))
            .entry("Start")
            .build()
            .expect("grammar builds");
        let outcome = grammar.parse(&noise).expect("star never fails");
        prop_assert_eq!(outcome.consumed, 0);
        prop_assert_eq!(outcome.value.into_list().expect("list").len(), 0);
    }
}
