//! Calculator Example
//!
//! A left-recursive arithmetic grammar evaluated with semantic actions:
//!
//! Expression := Expression [+-] Production | Production
//! Production := Production [*/%] Atom | Atom
//! Atom       := '(' Expression ')' | Number
//!
//! Run with an expression argument, or without one for a small demo:
//!
//! ```sh
//! cargo run --example calculator -- "1 + 2 * 3"
//! ```

use pegma::{ActionError, Binding, Capture, Grammar, GrammarBuilder, Rule};

const NUMBER: &str = r"(?:[0-9]+\.[0-9]*|\.?[0-9]+)(?:[eE][-+]?[0-9]+)?";

fn apply(op: &str, lhs: f64, rhs: f64) -> Result<f64, ActionError> {
    match op {
        "+" => Ok(lhs + rhs),
        "-" => Ok(lhs - rhs),
        "*" => Ok(lhs * rhs),
        "/" => Ok(lhs / rhs),
        "%" => Ok(((lhs as u64) % (rhs as u64)) as f64),
        other => Err(ActionError::new(format!("unknown operator `{other}`"))),
    }
}

fn fold(binding: Binding<'_, f64>) -> Result<f64, ActionError> {
    let (tag, inner) = binding.variant()?;
    if tag == "binary" {
        let lhs = inner
            .field("lhs")
            .and_then(Capture::value)
            .copied()
            .ok_or_else(|| ActionError::new("missing lhs"))?;
        let op = inner
            .field("op")
            .and_then(Capture::text)
            .ok_or_else(|| ActionError::new("missing operator"))?
            .to_string();
        let rhs = inner
            .field("rhs")
            .and_then(Capture::value)
            .copied()
            .ok_or_else(|| ActionError::new("missing rhs"))?;
        apply(&op, lhs, rhs)
    } else {
        inner
            .value()
            .copied()
            .ok_or_else(|| ActionError::new("missing operand"))
    }
}

fn calculator() -> Grammar<f64> {
    GrammarBuilder::new()
        .define(
            "Expression",
            Rule::choice([
                (
                    "binary",
                    Rule::sequence([
                        Rule::reference("Expression").named("lhs"),
                        Rule::pattern("[-+]").named("op"),
                        Rule::reference("Production").named("rhs"),
                    ]),
                ),
                ("production", Rule::reference("Production")),
            ])
            .map(fold),
        )
        .define(
            "Production",
            Rule::choice([
                (
                    "binary",
                    Rule::sequence([
                        Rule::reference("Production").named("lhs"),
                        Rule::pattern("[*/%]").named("op"),
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
                        Rule::reference("Expression").named("inner"),
                        Rule::literal(")"),
                    ]),
                ),
                (
                    "number",
                    Rule::pattern(NUMBER).map(|b| {
                        b.text()
                            .parse::<f64>()
                            .map_err(|e| ActionError::new(format!("invalid number: {e}")))
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
        .entry("Expression")
        .build()
        .expect("calculator grammar builds")
}

fn evaluate(grammar: &Grammar<f64>, input: &str) {
    match grammar.parse(input) {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                eprintln!("warning: {warning}");
            }
            let value = outcome.value.into_value().expect("evaluated value");
            println!("{input} == {value}");
        }
        Err(err) => eprintln!("error: {}", err.display_with_source(input)),
    }
}

fn main() {
    let grammar = calculator();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        evaluate(&grammar, "2 * 2");
        evaluate(&grammar, "1 + 2 * 3 - 4 / 5.0 / .333e-1");
        evaluate(&grammar, "(1 + 2) * 3");
    } else {
        for arg in &args {
            evaluate(&grammar, arg);
        }
    }
}
