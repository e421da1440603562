//! JSON Example
//!
//! The json.org grammar as a client of the engine, producing a document
//! tree through semantic actions. Demonstrates both trailing-input
//! policies and running with the packrat cache disabled.

use pegma::{ActionError, Capture, Grammar, GrammarBuilder, ParseConfig, Rule};

#[derive(Clone, Debug, PartialEq)]
enum Json {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Json>),
    Object(Vec<(String, Json)>),
}

const STRING: &str = r#""(?:\\.|[^"\\])*""#;
const NUMBER: &str = r"-?(?:[1-9][0-9]*|0)(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?";

fn unescape(quoted: &str) -> Result<String, ActionError> {
    let body = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| ActionError::new(format!("invalid \\u escape `{hex}`")))?;
                out.push(
                    char::from_u32(code)
                        .ok_or_else(|| ActionError::new(format!("invalid code point {code}")))?,
                );
            }
            other => {
                return Err(ActionError::new(format!(
                    "invalid escape sequence {other:?}"
                )))
            }
        }
    }
    Ok(out)
}

fn json_grammar() -> Grammar<Json> {
    GrammarBuilder::new()
        .define(
            "String",
            Rule::pattern(STRING).map(|b| unescape(b.text()).map(Json::Str)),
        )
        .define(
            "Number",
            Rule::pattern(NUMBER).map(|b| {
                b.text()
                    .parse::<f64>()
                    .map(Json::Number)
                    .map_err(|e| ActionError::new(format!("invalid number: {e}")))
            }),
        )
        .define(
            "Member",
            Rule::sequence([
                Rule::reference("String").named("key"),
                Rule::literal(":"),
                Rule::reference("Value").named("value"),
            ]),
        )
        .define(
            "Object",
            Rule::sequence([
                Rule::literal("{"),
                Rule::separated(Rule::reference("Member"), Rule::literal(","), 0)
                    .named("members"),
                Rule::literal("}"),
            ])
            .map(|b| {
                let members = b
                    .field("members")?
                    .list()
                    .ok_or_else(|| ActionError::new("missing member list"))?;
                let mut object = Vec::with_capacity(members.len());
                for member in members {
                    let key = match member.field("key").and_then(Capture::value) {
                        Some(Json::Str(key)) => key.clone(),
                        other => {
                            return Err(ActionError::new(format!("bad member key: {other:?}")))
                        }
                    };
                    if object.iter().any(|(existing, _)| *existing == key) {
                        return Err(ActionError::new(format!("duplicate key \"{key}\"")));
                    }
                    let value = member
                        .field("value")
                        .and_then(Capture::value)
                        .cloned()
                        .ok_or_else(|| ActionError::new("unevaluated member value"))?;
                    object.push((key, value));
                }
                Ok(Json::Object(object))
            }),
        )
        .define(
            "Array",
            Rule::sequence([
                Rule::literal("["),
                Rule::separated(Rule::reference("Value"), Rule::literal(","), 0)
                    .named("elements"),
                Rule::literal("]"),
            ])
            .map(|b| {
                let elements = b
                    .field("elements")?
                    .list()
                    .ok_or_else(|| ActionError::new("missing element list"))?
                    .iter()
                    .map(|item| {
                        item.value()
                            .cloned()
                            .ok_or_else(|| ActionError::new("unevaluated element"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Json::Array(elements))
            }),
        )
        .define(
            "Value",
            Rule::choice([
                ("string", Rule::reference("String")),
                ("object", Rule::reference("Object")),
                ("array", Rule::reference("Array")),
                ("number", Rule::reference("Number")),
                ("true", Rule::literal("true")),
                ("false", Rule::literal("false")),
                ("null", Rule::literal("null")),
            ])
            .map(|b| match b.variant()? {
                ("true", _) => Ok(Json::Bool(true)),
                ("false", _) => Ok(Json::Bool(false)),
                ("null", _) => Ok(Json::Null),
                (_, inner) => inner
                    .value()
                    .cloned()
                    .ok_or_else(|| ActionError::new("unevaluated value")),
            }),
        )
        .entry("Object")
        .build()
        .expect("json grammar builds")
}

const SAMPLE: &str = r#"  {
    "test": 123,
    "obj": {
        "bool": false,
        "nil": null
    },
    "array": [
        1234.5435e-2,
        {
            "xxx": "yyy"
        }
    ]
}"#;

fn main() {
    let grammar = json_grammar();

    match grammar.parse(SAMPLE) {
        Ok(outcome) => {
            println!("parsed {} bytes in {:?}", outcome.consumed, outcome.metrics.parse_time);
            println!("{:#?}", outcome.value.into_value().expect("json value"));
        }
        Err(err) => eprintln!("error: {}", err.display_with_source(SAMPLE)),
    }

    // One of the original clients runs with the packrat cache disabled.
    let uncached = ParseConfig {
        memoization: false,
        ..ParseConfig::default()
    };
    let outcome = grammar
        .parse_with(SAMPLE, &uncached)
        .expect("uncached parse succeeds");
    println!(
        "uncached: {} rule evaluations, {} memo hits",
        outcome.metrics.rules_evaluated, outcome.metrics.memo_hits
    );

    // Strict mode: trailing input is an error rather than a warning.
    let strict = ParseConfig {
        require_full_consumption: true,
        ..ParseConfig::default()
    };
    match grammar.parse_with(r#"{"a": 1} trailing"#, &strict) {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("strict mode: {err}"),
    }
}
