//! Structured config client: nested named sections of `key value;` pairs,
//! with shell-style comments, plus a renderer used to round-trip the
//! parsed structure.

use pegma::{
    ActionError, Capture, Grammar, GrammarBuilder, ParseConfig, ParseError, Rule, SkipPolicy,
};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
enum Item {
    Str(String),
    Int(i64),
    Bool(bool),
    Id(String),
    Pair { key: String, value: Box<Item> },
    Section { name: String, entries: Vec<Item> },
    Config(Vec<Item>),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Id(id) => write!(f, "{id}"),
            Self::Pair { key, value } => write!(f, "{key} {value};"),
            Self::Section { name, entries } => {
                writeln!(f, "{name} {{")?;
                for entry in entries {
                    writeln!(f, "{entry}")?;
                }
                write!(f, "}}")
            }
            Self::Config(sections) => {
                for section in sections {
                    writeln!(f, "{section}")?;
                }
                Ok(())
            }
        }
    }
}

fn take_value(capture: Option<&Capture<Item>>, what: &str) -> Result<Item, ActionError> {
    capture
        .and_then(Capture::value)
        .cloned()
        .ok_or_else(|| ActionError::new(format!("missing {what}")))
}

fn collect_items(capture: Option<&Capture<Item>>) -> Result<Vec<Item>, ActionError> {
    capture
        .and_then(Capture::list)
        .ok_or_else(|| ActionError::new("missing item list"))?
        .iter()
        .map(|item| {
            item.value()
                .cloned()
                .ok_or_else(|| ActionError::new("unevaluated item"))
        })
        .collect()
}

fn config_grammar() -> Grammar<Item> {
    const IDENT: &str = "[a-zA-Z_][-a-zA-Z0-9_]*";

    GrammarBuilder::new()
        .define(
            "Value",
            Rule::choice([
                (
                    "str",
                    Rule::pattern(r#""[^"]*""#).map(|b| {
                        let text = b.text();
                        Ok(Item::Str(text[1..text.len() - 1].to_string()))
                    }),
                ),
                (
                    "bool",
                    Rule::pattern(r"(?:true|false)\b").map(|b| Ok(Item::Bool(b.text() == "true"))),
                ),
                (
                    "int",
                    Rule::pattern("-?[0-9]+").map(|b| {
                        b.text()
                            .parse::<i64>()
                            .map(Item::Int)
                            .map_err(|e| ActionError::new(format!("invalid integer: {e}")))
                    }),
                ),
                (
                    "id",
                    Rule::pattern("[-a-zA-Z0-9_]+").map(|b| Ok(Item::Id(b.text().to_string()))),
                ),
            ])
            .map(|b| {
                let (_, inner) = b.variant()?;
                inner
                    .value()
                    .cloned()
                    .ok_or_else(|| ActionError::new("unevaluated value"))
            }),
        )
        .define(
            "Pair",
            Rule::sequence([
                Rule::pattern(IDENT).named("key"),
                Rule::reference("Value").named("value"),
                Rule::literal(";"),
            ])
            .map(|b| {
                let key = b
                    .field("key")?
                    .text()
                    .ok_or_else(|| ActionError::new("missing key"))?
                    .to_string();
                let value = take_value(b.capture().field("value"), "pair value")?;
                Ok(Item::Pair {
                    key,
                    value: Box::new(value),
                })
            }),
        )
        .define(
            "Entry",
            Rule::choice([
                ("pair", Rule::reference("Pair")),
                ("section", Rule::reference("Section")),
            ])
            .map(|b| {
                let (_, inner) = b.variant()?;
                inner
                    .value()
                    .cloned()
                    .ok_or_else(|| ActionError::new("unevaluated entry"))
            }),
        )
        .define(
            "Section",
            Rule::sequence([
                Rule::pattern(IDENT).named("name"),
                Rule::literal("{"),
                Rule::star(Rule::reference("Entry")).named("entries"),
                Rule::literal("}"),
            ])
            .map(|b| {
                let name = b
                    .field("name")?
                    .text()
                    .ok_or_else(|| ActionError::new("missing section name"))?
                    .to_string();
                let entries = collect_items(b.capture().field("entries"))?;
                Ok(Item::Section { name, entries })
            }),
        )
        .define(
            "Config",
            Rule::sequence([
                Rule::plus(Rule::reference("Section")).named("sections"),
                Rule::eof(),
            ])
            .map(|b| Ok(Item::Config(collect_items(b.capture().field("sections"))?))),
        )
        .entry("Config")
        .build()
        .expect("config grammar builds")
}

fn config_options() -> ParseConfig {
    ParseConfig {
        skip: SkipPolicy::whitespace().line_comments("#"),
        ..ParseConfig::default()
    }
}

const SAMPLE: &str = r#"# This is a test configuration
section0 {
    string "string";
    flag    true;
    num     100;
    id      section1;
    innersection {
        name "nested sections work";
    }
}
section1 {
    xxx -1;
}
"#;

fn parse_config(input: &str) -> Result<Item, ParseError> {
    let grammar = config_grammar();
    let outcome = grammar.parse_with(input, &config_options())?;
    Ok(outcome.value.into_value().expect("config value"))
}

#[test]
fn parses_nested_sections() {
    let config = parse_config(SAMPLE).expect("sample parses");
    let Item::Config(sections) = &config else {
        panic!("unexpected root: {config:?}");
    };
    assert_eq!(sections.len(), 2);

    let Item::Section { name, entries } = &sections[0] else {
        panic!("unexpected section: {:?}", sections[0]);
    };
    assert_eq!(name, "section0");
    assert_eq!(entries.len(), 5);

    // The outer section's entries include an inner Section node.
    let inner = entries
        .iter()
        .find(|e| matches!(e, Item::Section { .. }))
        .expect("nested section present");
    let Item::Section { name, entries } = inner else {
        unreachable!();
    };
    assert_eq!(name, "innersection");
    assert_eq!(entries.len(), 1);
}

#[test]
fn captures_typed_values() {
    let config = parse_config(SAMPLE).expect("sample parses");
    let Item::Config(sections) = config else {
        panic!("unexpected root");
    };
    let Item::Section { entries, .. } = &sections[0] else {
        panic!("unexpected section");
    };

    let value_of = |key: &str| -> &Item {
        entries
            .iter()
            .find_map(|e| match e {
                Item::Pair { key: k, value } if k == key => Some(value.as_ref()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("missing key {key}"))
    };
    assert_eq!(value_of("string"), &Item::Str("string".to_string()));
    assert_eq!(value_of("flag"), &Item::Bool(true));
    assert_eq!(value_of("num"), &Item::Int(100));
    assert_eq!(value_of("id"), &Item::Id("section1".to_string()));

    let Item::Section { entries, .. } = &sections[1] else {
        panic!("unexpected section");
    };
    assert_eq!(
        entries[0],
        Item::Pair {
            key: "xxx".to_string(),
            value: Box::new(Item::Int(-1)),
        }
    );
}

#[test]
fn renderer_round_trips_to_equal_structure() {
    let config = parse_config(SAMPLE).expect("sample parses");
    let rendered = config.to_string();
    let reparsed = parse_config(&rendered).expect("rendered output parses");
    assert_eq!(config, reparsed);
}

#[test]
fn missing_semicolon_is_reported_at_the_right_place() {
    let input = "s {\n    k 1\n}\n";
    match parse_config(input) {
        Err(ParseError::Mismatch { offset, expected }) => {
            assert_eq!(offset, input.find('}').expect("brace present"));
            assert!(
                expected.iter().any(|e| e.contains(';')),
                "expected: {expected:?}"
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn comments_are_skipped_everywhere() {
    let input = "s { # before\n    k 1; # after\n}\n";
    let config = parse_config(input).expect("parses with comments");
    let Item::Config(sections) = config else {
        panic!("unexpected root");
    };
    assert_eq!(sections.len(), 1);
}
