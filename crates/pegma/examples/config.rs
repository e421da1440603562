//! Config Example
//!
//! A configuration format of nested named sections holding `key value;`
//! pairs, with shell-style `#` comments skipped by the whitespace policy.
//! The parsed structure is rendered back to config syntax.

use pegma::{ActionError, Capture, Grammar, GrammarBuilder, ParseConfig, Rule, SkipPolicy};
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
                    writeln!(f, "\t{entry}")?;
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
                let value = b
                    .field("value")?
                    .value()
                    .cloned()
                    .ok_or_else(|| ActionError::new("unevaluated pair value"))?;
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

const SAMPLE: &str = r#"# This is a test configuration
section0 {
    string "string";
    flag    true;
    num     100;
    id      section1;
    innersection {
        name "You can use internal sections";
    }
}
section1 {
    xxx -1;
}
"#;

fn main() {
    let grammar = config_grammar();
    let config = ParseConfig {
        skip: SkipPolicy::whitespace().line_comments("#"),
        ..ParseConfig::default()
    };
    match grammar.parse_with(SAMPLE, &config) {
        Ok(outcome) => {
            let parsed = outcome.value.into_value().expect("config value");
            println!("{parsed}");
        }
        Err(err) => eprintln!("error: {}", err.display_with_source(SAMPLE)),
    }
}
