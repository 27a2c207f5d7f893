//! Command language parser using Pest
//!
//! The engine only depends on the [`CommandParser`] trait; `PestCommandParser`
//! is the stock implementation of the command grammar in `command.pest`.

use crate::graph::{DataAttachment, EdgeKey, EdgeType, TagCommand, TagKey};
use crate::query::ast::*;
use bytes::Bytes;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "query/command.pest"]
struct CommandGrammar;

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] pest::error::Error<Rule>),

    /// Semantic error
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Turns command text into typed commands
pub trait CommandParser: Send + Sync {
    fn parse(&self, text: &str) -> ParseResult<Vec<Command>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PestCommandParser;

impl CommandParser for PestCommandParser {
    fn parse(&self, text: &str) -> ParseResult<Vec<Command>> {
        parse_script(text)
    }
}

/// Parse a `;` separated script
pub fn parse_script(input: &str) -> ParseResult<Vec<Command>> {
    let pairs = CommandGrammar::parse(Rule::script, input)?;

    let mut commands = Vec::new();
    for pair in pairs {
        if pair.as_rule() != Rule::script {
            continue;
        }
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::statement => commands.push(parse_statement(inner)?),
                Rule::EOI => break,
                _ => {}
            }
        }
    }
    Ok(commands)
}

fn parse_statement(pair: Pair<Rule>) -> ParseResult<Command> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::SemanticError("Empty statement".to_string()))?;
    match inner.as_rule() {
        Rule::node_stmt => parse_node_statement(inner),
        Rule::edge_stmt => parse_edge_statement(inner),
        Rule::delete_search_stmt => parse_delete_search(inner),
        Rule::select_stmt => parse_select(inner),
        rule => Err(ParseError::SemanticError(format!(
            "Unexpected statement {:?}",
            rule
        ))),
    }
}

fn parse_node_statement(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut verb = String::new();
    let mut key = None;
    let mut if_exist = false;
    let mut command = NodeCommand::default();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::verb => verb = inner.as_str().to_lowercase(),
            Rule::key_clause => key = Some(first_value(inner)?),
            Rule::set_clause => command.tags.extend(parse_tag_list(inner)?),
            Rule::index_clause => {
                for (remove, name) in parse_name_list(inner) {
                    let tag = TagKey::from(name);
                    command.indexes.push(if remove {
                        IndexCommand::Remove(tag)
                    } else {
                        IndexCommand::Add(tag)
                    });
                }
            }
            Rule::foreignkey_clause => {
                for tag in parse_tag_list(inner)? {
                    command.foreign_keys.push(match tag {
                        TagCommand::Remove { key } => {
                            ForeignKeyCommand::Remove(EdgeType::new(key.as_str()))
                        }
                        TagCommand::Set { key, value } => {
                            ForeignKeyCommand::declare(key.as_str(), value.as_deref())
                        }
                    });
                }
            }
            Rule::data_clause => command.data.push(parse_data_clause(inner)?),
            Rule::link_clause => {
                for value in inner.into_inner().filter(|p| p.as_rule() == Rule::value) {
                    command.links.push(value_text(value));
                }
            }
            Rule::ifexist_clause => if_exist = true,
            Rule::alias => command.alias = Some(inner.as_str().to_string()),
            _ => {}
        }
    }

    let key = key.ok_or_else(|| ParseError::SemanticError("Missing node key".to_string()))?;
    command.key = key.clone();

    match verb.as_str() {
        "add" => Ok(Command::AddNode(command)),
        "set" => Ok(Command::SetNode(command)),
        "upsert" => Ok(Command::UpsertNode(command)),
        "update" => Ok(Command::UpdateNode(command)),
        "delete" => Ok(Command::DeleteNode(DeleteCommand {
            target: DeleteTarget::Key(key),
            if_exist,
            alias: command.alias,
        })),
        other => Err(ParseError::SemanticError(format!("Unknown verb {}", other))),
    }
}

fn parse_edge_statement(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut verb = String::new();
    let mut from_key = None;
    let mut to_key = None;
    let mut edge_type = EdgeType::default();
    let mut tags = Vec::new();
    let mut if_exist = false;
    let mut alias = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::verb => verb = inner.as_str().to_lowercase(),
            Rule::from_clause => from_key = Some(first_value(inner)?),
            Rule::to_clause => to_key = Some(first_value(inner)?),
            Rule::type_clause => edge_type = EdgeType::new(first_value(inner)?),
            Rule::set_clause => tags.extend(parse_tag_list(inner)?),
            Rule::ifexist_clause => if_exist = true,
            Rule::alias => alias = Some(inner.as_str().to_string()),
            _ => {}
        }
    }

    let from_key =
        from_key.ok_or_else(|| ParseError::SemanticError("Missing edge from key".to_string()))?;
    let to_key =
        to_key.ok_or_else(|| ParseError::SemanticError("Missing edge to key".to_string()))?;
    let command = EdgeCommand {
        from_key,
        to_key,
        edge_type,
        tags,
        alias,
    };

    match verb.as_str() {
        "add" => Ok(Command::AddEdge(command)),
        "set" => Ok(Command::SetEdge(command)),
        "upsert" => Ok(Command::UpsertEdge(command)),
        "update" => Ok(Command::UpdateEdge(command)),
        "delete" => Ok(Command::DeleteEdge(DeleteCommand {
            target: DeleteTarget::Key(EdgeKey::new(
                command.from_key,
                command.to_key,
                command.edge_type,
            )),
            if_exist,
            alias: command.alias,
        })),
        other => Err(ParseError::SemanticError(format!("Unknown verb {}", other))),
    }
}

fn parse_delete_search(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut chain = None;
    let mut if_exist = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::search_chain => chain = Some(parse_search_chain(inner)?),
            Rule::ifexist_clause => if_exist = true,
            _ => {}
        }
    }
    let chain = chain.ok_or_else(|| ParseError::SemanticError("Missing search".to_string()))?;
    let alias = chain.last().and_then(|step| step.alias.clone());
    let final_is_node = chain.last().map(|step| step.spec.is_node()).unwrap_or(true);

    Ok(if final_is_node {
        Command::DeleteNode(DeleteCommand {
            target: DeleteTarget::Search(chain),
            if_exist,
            alias,
        })
    } else {
        Command::DeleteEdge(DeleteCommand {
            target: DeleteTarget::Search(chain),
            if_exist,
            alias,
        })
    })
}

fn parse_select(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut chain = None;
    let mut return_names = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::search_chain => chain = Some(parse_search_chain(inner)?),
            Rule::return_clause => {
                return_names = parse_name_list(inner)
                    .into_iter()
                    .map(|(_, name)| name)
                    .collect();
            }
            _ => {}
        }
    }
    let chain = chain.ok_or_else(|| ParseError::SemanticError("Missing search".to_string()))?;
    Ok(Command::Select(SelectCommand {
        chain,
        return_names,
    }))
}

fn parse_search_chain(pair: Pair<Rule>) -> ParseResult<SearchChain> {
    let mut steps = Vec::new();
    let mut join = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::join => {
                join = Some(match inner.as_str() {
                    "->" => Direction::Forward,
                    "<-" => Direction::Reverse,
                    _ => Direction::Both,
                });
            }
            Rule::search_term => {
                let (spec, alias) = parse_search_term(inner)?;
                steps.push(SearchStep {
                    join: join.take(),
                    spec,
                    alias,
                });
            }
            _ => {}
        }
    }
    Ok(SearchChain { steps })
}

fn parse_search_term(pair: Pair<Rule>) -> ParseResult<(SearchSpec, Option<String>)> {
    let mut spec = None;
    let mut alias = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node_search => {
                let filters = parse_filters(inner)
                    .into_iter()
                    .map(|(name, value)| node_filter(name, value))
                    .collect::<ParseResult<Vec<_>>>()?;
                spec = Some(SearchSpec::Node(filters));
            }
            Rule::edge_search => {
                let filters = parse_filters(inner)
                    .into_iter()
                    .map(|(name, value)| edge_filter(name, value))
                    .collect::<ParseResult<Vec<_>>>()?;
                spec = Some(SearchSpec::Edge(filters));
            }
            Rule::alias => alias = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    let spec = spec.ok_or_else(|| ParseError::SemanticError("Missing search spec".to_string()))?;
    Ok((spec, alias))
}

/// `(name[=value], ...)` pairs; empty for `(*)` / `[*]`
fn parse_filters(pair: Pair<Rule>) -> Vec<(String, Option<String>)> {
    let mut filters = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() != Rule::filter_list {
            continue;
        }
        for filter in inner.into_inner() {
            let mut name = String::new();
            let mut value = None;
            for part in filter.into_inner() {
                match part.as_rule() {
                    Rule::name => name = part.as_str().to_string(),
                    Rule::value => value = Some(value_text(part)),
                    _ => {}
                }
            }
            filters.push((name, value));
        }
    }
    filters
}

fn node_filter(name: String, value: Option<String>) -> ParseResult<NodeFilter> {
    if name.eq_ignore_ascii_case("key") {
        let value = value
            .ok_or_else(|| ParseError::SemanticError("key filter needs a value".to_string()))?;
        return Ok(NodeFilter::Key(value));
    }
    Ok(NodeFilter::Tag { key: name, value })
}

fn edge_filter(name: String, value: Option<String>) -> ParseResult<EdgeFilter> {
    let lowered = name.to_lowercase();
    let endpoint = matches!(
        lowered.as_str(),
        "from" | "fromkey" | "to" | "tokey" | "type" | "edgetype"
    );
    if !endpoint {
        return Ok(EdgeFilter::Tag { key: name, value });
    }

    let value = value.ok_or_else(|| {
        ParseError::SemanticError(format!("{} filter needs a value", name))
    })?;
    Ok(match lowered.as_str() {
        "from" | "fromkey" => EdgeFilter::From(value),
        "to" | "tokey" => EdgeFilter::To(value),
        _ => EdgeFilter::Type(value),
    })
}

fn parse_tag_list(pair: Pair<Rule>) -> ParseResult<Vec<TagCommand>> {
    let mut tags = Vec::new();
    for list in pair.into_inner().filter(|p| p.as_rule() == Rule::tag_list) {
        for item in list.into_inner() {
            let mut remove = false;
            let mut name = String::new();
            let mut value = None;
            for part in item.into_inner() {
                match part.as_rule() {
                    Rule::remove_mark => remove = true,
                    Rule::name => name = part.as_str().to_string(),
                    Rule::value => value = Some(value_text(part)),
                    _ => {}
                }
            }
            if remove && value.is_some() {
                return Err(ParseError::SemanticError(format!(
                    "Removal of {} cannot carry a value",
                    name
                )));
            }
            tags.push(if remove {
                TagCommand::remove(name.as_str())
            } else {
                TagCommand::set(name.as_str(), value.as_deref())
            });
        }
    }
    Ok(tags)
}

/// `(removed, name)` pairs of a `name_list` child
fn parse_name_list(pair: Pair<Rule>) -> Vec<(bool, String)> {
    let mut names = Vec::new();
    for list in pair.into_inner().filter(|p| p.as_rule() == Rule::name_list) {
        for item in list.into_inner() {
            let mut remove = false;
            for part in item.into_inner() {
                match part.as_rule() {
                    Rule::remove_mark => remove = true,
                    Rule::name => names.push((remove, part.as_str().to_string())),
                    _ => {}
                }
            }
        }
    }
    names
}

fn parse_data_clause(pair: Pair<Rule>) -> ParseResult<DataAttachment> {
    let mut name = String::new();
    let mut type_name = "json".to_string();
    let mut payload = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = inner.as_str().to_string(),
            Rule::type_name => type_name = inner.as_str().to_string(),
            Rule::json_object => payload = inner.as_str(),
            _ => {}
        }
    }
    serde_json::from_str::<serde_json::Value>(payload)
        .map_err(|e| ParseError::SemanticError(format!("Invalid data {}: {}", name, e)))?;
    Ok(DataAttachment {
        name,
        type_name,
        payload: Bytes::copy_from_slice(payload.as_bytes()),
    })
}

/// First `value` child of a clause
fn first_value(pair: Pair<Rule>) -> ParseResult<String> {
    let rule = pair.as_rule();
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::value)
        .map(value_text)
        .ok_or_else(|| ParseError::SemanticError(format!("Missing value in {:?}", rule)))
}

/// Text of a `value`, without quotes
fn value_text(pair: Pair<Rule>) -> String {
    let raw = pair.as_str();
    pair.into_inner()
        .next()
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}
