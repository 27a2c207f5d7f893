//! Command language: typed model, parser and executors
//!
//! ```text
//! add node key=node1 set t1,t2=v2 index t2 foreignkey owner=owner*;
//! add edge from=node1 to=node2 type=knows set since=2020;
//! select (key=node1) -> [type=knows] -> (*) friends;
//! delete (tag=old) ifexist;
//! ```

pub mod ast;
pub mod executor;
pub mod parser;

pub use ast::{Command, CommandKind, SearchChain};
pub use executor::{
    MutQueryExecutor, QueryBatchResult, QueryEvaluator, QueryExecutor, QueryResult, Selection,
};
pub use parser::{parse_script, CommandParser, ParseError, ParseResult, PestCommandParser};
