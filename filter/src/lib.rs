//! LDAP search filter (RFC 4515) text engine: an error-tolerant tokenizer
//! and parser producing a component tree addressable by offset, for
//! highlighting and bracket matching while a filter is being typed.

pub mod component;
pub mod error;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod token;

pub use component::{ComponentId, ComponentKind, FilterComponent, FilterOperator};
pub use error::{FilterError, Result};
pub use model::FilterModel;
pub use parser::{parse_filter, parse_strict};
pub use scanner::tokenize;
pub use token::{FilterToken, FilterTokenKind};
