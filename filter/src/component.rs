//! Filter components, the nodes of the parsed filter tree.
//!
//! Components live in the model's arena and refer to each other by
//! [`ComponentId`].  Each component keeps the tokens it was built from and
//! the diagnostic decided when the parser closed it.

use crate::token::{FilterToken, FilterTokenKind};

pub type ComponentId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    And,
    Or,
    Not,
    /// `(attr op value)`
    Item,
    /// `(attr:dn:rule:=value)`
    Extensible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    Approximate,
    GreaterOrEqual,
    LessOrEqual,
    Present,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterComponent {
    pub(crate) kind: ComponentKind,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) start: FilterToken,
    pub(crate) stop: Option<FilterToken>,
    /// `&`, `|` or `!` for logical components, the comparison token for
    /// items, `:=` for extensible matches.
    pub(crate) operator: Option<FilterToken>,
    pub(crate) attribute: Option<FilterToken>,
    pub(crate) dn_attr: Option<FilterToken>,
    pub(crate) matching_rule: Option<FilterToken>,
    /// `Value` and `Asterisk` tokens in order.
    pub(crate) values: Vec<FilterToken>,
    pub(crate) whitespace: Vec<FilterToken>,
    /// Tokens that do not fit the component's shape.
    pub(crate) unexpected: Vec<FilterToken>,
    pub(crate) end: usize,
    pub(crate) cause: Option<String>,
    pub(crate) cause_position: usize,
}

impl FilterComponent {
    pub(crate) fn new(start: FilterToken, parent: Option<ComponentId>) -> FilterComponent {
        let end = start.end();
        FilterComponent {
            kind: ComponentKind::Item,
            parent,
            children: Vec::new(),
            start,
            stop: None,
            operator: None,
            attribute: None,
            dn_attr: None,
            matching_rule: None,
            values: Vec::new(),
            whitespace: Vec::new(),
            unexpected: Vec::new(),
            end,
            cause: None,
            cause_position: 0,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// The opening parenthesis.
    pub fn start_token(&self) -> &FilterToken {
        &self.start
    }

    /// The closing parenthesis; None while the filter is unclosed.
    pub fn stop_token(&self) -> Option<&FilterToken> {
        self.stop.as_ref()
    }

    pub fn operator_token(&self) -> Option<&FilterToken> {
        self.operator.as_ref()
    }

    pub fn attribute_token(&self) -> Option<&FilterToken> {
        self.attribute.as_ref()
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_ref().map(|t| t.text.as_str())
    }

    pub fn dn_attr(&self) -> bool {
        self.dn_attr.is_some()
    }

    /// Matching rule of an extensible match, without the leading colon.
    pub fn matching_rule(&self) -> Option<&str> {
        self.matching_rule.as_ref().map(|t| &t.text[1..])
    }

    pub fn value_tokens(&self) -> &[FilterToken] {
        &self.values
    }

    /// Assertion value as written, wildcards included.
    pub fn value(&self) -> String {
        self.values.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn operator(&self) -> Option<FilterOperator> {
        let op = match self.operator.as_ref()?.kind {
            FilterTokenKind::Equal if self.has_wildcard() => FilterOperator::Substring,
            FilterTokenKind::Equal | FilterTokenKind::ExtensibleEqual => FilterOperator::Equal,
            FilterTokenKind::Aprox => FilterOperator::Approximate,
            FilterTokenKind::Greater => FilterOperator::GreaterOrEqual,
            FilterTokenKind::Less => FilterOperator::LessOrEqual,
            FilterTokenKind::Present => FilterOperator::Present,
            _ => return None,
        };
        Some(op)
    }

    pub(crate) fn has_wildcard(&self) -> bool {
        self.values
            .iter()
            .any(|t| t.kind == FilterTokenKind::Asterisk)
    }

    pub fn unexpected_tokens(&self) -> &[FilterToken] {
        &self.unexpected
    }

    /// The component's own tokens in source order (children excluded).
    pub fn tokens(&self) -> Vec<&FilterToken> {
        let mut v: Vec<&FilterToken> = std::iter::once(&self.start)
            .chain(self.operator.iter())
            .chain(self.attribute.iter())
            .chain(self.dn_attr.iter())
            .chain(self.matching_rule.iter())
            .chain(self.values.iter())
            .chain(self.whitespace.iter())
            .chain(self.unexpected.iter())
            .chain(self.stop.iter())
            .collect();
        v.sort_by_key(|t| t.offset);
        v
    }

    pub fn offset(&self) -> usize {
        self.start.offset
    }

    /// One past the closing parenthesis, or past the last token read when
    /// the filter is unclosed.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset() <= offset && offset < self.end
    }

    pub fn is_valid(&self) -> bool {
        self.cause.is_none()
    }

    pub fn invalid_cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}
