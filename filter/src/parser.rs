//! Recursive-descent filter parser.
//!
//! Each `(` opens a component whose kind is decided by the first token
//! after it; the component extends to the `)` at the same depth.  Tokens
//! that do not fit are attached to the component as unexpected and parsing
//! carries on, so a half-typed filter still yields a full tree.

use tracing::debug;

use crate::component::{ComponentId, ComponentKind, FilterComponent};
use crate::error::{FilterError, Result};
use crate::model::FilterModel;
use crate::scanner::tokenize;
use crate::token::{FilterToken, FilterTokenKind};

use FilterTokenKind::*;

/// Nesting deeper than this is treated as unexpected `(` tokens.
const MAX_DEPTH: usize = 256;

struct Parser<'t> {
    tokens: &'t [FilterToken],
    pos: usize,
    depth: usize,
    components: Vec<FilterComponent>,
}

/// Parse `text` into a filter model.  Never fails.
pub fn parse_filter(text: &str) -> FilterModel {
    let tokens = tokenize(text);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        components: Vec::new(),
    };
    let mut root = None;
    let mut stray = Vec::new();
    while let Some(t) = parser.peek() {
        if t.kind == LPar && root.is_none() {
            root = Some(parser.parse_component(None));
        } else {
            stray.push(parser.bump());
        }
    }
    let components = parser.components;
    let model = FilterModel::new(tokens, components, root, stray);
    debug!(
        "parsed filter: {} tokens, {} components, valid {}",
        model.tokens().len(),
        model.components().len(),
        model.is_valid()
    );
    model
}

/// Parse `text` and fail on the first problem.
pub fn parse_strict(text: &str) -> Result<FilterModel> {
    let model = parse_filter(text);
    match model.problem() {
        Some((position, message)) => Err(FilterError::Parse { position, message }),
        None => Ok(model),
    }
}

impl<'t> Parser<'t> {
    /// Next token, None at end of input.
    fn peek(&self) -> Option<&'t FilterToken> {
        self.tokens.get(self.pos).filter(|t| t.kind != Eof)
    }

    fn bump(&mut self) -> FilterToken {
        let t = self.tokens[self.pos].clone();
        self.pos += 1;
        t
    }

    fn parse_component(&mut self, parent: Option<ComponentId>) -> ComponentId {
        let start = self.bump();
        let id = self.components.len();
        self.components.push(FilterComponent::new(start, parent));
        self.depth += 1;

        while self.peek().is_some_and(|t| t.kind == Whitespace) {
            let ws = self.bump();
            self.components[id].whitespace.push(ws);
        }
        let kind = match self.peek().map(|t| t.kind) {
            Some(And) => ComponentKind::And,
            Some(Or) => ComponentKind::Or,
            Some(Not) => ComponentKind::Not,
            Some(DnAttr | MatchingRule | ExtensibleEqual) => ComponentKind::Extensible,
            Some(Attribute) => match self.tokens.get(self.pos + 1).map(|t| t.kind) {
                Some(DnAttr | MatchingRule | ExtensibleEqual) => ComponentKind::Extensible,
                _ => ComponentKind::Item,
            },
            _ => ComponentKind::Item,
        };
        self.components[id].kind = kind;
        if matches!(kind, ComponentKind::And | ComponentKind::Or | ComponentKind::Not) {
            let op = self.bump();
            self.components[id].operator = Some(op);
        }

        self.parse_body(id);
        if self.peek().is_some_and(|t| t.kind == RPar) {
            let stop = self.bump();
            self.components[id].stop = Some(stop);
        }
        self.depth -= 1;

        let c = &mut self.components[id];
        c.end = self.tokens[self.pos - 1].end();
        if let Some((position, cause)) = diagnose(c) {
            c.cause = Some(cause);
            c.cause_position = position;
        }
        id
    }

    /// Consume tokens up to (not including) the `)` closing component `id`.
    fn parse_body(&mut self, id: ComponentId) {
        while let Some(t) = self.peek() {
            match t.kind {
                RPar => break,
                LPar if self.depth < MAX_DEPTH => {
                    let child = self.parse_component(Some(id));
                    self.components[id].children.push(child);
                }
                Whitespace => {
                    let ws = self.bump();
                    self.components[id].whitespace.push(ws);
                }
                _ => {
                    let t = self.bump();
                    let c = &mut self.components[id];
                    if accepts(c, t.kind) {
                        store(c, t);
                    } else {
                        c.unexpected.push(t);
                    }
                }
            }
        }
    }
}

/// Can `kind` go into the next free slot of `c`?
fn accepts(c: &FilterComponent, kind: FilterTokenKind) -> bool {
    let fresh = c.operator.is_none() && c.values.is_empty();
    match (c.kind, kind) {
        (ComponentKind::Item | ComponentKind::Extensible, Attribute) => {
            c.attribute.is_none() && c.dn_attr.is_none() && c.matching_rule.is_none() && fresh
        }
        (ComponentKind::Item, k) if k.is_operator() => fresh,
        (ComponentKind::Item, Value | Asterisk) => {
            c.operator.as_ref().is_some_and(|o| o.kind != Present)
        }
        (ComponentKind::Extensible, DnAttr) => {
            c.dn_attr.is_none() && c.matching_rule.is_none() && fresh
        }
        (ComponentKind::Extensible, MatchingRule) => c.matching_rule.is_none() && fresh,
        (ComponentKind::Extensible, ExtensibleEqual) => fresh,
        (ComponentKind::Extensible, Value | Asterisk) => c.operator.is_some(),
        _ => false,
    }
}

fn store(c: &mut FilterComponent, t: FilterToken) {
    match t.kind {
        Attribute => c.attribute = Some(t),
        DnAttr => c.dn_attr = Some(t),
        MatchingRule => c.matching_rule = Some(t),
        Value | Asterisk => c.values.push(t),
        _ => c.operator = Some(t),
    }
}

/// First problem of a closed (or abandoned) component and where it sits.
fn diagnose(c: &FilterComponent) -> Option<(usize, String)> {
    let at_start = |msg: &str| Some((c.offset(), msg.to_string()));
    // missing parts are reported where they should have been
    let after = |t: Option<&FilterToken>, msg: &str| {
        Some((t.map_or(c.start.end(), |t| t.end()), msg.to_string()))
    };

    let structural = match c.kind {
        ComponentKind::And | ComponentKind::Or => {
            if c.children.is_empty() {
                after(c.operator.as_ref(), "Missing filters")
            } else {
                None
            }
        }
        ComponentKind::Not => match c.children.len() {
            0 => after(c.operator.as_ref(), "Missing filter"),
            1 => None,
            _ => Some((
                c.offset(),
                "NOT filter accepts exactly one component".to_string(),
            )),
        },
        ComponentKind::Item | ComponentKind::Extensible if !c.children.is_empty() => {
            at_start("Unexpected nested filter")
        }
        ComponentKind::Item => {
            if c.attribute.is_none() {
                after(None, "Missing attribute")
            } else if c.operator.is_none() {
                after(c.attribute.as_ref(), "Missing filter type")
            } else if c.values.is_empty()
                && c.operator.as_ref().is_some_and(|o| o.kind != Present)
            {
                after(c.operator.as_ref(), "Missing value")
            } else if c.has_wildcard() && c.operator.as_ref().is_some_and(|o| o.kind != Equal) {
                after(c.operator.as_ref(), "Wildcard '*' is only allowed with '='")
            } else {
                None
            }
        }
        ComponentKind::Extensible => {
            if c.attribute.is_none() && c.matching_rule.is_none() {
                after(None, "Missing attribute or matching rule")
            } else if c.operator.is_none() {
                let last = c.matching_rule.as_ref().or(c.dn_attr.as_ref()).or(c.attribute.as_ref());
                after(last, "Missing filter type")
            } else if c.values.is_empty() {
                after(c.operator.as_ref(), "Missing value")
            } else if c.has_wildcard() {
                after(c.operator.as_ref(), "Wildcard '*' is only allowed with '='")
            } else {
                None
            }
        }
    };

    structural
        .or_else(|| {
            c.unexpected
                .first()
                .map(|t| (t.offset, format!("Unexpected token '{}'", t.text)))
        })
        .or_else(|| {
            c.stop
                .is_none()
                .then(|| (c.end, "Missing closing parenthesis ')'".to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::FilterOperator;

    fn root(text: &str) -> FilterModel {
        parse_filter(text)
    }

    fn root_cause(text: &str) -> Option<String> {
        let m = parse_filter(text);
        m.root().and_then(|r| r.invalid_cause().map(str::to_string))
    }

    // ── Group 1: well-formed filters ────────────────────────────────────

    #[test]
    fn and_with_two_items() {
        let m = root("(&(cn=a)(sn=b))");
        let r = m.root().unwrap();
        assert_eq!(r.kind(), ComponentKind::And);
        assert_eq!(r.children().len(), 2);
        for child in m.children(m.root_id().unwrap()) {
            assert_eq!(child.kind(), ComponentKind::Item);
            assert!(child.is_valid());
        }
        assert!(r.is_valid());
        assert!(m.is_valid());
        assert_eq!(r.stop_token().unwrap().offset, 14);
    }

    #[test]
    fn bare_item_is_root() {
        let m = root("(cn=a)");
        let r = m.root().unwrap();
        assert_eq!(r.kind(), ComponentKind::Item);
        assert_eq!(r.attribute(), Some("cn"));
        assert_eq!(r.value(), "a");
        assert_eq!(r.operator(), Some(FilterOperator::Equal));
    }

    #[test]
    fn nested_or_and_not() {
        let m = root("(&(cn=foo)(|(sn=bar)(!(uid=baz))))");
        assert!(m.is_valid(), "{:?}", m.invalid_cause());
        assert_eq!(m.components().len(), 6);
        let not = m
            .components()
            .iter()
            .find(|c| c.kind() == ComponentKind::Not)
            .unwrap();
        let parent = not.parent().and_then(|p| m.component(p)).unwrap();
        assert_eq!(parent.kind(), ComponentKind::Or);
    }

    #[test]
    fn operators_are_classified() {
        let op = |text: &str| root(text).root().and_then(|r| r.operator());
        assert_eq!(op("(objectClass=*)"), Some(FilterOperator::Present));
        assert_eq!(op("(cn=a*b*)"), Some(FilterOperator::Substring));
        assert_eq!(op("(cn~=a)"), Some(FilterOperator::Approximate));
        assert_eq!(op("(n>=1)"), Some(FilterOperator::GreaterOrEqual));
        assert_eq!(op("(n<=1)"), Some(FilterOperator::LessOrEqual));
    }

    #[test]
    fn substring_value_text() {
        let m = root("(cn=a*b*)");
        let r = m.root().unwrap();
        assert_eq!(r.value(), "a*b*");
        assert_eq!(r.value_tokens().len(), 4);
        assert!(r.is_valid());
    }

    #[test]
    fn extensible_match() {
        let m = root("(cn:dn:2.5.13.5:=John)");
        let r = m.root().unwrap();
        assert_eq!(r.kind(), ComponentKind::Extensible);
        assert_eq!(r.attribute(), Some("cn"));
        assert!(r.dn_attr());
        assert_eq!(r.matching_rule(), Some("2.5.13.5"));
        assert_eq!(r.value(), "John");
        assert!(r.is_valid(), "{:?}", r.invalid_cause());
    }

    #[test]
    fn whitespace_between_filters_is_fine() {
        let m = root(" (& (cn=a) (sn=b) ) ");
        assert!(m.is_valid(), "{:?}", m.invalid_cause());
        assert_eq!(m.root().unwrap().children().len(), 2);
    }

    // ── Group 2: diagnostics ────────────────────────────────────────────

    #[test]
    fn empty_and() {
        assert_eq!(root_cause("(&)").as_deref(), Some("Missing filters"));
        assert_eq!(root_cause("(|)").as_deref(), Some("Missing filters"));
    }

    #[test]
    fn not_arity() {
        assert_eq!(root_cause("(!)").as_deref(), Some("Missing filter"));
        assert_eq!(
            root_cause("(!(a=1)(b=2))").as_deref(),
            Some("NOT filter accepts exactly one component")
        );
    }

    #[test]
    fn item_missing_parts() {
        assert_eq!(root_cause("()").as_deref(), Some("Missing attribute"));
        assert_eq!(root_cause("(cn)").as_deref(), Some("Missing filter type"));
        assert_eq!(root_cause("(cn=)").as_deref(), Some("Missing value"));
        assert_eq!(
            root_cause("(n>=1*)").as_deref(),
            Some("Wildcard '*' is only allowed with '='")
        );
    }

    #[test]
    fn unclosed() {
        let m = root("(&(cn=a)");
        let r = m.root().unwrap();
        assert!(r.stop_token().is_none());
        assert_eq!(r.invalid_cause(), Some("Missing closing parenthesis ')'"));
        assert_eq!(r.end(), 8);
        assert!(m.children(0).next().unwrap().is_valid());
    }

    #[test]
    fn nested_filter_in_item() {
        let m = root("(cn=(sn=b))");
        let r = m.root().unwrap();
        assert_eq!(r.invalid_cause(), Some("Unexpected nested filter"));
        assert_eq!(r.children().len(), 1);
        assert_eq!(r.stop_token().unwrap().offset, 10);
    }

    #[test]
    fn unexpected_token() {
        assert_eq!(root_cause("(cn =a)").as_deref(), Some("Missing filter type"));
        let m = root("(&(cn=a)x)");
        assert_eq!(m.root().unwrap().invalid_cause(), Some("Unexpected token 'x'"));
        assert_eq!(m.error_tokens().len(), 1);
    }

    #[test]
    fn trailing_text() {
        let m = root("(cn=a)junk");
        assert!(m.root().unwrap().is_valid());
        assert!(!m.is_valid());
        assert_eq!(m.invalid_cause().as_deref(), Some("Unexpected token 'junk'"));
    }

    #[test]
    fn empty_text() {
        let m = root("");
        assert!(m.root().is_none());
        assert_eq!(m.invalid_cause().as_deref(), Some("Missing filter"));
    }

    #[test]
    fn deep_nesting_does_not_recurse_forever() {
        let text = "(!".repeat(10_000);
        let m = root(&text);
        assert!(!m.is_valid());
        assert_eq!(m.components().len(), MAX_DEPTH);
    }

    // ── Group 3: strict parsing ─────────────────────────────────────────

    #[test]
    fn strict_ok() {
        assert!(parse_strict("(cn=a)").is_ok());
    }

    #[test]
    fn strict_reports_position() {
        match parse_strict("(&(cn=a)(sn=))") {
            Err(FilterError::Parse { position, message }) => {
                assert_eq!(message, "Missing value");
                assert_eq!(position, 12);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
