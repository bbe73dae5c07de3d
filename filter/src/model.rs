//! The parsed filter: token stream, component arena and offset queries.

use crate::component::{ComponentId, FilterComponent};
use crate::token::{FilterToken, FilterTokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModel {
    tokens: Vec<FilterToken>,
    /// Components in pre-order; the root, if any, is first.
    components: Vec<FilterComponent>,
    root: Option<ComponentId>,
    /// Tokens outside the root filter.
    stray: Vec<FilterToken>,
}

impl FilterModel {
    pub(crate) fn new(
        tokens: Vec<FilterToken>,
        components: Vec<FilterComponent>,
        root: Option<ComponentId>,
        stray: Vec<FilterToken>,
    ) -> FilterModel {
        FilterModel {
            tokens,
            components,
            root,
            stray,
        }
    }

    /// Every token of the input, `Eof` last.
    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn root_id(&self) -> Option<ComponentId> {
        self.root
    }

    pub fn root(&self) -> Option<&FilterComponent> {
        self.component(self.root?)
    }

    pub fn component(&self, id: ComponentId) -> Option<&FilterComponent> {
        self.components.get(id)
    }

    pub fn components(&self) -> &[FilterComponent] {
        &self.components
    }

    pub fn children(&self, id: ComponentId) -> impl Iterator<Item = &FilterComponent> {
        self.components
            .get(id)
            .map(|c| c.children())
            .unwrap_or_default()
            .iter()
            .filter_map(|&child| self.components.get(child))
    }

    pub fn parent(&self, id: ComponentId) -> Option<&FilterComponent> {
        self.component(self.component(id)?.parent()?)
    }

    pub fn stray_tokens(&self) -> &[FilterToken] {
        &self.stray
    }

    /// Innermost component whose span holds the character before `offset`.
    /// A cursor sits after the character it follows, so the offset of an
    /// opening parenthesis still selects the component it opens when the
    /// parenthesis is at position 0.
    pub fn component_at(&self, offset: usize) -> Option<&FilterComponent> {
        let target = offset.saturating_sub(1);
        let mut current = self.root()?;
        if !current.contains(target) {
            return None;
        }
        'descend: loop {
            for child in current.children() {
                let child = &self.components[*child];
                if child.contains(target) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Offset of the partner of the parenthesis just before `cursor`.
    pub fn bracket_match(&self, cursor: usize) -> Option<usize> {
        let target = cursor.checked_sub(1)?;
        let c = self.component_at(cursor)?;
        let stop = c.stop_token().map(|t| t.offset);
        if c.start_token().offset == target {
            stop
        } else if stop == Some(target) {
            Some(c.start_token().offset)
        } else {
            None
        }
    }

    /// Unexpected tokens inside components and stray text outside the
    /// root filter, in source order.
    pub fn error_tokens(&self) -> Vec<&FilterToken> {
        let mut v: Vec<&FilterToken> = self
            .components
            .iter()
            .flat_map(|c| c.unexpected_tokens())
            .chain(self.stray.iter().filter(|t| t.kind != FilterTokenKind::Whitespace))
            .collect();
        v.sort_by_key(|t| t.offset);
        v
    }

    pub(crate) fn problem(&self) -> Option<(usize, String)> {
        if let Some(c) = self.components.iter().find(|c| !c.is_valid()) {
            let cause = c.invalid_cause().unwrap_or_default().to_string();
            return Some((c.cause_position, cause));
        }
        if let Some(t) = self
            .stray
            .iter()
            .find(|t| t.kind != FilterTokenKind::Whitespace)
        {
            return Some((t.offset, format!("Unexpected token '{}'", t.text)));
        }
        if self.root.is_none() {
            let end = self.tokens.last().map_or(0, |t| t.offset);
            return Some((end, "Missing filter".to_string()));
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.problem().is_none()
    }

    pub fn invalid_cause(&self) -> Option<String> {
        self.problem().map(|(_, cause)| cause)
    }
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentKind;
    use crate::parser::parse_filter;

    // ── Group 1: offset lookup ──────────────────────────────────────────

    #[test]
    fn offset_of_first_paren_is_outer_and() {
        let m = parse_filter("(&(cn=a)(sn=b))");
        let c = m.component_at(0).unwrap();
        assert_eq!(c.kind(), ComponentKind::And);
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn offset_after_item_close_is_item() {
        let text = "(&(cn=a)(sn=b))";
        let m = parse_filter(text);
        let offset = text.find("cn=a)").unwrap() + "cn=a)".len();
        let c = m.component_at(offset).unwrap();
        assert_eq!(c.kind(), ComponentKind::Item);
        assert_eq!(c.attribute(), Some("cn"));
        assert_eq!(c.start_token().offset, 2);
        assert_eq!(c.stop_token().unwrap().offset, 7);
    }

    #[test]
    fn offset_inside_value() {
        let m = parse_filter("(&(cn=a)(sn=bcd))");
        assert_eq!(m.component_at(14).unwrap().attribute(), Some("sn"));
        assert_eq!(m.component_at(100), None);
    }

    #[test]
    fn offset_in_unclosed_filter() {
        let m = parse_filter("(&(cn=a)(sn=");
        let c = m.component_at(12).unwrap();
        assert_eq!(c.attribute(), Some("sn"));
        assert!(c.stop_token().is_none());
    }

    // ── Group 2: bracket matching ───────────────────────────────────────

    #[test]
    fn bracket_match_both_ways() {
        let m = parse_filter("(&(cn=a)(sn=b))");
        assert_eq!(m.bracket_match(1), Some(14));
        assert_eq!(m.bracket_match(15), Some(0));
        assert_eq!(m.bracket_match(3), Some(7));
        assert_eq!(m.bracket_match(8), Some(2));
        assert_eq!(m.bracket_match(5), None);
        assert_eq!(m.bracket_match(0), None);
    }

    #[test]
    fn bracket_match_unclosed() {
        let m = parse_filter("(&(cn=a)");
        assert_eq!(m.bracket_match(1), None);
        assert_eq!(m.bracket_match(8), Some(2));
    }

    // ── Group 3: tree navigation ────────────────────────────────────────

    #[test]
    fn parent_and_children() {
        let m = parse_filter("(|(a=1)(b=2)(c=3))");
        let root = m.root_id().unwrap();
        let kids: Vec<_> = m.children(root).filter_map(|c| c.attribute()).collect();
        assert_eq!(kids, ["a", "b", "c"]);
        assert!(m.parent(root).is_none());
        assert_eq!(m.parent(1).unwrap().kind(), ComponentKind::Or);
        assert_eq!(m.children(42).count(), 0);
    }

    #[test]
    fn text_round_trips() {
        for text in ["(&(cn=a)(sn=b))", " ((x", "(cn=a*)junk", ""] {
            assert_eq!(parse_filter(text).text(), text);
        }
    }

    #[test]
    fn component_tokens_in_order() {
        let m = parse_filter("(cn=a*b)");
        let r = m.root().unwrap();
        let texts: Vec<&str> = r.tokens().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["(", "cn", "=", "a", "*", "b", ")"]);
    }
}
