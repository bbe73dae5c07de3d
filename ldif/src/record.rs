//! LDIF records: one entry or change operation, from its `dn:` line up to
//! and including the blank line that ends it.

use crate::line::{ControlLine, LdifLine, ValueLine};
use crate::token::{ChangeType, ModOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Plain entry, no `changetype:`.
    Content,
    ChangeAdd,
    ChangeDelete,
    ChangeModify,
    ChangeModDn,
    /// A `changetype:` line is present but names no known change type.
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdifRecord {
    lines: Vec<LdifLine>,
    kind: RecordKind,
}

/// One `add:`/`delete:`/`replace:` block of a modify record.
#[derive(Debug, Clone, Copy)]
pub struct ModSpec<'a> {
    pub header: &'a LdifLine,
    pub values: &'a [LdifLine],
    /// The closing `-` line, if present.
    pub sep: Option<&'a LdifLine>,
}

impl<'a> ModSpec<'a> {
    pub fn op(&self) -> Option<ModOp> {
        self.header.mod_op()
    }

    /// Attribute description named on the header line.
    pub fn attribute(&self) -> String {
        self.header
            .value_line()
            .map(|l| l.raw_value().into_owned())
            .unwrap_or_default()
    }
}

/// Group `lines` into a record and classify it.  Never fails; structural
/// problems are reported by [`LdifRecord::invalid_cause`].
pub fn parse_record(lines: Vec<LdifLine>) -> LdifRecord {
    let kind = match lines.iter().find(|l| matches!(l, LdifLine::ChangeType(_))) {
        None => RecordKind::Content,
        Some(line) => match line.change_type() {
            Some(ChangeType::Add) => RecordKind::ChangeAdd,
            Some(ChangeType::Delete) => RecordKind::ChangeDelete,
            Some(ChangeType::Modify) => RecordKind::ChangeModify,
            Some(ChangeType::ModDn) => RecordKind::ChangeModDn,
            None => RecordKind::Change,
        },
    };
    LdifRecord { lines, kind }
}

impl LdifRecord {
    pub fn from_lines(lines: Vec<LdifLine>) -> LdifRecord {
        parse_record(lines)
    }

    pub fn lines(&self) -> &[LdifLine] {
        &self.lines
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn dn_line(&self) -> Option<&ValueLine> {
        match self.lines.iter().find(|l| !l.is_comment())? {
            LdifLine::Dn(l) => Some(l),
            _ => None,
        }
    }

    /// Decoded DN.
    pub fn dn(&self) -> Option<String> {
        self.dn_line().map(|l| l.value_string())
    }

    pub fn controls(&self) -> Vec<&ControlLine> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                LdifLine::Control(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn change_type(&self) -> Option<ChangeType> {
        self.lines.iter().find_map(|l| l.change_type())
    }

    /// Attribute value lines of a content or add record, or every value
    /// line inside the mod-specs of a modify record.
    pub fn attr_vals(&self) -> Vec<&ValueLine> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                LdifLine::AttrVal(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn mod_specs(&self) -> Vec<ModSpec<'_>> {
        let mut specs = Vec::new();
        let mut i = 0;
        while i < self.lines.len() {
            if !matches!(self.lines[i], LdifLine::ModSpec(_)) {
                i += 1;
                continue;
            }
            let header = &self.lines[i];
            let start = i + 1;
            let mut end = start;
            while end < self.lines.len() && matches!(self.lines[end], LdifLine::AttrVal(_)) {
                end += 1;
            }
            let sep = match self.lines.get(end) {
                Some(l @ LdifLine::ModSpecSep(_)) => Some(l),
                _ => None,
            };
            specs.push(ModSpec {
                header,
                values: &self.lines[start..end],
                sep,
            });
            i = if sep.is_some() { end + 1 } else { end };
        }
        specs
    }

    pub fn new_rdn(&self) -> Option<&ValueLine> {
        self.lines.iter().find_map(|l| match l {
            LdifLine::NewRdn(v) => Some(v),
            _ => None,
        })
    }

    pub fn delete_old_rdn(&self) -> Option<bool> {
        self.lines.iter().find_map(|l| match l {
            LdifLine::DeleteOldRdn(v) if l.is_valid() => Some(v.raw_value() == "1"),
            _ => None,
        })
    }

    pub fn new_superior(&self) -> Option<&ValueLine> {
        self.lines.iter().find_map(|l| match l {
            LdifLine::NewSuperior(v) => Some(v),
            _ => None,
        })
    }

    pub fn offset(&self) -> usize {
        self.lines.first().map_or(0, |l| l.offset())
    }

    pub fn end(&self) -> usize {
        self.lines.last().map_or(0, |l| l.end())
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset() <= offset && offset < self.end()
    }

    pub fn line_at(&self, offset: usize) -> Option<&LdifLine> {
        self.lines.iter().find(|l| l.contains(offset))
    }

    /// Ends with a blank line (as opposed to end of input).
    pub fn is_terminated(&self) -> bool {
        self.lines.last().is_some_and(|l| l.is_separator())
    }

    pub fn to_raw_string(&self) -> String {
        self.lines.iter().map(|l| l.to_raw_string()).collect()
    }

    /// First line that is invalid on its own.
    pub fn invalid_line(&self) -> Option<&LdifLine> {
        self.lines.iter().find(|l| !l.is_valid())
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_cause().is_none()
    }

    pub fn invalid_cause(&self) -> Option<String> {
        let mut body: Vec<&LdifLine> = self.lines.iter().filter(|l| !l.is_comment()).collect();
        if body.last().is_some_and(|l| l.is_separator()) {
            body.pop();
        }
        match body.first() {
            Some(LdifLine::Dn(_)) => {}
            _ => return Some("Missing DN".to_string()),
        }
        if let Some(line) = self.invalid_line() {
            return line.invalid_cause();
        }

        let mut rest = &body[1..];
        let mut has_controls = false;
        while let Some((LdifLine::Control(_), tail)) = rest.split_first() {
            has_controls = true;
            rest = tail;
        }

        if self.kind == RecordKind::Content {
            if has_controls {
                return Some("Controls require a changetype line".to_string());
            }
        } else {
            match rest.split_first() {
                Some((LdifLine::ChangeType(_), tail)) => rest = tail,
                _ => return Some("changetype must follow the DN and controls".to_string()),
            }
        }

        match self.kind {
            RecordKind::Content | RecordKind::ChangeAdd => check_attr_vals(rest),
            RecordKind::ChangeDelete => rest.first().map(|l| {
                format!("Unexpected {} line in delete record", l.name())
            }),
            RecordKind::ChangeModify => check_mod_specs(rest),
            RecordKind::ChangeModDn => check_mod_dn(rest),
            RecordKind::Change => None,
        }
    }
}

fn unexpected(line: &LdifLine) -> Option<String> {
    Some(format!("Unexpected {} line", line.name()))
}

fn check_attr_vals(rest: &[&LdifLine]) -> Option<String> {
    if let Some(line) = rest.iter().find(|l| !matches!(l, LdifLine::AttrVal(_))) {
        return unexpected(line);
    }
    if rest.is_empty() {
        return Some("Record requires at least one attribute value".to_string());
    }
    None
}

fn check_mod_specs(mut rest: &[&LdifLine]) -> Option<String> {
    if rest.is_empty() {
        return Some("Modify record requires at least one modification".to_string());
    }
    while let Some((header, tail)) = rest.split_first() {
        let LdifLine::ModSpec(spec) = header else {
            return unexpected(header);
        };
        let attribute = spec.raw_value();
        rest = tail;
        while let Some((LdifLine::AttrVal(value), tail)) = rest.split_first() {
            if !value.key().eq_ignore_ascii_case(&attribute) {
                return Some(format!(
                    "Attribute '{}' does not match modification attribute '{}'",
                    value.key(),
                    attribute
                ));
            }
            rest = tail;
        }
        match rest.split_first() {
            Some((LdifLine::ModSpecSep(_), tail)) => rest = tail,
            _ => {
                return Some(format!(
                    "Modification of '{}' is not terminated by '-'",
                    attribute
                ))
            }
        }
    }
    None
}

fn check_mod_dn(rest: &[&LdifLine]) -> Option<String> {
    let mut it = rest.iter().peekable();
    let new_rdn = it.next_if(|l| matches!(l, LdifLine::NewRdn(_)));
    let delete_old_rdn = it.next_if(|l| matches!(l, LdifLine::DeleteOldRdn(_)));
    it.next_if(|l| matches!(l, LdifLine::NewSuperior(_)));
    if let Some(line) = it.next() {
        return unexpected(line);
    }
    if new_rdn.is_none() {
        return Some("Missing newrdn line".to_string());
    }
    if delete_old_rdn.is_none() {
        return Some("Missing deleteoldrdn line".to_string());
    }
    None
}
