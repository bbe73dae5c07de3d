//! LDIF file model.
//!
//! A file is an ordered list of containers covering every line of the
//! input: the optional `version:` line, free-standing comment blocks,
//! records and stray blank lines.  Malformed records stay in the list so
//! the editor can render and annotate them.

use tracing::{debug, trace};

use crate::error::{LdifError, Result};
use crate::line::{parse_line, split_lines, LdifLine};
use crate::record::{parse_record, LdifRecord};
use crate::scanner::tokenize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdifContainer {
    Version(LdifLine),
    /// Comment lines not attached to a record.
    Comments(Vec<LdifLine>),
    Record(LdifRecord),
    /// Blank line outside any record.
    Separator(LdifLine),
}

impl LdifContainer {
    pub fn lines(&self) -> &[LdifLine] {
        match self {
            LdifContainer::Version(l) | LdifContainer::Separator(l) => std::slice::from_ref(l),
            LdifContainer::Comments(ls) => ls,
            LdifContainer::Record(r) => r.lines(),
        }
    }

    pub fn as_record(&self) -> Option<&LdifRecord> {
        match self {
            LdifContainer::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn offset(&self) -> usize {
        self.lines().first().map_or(0, |l| l.offset())
    }

    pub fn end(&self) -> usize {
        self.lines().last().map_or(0, |l| l.end())
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset() <= offset && offset < self.end()
    }

    pub fn to_raw_string(&self) -> String {
        self.lines().iter().map(|l| l.to_raw_string()).collect()
    }

    pub fn invalid_cause(&self) -> Option<String> {
        match self {
            LdifContainer::Record(r) => r.invalid_cause(),
            LdifContainer::Version(l) => l.invalid_cause(),
            LdifContainer::Comments(_) | LdifContainer::Separator(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_cause().is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdifFile {
    containers: Vec<LdifContainer>,
}

/// Parse LDIF text.  `None` and `""` both give an empty file.
pub fn parse_file<'a>(text: impl Into<Option<&'a str>>) -> LdifFile {
    let text = text.into().unwrap_or("");
    let tokens = tokenize(text);
    let lines: Vec<LdifLine> = split_lines(&tokens).into_iter().map(parse_line).collect();
    let file = LdifFile::from_lines(lines);
    debug!(
        "parsed LDIF: {} bytes, {} tokens, {} containers, {} records, {} invalid",
        text.len(),
        tokens.len(),
        file.containers.len(),
        file.record_count(),
        file.records().filter(|r| !r.is_valid()).count()
    );
    file
}

impl LdifFile {
    /// Group already parsed lines into containers.
    pub fn from_lines(lines: Vec<LdifLine>) -> LdifFile {
        let mut containers = Vec::new();
        let mut pending_comments: Vec<LdifLine> = Vec::new();
        let mut record: Vec<LdifLine> = Vec::new();
        let mut seen_content = false;

        for line in lines {
            if !record.is_empty() {
                let done = line.is_separator();
                record.push(line);
                if done {
                    containers.push(LdifContainer::Record(parse_record(std::mem::take(
                        &mut record,
                    ))));
                }
                continue;
            }
            match line {
                LdifLine::Comment(_) => pending_comments.push(line),
                LdifLine::Separator(_) => {
                    if !pending_comments.is_empty() {
                        containers.push(LdifContainer::Comments(std::mem::take(
                            &mut pending_comments,
                        )));
                    }
                    containers.push(LdifContainer::Separator(line));
                }
                LdifLine::Version(_) if !seen_content => {
                    seen_content = true;
                    if !pending_comments.is_empty() {
                        containers.push(LdifContainer::Comments(std::mem::take(
                            &mut pending_comments,
                        )));
                    }
                    containers.push(LdifContainer::Version(line));
                }
                _ => {
                    seen_content = true;
                    record.append(&mut pending_comments);
                    record.push(line);
                }
            }
        }
        if !record.is_empty() {
            containers.push(LdifContainer::Record(parse_record(record)));
        }
        if !pending_comments.is_empty() {
            containers.push(LdifContainer::Comments(pending_comments));
        }
        for c in &containers {
            trace!("container at {}..{}", c.offset(), c.end());
        }
        LdifFile { containers }
    }

    pub fn containers(&self) -> &[LdifContainer] {
        &self.containers
    }

    pub fn records(&self) -> impl Iterator<Item = &LdifRecord> {
        self.containers.iter().filter_map(|c| c.as_record())
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    pub fn version_line(&self) -> Option<&LdifLine> {
        self.containers.iter().find_map(|c| match c {
            LdifContainer::Version(l) => Some(l),
            _ => None,
        })
    }

    /// Every line of the file in source order.
    pub fn lines(&self) -> impl Iterator<Item = &LdifLine> {
        self.containers.iter().flat_map(|c| c.lines())
    }

    pub fn container_at(&self, offset: usize) -> Option<&LdifContainer> {
        self.containers.iter().find(|c| c.contains(offset))
    }

    pub fn line_at(&self, offset: usize) -> Option<&LdifLine> {
        self.container_at(offset)?
            .lines()
            .iter()
            .find(|l| l.contains(offset))
    }

    pub fn record_at(&self, offset: usize) -> Option<&LdifRecord> {
        self.container_at(offset)?.as_record()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn to_raw_string(&self) -> String {
        self.containers.iter().map(|c| c.to_raw_string()).collect()
    }

    /// Fail with the first invalid container.  The position is that of the
    /// offending line when one line is to blame, else the container start.
    pub fn validate(&self) -> Result<()> {
        for c in &self.containers {
            let Some(message) = c.invalid_cause() else {
                continue;
            };
            let position = c
                .lines()
                .iter()
                .find(|l| !l.is_valid())
                .map_or_else(|| c.offset(), |l| l.offset());
            return Err(LdifError::Parse { position, message });
        }
        Ok(())
    }
}
