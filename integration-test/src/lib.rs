//! Test driver for the LDIF and filter engines.
//!
//! The sessions play the editor's part: they hold a text buffer, apply
//! edits and re-parse the whole text after every one, the way the editor
//! reconciles its model on each keystroke.

use studio_filter::{parse_filter, FilterModel};
use studio_ldif::{format_file, parse_file, LdifFile, LdifFormatParameters};

/// Sample documents.
pub mod fixtures {
    pub const CONTENT: &str = "version: 1\n\
\n\
# people\n\
dn: cn=alice,ou=people,dc=example,dc=com\n\
objectClass: inetOrgPerson\n\
cn: alice\n\
sn: Liddell\n\
mail: alice@example.com\n\
\n\
dn: cn=bob,ou=people,dc=example,dc=com\n\
objectClass: inetOrgPerson\n\
cn: bob\n\
sn:: w6TDtsO8\n\
description: a::b\n";

    pub const CHANGES: &str = "dn: cn=alice,ou=people,dc=example,dc=com\n\
changetype: modify\n\
replace: mail\n\
mail: alice@example.org\n\
-\n\
add: telephoneNumber\n\
telephoneNumber: +1 555 0100\n\
-\n\
\n\
dn: cn=bob,ou=people,dc=example,dc=com\n\
changetype: modrdn\n\
newrdn: cn=robert\n\
deleteoldrdn: 1\n\
newsuperior: ou=staff,dc=example,dc=com\n\
\n\
dn: cn=carol,ou=people,dc=example,dc=com\n\
control: 1.2.840.113556.1.4.805 true\n\
changetype: delete\n";

    pub const CRLF: &str = "dn: cn=foo,ou=system\r\ncn: foo\r\n";

    pub const FILTER: &str = "(&(objectClass=person)(|(cn=a*)(sn~=smith))(!(uid=root)))";
}

/// Parse `text`, format it with `params` and require the identical text.
pub fn assert_round_trip(text: &str, params: &LdifFormatParameters) {
    let file = parse_file(text);
    let out = format_file(&file, params);
    assert_eq!(out, text, "round trip changed the text");
}

pub struct LdifSession {
    text: String,
    file: LdifFile,
}

impl LdifSession {
    pub fn new(text: &str) -> LdifSession {
        LdifSession {
            text: text.to_string(),
            file: parse_file(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file(&self) -> &LdifFile {
        &self.file
    }

    pub fn insert(&mut self, offset: usize, s: &str) {
        self.text.insert_str(offset, s);
        self.file = parse_file(self.text.as_str());
    }

    pub fn delete(&mut self, range: std::ops::Range<usize>) {
        self.text.replace_range(range, "");
        self.file = parse_file(self.text.as_str());
    }

    /// Type `s` one character at a time at `offset`, re-parsing after each
    /// keystroke.  Returns the number of invalid records seen after each.
    pub fn type_text(&mut self, offset: usize, s: &str) -> Vec<usize> {
        let mut at = offset;
        let mut invalid = Vec::new();
        for c in s.chars() {
            let mut buf = [0u8; 4];
            self.insert(at, c.encode_utf8(&mut buf));
            at += c.len_utf8();
            invalid.push(self.file.records().filter(|r| !r.is_valid()).count());
        }
        invalid
    }

    pub fn reformat(&self, params: &LdifFormatParameters) -> String {
        format_file(&self.file, params)
    }
}

pub struct FilterSession {
    text: String,
    model: FilterModel,
}

impl FilterSession {
    pub fn new(text: &str) -> FilterSession {
        FilterSession {
            text: text.to_string(),
            model: parse_filter(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model(&self) -> &FilterModel {
        &self.model
    }

    /// Append `s` one character at a time, re-parsing after each keystroke.
    /// Returns the model's invalid cause after each.
    pub fn type_text(&mut self, s: &str) -> Vec<Option<String>> {
        let mut causes = Vec::new();
        for c in s.chars() {
            self.text.push(c);
            self.model = parse_filter(&self.text);
            causes.push(self.model.invalid_cause());
        }
        causes
    }
}
