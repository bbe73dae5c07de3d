use proptest::prelude::*;
use studio_filter::{parse_filter, parse_strict, tokenize as tokenize_filter, ComponentKind};
use studio_ldif::{
    fold_line, format_file, format_record, parse_file, LdifFormatParameters, LdifLine, LdifRecord,
    RecordKind,
};
use test_driver::{assert_round_trip, fixtures, FilterSession, LdifSession};

fn params(space_after_colon: bool, line_width: usize, crlf: bool) -> LdifFormatParameters {
    let sep = if crlf { "\r\n" } else { "\n" };
    LdifFormatParameters::new(space_after_colon, line_width, sep).unwrap()
}

// ── Group 1: LDIF documents ─────────────────────────────────────────────

#[test]
fn crlf_end_to_end() {
    let p = params(true, 78, true);
    let file = parse_file(fixtures::CRLF);
    assert_eq!(file.record_count(), 1);
    let record = file.records().next().unwrap();
    assert!(matches!(record.lines()[0], LdifLine::Dn(_)));
    assert!(matches!(record.lines()[1], LdifLine::AttrVal(_)));
    assert!(record.is_valid());
    assert_eq!(format_file(&file, &p), fixtures::CRLF);
}

#[test]
fn content_document() {
    let file = parse_file(fixtures::CONTENT);
    assert_eq!(file.record_count(), 2);
    assert!(file.validate().is_ok());
    let bob = file.records().nth(1).unwrap();
    assert_eq!(bob.kind(), RecordKind::Content);
    let sn = bob
        .attr_vals()
        .into_iter()
        .find(|v| v.key() == "sn")
        .unwrap();
    assert_eq!(sn.value_bytes().unwrap(), "\u{e4}\u{f6}\u{fc}".as_bytes());
    assert_round_trip(fixtures::CONTENT, &LdifFormatParameters::default());
}

#[test]
fn change_document() {
    let file = parse_file(fixtures::CHANGES);
    let kinds: Vec<RecordKind> = file.records().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        [RecordKind::ChangeModify, RecordKind::ChangeModDn, RecordKind::ChangeDelete]
    );
    assert!(file.validate().is_ok(), "{:?}", file.validate());
    assert_eq!(file.records().next().unwrap().mod_specs().len(), 2);
    assert_round_trip(fixtures::CHANGES, &LdifFormatParameters::default());
}

#[test]
fn null_and_empty_input() {
    assert_eq!(parse_file(None::<&str>).record_count(), 0);
    assert_eq!(parse_file("").record_count(), 0);
    assert_eq!(format_file(&parse_file(""), &LdifFormatParameters::default()), "");
}

#[test]
fn convert_line_endings() {
    let crlf = format_file(&parse_file(fixtures::CONTENT), &params(true, 78, true));
    assert!(!crlf.replace("\r\n", "").contains('\n'));
    assert_eq!(
        format_file(&parse_file(crlf.as_str()), &LdifFormatParameters::default()),
        fixtures::CONTENT
    );
}

#[test]
fn built_record_formats_like_parsed() {
    let record = LdifRecord::from_lines(vec![
        LdifLine::dn("cn=foo,ou=system"),
        LdifLine::attr_val("cn", b"foo"),
    ]);
    assert!(record.is_valid());
    assert_eq!(format_record(&record, &params(true, 78, true)), fixtures::CRLF);
}

#[test]
fn invalid_records_survive_and_render() {
    let text = "dn: cn=a\ncn a\n\ndn: cn=b\ncn: b\n";
    let file = parse_file(text);
    assert_eq!(file.record_count(), 2);
    let first = file.records().next().unwrap();
    assert_eq!(first.invalid_cause().as_deref(), Some("Colon missing"));
    assert_eq!(format_file(&file, &LdifFormatParameters::default()), text);
}

// ── Group 2: editing sessions ───────────────────────────────────────────

#[test]
fn typing_an_attribute_fixes_the_record() {
    let mut session = LdifSession::new("dn: cn=a\n");
    assert!(!session.file().records().next().unwrap().is_valid());
    let invalid = session.type_text(session.text().len(), "cn: a\n");
    assert_eq!(invalid.first(), Some(&1));
    assert_eq!(invalid.last(), Some(&0));
    assert_eq!(session.text(), "dn: cn=a\ncn: a\n");
}

#[test]
fn deleting_the_dn_breaks_the_record() {
    let mut session = LdifSession::new("dn: cn=a\ncn: a\n");
    session.delete(0..9);
    let record = session.file().records().next().unwrap();
    assert_eq!(record.invalid_cause().as_deref(), Some("Missing DN"));
    assert!(session.file().validate().is_err());
}

#[test]
fn lookup_follows_edits() {
    let mut session = LdifSession::new("dn: cn=a\ncn: a\n");
    session.insert(0, "dn: cn=z\ncn: z\n\n");
    let record = session.file().record_at(20).unwrap();
    assert_eq!(record.dn().as_deref(), Some("cn=a"));
    assert_eq!(session.reformat(&LdifFormatParameters::default()), session.text());
}

#[test]
fn typing_a_filter() {
    let mut session = FilterSession::new("");
    let causes = session.type_text(fixtures::FILTER);
    let (last, prefixes) = causes.split_last().unwrap();
    assert_eq!(*last, None);
    assert!(prefixes.iter().all(|c| c.is_some()));
    let root = session.model().root().unwrap();
    assert_eq!(root.kind(), ComponentKind::And);
    assert_eq!(root.children().len(), 3);
}

#[test]
fn filter_brackets_pair_up() {
    let text = fixtures::FILTER;
    let model = parse_filter(text);
    for (open, _) in text.match_indices('(') {
        let close = model.bracket_match(open + 1).unwrap();
        assert_eq!(&text[close..close + 1], ")");
        assert_eq!(model.bracket_match(close + 1), Some(open));
    }
}

#[test]
fn strict_filter_errors() {
    assert!(parse_strict(fixtures::FILTER).is_ok());
    assert!(parse_strict("(&)").is_err());
    assert!(parse_strict("(cn=a").is_err());
}

// ── Group 3: properties ─────────────────────────────────────────────────

fn attribute() -> impl Strategy<Value = String> {
    "x[a-zA-Z0-9-]{0,10}"
}

fn leaf_filter() -> impl Strategy<Value = String> {
    (
        "[a-z]{1,8}",
        prop_oneof![Just("="), Just("~="), Just(">="), Just("<=")],
        "[a-z0-9 ]{0,6}[a-z0-9]",
    )
        .prop_map(|(a, op, v)| format!("({}{}{})", a, op, v))
        .boxed()
        .prop_union("[a-z]{1,8}".prop_map(|a| format!("({}=*)", a)).boxed())
}

fn filter() -> impl Strategy<Value = String> {
    leaf_filter().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| format!("(&{})", v.concat())),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| format!("(|{})", v.concat())),
            inner.prop_map(|f| format!("(!{})", f)),
        ]
    })
}

proptest! {
    #[test]
    fn constructed_values_round_trip(
        attr in attribute(),
        value in prop::collection::vec(any::<u8>(), 0..200),
        width in 8usize..100,
        space in any::<bool>(),
        crlf in any::<bool>(),
    ) {
        let p = params(space, width, crlf);
        let record = LdifRecord::from_lines(vec![
            LdifLine::dn("cn=x"),
            LdifLine::attr_val(&attr, &value),
        ]);
        let text = format_record(&record, &p);
        let file = parse_file(text.as_str());
        prop_assert_eq!(file.record_count(), 1);
        let parsed = file.records().next().unwrap();
        prop_assert!(parsed.is_valid(), "{:?}", parsed.invalid_cause());
        let vals = parsed.attr_vals();
        prop_assert_eq!(vals.len(), 1);
        prop_assert_eq!(vals[0].key(), attr.as_str());
        prop_assert_eq!(vals[0].value_bytes().unwrap(), value);
        prop_assert_eq!(format_file(&file, &p), text);
    }

    #[test]
    fn folding_preserves_text(s in "[^\r\n]{0,300}", width in 2usize..100) {
        let folded = fold_line(&s, width, "\n");
        let mut unfolded = String::new();
        for (i, physical) in folded.split('\n').enumerate() {
            prop_assert!(physical.chars().count() <= width);
            if i == 0 {
                unfolded.push_str(physical);
            } else {
                prop_assert!(physical.starts_with(' '));
                unfolded.push_str(&physical[1..]);
            }
        }
        prop_assert_eq!(unfolded, s);
    }

    #[test]
    fn ldif_tokens_cover_any_input(s in "[\\PC\\r\\n\\t]{0,200}") {
        prop_assert_eq!(parse_file(s.as_str()).to_raw_string(), s);
    }

    #[test]
    fn filter_tokens_cover_any_input(s in "\\PC{0,100}") {
        let joined: String = tokenize_filter(&s).iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(&joined, &s);
        let model = parse_filter(&s);
        prop_assert_eq!(model.text(), s.clone());
        for offset in 0..=s.len() + 1 {
            let _ = model.component_at(offset);
            let _ = model.bracket_match(offset);
        }
    }

    #[test]
    fn generated_filters_are_valid(text in filter()) {
        let model = parse_filter(&text);
        prop_assert!(model.is_valid(), "{}: {:?}", text, model.invalid_cause());
        prop_assert_eq!(model.components().len(), text.matches('(').count());
        prop_assert_eq!(model.component_at(0).map(|c| c.offset()), Some(0));
    }
}
