use bolota_core::codec::{encode_record, FileHeader, HEADER_LEN};
use bolota_core::{
    decode_document, encode_document, CodecError, DecodeOptions, DefinitionCatalog, Document,
    Field, FieldId, FieldKind, FieldTree, FormatError, IconId, Section, Timestamp,
    FORMAT_VERSION,
};

fn created() -> Timestamp {
    Timestamp::new(2023, 11, 5, 8, 15, 42).unwrap()
}

fn properties(title: &str, subtitle: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_record(&Field::text(title), 0, &mut out).unwrap();
    encode_record(&Field::text(subtitle), 0, &mut out).unwrap();
    encode_record(&Field::date("", created()), 0, &mut out).unwrap();
    out
}

fn topic_records(depths: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    for (index, depth) in depths.iter().enumerate() {
        encode_record(&Field::text(format!("r{}", index + 1)), *depth, &mut out).unwrap();
    }
    out
}

fn assemble(version: u8, properties: &[u8], topics: &[u8]) -> Vec<u8> {
    let header = FileHeader {
        version,
        properties_length: properties.len() as u32,
        topics_length: topics.len() as u32,
    };
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(properties);
    out.extend_from_slice(topics);
    out
}

fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    decode_document(bytes, DecodeOptions::default())
}

fn text(tree: &FieldTree, id: FieldId) -> &str {
    tree.get(id).and_then(|field| field.text_str()).unwrap()
}

/// Shape of a subtree as nested (text, children) pairs, for structural comparison.
fn shape(tree: &FieldTree, id: FieldId) -> Vec<(Field, Vec<(Field, usize)>)> {
    tree.children(id)
        .iter()
        .map(|child| {
            let grandchildren = tree
                .children(*child)
                .iter()
                .map(|grandchild| {
                    (
                        tree.get(*grandchild).unwrap().clone(),
                        tree.preorder(*grandchild).count(),
                    )
                })
                .collect();
            (tree.get(*child).unwrap().clone(), grandchildren)
        })
        .collect()
}

#[test]
fn depth_sequence_rebuilds_expected_tree() {
    let bytes = assemble(
        FORMAT_VERSION,
        &properties("t", "s"),
        &topic_records(&[0, 1, 1, 2, 1, 0]),
    );
    let doc = decode(&bytes).unwrap();
    let tree = doc.tree();

    let top = doc.topics();
    assert_eq!(top.len(), 2);
    assert_eq!(text(tree, top[0]), "r1");
    assert_eq!(text(tree, top[1]), "r6");

    let r1_children: Vec<_> = tree.children(top[0]).iter().map(|id| text(tree, *id)).collect();
    assert_eq!(r1_children, vec!["r2", "r3", "r5"]);

    let r3 = tree.children(top[0])[1];
    let r3_children: Vec<_> = tree.children(r3).iter().map(|id| text(tree, *id)).collect();
    assert_eq!(r3_children, vec!["r4"]);
    assert_eq!(tree.depth(tree.children(r3)[0]).unwrap(), 2);
    assert!(tree.children(top[1]).is_empty());
}

#[test]
fn descending_two_levels_is_rejected() {
    let bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topic_records(&[0, 2]));
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Format(FormatError::DepthJump {
            previous: 0,
            found: 2,
            ..
        })
    ));
}

#[test]
fn newer_version_is_distinct_from_corruption() {
    let bytes = assemble(2, &properties("t", "s"), &topic_records(&[0]));
    let err = decode(&bytes).unwrap_err();
    assert_eq!(
        err,
        CodecError::NewerVersion {
            found: 2,
            supported: 1
        }
    );
    assert!(err.is_newer_version());
}

#[test]
fn foreign_magic_fails_before_sections() {
    let mut bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topic_records(&[0]));
    bytes[0] = b'X';
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::InvalidMagic { .. })
    ));

    let mut garbage = b"PNG".to_vec();
    garbage.extend_from_slice(&[0xff; 64]);
    assert!(matches!(
        decode(&garbage).unwrap_err(),
        CodecError::Format(FormatError::InvalidMagic { found }) if &found == b"PNG"
    ));
}

#[test]
fn multibyte_text_length_uses_utf8_bytes() {
    let mut doc = Document::with_created(created());
    doc.push_topic(Field::text("café"));
    let bytes = encode_document(&doc).unwrap();

    let header = FileHeader::parse(&bytes).unwrap();
    let topics_start = HEADER_LEN + header.properties_length as usize;
    let record = &bytes[topics_start..];
    assert_eq!(u16::from_le_bytes([record[4], record[5]]), 5);
    assert_eq!(u16::from_le_bytes([record[2], record[3]]), 11);
    assert_eq!(&record[6..11], "café".as_bytes());
}

#[test]
fn empty_document_has_zero_length_topics_section() {
    let doc = Document::with_created(created());
    let bytes = encode_document(&doc).unwrap();
    let header = FileHeader::parse(&bytes).unwrap();
    assert_eq!(header.topics_length, 0);
    assert_eq!(
        bytes.len(),
        HEADER_LEN + header.properties_length as usize
    );

    let decoded = decode(&bytes).unwrap();
    assert!(decoded.topics().is_empty());
    assert_eq!(decoded.created(), created());
}

#[test]
fn round_trip_preserves_shape_and_payloads() {
    let mut doc = Document::with_created(created());
    doc.set_title("Plano de viagem");
    doc.set_subtitle("Roteiro ✈ 2024");

    let day_one = doc.push_topic(Field::text("Dia 1"));
    let flight = doc
        .push_child(
            day_one,
            Field::date("Voo", Timestamp::new(2024, 6, 1, 6, 45, 0).unwrap()),
        )
        .unwrap();
    doc.push_child(flight, Field::icon("Portão 12", IconId(3)))
        .unwrap();
    doc.push_child(day_one, Field::blank()).unwrap();
    doc.push_topic(Field::blank());
    let day_two = doc.push_topic(Field::text("Dia 2"));
    doc.push_child(day_two, Field::text("")).unwrap();

    let bytes = encode_document(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.title(), "Plano de viagem");
    assert_eq!(decoded.subtitle(), "Roteiro ✈ 2024");
    assert_eq!(decoded.created(), created());
    assert_eq!(
        shape(decoded.tree(), decoded.tree().root()),
        shape(doc.tree(), doc.tree().root())
    );

    let original: Vec<_> = doc
        .tree()
        .preorder(doc.tree().root())
        .map(|(id, depth)| (doc.tree().get(id).unwrap().clone(), depth))
        .collect();
    let reread: Vec<_> = decoded
        .tree()
        .preorder(decoded.tree().root())
        .map(|(id, depth)| (decoded.tree().get(id).unwrap().clone(), depth))
        .collect();
    assert_eq!(reread, original);

    assert_eq!(encode_document(&decoded).unwrap(), bytes);
}

#[test]
fn encode_uses_live_depth_after_restructuring() {
    let mut doc = Document::with_created(created());
    let a = doc.push_topic(Field::text("a"));
    let b = doc.push_child(a, Field::text("b")).unwrap();
    let c = doc.push_child(b, Field::text("c")).unwrap();

    let root = doc.tree().root();
    doc.tree_mut().move_field(c, root, None).unwrap();

    let decoded = decode(&encode_document(&doc).unwrap()).unwrap();
    let tree = decoded.tree();
    let top: Vec<_> = decoded.topics().iter().map(|id| text(tree, *id)).collect();
    assert_eq!(top, vec!["a", "c"]);
    assert_eq!(tree.children(decoded.topics()[0]).len(), 1);
}

#[test]
fn trailing_bytes_after_topics_are_rejected() {
    let mut bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topic_records(&[0]));
    bytes.push(0);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::TrailingBytes {
            after: Section::Topics,
            count: 1
        })
    );
}

#[test]
fn truncated_topics_section_is_rejected() {
    let mut bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topic_records(&[0, 1]));
    bytes.truncate(bytes.len() - 2);
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::TruncatedSection {
            section: Section::Topics,
            ..
        })
    ));
}

#[test]
fn record_cut_inside_section_is_rejected() {
    let mut topics = topic_records(&[0]);
    topics.extend_from_slice(&[b'T', 0, 10]);
    let bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topics);
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::TruncatedRecord { .. })
    ));
}

#[test]
fn unknown_field_tag_is_rejected() {
    let mut topics = topic_records(&[0]);
    topics.extend_from_slice(&[b'Z', 0, 6, 0, 0, 0]);
    let bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topics);
    let offset = topic_records(&[0]).len();
    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::InvalidFieldType { tag: b'Z', offset })
    );
}

#[test]
fn properties_must_hold_title_subtitle_and_date() {
    let mut props = Vec::new();
    encode_record(&Field::text("t"), 0, &mut props).unwrap();
    encode_record(&Field::text("s"), 0, &mut props).unwrap();
    encode_record(&Field::text("not a date"), 0, &mut props).unwrap();
    let bytes = assemble(FORMAT_VERSION, &props, &[]);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::UnexpectedFieldType {
            expected: FieldKind::Date,
            found: FieldKind::Text,
        })
    );

    let mut padded = properties("t", "s");
    padded.push(0);
    let bytes = assemble(FORMAT_VERSION, &padded, &[]);
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::TrailingBytes {
            after: Section::Properties,
            count: 1
        })
    ));
}

#[test]
fn strict_catalog_controls_unknown_icons() {
    let mut doc = Document::with_created(created());
    doc.push_topic(Field::icon("mystery", IconId(200)));
    let bytes = encode_document(&doc).unwrap();

    let permissive = DefinitionCatalog::parse("id\tdescription\tfilename\n1\tBullet\tb.png\n")
        .unwrap();
    let decoded = decode_document(&bytes, DecodeOptions::with_catalog(&permissive)).unwrap();
    assert_eq!(
        decoded.tree().get(decoded.topics()[0]).unwrap().icon_id(),
        Some(IconId(200))
    );

    let strict = permissive.with_strict(true);
    assert_eq!(
        decode_document(&bytes, DecodeOptions::with_catalog(&strict)).unwrap_err(),
        CodecError::Format(FormatError::UnresolvedIcon(IconId(200)))
    );
}

#[test]
fn impossible_date_payload_is_rejected() {
    let mut props = Vec::new();
    encode_record(&Field::text("t"), 0, &mut props).unwrap();
    encode_record(&Field::text("s"), 0, &mut props).unwrap();
    encode_record(&Field::date("", created()), 0, &mut props).unwrap();
    let month = props.len() - 6;
    props[month] = 13;
    let bytes = assemble(FORMAT_VERSION, &props, &[]);
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::InvalidTimestamp { .. })
    ));
}

#[test]
fn blank_record_carrying_text_is_rejected() {
    let topics = [b'0', 0, 8, 0, 2, 0, b'h', b'i'];
    let bytes = assemble(FORMAT_VERSION, &properties("t", "s"), &topics);

    assert_eq!(
        decode(&bytes).unwrap_err(),
        CodecError::Format(FormatError::UnexpectedText { offset: 0 })
    );
}

#[test]
fn short_header_is_truncated_not_foreign() {
    let full = assemble(FORMAT_VERSION, &properties("t", "s"), &[]);
    for len in 0..HEADER_LEN {
        assert_eq!(
            decode(&full[..len]).unwrap_err(),
            CodecError::Format(FormatError::TruncatedHeader { available: len }),
            "header cut at {len} bytes"
        );
    }
}
