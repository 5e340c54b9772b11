use shortcodes_parser::{Document, Node, ParseError, TagKind};

fn tags(input: &str) -> Vec<(String, TagKind, Option<usize>)> {
    Document::parse(input)
        .nodes()
        .iter()
        .filter_map(|node| match node {
            Node::Tag { tag, partner } => Some((tag.name.clone(), tag.kind, *partner)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_mixed_document() {
    let input = "Intro [note level=2]Read [link url='https://x.test/?a=1&b=2']this[/link].[/note] [hr/] end";
    let doc = Document::parse(input);

    assert_eq!(
        tags(input),
        vec![
            ("note".to_string(), TagKind::Open, Some(7)),
            ("link".to_string(), TagKind::Open, Some(5)),
            ("link".to_string(), TagKind::Close, Some(3)),
            ("note".to_string(), TagKind::Close, Some(1)),
            ("hr".to_string(), TagKind::SelfClosing, None),
        ]
    );
    assert_eq!(doc.errors().count(), 0);

    let link = doc
        .nodes()
        .iter()
        .find_map(|node| match node {
            Node::Tag { tag, .. } if tag.name == "link" && tag.kind == TagKind::Open => Some(tag),
            _ => None,
        })
        .expect("link tag");
    assert_eq!(link.arguments.named("url"), Some("https://x.test/?a=1&b=2"));
}

#[test]
fn test_malformed_spans_do_not_hide_later_tags() {
    let input = "[a [b]x[/b] [c";
    let doc = Document::parse(input);
    let errors: Vec<_> = doc.errors().cloned().collect();

    assert_eq!(
        errors,
        vec![
            ParseError::UnexpectedBracket { offset: 3 },
            ParseError::UnterminatedTag { offset: 12 },
        ]
    );
    assert_eq!(
        tags(input),
        vec![
            ("b".to_string(), TagKind::Open, Some(3)),
            ("b".to_string(), TagKind::Close, Some(1)),
        ]
    );
}

#[test]
fn test_multiline_tag() {
    let input = "[card\n  title='Hello'\n  tone=warm\n]body[/card]";
    let doc = Document::parse(input);
    match &doc.nodes()[0] {
        Node::Tag { tag, partner } => {
            assert_eq!(tag.arguments.named("title"), Some("Hello"));
            assert_eq!(tag.arguments.named("tone"), Some("warm"));
            assert_eq!(*partner, Some(2));
        }
        other => panic!("unexpected node {:?}", other),
    }
}
