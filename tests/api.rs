use pretty_assertions::assert_eq;

use std::borrow::Cow;
use std::collections::HashMap;

use xmlpull::*;

fn attrs<'a>(list: &[(&'a str, &'a str)]) -> Attributes<'a> {
    list.iter().map(|&(k, v)| (k, Cow::Borrowed(v))).collect()
}

#[test]
fn start_tag_01() {
    let mut p = Tokenizer::new("<tag attr=\"value\">");
    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(p.tag_name(), Some("tag"));
    assert_eq!(p.attributes().unwrap(), Some(attrs(&[("attr", "value")])));
}

#[test]
fn tag_name_is_idempotent() {
    let mut p = Tokenizer::new("<root/>");
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(p.tag_name(), Some("root"));
    assert_eq!(p.tag_name(), Some("root"));
}

#[test]
fn open_and_close() {
    let mut p = Tokenizer::new("<a>text</a>");
    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(p.tag_name(), Some("a"));
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.next(), Event::EndTag);
    assert_eq!(p.tag_name(), Some("a"));
    assert_eq!(p.next(), Event::Eof);
}

#[test]
fn single_tag_then_whitespace() {
    let mut p = Tokenizer::new("<a/> ");
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(p.next(), Event::Eof);
    assert_eq!(p.error(), None);
}

#[test]
fn names_01() {
    let mut p = Tokenizer::new("<foo:bar><foo></foo><foo:bar/></foo:bar>");

    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(p.prefix(), Some("foo"));
    assert_eq!(p.local_name(), Some("bar"));

    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(p.prefix(), Some(""));
    assert_eq!(p.local_name(), Some("foo"));

    assert_eq!(p.next(), Event::EndTag);
    assert_eq!(p.local_name(), Some("foo"));

    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(p.prefix(), Some("foo"));
    assert_eq!(p.local_name(), Some("bar"));

    assert_eq!(p.next(), Event::EndTag);
    assert_eq!(p.local_name(), Some("bar"));
}

#[test]
fn names_02() {
    let mut p = Tokenizer::new("<a:b:c/>");
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(p.prefix(), Some("a"));
    assert_eq!(p.local_name(), Some("c"));
}

#[test]
fn names_not_applicable() {
    let mut p = Tokenizer::new("text<a/>");
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.tag_name(), None);
    assert_eq!(p.prefix(), None);
    assert_eq!(p.local_name(), None);
    assert_eq!(p.pi_target(), None);
}

#[test]
fn text_01() {
    let mut p = Tokenizer::new("<p>&amp;123</p>");
    p.next();
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.raw_text(), Some("&amp;123"));
    assert_eq!(p.text().unwrap().as_deref(), Some("&123"));
}

#[test]
fn text_02() {
    let mut p = Tokenizer::new("<p>&#x20;|&#32;</p>");
    p.next();
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.text().unwrap().as_deref(), Some(" | "));
}

#[test]
fn text_03() {
    let mut p = Tokenizer::new("<p>&lt;&gt;&amp;&quot;&apos;</p>");
    p.next();
    p.next();
    assert_eq!(p.text().unwrap().as_deref(), Some("<>&\"'"));
}

#[test]
fn text_without_references_is_borrowed() {
    let mut p = Tokenizer::new("<p>plain</p>");
    p.next();
    p.next();
    assert!(matches!(p.text(), Ok(Some(Cow::Borrowed("plain")))));
}

#[test]
fn text_raw_content_is_not_resolved() {
    let mut p = Tokenizer::new("<!--&amp;--><![CDATA[&bad]]><?pi &amp;?><!DOCTYPE a [&x]>");

    assert_eq!(p.next(), Event::Comment);
    assert_eq!(p.text().unwrap().as_deref(), Some("&amp;"));

    assert_eq!(p.next(), Event::Cdata);
    assert_eq!(p.text().unwrap().as_deref(), Some("&bad"));

    assert_eq!(p.next(), Event::ProcessingInstruction);
    assert_eq!(p.pi_target(), Some("pi"));
    assert_eq!(p.text().unwrap().as_deref(), Some("&amp;"));

    assert_eq!(p.next(), Event::Doctype);
    assert_eq!(p.text().unwrap().as_deref(), Some(" [&x]"));
}

#[test]
fn text_not_applicable() {
    let mut p = Tokenizer::new("<a b='c'>");
    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(p.raw_text(), None);
    assert_eq!(p.text().unwrap(), None);
}

#[test]
fn text_err_01() {
    let mut p = Tokenizer::new("<p>a &unknown; b</p>");
    p.next();
    assert_eq!(p.next(), Event::Text);

    let err = p.text().unwrap_err();
    assert_eq!(
        err,
        Error::InvalidEntity {
            reference: "&unknown;".to_string(),
            pos: 5,
        }
    );

    // The event itself is not affected.
    assert_eq!(p.event(), Some(Event::Text));
    assert_eq!(p.error(), Some(&err));
    assert_eq!(
        p.error_message().unwrap(),
        "malformed or unknown entity reference '&unknown;' at 1:6"
    );
    assert_eq!(p.raw_text(), Some("a &unknown; b"));

    assert_eq!(p.next(), Event::EndTag);
    assert_eq!(p.error(), None);
}

#[test]
fn text_err_02() {
    let mut p = Tokenizer::new("<p>\nAT&T</p>");
    p.next();
    p.next();
    assert!(p.text().is_err());
    assert_eq!(
        p.error_message().unwrap(),
        "malformed or unknown entity reference '&T' at 2:3"
    );
}

#[test]
fn text_err_03() {
    let mut p = Tokenizer::new("<p>&#xZZ;</p>");
    p.next();
    p.next();
    assert!(p.text().is_err());
}

#[test]
fn attributes_01() {
    let mut p = Tokenizer::new("<e a='1' b=\"2\" c = '3' ns:d='4'/>");
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(
        p.attributes().unwrap(),
        Some(attrs(&[("a", "1"), ("b", "2"), ("c", "3"), ("ns:d", "4")]))
    );
}

#[test]
fn attributes_02() {
    let mut p = Tokenizer::new("<e a='&lt;&#x20;&gt;' b=\"'\" c='\"'>");
    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(
        p.attributes().unwrap(),
        Some(attrs(&[("a", "< >"), ("b", "'"), ("c", "\"")]))
    );
    assert_eq!(
        p.raw_attributes().unwrap(),
        Some(attrs(&[("a", "&lt;&#x20;&gt;"), ("b", "'"), ("c", "\"")]))
    );
}

#[test]
fn attributes_duplicated() {
    let mut p = Tokenizer::new("<e a='1' a='2'/>");
    p.next();
    assert_eq!(p.attributes().unwrap(), Some(attrs(&[("a", "2")])));
}

#[test]
fn attributes_empty() {
    let mut p = Tokenizer::new("<e><e x><e   ><e disabled>");
    for _ in 0..4 {
        assert_eq!(p.next(), Event::StartTag);
        assert_eq!(p.attributes().unwrap(), Some(HashMap::new()));
    }
}

#[test]
fn attributes_empty_value() {
    let mut p = Tokenizer::new("<e x=\"\"/>");
    p.next();
    assert_eq!(p.attributes().unwrap(), Some(attrs(&[("x", "")])));
}

#[test]
fn attributes_namespaces_are_plain() {
    let mut p = Tokenizer::new("<e xmlns='http://www.w3.org' xmlns:n='urn:n'/>");
    p.next();
    assert_eq!(
        p.attributes().unwrap(),
        Some(attrs(&[("xmlns", "http://www.w3.org"), ("xmlns:n", "urn:n")]))
    );
}

#[test]
fn attributes_not_applicable() {
    let mut p = Tokenizer::new("<a>t</a>");
    p.next();
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.attributes().unwrap(), None);
    assert_eq!(p.next(), Event::EndTag);
    assert_eq!(p.attributes().unwrap(), None);
}

#[test]
fn attributes_err_01() {
    let mut p = Tokenizer::new("<e a='1' b='&bad;' c='3'/>");
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(
        p.attributes(),
        Err(Error::InvalidEntity {
            reference: "&bad;".to_string(),
            pos: 12,
        })
    );
    assert_eq!(p.event(), Some(Event::SingleTag));

    // Raw mode never resolves, so it still succeeds.
    assert_eq!(
        p.raw_attributes().unwrap(),
        Some(attrs(&[("a", "1"), ("b", "&bad;"), ("c", "3")]))
    );
}

#[test]
fn attributes_err_02() {
    let mut p = Tokenizer::new("<e a=1 b=2>");
    assert_eq!(p.next(), Event::StartTag);
    assert_eq!(
        p.attributes(),
        Err(Error::UnexpectedEndOfStream {
            expected: "attribute delimiters",
            pos: 4,
        })
    );
    assert_eq!(
        p.error_message().unwrap(),
        "unexpected end of stream while looking for attribute delimiters at 1:5"
    );
    assert_eq!(p.next(), Event::Eof);
}

#[test]
fn mixed_content() {
    let mut p = Tokenizer::new("<a>b<![CDATA[c]]></a>");
    let mut events = Vec::new();
    loop {
        let event = p.next();
        if event == Event::Eof {
            break;
        }

        let data = match event {
            Event::Text | Event::Cdata => p.raw_text(),
            _ => p.tag_name(),
        };
        events.push((event, data.unwrap()));
    }

    assert_eq!(
        events,
        vec![
            (Event::StartTag, "a"),
            (Event::Text, "b"),
            (Event::Cdata, "c"),
            (Event::EndTag, "a"),
        ]
    );
}

#[test]
fn doctype_01() {
    let mut p = Tokenizer::new("<!DOCTYPE foo:bar[<?baz >>><<<<?>]><foo:bar/>");
    assert_eq!(p.next(), Event::Doctype);
    assert_eq!(p.tag_name(), Some("foo:bar"));
    assert_eq!(p.prefix(), Some("foo"));
    assert_eq!(p.raw_text(), Some("[<?baz >>><<<<?>]"));
    assert_eq!(p.pi_target(), None);
    assert_eq!(p.next(), Event::SingleTag);
    assert_eq!(p.tag_name(), Some("foo:bar"));
    assert_eq!(p.next(), Event::Eof);
}

#[test]
fn unterminated_comment() {
    let mut p = Tokenizer::new("<!--foo");
    assert_eq!(p.next(), Event::Error);
    assert_eq!(
        p.error(),
        Some(&Error::UnexpectedEndOfStream {
            expected: "-->",
            pos: 0,
        })
    );
    assert_eq!(p.tag_name(), None);
    assert_eq!(p.next(), Event::Error);
}

#[test]
fn unknown_markup() {
    let mut p = Tokenizer::new("\n\n  <!ELEMENT a>");
    assert_eq!(p.next(), Event::Text);
    assert_eq!(p.next(), Event::Error);
    assert_eq!(
        p.error(),
        Some(&Error::UnknownMarkup {
            found: "<!E".to_string(),
            pos: 4,
        })
    );
    assert_eq!(p.error_message().unwrap(), "unknown markup '<!E' at 3:3");
}

#[test]
fn text_pos_at_01() {
    let p = Tokenizer::new("<a>\n  <b/>\n</a>");
    assert_eq!(p.text_pos_at(0), TextPos::new(1, 1));
    assert_eq!(p.text_pos_at(6), TextPos::new(2, 3));
    assert_eq!(p.text_pos_at(11), TextPos::new(3, 1));
    assert_eq!(p.text_pos_at(6).to_string(), "2:3");
}

#[test]
fn from_str() {
    let mut p = Tokenizer::from("<a/>");
    assert_eq!(p.next(), Event::SingleTag);
}

#[test]
fn error_display() {
    let e = Error::UnexpectedEndOfStream { expected: "?>", pos: 7 };
    assert_eq!(e.to_string(), "unexpected end of stream while looking for ?>");
    assert_eq!(e.pos(), 7);

    let e: Box<dyn std::error::Error> = Box::new(e);
    assert!(e.source().is_none());
}

#[test]
fn independent_tokenizers() {
    let text = "<a>&#65;</a>";
    let mut p1 = Tokenizer::new(text);
    let mut p2 = Tokenizer::new(text);

    p1.next();
    assert_eq!(p1.next(), Event::Text);
    assert_eq!(p2.next(), Event::StartTag);
    assert_eq!(p1.text().unwrap().as_deref(), Some("A"));
    assert_eq!(p2.next(), Event::Text);
    assert_eq!(p2.text().unwrap().as_deref(), Some("A"));
}

#[test]
fn parse_in_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let text = format!("<e n='{}'/>", i);
                let mut p = Tokenizer::new(&text);
                assert_eq!(p.next(), Event::SingleTag);
                let attrs = p.attributes().unwrap().unwrap();
                attrs["n"].to_string()
            })
        })
        .collect();

    let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(values, vec!["0", "1", "2", "3"]);
}
