//! Structured-object grammar.
//!
//! ```text
//! ROOT    = WHITESPACE? value? WHITESPACE?
//! value   = OBJECT | ARRAY | LITERAL
//! OBJECT  = '{' (MEMBER (',' MEMBER)*)? '}'
//! MEMBER  = STRING ':' value
//! ARRAY   = '[' (value (',' value)*)? ']'
//! LITERAL = STRING | NUMBER | 'true' | 'false' | 'null'
//! ```
//!
//! Unclosed objects and arrays are reported at their opening bracket, since
//! that is where the reader needs to look.

use super::{MAX_DEPTH, recover};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse a whole structured-object document.
pub(crate) fn document(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);

    if !p.at_end() {
        value(p, 0);
        p.eat(SyntaxKind::WHITESPACE);
    }

    if !p.at_end() {
        let e = p.start();
        p.error("unexpected content after the top-level value");
        while !p.at_end() {
            p.bump();
        }
        e.complete(p, SyntaxKind::ERROR);
    }

    m.complete(p, SyntaxKind::ROOT);
}

fn value(p: &mut Parser<'_, '_>, depth: usize) {
    if depth >= MAX_DEPTH {
        recover(p, "values nested too deeply");
        return;
    }

    match p.current() {
        SyntaxKind::L_BRACE => object(p, depth),
        SyntaxKind::L_BRACKET => array(p, depth),
        SyntaxKind::STRING
        | SyntaxKind::NUMBER
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW => {
            let m = p.start();
            p.bump();
            m.complete(p, SyntaxKind::LITERAL);
        }
        SyntaxKind::BAD_TOKEN => {
            let message = if p.current_text().starts_with('"') {
                "invalid string literal"
            } else {
                "unexpected character"
            };
            recover(p, message);
        }
        SyntaxKind::EOF => p.error("expected a value"),
        _ => recover(p, "expected a value"),
    }
}

fn object(p: &mut Parser<'_, '_>, depth: usize) {
    let m = p.start();
    let open = p.current_range();
    p.bump(); // '{'

    let mut after_comma = false;
    loop {
        p.eat(SyntaxKind::WHITESPACE);
        match p.current() {
            SyntaxKind::STRING => member(p, depth),
            SyntaxKind::R_BRACE => {
                if after_comma {
                    p.error("trailing comma");
                }
                p.bump();
                break;
            }
            SyntaxKind::EOF => {
                p.error_at(open, "unclosed object");
                break;
            }
            _ => {
                after_comma = false;
                recover(p, "expected a member name");
                continue;
            }
        }

        after_comma = false;
        p.eat(SyntaxKind::WHITESPACE);
        match p.current() {
            SyntaxKind::COMMA => {
                p.bump();
                after_comma = true;
            }
            SyntaxKind::R_BRACE => {
                p.bump();
                break;
            }
            SyntaxKind::EOF => {
                p.error_at(open, "unclosed object");
                break;
            }
            _ => recover(p, "expected `,` or `}`"),
        }
    }

    m.complete(p, SyntaxKind::OBJECT);
}

fn member(p: &mut Parser<'_, '_>, depth: usize) {
    let m = p.start();
    p.bump(); // key
    p.eat(SyntaxKind::WHITESPACE);

    if p.eat(SyntaxKind::COLON) {
        p.eat(SyntaxKind::WHITESPACE);
        if p.current().starts_value() || p.at(SyntaxKind::BAD_TOKEN) {
            value(p, depth + 1);
        } else {
            p.error("expected a value");
        }
    } else {
        p.error("expected `:` after member name");
    }

    m.complete(p, SyntaxKind::MEMBER);
}

fn array(p: &mut Parser<'_, '_>, depth: usize) {
    let m = p.start();
    let open = p.current_range();
    p.bump(); // '['

    let mut after_comma = false;
    loop {
        p.eat(SyntaxKind::WHITESPACE);
        match p.current() {
            SyntaxKind::R_BRACKET => {
                if after_comma {
                    p.error("trailing comma");
                }
                p.bump();
                break;
            }
            SyntaxKind::EOF => {
                p.error_at(open, "unclosed array");
                break;
            }
            kind if kind.starts_value() || kind == SyntaxKind::BAD_TOKEN => value(p, depth + 1),
            _ => {
                after_comma = false;
                recover(p, "expected a value");
                continue;
            }
        }

        after_comma = false;
        p.eat(SyntaxKind::WHITESPACE);
        match p.current() {
            SyntaxKind::COMMA => {
                p.bump();
                after_comma = true;
            }
            SyntaxKind::R_BRACKET => {
                p.bump();
                break;
            }
            SyntaxKind::EOF => {
                p.error_at(open, "unclosed array");
                break;
            }
            _ => recover(p, "expected `,` or `]`"),
        }
    }

    m.complete(p, SyntaxKind::ARRAY);
}

#[cfg(test)]
mod tests {
    use crate::{Syntax, SyntaxKind, parse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn messages(input: &str) -> Vec<String> {
        parse(input, Syntax::Object)
            .errors()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    #[rstest]
    #[case::scalar("42")]
    #[case::empty_object("{}")]
    #[case::empty_array(" [ ] ")]
    #[case::item(r#"{"type": "assessmentItem", "identifier": "q1", "itemBody": ["Hi"]}"#)]
    #[case::nested(r#"[{"a": [true, false, null]}, {"b": {"c": -1.5e2}}]"#)]
    fn well_formed_input_is_clean(#[case] input: &str) {
        let parse = parse(input, Syntax::Object);
        assert!(parse.is_clean(), "{:?}", parse.errors());
        assert_eq!(parse.syntax().text().to_string(), input);
    }

    #[test]
    fn object_structure() {
        let parse = parse(r#"{"a": 1, "b": [2]}"#, Syntax::Object);
        let object = parse.syntax().first_child().unwrap();
        assert_eq!(object.kind(), SyntaxKind::OBJECT);
        let members: Vec<_> = object.children().collect();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m.kind() == SyntaxKind::MEMBER));
        assert_eq!(
            members[1].last_child().map(|n| n.kind()),
            Some(SyntaxKind::ARRAY)
        );
    }

    #[test]
    fn unclosed_object_reported_at_open_brace() {
        let parse = parse(r#"{"a": {"b": 1}"#, Syntax::Object);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].message, "unclosed object");
        assert_eq!(parse.errors()[0].range, 0..1);
    }

    #[rstest]
    #[case::trailing_comma("[1,]", "trailing comma")]
    #[case::trailing_comma_object(r#"{"a": 1,}"#, "trailing comma")]
    #[case::missing_comma("[1 2]", "expected `,` or `]`")]
    #[case::missing_colon(r#"{"a" 1}"#, "expected `:` after member name")]
    #[case::bare_key("{a: 1}", "expected a member name")]
    #[case::unclosed_array("[1, 2", "unclosed array")]
    #[case::trailing_content("{} {}", "unexpected content after the top-level value")]
    fn first_error(#[case] input: &str, #[case] expected: &str) {
        let errors = messages(input);
        assert_eq!(errors.first().map(String::as_str), Some(expected), "{errors:?}");
    }

    #[test]
    fn invalid_escape_is_reported() {
        let errors = messages(r#"{"a": "bad \q"}"#);
        assert!(!errors.is_empty());
    }

    #[test]
    fn garbage_is_lossless() {
        let input = "{[}\"x\": ,,] tru 1.2.3 \"";
        let parse = parse(input, Syntax::Object);
        assert!(!parse.is_clean());
        assert_eq!(parse.syntax().text().to_string(), input);
    }

    #[test]
    fn deep_nesting_terminates() {
        let input = "[".repeat(1000);
        let parse = parse(&input, Syntax::Object);
        assert!(!parse.is_clean());
        assert_eq!(parse.syntax().text().to_string(), input);
    }
}
