//! Markup grammar.
//!
//! ```text
//! ROOT      = (ELEMENT | TEXT | COMMENT | CDATA | PROCESSING_INSTRUCTION | DOCTYPE)*
//! ELEMENT   = START_TAG (content* END_TAG)?
//! START_TAG = '<' NAME (WHITESPACE | ATTRIBUTE)* ('>' | '/>')
//! ATTRIBUTE = NAME WHITESPACE? '=' WHITESPACE? QUOTED
//! END_TAG   = '</' NAME WHITESPACE? '>'
//! ```
//!
//! End tags are matched against a stack of open element names. A closing tag
//! for an ancestor ends every element opened since then, each reported as
//! never closed. A closing tag that matches nothing open is wrapped in an
//! `ERROR` node.

use std::ops::Range;

use super::{MAX_DEPTH, recover};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse a whole markup document.
pub(crate) fn document(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let mut open = Vec::new();

    while !p.at_end() {
        match p.current() {
            SyntaxKind::L_ANGLE_SLASH => stray_end_tag(p),
            SyntaxKind::TEXT if !p.current_text().trim().is_empty() => {
                recover(p, "text outside of any element");
            }
            _ => content(p, &mut open),
        }
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// One content item inside an element (or at the top level).
fn content(p: &mut Parser<'_, '_>, open: &mut Vec<String>) {
    match p.current() {
        SyntaxKind::L_ANGLE => element(p, open),
        SyntaxKind::BAD_TOKEN => {
            let message = bad_token_message(p.current_text());
            recover(p, message);
        }
        _ => p.bump(),
    }
}

fn bad_token_message(text: &str) -> &'static str {
    if text.starts_with("<!--") {
        "unterminated comment"
    } else if text.starts_with("<![CDATA[") {
        "unterminated CDATA section"
    } else if text.starts_with("<?") {
        "unterminated processing instruction"
    } else if text.starts_with("<!") {
        "unterminated declaration"
    } else {
        "unexpected character"
    }
}

enum TagEnd {
    Open,
    Empty,
    Unterminated,
}

fn element(p: &mut Parser<'_, '_>, open: &mut Vec<String>) {
    let m = p.start();
    let tag_start = p.current_range().start;
    let (name, end) = start_tag(p);
    let tag_range = tag_start..p.current_range().start;

    let name = match (name, end) {
        (Some(name), TagEnd::Open) => name,
        _ => {
            m.complete(p, SyntaxKind::ELEMENT);
            return;
        }
    };

    if open.len() >= MAX_DEPTH {
        p.error_at(tag_range, "elements nested too deeply");
        m.complete(p, SyntaxKind::ELEMENT);
        return;
    }

    open.push(name);
    children(p, open, tag_range);
    open.pop();

    m.complete(p, SyntaxKind::ELEMENT);
}

fn children(p: &mut Parser<'_, '_>, open: &mut Vec<String>, tag_range: Range<usize>) {
    let Some(name) = open.last().cloned() else {
        return;
    };

    loop {
        match p.current() {
            SyntaxKind::EOF => {
                p.error_at(tag_range, format!("element <{name}> is never closed"));
                return;
            }
            SyntaxKind::L_ANGLE_SLASH => {
                let closing = if p.nth(1) == SyntaxKind::NAME {
                    p.nth_text(1)
                } else {
                    ""
                };
                if closing == name {
                    end_tag(p);
                    return;
                }
                let ancestors = &open[..open.len() - 1];
                if ancestors.iter().any(|n| n == closing) {
                    p.error_at(tag_range, format!("element <{name}> is never closed"));
                    return;
                }
                stray_end_tag(p);
            }
            _ => content(p, open),
        }
    }
}

/// Parse `<name attrs...>` and report its name and how it ended.
fn start_tag(p: &mut Parser<'_, '_>) -> (Option<String>, TagEnd) {
    let m = p.start();
    let tag_start = p.current_range().start;
    p.bump(); // '<'

    let name = if p.at(SyntaxKind::NAME) {
        let name = p.current_text().to_string();
        p.bump();
        Some(name)
    } else {
        p.error("expected an element name");
        None
    };

    let mut seen: Vec<&str> = Vec::new();
    let end = loop {
        match p.current() {
            SyntaxKind::WHITESPACE => p.bump(),
            SyntaxKind::NAME => {
                let attr = p.current_text();
                if seen.contains(&attr) {
                    p.error(format!("duplicate attribute `{attr}`"));
                }
                seen.push(attr);
                attribute(p);
            }
            SyntaxKind::R_ANGLE => {
                p.bump();
                break TagEnd::Open;
            }
            SyntaxKind::SLASH_R_ANGLE => {
                p.bump();
                break TagEnd::Empty;
            }
            SyntaxKind::EQ | SyntaxKind::QUOTED => recover(p, "expected an attribute name"),
            SyntaxKind::BAD_TOKEN if !p.current_text().starts_with('<') => {
                recover(p, "unexpected character in tag");
            }
            _ => {
                let range = tag_start..p.current_range().start;
                p.error_at(range, "unterminated tag");
                break TagEnd::Unterminated;
            }
        }
    };

    m.complete(p, SyntaxKind::START_TAG);
    (name, end)
}

fn attribute(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let name = p.current_text();
    let name_range = p.current_range();
    p.bump();

    if p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::EQ {
        p.bump();
    }
    if p.eat(SyntaxKind::EQ) {
        if p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::QUOTED {
            p.bump();
        }
        if !p.eat(SyntaxKind::QUOTED) {
            p.error_at(name_range, format!("attribute `{name}` has no quoted value"));
        }
    } else {
        p.error_at(name_range, format!("attribute `{name}` has no value"));
    }

    m.complete(p, SyntaxKind::ATTRIBUTE);
}

fn end_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump(); // '</'
    p.bump(); // NAME
    p.eat(SyntaxKind::WHITESPACE);
    close_end_tag(p);
    m.complete(p, SyntaxKind::END_TAG);
}

/// Consume up to and including the `>` of an end tag.
fn close_end_tag(p: &mut Parser<'_, '_>) {
    loop {
        match p.current() {
            SyntaxKind::R_ANGLE => {
                p.bump();
                return;
            }
            SyntaxKind::WHITESPACE
            | SyntaxKind::NAME
            | SyntaxKind::EQ
            | SyntaxKind::QUOTED
            | SyntaxKind::SLASH_R_ANGLE => recover(p, "unexpected content in closing tag"),
            SyntaxKind::BAD_TOKEN if !p.current_text().starts_with('<') => {
                recover(p, "unexpected character in tag");
            }
            _ => {
                p.error("unterminated closing tag");
                return;
            }
        }
    }
}

/// A closing tag with no open element to close.
fn stray_end_tag(p: &mut Parser<'_, '_>) {
    let m = p.start();
    let name = if p.nth(1) == SyntaxKind::NAME {
        p.nth_text(1)
    } else {
        ""
    };
    p.error(format!("unexpected closing tag </{name}>"));
    p.bump(); // '</'
    p.eat(SyntaxKind::NAME);
    p.eat(SyntaxKind::WHITESPACE);
    close_end_tag(p);
    m.complete(p, SyntaxKind::ERROR);
}
