//! Typed views over the untyped CST.
//!
//! Each wrapper holds a [`SyntaxNode`] of one kind and exposes accessors for
//! its parts. Text is returned raw: attribute values still contain entity
//! references and object strings still carry their quotes and escapes.
//! Decoding belongs to the layer that knows the document's vocabulary.

use std::ops::Range;

use rowan::TextRange;

use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Convert a rowan range into a byte range.
pub fn byte_range(range: TextRange) -> Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

/// Top-level elements of a markup ROOT.
pub fn root_elements(root: &SyntaxNode) -> impl Iterator<Item = Element> + '_ {
    root.children().filter_map(Element::cast)
}

/// The single top-level value of a structured-object ROOT.
pub fn root_value(root: &SyntaxNode) -> Option<Value> {
    root.children().find_map(Value::cast)
}

/// A markup element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(SyntaxNode);

impl Element {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ELEMENT).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn range(&self) -> Range<usize> {
        byte_range(self.0.text_range())
    }

    pub fn start_tag(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::START_TAG)
    }

    pub fn end_tag(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == SyntaxKind::END_TAG)
    }

    /// The tag name, exactly as written.
    pub fn name(&self) -> Option<String> {
        self.start_tag()?
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| t.kind() == SyntaxKind::NAME)
            .map(|t| t.text().to_string())
    }

    /// True for `<name/>`.
    pub fn is_self_closing(&self) -> bool {
        self.start_tag().is_some_and(|tag| {
            tag.last_token()
                .is_some_and(|t| t.kind() == SyntaxKind::SLASH_R_ANGLE)
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> {
        self.start_tag()
            .into_iter()
            .flat_map(|tag| tag.children().filter_map(Attribute::cast))
    }

    /// Raw value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .find(|a| a.name().as_deref() == Some(name))
            .and_then(|a| a.raw_value())
    }

    /// Everything between the start and end tag.
    pub fn content(&self) -> impl Iterator<Item = SyntaxElement> {
        self.0.children_with_tokens().filter(|child| {
            !matches!(
                child.kind(),
                SyntaxKind::START_TAG | SyntaxKind::END_TAG
            )
        })
    }

    pub fn child_elements(&self) -> impl Iterator<Item = Element> {
        self.0.children().filter_map(Element::cast)
    }

    /// Byte range between the start tag and the end tag. `None` for empty
    /// elements and elements that were never closed.
    pub fn inner_range(&self) -> Option<Range<usize>> {
        let start = self.start_tag()?.text_range().end();
        let end = self.end_tag()?.text_range().start();
        Some(usize::from(start)..usize::from(end))
    }
}

/// `name="value"` inside a start tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute(SyntaxNode);

impl Attribute {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ATTRIBUTE).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn name(&self) -> Option<String> {
        self.token(SyntaxKind::NAME).map(|t| t.text().to_string())
    }

    /// The value without its quotes, entities untouched.
    pub fn raw_value(&self) -> Option<String> {
        let quoted = self.token(SyntaxKind::QUOTED)?;
        let text = quoted.text();
        Some(text[1..text.len() - 1].to_string())
    }

    /// Byte range of the value without its quotes.
    pub fn value_range(&self) -> Option<Range<usize>> {
        let range = byte_range(self.token(SyntaxKind::QUOTED)?.text_range());
        Some(range.start + 1..range.end - 1)
    }

    fn token(&self, kind: SyntaxKind) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(SyntaxElement::into_token)
            .find(|t| t.kind() == kind)
    }
}

/// A structured-object value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Object(Object),
    Array(Array),
    Literal(Literal),
}

impl Value {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::OBJECT => Some(Value::Object(Object(node))),
            SyntaxKind::ARRAY => Some(Value::Array(Array(node))),
            SyntaxKind::LITERAL => Some(Value::Literal(Literal(node))),
            _ => None,
        }
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Value::Object(o) => &o.0,
            Value::Array(a) => &a.0,
            Value::Literal(l) => &l.0,
        }
    }

    pub fn range(&self) -> Range<usize> {
        byte_range(self.syntax().text_range())
    }

    /// Source text of the value.
    pub fn text(&self) -> String {
        self.syntax().text().to_string()
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object(SyntaxNode);

impl Object {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn members(&self) -> impl Iterator<Item = Member> {
        self.0.children().filter_map(Member::cast)
    }

    /// Find a member by name. Only keys written without escapes match.
    pub fn member(&self, key: &str) -> Option<Member> {
        self.members().find(|m| m.raw_key().as_deref() == Some(key))
    }

    /// Shorthand for `member(key)?.value()`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.member(key)?.value()
    }
}

/// `"key": value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member(SyntaxNode);

impl Member {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::MEMBER).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn key_token(&self) -> Option<SyntaxToken> {
        self.0
            .first_token()
            .filter(|t| t.kind() == SyntaxKind::STRING)
    }

    /// The key between its quotes, escapes untouched.
    pub fn raw_key(&self) -> Option<String> {
        let token = self.key_token()?;
        let text = token.text();
        Some(text[1..text.len() - 1].to_string())
    }

    pub fn value(&self) -> Option<Value> {
        self.0.children().find_map(Value::cast)
    }

    pub fn range(&self) -> Range<usize> {
        byte_range(self.0.text_range())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Array(SyntaxNode);

impl Array {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn values(&self) -> impl Iterator<Item = Value> {
        self.0.children().filter_map(Value::cast)
    }
}

/// A scalar: string, number, `true`, `false` or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(SyntaxNode);

impl Literal {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn token(&self) -> Option<SyntaxToken> {
        self.0.first_token()
    }

    pub fn kind(&self) -> SyntaxKind {
        self.token().map_or(SyntaxKind::ERROR, |t| t.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Syntax, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn element_accessors() {
        let source = r#"<simpleChoice identifier="A" fixed="true">Paris <b>!</b></simpleChoice>"#;
        let parse = parse(source, Syntax::Markup);
        let root = parse.syntax();
        let element = root_elements(&root).next().unwrap();

        assert_eq!(element.name().as_deref(), Some("simpleChoice"));
        assert_eq!(element.attribute("identifier").as_deref(), Some("A"));
        assert_eq!(element.attribute("fixed").as_deref(), Some("true"));
        assert_eq!(element.attribute("missing"), None);
        assert!(!element.is_self_closing());
        assert_eq!(&source[element.inner_range().unwrap()], "Paris <b>!</b>");

        let children: Vec<_> = element.child_elements().filter_map(|e| e.name()).collect();
        assert_eq!(children, vec!["b"]);
    }

    #[test]
    fn attribute_value_range_excludes_quotes() {
        let source = r#"<a x='1&amp;2'/>"#;
        let parse = parse(source, Syntax::Markup);
        let root = parse.syntax();
        let element = root_elements(&root).next().unwrap();
        let attr = element.attributes().next().unwrap();
        assert_eq!(&source[attr.value_range().unwrap()], "1&amp;2");
        assert_eq!(attr.raw_value().as_deref(), Some("1&amp;2"));
        assert!(element.is_self_closing());
        assert_eq!(element.inner_range(), None);
    }

    #[test]
    fn object_accessors() {
        let source = r#"{"identifier": "q1", "choices": [{"identifier": "A"}, 2]}"#;
        let parse = parse(source, Syntax::Object);
        let value = root_value(&parse.syntax()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.get("identifier").map(|v| v.text()).as_deref(), Some("\"q1\""));
        let choices = object.get("choices").unwrap();
        let items: Vec<_> = choices.as_array().unwrap().values().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].as_object().is_some());
        match &items[1] {
            Value::Literal(l) => assert_eq!(l.kind(), SyntaxKind::NUMBER),
            other => panic!("expected literal, got {other:?}"),
        }
        assert_eq!(object.get("missing"), None);
    }
}
