//! SyntaxKind enum for all tokens and nodes in the QTI CSTs.
//!
//! Both surface syntaxes (markup and structured-object) share a single enum,
//! following the rust-analyzer model. Every byte in the source must appear as
//! a token in the tree.

/// All syntax kinds for the markup and structured-object CSTs.
///
/// This enum represents both tokens (lexer output) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Shared tokens ===
    /// Whitespace inside a tag or between structured-object tokens
    WHITESPACE,
    /// A character sequence no lexer rule accepts (unterminated comment, stray quote, ...)
    BAD_TOKEN,

    // === Markup tokens ===
    /// Character data between tags, entities still encoded
    TEXT,
    /// `<!-- ... -->`
    COMMENT,
    /// `<![CDATA[ ... ]]>`
    CDATA,
    /// `<? ... ?>`, including the XML declaration
    PROCESSING_INSTRUCTION,
    /// `<!DOCTYPE ...>` and other `<!` declarations
    DOCTYPE,
    /// `<` opening a start tag
    L_ANGLE,
    /// `</` opening an end tag
    L_ANGLE_SLASH,
    /// `>` closing a tag
    R_ANGLE,
    /// `/>` closing an empty-element tag
    SLASH_R_ANGLE,
    /// `=` between attribute name and value
    EQ,
    /// Element or attribute name
    NAME,
    /// Quoted attribute value, quotes included
    QUOTED,

    // === Structured-object tokens ===
    /// `{`
    L_BRACE,
    /// `}`
    R_BRACE,
    /// `[`
    L_BRACKET,
    /// `]`
    R_BRACKET,
    /// `:`
    COLON,
    /// `,`
    COMMA,
    /// String literal, quotes and escapes included
    STRING,
    /// Number literal
    NUMBER,
    /// `true`
    TRUE_KW,
    /// `false`
    FALSE_KW,
    /// `null`
    NULL_KW,

    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// A markup element: start tag, content, end tag
    ELEMENT,
    /// `<name attr="v">` or `<name/>`
    START_TAG,
    /// `</name>`
    END_TAG,
    /// `name="value"` inside a start tag
    ATTRIBUTE,
    /// `{ ... }`
    OBJECT,
    /// `"key": value` inside an object
    MEMBER,
    /// `[ ... ]`
    ARRAY,
    /// A scalar value wrapping one literal token
    LITERAL,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia: whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::COMMENT)
    }

    /// Returns true if this token kind starts a structured-object value.
    pub fn starts_value(self) -> bool {
        matches!(
            self,
            Self::L_BRACE
                | Self::L_BRACKET
                | Self::STRING
                | Self::NUMBER
                | Self::TRUE_KW
                | Self::FALSE_KW
                | Self::NULL_KW
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QtiLang {}

impl rowan::Language for QtiLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<QtiLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<QtiLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<QtiLang>;
