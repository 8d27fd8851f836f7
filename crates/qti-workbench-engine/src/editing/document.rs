use xi_rope::Rope;

use super::commands::{Edit, EditError, compile};
use super::patch::{Patch, changed_ranges};
use crate::model::{Format, ItemDocument};
use crate::parsing::{ParseOutput, parse};

/// The raw text of one document and its most recent parse.
///
/// The text in the rope buffer is the single source of truth; the parsed
/// items are recomputed from it after every change and never edited
/// directly. Edits go through [`Document::apply`], which splices the buffer
/// and re-parses.
///
/// ```
/// use qti_workbench_engine::editing::{Document, Edit};
/// use qti_workbench_engine::model::Format;
///
/// let mut doc = Document::new(Format::Markup);
/// let patch = doc
///     .apply(&Edit::InsertItem {
///         fragment: r#"<assessmentItem identifier="q1"><itemBody/></assessmentItem>"#.into(),
///         at: 0,
///     })
///     .unwrap();
/// assert_eq!(patch.version, 1);
/// assert_eq!(doc.items()[0].id, "q1");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    buffer: Rope,
    format: Format,
    version: u64,
    parsed: ParseOutput,
}

impl Document {
    /// An empty document in `format`.
    pub fn new(format: Format) -> Self {
        Self::from_text("", format)
    }

    pub fn from_text(text: &str, format: Format) -> Self {
        Self {
            buffer: Rope::from(text),
            format,
            version: 0,
            parsed: parse(text, format),
        }
    }

    /// Load UTF-8 bytes, detecting the format from the content.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text, Format::detect(text)))
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn parsed(&self) -> &ParseOutput {
        &self.parsed
    }

    pub fn items(&self) -> &[ItemDocument] {
        &self.parsed.items
    }

    /// True when the buffer holds nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.buffer
            .slice_to_cow(0..self.buffer.len())
            .trim()
            .is_empty()
    }

    /// Change the format. Only allowed while the document is empty: existing
    /// text is never re-interpreted in another syntax.
    pub fn set_format(&mut self, format: Format) -> Result<(), EditError> {
        if format == self.format {
            return Ok(());
        }
        if !self.is_empty() {
            return Err(EditError::FormatLocked {
                from: self.format,
                to: format,
            });
        }
        self.format = format;
        self.reparse();
        Ok(())
    }

    /// Replace the whole text without the error check [`Edit::ReplaceWhole`]
    /// applies. Used when text arrives from outside (a file, a paste).
    pub fn load(&mut self, text: &str) {
        self.buffer = Rope::from(text);
        self.version += 1;
        self.reparse();
    }

    pub fn clear(&mut self) {
        self.load("");
    }

    /// Apply one edit. On error the document is unchanged.
    pub fn apply(&mut self, edit: &Edit) -> Result<Patch, EditError> {
        let (delta, text) = compile(&self.buffer, self.format, edit)?;
        self.buffer = text;
        self.version += 1;
        self.reparse();

        Ok(Patch {
            changed: changed_ranges(&delta),
            version: self.version,
        })
    }

    fn reparse(&mut self) {
        self.parsed = parse(&self.buffer.to_string(), self.format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ITEM: &str = r#"<assessmentItem identifier="q1">
  <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
    <correctResponse>
      <value>A</value>
    </correctResponse>
  </responseDeclaration>
  <itemBody>
    <choiceInteraction responseIdentifier="RESPONSE" maxChoices="1">
      <simpleChoice identifier="A">Yes</simpleChoice>
      <simpleChoice identifier="B">No</simpleChoice>
    </choiceInteraction>
  </itemBody>
</assessmentItem>
"#;

    #[test]
    fn from_bytes_detects_format() {
        let doc = Document::from_bytes(ITEM.as_bytes()).unwrap();
        assert_eq!(doc.format(), Format::Markup);
        assert_eq!(doc.text(), ITEM);
        assert_eq!(doc.items().len(), 1);

        let doc = Document::from_bytes(b"  [{\"identifier\": \"j\"}]").unwrap();
        assert_eq!(doc.format(), Format::StructuredObject);
        assert_eq!(doc.items()[0].id, "j");
    }

    #[test]
    fn from_bytes_rejects_invalid_utf8() {
        assert!(Document::from_bytes(&[0xFF, 0xFE, 0xFD]).is_err());
    }

    #[test]
    fn apply_updates_text_model_and_version() {
        let mut doc = Document::from_text(ITEM, Format::Markup);
        let patch = doc
            .apply(&Edit::SetCorrectResponse {
                item_id: "q1".into(),
                response_id: None,
                values: vec!["B".into()],
            })
            .unwrap();

        assert_eq!(patch.version, 1);
        assert_eq!(doc.version(), 1);
        assert_eq!(patch.changed.len(), 1);
        assert_eq!(
            doc.items()[0].response_declarations[0].correct_response,
            vec!["B"]
        );
        assert_eq!(doc.text(), ITEM.replace("<value>A</value>", "<value>B</value>"));
    }

    #[test]
    fn rejected_edit_leaves_document_alone() {
        let mut doc = Document::from_text(ITEM, Format::Markup);
        let result = doc.apply(&Edit::ReorderItems { order: vec![1] });
        assert!(matches!(result, Err(EditError::InvalidOrder(_))));
        assert_eq!(doc.text(), ITEM);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn format_is_locked_once_there_is_content() {
        let mut doc = Document::new(Format::Markup);
        assert!(doc.is_empty());
        doc.set_format(Format::StructuredObject).unwrap();
        assert_eq!(doc.format(), Format::StructuredObject);

        doc.load("[]");
        assert_eq!(
            doc.set_format(Format::Markup),
            Err(EditError::FormatLocked {
                from: Format::StructuredObject,
                to: Format::Markup
            })
        );
        // Asking for the current format is fine.
        doc.set_format(Format::StructuredObject).unwrap();

        doc.clear();
        doc.set_format(Format::Markup).unwrap();
        assert_eq!(doc.format(), Format::Markup);
    }

    #[test]
    fn load_reparses_even_broken_text() {
        let mut doc = Document::new(Format::Markup);
        doc.load("<assessmentItem identifier=\"x\">");
        assert!(doc.items().is_empty());
        assert_eq!(doc.parsed().errors.len(), 1);
        assert_eq!(doc.version(), 1);
    }
}
