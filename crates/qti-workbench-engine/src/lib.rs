//! Document engine for QTI assessment items.
//!
//! Raw text in either surface syntax is the single source of truth:
//!
//! - [`parsing`] turns text into [`model::ItemDocument`]s, collecting syntax
//!   errors, semantic warnings and unsupported content without failing
//! - [`serialize`] regenerates text from the model
//! - [`editing`] compiles structured edits into text splices and generates
//!   new items
//! - [`scoring`] evaluates submitted responses against an item
//!
//! ```
//! use qti_workbench_engine::{Format, ResponseValue, parse, score};
//!
//! let text = r#"<assessmentItem identifier="q1">
//!   <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier">
//!     <correctResponse><value>A</value></correctResponse>
//!   </responseDeclaration>
//!   <responseProcessing template="http://www.imsglobal.org/question/qti_v2p1/rptemplates/match_correct"/>
//! </assessmentItem>"#;
//!
//! let output = parse(text, Format::Markup);
//! let result = score(&output.items[0], &ResponseValue::Single("A".into()));
//! assert!(result.is_correct);
//! ```

pub mod editing;
pub mod model;
pub mod parsing;
pub mod scoring;
pub mod serialize;

// Re-export key types for easier usage
pub use editing::{Applied, Document, Edit, EditError, Patch, apply, generate};
pub use model::{Format, InteractionKind, ItemDocument, SpecVersion};
pub use parsing::{ParseOutput, parse};
pub use scoring::{
    ItemScore, ResponseValue, ScoringIssue, ScoringOptions, SliderTolerance, TotalScore,
    aggregate, score, score_with,
};
pub use serialize::serialize;
