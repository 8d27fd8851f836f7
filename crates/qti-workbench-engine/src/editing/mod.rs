/*!
 * # Editing
 *
 * Structured edits expressed as splices over the raw text.
 *
 * ## Single source of truth
 *
 * The raw text is authoritative. The item model is a projection that
 * [`parse`](crate::parsing::parse) recomputes after every change; it is
 * never patched in place, so text and model cannot drift apart.
 *
 * ## Edits compile to deltas
 *
 * An [`Edit`] is validated against the parsed model, then compiled into
 * an `xi_rope` delta over the located item boundaries:
 *
 * - **`SetCorrectResponse`** rewrites only the inner span of one
 *   correct-response block, or inserts/removes that block
 * - **`InsertItem`** and **`ReorderItems`** splice whole item fragments
 * - **`ReplaceWhole`** swaps the entire text
 *
 * Every result is re-parsed before it is accepted. An edit that would leave
 * more syntax errors than the text had before is rejected with
 * [`EditError::WouldIntroduceErrors`], and the text is left untouched.
 *
 * ## Module Structure
 *
 * - **`commands`**: [`Edit`], [`EditError`] and the stateless [`apply`]
 * - **`document`**: [`Document`], a rope buffer with a format lock, version
 *   counter and the latest parse
 * - **`generate`**: minimal new items for every supported interaction kind
 * - **`patch`**: changed ranges of an applied edit
 *
 * ## Usage Pattern
 *
 * ```rust
 * use qti_workbench_engine::editing::{Edit, apply};
 * use qti_workbench_engine::model::Format;
 *
 * let text = r#"<assessmentItem identifier="q1">
 *   <responseDeclaration identifier="RESPONSE" cardinality="single" baseType="identifier"/>
 * </assessmentItem>"#;
 *
 * let applied = apply(text, Format::Markup, &Edit::SetCorrectResponse {
 *     item_id: "q1".into(),
 *     response_id: None,
 *     values: vec!["B".into()],
 * })
 * .unwrap();
 * assert!(applied.text.contains("<value>B</value>"));
 * ```
 */

pub mod commands;
pub mod document;
pub mod generate;
pub mod patch;

pub use commands::{Applied, Edit, EditError, apply};
pub use document::Document;
pub use generate::generate;
pub use patch::Patch;
