//! Subcommand implementations. Each returns the text to print.

use anyhow::{Context, Result, bail};
use qti_workbench_config::Config;
use qti_workbench_engine::model::{Cardinality, ItemDocument};
use qti_workbench_engine::{
    Document, Edit, Format, InteractionKind, ParseOutput, ResponseValue, ScoringOptions,
    SpecVersion, generate, parse, score_with, serialize,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Expand glob patterns; a pattern matching nothing is an error.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern `{pattern}`"))? {
            paths.push(entry?);
        }
        if paths.len() == before {
            bail!("No files match `{pattern}`");
        }
    }
    Ok(paths)
}

fn read_document(path: &Path, format: Option<Format>) -> Result<(String, Format)> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    let format = format.unwrap_or_else(|| Format::detect(&text));
    Ok((text, format))
}

/// 1-based line and column of a byte offset.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

fn describe(path: &Path, text: &str, output: &ParseOutput, out: &mut String) -> std::fmt::Result {
    writeln!(
        out,
        "{}: {} item(s), {} error(s)",
        path.display(),
        output.items.len(),
        output.errors.len()
    )?;
    for item in &output.items {
        let kinds: Vec<String> = item
            .interactions()
            .iter()
            .map(|i| match i.kind() {
                Some(kind) => kind.to_string(),
                None => i.tag().to_string(),
            })
            .collect();
        write!(out, "  {} ({} {})", item.id, item.format, item.spec_version)?;
        if let Some(title) = &item.title {
            write!(out, " \"{title}\"")?;
        }
        writeln!(out, ": {}", kinds.join(", "))?;
        for warning in &item.warnings {
            writeln!(out, "    warning: {warning}")?;
        }
    }
    for error in &output.errors {
        let (line, column) = line_col(text, error.range.start);
        writeln!(out, "  error {line}:{column}: {}", error.message)?;
    }
    for unsupported in &output.unsupported {
        writeln!(
            out,
            "  unsupported {} x{}: {}",
            unsupported.kind, unsupported.count, unsupported.description
        )?;
    }
    Ok(())
}

pub fn parse_files(patterns: &[String], format: Option<Format>, json: bool) -> Result<String> {
    let mut out = String::new();
    let mut reports = serde_json::Map::new();
    for path in expand_patterns(patterns)? {
        let (text, format) = read_document(&path, format)?;
        let output = parse(&text, format);
        if json {
            reports.insert(path.display().to_string(), serde_json::to_value(&output)?);
        } else {
            describe(&path, &text, &output, &mut out)?;
        }
    }
    if json {
        out = serde_json::to_string_pretty(&reports)?;
        out.push('\n');
    }
    Ok(out)
}

fn find_item<'a>(items: &'a [ItemDocument], id: Option<&str>) -> Result<&'a ItemDocument> {
    match id {
        Some(id) => items
            .iter()
            .find(|item| item.id == id)
            .with_context(|| format!("No item `{id}`")),
        None => items.first().context("Document contains no items"),
    }
}

pub fn score_file(
    path: &Path,
    values: Vec<String>,
    cardinality: Option<Cardinality>,
    item_id: Option<&str>,
    options: &ScoringOptions,
    json: bool,
) -> Result<String> {
    let (text, format) = read_document(path, None)?;
    let output = parse(&text, format);
    let item = find_item(&output.items, item_id)?;

    let cardinality = cardinality
        .or_else(|| item.primary_declaration().map(|d| d.cardinality))
        .unwrap_or_default();
    let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
    let response = ResponseValue::with_cardinality(cardinality, values);
    let result = score_with(item, &response, options);

    if json {
        return Ok(serde_json::to_string_pretty(&result)? + "\n");
    }
    let mut out = format!("{}: {}/{}", result.item_id, result.earned, result.max);
    if result.is_correct {
        out.push_str(" correct");
    }
    if result.requires_manual_scoring {
        out.push_str(" (needs manual scoring)");
    }
    if let Some(issue) = &result.issue {
        write!(out, " ({issue})")?;
    }
    out.push('\n');
    Ok(out)
}

pub fn edit_file(path: &Path, edit: &Edit, in_place: bool) -> Result<String> {
    let (text, format) = read_document(path, None)?;
    let mut document = Document::from_text(&text, format);
    let patch = document
        .apply(edit)
        .with_context(|| format!("Cannot edit {}", path.display()))?;

    if !in_place {
        return Ok(document.text());
    }
    std::fs::write(path, document.text())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(format!(
        "{}: {} range(s) changed\n",
        path.display(),
        patch.changed.len()
    ))
}

pub fn generate_item(
    kind: InteractionKind,
    id: Option<String>,
    format: Format,
    version: SpecVersion,
    output_dir: Option<&Path>,
) -> Result<String> {
    let id = id.unwrap_or_else(|| format!("item-{}", Uuid::new_v4().simple()));
    let text = generate(kind, &id, format, version);

    let Some(dir) = output_dir else {
        return Ok(text);
    };
    let extension = match format {
        Format::Markup => "xml",
        Format::StructuredObject => "json",
    };
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{id}.{extension}"));
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(format!("{}\n", path.display()))
}

pub fn serialize_file(path: &Path, to: Option<Format>) -> Result<String> {
    let (text, format) = read_document(path, None)?;
    let output = parse(&text, format);
    if !output.errors.is_empty() {
        bail!(
            "{} has {} syntax error(s); fix them before regenerating",
            path.display(),
            output.errors.len()
        );
    }
    for unsupported in &output.unsupported {
        log::warn!("{}: {}", unsupported.kind, unsupported.description);
    }
    Ok(serialize(&output.items, to.unwrap_or(format)))
}

/// Write the default config to `path`, refusing to replace an existing file
/// unless forced.
pub fn init_config(path: &Path, force: bool) -> Result<String> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite it", path.display());
    }
    Config::default()
        .save_to_path(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(format!("{}\n", path.display()))
}
