use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qti_workbench_config::Config;
use qti_workbench_engine::model::Cardinality;
use qti_workbench_engine::{Edit, Format, InteractionKind, SpecVersion};
use std::path::{Path, PathBuf};

mod commands;

#[derive(Parser)]
#[command(name = "qti-workbench")]
#[command(about = "Parse, edit, generate and score QTI assessment items")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.config/qti-workbench/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse documents and report items, errors, warnings and unsupported content
    Parse {
        /// Files or glob patterns
        #[arg(required = true)]
        files: Vec<String>,
        /// Format of the input (detected from the content when omitted)
        #[arg(short, long)]
        format: Option<Format>,
        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score a response against one item
    Score {
        file: PathBuf,
        /// Submitted values, comma separated
        #[arg(short, long, value_delimiter = ',', num_args = 0..)]
        response: Vec<String>,
        /// Cardinality of the response (the declaration's when omitted)
        #[arg(short, long)]
        cardinality: Option<Cardinality>,
        /// Item to score (the first item when omitted)
        #[arg(short, long)]
        item: Option<String>,
        /// Print the score as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a structured edit to a document
    Edit {
        file: PathBuf,
        /// Write the result back to the file instead of printing it
        #[arg(long)]
        in_place: bool,
        #[command(subcommand)]
        action: EditAction,
    },
    /// Print a new item of the given interaction kind
    Generate {
        /// choice, multiple-response, text-entry, extended-text, hottext, slider or order
        kind: InteractionKind,
        /// Item identifier (random when omitted)
        id: Option<String>,
        #[arg(short, long)]
        format: Option<Format>,
        /// Vocabulary version for markup: 2.1 or 3.0
        #[arg(short, long)]
        version: Option<SpecVersion>,
        /// Directory to write the item into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Regenerate a document from its model, optionally in the other format
    Serialize {
        file: PathBuf,
        /// Target format (the input's when omitted)
        #[arg(long)]
        to: Option<Format>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config to the config path
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum EditAction {
    /// Replace the correct response of an item
    SetCorrect {
        item: String,
        /// New correct values; none removes the correct response
        values: Vec<String>,
        /// Response declaration (RESPONSE or the first one when omitted)
        #[arg(long)]
        response: Option<String>,
    },
    /// Insert the item in a fragment file at a position
    Insert { fragment: PathBuf, at: usize },
    /// Reorder items; position i receives the item currently at order[i]
    Reorder {
        #[arg(required = true)]
        order: Vec<usize>,
    },
}

impl EditAction {
    fn into_edit(self) -> Result<Edit> {
        Ok(match self {
            EditAction::SetCorrect {
                item,
                values,
                response,
            } => Edit::SetCorrectResponse {
                item_id: item,
                response_id: response,
                values,
            },
            EditAction::Insert { fragment, at } => Edit::InsertItem {
                fragment: std::fs::read_to_string(&fragment)
                    .with_context(|| format!("Failed to read {}", fragment.display()))?,
                at,
            },
            EditAction::Reorder { order } => Edit::ReorderItems { order },
        })
    }
}

/// The `--config` file, which must exist, or the default location.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file not found: {}", path.display()))?,
        None => Config::load_or_default()?,
    };
    log::debug!("using {config:?}");
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Parse {
            files,
            format,
            json,
        } => commands::parse_files(&files, format, json)?,
        Commands::Score {
            file,
            response,
            cardinality,
            item,
            json,
        } => commands::score_file(
            &file,
            response,
            cardinality,
            item.as_deref(),
            &load_config(cli.config.as_deref())?.scoring_options(),
            json,
        )?,
        Commands::Edit {
            file,
            in_place,
            action,
        } => commands::edit_file(&file, &action.into_edit()?, in_place)?,
        Commands::Generate {
            kind,
            id,
            format,
            version,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            commands::generate_item(
                kind,
                id,
                format.unwrap_or(config.default_format),
                version.unwrap_or(config.spec_version),
                output.or(config.output_dir).as_deref(),
            )?
        }
        Commands::Serialize { file, to } => commands::serialize_file(&file, to)?,
        Commands::Config {
            action: ConfigAction::Init { force },
        } => {
            let path = cli.config.unwrap_or_else(Config::config_path);
            commands::init_config(&path, force)?
        }
    };

    print!("{output}");
    Ok(())
}
