//! Argument definitions and command dispatch

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use credtree_core::normalize::{FieldName, Selection};
use credtree_core::pipeline::{EmptyReason, LoadStatus, Panel, PanelResult, Sha256Digester};
use credtree_core::compare_trees;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::render::{self, ComparisonReport, PanelView, TreeReport};

#[derive(Parser, Debug)]
#[command(name = "credtree")]
#[command(about = "Fingerprint credential exports and compare them by Merkle root")]
#[command(version)]
pub struct Cli {
    /// Config file (JSON); defaults to $CREDTREE_CONFIG
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by hashing commands
#[derive(Args, Debug, Clone, Default)]
pub struct HashOpts {
    /// Fields to hash, comma separated (title,username,password,last_modified)
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<FieldName>>,

    /// Hex characters shown per hash
    #[arg(long)]
    pub prefix: Option<usize>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which columns the configured fields bind to
    Headers {
        file: PathBuf,
    },
    /// Build and render the Merkle tree of one export
    Tree {
        file: PathBuf,
        #[command(flatten)]
        opts: HashOpts,
    },
    /// Compare two exports and flag rows present on only one side
    Compare {
        left: PathBuf,
        right: PathBuf,
        #[command(flatten)]
        opts: HashOpts,
    },
}

/// A file loaded into its own panel
struct Loaded {
    label: String,
    rows: usize,
    panel: Panel<Sha256Digester>,
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn load(path: &Path, config: &Config) -> Result<Loaded> {
    let label = path.display().to_string();
    let panel = Panel::new(label.clone(), Sha256Digester, config.fields.clone());
    match panel.load(&read_text(path)?) {
        LoadStatus::Loaded { rows, .. } => Ok(Loaded { label, rows, panel }),
        LoadStatus::NoData => Err(CliError::NoData {
            path: path.to_path_buf(),
        }),
    }
}

/// `--fields`, else the configured defaults, else every bound field.
fn resolve_selection(opts: &HashOpts, config: &Config, loaded: &Loaded) -> Selection {
    match opts.fields.as_ref().or(config.default_fields.as_ref()) {
        Some(fields) => Selection::from_fields(fields.iter().copied()),
        None => loaded.panel.available_fields(),
    }
}

/// Run the pipeline and return the published result.
async fn compute(loaded: &Loaded, selection: &Selection) -> Result<Arc<PanelResult>> {
    loaded.panel.recompute(selection).await?;
    let path = PathBuf::from(&loaded.label);
    let result = loaded
        .panel
        .latest()
        .ok_or_else(|| CliError::NoData { path: path.clone() })?;
    let reason = result.empty_reason;
    match reason {
        None => Ok(result),
        Some(EmptyReason::NoSelection) => Err(CliError::NoSelection { path }),
        Some(EmptyReason::NoData) => Err(CliError::NoData { path }),
    }
}

fn view<'a>(loaded: &'a Loaded, result: &'a PanelResult) -> Result<PanelView<'a>> {
    let tree = result.tree.as_ref().ok_or_else(|| CliError::NoData {
        path: PathBuf::from(&loaded.label),
    })?;
    Ok(PanelView {
        label: &loaded.label,
        rows: loaded.rows,
        selection: &result.selection,
        tree,
    })
}

/// Execute a parsed command, writing rendered output to `out` and flushing it.
pub async fn run(command: &Command, config: &Config, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Headers { file } => {
            let loaded = load(file, config)?;
            render::render_headers(out, &loaded.label, &loaded.panel.bindings())?;
        }
        Command::Tree { file, opts } => {
            let loaded = load(file, config)?;
            let selection = resolve_selection(opts, config, &loaded);
            let result = compute(&loaded, &selection).await?;
            let view = view(&loaded, &result)?;

            if opts.json {
                serde_json::to_writer_pretty(&mut *out, &TreeReport::from(&view))?;
                writeln!(out)?;
            } else {
                render::render_tree(out, &view, opts.prefix.unwrap_or(config.prefix_len))?;
            }
        }
        Command::Compare { left, right, opts } => {
            let left = load(left, config)?;
            let right = load(right, config)?;

            // Both sides hash the same fields: only those with a column in
            // both files
            let requested = resolve_selection(opts, config, &left);
            let (left_fields, right_fields) =
                (left.panel.available_fields(), right.panel.available_fields());
            let selection: Selection = requested
                .iter()
                .filter(|f| left_fields.contains(*f) && right_fields.contains(*f))
                .collect();
            let dropped: Vec<&str> = requested
                .iter()
                .filter(|f| !selection.contains(*f))
                .map(|f| f.as_str())
                .collect();
            if !dropped.is_empty() {
                warn!(fields = ?dropped, "fields without a column in both files; not compared");
            }

            let (l, r) = tokio::join!(compute(&left, &selection), compute(&right, &selection));
            let (l, r) = (l?, r?);
            let (lv, rv) = (view(&left, &l)?, view(&right, &r)?);

            let comparison = compare_trees(Some(lv.tree), Some(rv.tree));
            info!(
                roots_match = comparison.roots_match,
                left_only = comparison.left_only.len(),
                right_only = comparison.right_only.len(),
                "compared"
            );

            if opts.json {
                serde_json::to_writer_pretty(&mut *out, &ComparisonReport::new(&lv, &rv, &comparison))?;
                writeln!(out)?;
            } else {
                render::render_comparison(out, &lv, &rv, &comparison, opts.prefix.unwrap_or(config.prefix_len))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
