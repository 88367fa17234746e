use crate::domain::model::MetalType;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hts-analyzer")]
#[command(about = "Check HTS codes against aluminum and steel derivative reference material")]
pub struct CliConfig {
    /// Path to a TOML configuration file (falls back to GEMINI_* environment variables)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory holding the saved document and manual entries
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Override the classifier model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Keep reference material in memory only for this run
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage the reference document
    #[command(subcommand)]
    Document(DocumentCommand),

    /// Manage manual derivative entries
    #[command(subcommand)]
    Entry(EntryCommand),

    /// Show readiness and storage sync state
    Status {
        /// Re-save the complete reference material
        #[arg(long)]
        resync: bool,
    },

    /// Check one or more HTS codes
    Check {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum DocumentCommand {
    /// Use a PDF file as the reference document
    SetFile { path: PathBuf },

    /// Use pasted text as the reference document
    SetText {
        #[arg(conflicts_with = "from", required_unless_present = "from")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Remove the reference document
    Clear,

    /// Show the current reference document
    Show,

    /// List the HTS headings the document covers
    Scan,
}

#[derive(Debug, Clone, Args)]
pub struct EntryFields {
    /// HTS code or prefix, e.g. 7604.10 or 7306
    #[arg(long)]
    pub code: String,

    #[arg(long, default_value = "")]
    pub category: String,

    #[arg(long)]
    pub description: String,

    /// Aluminum, Steel or Both
    #[arg(long, default_value = "Aluminum")]
    pub metal: MetalType,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EntryCommand {
    Add(EntryFields),

    Update {
        id: String,
        #[command(flatten)]
        fields: EntryFields,
    },

    Delete { id: String },

    List,
}
