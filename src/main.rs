use anyhow::Context;
use clap::Parser;
use hts_derivative::config::{Command, DocumentCommand, EntryCommand, EntryFields};
use hts_derivative::core::ranking::{category_summary, Verdict};
use hts_derivative::core::session::Analysis;
use hts_derivative::core::{ConfigProvider, DocumentStore, ManualEntryStore};
use hts_derivative::domain::model::PDF_MEDIA_TYPE;
use hts_derivative::utils::error::ErrorSeverity;
use hts_derivative::utils::validation::{
    validate_file_extension, validate_non_empty_string, Validate,
};
use hts_derivative::utils::logger;
use hts_derivative::{
    AnalysisSession, AnalyzerError, CliConfig, DocumentContext, GeminiClient, LocalStorage,
    ManualEntry, MemoryStorage, ReferenceStore, Result, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // Load configuration, CLI flags win over file and environment
    let config = cli
        .resolve()
        .inspect_err(|e| eprintln!("💡 {}", e.recovery_suggestion()))
        .context("Failed to load configuration")?;

    // Initialise logging
    if cli.log_json || config.json_logging() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting hts-analyzer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // Pick storage and run the command
    let outcome = if cli.no_persist {
        tracing::info!("Persistence disabled, reference material lives for this run only");
        let storage = MemoryStorage::new();
        run(&cli.command, &config, storage.clone(), storage).await
    } else {
        tracing::debug!("Using data directory {}", config.data_dir());
        let storage = LocalStorage::new(config.data_dir().to_string());
        run(&cli.command, &config, storage.clone(), storage).await
    };

    if let Err(e) = outcome {
        // Full detail goes to the log, the user gets the friendly message
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // Exit code follows severity; unsaved changes are not a failure
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run<D: DocumentStore, E: ManualEntryStore>(
    command: &Command,
    config: &TomlConfig,
    document_store: D,
    entry_store: E,
) -> Result<()> {
    let mut reference = ReferenceStore::open(document_store, entry_store).await;

    match command {
        Command::Document(cmd) => document_command(cmd, config, reference).await,
        Command::Entry(cmd) => entry_command(cmd, &mut reference).await,
        Command::Status { resync } => {
            if *resync {
                reference.resync().await?;
                println!("✅ Reference material saved");
            }
            print_status(&reference);
            Ok(())
        }
        Command::Check { codes } => {
            config.validate()?;
            let client = GeminiClient::new(config)?;
            let mut session = AnalysisSession::new(reference, client);
            check_codes(&mut session, codes).await
        }
    }
}

async fn document_command<D: DocumentStore, E: ManualEntryStore>(
    cmd: &DocumentCommand,
    config: &TomlConfig,
    mut reference: ReferenceStore<D, E>,
) -> Result<()> {
    match cmd {
        DocumentCommand::SetFile { path } => {
            let path_str = path.to_string_lossy();
            validate_file_extension("document", &path_str, &["pdf"])?;
            let bytes = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path_str.into_owned());

            let document = DocumentContext::from_file(name, PDF_MEDIA_TYPE, &bytes);
            println!("✅ Knowledge base active: {}", document.display_name);
            warn_if_unsaved(reference.set_document(Some(document)).await)
        }
        DocumentCommand::SetText { text, from } => {
            let text = match (text, from) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => String::new(),
            };
            validate_non_empty_string("text", &text)?;

            let document = DocumentContext::from_text(text);
            println!("✅ Knowledge base active: {}", document.display_name);
            warn_if_unsaved(reference.set_document(Some(document)).await)
        }
        DocumentCommand::Clear => {
            println!("🗑️  Reference document removed");
            warn_if_unsaved(reference.set_document(None).await)
        }
        DocumentCommand::Show => {
            match reference.document() {
                Some(document) => print_document(document),
                None => println!("No reference document loaded."),
            }
            Ok(())
        }
        DocumentCommand::Scan => {
            config.validate()?;
            let client = GeminiClient::new(config)?;
            let mut session = AnalysisSession::new(reference, client.clone());

            println!("🔍 Scanning document...");
            match session.scan_headings(&client).await {
                Ok(_) => {}
                Err(e @ AnalyzerError::Persistence { .. }) => warn_if_unsaved(Err(e))?,
                Err(e) => return Err(e),
            }
            if let Some(document) = session.reference().document() {
                print_document(document);
            }
            Ok(())
        }
    }
}

async fn entry_command<D: DocumentStore, E: ManualEntryStore>(
    cmd: &EntryCommand,
    reference: &mut ReferenceStore<D, E>,
) -> Result<()> {
    match cmd {
        EntryCommand::Add(fields) => {
            let added = reference.add_manual_entry(draft(fields)).await?;
            println!("✅ Added manual entry {}", added.id);
            if !added.saved {
                print_unsaved_notice();
            }
            Ok(())
        }
        EntryCommand::Update { id, fields } => {
            let entry = draft(fields).with_id(id.clone());
            entry.validate()?;
            warn_if_unsaved(reference.update_manual_entry(entry).await)?;
            println!("✅ Updated manual entry {}", id);
            Ok(())
        }
        EntryCommand::Delete { id } => {
            let existed = reference.manual_entry(id).is_some();
            warn_if_unsaved(reference.delete_manual_entry(id).await.map(|_| ()))?;
            if existed {
                println!("🗑️  Deleted manual entry {}", id);
            } else {
                println!("No manual entry with id {}", id);
            }
            Ok(())
        }
        EntryCommand::List => {
            if reference.manual_entries().is_empty() {
                println!("No manual entries added yet.");
            }
            for entry in reference.manual_entries() {
                println!(
                    "{}  {:<12} {:<9} {}\n    {}",
                    entry.id, entry.code, entry.metal_type, entry.category, entry.description
                );
            }
            Ok(())
        }
    }
}

async fn check_codes<D: DocumentStore, E: ManualEntryStore>(
    session: &mut AnalysisSession<D, E, GeminiClient>,
    codes: &[String],
) -> Result<()> {
    if !session.is_ready() {
        return Err(AnalyzerError::NotReady);
    }

    let mut last_error = None;
    for raw in codes {
        match session.check(raw).await {
            Ok(analysis) => print_analysis(&analysis),
            Err(e) => {
                eprintln!("❌ {}: {}", raw, e.user_friendly_message());
                last_error = Some(e);
            }
        }
    }

    print_history(session);
    last_error.map_or(Ok(()), Err)
}

fn draft(fields: &EntryFields) -> ManualEntry {
    ManualEntry::draft(
        fields.code.trim(),
        fields.category.trim(),
        fields.description.trim(),
        fields.metal,
    )
}

/// Persistence failures are reported but never abort the command.
fn warn_if_unsaved(result: Result<()>) -> Result<()> {
    match result {
        Err(AnalyzerError::Persistence { message }) => {
            tracing::warn!("Reference material not saved: {}", message);
            print_unsaved_notice();
            Ok(())
        }
        other => other,
    }
}

fn print_unsaved_notice() {
    eprintln!("⚠️  Change applied for this run but could not be saved; retry with `status --resync`.");
}

fn print_status<D: DocumentStore, E: ManualEntryStore>(reference: &ReferenceStore<D, E>) {
    println!("📋 Reference Status:");
    println!(
        "  Document:       {}",
        reference
            .document()
            .map(|d| d.display_name.as_str())
            .unwrap_or("none")
    );
    println!("  Manual entries: {}", reference.manual_entries().len());
    println!(
        "  Ready:          {}",
        if reference.is_ready() { "yes" } else { "no (restricted access)" }
    );
    println!(
        "  Saved:          {}",
        if reference.is_synced() { "yes" } else { "no, run `status --resync`" }
    );
}

fn print_document(document: &DocumentContext) {
    println!("📄 {}", document.display_name);
    match document.media_type() {
        Some(media_type) => println!("  Source: file ({})", media_type),
        None => println!("  Source: pasted text ({} chars)", document.content.len()),
    }

    match &document.extracted_headings {
        None => println!("  Headings: not scanned yet (run `document scan`)"),
        Some(headings) if headings.is_empty() => println!("  Headings: no headings found."),
        Some(headings) => {
            println!("  Covered HTS headings:");
            for h in headings {
                println!("    {:<12} {}", h.heading, h.description);
            }
        }
    }
}

fn print_analysis(analysis: &Analysis) {
    let result = &analysis.result;
    println!();
    match analysis.verdict {
        Verdict::NotDerivative => {
            println!("✅ HTS Code {} - Not a Derivative", analysis.code);
            println!("   This code does not appear to fall under any monitored derivative category in the provided document.");
        }
        Verdict::NoDerivativeCategory => {
            println!("ℹ️  HTS Code {} - Valid (No Derivative Match)", analysis.code);
            println!("   No specific derivative matches found, but the HTS code is valid.");
        }
        Verdict::Derivative { banner } => {
            println!(
                "⚠️  {} Derivative - HTS: {} ({})",
                banner.label(),
                analysis.code,
                category_summary(result.matches.len())
            );
            for m in &result.matches {
                println!(
                    "   • {} [{} | {} confidence]",
                    m.derivative_category, m.metal_type, m.confidence
                );
                println!("     Detail: {}", m.match_detail);
            }
        }
    }
    println!("   Reasoning: {}", result.reasoning);
}

fn print_history<D: DocumentStore, E: ManualEntryStore>(
    session: &AnalysisSession<D, E, GeminiClient>,
) {
    if session.history().is_empty() {
        return;
    }
    println!("\n🕘 Recent Checks");
    for entry in session.history().entries() {
        println!(
            "   {:<16} {}",
            entry.code,
            if entry.found { "Derivative" } else { "Not Found" }
        );
    }
}
