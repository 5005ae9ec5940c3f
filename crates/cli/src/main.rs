//! Command line tool for generating, rendering and inspecting slide decks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_agent::{AgentConfig, DeckPipeline, DiagramGenerator, RfpSummarizer};
use deck_core::{cleanup_old_files, ArtifactStore, CleanupStatus};
use deck_html::MarkupParser;
use deck_pptx::{DeckRenderer, DiagramRenderer, PptxReader};
use std::fs;
use std::path::{Path, PathBuf};

/// Generate editable PowerPoint decks from text and slide markup.
#[derive(Parser, Debug)]
#[command(name = "deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a slide markup document to a .pptx file
    Render {
        /// Input markup document (.html)
        input: PathBuf,

        /// Output file (default: input name with .pptx extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate, validate and render a deck from a source document
    Generate {
        /// Source document (.txt, .md or .pptx)
        input: PathBuf,

        /// Imposed deck title
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "generated_files")]
        output: PathBuf,

        /// Maximum number of validation rounds (overrides DECK_MAX_ITERATIONS)
        #[arg(short = 'n', long)]
        max_iterations: Option<usize>,
    },

    /// Summarize a tender document as JSON
    Summarize {
        /// Tender document (.txt, .md or .pptx)
        input: PathBuf,

        /// Write the summary to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an editable diagram from a description
    Diagram {
        /// Description document (.txt, .md or .pptx)
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "generated_files")]
        output: PathBuf,
    },

    /// Print the text of each slide of .pptx files
    Extract {
        /// Input PowerPoint file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Delete generated files older than a given age
    Cleanup {
        /// Directory to clean
        #[arg(short, long, default_value = "generated_files")]
        dir: PathBuf,

        /// Age threshold in hours
        #[arg(long, default_value = "24")]
        max_age_hours: u64,

        /// List candidates without deleting them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    match args.command {
        Command::Render { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("pptx"));
            let count = render(&input, &output)?;
            println!("Wrote {} slide(s) to {}", count, output.display());
        }
        Command::Generate {
            input,
            title,
            output,
            max_iterations,
        } => generate(&input, title.as_deref(), &output, max_iterations).await?,
        Command::Summarize { input, output } => summarize(&input, output.as_deref()).await?,
        Command::Diagram { input, output } => diagram(&input, &output).await?,
        Command::Extract { input, json } => {
            for path in &input {
                match extract(path, json) {
                    Ok(text) => print!("{}", text),
                    Err(e) => eprintln!("Error processing {}: {:#}", path.display(), e),
                }
            }
        }
        Command::Cleanup {
            dir,
            max_age_hours,
            dry_run,
        } => cleanup(&dir, max_age_hours, dry_run),
    }

    Ok(())
}

/// Parse a markup document and render it. Returns the slide count.
fn render(input: &Path, output: &Path) -> Result<usize> {
    let markup = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let presentation = MarkupParser::new().parse(&markup);
    log::debug!(
        "Parsed '{}' with {} slide(s)",
        presentation.title,
        presentation.slide_count()
    );

    DeckRenderer::new()
        .render_to_path(&presentation, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(presentation.slide_count())
}

/// Text of a source document, by extension.
fn read_source(input: &Path) -> Result<String> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    deck_pptx::source_text(file_name, &bytes)
        .with_context(|| format!("Failed to extract text from {}", input.display()))
}

/// Run the full pipeline on a source document.
async fn generate(
    input: &Path,
    title: Option<&str>,
    output_dir: &Path,
    max_iterations: Option<usize>,
) -> Result<()> {
    let source = read_source(input)?;

    let mut config = AgentConfig::from_env().context("Model configuration is incomplete")?;
    if let Some(n) = max_iterations {
        config = config.with_max_iterations(n);
    }
    let pipeline = DeckPipeline::from_config(&config)?;

    let deck = pipeline.run(&source, title).await?;

    let store = ArtifactStore::new(output_dir);
    let id = ArtifactStore::new_id();
    let markup_path = store.save_markup(&id, &deck.markup)?;

    // The deck is rendered from the markup, as the server does after
    // confirmation.
    let presentation = MarkupParser::new().parse(&deck.markup);
    let deck_path = DeckRenderer::new()
        .render_to_path(&presentation, &store.output_path(&id)?)
        .context("Failed to write deck")?;

    println!("Title:       {}", deck.presentation.title);
    println!("Slides:      {}", presentation.slide_count());
    println!(
        "Validation:  {} after {} iteration(s)",
        deck.final_status, deck.iterations
    );
    for message in &deck.key_messages {
        println!("  - {}", message);
    }
    if let Some(last) = deck.last_validation() {
        for suggestion in &last.suggestions {
            println!("  suggestion: {}", suggestion);
        }
    }
    println!("Markup:      {}", markup_path.display());
    println!("Deck:        {}", deck_path.display());

    Ok(())
}

/// Summarize a tender document.
async fn summarize(input: &Path, output: Option<&Path>) -> Result<()> {
    let document = read_source(input)?;
    let config = AgentConfig::from_env().context("Model configuration is incomplete")?;
    let summary = RfpSummarizer::from_config(&config)?.summarize(&document).await?;

    let json = serde_json::to_string_pretty(&summary)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Summary:     {}", path.display());
        }
        None => println!("{}", json),
    }
    if let Some(urgency) = summary.urgency() {
        eprintln!("Urgency:     {:?}", urgency);
    }
    Ok(())
}

/// Generate a diagram and render it to the output directory.
async fn diagram(input: &Path, output_dir: &Path) -> Result<()> {
    let description = read_source(input)?;
    let config = AgentConfig::from_env().context("Model configuration is incomplete")?;
    let spec = DiagramGenerator::from_config(&config)?.generate(&description).await?;

    let store = ArtifactStore::new(output_dir);
    let path = DiagramRenderer::new()
        .render_to_path(&spec, &store.diagram_path(&ArtifactStore::new_id())?)
        .context("Failed to write diagram")?;

    println!("Title:       {}", spec.title);
    println!("Nodes:       {}", spec.nodes.len());
    println!("Connections: {}", spec.resolved_connections().count());
    println!("Diagram:     {}", path.display());
    Ok(())
}

/// Text of every slide of a deck.
fn extract(path: &Path, json: bool) -> Result<String> {
    let deck = PptxReader::new()
        .read_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&deck)?));
    }

    let mut out = String::new();
    for slide in &deck.slides {
        out.push_str(&format!("--- Slide {} ---\n", slide.number));
        for line in slide.non_empty_lines() {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(out)
}

fn cleanup(dir: &Path, max_age_hours: u64, dry_run: bool) {
    let report = cleanup_old_files(dir, max_age_hours, dry_run);

    match report.status {
        CleanupStatus::Skipped => println!("{} does not exist, nothing to do", dir.display()),
        CleanupStatus::DryRun => {
            for file in &report.files {
                println!(
                    "{} ({:.1} h, {} bytes)",
                    file.path.display(),
                    file.age_hours,
                    file.size_bytes
                );
            }
            println!(
                "{} file(s) older than {} h, {} bytes",
                report.files.len(),
                max_age_hours,
                report.candidate_bytes()
            );
        }
        CleanupStatus::Success => println!(
            "Deleted {} file(s), freed {} bytes",
            report.files_deleted, report.bytes_freed
        ),
    }

    for error in &report.errors {
        eprintln!("{}", error);
    }
}
