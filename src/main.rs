// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use booklist_xml::utils::logging::{format_book, format_error, format_success, format_warning};
use booklist_xml::{
    BookExtractor, BooklistError, BooklistPipeline, Config, JsonExporter, ParseOutcome,
    PipelineReport, PromptBuilder, RawCompletion, process_completion,
};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "booklist")]
#[command(version = "0.1.0")]
#[command(about = "Ask a language model for a book list and extract it from its XML", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt the model and parse its book list (default)
    Generate {
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, value_name = "NUM")]
        count: Option<usize>,

        #[arg(long)]
        model: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse a saved model response ("-" reads stdin)
    Parse {
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the prompt that would be sent
    Prompt {
        #[arg(long)]
        topic: Option<String>,

        #[arg(long, value_name = "NUM")]
        count: Option<usize>,
    },
}

#[derive(clap::Args, Default)]
struct OutputArgs {
    /// Write the result as a JSON file into this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print JSON instead of a listing
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    pretty: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    booklist_xml::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    if let Err(e) = run(cli).await {
        let kind = e
            .downcast_ref::<BooklistError>()
            .map(BooklistError::kind)
            .unwrap_or("Error");
        error!("{}: {:#}", kind, e);
        eprintln!("{}", format_error(&format!("{}: {:#}", kind, e)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Booklist XML extractor");

    if !cli.config.exists() {
        warn!(
            "Config file {} not found, using defaults and environment",
            cli.config.display()
        );
    }
    let mut config = Config::load_offline(Some(cli.config.as_path()))
        .context("Failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Generate {
        topic: None,
        count: None,
        model: None,
        output: OutputArgs::default(),
    }) {
        Commands::Generate {
            topic,
            count,
            model,
            output,
        } => {
            apply_overrides(&mut config, topic, count, model)?;
            cmd_generate(&config, cli.color, &output).await?;
        }
        Commands::Parse { input, output } => {
            cmd_parse(&config, &input, &output)?;
        }
        Commands::Prompt { topic, count } => {
            apply_overrides(&mut config, topic, count, None)?;
            cmd_prompt(&config)?;
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    topic: Option<String>,
    count: Option<usize>,
    model: Option<String>,
) -> Result<()> {
    if let Some(topic) = topic {
        config.prompt.topic = topic;
    }
    if count.is_some() {
        config.prompt.count = count;
    }
    if let Some(model) = model {
        config.backend.model = model;
    }
    config
        .validate_offline()
        .context("Invalid command line override")?;
    Ok(())
}

fn prompt_builder(config: &Config) -> PromptBuilder {
    PromptBuilder::new(config.schema.clone(), config.prompt.topic.clone())
        .with_count(config.prompt.count)
}

async fn cmd_generate(config: &Config, color: bool, output: &OutputArgs) -> Result<()> {
    config
        .validate_backend()
        .context("Invalid backend configuration")?;

    info!(
        "Using {:?} backend at {} (model {})",
        config.backend.provider, config.backend.endpoint, config.backend.model
    );

    let pipeline = BooklistPipeline::from_config(config)
        .context("Failed to set up pipeline")?
        .with_progress(color);

    let report = pipeline.run().await?;

    info!(
        "Run finished: {} books ({:.1}% of records) in {} ms ({} ms waiting for the model)",
        report.stats.books_parsed,
        report.stats.success_rate(),
        report.stats.total_ms(),
        report.stats.backend_ms
    );

    print_outcome(config, &report.outcome, output)?;
    export(&report, config, output)
}

fn cmd_parse(config: &Config, input: &Path, output: &OutputArgs) -> Result<()> {
    let text = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    let completion = RawCompletion::new(text, input.display().to_string());
    info!(
        "Parsing saved response {} ({} chars)",
        completion.model,
        completion.len()
    );

    let extractor = BookExtractor::new(&config.schema).context("Failed to set up extractor")?;
    let (outcome, stats) = process_completion(&extractor, &completion)?;

    print_outcome(config, &outcome, output)?;

    let report = PipelineReport {
        topic: config.prompt.topic.clone(),
        prompt: prompt_builder(config).build(),
        completion,
        outcome,
        stats,
    };
    export(&report, config, output)
}

fn cmd_prompt(config: &Config) -> Result<()> {
    let prompt = prompt_builder(config).build();

    println!("--- system ---\n{}\n\n--- user ---\n{}", prompt.system, prompt.user);
    Ok(())
}

fn print_outcome(config: &Config, outcome: &ParseOutcome, output: &OutputArgs) -> Result<()> {
    if output.json || config.output.json {
        let json = if output.pretty || config.output.pretty {
            serde_json::to_string_pretty(&outcome.books)?
        } else {
            serde_json::to_string(&outcome.books)?
        };
        println!("{}", json);
        return Ok(());
    }

    if outcome.books.is_empty() {
        println!("{}", format_warning("The response contained no usable books"));
    }

    for (index, book) in outcome.books.iter().enumerate() {
        println!("{}", format_book(index + 1, book));
    }

    if outcome.is_partial() {
        println!(
            "\n{}",
            format_warning(&format!(
                "{} element(s) were malformed; see the log for details",
                outcome.issues.len()
            ))
        );
    }

    println!(
        "\n{}",
        format_success(&format!("{} book(s) extracted", outcome.books.len()))
    );
    Ok(())
}

fn export(report: &PipelineReport, config: &Config, output: &OutputArgs) -> Result<()> {
    if let Some(dir) = &output.output {
        let exporter = JsonExporter::new(dir).context("Failed to prepare export directory")?;
        let path = exporter
            .export(report, output.pretty || config.output.pretty)
            .context("Failed to export book list")?;
        info!("Book list written to {}", path.display());
    }
    Ok(())
}
