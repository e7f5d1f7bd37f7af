use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use webqa::{
    AnswerBundle, AskError, DISCLAIMER, PipelineOptions, Question, Settings, SettingsBuilder,
    build_pipeline, config, logging,
};

/// webqa - answer questions with a language model and summarized web sources
#[derive(Parser)]
#[command(name = "webqa")]
#[command(about = "Answer a question directly, then enrich it with summarized web sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask(AskCommand),
    /// Launch the interactive terminal UI
    Tui(TuiCommand),
}

/// Ask a single question
#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Only produce the direct answer; skip web search
    #[arg(long)]
    no_search: bool,

    /// Number of search results to summarize
    #[arg(long, value_name = "N")]
    num_results: Option<usize>,

    /// Paragraphs considered per page
    #[arg(long, value_name = "N")]
    max_paragraphs: Option<usize>,

    /// Character budget per page excerpt
    #[arg(long, value_name = "N")]
    max_chars: Option<usize>,

    /// Fetch and summarize sources concurrently
    #[arg(long)]
    parallel: bool,

    /// Print the answer as JSON
    #[arg(long)]
    json: bool,

    /// Model identifier (overrides OPENAI_MODEL)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Launch the terminal UI
#[derive(Parser)]
struct TuiCommand {
    /// Model identifier (overrides OPENAI_MODEL)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Fetch and summarize sources concurrently
    #[arg(long)]
    parallel: bool,
}

fn main() {
    let cli = Cli::parse();
    config::load_dotenv();

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Tui(cmd) => handle_tui(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        match e.downcast_ref::<AskError>() {
            Some(ask) => eprintln!("{ask}"),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs upstream or internal error).
///
/// User errors are a blank question or a missing credential.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<AskError>()
        .is_some_and(AskError::is_user_error)
}

/// Handles the ask command.
///
/// The question and credential are validated before any HTTP client exists.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    let question = Question::parse(&cmd.question)?;
    let settings = resolve_settings(cmd.model.as_deref())?;

    logging::init(cmd.verbose);

    let options = ask_options(cmd, &settings);
    let pipeline = build_pipeline(&settings, options).context("Failed to set up clients")?;
    let bundle = pipeline.answer(&question)?;

    if cmd.json {
        let json = serde_json::to_string_pretty(&bundle).context("Failed to encode answer")?;
        println!("{json}");
    } else {
        print!("{}", format_bundle(&bundle));
    }

    Ok(())
}

/// Handles the tui command.
///
/// A missing credential is not fatal here: the form opens with the error shown
/// and submission disabled.
fn handle_tui(cmd: &TuiCommand) -> Result<()> {
    let pipeline = match resolve_settings(cmd.model.as_deref()) {
        Ok(settings) => {
            let mut options = PipelineOptions::from_settings(&settings);
            options.parallel = cmd.parallel;
            Ok(build_pipeline(&settings, options).context("Failed to set up clients")?)
        }
        Err(e) => match e.downcast::<AskError>() {
            Ok(ask) => Err(ask),
            Err(other) => return Err(other),
        },
    };

    webqa::tui::run(pipeline)
}

/// Resolves settings, surfacing a missing key as [`AskError::MissingCredential`].
fn resolve_settings(model: Option<&str>) -> Result<Settings> {
    let mut builder = SettingsBuilder::new();
    if let Some(model) = model {
        builder = builder.model(model);
    }

    builder.build().map_err(|e| match AskError::try_from(e) {
        Ok(ask) => anyhow::Error::new(ask),
        Err(other) => anyhow::Error::new(other).context("Invalid configuration"),
    })
}

/// Applies command-line overrides on top of the configured options.
fn ask_options(cmd: &AskCommand, settings: &Settings) -> PipelineOptions {
    let mut options = PipelineOptions::from_settings(settings);
    options.search_enabled = !cmd.no_search;
    options.parallel = cmd.parallel;
    if let Some(n) = cmd.num_results {
        options.num_results = n;
    }
    if let Some(n) = cmd.max_paragraphs {
        options.max_paragraphs = n;
    }
    if let Some(n) = cmd.max_chars {
        options.max_chars = n;
    }
    options
}

/// Renders an answer for the terminal: response, sources, then the disclaimer.
fn format_bundle(bundle: &AnswerBundle) -> String {
    let mut out = String::new();
    out.push_str("Response:\n");
    out.push_str(&bundle.direct_answer);
    out.push_str("\n\n");

    for source in &bundle.sourced_summaries {
        out.push_str(&format!("Source: {}\n", source.url));
        out.push_str(&source.summary);
        out.push_str("\n\n");
    }

    out.push_str("Disclaimer: ");
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use webqa::SourcedSummary;

    fn ask(args: &[&str]) -> AskCommand {
        let mut argv = vec!["webqa", "ask"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Ask(cmd) => cmd,
            Commands::Tui(_) => panic!("expected ask command"),
        }
    }

    fn settings() -> Settings {
        SettingsBuilder::new()
            .api_key("sk-test")
            .num_results(3)
            .max_paragraphs(5)
            .max_chars(2000)
            .build()
            .unwrap()
    }

    #[test]
    fn ask_parses_flags() {
        let cmd = ask(&[
            "What is Rust?",
            "--no-search",
            "--num-results",
            "7",
            "--parallel",
            "--json",
            "-vv",
        ]);
        assert_eq!(cmd.question, "What is Rust?");
        assert!(cmd.no_search);
        assert_eq!(cmd.num_results, Some(7));
        assert!(cmd.parallel);
        assert!(cmd.json);
        assert_eq!(cmd.verbose, 2);
    }

    #[test]
    #[serial_test::serial]
    fn cli_overrides_settings() {
        let cmd = ask(&["q", "--max-chars", "500", "--max-paragraphs", "2"]);
        let options = ask_options(&cmd, &settings());
        assert!(options.search_enabled);
        assert!(!options.parallel);
        assert_eq!(options.num_results, 3);
        assert_eq!(options.max_paragraphs, 2);
        assert_eq!(options.max_chars, 500);
    }

    #[test]
    #[serial_test::serial]
    fn no_search_disables_search() {
        let options = ask_options(&ask(&["q", "--no-search"]), &settings());
        assert!(!options.search_enabled);
    }

    #[test]
    fn blank_question_is_user_error() {
        let cmd = ask(&["   \n\t  "]);
        let error = handle_ask(&cmd).unwrap_err();
        assert!(is_user_error(&error));
        assert_eq!(error.to_string(), "Please enter a question to get a response.");
    }

    #[test]
    #[serial_test::serial]
    fn missing_key_is_user_error() {
        let saved = std::env::var(config::API_KEY_VAR).ok();
        // SAFETY: serialized with every other env-mutating test.
        unsafe { std::env::remove_var(config::API_KEY_VAR) };

        let error = resolve_settings(None).unwrap_err();
        assert!(is_user_error(&error));
        assert!(error.to_string().contains("OPENAI_API_KEY"));

        if let Some(value) = saved {
            unsafe { std::env::set_var(config::API_KEY_VAR, value) };
        }
    }

    #[test]
    fn other_errors_are_not_user_errors() {
        let error = anyhow::anyhow!("connection refused");
        assert!(!is_user_error(&error));
    }

    #[test]
    fn format_lists_sources_then_disclaimer() {
        let bundle = AnswerBundle {
            direct_answer: "Paris is the capital of France.".to_string(),
            sourced_summaries: vec![SourcedSummary::new("http://b.test", "S")],
        };
        let text = format_bundle(&bundle);
        assert!(text.starts_with("Response:\nParis is the capital of France.\n"));
        assert!(text.contains("Source: http://b.test\nS\n"));
        assert!(text.trim_end().ends_with(DISCLAIMER));
        assert!(text.find("Source:").unwrap() < text.find("Disclaimer:").unwrap());
    }

    #[test]
    fn format_without_sources_has_no_source_lines() {
        let bundle = AnswerBundle {
            direct_answer: "Paris.".to_string(),
            sourced_summaries: Vec::new(),
        };
        assert!(!format_bundle(&bundle).contains("Source:"));
    }
}
