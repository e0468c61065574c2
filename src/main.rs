use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use resume_review::config::DEFAULT_CONFIG_PATH;
use resume_review::{
    prepare_request, prompt, read_document, render_report, Config, GeminiClient,
    GenerateContentRequest, Language, RetryPolicy, ReviewError, Reviewer, Submission,
};

#[derive(Parser)]
#[command(name = "resume-review")]
#[command(about = "AI-powered resume review against a target job")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a resume and print the feedback report
    Review {
        #[command(flatten)]
        input: InputArgs,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Also write the report to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// Print the prompt and request body without calling the API
    Prompt {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List supported feedback languages
    Languages,
}

#[derive(Args)]
struct InputArgs {
    /// Resume file (.pdf or .txt)
    #[arg(long)]
    resume: PathBuf,

    /// Target job role, e.g. "Data Analyst"
    #[arg(long)]
    role: String,

    /// Job description text
    #[arg(long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job description from a file
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// Feedback language (name or code, e.g. "French" or "fr")
    #[arg(long)]
    language: Option<Language>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resume_review=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Review {
            input,
            api_key,
            output,
            format,
        } => {
            let config = Config::load(&cli.config)?.with_api_key(api_key);
            run_review(config, input, output, format).await
        }
        Commands::Prompt { input } => {
            let config = Config::load(&cli.config)?;
            show_prompt(config, input)
        }
        Commands::Languages => {
            list_languages();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        if let Some(review_error) = e.downcast_ref::<ReviewError>() {
            error!(error = %review_error, "Review failed");
            eprintln!("{}", review_error.user_message());
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}

async fn run_review(
    config: Config,
    input: InputArgs,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let submission = build_submission(&config, &input)?;
    let job_role = submission.job_role.trim().to_string();

    // Inputs and extraction are checked before the key so nothing is sent for a bad upload
    let request = prepare_request(submission)?;
    let retry = RetryPolicy::try_from(&config.retry).context("Invalid retry configuration")?;
    let client = GeminiClient::new(&config.api, retry)?;
    let reviewer = Reviewer::new(client);

    let result = reviewer.evaluate_request(&request).await?;

    let rendered = match format {
        OutputFormat::Markdown => render_report(&job_role, &result).markdown,
        OutputFormat::Json => {
            serde_json::to_string_pretty(&result).context("Failed to serialize review")?
        }
    };

    if let Some(path) = output {
        fs::write(&path, &rendered)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(output = %path.display(), "Review report written");
    }

    println!("{}", rendered);

    Ok(())
}

fn show_prompt(config: Config, input: InputArgs) -> Result<()> {
    let submission = build_submission(&config, &input)?;
    let request = prepare_request(submission)?;
    let prompt = prompt::build(&request);
    let body = serde_json::to_string_pretty(&GenerateContentRequest::new(&prompt))
        .context("Failed to serialize request body")?;

    println!("=== System instruction ===\n{}\n", prompt.system_instruction);
    println!("=== User message ===\n{}\n", prompt.user_message);
    println!("=== Request body ===\n{}", body);

    Ok(())
}

fn list_languages() {
    println!("Supported languages:\n");
    for language in Language::ALL {
        println!("  {} ({})", language.name(), language.code());
    }
}

fn build_submission(config: &Config, input: &InputArgs) -> Result<Submission> {
    let document = read_document(&input.resume)?;

    let job_description = match (&input.job_description, &input.job_description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path).with_context(|| {
            format!("Failed to read job description: {}", path.display())
        })?,
        (None, None) => String::new(),
    };

    Ok(Submission {
        document: Some(document),
        job_role: input.role.clone(),
        job_description,
        language: input.language.unwrap_or(config.feedback.language),
    })
}
