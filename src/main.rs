//! persona-sim CLI entry point.
//!
//! Provides `survey`, `interview` and `ab-test` subcommands that run one
//! research engine over a persona file and write a CSV table, plus `sample`
//! for drawing a random subset from a persona dataset.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use persona_sim::config::{require_text, Config};
use persona_sim::engine::ab_test::{AbSummary, AbTestEngine};
use persona_sim::engine::interview::{InterviewEngine, InterviewSummary};
use persona_sim::engine::survey::SurveyEngine;
use persona_sim::engine::BatchOutcome;
use persona_sim::logging;
use persona_sim::output::{write_table, TableRecord};
use persona_sim::persona::{load_personas, sample_personas, save_personas, PersonaProfile};
use persona_sim::providers::factory::build_provider;
use persona_sim::providers::Gateway;

/// persona-sim: synthetic persona research with an LLM.
#[derive(Parser)]
#[command(name = "persona-sim", version, about)]
struct Cli {
    /// YAML config file (default: `$CONFIG_PATH`, then `./config.yaml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs with daily rotation into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Ask every persona one question, sequentially.
    Survey {
        /// Persona JSON file.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Result CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Survey question.
        #[arg(long)]
        question: Option<String>,
    },
    /// Run a multi-turn depth interview with every persona.
    Interview {
        /// Persona JSON file.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Result CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of interviewer follow-up questions.
        #[arg(long)]
        max_turns: Option<u32>,
        /// Interviews in flight at once.
        #[arg(long)]
        concurrent: Option<usize>,
        /// Opening question.
        #[arg(long)]
        question: Option<String>,
    },
    /// Compare two pieces of ad copy with every persona.
    AbTest {
        /// Persona JSON file.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Result CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Evaluations in flight at once.
        #[arg(long)]
        concurrent: Option<usize>,
    },
    /// Draw a random sample from a local persona dataset.
    Sample {
        /// Full persona dataset (JSON array).
        #[arg(long)]
        source: PathBuf,
        /// Number of personas to keep.
        #[arg(long)]
        size: usize,
        /// Where to write the sample.
        #[arg(long)]
        output: PathBuf,
        /// Seed for a reproducible sample.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let _logging_guard = logging::init(cli.log_dir.as_deref())?;

    match cli.command {
        Command::Survey {
            input,
            output,
            question,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            override_path(&mut config.survey.input_file, input);
            override_text(&mut config.survey.question, question);
            let output = output.unwrap_or_else(|| config.survey.output_path());
            handle_survey(&config, &output).await
        }
        Command::Interview {
            input,
            output,
            max_turns,
            concurrent,
            question,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            override_path(&mut config.interview.input_file, input);
            override_path(&mut config.interview.output_file, output);
            override_text(&mut config.interview.initial_question, question);
            if let Some(turns) = max_turns {
                config.interview.max_turns = turns;
            }
            if concurrent.is_some() {
                config.interview.concurrent_limit = concurrent;
            }
            config.validate()?;
            handle_interview(&config).await
        }
        Command::AbTest {
            input,
            output,
            concurrent,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            override_path(&mut config.ab_test.input_file, input);
            override_path(&mut config.ab_test.output_file, output);
            if let Some(limit) = concurrent {
                config.concurrent_limit = limit;
            }
            config.validate()?;
            handle_ab_test(&config).await
        }
        Command::Sample {
            source,
            size,
            output,
            seed,
        } => handle_sample(&source, size, &output, seed),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Config::load(path).context("failed to load configuration")
}

fn override_path(slot: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn override_text(slot: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Build the gateway for the configured provider.
fn build_gateway(config: &Config) -> anyhow::Result<Gateway> {
    let provider = build_provider(config).context("failed to initialise LLM provider")?;
    Ok(Gateway::new(provider, config.model_params.completion_params()))
}

fn load_input(path: &Path) -> anyhow::Result<Vec<PersonaProfile>> {
    load_personas(path).with_context(|| format!("failed to load personas from {}", path.display()))
}

fn write_output<R: TableRecord>(
    path: &Path,
    outcome: &BatchOutcome<R>,
) -> anyhow::Result<()> {
    write_table(path, &outcome.records)?;
    info!(
        path = %path.display(),
        records = outcome.records.len(),
        failures = outcome.failures.len(),
        "run finished"
    );
    Ok(())
}

async fn handle_survey(config: &Config, output: &Path) -> anyhow::Result<()> {
    require_text("survey.question", &config.survey.question)?;
    let gateway = build_gateway(config)?;
    let personas = load_input(&config.survey.input_file)?;

    let engine = SurveyEngine::new(gateway, config.survey.question.clone());
    let outcome = engine.run(personas).await;
    write_output(output, &outcome)?;

    println!(
        "Survey answered: {}/{}",
        outcome.records.len(),
        outcome.attempted()
    );
    println!("Results: {}", output.display());
    Ok(())
}

async fn handle_interview(config: &Config) -> anyhow::Result<()> {
    let settings = &config.interview;
    require_text("interview.initial_question", &settings.initial_question)?;
    let gateway = build_gateway(config)?;
    let personas = load_input(&settings.input_file)?;

    let limit = settings.concurrent_limit.unwrap_or(config.concurrent_limit);
    let engine = InterviewEngine::new(
        gateway,
        settings.max_turns,
        settings.initial_question.clone(),
    );
    let outcome = engine.run(personas, limit).await;
    write_output(&settings.output_file, &outcome)?;

    print!("{}", InterviewSummary::from_outcome(&outcome));
    println!("Results: {}", settings.output_file.display());
    Ok(())
}

async fn handle_ab_test(config: &Config) -> anyhow::Result<()> {
    let settings = &config.ab_test;
    require_text("ab_test.plan_a", &settings.plan_a)?;
    require_text("ab_test.plan_b", &settings.plan_b)?;
    let gateway = build_gateway(config)?;
    let personas = load_input(&settings.input_file)?;

    let engine = AbTestEngine::new(gateway, settings.plan_a.clone(), settings.plan_b.clone());
    let outcome = engine.run(personas, config.concurrent_limit).await;
    write_output(&settings.output_file, &outcome)?;

    println!(
        "Evaluations completed: {}/{}",
        outcome.records.len(),
        outcome.attempted()
    );
    print!("{}", AbSummary::from_records(&outcome.records));
    println!("Results: {}", settings.output_file.display());
    Ok(())
}

fn handle_sample(
    source: &Path,
    size: usize,
    output: &Path,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let personas = load_input(source)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sample = sample_personas(&personas, size, &mut rng)?;
    save_personas(output, &sample)?;

    println!(
        "Sampled {} of {} personas into {}",
        sample.len(),
        personas.len(),
        output.display()
    );
    Ok(())
}
