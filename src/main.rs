//! ruleval - evaluate rule expressions against records

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use ruleval::record::{from_json, ParameterMapping};
use ruleval::{Engine, EngineConfig};
use serde::Serialize;
use std::path::PathBuf;

const TAG_PATTERN: &str = "^JIRA:[a-zA-Z]{3}[a-zA-Z]*$";

/// ruleval - evaluate rule expressions against records
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve unknown functions at evaluation time instead of compile time
    #[arg(long)]
    lenient: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay the tag and flag validation scenarios
    Demo,

    /// Evaluate one expression against a JSON record
    Eval {
        /// Expression to evaluate
        expression: String,

        /// JSON file holding the record; an empty record when omitted
        #[arg(short, long)]
        record: Option<PathBuf>,
    },
}

#[derive(Serialize, Debug)]
struct Tag {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Serialize, Debug)]
struct Segment {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "RolloutPercent")]
    rollout_percent: i64,
}

#[derive(Serialize, Debug, Default)]
struct Flag {
    #[serde(rename = "Tags")]
    tags: Vec<Tag>,
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Segments")]
    segments: Vec<Segment>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.lenient {
        config.strict_functions = false;
    }

    let engine = Engine::with_config(config);

    match args.command {
        Command::Demo => run_demo(&engine),
        Command::Eval { expression, record } => run_eval(&engine, &expression, record),
    }
}

fn run_eval(engine: &Engine, expression: &str, record: Option<PathBuf>) -> Result<()> {
    let params = match record {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read record from {}", path.display()))?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Record is not valid JSON")?;
            from_json(&json).context("Unsupported record")?
        }
        None => ParameterMapping::new(),
    };

    let compiled = engine
        .compile(expression)
        .context("Failed to compile expression")?;
    let value = engine
        .evaluate(&compiled, &params)
        .context("Failed to evaluate expression")?;

    println!("{}", value);
    Ok(())
}

fn run_demo(engine: &Engine) -> Result<()> {
    println!("🏷️  Validating tags");

    let tag_rule = engine
        .compile(&format!("regexMatch(tag, \"{}\")", TAG_PATTERN))
        .context("Failed to compile tag rule")?;

    for tag in [
        "JIRA:EPLT",
        "FOO:BAR",
        "JIRA:TS",
        "JIRA:TLA",
        "JIRA:EP123",
        "EXTRA_STUFF kljalkj JIRA:EPLT EXTRA",
    ] {
        let params = ParameterMapping::new().with("tag", tag);
        let valid = engine.evaluate_record(&tag_rule, &params)?;
        println!("   - is tag ({}) valid? {}", tag, valid);
    }
    println!();

    let tag_clause = format!("any(\"regexMatch(Value, \\\"{}\\\")\", Tags)", TAG_PATTERN);
    let flag_rules = [
        tag_clause.clone(),
        format!("{} && any(\"RolloutPercent > 10\", Segments)", tag_clause),
    ];

    for source in &flag_rules {
        let rule = engine
            .compile(source)
            .with_context(|| format!("Failed to compile flag rule {}", source))?;
        println!("🚩 Validating flags with {}", rule);

        for flag in example_flags() {
            let params = ruleval::extract(&flag)?;
            log::debug!("params {}", params);
            let valid = engine.evaluate_record(&rule, &params)?;
            println!("   - is flag {} valid? {}", flag.id, valid);
        }
        println!();
    }

    println!("✅ Done");
    Ok(())
}

fn tag(id: i64, value: &str) -> Tag {
    Tag {
        id,
        value: value.to_string(),
    }
}

fn example_flags() -> Vec<Flag> {
    vec![
        // No tags
        Flag {
            id: 1,
            ..Flag::default()
        },
        Flag {
            id: 2,
            tags: vec![tag(3, "FOO:BAR"), tag(6, "JIRA:EPLT")],
            ..Flag::default()
        },
        Flag {
            id: 4,
            tags: vec![tag(5, "JIRA:EPLT")],
            ..Flag::default()
        },
        Flag {
            id: 7,
            tags: vec![tag(8, "JIRA:EP12")],
            ..Flag::default()
        },
        Flag {
            id: 9,
            tags: vec![tag(10, "JIRA:EPLT")],
            segments: vec![Segment {
                id: 11,
                rollout_percent: 20,
            }],
            ..Flag::default()
        },
        Flag {
            id: 12,
            tags: vec![tag(13, "JIRA:EPLT")],
            segments: vec![Segment {
                id: 14,
                rollout_percent: 5,
            }],
            ..Flag::default()
        },
    ]
}
