//! # rlmeta CLI
//!
//! Runs one of the bundled component programs over the given files.

mod programs;

use anyhow::{bail, Context};
use clap::Parser;
use programs::Program;
use rlmeta_actors::{args_message, Broker, Outcome, Scheduler, SchedulerConfig};
use rlmeta_engine::Value;

#[derive(Parser)]
#[command(name = "rlmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Stop quietly when no message can be consumed and print the leftovers
    #[arg(long)]
    lenient: bool,

    /// Run each component as its own task behind a broker
    #[arg(long)]
    distributed: bool,

    /// Starting messages as a JSON array (defaults to `["Args", ARGS...]`)
    #[arg(long, value_name = "JSON")]
    messages: Option<String>,

    /// Program to run
    #[arg(value_enum)]
    program: Program,

    /// Arguments passed in the `Args` message (`-` reads standard input)
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn parse_messages(json: &str) -> anyhow::Result<Vec<Value>> {
    let parsed: serde_json::Value =
        serde_json::from_str(json).context("--messages is not valid JSON")?;
    let Some(items) = parsed.as_array() else {
        bail!("--messages must be a JSON array of messages");
    };
    items
        .iter()
        .map(|item| Value::from_json(item).context("unsupported message"))
        .collect()
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let config = SchedulerConfig::new().lenient(cli.lenient);
    let components = cli.program.components()?;
    let messages = match &cli.messages {
        Some(json) => parse_messages(json)?,
        None => Vec::new(),
    };

    if cli.distributed {
        let mut broker = Broker::new(config);
        for component in components {
            broker.spawn(component);
        }
        if messages.is_empty() {
            broker.put(args_message(&cli.args));
        }
        for message in messages {
            broker.put(message);
        }
        Ok(broker.run().await?)
    } else {
        let mut scheduler = Scheduler::new(config);
        for component in components {
            scheduler.spawn(component);
        }
        Ok(scheduler.run_with_args(messages, &cli.args)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let outcome = run(cli).await?;
    tracing::debug!(rounds = outcome.rounds, reason = ?outcome.reason, "simulation finished");

    if !outcome.leftover.is_empty() {
        let leftover = outcome
            .leftover
            .iter()
            .map(Value::to_json)
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::Value::Array(leftover));
    }
    Ok(())
}
