//! waymark CLI entry point.

mod args;
mod client;

use std::time::Duration;

use clap::Parser;
use tracing::error;
use uuid::Uuid;

use waymark_core::protocol::{Command, Request, ResponseData};

use crate::args::{Cli, Commands};
use crate::client::BridgeClient;

/// Margin added to the server-side wait budget before the client gives up.
const WAIT_RESPONSE_MARGIN: Duration = Duration::from_secs(5);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run_command(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Convert CLI args to a protocol command, plus a response deadline for
/// commands that block server-side.
fn cli_to_command(cli: &Cli) -> (Command, Option<Duration>) {
    match &cli.command {
        Commands::Elements => (Command::Elements, None),
        Commands::Find(args) => (
            Command::Find {
                pattern: args.pattern.clone(),
            },
            None,
        ),
        Commands::InRegion(args) => (
            Command::InRegion {
                x: args.x,
                y: args.y,
                width: args.width,
                height: args.height,
            },
            None,
        ),
        Commands::Tap(args) => (
            Command::Tap {
                identifier: args.identifier.clone(),
            },
            None,
        ),
        Commands::Type(args) => (
            Command::TypeText {
                identifier: args.identifier.clone(),
                text: args.text.clone(),
            },
            None,
        ),
        Commands::Swipe(args) => (
            Command::Swipe {
                from_x: args.from_x,
                from_y: args.from_y,
                to_x: args.to_x,
                to_y: args.to_y,
            },
            None,
        ),
        Commands::Wait(args) => (
            Command::WaitFor {
                identifier: args.identifier.clone(),
                timeout_ms: Some(args.timeout),
            },
            // The bridge holds the response until the wait resolves.
            Some(Duration::from_millis(args.timeout) + WAIT_RESPONSE_MARGIN),
        ),
        Commands::Context => (Command::Context, None),
        Commands::Snapshot => (Command::Snapshot, None),
    }
}

/// Connect, send one request, print the response as JSON.
fn run_command(cli: Cli) -> anyhow::Result<()> {
    let (command, deadline) = cli_to_command(&cli);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut client = BridgeClient::connect(cli.app.as_deref()).await?;

        let request = Request {
            id: Uuid::new_v4().to_string(),
            command,
        };
        let response = match deadline {
            Some(deadline) => client.request_with_timeout(request, deadline).await?,
            None => client.request(request).await?,
        };

        if response.success {
            let mut failed_outcome = false;
            if let Some(data) = response.data {
                if let ResponseData::Outcome { outcome } = &data {
                    failed_outcome = !outcome.is_success();
                }
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
            // Not-found and timeout are ordinary payloads on the wire, but
            // scripted agents want them reflected in the exit code.
            if failed_outcome {
                std::process::exit(1);
            }
        } else if let Some(err) = response.error {
            eprintln!("Error: [{}] {}", err.kind, err.message);
            if let Some(suggestion) = err.suggestion {
                eprintln!("Hint: {}", suggestion);
            }
            std::process::exit(1);
        }

        Ok(())
    })
}
