use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use hashfleet_provider::RetryPolicy;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "hashfleet",
    about = "hashfleet — weighted GPU fleet resolution and sizing",
    version,
    propagate_version = true
)]
struct Cli {
    /// Region to probe and scale in
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Overall budget for provider calls, retries included
    #[arg(long, global = true, env = "HASHFLEET_TIMEOUT_MS", default_value_t = 8_000)]
    timeout_ms: u64,

    /// Attempts per provider call, including the first
    #[arg(long, global = true, env = "HASHFLEET_MAX_ATTEMPTS", default_value_t = 6)]
    max_attempts: u32,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one instance-filter lifecycle event.
    ///
    /// Reads the event JSON from --event or stdin and prints the response.
    Filter {
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Handle one capacity lifecycle event.
    Size {
        #[arg(short, long)]
        event: Option<PathBuf>,
        /// Log the desired capacity instead of applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// Preview the override list for a specification.
    Resolve {
        /// Instance type specification, e.g. "g4dn.*,g5.*,-p4d.*"
        #[arg(short, long)]
        spec: String,
        /// Catalogue TOML file (default: built-in catalogue)
        #[arg(short, long)]
        catalogue: Option<PathBuf>,
        /// Hashrate target to size for
        #[arg(long)]
        hashrate: Option<String>,
        /// Treat every catalogue type as offered instead of probing
        #[arg(long)]
        offline: bool,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hashfleet=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let region = cli
        .region
        .filter(|r| !r.is_empty())
        .context("no region: pass --region or set AWS_REGION")?;
    let ctx = Context {
        region,
        policy: RetryPolicy {
            timeout: Duration::from_millis(cli.timeout_ms),
            max_attempts: cli.max_attempts.max(1),
            ..RetryPolicy::default()
        },
    };
    tracing::debug!(
        region = %ctx.region,
        timeout = ?ctx.policy.timeout,
        max_attempts = ctx.policy.max_attempts,
        "hashfleet starting"
    );

    match cli.command {
        Commands::Filter { event } => commands::filter::run(&ctx, event.as_deref()).await,
        Commands::Size { event, dry_run } => {
            commands::size::run(&ctx, event.as_deref(), dry_run).await
        }
        Commands::Resolve {
            spec,
            catalogue,
            hashrate,
            offline,
        } => {
            commands::resolve::run(
                &ctx,
                &spec,
                catalogue.as_deref(),
                hashrate.as_deref(),
                offline,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn globals_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hashfleet",
            "resolve",
            "--spec",
            "g5.*",
            "--offline",
            "--region",
            "eu-central-1",
            "--max-attempts",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.region.as_deref(), Some("eu-central-1"));
        assert_eq!(cli.max_attempts, 2);
        assert!(matches!(
            cli.command,
            Commands::Resolve { offline: true, ref spec, .. } if spec == "g5.*"
        ));
    }

    #[test]
    fn size_reads_dry_run_flag() {
        let cli = Cli::try_parse_from(["hashfleet", "size", "--dry-run", "-e", "event.json"]).unwrap();
        match cli.command {
            Commands::Size { event, dry_run } => {
                assert!(dry_run);
                assert_eq!(event, Some(PathBuf::from("event.json")));
            }
            _ => panic!("expected size"),
        }
    }
}
