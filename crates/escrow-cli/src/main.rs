//! # escrow CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use escrow_cli::config::CliConfig;
use escrow_cli::envelope::{run_sign, run_verify, SignArgs, VerifyArgs};
use escrow_cli::quorum::{run_quorum, QuorumArgs};
use escrow_cli::ticket::{run_encode, run_id, EncodeArgs, IdArgs};

/// Escrow resolution tickets: canonical encoding, identities, signatures,
/// and quorum checks.
#[derive(Parser, Debug)]
#[command(name = "escrow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a ticket's canonical CBOR encoding as hex.
    Encode(EncodeArgs),

    /// Print or check a ticket's identity.
    Id(IdArgs),

    /// Seal a ticket into a signed envelope.
    Sign(SignArgs),

    /// Verify and open a signed envelope.
    Verify(VerifyArgs),

    /// Evaluate multi-party signatures against the configured policy.
    Quorum(QuorumArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = CliConfig::load_optional(cli.config.as_deref()).and_then(|config| {
        match &cli.command {
            Commands::Encode(args) => run_encode(args),
            Commands::Id(args) => run_id(args),
            Commands::Sign(args) => run_sign(args),
            Commands::Verify(args) => run_verify(args, &config),
            Commands::Quorum(args) => run_quorum(args, &config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_encode() {
        let cli = Cli::try_parse_from(["escrow", "encode", "ticket.json"]).unwrap();
        if let Commands::Encode(args) = cli.command {
            assert_eq!(args.ticket, PathBuf::from("ticket.json"));
        } else {
            panic!("expected encode");
        }
    }

    #[test]
    fn cli_parse_id_with_expect() {
        let cli = Cli::try_parse_from(["escrow", "id", "t.json", "--expect", "ticket:v1:00"]).unwrap();
        if let Commands::Id(args) = cli.command {
            assert_eq!(args.expect.as_deref(), Some("ticket:v1:00"));
        } else {
            panic!("expected id");
        }
    }

    #[test]
    fn cli_parse_sign() {
        let cli = Cli::try_parse_from(["escrow", "sign", "t.json", "--secret-hex", "00ff"]).unwrap();
        if let Commands::Sign(args) = cli.command {
            assert_eq!(args.secret_hex.as_deref(), Some("00ff"));
            assert!(args.secret_env.is_none());
            assert!(args.out.is_none());
        } else {
            panic!("expected sign");
        }
    }

    #[test]
    fn cli_parse_sign_secret_sources_conflict() {
        let result = Cli::try_parse_from([
            "escrow",
            "sign",
            "t.json",
            "--secret-hex",
            "00",
            "--secret-env",
            "SEED",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_verify_with_now() {
        let cli = Cli::try_parse_from(["escrow", "verify", "env.json", "--now", "1700000000"]).unwrap();
        if let Commands::Verify(args) = cli.command {
            assert_eq!(args.now, Some(1_700_000_000));
        } else {
            panic!("expected verify");
        }
    }

    #[test]
    fn cli_parse_quorum_with_global_flags() {
        let cli = Cli::try_parse_from([
            "escrow",
            "quorum",
            "t.json",
            "--signatures",
            "sigs.json",
            "--config",
            "escrow.yaml",
            "--log-json",
            "-vv",
        ])
        .unwrap();
        assert!(cli.log_json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("escrow.yaml")));
        if let Commands::Quorum(args) = cli.command {
            assert_eq!(args.signatures, PathBuf::from("sigs.json"));
            assert!(args.threshold.is_none());
        } else {
            panic!("expected quorum");
        }
    }

    #[test]
    fn cli_parse_quorum_requires_signatures() {
        assert!(Cli::try_parse_from(["escrow", "quorum", "t.json"]).is_err());
    }

    #[test]
    fn cli_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["escrow"]).is_err());
    }
}
