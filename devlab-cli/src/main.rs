//! devlab CLI — manage devboxes, blueprints, and storage objects.
//!
//! Command groups:
//! - `devbox` — lifecycle, exec, logs, ssh/scp/rsync/tunnel, files, snapshots
//! - `blueprint` — create, preview, list, get, build logs
//! - `object` — list, get, download

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use devlab_core::{Config, DevlabClient};

#[derive(Parser)]
#[command(name = "devlab", version, about = "devlab CLI — manage cloud devboxes")]
struct Cli {
    /// Target environment ("dev" switches every endpoint). Overrides DEVLAB_ENV.
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage devboxes.
    Devbox {
        #[command(subcommand)]
        action: commands::devbox::DevboxCommand,
    },
    /// Manage blueprints.
    Blueprint {
        #[command(subcommand)]
        action: commands::blueprint::BlueprintCommand,
    },
    /// Manage storage objects.
    Object {
        #[command(subcommand)]
        action: commands::object::ObjectCommand,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env_with(cli.env.as_deref())?;
    let client = DevlabClient::new(&config)?;

    match cli.command {
        Commands::Devbox { action } => commands::devbox::run(&client, action),
        Commands::Blueprint { action } => commands::blueprint::run(&client, action),
        Commands::Object { action } => commands::object::run(&client, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devbox_list() {
        let cli = Cli::try_parse_from(["devlab", "devbox", "list", "--status", "running"]).unwrap();
        match cli.command {
            Commands::Devbox {
                action: commands::devbox::DevboxCommand::List { status, .. },
            } => assert_eq!(status.as_deref(), Some("running")),
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parses_global_env_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["devlab", "devbox", "list", "--env", "dev"]).unwrap();
        assert_eq!(cli.env.as_deref(), Some("dev"));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["devlab", "frobnicate"]).is_err());
    }

    #[test]
    fn parses_repeated_env_vars() {
        let cli = Cli::try_parse_from([
            "devlab", "devbox", "create", "--env-vars", "A=1", "--env-vars", "B=2",
        ])
        .unwrap();
        match cli.command {
            Commands::Devbox {
                action: commands::devbox::DevboxCommand::Create { env_vars, .. },
            } => {
                assert_eq!(env_vars.len(), 2);
                assert_eq!(env_vars[0], ("A".to_string(), "1".to_string()));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parses_object_download() {
        let cli = Cli::try_parse_from([
            "devlab", "object", "download", "--id", "obj_1", "--path", "/tmp/out.tar",
        ])
        .unwrap();
        match cli.command {
            Commands::Object {
                action: commands::object::ObjectCommand::Download { id, path, .. },
            } => {
                assert_eq!(id, "obj_1");
                assert_eq!(path, std::path::PathBuf::from("/tmp/out.tar"));
            }
            _ => panic!("wrong command"),
        }
    }
}
