//! Blueprint command group.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use devlab_core::types::{
    BlueprintCreateRequest, LaunchParameters, ResourceSize, UserParameters,
};
use devlab_core::DevlabClient;

use super::{list_query, print_json};

#[derive(Subcommand, Debug)]
pub enum BlueprintCommand {
    /// Create a blueprint (the build runs server-side).
    Create {
        /// Blueprint name.
        #[arg(long)]
        name: String,

        /// Inline dockerfile contents.
        #[arg(long)]
        dockerfile: Option<String>,

        /// Read dockerfile contents from a file.
        #[arg(long)]
        dockerfile_path: Option<PathBuf>,

        /// System initialization commands (repeatable).
        #[arg(long = "system-setup-commands")]
        system_setup_commands: Vec<String>,

        /// Resource size: SMALL, MEDIUM, LARGE, X_LARGE.
        #[arg(long)]
        resources: Option<String>,

        /// CPU architecture.
        #[arg(long)]
        architecture: Option<String>,

        /// Ports devboxes from this blueprint should expose (repeatable).
        #[arg(long = "available-ports")]
        available_ports: Vec<u16>,

        /// Build for the root user.
        #[arg(long, default_value_t = false)]
        root: bool,
    },
    /// Render the final dockerfile without building.
    Preview {
        /// Blueprint name.
        #[arg(long)]
        name: String,

        /// Inline dockerfile contents.
        #[arg(long)]
        dockerfile: Option<String>,

        /// System initialization commands (repeatable).
        #[arg(long = "system-setup-commands")]
        system_setup_commands: Vec<String>,
    },
    /// List blueprints.
    List {
        /// Filter by name.
        #[arg(long)]
        name: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor: id of the last blueprint on the previous page.
        #[arg(long)]
        starting_after: Option<String>,
    },
    /// Get a blueprint.
    Get {
        /// ID of the blueprint.
        #[arg(long)]
        id: String,
    },
    /// Print blueprint build logs.
    Logs {
        /// ID of the blueprint.
        #[arg(long)]
        id: String,
    },
}

pub fn run(client: &DevlabClient, cmd: BlueprintCommand) -> Result<()> {
    let blueprints = client.blueprints();
    match cmd {
        BlueprintCommand::Create {
            name,
            dockerfile,
            dockerfile_path,
            system_setup_commands,
            resources,
            architecture,
            available_ports,
            root,
        } => {
            if dockerfile.is_some() && dockerfile_path.is_some() {
                bail!("use either --dockerfile or --dockerfile-path, not both");
            }
            let dockerfile = match dockerfile_path {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                None => dockerfile,
            };
            let resources = resources
                .map(|r| r.parse::<ResourceSize>().map_err(anyhow::Error::msg))
                .transpose()?;

            let req = BlueprintCreateRequest {
                name,
                dockerfile,
                system_setup_commands: if system_setup_commands.is_empty() {
                    None
                } else {
                    Some(system_setup_commands)
                },
                launch_parameters: Some(LaunchParameters {
                    resource_size_request: resources,
                    architecture,
                    available_ports: if available_ports.is_empty() {
                        None
                    } else {
                        Some(available_ports)
                    },
                    user_parameters: root.then(UserParameters::root),
                    ..LaunchParameters::default()
                }),
            };

            print_json("created blueprint", &blueprints.create(&req)?)
        }
        BlueprintCommand::Preview {
            name,
            dockerfile,
            system_setup_commands,
        } => {
            let req = BlueprintCreateRequest {
                name,
                dockerfile,
                system_setup_commands: if system_setup_commands.is_empty() {
                    None
                } else {
                    Some(system_setup_commands)
                },
                launch_parameters: None,
            };
            print_json("preview blueprint", &blueprints.preview(&req)?)
        }
        BlueprintCommand::List {
            name,
            limit,
            starting_after,
        } => {
            let mut query = list_query(limit, starting_after);
            if let Some(name) = name {
                query = query.filter("name", name);
            }
            let page = blueprints.list(&query)?;
            for blueprint in &page.items {
                print_json("blueprint", blueprint)?;
            }
            Ok(())
        }
        BlueprintCommand::Get { id } => print_json("blueprint", &blueprints.get(&id)?),
        BlueprintCommand::Logs { id } => {
            for entry in blueprints.logs(&id)? {
                println!("{}", entry.display_line());
            }
            Ok(())
        }
    }
}
