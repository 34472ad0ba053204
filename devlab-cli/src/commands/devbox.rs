//! Devbox command group.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use devlab_core::types::{
    AfterIdle, DevboxCreateRequest, IdleAction, LaunchParameters, ResourceSize, UserParameters,
};
use devlab_core::{config, DevlabClient};

use super::{list_query, parse_env_var, print_json};

#[derive(Subcommand, Debug)]
pub enum DevboxCommand {
    /// Create a devbox.
    Create {
        /// Display name.
        #[arg(long)]
        name: Option<String>,

        /// Devbox entrypoint.
        #[arg(long)]
        entrypoint: Option<String>,

        /// Blueprint to use, if any.
        #[arg(long)]
        blueprint_id: Option<String>,

        /// Blueprint name to use, if any.
        #[arg(long)]
        blueprint_name: Option<String>,

        /// Snapshot to launch from, if any.
        #[arg(long)]
        snapshot_id: Option<String>,

        /// Initialization commands (repeatable).
        #[arg(long = "setup-commands")]
        setup_commands: Vec<String>,

        /// Environment key-value variables (--env-vars KEY=VALUE, repeatable).
        #[arg(long = "env-vars", value_parser = parse_env_var)]
        env_vars: Vec<(String, String)>,

        /// Commands run on every boot (repeatable).
        #[arg(long = "launch-commands")]
        launch_commands: Vec<String>,

        /// Resource size: SMALL, MEDIUM, LARGE, X_LARGE.
        #[arg(long)]
        resources: Option<String>,

        /// CPU architecture (cannot be combined with a blueprint).
        #[arg(long)]
        architecture: Option<String>,

        /// Seconds of idleness before the idle action fires.
        #[arg(long)]
        idle_time: Option<u64>,

        /// What to do when idle: shutdown or suspend.
        #[arg(long)]
        idle_action: Option<String>,

        /// Run as root instead of the default user.
        #[arg(long, default_value_t = false)]
        root: bool,
    },
    /// List devboxes.
    List {
        /// Filter by status (running, suspended, ...).
        #[arg(long)]
        status: Option<String>,

        /// Page size.
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor: id of the last devbox on the previous page.
        #[arg(long)]
        starting_after: Option<String>,
    },
    /// Get a devbox.
    Get {
        /// ID of the devbox.
        #[arg(long)]
        id: String,
    },
    /// Execute a command and wait for the result.
    Exec {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Command to execute.
        #[arg(long)]
        command: String,

        /// Named shell to run in.
        #[arg(long)]
        shell_name: Option<String>,
    },
    /// Start a command without waiting.
    ExecAsync {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Command to execute.
        #[arg(long)]
        command: String,

        /// Named shell to run in.
        #[arg(long)]
        shell_name: Option<String>,
    },
    /// Get the status of an async execution.
    ExecStatus {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// ID of the execution.
        #[arg(long)]
        execution_id: String,
    },
    /// Print devbox logs.
    Logs {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Keep following new entries (stream, with polling fallback).
        #[arg(long, default_value_t = false)]
        follow: bool,
    },
    /// SSH into a devbox.
    Ssh {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Only print ~/.ssh/config lines.
        #[arg(long, default_value_t = false)]
        config_only: bool,

        /// Skip waiting for the devbox to be ready.
        #[arg(long, default_value_t = false)]
        no_wait: bool,

        /// Seconds to wait for the devbox to be ready.
        #[arg(long, default_value_t = 180)]
        timeout: u64,
    },
    /// Copy files to/from a devbox (prefix the remote side with ':').
    Scp {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Source path (':remote' or local).
        src: String,

        /// Destination path (':remote' or local).
        dst: String,

        /// Extra options passed through to scp.
        #[arg(long)]
        scp_options: Option<String>,
    },
    /// Sync files to/from a devbox (prefix the remote side with ':').
    Rsync {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Source path (':remote' or local).
        src: String,

        /// Destination path (':remote' or local).
        dst: String,

        /// Extra options passed through to rsync.
        #[arg(long)]
        rsync_options: Option<String>,
    },
    /// Forward a local port to the devbox ("local:remote").
    Tunnel {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Ports as local:remote.
        ports: String,
    },
    /// Suspend a devbox.
    Suspend {
        /// ID of the devbox.
        #[arg(long)]
        id: String,
    },
    /// Resume a suspended devbox.
    Resume {
        /// ID of the devbox.
        #[arg(long)]
        id: String,
    },
    /// Shutdown a devbox.
    Shutdown {
        /// ID of the devbox.
        #[arg(long)]
        id: String,
    },
    /// Read a remote file into a local file.
    Read {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Remote file path.
        #[arg(long)]
        remote: String,

        /// Local output path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a local file to a remote path.
    Write {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Local input path.
        #[arg(long)]
        input: PathBuf,

        /// Remote file path.
        #[arg(long)]
        remote: String,
    },
    /// Download a file from the devbox filesystem.
    Download {
        /// ID of the devbox.
        #[arg(long)]
        id: String,

        /// Remote file path.
        #[arg(long)]
        remote: String,

        /// Local output path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Start an async disk snapshot.
    Snapshot {
        /// ID of the devbox.
        #[arg(long)]
        devbox_id: String,
    },
    /// List disk snapshots.
    Snapshots {
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor: id of the last snapshot on the previous page.
        #[arg(long)]
        starting_after: Option<String>,
    },
    /// Get the status of a snapshot operation.
    SnapshotStatus {
        /// ID of the snapshot.
        #[arg(long)]
        snapshot_id: String,
    },
}

pub fn run(client: &DevlabClient, cmd: DevboxCommand) -> Result<()> {
    let devboxes = client.devboxes();
    match cmd {
        DevboxCommand::Create {
            name,
            entrypoint,
            blueprint_id,
            blueprint_name,
            snapshot_id,
            setup_commands,
            env_vars,
            launch_commands,
            resources,
            architecture,
            idle_time,
            idle_action,
            root,
        } => {
            if idle_time.is_some() != idle_action.is_some() {
                bail!("if either --idle-time or --idle-action is set, both must be set");
            }
            if architecture.is_some() && (blueprint_id.is_some() || blueprint_name.is_some()) {
                bail!("--architecture cannot be combined with a blueprint");
            }

            let after_idle = match (idle_time, idle_action) {
                (Some(seconds), Some(action)) => Some(AfterIdle {
                    idle_time_seconds: seconds,
                    on_idle: action.parse::<IdleAction>().map_err(anyhow::Error::msg)?,
                }),
                _ => None,
            };
            let resources = resources
                .map(|r| r.parse::<ResourceSize>().map_err(anyhow::Error::msg))
                .transpose()?;

            let launch_parameters = LaunchParameters {
                resource_size_request: resources,
                architecture,
                launch_commands: some_if_nonempty(launch_commands),
                available_ports: None,
                after_idle,
                user_parameters: root.then(UserParameters::root),
            };

            let req = DevboxCreateRequest {
                name,
                entrypoint,
                environment_variables: if env_vars.is_empty() {
                    None
                } else {
                    Some(env_vars.into_iter().collect())
                },
                setup_commands: some_if_nonempty(setup_commands),
                blueprint_id,
                blueprint_name,
                snapshot_id,
                launch_parameters: Some(launch_parameters),
            };

            let devbox = devboxes.create(&req)?;
            print_json("devbox", &devbox)
        }
        DevboxCommand::List {
            status,
            limit,
            starting_after,
        } => {
            let mut query = list_query(limit, starting_after);
            if let Some(status) = status {
                query = query.filter("status", status);
            }
            let page = devboxes.list(&query)?;
            for devbox in &page.items {
                print_json("devbox", devbox)?;
            }
            if page.has_more {
                eprintln!("(more results; repeat with --starting-after <last id>)");
            }
            Ok(())
        }
        DevboxCommand::Get { id } => print_json("devbox", &devboxes.get(&id)?),
        DevboxCommand::Exec {
            id,
            command,
            shell_name,
        } => {
            let result = devboxes.execute_sync(&id, &command, shell_name.as_deref())?;
            print_json("exec_result", &result)
        }
        DevboxCommand::ExecAsync {
            id,
            command,
            shell_name,
        } => {
            let execution = devboxes.execute_async(&id, &command, shell_name.as_deref())?;
            print_json("execution", &execution)
        }
        DevboxCommand::ExecStatus { id, execution_id } => {
            print_json("execution", &devboxes.execution_status(&id, &execution_id)?)
        }
        DevboxCommand::Logs { id, follow } => {
            let logs = devboxes.logs(&id)?;
            for entry in &logs {
                println!("{}", entry.display_line());
            }
            if follow {
                follow_logs(client, &id, last_timestamp(&logs))?;
            }
            Ok(())
        }
        DevboxCommand::Ssh {
            id,
            config_only,
            no_wait,
            timeout,
        } => ssh(client, &id, config_only, no_wait, timeout),
        DevboxCommand::Scp {
            id,
            src,
            dst,
            scp_options,
        } => transfer(client, &id, "scp", &src, &dst, scp_options.as_deref()),
        DevboxCommand::Rsync {
            id,
            src,
            dst,
            rsync_options,
        } => transfer(client, &id, "rsync", &src, &dst, rsync_options.as_deref()),
        DevboxCommand::Tunnel { id, ports } => tunnel(client, &id, &ports),
        DevboxCommand::Suspend { id } => print_json("devbox", &devboxes.suspend(&id)?),
        DevboxCommand::Resume { id } => print_json("devbox", &devboxes.resume(&id)?),
        DevboxCommand::Shutdown { id } => print_json("devbox", &devboxes.shutdown(&id)?),
        DevboxCommand::Read { id, remote, output } => {
            let contents = devboxes.read_file(&id, &remote)?;
            std::fs::write(&output, contents)
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Wrote remote file {remote} from devbox {id} to local file {}",
                output.display()
            );
            Ok(())
        }
        DevboxCommand::Write { id, input, remote } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            devboxes.write_file(&id, &remote, &contents)?;
            println!(
                "Wrote local file {} to remote file {remote} on devbox {id}",
                input.display()
            );
            Ok(())
        }
        DevboxCommand::Download { id, remote, output } => {
            let mut file = std::fs::File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            let bytes = devboxes.download_file(&id, &remote, &mut file)?;
            println!("Downloaded {bytes} bytes to {}", output.display());
            Ok(())
        }
        DevboxCommand::Snapshot { devbox_id } => {
            print_json("snapshot", &devboxes.snapshot_disk(&devbox_id)?)
        }
        DevboxCommand::Snapshots {
            limit,
            starting_after,
        } => {
            let page = devboxes.list_snapshots(&list_query(limit, starting_after))?;
            for snapshot in &page.items {
                print_json("snapshot", snapshot)?;
            }
            Ok(())
        }
        DevboxCommand::SnapshotStatus { snapshot_id } => {
            print_json("snapshot_status", &devboxes.snapshot_status(&snapshot_id)?)
        }
    }
}

fn some_if_nonempty(v: Vec<String>) -> Option<Vec<String>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

fn last_timestamp(logs: &[devlab_core::types::LogEntry]) -> i64 {
    logs.iter().filter_map(|l| l.timestamp_ms).max().unwrap_or(0)
}

/// Keep printing new log entries: streaming tail first, then interval
/// polling when the stream cannot be opened or dies.
fn follow_logs(client: &DevlabClient, id: &str, mut last_ts: i64) -> Result<()> {
    let devboxes = client.devboxes();

    if let Ok(tail) = devboxes.tail_logs(id) {
        for entry in tail {
            match entry {
                Ok(entry) => {
                    if let Some(ts) = entry.timestamp_ms {
                        last_ts = last_ts.max(ts);
                    }
                    println!("{}", entry.display_line());
                }
                Err(e) => {
                    eprintln!("log stream dropped ({e}); falling back to polling");
                    break;
                }
            }
        }
    } else {
        eprintln!("log stream unavailable; polling instead");
    }

    loop {
        std::thread::sleep(Duration::from_secs(2));
        let entries = match devboxes.logs_since(id, last_ts) {
            Ok(entries) => entries,
            Err(e) if e.is_transient() => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            if let Some(ts) = entry.timestamp_ms {
                last_ts = last_ts.max(ts);
            }
            println!("{}", entry.display_line());
        }
    }
}

/// Fetch (or mint) the SSH key for a devbox and write it to
/// `~/.devlab/ssh_keys/<id>.pem` with owner-only permissions.
fn fetch_ssh_key(client: &DevlabClient, id: &str) -> Result<(PathBuf, String)> {
    let key = client.devboxes().create_ssh_key(id)?;

    let dir = config::ssh_key_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let keyfile = dir.join(format!("{id}.pem"));
    std::fs::write(&keyfile, &key.ssh_private_key)
        .with_context(|| format!("writing {}", keyfile.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&keyfile, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok((keyfile, key.url))
}

fn proxy_command(ssh_proxy: &str) -> String {
    format!(
        "openssl s_client -quiet -verify_quiet -servername %h -connect {ssh_proxy} 2>/dev/null"
    )
}

fn ssh(client: &DevlabClient, id: &str, config_only: bool, no_wait: bool, timeout: u64) -> Result<()> {
    let devboxes = client.devboxes();

    if !no_wait {
        println!("Waiting for devbox {id} to be ready...");
        let ready = devboxes.wait_for_ready(
            id,
            Duration::from_secs(timeout),
            Duration::from_secs(3),
            |status, elapsed| {
                println!(
                    "Devbox {id} is still {status}... (elapsed: {:.0}s)",
                    elapsed.as_secs_f64()
                );
            },
        )?;
        if !ready {
            bail!("devbox {id} did not become ready; try again later");
        }
    }

    let devbox = devboxes.get(id)?;
    let user = devbox
        .launch_parameters
        .and_then(|lp| lp.user_parameters)
        .map(|u| u.username)
        .unwrap_or_else(|| "user".to_string());

    let (keyfile, url) = fetch_ssh_key(client, id)?;
    let proxy = proxy_command(client.ssh_proxy());

    if config_only {
        println!(
            "\nHost {id}\n  Hostname {url}\n  User {user}\n  IdentityFile {}\n  StrictHostKeyChecking no\n  ProxyCommand {proxy}\n",
            keyfile.display()
        );
        return Ok(());
    }

    let status = Command::new("ssh")
        .arg("-i")
        .arg(&keyfile)
        .arg("-o")
        .arg(format!("ProxyCommand={proxy}"))
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg(format!("{user}@{url}"))
        .status()
        .context("failed to launch ssh")?;
    exit_like(status)
}

/// scp/rsync transfer; the remote side is marked with a leading ':'.
fn transfer(
    client: &DevlabClient,
    id: &str,
    tool: &str,
    src: &str,
    dst: &str,
    extra_options: Option<&str>,
) -> Result<()> {
    let (keyfile, url) = fetch_ssh_key(client, id)?;
    let proxy = proxy_command(client.ssh_proxy());

    let mut cmd = Command::new(tool);
    match tool {
        "scp" => {
            cmd.arg("-i")
                .arg(&keyfile)
                .arg("-o")
                .arg(format!("ProxyCommand={proxy}"))
                .arg("-o")
                .arg("StrictHostKeyChecking=no");
        }
        _ => {
            let ssh_options = format!(
                "ssh -i {} -o ProxyCommand='{proxy}' -o StrictHostKeyChecking=no",
                keyfile.display()
            );
            cmd.arg("-vrz").arg("-e").arg(ssh_options);
        }
    }

    if let Some(options) = extra_options {
        cmd.args(options.split_whitespace());
    }

    cmd.arg(resolve_endpoint(src, &url));
    cmd.arg(resolve_endpoint(dst, &url));

    let status = cmd.status().with_context(|| format!("failed to launch {tool}"))?;
    exit_like(status)
}

/// ':path' → 'user@host:path', anything else is a local path.
fn resolve_endpoint(path: &str, url: &str) -> String {
    match path.strip_prefix(':') {
        Some(remote) => format!("user@{url}:{remote}"),
        None => path.to_string(),
    }
}

fn tunnel(client: &DevlabClient, id: &str, ports: &str) -> Result<()> {
    let (local, remote) = ports
        .split_once(':')
        .context("ports must be specified as 'local:remote'")?;
    let local: u16 = local.parse().context("invalid local port")?;
    let remote: u16 = remote.parse().context("invalid remote port")?;

    let (keyfile, url) = fetch_ssh_key(client, id)?;
    let proxy = proxy_command(client.ssh_proxy());

    println!("Starting tunnel: local port {local} -> remote port {remote}");
    println!("Press Ctrl+C to stop the tunnel.");

    let status = Command::new("ssh")
        .arg("-i")
        .arg(&keyfile)
        .arg("-o")
        .arg(format!("ProxyCommand={proxy}"))
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg("-N")
        .arg("-L")
        .arg(format!("{local}:localhost:{remote}"))
        .arg(format!("user@{url}"))
        .status()
        .context("failed to launch ssh")?;
    exit_like(status)
}

/// Propagate a child's exit code; success falls through.
fn exit_like(status: std::process::ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        std::process::exit(status.code().unwrap_or(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_endpoints_get_user_and_host() {
        assert_eq!(
            resolve_endpoint(":/var/log/app.log", "dbx.example"),
            "user@dbx.example:/var/log/app.log"
        );
        assert_eq!(resolve_endpoint("./local.txt", "dbx.example"), "./local.txt");
    }

    #[test]
    fn proxy_command_targets_configured_proxy() {
        let cmd = proxy_command("ssh.devlab.run:443");
        assert!(cmd.contains("-connect ssh.devlab.run:443"));
        assert!(cmd.starts_with("openssl s_client"));
    }

    #[test]
    fn nonempty_helper() {
        assert_eq!(some_if_nonempty(vec![]), None);
        assert_eq!(
            some_if_nonempty(vec!["a".into()]),
            Some(vec!["a".to_string()])
        );
    }
}
