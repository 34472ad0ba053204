//! Storage object command group.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use devlab_core::DevlabClient;

use super::{list_query, print_json};

#[derive(Subcommand, Debug)]
pub enum ObjectCommand {
    /// List storage objects.
    List {
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,

        /// Cursor: id of the last object on the previous page.
        #[arg(long)]
        starting_after: Option<String>,

        /// Filter by name.
        #[arg(long)]
        name: Option<String>,

        /// Filter by content type.
        #[arg(long)]
        content_type: Option<String>,

        /// Filter by state (uploading, read_only, deleted).
        #[arg(long)]
        state: Option<String>,

        /// Full-text search.
        #[arg(long)]
        search: Option<String>,

        /// List the public object library instead of your own objects.
        #[arg(long, default_value_t = false)]
        public: bool,
    },
    /// Get a storage object.
    Get {
        /// ID of the object.
        #[arg(long)]
        id: String,
    },
    /// Download an object to a local file.
    Download {
        /// ID of the object.
        #[arg(long)]
        id: String,

        /// Local output path.
        #[arg(long)]
        path: PathBuf,

        /// Seconds the presigned URL stays valid.
        #[arg(long, default_value_t = 3600)]
        duration_seconds: u64,
    },
}

pub fn run(client: &DevlabClient, cmd: ObjectCommand) -> Result<()> {
    let objects = client.objects();
    match cmd {
        ObjectCommand::List {
            limit,
            starting_after,
            name,
            content_type,
            state,
            search,
            public,
        } => {
            let mut query = list_query(limit, starting_after);
            if let Some(name) = name {
                query = query.filter("name", name);
            }
            if let Some(content_type) = content_type {
                query = query.filter("content_type", content_type);
            }
            if let Some(state) = state {
                query = query.filter("state", state);
            }
            if let Some(search) = search {
                query = query.filter("search", search);
            }

            let page = if public {
                objects.list_public(&query)?
            } else {
                objects.list(&query)?
            };
            for object in &page.items {
                print_json("object", object)?;
            }
            if page.has_more {
                eprintln!("(more results; repeat with --starting-after <last id>)");
            }
            Ok(())
        }
        ObjectCommand::Get { id } => print_json("object", &objects.get(&id)?),
        ObjectCommand::Download {
            id,
            path,
            duration_seconds,
        } => {
            let url = objects.download_url(&id, duration_seconds)?;
            let bytes = objects.download_to_file(
                &url.download_url,
                &path,
                |downloaded, total| {
                    if let Some(total) = total {
                        let pct = downloaded as f64 / total as f64 * 100.0;
                        print!("\rDownloading: {pct:.1}%");
                        let _ = std::io::stdout().flush();
                    }
                },
            )?;
            println!("\nDownloaded {bytes} bytes to {}", path.display());
            Ok(())
        }
    }
}
