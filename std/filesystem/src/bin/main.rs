//! Binary entry point for the sandbox-fs MCP server.

use anyhow::Context;
use clap::Parser;
use rmcp::ServiceExt;
use sandbox_fs::{FilesystemServer, validate::AllowedRoots};

/// Sandboxed MCP filesystem server — serves file tools over stdio.
#[derive(Parser)]
#[command(name = "sandbox-fs", version, about)]
struct Cli {
    /// Allowed directories the server may access.
    #[arg(required = true, num_args = 1..)]
    allowed_dirs: Vec<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();
    let roots = AllowedRoots::new(&cli.allowed_dirs).context("invalid allowed directory")?;
    tracing::info!(roots = ?roots.dirs(), "serving filesystem tools");

    let server = FilesystemServer::new(roots);
    let transport = rmcp::transport::stdio();
    server
        .serve(transport)
        .await
        .context("failed to start server")?
        .waiting()
        .await
        .context("server error")?;
    Ok(())
}
