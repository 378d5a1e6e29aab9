//! pdsfs: inspect and extend multiversioned PDS4 archives.
//!
//! ```bash
//! pdsfs --archive /data/archive init urn:nasa:pds:hst_00000::1.0
//! pdsfs --archive /data/archive stage urn:nasa:pds:hst_00000::1.0 \
//!     --put ./bundle.xml=hst_00000/bundle.xml
//! pdsfs --archive /data/archive ls urn:nasa:pds:hst_00000::2.0
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` to change the level.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("pdsfs=info".parse()?))
        .init();

    let cli = Cli::parse();
    commands::run(cli).await
}
