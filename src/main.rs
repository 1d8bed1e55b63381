use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use log::{LevelFilter, error, info};
use nexus_shell::args::Args;
use nexus_shell::server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    // The start directory becomes every session's first cursor
    if !args.start_dir.is_dir() {
        error!("Start directory {:?} is not an existing directory", args.start_dir);
        std::process::exit(1);
    }

    let start_dir = match args.start_dir.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!(
                "Failed to canonicalize start directory {:?}: {}",
                args.start_dir, e
            );
            std::process::exit(1);
        }
    };

    info!("File browser start directory: {:?}", start_dir);
    info!("Max page size: {} bytes", args.max_page_size);

    let server = Server {
        config: Arc::new(ServerConfig {
            start_dir,
            home_dir: dirs::home_dir(),
            shell: args.shell_program(),
            cols: args.cols,
            rows: args.rows,
            max_page_size: args.max_page_size,
            banner: !args.no_banner,
            started: Instant::now(),
        }),
    };

    info!(
        "Starting terminal server on {}:{} (shell: {})",
        args.host, args.port, server.config.shell
    );

    if let Err(e) = server.run_on_address((args.host.as_str(), args.port)).await {
        error!("Server stopped: {:#}", e);
        std::process::exit(1);
    }
}
