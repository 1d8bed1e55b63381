use std::path::PathBuf;

use clap::Parser;

/// Command-line configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Initial directory of every session's file browser
    #[arg(long, default_value = ".")]
    pub start_dir: PathBuf,

    /// Program run on each session's terminal
    #[arg(long, env = "SHELL")]
    pub shell: Option<String>,

    /// Initial terminal width in columns
    #[arg(long, default_value = "80")]
    pub cols: u16,

    /// Initial terminal height in rows
    #[arg(long, default_value = "24")]
    pub rows: u16,

    /// Largest page size a client may request (in bytes)
    #[arg(long, default_value = "1048576")]
    pub max_page_size: u64,

    /// Do not greet new sessions with a banner
    #[arg(long)]
    pub no_banner: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn shell_program(&self) -> String {
        match &self.shell {
            Some(shell) => shell.clone(),
            None if cfg!(windows) => "powershell.exe".to_string(),
            None => "bash".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_defaults() {
        let args = Args::parse_from([
            "nexus-shell",
            "--port",
            "8080",
            "--start-dir",
            "/srv",
            "--shell",
            "zsh",
            "--max-page-size",
            "4096",
            "--no-banner",
        ]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.start_dir, PathBuf::from("/srv"));
        assert_eq!(args.shell_program(), "zsh");
        assert_eq!(args.max_page_size, 4096);
        assert!(args.no_banner);
        assert_eq!((args.cols, args.rows), (80, 24));
    }
}
