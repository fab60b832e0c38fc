use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "worldfork",
    about = "WorldFork: branch, diff and merge structured world documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Show changes between two unit files
    Diff(DiffArgs),
    /// Three-way merge of unit files
    Merge(MergeArgs),
    /// Print the stored hash of an API key
    HashKey(HashKeyArgs),
    /// Generate a new API key for a tenant
    NewKey(NewKeyArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Overrides `data_file` from the configuration
    #[arg(long)]
    pub data_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Args)]
pub struct MergeArgs {
    pub base: PathBuf,
    pub ours: PathBuf,
    pub theirs: PathBuf,
    /// JSON array of resolutions to apply to the merge result
    #[arg(short, long)]
    pub resolutions: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashKeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct NewKeyArgs {
    #[arg(short, long, default_value = "local")]
    pub tenant: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from([
            "worldfork",
            "serve",
            "--config",
            "wf.toml",
            "--bind",
            "0.0.0.0:8080",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("wf.toml")));
            assert_eq!(args.bind, Some("0.0.0.0:8080".parse().unwrap()));
            assert!(args.data_file.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["worldfork", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["worldfork", "diff", "a.json", "b.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.from, PathBuf::from("a.json"));
            assert_eq!(args.to, PathBuf::from("b.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_merge() {
        let cli = Cli::try_parse_from([
            "worldfork", "merge", "base.json", "ours.json", "theirs.json", "-r", "res.json",
        ])
        .unwrap();
        if let Command::Merge(args) = cli.command {
            assert_eq!(args.theirs, PathBuf::from("theirs.json"));
            assert_eq!(args.resolutions, Some(PathBuf::from("res.json")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_keys() {
        let cli = Cli::try_parse_from(["worldfork", "hash-key", "wf_live_x"]).unwrap();
        assert!(matches!(cli.command, Command::HashKey(ref a) if a.key == "wf_live_x"));

        let cli = Cli::try_parse_from(["worldfork", "new-key"]).unwrap();
        assert!(matches!(cli.command, Command::NewKey(ref a) if a.tenant == "local"));
    }

    #[test]
    fn parse_verbose_and_format() {
        let cli =
            Cli::try_parse_from(["worldfork", "--verbose", "--format", "json", "hash-key", "k"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
