//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logship -- turn Avro session events into Logstash-style search documents.
///
/// Use `logship <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logship", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logship.toml configuration file.
    #[arg(short, long, global = true, default_value = "logship.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per line, summaries as text.
    Text,
    /// A single machine-readable JSON report.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project the records of Avro container files into documents.
    Project(ProjectArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- project ----

/// Feed every record of each container through the filter and projector.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Avro object container files to read.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Number of events handed to the pipeline at once.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,
}

// ---- config ----

/// Manage logship configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, serializer).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parse_project_files() {
        let cli = Cli::try_parse_from(["logship", "project", "a.avro", "b.avro"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Project(args) => {
                assert_eq!(args.files, vec![PathBuf::from("a.avro"), PathBuf::from("b.avro")]);
                assert_eq!(args.batch_size, 100);
            }
            _ => panic!("expected Project command"),
        }
    }

    #[test]
    fn parse_project_batch_size() {
        let cli = Cli::try_parse_from(["logship", "project", "--batch-size", "7", "a.avro"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Project(args) => assert_eq!(args.batch_size, 7),
            _ => panic!("expected Project command"),
        }
    }

    #[test]
    fn project_requires_files() {
        assert!(Cli::try_parse_from(["logship", "project"]).is_err());
    }

    #[test]
    fn project_rejects_zero_batch() {
        assert!(Cli::try_parse_from(["logship", "project", "--batch-size", "0", "a.avro"]).is_err());
    }

    #[test]
    fn parse_config_validate() {
        let cli = Cli::try_parse_from(["logship", "config", "validate"]).expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, ConfigAction::Validate)),
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn parse_config_show_section() {
        let cli = Cli::try_parse_from(["logship", "config", "show", "--section", "serializer"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section.as_deref(), Some("serializer"));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::try_parse_from([
            "logship",
            "-c",
            "/etc/logship/logship.toml",
            "--log-level",
            "debug",
            "--output",
            "json",
            "config",
            "validate",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("/etc/logship/logship.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["logship", "config", "validate"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("logship.toml"));
        assert!(cli.log_level.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn missing_command_fails() {
        assert!(Cli::try_parse_from(["logship"]).is_err());
    }

    #[test]
    fn command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "logship");
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"project"));
        assert!(subcommands.contains(&"config"));
        Cli::command().debug_assert();
    }
}
