//! CLI configuration and runtime settings for template resolution.

use clap::Parser;
use std::path::PathBuf;

/// Default template marker
pub const DEFAULT_MARKER: &str = ".tmpl";

/// Resolve $VARIABLES in *.tmpl* files from tmpl_config and the environment
#[derive(Parser, Debug)]
#[command(name = "tmpl")]
#[command(version)]
#[command(about = "Resolve $VARIABLES in *.tmpl* files from tmpl_config and the environment")]
pub struct Cli {
    /// Directory to search for templates
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Substring marking a file as a template; removed from the output name
    #[arg(short, long, default_value = DEFAULT_MARKER)]
    pub marker: String,

    /// Settings file to use instead of searching for tmpl_config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub jobs: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Runtime configuration parsed from CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory searched for templates
    pub root: PathBuf,
    /// Template marker
    pub marker: String,
    /// Explicit settings file
    pub config_file: Option<PathBuf>,
    /// Number of parallel workers
    pub jobs: usize,
    /// Enable verbose output
    pub verbose: bool,
}

impl Config {
    /// Create Config from CLI arguments
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        if cli.marker.is_empty() {
            anyhow::bail!("Template marker must not be empty");
        }
        if cli.marker.contains(std::path::is_separator) {
            anyhow::bail!(
                "Template marker must not contain a path separator: {}",
                cli.marker
            );
        }

        Ok(Config {
            root: cli.root,
            marker: cli.marker,
            config_file: cli.config,
            jobs: cli.jobs.max(1),
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cli(marker: &str, jobs: usize, verbose: bool) -> Cli {
        Cli {
            root: PathBuf::from("/tmp"),
            marker: marker.to_string(),
            config: None,
            jobs,
            verbose,
        }
    }

    // ==================== Cli parsing tests ====================

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tmpl"]).unwrap();

        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.marker, ".tmpl");
        assert!(cli.config.is_none());
        assert!(cli.jobs >= 1);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::try_parse_from([
            "tmpl",
            "templates",
            "--marker",
            ".tpl",
            "--config",
            "settings.yaml",
            "-j",
            "3",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("templates"));
        assert_eq!(cli.marker, ".tpl");
        assert_eq!(cli.config, Some(PathBuf::from("settings.yaml")));
        assert_eq!(cli.jobs, 3);
        assert!(cli.verbose);
    }

    // ==================== Config::from_cli tests ====================

    #[test]
    fn test_config_from_cli_basic() {
        let config = Config::from_cli(make_cli(".tmpl", 4, false)).unwrap();

        assert_eq!(config.root, PathBuf::from("/tmp"));
        assert_eq!(config.marker, ".tmpl");
        assert_eq!(config.jobs, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_from_cli_jobs_minimum_one() {
        let config = Config::from_cli(make_cli(".tmpl", 0, false)).unwrap();
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_config_from_cli_empty_marker() {
        assert!(Config::from_cli(make_cli("", 4, false)).is_err());
    }

    #[test]
    fn test_config_from_cli_marker_with_separator() {
        assert!(Config::from_cli(make_cli("a/b", 4, false)).is_err());
    }

    #[test]
    fn test_config_debug() {
        let config = Config::from_cli(make_cli(".tmpl", 4, true)).unwrap();
        let debug = format!("{:?}", config);

        assert!(debug.contains("Config"));
        assert!(debug.contains(".tmpl"));
    }
}
