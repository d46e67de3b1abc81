//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quire static site generator CLI
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: quire.toml)
    #[arg(short = 'C', long, default_value = "quire.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Shared arguments for Build and Check commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(long)]
    pub clean: bool,

    /// Include content marked as draft
    #[arg(short = 'D', long)]
    pub drafts: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Theme to use (directory name under the themes dir)
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Override base URL for the site.
    ///
    /// Useful for CI/CD deployments where the production URL differs from local development.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Run every build phase without writing any output
    Check {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

impl Cli {
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Some(Commands::Build { build_args } | Commands::Check { build_args }) => Some(build_args),
            None => None,
        }
    }

    pub const fn is_check(&self) -> bool {
        matches!(self.command, Some(Commands::Check { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "quire",
            "--root",
            "site",
            "build",
            "--drafts",
            "--theme",
            "hyde",
            "--base-url",
            "https://example.org/",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert!(!cli.is_check());
        let args = cli.build_args().unwrap();
        assert!(args.drafts);
        assert_eq!(args.theme.as_deref(), Some("hyde"));
        assert_eq!(args.base_url.as_deref(), Some("https://example.org/"));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["quire", "check", "--minify"]).unwrap();
        assert!(cli.is_check());
        assert_eq!(cli.build_args().unwrap().minify, Some(true));
        assert_eq!(cli.config, PathBuf::from("quire.toml"));
    }
}
