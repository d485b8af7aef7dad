use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/strata/config.toml";

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: configuration merges and package diffs across system updates",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file; a missing file means built-in defaults
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the unified diff turning <source> into <dest>
    Diff(DiffArgs),
    /// Apply a unified diff to a file in place
    Apply(ApplyArgs),
    /// Carry the changes from <source> to <dest> over into <dest>
    Merge(MergeArgs),
    /// Package diffs
    Packages(PackagesArgs),
    /// Compare two Debian package versions
    Vercmp(VercmpArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Only print line counts
    #[arg(long)]
    pub stat: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub dest: PathBuf,
    /// Diff file, or `-` for stdin
    pub patch: String,
}

#[derive(Args)]
pub struct MergeArgs {
    pub source: PathBuf,
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct PackagesArgs {
    #[command(subcommand)]
    pub action: PackagesAction,
}

#[derive(Subcommand)]
pub enum PackagesAction {
    /// Overlay packages against the latest repository versions
    Overlay,
    /// Base image packages between two image digests
    Base {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Args)]
pub struct VercmpArgs {
    pub a: String,
    pub b: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["strata", "diff", "/a/fstab", "/b/fstab"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.source, PathBuf::from("/a/fstab"));
            assert_eq!(args.dest, PathBuf::from("/b/fstab"));
            assert!(!args.stat);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_stat() {
        let cli = Cli::try_parse_from(["strata", "diff", "--stat", "a", "b"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert!(args.stat);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_apply_stdin() {
        let cli = Cli::try_parse_from(["strata", "apply", "/etc/hosts", "-"]).unwrap();
        if let Command::Apply(args) = cli.command {
            assert_eq!(args.patch, "-");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_merge() {
        let cli = Cli::try_parse_from(["strata", "merge", "old", "new"]).unwrap();
        assert!(matches!(cli.command, Command::Merge(_)));
    }

    #[test]
    fn parse_packages_overlay() {
        let cli = Cli::try_parse_from(["strata", "packages", "overlay"]).unwrap();
        if let Command::Packages(args) = cli.command {
            assert!(matches!(args.action, PackagesAction::Overlay));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_packages_base() {
        let cli = Cli::try_parse_from(["strata", "packages", "base", "--old", "sha256:a", "--new", "sha256:b"])
            .unwrap();
        if let Command::Packages(args) = cli.command {
            match args.action {
                PackagesAction::Base { old, new } => {
                    assert_eq!(old, "sha256:a");
                    assert_eq!(new, "sha256:b");
                }
                _ => panic!("wrong action"),
            }
        } else { panic!("wrong command"); }
    }

    #[test]
    fn packages_base_requires_digests() {
        assert!(Cli::try_parse_from(["strata", "packages", "base", "--old", "x"]).is_err());
    }

    #[test]
    fn parse_vercmp() {
        let cli = Cli::try_parse_from(["strata", "vercmp", "1.0~rc1", "1.0"]).unwrap();
        if let Command::Vercmp(args) = cli.command {
            assert_eq!(args.a, "1.0~rc1");
            assert_eq!(args.b, "1.0");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from(["strata", "--verbose", "vercmp", "1", "2"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));

        let cli = Cli::try_parse_from(["strata", "packages", "overlay", "--format", "json", "--config", "/tmp/s.toml"])
            .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.config, PathBuf::from("/tmp/s.toml"));
    }
}
