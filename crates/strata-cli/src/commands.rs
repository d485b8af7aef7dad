use std::cmp::Ordering;
use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use strata_diff::{apply_diff, compute_diff, merge_diff, ApplyOutcome, DiffOutcome, UnifiedDiff};
use strata_packages::{
    compare_versions, overlay_package_diff, ChangeKind, DifferClient, DpkgResolver, PackageDiff,
    RepositoryClient, StrataConfig,
};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &format),
        Command::Apply(args) => cmd_apply(args, &format),
        Command::Merge(args) => cmd_merge(args, &format),
        Command::Packages(args) => {
            let config = StrataConfig::load_or_default(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            cmd_packages(args, &config, &format)
        }
        Command::Vercmp(args) => cmd_vercmp(args, &format),
    }
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let outcome = compute_diff(&args.source, &args.dest)?;
    let stat = match &outcome {
        DiffOutcome::Identical => Default::default(),
        DiffOutcome::Differs(diff) => diff.stat()?,
    };

    match format {
        OutputFormat::Json => {
            let diff = match &outcome {
                DiffOutcome::Identical => "",
                DiffOutcome::Differs(diff) => diff.as_str(),
            };
            let value = json!({
                "identical": outcome.is_identical(),
                "hunks": stat.hunks,
                "additions": stat.additions,
                "deletions": stat.deletions,
                "diff": diff,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => match outcome {
            DiffOutcome::Identical => println!("No differences."),
            DiffOutcome::Differs(_) if args.stat => println!(
                "{} hunk(s), {} insertion(s), {} deletion(s)",
                stat.hunks,
                format!("+{}", stat.additions).green(),
                format!("-{}", stat.deletions).red()
            ),
            DiffOutcome::Differs(diff) => print_colored_diff(&diff),
        },
    }
    Ok(())
}

fn print_colored_diff(diff: &UnifiedDiff) {
    for line in diff.as_str().lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

fn cmd_apply(args: ApplyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let text = if args.patch == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading diff from stdin")?;
        buf
    } else {
        fs::read_to_string(&args.patch).with_context(|| format!("reading {}", args.patch))?
    };
    debug!(bytes = text.len(), "diff read");

    let outcome = apply_diff(&args.dest, &UnifiedDiff::from_text(text))?;
    print_apply_outcome(&outcome, &args.dest.display().to_string(), format)
}

fn cmd_merge(args: MergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let outcome = merge_diff(&args.source, &args.dest)?;
    print_apply_outcome(&outcome, &args.dest.display().to_string(), format)
}

fn print_apply_outcome(outcome: &ApplyOutcome, dest: &str, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let (label, hunks) = match outcome {
                ApplyOutcome::NoChanges => ("no_changes", 0),
                ApplyOutcome::AlreadyApplied => ("already_applied", 0),
                ApplyOutcome::Applied { hunks } => ("applied", *hunks),
            };
            let value = json!({ "path": dest, "outcome": label, "hunks": hunks });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => match outcome {
            ApplyOutcome::NoChanges => println!("No changes to apply to {}.", dest.bold()),
            ApplyOutcome::AlreadyApplied => {
                println!("{} {} already up to date.", "✓".green(), dest.bold())
            }
            ApplyOutcome::Applied { hunks } => {
                println!("{} Applied {} hunk(s) to {}", "✓".green().bold(), hunks, dest.bold())
            }
        },
    }
    Ok(())
}

fn cmd_packages(args: PackagesArgs, config: &StrataConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let diff = match args.action {
        PackagesAction::Overlay => {
            let source = config.package_list();
            let repository = RepositoryClient::new(config.repository())?;
            overlay_package_diff(&source, &DpkgResolver::new(), &repository)?
        }
        PackagesAction::Base { old, new } => {
            DifferClient::new(config.remote_service())?.image_diff(&old, &new)?
        }
    };
    print_package_diff(&diff, format)
}

fn print_package_diff(diff: &PackageDiff, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(diff)?);
        return Ok(());
    }

    if diff.is_empty() {
        println!("No package changes.");
        return Ok(());
    }
    for (kind, entry) in diff.iter() {
        let line = match kind {
            ChangeKind::Added => format!("+ {} {}", entry.name, entry.new_version).green(),
            ChangeKind::Removed => format!("- {} {}", entry.name, entry.old_version).red(),
            ChangeKind::Upgraded => {
                format!("↑ {} {} → {}", entry.name, entry.old_version, entry.new_version).cyan()
            }
            ChangeKind::Downgraded => {
                format!("↓ {} {} → {}", entry.name, entry.old_version, entry.new_version).yellow()
            }
        };
        println!("{line}");
    }
    println!(
        "\n{} added, {} upgraded, {} downgraded, {} removed",
        diff.added.len(),
        diff.upgraded.len(),
        diff.downgraded.len(),
        diff.removed.len()
    );
    Ok(())
}

fn cmd_vercmp(args: VercmpArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let symbol = ordering_symbol(compare_versions(&args.a, &args.b));
    match format {
        OutputFormat::Json => {
            let value = json!({ "a": args.a, "b": args.b, "ordering": symbol });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => println!("{} {} {}", args.a, symbol.bold(), args.b),
    }
    Ok(())
}

fn ordering_symbol(ordering: Ordering) -> &'static str {
    match ordering {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    }
}
