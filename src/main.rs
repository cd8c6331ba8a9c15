use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use literal_patcher::config::{
    apply_patches, builtin, check_patches, load_from_path, preset_config, PatchConfig,
    PatchOptions, PatchResult, DEFAULT_PRESET,
};
use literal_patcher::diff::render_diff;
use literal_patcher::edit::WriteMode;
use literal_patcher::logging;
use std::env;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "literal-patcher")]
#[command(about = "One-shot literal text patching for application sources", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Running without a subcommand is `apply`
    #[command(flatten)]
    apply: ApplyArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patches (the default command)
    Apply(ApplyArgs),

    /// Report which patches are pending, applied or unmatched
    Status(SourceArgs),

    /// Verify every patch is already applied
    Verify(SourceArgs),

    /// List built-in presets
    List,
}

#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// Workspace root that patch paths resolve against (defaults to cwd)
    #[arg(short, long, env = "PATCHER_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Built-in preset to use (defaults to loading-after-profile)
    #[arg(long, conflicts_with = "patches")]
    preset: Option<String>,

    /// TOML patch file to use instead of a preset
    #[arg(short, long)]
    patches: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
struct ApplyArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Override the target file of every selected patch
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Fail when the search text is not found instead of confirming anyway
    #[arg(long)]
    strict: bool,

    /// Write through a tempfile and rename instead of truncating in place
    #[arg(long)]
    atomic: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Apply(args)) => cmd_apply(args),
        Some(Commands::Status(source)) => cmd_status(source),
        Some(Commands::Verify(source)) => cmd_verify(source),
        Some(Commands::List) => cmd_list(),
        None => cmd_apply(cli.apply),
    }
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?),
    }
}

/// Helper: Load the selected patch file or preset
fn load_config(source: &SourceArgs) -> Result<PatchConfig> {
    let config = match (&source.patches, &source.preset) {
        (Some(path), _) => load_from_path(path)?,
        (None, Some(id)) => preset_config(id)?,
        (None, None) => preset_config(DEFAULT_PRESET)?,
    };
    Ok(config)
}

fn cmd_apply(args: ApplyArgs) -> Result<()> {
    let workspace = resolve_workspace(args.source.workspace.clone())?;
    let mut config = load_config(&args.source)?;

    if let Some(file) = &args.file {
        let file = file.to_string_lossy().into_owned();
        for patch in &mut config.patches {
            patch.file = file.clone();
        }
    }

    let options = PatchOptions {
        dry_run: args.dry_run,
        strict: args.strict,
        write_mode: if args.atomic {
            WriteMode::Atomic
        } else {
            WriteMode::Truncate
        },
    };

    if args.dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }

    let results = apply_patches(&config, &workspace, options, &mut io::stdout());
    let total = results.len();
    let mut failed = 0;

    for (patch_id, outcome) in results {
        match outcome {
            Ok(report) => {
                if args.dry_run {
                    let marker = match report.result {
                        PatchResult::Applied { .. } => "✓".green(),
                        PatchResult::AlreadyApplied { .. } => "⊙".yellow(),
                        PatchResult::NoMatch { .. } => "⊘".cyan(),
                    };
                    println!("{} {}: {}", marker, patch_id, report.result);
                }
                if args.diff {
                    print!(
                        "{}",
                        render_diff(report.result.file(), &report.before, &report.after)
                    );
                }
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), patch_id, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} patches failed", failed, total);
    }

    Ok(())
}

fn cmd_status(source: SourceArgs) -> Result<()> {
    let workspace = resolve_workspace(source.workspace.clone())?;
    let config = load_config(&source)?;

    println!("{}", "Patch Status Report".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    let mut applied = Vec::new();
    let mut pending = Vec::new();
    let mut unmatched = Vec::new();

    // Read-only; check_patches never writes
    for (patch_id, outcome) in check_patches(&config, &workspace) {
        match outcome {
            Ok(report) => match report.result {
                PatchResult::Applied { occurrences, .. } => {
                    pending.push((patch_id, format!("{occurrences} occurrence(s) to replace")));
                }
                PatchResult::AlreadyApplied { .. } => applied.push(patch_id),
                PatchResult::NoMatch { .. } => {
                    unmatched.push((patch_id, "search text not found".to_string()));
                }
            },
            Err(e) => unmatched.push((patch_id, e.to_string())),
        }
    }

    if !applied.is_empty() {
        println!(
            "{} {} ({} patches)",
            "✓".green(),
            "APPLIED".green().bold(),
            applied.len()
        );
        for id in &applied {
            println!("  - {}", id);
        }
        println!();
    }

    if !pending.is_empty() {
        println!(
            "{} {} ({} patches)",
            "⊙".yellow(),
            "PENDING".yellow().bold(),
            pending.len()
        );
        for (id, detail) in &pending {
            println!("  - {} ({})", id, detail.dimmed());
        }
        println!();
    }

    if !unmatched.is_empty() {
        println!(
            "{} {} ({} patches)",
            "⊘".cyan(),
            "NO MATCH".cyan().bold(),
            unmatched.len()
        );
        for (id, reason) in &unmatched {
            println!("  - {} ({})", id, reason.dimmed());
        }
        println!();
    }

    Ok(())
}

fn cmd_verify(source: SourceArgs) -> Result<()> {
    let workspace = resolve_workspace(source.workspace.clone())?;
    let config = load_config(&source)?;

    println!("{}", "Verifying patches...".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    let mut verified = 0;
    let mut mismatch = 0;

    for (patch_id, outcome) in check_patches(&config, &workspace) {
        match outcome {
            Ok(report) => match report.result {
                PatchResult::AlreadyApplied { .. } => {
                    println!("{} {}: Verified (already applied)", "✓".green(), patch_id);
                    verified += 1;
                }
                PatchResult::Applied { file, .. } => {
                    eprintln!("{} {}: MISMATCH", "✗".red(), patch_id);
                    eprintln!("  Expected: patch already applied");
                    eprintln!("  Found: patch not yet applied");
                    eprintln!("  Location: {}", file.display());
                    mismatch += 1;
                }
                PatchResult::NoMatch { file } => {
                    eprintln!("{} {}: MISMATCH", "✗".red(), patch_id);
                    eprintln!("  Found: neither search nor replacement text");
                    eprintln!("  Location: {}", file.display());
                    mismatch += 1;
                }
            },
            Err(e) => {
                eprintln!("{} {}: MISMATCH", "✗".red(), patch_id);
                eprintln!("  Error: {}", e);
                mismatch += 1;
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} verified", format!("{}", verified).green());
    println!("  {} mismatch", format!("{}", mismatch).red());

    if mismatch > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    for preset in builtin() {
        let marker = if preset.id == DEFAULT_PRESET {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{}{}", preset.id.bold(), marker);
        println!("  file: {}", preset.file);
        if let Some(description) = &preset.description {
            println!("  {}", description);
        }
    }
    Ok(())
}
