use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use pbxpatch::config::loader::{discover_config, save_config_to_file};
use pbxpatch::config::validator::validate_config;
use pbxpatch::{ConfigOverrides, EditOutcome, LogCollector, ManifestPatcher, PatchConfig};

#[derive(Parser)]
#[command(name = "pbxpatch", version)]
#[command(about = "Anchor-based edits to an Xcode project.pbxproj")]
struct Cli {
    /// Manifest to patch (overrides the config file)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Config file (default: ./pbxpatch.toml, then ~/.config/pbxpatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compute the edit but do not write the manifest
    #[arg(long, global = true)]
    dry_run: bool,

    /// Refuse to write a result that no longer parses
    #[arg(long, global = true)]
    verify: bool,

    /// Skip edits whose result is already present
    #[arg(long, global = true)]
    guard_existing: bool,

    /// Do not copy the manifest before writing
    #[arg(long, global = true)]
    no_backup: bool,

    /// Print reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new source file next to an existing one
    AddFile {
        /// Display name of the new file
        name: Option<String>,

        /// Already-registered file to place the new entries after
        #[arg(long)]
        sibling: Option<String>,
    },
    /// Add an Info.plist usage description build setting
    AddPlistKey {
        #[arg(long)]
        key: Option<String>,

        #[arg(long)]
        value: Option<String>,
    },
    /// Blank signing identities and mark signing as not required
    DisableSigning,
    /// Parse the manifest and print a summary
    Validate,
    /// Write the effective configuration to a TOML file
    InitConfig {
        #[arg(default_value = "pbxpatch.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logger first (stderr only) so config discovery is visible with -v
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let collector = LogCollector::new(level, None)
        .map_err(anyhow::Error::msg)
        .context("Failed to initialize logging")?;
    if let Err(e) = collector.install() {
        eprintln!("[Main] WARNING: {}", e);
    }

    let result = load_config(&cli, &collector).and_then(|config| run(&cli, config));

    if let Err(e) = collector.flush_and_wait() {
        eprintln!("[Main] WARNING: Failed to flush log file: {}", e);
    }
    result
}

/// Discover the config, layer the flags over it and attach the log file.
fn load_config(cli: &Cli, collector: &LogCollector) -> anyhow::Result<PatchConfig> {
    let mut config = discover_config(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_overrides(&overrides_from(cli));

    if let Some(path) = config.log_file.as_deref().filter(|p| !p.as_os_str().is_empty()) {
        collector
            .attach_file(path)
            .map_err(anyhow::Error::msg)
            .context("Failed to open log file")?;
        log::debug!("[Main] Logging to {}", path.display());
    }
    Ok(config)
}

fn overrides_from(cli: &Cli) -> ConfigOverrides {
    let mut overrides = ConfigOverrides {
        manifest: cli.manifest.clone(),
        verify: cli.verify,
        guard_existing: cli.guard_existing,
        no_backup: cli.no_backup,
        ..Default::default()
    };
    match &cli.command {
        Commands::AddFile { name, sibling } => {
            overrides.source_name = name.clone();
            overrides.sibling = sibling.clone();
        }
        Commands::AddPlistKey { key, value } => {
            overrides.plist_key = key.clone();
            overrides.plist_value = value.clone();
        }
        _ => {}
    }
    overrides
}

fn build_patcher(config: &PatchConfig, dry_run: bool) -> ManifestPatcher {
    let patcher = ManifestPatcher::new(config.manifest.clone())
        .with_options(config.patch_options())
        .with_verify(config.verify)
        .with_dry_run(dry_run);
    if config.backup {
        patcher.with_backup_dir(config.backup_dir.clone())
    } else {
        patcher
    }
}

fn run(cli: &Cli, config: PatchConfig) -> anyhow::Result<()> {
    validate_config(&config).context("Invalid configuration")?;
    log::debug!("[Main] Manifest: {}", config.manifest.display());

    let patcher = build_patcher(&config, cli.dry_run);
    let manifest = config.manifest.display().to_string();

    match &cli.command {
        Commands::AddFile { .. } => {
            let source = &config.source_file;
            let report = patcher
                .add_source_file(&source.name, &source.sibling())
                .with_context(|| format!("Failed to register {} in {}", source.name, manifest))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.file_ref_id.is_empty() {
                println!("Sibling {} not found, {} was not added", source.sibling, source.name);
            } else if report.edits.iter().all(|e| e.outcome == EditOutcome::AlreadyPresent) {
                println!("{} is already registered", source.name);
            } else {
                println!(
                    "Added {} with IDs {} and {}",
                    report.display_name, report.file_ref_id, report.build_file_id
                );
                for skipped in report.skipped() {
                    println!("  skipped {}: anchor not found", skipped.kind);
                }
            }
        }
        Commands::AddPlistKey { .. } => {
            let desc = &config.usage_description;
            let outcome = patcher
                .add_usage_description(desc)
                .with_context(|| format!("Failed to add {} to {}", desc.key, manifest))?;

            if cli.json {
                let out = serde_json::json!({ "key": desc.key, "outcome": outcome });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                match outcome {
                    EditOutcome::Applied { .. } => println!("Added {} to Info.plist settings", desc.key),
                    EditOutcome::AppliedViaFallback { .. } => {
                        println!("Pattern not found, trying alternative approach");
                        println!("Added via alternative method");
                    }
                    EditOutcome::NotFound => {
                        println!("Pattern not found, trying alternative approach");
                        println!("No build settings block contains {}", desc.fallback_anchor);
                    }
                    EditOutcome::AlreadyPresent => println!("{} is already set", desc.key),
                }
            }
        }
        Commands::DisableSigning => {
            if !cli.json {
                println!("Disabling code signing in Xcode project...");
            }
            let report = patcher
                .disable_signing()
                .with_context(|| format!("Failed to disable signing in {}", manifest))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("✅ Code signing disabled!");
                println!("ℹ️  You can now build in Xcode without an Apple ID");
            }
        }
        Commands::Validate => {
            let summary = patcher
                .validate()
                .with_context(|| format!("Failed to validate {}", manifest))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} parses: {} objects, {} build settings blocks",
                    manifest, summary.objects, summary.build_settings_blocks
                );
                for (isa, count) in &summary.isa_counts {
                    println!("  {:<32} {}", isa, count);
                }
            }
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            save_config_to_file(&config, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            return Ok(());
        }
    }

    if cli.dry_run && !cli.json {
        println!("(dry run: {} not modified)", manifest);
    }
    Ok(())
}
