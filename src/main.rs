//! Packages compiled keyboard schemes into the app assets directory
//!
//! Run after the scheme build (`build_all_packs.sh` inside `schemes/`).
//!
//! Usage:
//!   varnam-assets collect                     # ml, kn, hi into ./assets
//!   varnam-assets collect --scheme ml         # one scheme only
//!   varnam-assets plan --scheme kn            # dry run
//!   varnam-assets inventory --scheme ml       # what the app would import

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use varnam_assets::config::DEFAULT_CONFIG_FILE;
use varnam_assets::inventory::inventory;
use varnam_assets::{AssetCollector, CollectorConfig, IndexMode};

#[derive(Parser)]
#[command(name = "varnam-assets")]
#[command(about = "Copy compiled Varnam schemes into the assets directory")]
#[command(version)]
struct Cli {
    /// Verbose logging (per-file copies)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy .vst/.vlf files and write the packs index
    Collect {
        #[command(flatten)]
        common: CommonArgs,
        /// Override how the packs index is written
        #[arg(long, value_enum)]
        index_mode: Option<IndexModeArg>,
        /// Write the effective configuration to the project root and exit
        #[arg(long)]
        write_config: bool,
    },
    /// Show what `collect` would do without touching the assets directory
    Plan {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List the pack files a scheme has in the assets directory
    Inventory {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Project root holding `schemes/` and `assets/`
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,
    /// RON config file (default: <root>/varnam-assets.ron if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Scheme identifier; repeat for several. Defaults to the configured list
    #[arg(long = "scheme", value_name = "ID")]
    schemes: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum IndexModeArg {
    Overwrite,
    Combined,
    PerScheme,
}

impl From<IndexModeArg> for IndexMode {
    fn from(arg: IndexModeArg) -> Self {
        match arg {
            IndexModeArg::Overwrite => IndexMode::Overwrite,
            IndexModeArg::Combined => IndexMode::Combined,
            IndexModeArg::PerScheme => IndexMode::PerScheme,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Collect {
            common,
            index_mode,
            write_config,
        } => collect(&common, index_mode, write_config),
        Commands::Plan { common } => plan(&common),
        Commands::Inventory { common } => show_inventory(&common),
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("varnam_assets=debug,info")
        } else {
            EnvFilter::new("varnam_assets=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file (if any) and apply CLI overrides. Paths stay as written.
fn load_config(common: &CommonArgs) -> Result<CollectorConfig> {
    let config_path = common.config.clone().or_else(|| {
        let default = common.root.join(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    });

    let mut config = match &config_path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            CollectorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => CollectorConfig::default(),
    };

    if !common.schemes.is_empty() {
        config.schemes = common.schemes.clone();
    }
    config.validate().context("Invalid scheme list")?;

    Ok(config)
}

fn collect(common: &CommonArgs, index_mode: Option<IndexModeArg>, write_config: bool) -> Result<()> {
    let mut config = load_config(common)?;
    if let Some(mode) = index_mode {
        config.index_mode = mode.into();
    }

    if write_config {
        let path = common.root.join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, config.to_ron_string()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let collector = AssetCollector::new(config.resolve_paths(&common.root));
    let report = collector.run().context("Asset collection failed")?;

    for scheme in &report.schemes {
        println!(
            "{}: {} vst, {} vlf, {} packs",
            scheme.scheme, scheme.vst_copied, scheme.vlf_copied, scheme.packs_collected
        );
    }
    if let Some(last) = report.index_writes.last() {
        println!(
            "Index ({}): {}",
            collector.config().index_mode.label(),
            last.display()
        );
    }
    Ok(())
}

fn plan(common: &CommonArgs) -> Result<()> {
    let config = load_config(common)?.resolve_paths(&common.root);
    let collector = AssetCollector::new(config);

    for scheme in &collector.config().schemes {
        let actions = collector
            .plan(scheme)
            .with_context(|| format!("Failed to plan scheme {}", scheme))?;

        println!("[{}]", scheme);
        for planned in &actions {
            match &planned.destination {
                Some(dest) => println!(
                    "  {:<9} {} -> {}",
                    planned.action.label(),
                    planned.source.display(),
                    dest.display()
                ),
                None => println!("  {:<9} {}", planned.action.label(), planned.source.display()),
            }
        }
        println!("  index -> {}", collector.config().index_path(scheme).display());
    }
    Ok(())
}

fn show_inventory(common: &CommonArgs) -> Result<()> {
    let config = load_config(common)?.resolve_paths(&common.root);

    for scheme in &config.schemes {
        let inv = inventory(&config, scheme)
            .with_context(|| format!("Failed to inventory scheme {}", scheme))?;

        println!("[{}] vst: {}", inv.scheme, if inv.has_vst { "yes" } else { "missing" });
        for file in &inv.vlf_files {
            println!("  {}", file.display());
        }
        match inv.index_entries {
            Some(n) => println!("  {} entries in {}", n, config.index_path(scheme).display()),
            None => println!("  no index at {}", config.index_path(scheme).display()),
        }
    }
    Ok(())
}
