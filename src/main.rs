use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devcat::config::{ConfigFile, DEFAULT_CONFIG_FILE, Overrides};
use devcat::core::resolver::{DialoguerNames, ResolveOutcome};
use devcat::core::sampler::HaltReason;
use devcat::{
    CatalogStore, ExifService, SamplerConfig, SessionOutcome, SessionProgress, Signature,
    run_session,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "devcat",
    version,
    about = "Sample media files and catalog the devices that made them"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sample the source tree and name newly seen device signatures
    Sample {
        /// Configuration file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Directory to sample (overrides source_path)
        #[arg(short, long, value_name = "DIR")]
        source: Option<PathBuf>,
        /// Catalog file (overrides catalog_file)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
        /// Stop after this many files with unknown signatures
        #[arg(long, value_name = "N")]
        target_files: Option<usize>,
        /// Stop after this many new signatures
        #[arg(long, value_name = "N")]
        target_vendors: Option<usize>,
        /// Seed the shuffle for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Work with the device catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCmd,
    },

    /// Print the signature derived from a single file
    Inspect {
        /// File to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCmd {
    /// List named devices
    List {
        /// Configuration file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Catalog file (overrides catalog_file)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli.verbose, rust_log.as_deref()))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Sample {
            config,
            source,
            catalog,
            target_files,
            target_vendors,
            seed,
        } => {
            let overrides = Overrides {
                source_path: source,
                catalog_file: catalog,
                target_file_count: target_files,
                target_vendor_count: target_vendors,
            };
            let config = SamplerConfig::load(&config, overrides)?;
            run_sample(&config, seed)?;
        }

        Commands::Catalog { command } => match command {
            CatalogCmd::List { config, catalog } => {
                let path = match catalog {
                    Some(path) => path,
                    None => ConfigFile::load(&config)?
                        .and_then(|file| file.catalog_file)
                        .unwrap_or_else(SamplerConfig::default_catalog_file),
                };
                list_catalog(&CatalogStore::new(path));
            }
        },

        Commands::Inspect { file } => inspect(&file)?,
    }

    Ok(())
}

/// RUST_LOG directives win when they parse; otherwise `--verbose` picks the level.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    EnvFilter::new(if verbose { "debug" } else { "info" })
}

fn run_sample(config: &SamplerConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Scanning for media…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let bar = ProgressBar::new(config.target_file_count as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} unknown files, {msg}",
    )?);
    let progress = SessionProgress {
        scan: spinner,
        sample: bar,
    };

    println!("▶ Scanning {} for media files…", config.source_path.display());
    let outcome = run_session(
        config,
        ExifService::new(),
        &mut DialoguerNames::new(),
        &mut rng,
        progress,
    )
    .with_context(|| {
        format!(
            "Sampling {} into {} failed",
            config.source_path.display(),
            config.catalog_file.display()
        )
    })?;

    let (report, resolved) = match outcome {
        SessionOutcome::NoFiles => {
            println!("No media files found.");
            return Ok(());
        }
        SessionOutcome::Sampled { report, resolved } => (report, resolved),
    };

    let why = match report.halt {
        HaltReason::FileTarget => "file target reached",
        HaltReason::VendorTarget => "signature target reached",
        HaltReason::Exhausted => "no candidates left",
    };
    println!(
        "\n⏱ Examined {} file(s): {} unknown, {} already cataloged, {} unreadable ({})",
        report.files_examined,
        report.files_processed,
        report.known_skipped,
        report.unreadable_skipped,
        why
    );

    if report.is_empty() {
        println!("No new signatures found. All sampled files match the existing catalog.");
        return Ok(());
    }
    match resolved {
        ResolveOutcome::Saved { added } => {
            println!("✅ Added {} new device(s) to your catalog.", added)
        }
        ResolveOutcome::Unchanged => println!("No changes made to the catalog."),
    }

    Ok(())
}

fn list_catalog(store: &CatalogStore) {
    let catalog = store.load();
    if catalog.is_empty() {
        println!("No devices in {}.", store.path().display());
        return;
    }

    println!("🗂️  {} device(s) in {}:", catalog.len(), store.path().display());
    for (signature, name) in catalog.iter() {
        println!("  {name}\n     {signature}");
    }
}

fn inspect(file: &Path) -> Result<()> {
    let records = ExifService::new()
        .extract_exif(file)
        .with_context(|| format!("Could not read metadata from {}", file.display()))?;

    let Some(first) = records.first() else {
        println!("No metadata found in {}.", file.display());
        return Ok(());
    };

    println!("{}", Signature::from_metadata(first));
    for (key, value) in first {
        println!("    {key}: {value}");
    }
    Ok(())
}
