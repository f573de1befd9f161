//! OHDAB - OhdAB taxonomy CLI
//!
//! Command-line interface for fetching the vocabulary and exporting the taxonomy

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ohdab_core::{
    BuildMode, CachedSource, CachingSource, EndpointSource, OutputFormat, QueryResults, RowSource,
    TaxonomyConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ohdab")]
#[command(version)]
#[command(about = "Build the OhdAB occupational taxonomy from FactGrid", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the taxonomy and write it as RDF
    Build {
        /// Configuration file (YAML); built-in defaults when omitted
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Node shape: term (omw:broader) or class (rdfs:subClassOf)
        #[arg(long, short, value_enum)]
        mode: Option<BuildMode>,
        /// Output file (e.g., OhdAB.ttl)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output syntax; guessed from the output extension when omitted
        #[arg(long, short, value_enum)]
        format: Option<OutputFormat>,
        /// Only use the cached results, never contact the endpoint
        #[arg(long, conflicts_with = "refresh")]
        offline: bool,
        /// Ignore the cache and fetch fresh results
        #[arg(long)]
        refresh: bool,
        /// Print the raw SPARQL results before building
        #[arg(long)]
        print_raw: bool,
        /// Give unlabelled ancestors an empty label (class mode)
        #[arg(long)]
        empty_ancestor_labels: bool,
    },
    /// Fetch results from the endpoint and refresh the cache
    Fetch {
        /// Configuration file (YAML)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Target file
        #[arg(default_value = "ohdab.yaml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Prints the raw results of the wrapped source after fetching
struct RawEcho<'a>(&'a dyn RowSource);

impl RowSource for RawEcho<'_> {
    fn fetch(&self) -> ohdab_core::Result<QueryResults> {
        let results = self.0.fetch()?;
        println!("=== Raw JSON ===");
        println!("{}", serde_json::to_string_pretty(&results)?);
        Ok(results)
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ohdab=debug,ohdab_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ohdab=info,ohdab_core=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TaxonomyConfig> {
    TaxonomyConfig::load_or_default(path).with_context(|| match path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Invalid built-in configuration".to_string(),
    })
}

fn select_source(config: &TaxonomyConfig, offline: bool, refresh: bool) -> Box<dyn RowSource> {
    if offline {
        return Box::new(CachedSource::new(config.source.cache_file.clone()));
    }

    let endpoint = EndpointSource::from_config(&config.source);
    Box::new(CachingSource::new(endpoint, config.source.cache_file.clone()).refresh(refresh))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            config,
            mode,
            output,
            format,
            offline,
            refresh,
            print_raw,
            empty_ancestor_labels,
        } => {
            let mut config = load_config(config.as_deref())?;

            if let Some(mode) = mode {
                config.output.mode = mode;
            }
            if let Some(output) = output {
                if format.is_none() {
                    if let Some(guessed) = OutputFormat::from_path(&output) {
                        config.output.format = guessed;
                    }
                }
                config.output.path = output;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if empty_ancestor_labels {
                config.output.empty_ancestor_labels = true;
            }

            let source = select_source(&config, offline, refresh);
            let report = if print_raw {
                ohdab_core::run(&config, &RawEcho(source.as_ref()))
            } else {
                ohdab_core::run(&config, source.as_ref())
            }
            .context("Taxonomy build failed")?;

            println!("\n{} RDF exported to {}", "✓".green(), report.output.display());
            println!("  Source:   {}", report.source);
            println!("  Mode:     {}", report.mode);
            println!("  Format:   {}", report.format);
            println!("  Records:  {}", report.stats.records);
            println!("  Nodes:    {}", report.stats.nodes);
            println!("  Edges:    {}", report.stats.edges);
            println!("  Triples:  {} ({} metadata)", report.triples, report.metadata_triples);
            if report.stats.label_overwrites > 0 {
                println!(
                    "  {} {} labels were overwritten by later rows",
                    "!".yellow(),
                    report.stats.label_overwrites
                );
            }
        }

        Commands::Fetch { config } => {
            let config = load_config(config.as_deref())?;
            let source = CachingSource::new(
                EndpointSource::from_config(&config.source),
                config.source.cache_file.clone(),
            )
            .refresh(true);

            let results = source.fetch().context("Fetch failed")?;

            println!("{} Fetched {} rows", "✓".green(), results.len());
            println!("  Saved to: {}", source.cache_path().display());
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }

            TaxonomyConfig::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!("{} Default configuration written to {}", "✓".green(), path.display());
        }
    }

    Ok(())
}
