use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use netmig::interaction::signed;
use netmig::join::{key_collisions, summarize};
use netmig::{Client, JoinedRegion, SourceConfig, api, storage, viz};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "netmig",
    version,
    about = "Join municipality geometry with migration statistics and render a net-migration map"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load both sources (and optionally save, plot, and print a summary).
    Render(RenderArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
    Geojson,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// TOML file with source URLs, region dimension, and timeouts.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Query document POSTed to the statistics endpoint.
    #[arg(short, long)]
    query: Option<PathBuf>,
    /// Read the geometry collection from a file instead of the network.
    #[arg(long, requires = "statistics_file")]
    geometry_file: Option<PathBuf>,
    /// Read a saved statistics response from a file instead of the network.
    #[arg(long, requires = "geometry_file")]
    statistics_file: Option<PathBuf>,
    /// Override the geometry URL.
    #[arg(long)]
    geometry_url: Option<String>,
    /// Override the statistics URL.
    #[arg(long)]
    statistics_url: Option<String>,
    /// Dimension id holding the regions (default: auto-detect).
    #[arg(long)]
    region_dimension: Option<String>,
    /// Save joined regions to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv, json, geojson). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Render the map to the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the map image (default 800).
    #[arg(long, default_value_t = 800)]
    width: u32,
    /// Height of the map image (default 1200).
    #[arg(long, default_value_t = 1200)]
    height: u32,
    /// Print a join summary to stdout.
    #[arg(long, default_value_t = false)]
    summary: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn source_config(args: &RenderArgs) -> Result<SourceConfig> {
    let mut cfg = match &args.config {
        Some(path) => SourceConfig::load_from_file(path)?,
        None => SourceConfig::default(),
    };
    if let Some(url) = &args.geometry_url {
        cfg.geometry_url = url.clone();
    }
    if let Some(url) = &args.statistics_url {
        cfg.statistics_url = url.clone();
    }
    if let Some(dim) = &args.region_dimension {
        cfg.region_dimension = Some(dim.clone());
    }
    Ok(cfg)
}

fn load_regions(args: &RenderArgs, cfg: SourceConfig) -> Result<Vec<JoinedRegion>> {
    match (&args.geometry_file, &args.statistics_file) {
        (Some(geometry), Some(statistics)) => {
            info!("reading sources from {} and {}", geometry.display(), statistics.display());
            api::load_session_from_files(geometry, statistics, &cfg)
        }
        _ => {
            let query_path = args
                .query
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--query is required when fetching over the network"))?;
            let query = api::read_json_file(query_path)?;
            info!("fetching {} and {}", cfg.geometry_url, cfg.statistics_url);
            Client::new(cfg)?.load_session(&query)
        }
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let cfg = source_config(&args)?;
    let regions = load_regions(&args, cfg)?;

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            Some(OutFormat::Geojson) => "geojson",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&regions, path)?,
            "json" => storage::save_json(&regions, path)?,
            "geojson" => storage::save_geojson(&regions, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} regions to {}", regions.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        viz::plot_choropleth(&regions, plot_path, args.width, args.height)?;
        eprintln!("Wrote map to {}", plot_path.display());
    }

    if args.summary {
        let s = summarize(&regions);
        let n = |v: u64| v.to_formatted_string(&Locale::en);
        println!(
            "regions={} matched={} unmatched={}  inflow={} outflow={} net={}",
            s.regions,
            s.matched,
            s.unmatched,
            n(s.total_positive),
            n(s.total_negative),
            signed(s.total_net)
        );
        for (key, count) in key_collisions(&regions) {
            println!("collision: {} features share {}", count, key);
        }
    }

    Ok(())
}
