use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use epndb::export::{self, Format, ProfileExport};
use epndb::plot::{self, PlotOptions};
use epndb::{Catalog, Config, Profile, ProfileClient, Pulsar, Stokes};

mod logging;

#[derive(Parser)]
#[command(name = "epndb", version, about = "Client for the EPN Database of Pulsar Profiles")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, default_value = "epndb.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the local catalog snapshot from the archive
    Update {
        /// Rescrape even when a snapshot already exists
        #[arg(long)]
        force: bool,
    },

    /// Show a pulsar and its profiles
    Info { name: String },

    /// Search the catalog; several queries can be separated with '/'
    Search { query: String },

    /// Fetch a profile and render an interactive plot
    Plot {
        name: String,

        /// Observing frequency in MHz; picks the closest profile
        #[arg(long)]
        freq: Option<f64>,

        /// Stokes parameters to draw, e.g. "I" or "IQUV"
        #[arg(long, default_value = "I")]
        stokes: String,

        /// Divide each trace by its maximum
        #[arg(long)]
        normalise: bool,

        /// Keep the median baseline instead of subtracting it
        #[arg(long)]
        no_baseline: bool,
    },

    /// Fetch a profile and export it to a file
    Export {
        name: String,

        /// Observing frequency in MHz; picks the closest profile
        #[arg(long)]
        freq: Option<f64>,

        /// Output path; the format is inferred from its extension unless
        /// --format is given
        #[arg(long)]
        out: PathBuf,

        /// Export format: ascii, json, csv, psrfits (or hdf5 when built in)
        #[arg(long)]
        format: Option<String>,

        /// Stokes parameters to export, e.g. "I" or "IQUV"
        #[arg(long, default_value = "I")]
        stokes: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging_guard = logging::init_logging("logs", "epndb", &cli.log_level);

    let config = Config::load_or_default(&cli.config)?;
    let catalog = Catalog::new(config.clone())?;

    match cli.command {
        Command::Update { force } => {
            let report = catalog.update(force).await?;
            println!(
                "Catalog holds {} pulsars with {} profiles ({}, {:.2}s).",
                report.pulsar_count,
                report.profile_count,
                if report.scraped { "scraped" } else { "from snapshot" },
                report.duration_seconds,
            );
        }

        Command::Info { name } => {
            catalog.update(false).await?;
            let pulsar = catalog.get(&name).await?;
            println!("{pulsar}");
            print!("{}", pulsar.info());
        }

        Command::Search { query } => {
            catalog.update(false).await?;
            let matches = catalog.search_multiple(&query).await;
            if matches.is_empty() {
                println!("No pulsars match '{query}'.");
            } else {
                for name in matches {
                    println!("{name}");
                }
            }
        }

        Command::Plot {
            name,
            freq,
            stokes,
            normalise,
            no_baseline,
        } => {
            catalog.update(false).await?;
            let pulsar = catalog.get(&name).await?;
            let profile = select_profile(&pulsar, freq)?;
            let parameters = Stokes::parse_many(&stokes)?;

            let client = ProfileClient::new()?;
            let data = client.fetch(&pulsar, profile, &stokes).await?;

            let options = PlotOptions {
                baseline: !no_baseline,
                normalise,
            };
            let path = plot::write_profile_plot(
                &config.plot_dir,
                &pulsar,
                profile,
                &data,
                &parameters,
                &options,
            )?;
            println!("Plot written to {}.", path.display());
        }

        Command::Export {
            name,
            freq,
            out,
            format,
            stokes,
        } => {
            catalog.update(false).await?;
            let pulsar = catalog.get(&name).await?;
            let profile = select_profile(&pulsar, freq)?;
            let parameters = Stokes::parse_many(&stokes)?;

            let format = match format {
                Some(ref requested) => Format::from_str(requested)?,
                None => Format::from_extension(&out)?,
            };

            let client = ProfileClient::new()?;
            let data = client.fetch(&pulsar, profile, &stokes).await?;

            let profile_export = ProfileExport::new(&pulsar, profile, &parameters, &data)?;
            export::export(&out, format, &profile_export)?;
            println!("Profile written to {}.", out.display());
        }
    }

    Ok(())
}

/// Pick the profile to work on: the closest to `--freq` when given, the
/// only one otherwise.
fn select_profile(pulsar: &Pulsar, freq: Option<f64>) -> Result<&Profile> {
    match freq {
        Some(f) => match pulsar.profile_at(f) {
            Some(profile) => Ok(profile),
            None => bail!("PSR {} has no profiles", pulsar.jname),
        },
        None if pulsar.profiles.len() == 1 => Ok(&pulsar.profiles[0]),
        None => bail!(
            "PSR {} has {} profiles; pick one with --freq:\n{}",
            pulsar.jname,
            pulsar.nprof(),
            pulsar.info(),
        ),
    }
}
