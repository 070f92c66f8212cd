// src/bin/ipw.rs
//! ipw - inspect, rewrite and reaggregate IPW grids

use anyhow::{bail, Context};
use chrono::{Duration, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use ipw_rs::batch::read_all;
use ipw_rs::{ByteOrderPolicy, FileType, Grid, IpwConfig, Reaggregator, TimeStep};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ipw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "IPW_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CodecArgs {
    /// File type, selecting the variable names of the bands
    #[arg(short = 't', long, env = "IPW_FILE_TYPE")]
    file_type: FileType,

    /// Decode pixels in the order named by the byteorder tag instead of little-endian
    #[arg(long, env = "IPW_HONOR_BYTEORDER")]
    honor_byteorder: bool,
}

impl CodecArgs {
    fn config(&self) -> IpwConfig {
        let policy = if self.honor_byteorder {
            ByteOrderPolicy::HonorTag
        } else {
            ByteOrderPolicy::Fixed
        };
        IpwConfig::default().with_byte_order(policy)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print dimensions, bands and georeferencing of a grid
    Info {
        file: PathBuf,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// Re-derive band ranges from the data and write the grid back out
    Recalc {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// Sum consecutive time steps into coarser ones
    Resample {
        /// Input files named `<prefix>.<time step index>`, in time order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        codec: CodecArgs,
        /// Start of time step zero, e.g. 2017-10-01T00:00:00
        #[arg(long, env = "IPW_ORIGIN")]
        origin: NaiveDateTime,
        /// Length of one input time step in hours
        #[arg(long, default_value = "1")]
        step_hours: i64,
        /// Length of one output time step in hours
        #[arg(long)]
        target_hours: i64,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Worker threads used to read the inputs
        #[arg(short, long, env = "IPW_WORKERS", default_value = "4")]
        workers: usize,
    },
}

fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Info { file, codec } => info_command(&file, &codec),
        Command::Recalc {
            input,
            output,
            codec,
        } => {
            let mut grid = Grid::open(&input, codec.file_type, &codec.config())
                .with_context(|| format!("reading {}", input.display()))?;
            grid.recalculate_header()?;
            grid.write_to(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("Wrote {}", output.display());
            Ok(())
        }
        Command::Resample {
            files,
            codec,
            origin,
            step_hours,
            target_hours,
            out_dir,
            workers,
        } => {
            let step = TimeStep::new(origin, Duration::hours(step_hours))?;
            let config = codec.config().with_time_step(step);
            let reaggregator = Reaggregator::hours(target_hours)?;

            let mut grids = Vec::with_capacity(files.len());
            for (path, result) in files.iter().zip(read_all(&files, codec.file_type, &config, workers)) {
                match result {
                    Ok(grid) => grids.push(grid),
                    Err(e) => {
                        error!("Failed to read {}: {}", path.display(), e);
                        bail!("could not read {}", path.display());
                    }
                }
            }

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;

            for grid in reaggregator.aggregate(&grids)? {
                let Some(start) = grid.start_datetime() else {
                    bail!("reaggregated grid has no interval");
                };
                let index = (start - origin).num_seconds() / reaggregator.width().num_seconds();
                let path = out_dir.join(format!("{}.{:04}", codec.file_type, index));
                grid.write_to(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Wrote {} ({} to {:?})", path.display(), start, grid.end_datetime());
            }
            Ok(())
        }
    }
}

fn info_command(file: &Path, codec: &CodecArgs) -> anyhow::Result<()> {
    let grid = Grid::open(file, codec.file_type, &codec.config())
        .with_context(|| format!("reading {}", file.display()))?;
    let global = grid.global();

    println!("{} ({})", file.display(), grid.file_type());
    println!(
        "  {} lines x {} samples, {} bands, byteorder {}",
        global.nlines, global.nsamps, global.nbands, global.byteorder
    );
    for band in grid.bands() {
        println!(
            "  band {:>2} {:<12} {} bytes  [{}, {}]",
            band.index(),
            band.name,
            band.bytes(),
            band.float_min,
            band.float_max
        );
    }
    if let (Some(transform), Some(geo)) = (
        grid.geo_transform(),
        grid.bands().first().and_then(|band| band.geo.as_ref()),
    ) {
        println!(
            "  origin ({}, {}) spacing ({}, {}) {} {}",
            transform.origin_x,
            transform.origin_y,
            transform.pixel_x,
            transform.pixel_y,
            geo.units,
            geo.coord_sys_id
        );
    }
    Ok(())
}
