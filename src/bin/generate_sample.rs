use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use netcdf3::Version;

use xrviz::data::sample::{SimpleRng, demo_array};
use xrviz::data::writer::write_netcdf;

/// Write a demo netCDF file: a noisy damped oscillation with `time`,
/// `phase` and `sample` coordinates.
#[derive(Parser)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Output path
    #[arg(short, long, default_value = "sample.nc")]
    output: PathBuf,

    /// Number of samples
    #[arg(short, long, default_value_t = 1000)]
    samples: usize,

    /// Random seed for the noise
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write CDF-1 (32-bit offsets) instead of CDF-2
    #[arg(long)]
    classic: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = SimpleRng::new(args.seed);
    let array = demo_array(args.samples, &mut rng)?;
    let version = if args.classic {
        Version::Classic
    } else {
        Version::Offset64Bit
    };
    write_netcdf(&array, &args.output, version)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} samples with coordinates {:?} to {}",
        array.len(),
        array.coord_names().collect::<Vec<_>>(),
        args.output.display()
    );
    Ok(())
}
