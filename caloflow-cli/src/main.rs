//! caloflow: cluster calorimeter cell events from the command line.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use caloflow_algorithms::ClusterEngine;
use caloflow_core::{
    CellGridBuilder, CellStore, ClusteringParams, Connectivity, DepthCorrection, Layer,
    PositionMode, Thresholds,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] caloflow_core::Error),
}

/// One energy deposit on the event grid.
#[derive(Debug, Deserialize)]
struct CellRecord {
    row: i32,
    col: i32,
    energy: f64,
    #[serde(default)]
    energy_mate: f64,
}

/// A JSON event: grid geometry plus the deposits.
#[derive(Debug, Deserialize)]
struct EventFile {
    layer: Layer,
    #[serde(default = "default_pitch")]
    pitch: f64,
    #[serde(default = "default_radius")]
    radius: f64,
    #[serde(default)]
    z_offset: f64,
    cells: Vec<CellRecord>,
}

fn default_pitch() -> f64 {
    1.0
}

fn default_radius() -> f64 {
    200.0
}

/// Particle-flow clustering of calorimeter cells.
#[derive(Parser)]
#[command(name = "caloflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a JSON event file
    Cluster {
        /// Input event file
        input: PathBuf,

        /// Output file path (JSON clusters)
        #[arg(short, long)]
        output: PathBuf,

        /// Cell threshold in the barrel
        #[arg(long, default_value = "0.0")]
        thresh_barrel: f64,

        /// Cell pT threshold in the barrel (0 = disabled)
        #[arg(long, default_value = "0.0")]
        thresh_pt_barrel: f64,

        /// Seed threshold in the barrel
        #[arg(long, default_value = "0.2")]
        thresh_seed_barrel: f64,

        /// Seed pT threshold in the barrel (0 = disabled)
        #[arg(long, default_value = "0.0")]
        thresh_pt_seed_barrel: f64,

        /// Cleaning threshold in the barrel
        #[arg(long, default_value = "1e5")]
        thresh_clean_barrel: f64,

        /// Minimum sharing ratio for energetic barrel seeds
        #[arg(long, default_value = "0.0")]
        min_sharing_barrel: f64,

        /// Cell threshold in the endcaps
        #[arg(long, default_value = "0.0")]
        thresh_endcap: f64,

        /// Cell pT threshold in the endcaps (0 = disabled)
        #[arg(long, default_value = "0.0")]
        thresh_pt_endcap: f64,

        /// Seed threshold in the endcaps
        #[arg(long, default_value = "0.6")]
        thresh_seed_endcap: f64,

        /// Seed pT threshold in the endcaps (0 = disabled)
        #[arg(long, default_value = "0.0")]
        thresh_pt_seed_endcap: f64,

        /// Cleaning threshold in the endcaps
        #[arg(long, default_value = "1e5")]
        thresh_clean_endcap: f64,

        /// Minimum sharing ratio for energetic endcap seeds
        #[arg(long, default_value = "0.0")]
        min_sharing_endcap: f64,

        /// Neighbour connectivity for seeding (0, 4 or 8)
        #[arg(long, default_value = "4")]
        neighbours: i32,

        /// Cells entering the position sums (-1, 5 or 9)
        #[arg(long, default_value = "-1")]
        pos_calc_ncells: i32,

        /// Reference scale for position weights (negative = automatic)
        #[arg(long, default_value = "-1.0")]
        p1: f64,

        /// Transverse shower spread
        #[arg(long, default_value = "5.0")]
        shower_sigma: f64,

        /// Depth correction mode (0 = off, 1 = shower profile, 2 = fixed)
        #[arg(long, default_value = "0")]
        depth_cor_mode: i32,

        /// Depth correction scale constant
        #[arg(long, default_value = "0.89")]
        depth_cor_a: f64,

        /// Depth correction offset constant
        #[arg(long, default_value = "7.4")]
        depth_cor_b: f64,

        /// Depth correction scale under the preshower
        #[arg(long, default_value = "0.89")]
        depth_cor_a_preshower: f64,

        /// Depth correction offset under the preshower
        #[arg(long, default_value = "4.0")]
        depth_cor_b_preshower: f64,

        /// Grow regions through corner-sharing neighbours
        #[arg(long)]
        use_corner_cells: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,
    },
}

fn read_event(path: &Path) -> Result<(EventFile, CellStore)> {
    let text = std::fs::read_to_string(path)?;
    let event: EventFile = serde_json::from_str(&text)?;

    let mut builder = CellGridBuilder::new(event.layer)
        .with_pitch(event.pitch)
        .with_radius(event.radius)
        .with_z_offset(event.z_offset);
    for record in &event.cells {
        builder.add_with_mate(record.row, record.col, record.energy, record.energy_mate);
    }
    let store = builder.build();
    Ok((event, store))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            input,
            output,
            thresh_barrel,
            thresh_pt_barrel,
            thresh_seed_barrel,
            thresh_pt_seed_barrel,
            thresh_clean_barrel,
            min_sharing_barrel,
            thresh_endcap,
            thresh_pt_endcap,
            thresh_seed_endcap,
            thresh_pt_seed_endcap,
            thresh_clean_endcap,
            min_sharing_endcap,
            neighbours,
            pos_calc_ncells,
            p1,
            shower_sigma,
            depth_cor_mode,
            depth_cor_a,
            depth_cor_b,
            depth_cor_a_preshower,
            depth_cor_b_preshower,
            use_corner_cells,
            verbose,
        } => {
            let params = ClusteringParams::new()
                .with_barrel(Thresholds {
                    cell: thresh_barrel,
                    cell_pt: thresh_pt_barrel,
                    seed: thresh_seed_barrel,
                    seed_pt: thresh_pt_seed_barrel,
                    clean: thresh_clean_barrel,
                    min_sharing: min_sharing_barrel,
                })
                .with_endcap(Thresholds {
                    cell: thresh_endcap,
                    cell_pt: thresh_pt_endcap,
                    seed: thresh_seed_endcap,
                    seed_pt: thresh_pt_seed_endcap,
                    clean: thresh_clean_endcap,
                    min_sharing: min_sharing_endcap,
                })
                .with_connectivity(Connectivity::try_from(neighbours)?)
                .with_position_mode(PositionMode::try_from(pos_calc_ncells)?)
                .with_p1(p1)
                .with_shower_sigma(shower_sigma)
                .with_depth_correction(DepthCorrection::from_mode(
                    depth_cor_mode,
                    depth_cor_a,
                    depth_cor_b,
                    depth_cor_a_preshower,
                    depth_cor_b_preshower,
                )?)
                .with_corner_cells(use_corner_cells);

            if verbose {
                eprintln!("Reading: {}", input.display());
            }
            let (event, store) = read_event(&input)?;
            if verbose {
                eprintln!("Layer: {:?}", event.layer);
                eprintln!("Cells: {}", store.len());
            }

            let start = Instant::now();
            let mut engine = ClusterEngine::new(params);
            let clusters = engine.cluster(&store)?;
            let elapsed = start.elapsed();

            let text = serde_json::to_string_pretty(&clusters)?;
            std::fs::write(&output, text)?;

            if verbose {
                let total: f64 = clusters.iter().map(|c| c.energy).sum();
                eprintln!(
                    "Found {} clusters carrying {:.3} total energy in {:.2} ms",
                    clusters.len(),
                    total,
                    elapsed.as_secs_f64() * 1000.0,
                );
                eprintln!("Wrote: {}", output.display());
            }
        }

        Commands::Info { input } => {
            let (event, store) = read_event(&input)?;
            let total: f64 = store.iter().map(|(_, c)| c.energy).sum();
            let max = store
                .iter()
                .map(|(_, c)| c.energy)
                .fold(0.0f64, f64::max);
            println!("Layer:        {:?}", event.layer);
            println!("Cells:        {}", store.len());
            println!("Total energy: {:.3}", total);
            println!("Max energy:   {:.3}", max);
        }
    }

    Ok(())
}
