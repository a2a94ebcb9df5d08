//! implant check command - validate a parameter file without generating.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use implant_mesh::ImplantParams;
use serde::Serialize;

use crate::output;
use crate::{Cli, OutputFormat};

#[derive(Serialize)]
struct CheckInfo {
    config: String,
    valid: bool,
    diameter_mm: f64,
    length_mm: f64,
    collar_start_mm: f64,
    thread_band_mm: (f64, f64),
    max_radius_mm: f64,
    expected_vertices: usize,
    expected_triangles: usize,
}

fn summarize(config: &Path, params: &ImplantParams) -> CheckInfo {
    CheckInfo {
        config: config.display().to_string(),
        valid: true,
        diameter_mm: params.approximate_diameter(),
        length_mm: params.total_length,
        collar_start_mm: params.collar_start_height(),
        thread_band_mm: (params.thread_start_height, params.thread_end_height),
        max_radius_mm: params.max_radius(),
        expected_vertices: params.expected_vertex_count(),
        expected_triangles: params.expected_triangle_count(),
    }
}

pub fn run(config: &Path, cli: &Cli) -> Result<()> {
    let params = ImplantParams::load(config)
        .with_context(|| format!("Failed to load parameters from {:?}", config))?;
    params
        .validate()
        .with_context(|| format!("Invalid parameters in {:?}", config))?;

    let info = summarize(config, &params);

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Parameter Check".bold().underline());
                println!("  {}: {}", "Config".cyan(), info.config);
                println!("  {}: ~{} mm", "Diameter".cyan(), info.diameter_mm);
                println!("  {}: {} mm", "Length".cyan(), info.length_mm);
                println!("  {}: {:.3} mm", "Collar starts at".cyan(), info.collar_start_mm);
                println!(
                    "  {}: {} to {} mm",
                    "Thread band".cyan(),
                    info.thread_band_mm.0,
                    info.thread_band_mm.1
                );
                println!("  {}: {:.3} mm", "Max radius".cyan(), info.max_radius_mm);
                println!("  {}: {}", "Vertices".cyan(), info.expected_vertices);
                println!("  {}: {}", "Triangles".cyan(), info.expected_triangles);
                println!("  {}: {}", "Status".cyan(), "OK".green().bold());
            }
        }
    }

    Ok(())
}
