//! implant generate command - build an implant mesh and write it to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use implant_mesh::{ImplantError, ImplantGenerator, ImplantParams, MeshFormat, Placement};
use serde::Serialize;
use tracing::info;

use crate::output::{self, yes_no};
use crate::{Cli, OutputFormat};

#[derive(Args)]
pub struct GenerateArgs {
    /// Parameter file (.toml or .json); flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file path (format determined by extension: .stl, .obj)
    #[arg(short, long, default_value = "dental_implant.stl")]
    pub output: PathBuf,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    pub ascii: bool,

    /// Sample the profile on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Collapse the zero-radius apex ring into a single vertex
    #[arg(long)]
    pub weld_apex: bool,

    /// Entry point where the collar top is placed, as x,y,z
    #[arg(long, value_parser = parse_point, requires = "end", allow_hyphen_values = true)]
    pub start: Option<[f64; 3]>,

    /// Point along the insertion direction; the apex points towards it, as x,y,z
    #[arg(long, value_parser = parse_point, requires = "start", allow_hyphen_values = true)]
    pub end: Option<[f64; 3]>,
}

/// Per-field overrides of the parameter set.
#[derive(Args)]
pub struct ParamArgs {
    /// Overall length from apex to collar top (mm)
    #[arg(long)]
    pub total_length: Option<f64>,

    /// Shaft radius (mm)
    #[arg(long)]
    pub body_radius: Option<f64>,

    /// Collar height (mm)
    #[arg(long)]
    pub collar_height: Option<f64>,

    /// Radius at the collar top (mm)
    #[arg(long)]
    pub collar_top_radius: Option<f64>,

    /// Apex taper length (mm)
    #[arg(long)]
    pub apex_length: Option<f64>,

    /// Distance between thread crests (mm)
    #[arg(long)]
    pub thread_pitch: Option<f64>,

    /// Radial thread amplitude (mm)
    #[arg(long)]
    pub thread_depth: Option<f64>,

    /// Height where the thread begins (mm)
    #[arg(long)]
    pub thread_start_height: Option<f64>,

    /// Height where the thread ends (mm)
    #[arg(long)]
    pub thread_end_height: Option<f64>,

    /// Samples around the circumference
    #[arg(long)]
    pub angular_resolution: Option<usize>,

    /// Rings from apex to collar top
    #[arg(long)]
    pub vertical_resolution: Option<usize>,
}

impl ParamArgs {
    /// Overwrite the fields that were given on the command line.
    pub fn apply(&self, params: &mut ImplantParams) {
        let lengths = [
            (self.total_length, &mut params.total_length),
            (self.body_radius, &mut params.body_radius),
            (self.collar_height, &mut params.collar_height),
            (self.collar_top_radius, &mut params.collar_top_radius),
            (self.apex_length, &mut params.apex_length),
            (self.thread_pitch, &mut params.thread_pitch),
            (self.thread_depth, &mut params.thread_depth),
            (self.thread_start_height, &mut params.thread_start_height),
            (self.thread_end_height, &mut params.thread_end_height),
        ];
        for (value, field) in lengths {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(angular) = self.angular_resolution {
            params.angular_resolution = angular;
        }
        if let Some(vertical) = self.vertical_resolution {
            params.vertical_resolution = vertical;
        }
    }
}

#[derive(Serialize)]
struct GenerateInfo {
    output: String,
    format: &'static str,
    diameter_mm: f64,
    length_mm: f64,
    triangles: usize,
    vertices: usize,
    watertight: bool,
    consistently_wound: bool,
    degenerate_faces: usize,
    volume_mm3: f64,
    surface_area_mm2: f64,
    status: &'static str,
}

/// Parse `x,y,z` into a point.
fn parse_point(s: &str) -> std::result::Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got {:?}", s));
    }
    let mut point = [0.0; 3];
    for (slot, part) in point.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid coordinate {:?}: {}", part, e))?;
    }
    Ok(point)
}

/// Resolve the export format from the output path and `--ascii`.
fn output_format(path: &Path, ascii: bool) -> Result<MeshFormat> {
    match (MeshFormat::from_path(path), ascii) {
        (Some(MeshFormat::Stl), true) => Ok(MeshFormat::StlAscii),
        (Some(_), true) => bail!("--ascii only applies to .stl output"),
        (Some(format), false) => Ok(format),
        (None, _) => Err(ImplantError::unsupported_format(
            path.extension()
                .and_then(|e| e.to_str())
                .map(String::from),
        )
        .into()),
    }
}

/// Resolve parameters: defaults, then the config file, then flags.
pub fn resolve_params(config: Option<&Path>, overrides: &ParamArgs) -> Result<ImplantParams> {
    let mut params = match config {
        Some(path) => ImplantParams::load(path)
            .with_context(|| format!("Failed to load parameters from {:?}", path))?,
        None => ImplantParams::default(),
    };
    overrides.apply(&mut params);
    Ok(params)
}

pub fn run(args: &GenerateArgs, overrides: &ParamArgs, cli: &Cli) -> Result<()> {
    let format = output_format(&args.output, args.ascii)?;
    let params = resolve_params(args.config.as_deref(), overrides)?;

    let mut generator = ImplantGenerator::new(params)
        .parallel(args.parallel)
        .weld_apex(args.weld_apex);
    if let (Some(start), Some(end)) = (args.start, args.end) {
        generator = generator.placement(Placement { start, end });
    }

    let result = generator.generate().context("Failed to generate implant")?;

    result
        .save_as(&args.output, format)
        .with_context(|| format!("Failed to save mesh to {:?}", args.output))?;

    info!("Wrote {} to {:?}", format.name(), args.output);

    let report = &result.report;
    let info = GenerateInfo {
        output: args.output.display().to_string(),
        format: format.name(),
        diameter_mm: result.params.approximate_diameter(),
        length_mm: result.params.total_length,
        triangles: result.mesh.face_count(),
        vertices: result.mesh.vertex_count(),
        watertight: report.is_watertight,
        consistently_wound: report.is_consistently_wound(),
        degenerate_faces: report.degenerate_face_count,
        volume_mm3: report.volume,
        surface_area_mm2: report.surface_area,
        status: report.status(),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let kind = match format {
                    MeshFormat::Obj => "OBJ",
                    MeshFormat::Stl | MeshFormat::StlAscii => "STL",
                };
                println!("Generated {} file: {}", kind, info.output);
                println!(
                    "Dimensions: diameter ~{}mm, length {}mm",
                    info.diameter_mm, info.length_mm
                );
                println!("  {}: {}", "Triangles".cyan(), info.triangles);
                println!("  {}: {}", "Vertices".cyan(), info.vertices);
                println!("  {}: {:.2} mm³", "Volume".cyan(), info.volume_mm3);
                println!(
                    "  {}: {:.2} mm²",
                    "Surface area".cyan(),
                    info.surface_area_mm2
                );
                println!("  {}: {}", "Watertight".cyan(), yes_no(info.watertight));
                println!(
                    "  {}: {}",
                    "Consistent winding".cyan(),
                    yes_no(info.consistently_wound)
                );
                println!(
                    "  {}: {}",
                    "Degenerate faces".cyan(),
                    info.degenerate_faces
                );
                let status = if report.is_printable() {
                    info.status.green().bold()
                } else {
                    info.status.red().bold()
                };
                println!("  {}: {}", "Status".cyan(), status);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> ParamArgs {
        ParamArgs {
            total_length: None,
            body_radius: None,
            collar_height: None,
            collar_top_radius: None,
            apex_length: None,
            thread_pitch: None,
            thread_depth: None,
            thread_start_height: None,
            thread_end_height: None,
            angular_resolution: None,
            vertical_resolution: None,
        }
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1,2.5,-3").unwrap(), [1.0, 2.5, -3.0]);
        assert_eq!(parse_point(" 0, 0 ,1 ").unwrap(), [0.0, 0.0, 1.0]);
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,x,3").is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!(
            output_format(Path::new("a.stl"), false).unwrap(),
            MeshFormat::Stl
        );
        assert_eq!(
            output_format(Path::new("a.stl"), true).unwrap(),
            MeshFormat::StlAscii
        );
        assert_eq!(
            output_format(Path::new("a.obj"), false).unwrap(),
            MeshFormat::Obj
        );
        assert!(output_format(Path::new("a.obj"), true).is_err());

        let err = output_format(Path::new("a.ply"), false).unwrap_err();
        assert!(err.downcast_ref::<ImplantError>().is_some());
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let overrides = ParamArgs {
            body_radius: Some(1.75),
            angular_resolution: Some(48),
            ..no_overrides()
        };
        let params = resolve_params(None, &overrides).unwrap();
        assert_eq!(params.body_radius, 1.75);
        assert_eq!(params.angular_resolution, 48);
        assert_eq!(params.total_length, 13.0);
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("implant.toml");
        std::fs::write(&path, "total_length = 11.0\nthread_end_height = 8.3\n").unwrap();

        let overrides = ParamArgs {
            thread_depth: Some(0.2),
            ..no_overrides()
        };
        let params = resolve_params(Some(&path), &overrides).unwrap();
        assert_eq!(params.total_length, 11.0);
        assert_eq!(params.thread_end_height, 8.3);
        assert_eq!(params.thread_depth, 0.2);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_missing_config_keeps_error_code() {
        let err = resolve_params(Some(Path::new("/nonexistent/implant.toml")), &no_overrides())
            .unwrap_err();
        let implant_err = err.downcast_ref::<ImplantError>().unwrap();
        assert_eq!(implant_err.code(), implant_mesh::ErrorCode::IoRead);
    }
}
