//! Mesh export: binary STL, ASCII STL and OBJ.
//!
//! Each format has a writer-generic function (`write_*`) used for in-memory
//! output and tests, and a path-based `save_*` wrapper that buffers the file
//! and maps failures to [`ImplantError::IoWrite`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ImplantError, ImplantResult};
use crate::types::{Mesh, Triangle};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Binary STL.
    Stl,
    /// ASCII STL.
    StlAscii,
    /// Wavefront OBJ.
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension. `.stl` maps to binary STL.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL (binary)",
            MeshFormat::StlAscii => "STL (ASCII)",
            MeshFormat::Obj => "OBJ",
        }
    }
}

/// Save a mesh, choosing the format from the file extension.
pub fn save_mesh(mesh: &Mesh, path: &Path) -> ImplantResult<()> {
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        ImplantError::unsupported_format(
            path.extension()
                .and_then(|e| e.to_str())
                .map(String::from),
        )
    })?;
    save_mesh_as(mesh, path, format)
}

/// Save a mesh in an explicit format.
pub fn save_mesh_as(mesh: &Mesh, path: &Path, format: MeshFormat) -> ImplantResult<()> {
    match format {
        MeshFormat::Stl => save_stl(mesh, path),
        MeshFormat::StlAscii => save_stl_ascii(mesh, path),
        MeshFormat::Obj => save_obj(mesh, path),
    }
}

/// Facet normal in single precision. Degenerate facets get a zero normal.
fn facet_normal(tri: &Triangle) -> [f32; 3] {
    tri.normal()
        .map(|n| [n.x as f32, n.y as f32, n.z as f32])
        .unwrap_or([0.0; 3])
}

/// Write binary STL to any writer.
pub fn write_stl<W: Write>(writer: &mut W, mesh: &Mesh) -> std::io::Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| {
            let [v0, v1, v2] = tri.to_f32_array();
            stl_io::Triangle {
                normal: stl_io::Normal::new(facet_normal(&tri)),
                vertices: [
                    stl_io::Vertex::new(v0),
                    stl_io::Vertex::new(v1),
                    stl_io::Vertex::new(v2),
                ],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Save mesh to STL file (binary format).
pub fn save_stl(mesh: &Mesh, path: &Path) -> ImplantResult<()> {
    info!("Saving mesh to {:?}", path);

    let file = File::create(path).map_err(|e| ImplantError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    write_stl(&mut writer, mesh).map_err(|e| ImplantError::io_write(path, e))?;
    writer.flush().map_err(|e| ImplantError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);
    Ok(())
}

/// Write ASCII STL to any writer.
///
/// `name` goes after `solid`/`endsolid` and should not contain whitespace.
pub fn write_stl_ascii<W: Write>(writer: &mut W, mesh: &Mesh, name: &str) -> std::io::Result<()> {
    writeln!(writer, "solid {}", name)?;
    for tri in mesh.triangles() {
        let [nx, ny, nz] = facet_normal(&tri);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", nx, ny, nz)?;
        writeln!(writer, "    outer loop")?;
        for [x, y, z] in tri.to_f32_array() {
            writeln!(writer, "      vertex {:e} {:e} {:e}", x, y, z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)
}

/// Save mesh to STL file (ASCII format). The solid is named after the file stem.
pub fn save_stl_ascii(mesh: &Mesh, path: &Path) -> ImplantResult<()> {
    info!("Saving mesh to {:?} (ASCII STL)", path);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace(char::is_whitespace, "_"))
        .unwrap_or_else(|| "implant".to_string());

    let file = File::create(path).map_err(|e| ImplantError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    write_stl_ascii(&mut writer, mesh, &name).map_err(|e| ImplantError::io_write(path, e))?;
    writer.flush().map_err(|e| ImplantError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);
    Ok(())
}

/// Write OBJ to any writer.
///
/// OBJ keeps the indexed structure, so shared vertices and the pole indices
/// survive export. Indices are 1-based.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Mesh) -> std::io::Result<()> {
    writeln!(writer, "# OBJ file exported by implant-mesh")?;
    writeln!(writer, "# Vertices: {}", mesh.vertices.len())?;
    writeln!(writer, "# Faces: {}", mesh.faces.len())?;
    writeln!(writer)?;

    for v in &mesh.vertices {
        writeln!(
            writer,
            "v {:.6} {:.6} {:.6}",
            v.position.x, v.position.y, v.position.z
        )?;
    }

    writeln!(writer)?;

    for [i0, i1, i2] in &mesh.faces {
        writeln!(writer, "f {} {} {}", i0 + 1, i1 + 1, i2 + 1)?;
    }

    Ok(())
}

/// Save mesh to OBJ file.
pub fn save_obj(mesh: &Mesh, path: &Path) -> ImplantResult<()> {
    info!("Saving mesh to {:?} (OBJ format)", path);

    let file = File::create(path).map_err(|e| ImplantError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    write_obj(&mut writer, mesh).map_err(|e| ImplantError::io_write(path, e))?;
    writer.flush().map_err(|e| ImplantError::io_write(path, e))?;

    debug!(
        "Saved {} vertices, {} faces to {:?}",
        mesh.vertex_count(),
        mesh.face_count(),
        path
    );
    Ok(())
}
