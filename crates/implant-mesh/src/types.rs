//! Indexed triangle mesh and the triangle view used by exporters and checks.

use nalgebra::{Isometry3, Point3, Vector3};

/// A mesh vertex.
///
/// Coordinates are in millimeters, with the implant axis along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f64>,
}

impl Vertex {
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Distance from the Z axis.
    #[inline]
    pub fn radial_distance(&self) -> f64 {
        self.position.x.hypot(self.position.y)
    }
}

/// Shared vertices plus index triples.
///
/// The flat triangle list handed to exporters is available through
/// [`Mesh::triangles`]; indexing is kept so closure and orientation can be
/// checked edge by edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Index triples, counter-clockwise when seen from outside.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mesh with room for `vertex_count` vertices and `face_count` faces.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when there is nothing to export.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Lower and upper corners of the axis-aligned box, `None` without vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;

        Some(self.vertices[1..].iter().fold((first, first), |(min, max), v| {
            let p = v.position;
            (
                Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Faces resolved to positions, in face order.
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&face| self.face_triangle(face))
    }

    /// Face `face_idx` resolved to positions.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&face| self.face_triangle(face))
    }

    fn face_triangle(&self, [i0, i1, i2]: [u32; 3]) -> Triangle {
        Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        }
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Apply a rigid transform to every vertex.
    ///
    /// Rigid transforms preserve winding, so face orientation is untouched.
    pub fn transform(&mut self, isometry: &Isometry3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position = isometry.transform_point(&vertex.position);
        }
    }

    /// Enclosed volume by the divergence theorem (tetrahedra against the origin).
    ///
    /// Positive for a closed, outward-wound surface.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|tri| tri.v0.coords.dot(&tri.v1.coords.cross(&tri.v2.coords)))
            .sum::<f64>()
            / 6.0
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Faces wound inward overall.
    #[inline]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}

/// One face with its corner positions copied out of the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// `(v1 - v0) × (v2 - v0)`; its length is twice the area.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Unit normal, `None` when the face has (almost) no area.
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        (n.norm_squared() > f64::EPSILON).then(|| n.normalize())
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    #[inline]
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() < epsilon
    }

    /// Vertex coordinates as single-precision arrays, the layout STL expects.
    pub fn to_f32_array(&self) -> [[f32; 3]; 3] {
        [self.v0, self.v1, self.v2].map(|p| [p.x as f32, p.y as f32, p.z as f32])
    }
}
