//! Triangle mesh buffers.
//!
//! Meshes are immutable once built: the renderer builds its acceleration
//! structure over them a single time, so every index is validated up front.

use lux_math::{Aabb, Vec2, Vec3};
use thiserror::Error;

/// Errors raised while assembling a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Index buffer length {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("Triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Attribute '{name}' has {len} entries, expected {expected}")]
    AttributeLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("Mesh has no triangles")]
    Empty,
}

pub type MeshResult<T> = Result<T, MeshError>;

/// Interleaved vertex: position, normal and texture coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A mesh made of triangles indexing into a shared vertex buffer.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<[u32; 3]>,
    bounds: Aabb,
}

impl Mesh {
    /// Create a mesh from interleaved vertices and triangles.
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> MeshResult<Self> {
        if triangles.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertex_count = vertices.len();
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        let bounds = Aabb::from_iter_points(vertices.iter().map(|v| v.position));
        log::info!(
            "Built mesh: {} vertices, {} triangles",
            vertex_count,
            triangles.len()
        );

        Ok(Self {
            vertices,
            triangles,
            bounds,
        })
    }

    /// Create a mesh from separate attribute arrays and a flat index buffer.
    ///
    /// Missing normals are computed by averaging face normals; missing UVs
    /// default to zero.
    pub fn from_buffers(
        positions: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
        indices: Vec<u32>,
    ) -> MeshResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }

        let expected = positions.len();
        if let Some(normals) = &normals {
            if normals.len() != expected {
                return Err(MeshError::AttributeLength {
                    name: "normals",
                    len: normals.len(),
                    expected,
                });
            }
        }
        if let Some(uvs) = &uvs {
            if uvs.len() != expected {
                return Err(MeshError::AttributeLength {
                    name: "uvs",
                    len: uvs.len(),
                    expected,
                });
            }
        }

        let has_normals = normals.is_some();
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Vertex::new(
                    position,
                    normals.as_ref().map_or(Vec3::ZERO, |n| n[i]),
                    uvs.as_ref().map_or(Vec2::ZERO, |uv| uv[i]),
                )
            })
            .collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let mut mesh = Self::new(vertices, triangles)?;
        if !has_normals {
            mesh.compute_normals();
        }
        Ok(mesh)
    }

    /// Axis-aligned square of side `size` in the XZ plane, facing +Y.
    pub fn quad(size: f32) -> MeshResult<Self> {
        let h = 0.5 * size;
        let vertices = vec![
            Vertex::new(Vec3::new(-h, 0.0, -h), Vec3::Y, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(-h, 0.0, h), Vec3::Y, Vec2::new(0.0, 1.0)),
            Vertex::new(Vec3::new(h, 0.0, h), Vec3::Y, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(h, 0.0, -h), Vec3::Y, Vec2::new(1.0, 0.0)),
        ];
        Self::new(vertices, vec![[0, 1, 2], [0, 2, 3]])
    }

    /// Axis-aligned cube of side `size` centered at the origin.
    ///
    /// Each face has its own four vertices so normals stay flat.
    pub fn cube(size: f32) -> MeshResult<Self> {
        let h = 0.5 * size;
        let mut vertices = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);

        for normal in [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z] {
            // Two axes spanning the face, ordered so (u × v) == normal
            let u = Vec3::new(normal.y, normal.z, normal.x);
            let v = normal.cross(u);
            let base = vertices.len() as u32;

            for (s, t) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * s + v * t) * h;
                let uv = Vec2::new(0.5 * (s + 1.0), 0.5 * (t + 1.0));
                vertices.push(Vertex::new(position, normal, uv));
            }
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }

        Self::new(vertices, triangles)
    }

    /// Replace vertex normals with area-weighted averages of face normals.
    ///
    /// Faces are counter-clockwise: the face normal is `(p1 - p0) × (p2 - p0)`.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for &[i0, i1, i2] in &self.triangles {
            let [p0, p1, p2] = [i0, i1, i2].map(|i| self.vertices[i as usize].position);
            let face_normal = (p1 - p0).cross(p2 - p0);
            for i in [i0, i1, i2] {
                normals[i as usize] += face_normal;
            }
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            // Default up normal for vertices only touched by degenerate faces
            vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// The three vertices of triangle `index`.
    #[inline]
    pub fn triangle_vertices(&self, index: usize) -> [&Vertex; 3] {
        let [a, b, c] = self.triangles[index];
        [
            &self.vertices[a as usize],
            &self.vertices[b as usize],
            &self.vertices[c as usize],
        ]
    }

    /// Surface area of triangle `index`.
    pub fn triangle_area(&self, index: usize) -> f32 {
        let [a, b, c] = self.triangle_vertices(index);
        0.5 * (b.position - a.position)
            .cross(c.position - a.position)
            .length()
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Vec<Vec3>, Vec<u32>) {
        (
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_from_buffers_computes_normals() {
        let (positions, indices) = triangle();
        let mesh = Mesh::from_buffers(positions, None, None, indices).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        for v in mesh.vertices() {
            assert!((v.normal - Vec3::Z).length() < 1e-6);
        }
        assert!((mesh.triangle_area(0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_indices() {
        let (positions, _) = triangle();
        let err = Mesh::from_buffers(positions.clone(), None, None, vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                triangle: 0,
                index: 3,
                vertex_count: 3
            }
        );

        let err = Mesh::from_buffers(positions.clone(), None, None, vec![0, 1]).unwrap_err();
        assert_eq!(err, MeshError::IndexCount(2));

        let err = Mesh::from_buffers(positions, None, Some(vec![Vec2::ZERO]), vec![0, 1, 2])
            .unwrap_err();
        assert!(matches!(err, MeshError::AttributeLength { name: "uvs", .. }));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Mesh::new(Vec::new(), Vec::new()).unwrap_err(), MeshError::Empty);
    }

    #[test]
    fn test_quad() {
        let quad = Mesh::quad(2.0).unwrap();
        assert_eq!(quad.triangle_count(), 2);
        let total: f32 = (0..2).map(|i| quad.triangle_area(i)).sum();
        assert!((total - 4.0).abs() < 1e-5);

        // Winding agrees with the stored normal
        let [a, b, c] = quad.triangle_vertices(0);
        let n = (b.position - a.position).cross(c.position - a.position);
        assert!(n.dot(Vec3::Y) > 0.0);
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = Mesh::cube(2.0).unwrap();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.bounds().min, Vec3::splat(-1.0));
        assert_eq!(cube.bounds().max, Vec3::splat(1.0));

        for i in 0..cube.triangle_count() {
            let [a, b, c] = cube.triangle_vertices(i);
            let n = (b.position - a.position).cross(c.position - a.position);
            assert!(n.dot(a.normal) > 0.0, "triangle {i} is wound inward");
            assert!((cube.triangle_area(i) - 2.0).abs() < 1e-5);
        }
    }
}
