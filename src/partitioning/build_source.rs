use super::BuildError;
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, DIM};

/// Read access to the geometry a BVH is built from.
///
/// Primitives are identified by a geometry index and a primitive index within that
/// geometry, the same pair stored in every [`PrimRef`](super::PrimRef).
pub trait BuildSource: Sync {
    /// The number of geometries.
    fn num_geometries(&self) -> usize;

    /// The number of primitives of the geometry `geom_id`, zero if it does not exist.
    fn num_primitives(&self, geom_id: u32) -> usize;

    /// The bounding box of the primitive `prim_id` of the geometry `geom_id`.
    ///
    /// Returns `None` if the primitive does not exist or cannot be bounded (for example
    /// because one of its vertices is not finite). Such primitives are excluded from the build.
    fn prim_bounds(&self, geom_id: u32, prim_id: u32) -> Option<Aabb>;
}

/// A list of boxes seen as a single geometry whose primitives are the boxes themselves.
impl BuildSource for [Aabb] {
    fn num_geometries(&self) -> usize {
        1
    }

    fn num_primitives(&self, geom_id: u32) -> usize {
        if geom_id == 0 {
            self.len()
        } else {
            0
        }
    }

    fn prim_bounds(&self, geom_id: u32, prim_id: u32) -> Option<Aabb> {
        if geom_id != 0 {
            return None;
        }

        self.get(prim_id as usize)
            .copied()
            .filter(|aabb| is_finite(aabb) && !aabb.is_empty())
    }
}

#[derive(Clone, Debug, Default)]
struct TriangleMesh {
    vertices: Vec<Point<Real>>,
    indices: Vec<[u32; 3]>,
}

/// A set of indexed triangle meshes.
///
/// Each call to [`TriangleSoup::add_mesh`] registers a new geometry; its index is the
/// geometry id stored in the primitive references of its triangles.
#[derive(Clone, Debug, Default)]
pub struct TriangleSoup {
    meshes: Vec<TriangleMesh>,
}

impl TriangleSoup {
    /// Creates a soup without any geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new triangle mesh and returns its geometry id.
    ///
    /// Fails if a triangle references a vertex that does not exist. Non-finite vertices are
    /// accepted here, the triangles using them are just skipped when building.
    pub fn add_mesh(
        &mut self,
        vertices: Vec<Point<Real>>,
        indices: Vec<[u32; 3]>,
    ) -> Result<u32, BuildError> {
        let geom_id = self.meshes.len() as u32;

        for (triangle, idx) in indices.iter().enumerate() {
            if let Some(index) = idx.iter().find(|i| **i as usize >= vertices.len()) {
                return Err(BuildError::IndexOutOfBounds {
                    geom_id,
                    triangle: triangle as u32,
                    index: *index,
                    num_vertices: vertices.len(),
                });
            }
        }

        self.meshes.push(TriangleMesh { vertices, indices });
        Ok(geom_id)
    }

    /// The vertices of the triangle `prim_id` of the geometry `geom_id`.
    pub fn triangle(&self, geom_id: u32, prim_id: u32) -> Option<[Point<Real>; 3]> {
        let mesh = self.meshes.get(geom_id as usize)?;
        let idx = mesh.indices.get(prim_id as usize)?;
        Some(idx.map(|i| mesh.vertices[i as usize]))
    }
}

impl BuildSource for TriangleSoup {
    fn num_geometries(&self) -> usize {
        self.meshes.len()
    }

    fn num_primitives(&self, geom_id: u32) -> usize {
        self.meshes
            .get(geom_id as usize)
            .map(|mesh| mesh.indices.len())
            .unwrap_or(0)
    }

    fn prim_bounds(&self, geom_id: u32, prim_id: u32) -> Option<Aabb> {
        let aabb = Aabb::from_points(self.triangle(geom_id, prim_id)?);
        is_finite(&aabb).then_some(aabb)
    }
}

fn is_finite(aabb: &Aabb) -> bool {
    (0..DIM).all(|i| aabb.mins[i].is_finite() && aabb.maxs[i].is_finite())
}
