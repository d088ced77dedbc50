//! Convex polytope feature graphs.
//!
//! The closest-feature walk needs constant-time navigation between
//! vertices, edges, and faces. [`ConvexPolytope`] stores the three
//! feature kinds in arenas and connects them with typed indices, so
//! the adjacency graph has no reference cycles and clones cheaply.
//!
//! Construction validates that the input is a closed convex 2-manifold:
//! every edge must be shared by exactly two faces with opposite
//! traversal direction, and every vertex must lie on or behind every
//! face plane. Local vertex positions are kept alongside a world-space
//! copy that [`ConvexPolytope::set_pose`] refreshes each frame.

use std::collections::HashMap;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use keel_types::{Result, SimError};

use crate::primitives::GEOM_EPSILON;

/// Slack allowed when checking vertices against face planes during
/// construction.
const CONVEXITY_TOLERANCE: f64 = 1e-6;

/// Index of a vertex within its polytope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) usize);

/// Index of an edge within its polytope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) usize);

/// Index of a face within its polytope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub(crate) usize);

#[derive(Debug, Clone)]
struct Vertex {
    /// Position in the polytope's local frame.
    position: Point3<f64>,
    /// Every edge with this vertex as an endpoint.
    edges: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
struct Edge {
    tail: VertexId,
    head: VertexId,
    /// Face whose counter-clockwise loop traverses tail to head.
    left_face: FaceId,
    /// Face whose loop traverses head to tail.
    right_face: FaceId,
}

#[derive(Debug, Clone)]
struct Face {
    /// Boundary edges in loop order.
    edges: Vec<EdgeId>,
    /// First vertex of the loop; a point on the face plane.
    anchor: VertexId,
    /// Outward unit normal in the local frame.
    normal: Vector3<f64>,
}

/// A closed convex polytope with full feature adjacency.
///
/// Ids handed out by one polytope are only meaningful for that
/// polytope.
#[derive(Debug, Clone)]
pub struct ConvexPolytope {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    world_positions: Vec<Point3<f64>>,
    world_normals: Vec<Vector3<f64>>,
}

impl ConvexPolytope {
    /// Build a polytope from vertex positions and per-face vertex
    /// loops.
    ///
    /// Loops must be counter-clockwise when viewed from outside.
    /// Returns [`SimError::InvalidGeometry`] for open meshes,
    /// inconsistent winding, degenerate faces or edges, isolated
    /// vertices, and non-convex input.
    pub fn from_convex_mesh(vertices: &[Point3<f64>], face_loops: &[Vec<usize>]) -> Result<Self> {
        if vertices.len() < 4 {
            return Err(SimError::invalid_geometry(
                "a closed polytope needs at least 4 vertices",
            ));
        }
        if face_loops.len() < 4 {
            return Err(SimError::invalid_geometry(
                "a closed polytope needs at least 4 faces",
            ));
        }
        for (i, position) in vertices.iter().enumerate() {
            if !position.coords.iter().all(|c| c.is_finite()) {
                return Err(SimError::invalid_geometry(format!(
                    "vertex {i} has a non-finite coordinate"
                )));
            }
        }

        struct PendingEdge {
            tail: usize,
            head: usize,
            left_face: usize,
            right_face: Option<usize>,
        }

        let mut pending: Vec<PendingEdge> = Vec::new();
        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut vertex_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); vertices.len()];
        let mut faces: Vec<Face> = Vec::with_capacity(face_loops.len());

        for (face_index, loop_vertices) in face_loops.iter().enumerate() {
            if loop_vertices.len() < 3 {
                return Err(SimError::invalid_geometry(format!(
                    "face {face_index} has fewer than 3 vertices"
                )));
            }
            for &v in loop_vertices {
                if v >= vertices.len() {
                    return Err(SimError::invalid_geometry(format!(
                        "face {face_index} references vertex {v}, out of range"
                    )));
                }
            }

            // Newell's method; robust for slightly non-planar loops.
            let mut normal: Vector3<f64> = Vector3::zeros();
            for (k, &i) in loop_vertices.iter().enumerate() {
                let j = loop_vertices[(k + 1) % loop_vertices.len()];
                let p = vertices[i];
                let q = vertices[j];
                normal.x += (p.y - q.y) * (p.z + q.z);
                normal.y += (p.z - q.z) * (p.x + q.x);
                normal.z += (p.x - q.x) * (p.y + q.y);
            }
            let length = normal.norm();
            if length < GEOM_EPSILON {
                return Err(SimError::invalid_geometry(format!(
                    "face {face_index} has no area"
                )));
            }
            let normal = normal / length;

            let mut face_edges = Vec::with_capacity(loop_vertices.len());
            for (k, &i) in loop_vertices.iter().enumerate() {
                let j = loop_vertices[(k + 1) % loop_vertices.len()];
                if i == j {
                    return Err(SimError::invalid_geometry(format!(
                        "face {face_index} repeats vertex {i}"
                    )));
                }
                let key = (i.min(j), i.max(j));
                match edge_lookup.get(&key) {
                    None => {
                        if (vertices[j] - vertices[i]).norm() < GEOM_EPSILON {
                            return Err(SimError::invalid_geometry(format!(
                                "the edge between vertices {i} and {j} has zero length"
                            )));
                        }
                        let edge_index = pending.len();
                        pending.push(PendingEdge {
                            tail: i,
                            head: j,
                            left_face: face_index,
                            right_face: None,
                        });
                        edge_lookup.insert(key, edge_index);
                        vertex_edges[i].push(EdgeId(edge_index));
                        vertex_edges[j].push(EdgeId(edge_index));
                        face_edges.push(EdgeId(edge_index));
                    }
                    Some(&edge_index) => {
                        let edge = &mut pending[edge_index];
                        if edge.right_face.is_some() {
                            return Err(SimError::invalid_geometry(format!(
                                "the edge between vertices {} and {} borders more than two faces",
                                key.0, key.1
                            )));
                        }
                        if edge.tail != j || edge.head != i {
                            return Err(SimError::invalid_geometry(format!(
                                "faces disagree on winding across the edge between vertices {} and {}",
                                key.0, key.1
                            )));
                        }
                        edge.right_face = Some(face_index);
                        face_edges.push(EdgeId(edge_index));
                    }
                }
            }

            faces.push(Face {
                edges: face_edges,
                anchor: VertexId(loop_vertices[0]),
                normal,
            });
        }

        let mut edges = Vec::with_capacity(pending.len());
        for e in pending {
            let right_face = e.right_face.ok_or_else(|| {
                SimError::invalid_geometry(format!(
                    "open mesh: the edge between vertices {} and {} borders only one face",
                    e.tail, e.head
                ))
            })?;
            edges.push(Edge {
                tail: VertexId(e.tail),
                head: VertexId(e.head),
                left_face: FaceId(e.left_face),
                right_face: FaceId(right_face),
            });
        }

        for (i, incident) in vertex_edges.iter().enumerate() {
            if incident.is_empty() {
                return Err(SimError::invalid_geometry(format!(
                    "vertex {i} is not referenced by any face"
                )));
            }
        }

        for (face_index, face) in faces.iter().enumerate() {
            let anchor = vertices[face.anchor.0];
            for (vertex_index, position) in vertices.iter().enumerate() {
                if (position - anchor).dot(&face.normal) > CONVEXITY_TOLERANCE {
                    return Err(SimError::invalid_geometry(format!(
                        "not convex: vertex {vertex_index} lies outside face {face_index}"
                    )));
                }
            }
        }

        let world_positions = vertices.to_vec();
        let world_normals = faces.iter().map(|f| f.normal).collect();
        let vertices = vertices
            .iter()
            .zip(vertex_edges)
            .map(|(&position, edges)| Vertex { position, edges })
            .collect();

        Ok(Self {
            vertices,
            edges,
            faces,
            world_positions,
            world_normals,
        })
    }

    /// Build an axis-aligned box centered on the local origin.
    ///
    /// Fails when a half extent is not strictly positive.
    pub fn cuboid(half_extents: Vector3<f64>) -> Result<Self> {
        let h = half_extents;
        if !(h.x > GEOM_EPSILON && h.y > GEOM_EPSILON && h.z > GEOM_EPSILON) {
            return Err(SimError::invalid_geometry(
                "cuboid half extents must be positive",
            ));
        }

        let vertices = [
            Point3::new(-h.x, -h.y, -h.z),
            Point3::new(h.x, -h.y, -h.z),
            Point3::new(-h.x, h.y, -h.z),
            Point3::new(h.x, h.y, -h.z),
            Point3::new(-h.x, -h.y, h.z),
            Point3::new(h.x, -h.y, h.z),
            Point3::new(-h.x, h.y, h.z),
            Point3::new(h.x, h.y, h.z),
        ];
        let faces = [
            vec![1, 3, 7, 5],
            vec![0, 4, 6, 2],
            vec![2, 6, 7, 3],
            vec![0, 1, 5, 4],
            vec![4, 5, 7, 6],
            vec![0, 2, 3, 1],
        ];
        Self::from_convex_mesh(&vertices, &faces)
    }

    /// Refresh the world-space vertex and normal caches for a new pose.
    pub fn set_pose(&mut self, position: Point3<f64>, rotation: UnitQuaternion<f64>) {
        for (world, local) in self.world_positions.iter_mut().zip(&self.vertices) {
            *world = position + rotation * local.position.coords;
        }
        for (world, face) in self.world_normals.iter_mut().zip(&self.faces) {
            *world = rotation * face.normal;
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// All vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }

    /// All face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId)
    }

    /// World-space position of a vertex.
    #[must_use]
    pub fn vertex_position(&self, v: VertexId) -> Point3<f64> {
        self.world_positions[v.0]
    }

    /// Edges incident to a vertex.
    #[must_use]
    pub fn vertex_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.0].edges
    }

    /// Tail and head vertices of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, e: EdgeId) -> (VertexId, VertexId) {
        let edge = &self.edges[e.0];
        (edge.tail, edge.head)
    }

    /// World-space segment of an edge, tail first.
    #[must_use]
    pub fn edge_segment(&self, e: EdgeId) -> (Point3<f64>, Point3<f64>) {
        let edge = &self.edges[e.0];
        (
            self.world_positions[edge.tail.0],
            self.world_positions[edge.head.0],
        )
    }

    /// The two faces sharing an edge, left first.
    #[must_use]
    pub fn edge_faces(&self, e: EdgeId) -> (FaceId, FaceId) {
        let edge = &self.edges[e.0];
        (edge.left_face, edge.right_face)
    }

    /// The endpoint of `e` that is not `v`.
    pub fn edge_other_end(&self, e: EdgeId, v: VertexId) -> Result<VertexId> {
        let edge = &self.edges[e.0];
        if edge.tail == v {
            Ok(edge.head)
        } else if edge.head == v {
            Ok(edge.tail)
        } else {
            Err(SimError::invalid_geometry(format!(
                "vertex {} is not an endpoint of edge {}",
                v.0, e.0
            )))
        }
    }

    /// Outward world-space unit normal of a face.
    #[must_use]
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        self.world_normals[f.0]
    }

    /// A world-space point on the face and its outward unit normal.
    #[must_use]
    pub fn face_plane(&self, f: FaceId) -> (Point3<f64>, Vector3<f64>) {
        let face = &self.faces[f.0];
        (self.world_positions[face.anchor.0], self.world_normals[f.0])
    }

    /// Boundary edges of a face in loop order.
    #[must_use]
    pub fn face_edges(&self, f: FaceId) -> &[EdgeId] {
        &self.faces[f.0].edges
    }

    /// World-space unit direction of `e` as traversed by face `f`'s
    /// counter-clockwise loop.
    pub fn edge_direction_in_face(&self, e: EdgeId, f: FaceId) -> Result<Vector3<f64>> {
        let edge = &self.edges[e.0];
        let tail = self.world_positions[edge.tail.0];
        let head = self.world_positions[edge.head.0];
        let along = if edge.left_face == f {
            head - tail
        } else if edge.right_face == f {
            tail - head
        } else {
            return Err(SimError::invalid_geometry(format!(
                "edge {} does not border face {}",
                e.0, f.0
            )));
        };

        let length = along.norm();
        if length < GEOM_EPSILON {
            return Err(SimError::invalid_geometry(format!(
                "edge {} has zero length",
                e.0
            )));
        }
        Ok(along / length)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn tetrahedron() -> ConvexPolytope {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = [vec![0, 1, 3], vec![0, 3, 2], vec![0, 2, 1], vec![1, 2, 3]];
        ConvexPolytope::from_convex_mesh(&vertices, &faces).unwrap()
    }

    #[test]
    fn cuboid_has_a_closed_feature_graph() {
        let cube = ConvexPolytope::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.edge_count(), 12);
        assert_eq!(cube.face_count(), 6);

        for v in cube.vertex_ids() {
            assert_eq!(cube.vertex_edges(v).len(), 3);
        }
        for e in 0..cube.edge_count() {
            let (left, right) = cube.edge_faces(EdgeId(e));
            assert_ne!(left, right);
        }
        for f in cube.face_ids() {
            assert_eq!(cube.face_edges(f).len(), 4);
            assert_relative_eq!(cube.face_normal(f).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn tetrahedron_counts_match_euler() {
        let tet = tetrahedron();
        assert_eq!(tet.vertex_count(), 4);
        assert_eq!(tet.edge_count(), 6);
        assert_eq!(tet.face_count(), 4);

        // Outward slanted-face normal is (1,1,1)/sqrt(3).
        let slanted = tet
            .face_ids()
            .map(|f| tet.face_normal(f))
            .find(|n| n.x > 0.0 && n.y > 0.0 && n.z > 0.0)
            .unwrap();
        assert_relative_eq!(slanted.x, 1.0 / 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn open_mesh_is_rejected() {
        // A unit cube missing its -Z cap. Every other vertex is still
        // referenced, so closure is the first check that trips.
        let h = 1.0;
        let vertices = [
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(-h, h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(-h, h, h),
            Point3::new(h, h, h),
        ];
        let faces = [
            vec![1, 3, 7, 5],
            vec![0, 4, 6, 2],
            vec![2, 6, 7, 3],
            vec![0, 1, 5, 4],
            vec![4, 5, 7, 6],
        ];
        let err = ConvexPolytope::from_convex_mesh(&vertices, &faces).unwrap_err();
        assert!(err.to_string().contains("open mesh"));
    }

    #[test]
    fn edge_shared_by_three_faces_is_rejected() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        // The extra face re-traverses edges that already have two
        // faces.
        let faces = [
            vec![0, 1, 3],
            vec![0, 3, 2],
            vec![0, 2, 1],
            vec![1, 2, 3],
            vec![3, 2, 1],
        ];
        let err = ConvexPolytope::from_convex_mesh(&vertices, &faces).unwrap_err();
        assert!(err.to_string().contains("more than two faces"));
    }

    #[test]
    fn inconsistent_winding_is_rejected() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        // Last face reversed: traverses shared edges the same way as
        // its neighbors.
        let faces = [vec![0, 1, 3], vec![0, 3, 2], vec![0, 2, 1], vec![3, 2, 1]];
        let err = ConvexPolytope::from_convex_mesh(&vertices, &faces).unwrap_err();
        assert!(err.to_string().contains("winding"));
    }

    #[test]
    fn non_convex_input_is_rejected() {
        // Octahedron with the bottom apex pushed up inside the body.
        let vertices = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.5, 0.0),
        ];
        let faces = [
            vec![1, 0, 4],
            vec![0, 3, 4],
            vec![3, 2, 4],
            vec![2, 1, 4],
            vec![0, 1, 5],
            vec![3, 0, 5],
            vec![2, 3, 5],
            vec![1, 2, 5],
        ];
        let err = ConvexPolytope::from_convex_mesh(&vertices, &faces).unwrap_err();
        assert!(err.to_string().contains("convex"));
    }

    #[test]
    fn degenerate_cuboid_is_rejected() {
        assert!(ConvexPolytope::cuboid(Vector3::zeros()).is_err());
        assert!(ConvexPolytope::cuboid(Vector3::new(1.0, -1.0, 1.0)).is_err());
        assert!(ConvexPolytope::cuboid(Vector3::new(1.0, f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn set_pose_transforms_the_world_cache() {
        let mut cube = ConvexPolytope::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let plus_x = FaceId(0);
        assert_relative_eq!(cube.face_normal(plus_x), Vector3::x(), epsilon = 1e-12);

        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        cube.set_pose(Point3::new(10.0, 0.0, 0.0), rotation);

        // The +X face now points along +Y.
        assert_relative_eq!(cube.face_normal(plus_x), Vector3::y(), epsilon = 1e-12);
        // Local (1,1,1) maps to rotation * (1,1,1) + (10,0,0) = (9,1,1) + ...
        let moved = cube.vertex_position(VertexId(7));
        assert_relative_eq!(moved, Point3::new(9.0, 1.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn edge_direction_flips_between_its_faces() {
        let cube = ConvexPolytope::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let e = EdgeId(0);
        let (left, right) = cube.edge_faces(e);
        let d_left = cube.edge_direction_in_face(e, left).unwrap();
        let d_right = cube.edge_direction_in_face(e, right).unwrap();
        assert_relative_eq!(d_left.dot(&d_right), -1.0, epsilon = 1e-12);

        let not_adjacent = cube
            .face_ids()
            .find(|&f| f != left && f != right)
            .unwrap();
        assert!(cube.edge_direction_in_face(e, not_adjacent).is_err());
    }

    #[test]
    fn edge_other_end_walks_both_ways() {
        let tet = tetrahedron();
        let e = EdgeId(0);
        let (tail, head) = tet.edge_endpoints(e);
        assert_eq!(tet.edge_other_end(e, tail).unwrap(), head);
        assert_eq!(tet.edge_other_end(e, head).unwrap(), tail);

        let outsider = tet.vertex_ids().find(|&v| v != tail && v != head).unwrap();
        assert!(tet.edge_other_end(e, outsider).is_err());
    }
}
