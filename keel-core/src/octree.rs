//! Static octree over world-space triangles.
//!
//! The octree is the broad phase for triangle meshes: it is built once
//! per collision mesh at load time and read-only afterwards. Queries
//! return a conservative superset of the true overlaps, so callers
//! always re-test candidates with the exact narrow-phase kernels.
//!
//! Nodes live in a flat arena indexed by `usize`. A triangle descends
//! while exactly one child octant intersects it; as soon as it straddles
//! a split (or the depth cap is reached) it is stored at the current
//! node, the highest node whose subtree covers it. Each triangle is
//! therefore stored exactly once.

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::aabb::Aabb;
use crate::primitives::{ray_aabb, Triangle, GEOM_EPSILON};

/// Subdivision limit used by [`Octree::new`].
pub const DEFAULT_MAX_DEPTH: usize = 7;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct OctreeNode {
    bounds: Aabb,
    triangles: Vec<Triangle>,
    children: [Option<usize>; 8],
    divided: bool,
}

impl OctreeNode {
    fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            triangles: Vec::new(),
            children: [None; 8],
            divided: false,
        }
    }
}

/// Spatial index over a static set of triangles.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    max_depth: usize,
}

impl Octree {
    /// Create an empty octree covering `bounds`, with the default
    /// subdivision limit.
    #[must_use]
    pub fn new(bounds: Aabb) -> Self {
        Self::with_max_depth(bounds, DEFAULT_MAX_DEPTH)
    }

    /// Create an empty octree covering `bounds` with an explicit
    /// subdivision limit. A limit of zero keeps every triangle in the
    /// root node.
    #[must_use]
    pub fn with_max_depth(bounds: Aabb, max_depth: usize) -> Self {
        Self {
            nodes: vec![OctreeNode::new(bounds)],
            max_depth,
        }
    }

    /// Build an octree whose bounds are computed from the input
    /// triangles.
    #[must_use]
    pub fn build_from_mesh(triangles: &[Triangle]) -> Self {
        let mut points = Vec::with_capacity(triangles.len() * 3);
        for tri in triangles {
            points.push(tri.a);
            points.push(tri.b);
            points.push(tri.c);
        }
        let bounds = Aabb::from_points(&points).unwrap_or_default();

        let mut octree = Self::new(bounds);
        for tri in triangles {
            octree.insert_triangle(*tri);
        }
        debug!(
            "built octree: {} triangles in {} nodes, bounds {:?} to {:?}",
            octree.triangle_count(),
            octree.node_count(),
            octree.bounds().min,
            octree.bounds().max
        );
        octree
    }

    /// The world-space region covered by the root node.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.nodes[ROOT].bounds
    }

    /// Total number of nodes in the arena, including empty ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of stored triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.triangles.len()).sum()
    }

    /// Insert one triangle.
    ///
    /// Degenerate triangles and triangles entirely outside the root
    /// bounds are skipped with a warning; they would otherwise be
    /// invisible to every query.
    pub fn insert_triangle(&mut self, triangle: Triangle) {
        if triangle.is_degenerate() {
            warn!(
                "skipping degenerate triangle near {:?}",
                triangle.centroid()
            );
            return;
        }
        if !aabb_intersects_triangle(&self.nodes[ROOT].bounds, &triangle) {
            warn!(
                "skipping triangle near {:?}: outside octree bounds",
                triangle.centroid()
            );
            return;
        }
        self.insert_at(ROOT, triangle, 0);
    }

    // Caller guarantees the triangle intersects this node's bounds.
    fn insert_at(&mut self, node: usize, triangle: Triangle, depth: usize) {
        if depth >= self.max_depth {
            self.nodes[node].triangles.push(triangle);
            return;
        }

        if !self.nodes[node].divided {
            self.subdivide(node);
        }

        let mut sole_hit: Option<usize> = None;
        let mut straddles = false;
        for slot in 0..8 {
            let Some(child) = self.nodes[node].children[slot] else {
                continue;
            };
            if aabb_intersects_triangle(&self.nodes[child].bounds, &triangle) {
                if sole_hit.is_some() {
                    straddles = true;
                    break;
                }
                sole_hit = Some(child);
            }
        }

        match (straddles, sole_hit) {
            (false, Some(child)) => self.insert_at(child, triangle, depth + 1),
            // Straddles a split, or hugs every boundary the test
            // rejected: this node is the highest common ancestor.
            _ => self.nodes[node].triangles.push(triangle),
        }
    }

    fn subdivide(&mut self, node: usize) {
        let bounds = self.nodes[node].bounds;
        for octant in 0..8 {
            let child = self.nodes.len();
            self.nodes.push(OctreeNode::new(octant_bounds(&bounds, octant)));
            self.nodes[node].children[octant] = Some(child);
        }
        self.nodes[node].divided = true;
    }

    /// All triangles whose containing nodes overlap `range`.
    ///
    /// A superset of the triangles that actually overlap `range`;
    /// callers re-test precisely.
    #[must_use]
    pub fn query_aabb(&self, range: &Aabb) -> Vec<Triangle> {
        let mut out = Vec::new();
        self.collect_aabb(ROOT, range, &mut out);
        out
    }

    fn collect_aabb(&self, node: usize, range: &Aabb, out: &mut Vec<Triangle>) {
        let n = &self.nodes[node];
        if !n.bounds.overlaps(range) {
            return;
        }
        out.extend(n.triangles.iter().copied());
        for child in n.children.iter().flatten() {
            self.collect_aabb(*child, range, out);
        }
    }

    /// All triangles whose containing nodes are crossed by the ray.
    ///
    /// Same superset contract as [`Octree::query_aabb`].
    #[must_use]
    pub fn query_ray(&self, origin: Point3<f64>, dir: &Vector3<f64>) -> Vec<Triangle> {
        let mut out = Vec::new();
        self.collect_ray(ROOT, origin, dir, &mut out);
        out
    }

    fn collect_ray(
        &self,
        node: usize,
        origin: Point3<f64>,
        dir: &Vector3<f64>,
        out: &mut Vec<Triangle>,
    ) {
        let n = &self.nodes[node];
        if ray_aabb(origin, dir, &n.bounds).is_none() {
            return;
        }
        out.extend(n.triangles.iter().copied());
        for child in n.children.iter().flatten() {
            self.collect_ray(*child, origin, dir, out);
        }
    }
}

fn octant_bounds(bounds: &Aabb, octant: usize) -> Aabb {
    let center = bounds.center();
    let pick = |bit: usize, lo: f64, mid: f64, hi: f64| {
        if octant & bit == 0 {
            (lo, mid)
        } else {
            (mid, hi)
        }
    };
    let (min_x, max_x) = pick(1, bounds.min.x, center.x, bounds.max.x);
    let (min_y, max_y) = pick(2, bounds.min.y, center.y, bounds.max.y);
    let (min_z, max_z) = pick(4, bounds.min.z, center.z, bounds.max.z);
    Aabb::new(
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, max_y, max_z),
    )
}

/// Triangle versus AABB intersection via the separating axis theorem.
///
/// Tests the three box axes, the triangle normal, and the nine edge
/// cross products. Touching counts as intersecting, which keeps octree
/// routing conservative.
#[must_use]
pub fn aabb_intersects_triangle(aabb: &Aabb, triangle: &Triangle) -> bool {
    let center = aabb.center();
    let half_extents = aabb.half_extents();

    // Work in box-local space where the box is centered at the origin.
    let v0 = triangle.a - center;
    let v1 = triangle.b - center;
    let v2 = triangle.c - center;

    // Box axes first: equivalent to an AABB-vs-AABB rejection.
    if v0.x.min(v1.x).min(v2.x) > half_extents.x || v0.x.max(v1.x).max(v2.x) < -half_extents.x {
        return false;
    }
    if v0.y.min(v1.y).min(v2.y) > half_extents.y || v0.y.max(v1.y).max(v2.y) < -half_extents.y {
        return false;
    }
    if v0.z.min(v1.z).min(v2.z) > half_extents.z || v0.z.max(v1.z).max(v2.z) < -half_extents.z {
        return false;
    }

    let e0 = v1 - v0;
    let e1 = v2 - v1;
    let e2 = v0 - v2;

    // Triangle normal as separating axis.
    let normal = e0.cross(&e1);
    if !test_axis(&normal, &half_extents, &v0, &v1, &v2) {
        return false;
    }

    // Cross products of box axes with triangle edges.
    let box_axes = [Vector3::x(), Vector3::y(), Vector3::z()];
    for axis in &box_axes {
        for edge in [&e0, &e1, &e2] {
            let cross = axis.cross(edge);
            if cross.norm_squared() > GEOM_EPSILON * GEOM_EPSILON
                && !test_axis(&cross, &half_extents, &v0, &v1, &v2)
            {
                return false;
            }
        }
    }

    true
}

fn test_axis(
    axis: &Vector3<f64>,
    half_extents: &Vector3<f64>,
    v0: &Vector3<f64>,
    v1: &Vector3<f64>,
    v2: &Vector3<f64>,
) -> bool {
    let p0 = axis.dot(v0);
    let p1 = axis.dot(v1);
    let p2 = axis.dot(v2);

    let tri_min = p0.min(p1).min(p2);
    let tri_max = p0.max(p1).max(p2);

    let box_radius = half_extents.x * axis.x.abs()
        + half_extents.y * axis.y.abs()
        + half_extents.z * axis.z.abs();

    tri_min <= box_radius && tri_max >= -box_radius
}
