//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree stores primitive indices only; callers own the primitives and
//! answer per-primitive queries through a closure. The same structure indexes
//! the triangles of a mesh and the instances of a scene.
//!
//! Traversal returns "best hit so far, or none" from every level and the
//! caller folds results, so a closer hit is never overwritten by a farther one.

use lux_math::{Aabb, Interval, Ray, Vec3};
use serde::{Deserialize, Serialize};

/// Maximum primitives per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 4;

/// Bin count for the binned surface area heuristic.
const SAH_BINS: usize = 16;

/// How interior nodes partition their primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Split the centroid-sorted primitives in half.
    Median,
    /// Binned SAH along the axis of largest centroid extent.
    #[default]
    Sah,
}

/// Anything a traversal can fold by distance.
pub trait Hit {
    fn t(&self) -> f32;
}

/// Bounds and centroid of one primitive, as seen by the builder.
#[derive(Debug, Clone, Copy)]
pub struct BvhPrimitive {
    pub bounds: Aabb,
    pub centroid: Vec3,
}

impl BvhPrimitive {
    pub fn new(bounds: Aabb, centroid: Vec3) -> Self {
        Self { bounds, centroid }
    }
}

/// BVH node - either a branch with two children or a leaf with primitive indices.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node with a small number of primitives.
    Leaf { primitives: Vec<u32>, bbox: Aabb },
    /// Empty node (no primitives at all).
    Empty,
}

impl BvhNode {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            BvhNode::Branch { left, right, .. } => 1 + left.node_count() + right.node_count(),
            _ => 1,
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
            _ => 1,
        }
    }
}

/// A built hierarchy over `primitive_count` primitives.
#[derive(Debug)]
pub struct Bvh {
    root: BvhNode,
    primitive_count: usize,
}

impl Bvh {
    /// Build a BVH over the given primitives.
    ///
    /// Primitives are sorted by centroid along the split axis, ties broken by
    /// primitive index, so the resulting tree is fully deterministic.
    pub fn new(primitives: &[BvhPrimitive], method: SplitMethod) -> Self {
        let root = if primitives.is_empty() {
            BvhNode::Empty
        } else {
            let indices = (0..primitives.len() as u32).collect();
            Self::build(primitives, indices, method)
        };
        Self {
            root,
            primitive_count: primitives.len(),
        }
    }

    /// Recursive BVH construction.
    fn build(primitives: &[BvhPrimitive], mut indices: Vec<u32>, method: SplitMethod) -> BvhNode {
        let bounds = indices.iter().fold(Aabb::EMPTY, |acc, &i| {
            Aabb::surrounding(&acc, &primitives[i as usize].bounds)
        });

        // Create leaf for small sets
        if indices.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                primitives: indices,
                bbox: bounds,
            };
        }

        // Choose split axis based on centroid spread
        let centroid_bounds =
            Aabb::from_iter_points(indices.iter().map(|&i| primitives[i as usize].centroid));
        let axis = centroid_bounds.longest_axis();

        indices.sort_unstable_by(|&a, &b| {
            let ca = primitives[a as usize].centroid[axis];
            let cb = primitives[b as usize].centroid[axis];
            ca.total_cmp(&cb).then(a.cmp(&b))
        });

        let mid = match method {
            SplitMethod::Median => indices.len() / 2,
            SplitMethod::Sah => sah_split(primitives, &indices, axis, &centroid_bounds)
                .unwrap_or(indices.len() / 2),
        };

        let right_indices = indices.split_off(mid);
        let left = Self::build(primitives, indices, method);
        let right = Self::build(primitives, right_indices, method);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox: bounds,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.root.bounding_box()
    }

    pub fn root(&self) -> &BvhNode {
        &self.root
    }

    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    pub fn node_count(&self) -> usize {
        match self.root {
            BvhNode::Empty => 0,
            _ => self.root.node_count(),
        }
    }

    pub fn depth(&self) -> usize {
        match self.root {
            BvhNode::Empty => 0,
            _ => self.root.depth(),
        }
    }

    /// Nearest hit along `ray` with `t <= t_max`.
    ///
    /// `hit_primitive(index, bound)` must only return hits no farther than
    /// `bound`; the bound shrinks as closer hits are found.
    pub fn intersect<H: Hit>(
        &self,
        ray: &Ray,
        t_max: f32,
        mut hit_primitive: impl FnMut(u32, f32) -> Option<H>,
    ) -> Option<H> {
        traverse(&self.root, ray, t_max, &mut hit_primitive)
    }

    /// Any-hit query: stops at the first primitive reporting a hit.
    pub fn occluded(
        &self,
        ray: &Ray,
        t_max: f32,
        mut hit_primitive: impl FnMut(u32, f32) -> bool,
    ) -> bool {
        any_hit(&self.root, ray, t_max, &mut hit_primitive)
    }
}

fn traverse<H: Hit>(
    node: &BvhNode,
    ray: &Ray,
    t_max: f32,
    hit_primitive: &mut impl FnMut(u32, f32) -> Option<H>,
) -> Option<H> {
    match node {
        BvhNode::Empty => None,

        BvhNode::Leaf { primitives, bbox } => {
            bbox.hit(ray, Interval::ray(t_max))?;

            let mut closest = t_max;
            let mut best = None;
            for &index in primitives {
                if let Some(hit) = hit_primitive(index, closest).filter(|h| h.t() <= closest) {
                    closest = hit.t();
                    best = Some(hit);
                }
            }
            best
        }

        BvhNode::Branch { left, right, bbox } => {
            bbox.hit(ray, Interval::ray(t_max))?;

            let hit_left = traverse(left, ray, t_max, hit_primitive);

            // Only check right up to closest hit
            let right_max = hit_left.as_ref().map_or(t_max, Hit::t);
            traverse(right, ray, right_max, hit_primitive).or(hit_left)
        }
    }
}

fn any_hit(
    node: &BvhNode,
    ray: &Ray,
    t_max: f32,
    hit_primitive: &mut impl FnMut(u32, f32) -> bool,
) -> bool {
    match node {
        BvhNode::Empty => false,
        BvhNode::Leaf { primitives, bbox } => {
            bbox.hit(ray, Interval::ray(t_max)).is_some()
                && primitives.iter().any(|&i| hit_primitive(i, t_max))
        }
        BvhNode::Branch { left, right, bbox } => {
            bbox.hit(ray, Interval::ray(t_max)).is_some()
                && (any_hit(left, ray, t_max, hit_primitive)
                    || any_hit(right, ray, t_max, hit_primitive))
        }
    }
}

/// Binned SAH over centroid-sorted `indices`.
///
/// Returns how many of the sorted primitives go to the left child, or `None`
/// when no plane separates them.
fn sah_split(
    primitives: &[BvhPrimitive],
    indices: &[u32],
    axis: usize,
    centroid_bounds: &Aabb,
) -> Option<usize> {
    let extent = centroid_bounds.size()[axis];
    if !(extent > 1e-6) || !extent.is_finite() {
        return None;
    }

    let split_min = centroid_bounds.min[axis];
    let scale = SAH_BINS as f32 / extent;
    let bin_of = |i: u32| {
        let idx = ((primitives[i as usize].centroid[axis] - split_min) * scale) as usize;
        idx.min(SAH_BINS - 1)
    };

    let mut counts = [0usize; SAH_BINS];
    let mut bounds = [Aabb::EMPTY; SAH_BINS];
    for &i in indices {
        let b = bin_of(i);
        counts[b] += 1;
        bounds[b] = Aabb::surrounding(&bounds[b], &primitives[i as usize].bounds);
    }

    let mut left_area = [0.0; SAH_BINS];
    let mut left_count = [0usize; SAH_BINS];
    let mut right_area = [0.0; SAH_BINS];
    let mut right_count = [0usize; SAH_BINS];

    let mut curr_box = Aabb::EMPTY;
    let mut curr_sum = 0;
    for i in 0..SAH_BINS {
        curr_sum += counts[i];
        curr_box = Aabb::surrounding(&curr_box, &bounds[i]);
        left_area[i] = curr_box.surface_area();
        left_count[i] = curr_sum;
    }

    curr_box = Aabb::EMPTY;
    curr_sum = 0;
    for i in (0..SAH_BINS).rev() {
        curr_sum += counts[i];
        curr_box = Aabb::surrounding(&curr_box, &bounds[i]);
        right_area[i] = curr_box.surface_area();
        right_count[i] = curr_sum;
    }

    let mut best: Option<(f32, usize)> = None;
    for i in 0..SAH_BINS - 1 {
        if left_count[i] == 0 || right_count[i + 1] == 0 {
            continue;
        }
        let cost = left_area[i] * left_count[i] as f32 + right_area[i + 1] * right_count[i + 1] as f32;
        // Strict comparison keeps the lowest plane on ties
        if best.map_or(cost.is_finite(), |(best_cost, _)| cost < best_cost) {
            best = Some((cost, left_count[i]));
        }
    }

    best.map(|(_, split)| split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestHit {
        t: f32,
        index: u32,
    }

    impl Hit for TestHit {
        fn t(&self) -> f32 {
            self.t
        }
    }

    /// Unit boxes spaced along +z, hit by a ray travelling down the z axis.
    fn boxes_along_z(n: usize) -> Vec<BvhPrimitive> {
        (0..n)
            .map(|i| {
                let c = Vec3::new(0.0, 0.0, 2.0 * i as f32 + 5.0);
                BvhPrimitive::new(Aabb::from_points(c - Vec3::splat(0.5), c + Vec3::splat(0.5)), c)
            })
            .collect()
    }

    fn hit_box(prims: &[BvhPrimitive], ray: &Ray, i: u32, bound: f32) -> Option<TestHit> {
        prims[i as usize]
            .bounds
            .hit(ray, Interval::ray(bound))
            .map(|t| TestHit { t, index: i })
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::new(&[], SplitMethod::Sah);
        assert!(matches!(bvh.root(), BvhNode::Empty));
        assert_eq!(bvh.node_count(), 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.intersect(&ray, f32::INFINITY, |_, _| Some(TestHit { t: 1.0, index: 0 })).is_none());
    }

    #[test]
    fn test_bvh_single_leaf() {
        let prims = boxes_along_z(3);
        let bvh = Bvh::new(&prims, SplitMethod::Median);
        assert!(matches!(bvh.root(), BvhNode::Leaf { .. }));
    }

    #[test]
    fn test_nearest_hit_for_both_methods() {
        let prims = boxes_along_z(37);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        for method in [SplitMethod::Median, SplitMethod::Sah] {
            let bvh = Bvh::new(&prims, method);
            assert!(bvh.depth() > 1);
            let hit = bvh
                .intersect(&ray, f32::INFINITY, |i, bound| hit_box(&prims, &ray, i, bound))
                .unwrap();
            assert_eq!(hit.index, 0);
            assert!((hit.t - 4.5).abs() < 1e-5);

            // Reversed ray from the far end finds the last box
            let back = Ray::new(Vec3::new(0.0, 0.0, 200.0), -Vec3::Z);
            let hit = bvh
                .intersect(&back, f32::INFINITY, |i, bound| hit_box(&prims, &back, i, bound))
                .unwrap();
            assert_eq!(hit.index, 36);
        }
    }

    #[test]
    fn test_t_max_bounds_query() {
        let prims = boxes_along_z(10);
        let bvh = Bvh::new(&prims, SplitMethod::Sah);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh
            .intersect(&ray, 4.0, |i, bound| hit_box(&prims, &ray, i, bound))
            .is_none());
        assert!(!bvh.occluded(&ray, 4.0, |i, bound| hit_box(&prims, &ray, i, bound).is_some()));
        assert!(bvh.occluded(&ray, 5.0, |i, bound| hit_box(&prims, &ray, i, bound).is_some()));
    }

    #[test]
    fn test_degenerate_primitives_are_hittable() {
        // Flat and point-sized boxes must still be found
        let mut prims: Vec<BvhPrimitive> = (0..8)
            .map(|i| {
                let c = Vec3::new(i as f32 * 3.0, 0.0, 0.0);
                BvhPrimitive::new(Aabb::from_points(c, c), c)
            })
            .collect();
        let flat = Vec3::new(0.0, 0.0, 10.0);
        prims.push(BvhPrimitive::new(
            Aabb::from_points(flat - Vec3::new(1.0, 1.0, 0.0), flat + Vec3::new(1.0, 1.0, 0.0)),
            flat,
        ));
        let bvh = Bvh::new(&prims, SplitMethod::Sah);

        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::Z);
        let hit = bvh
            .intersect(&ray, f32::INFINITY, |i, bound| hit_box(&prims, &ray, i, bound))
            .unwrap();
        assert_eq!(hit.index, 8);
        assert!((hit.t - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_identical_centroids_terminate() {
        let c = Vec3::ONE;
        let prims = vec![BvhPrimitive::new(Aabb::from_points(c - 0.5, c + 0.5), c); 50];
        for method in [SplitMethod::Median, SplitMethod::Sah] {
            let bvh = Bvh::new(&prims, method);
            assert_eq!(bvh.primitive_count(), 50);
            assert!(bvh.node_count() > 1);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let prims: Vec<BvhPrimitive> = (0..64)
            .map(|i| {
                // Many duplicated centroids to exercise the tie-break
                let c = Vec3::new((i % 4) as f32, (i % 3) as f32, 0.0);
                BvhPrimitive::new(Aabb::from_points(c - 0.25, c + 0.25), c)
            })
            .collect();

        fn leaves(node: &BvhNode, out: &mut Vec<Vec<u32>>) {
            match node {
                BvhNode::Branch { left, right, .. } => {
                    leaves(left, out);
                    leaves(right, out);
                }
                BvhNode::Leaf { primitives, .. } => out.push(primitives.clone()),
                BvhNode::Empty => {}
            }
        }

        let (mut a, mut b) = (Vec::new(), Vec::new());
        leaves(Bvh::new(&prims, SplitMethod::Sah).root(), &mut a);
        leaves(Bvh::new(&prims, SplitMethod::Sah).root(), &mut b);
        assert_eq!(a, b);

        let mut all: Vec<u32> = a.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..64).collect::<Vec<u32>>());
    }
}
