// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

const SAH_BUCKETS: usize = 12;

#[derive(Clone)]
struct BVHNode {
    bounds: AABB,
    left: Option<usize>,
    right: Option<usize>,
    start: usize,
    count: usize,
}

impl BVHNode {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: None, right: None, start, count }
    }

    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self { bounds, left: Some(left), right: Some(right), start: 0, count: 0 }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
    max_leaf_size: usize,
}

impl BVH {
    pub fn new(prim_bounds: Vec<AABB>, prim_centroids: Vec<Vector3f>) -> Self {
        Self::with_max_leaf_size(prim_bounds, prim_centroids, 4)
    }

    pub fn with_max_leaf_size(
        prim_bounds: Vec<AABB>,
        prim_centroids: Vec<Vector3f>,
        max_leaf_size: usize,
    ) -> Self {
        // Only bounds are stored; intersection goes through the callbacks.
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
            max_leaf_size: max_leaf_size.max(1),
        };

        if !bvh.indices.is_empty() {
            let (bounds, centroid_bounds) = bvh.compute_bounds(0, bvh.indices.len());
            bvh.build(0, bvh.indices.len(), bounds, centroid_bounds);
        }

        bvh
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closest hit reported by `hit_fn`. The callback receives a copy of the
    /// ray whose `max_t` shrinks to the closest distance found so far, so
    /// subtrees behind an accepted hit are never visited.
    pub fn ray_intersection<F, T>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut clipped = *ray;
        let mut closest: Option<(usize, T)> = None;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&clipped) {
                continue;
            }

            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if let Some((hit, t)) = hit_fn(prim_idx, &clipped) {
                        if clipped.update(t) {
                            closest = Some((prim_idx, hit));
                        }
                    }
                }
            } else if let (Some(left), Some(right)) = (node.left, node.right) {
                // Visit the nearer child first.
                let t_left = self.entry_distance(left, &clipped);
                let t_right = self.entry_distance(right, &clipped);
                if t_left <= t_right {
                    stack.push(right);
                    stack.push(left);
                } else {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        closest
    }

    /// Early-out traversal for occlusion queries.
    pub fn ray_intersection_t<F>(&self, ray: &Ray3f, mut hit_fn: F) -> bool
    where
        F: FnMut(usize, &Ray3f) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(ray) {
                continue;
            }
            if node.is_leaf() {
                let hit = self.indices[node.start..node.start + node.count]
                    .iter()
                    .any(|&prim_idx| hit_fn(prim_idx, ray));
                if hit {
                    return true;
                }
            } else {
                stack.extend(node.left);
                stack.extend(node.right);
            }
        }

        false
    }

    fn entry_distance(&self, node_idx: usize, ray: &Ray3f) -> Float {
        self.nodes[node_idx]
            .bounds
            .ray_intersect_range(ray)
            .map_or(Float::INFINITY, |(t0, _)| t0)
    }

    fn bucket_index(&self, prim_idx: usize, axis: usize, axis_min: Float, axis_max: Float) -> usize {
        let c = self.prim_centroids[prim_idx][axis];
        let b = ((c - axis_min) / (axis_max - axis_min) * SAH_BUCKETS as Float) as usize;
        b.min(SAH_BUCKETS - 1)
    }

    fn push_leaf(&mut self, bounds: AABB, start: usize, count: usize) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::leaf(bounds, start, count));
        node_idx
    }

    fn build(&mut self, start: usize, end: usize, bounds: AABB, centroid_bounds: AABB) -> usize {
        let count = end - start;
        if count <= self.max_leaf_size {
            return self.push_leaf(bounds, start, count);
        }

        let axis = centroid_bounds.max_extent() as usize;
        let axis_min = centroid_bounds.p_min[axis];
        let axis_max = centroid_bounds.p_max[axis];
        if (axis_max - axis_min).abs() < 1e-6 {
            // All centroids coincide.
            return self.push_leaf(bounds, start, count);
        }

        // SAH with fixed buckets along the split axis.
        let mut buckets = vec![(0usize, AABB::default()); SAH_BUCKETS];
        for i in start..end {
            let idx = self.indices[i];
            let b = self.bucket_index(idx, axis, axis_min, axis_max);
            buckets[b].0 += 1;
            buckets[b].1.expand_by_aabb(&self.prim_bounds[idx]);
        }

        let mut cost = [0.0f32; SAH_BUCKETS - 1];
        for i in 0..(SAH_BUCKETS - 1) {
            let mut b0 = AABB::default();
            let mut b1 = AABB::default();
            let mut count0 = 0usize;
            let mut count1 = 0usize;
            for b in 0..=i {
                count0 += buckets[b].0;
                b0.expand_by_aabb(&buckets[b].1);
            }
            for b in (i + 1)..SAH_BUCKETS {
                count1 += buckets[b].0;
                b1.expand_by_aabb(&buckets[b].1);
            }
            let area = bounds.surface_area().max(1e-6);
            let cost0 = if count0 > 0 {
                (count0 as Float) * b0.surface_area()
            } else {
                0.0
            };
            let cost1 = if count1 > 0 {
                (count1 as Float) * b1.surface_area()
            } else {
                0.0
            };
            cost[i] = 1.0 + (cost0 + cost1) / area;
        }

        let mut min_cost = cost[0];
        let mut min_split = 0usize;
        for i in 1..cost.len() {
            if cost[i] < min_cost {
                min_cost = cost[i];
                min_split = i;
            }
        }

        // If SAH says leaf is cheaper, stop splitting.
        let leaf_cost = count as Float;
        if min_cost >= leaf_cost {
            return self.push_leaf(bounds, start, count);
        }

        // Partition indices in-place by bucket.
        let mut mid = start;
        let mut i = start;
        while i < end {
            let idx = self.indices[i];
            if self.bucket_index(idx, axis, axis_min, axis_max) <= min_split {
                self.indices.swap(i, mid);
                mid += 1;
            }
            i += 1;
        }

        if mid == start || mid == end {
            return self.push_leaf(bounds, start, count);
        }

        // Build child nodes and stitch them into an interior node.
        let (left_bounds, left_centroids) = self.compute_bounds(start, mid);
        let (right_bounds, right_centroids) = self.compute_bounds(mid, end);
        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::leaf(bounds, 0, 0));
        let left = self.build(start, mid, left_bounds, left_centroids);
        let right = self.build(mid, end, right_bounds, right_centroids);
        self.nodes[node_idx] = BVHNode::interior(bounds, left, right);
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for i in start..end {
            let idx = self.indices[i];
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::BVH;
    use crate::core::shape::Shape;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::shapes::sphere::Sphere;

    // A row of spheres along x plus a second row behind it.
    fn build_spheres() -> Vec<Sphere> {
        let mut spheres = Vec::new();
        for i in 0..16 {
            let x = (i % 8) as Float * 2.0;
            let z = if i < 8 { 0.0 } else { -5.0 };
            spheres.push(Sphere::new(Vector3f::new(x, 0.0, z), 0.5));
        }
        spheres
    }

    fn build_bvh(spheres: &[Sphere]) -> BVH {
        let bounds: Vec<_> = spheres.iter().map(|s| s.bounding_box()).collect();
        let centroids = bounds.iter().map(|b| b.center()).collect();
        BVH::with_max_leaf_size(bounds, centroids, 2)
    }

    fn closest(bvh: &BVH, spheres: &[Sphere], ray: &Ray3f) -> Option<(usize, Float)> {
        bvh.ray_intersection(ray, |prim_idx, ray| spheres[prim_idx].ray_intersection(ray).map(|h| (h.t, h.t)))
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let spheres = build_spheres();
        let bvh = build_bvh(&spheres);
        assert_eq!(bvh.len(), 16);
        assert!(bvh.node_count() > 1);

        for i in 0..8 {
            let origin = Vector3f::new(i as Float * 2.0 + 0.1, 0.1, 3.0);
            let ray = Ray3f::new(origin, Vector3f::new(0.0, 0.0, -1.0), None, None);

            let (idx, t) = closest(&bvh, &spheres, &ray).unwrap();
            let naive = spheres
                .iter()
                .filter_map(|s| s.ray_intersection(&ray).map(|h| h.t))
                .fold(Float::INFINITY, Float::min);
            assert_eq!(idx, i);
            assert!((t - naive).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bvh_respects_ray_range_and_misses() {
        let spheres = build_spheres();
        let bvh = build_bvh(&spheres);

        // The front row ends at z = -0.5, so it is out of range.
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 3.0), Vector3f::new(0.0, 0.0, -1.0), Some(4.0), None);
        let (idx, t) = closest(&bvh, &spheres, &ray).unwrap();
        assert_eq!(idx, 8);
        assert!((t - 7.5).abs() < 1e-4);

        let miss = Ray3f::new(Vector3f::new(100.0, 100.0, 1.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        assert!(closest(&bvh, &spheres, &miss).is_none());
        assert!(!bvh.ray_intersection_t(&miss, |prim_idx, ray| spheres[prim_idx].ray_intersection_t(ray)));

        let short = Ray3f::new(Vector3f::new(4.0, 0.0, 3.0), Vector3f::new(0.0, 0.0, -1.0), None, Some(2.0));
        assert!(!bvh.ray_intersection_t(&short, |prim_idx, ray| spheres[prim_idx].ray_intersection_t(ray)));
        let long = Ray3f::new(Vector3f::new(4.0, 0.0, 3.0), Vector3f::new(0.0, 0.0, -1.0), None, Some(3.0));
        assert!(bvh.ray_intersection_t(&long, |prim_idx, ray| spheres[prim_idx].ray_intersection_t(ray)));
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = BVH::new(Vec::new(), Vec::new());
        assert!(bvh.is_empty());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(bvh.ray_intersection(&ray, |_, _| Some(((), 1.0))).is_none());
    }
}
