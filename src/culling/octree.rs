//! Octree over world-space faces.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index;
//! the parent index is navigational only. A face is stored in exactly one
//! node: the deepest one whose bounds fully contain the face's box.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};

use crate::face::Face;
use crate::math::{Aabb, Vec3};

use super::frustum::Frustum;

pub const DEFAULT_MAX_DEPTH: u32 = 8;
pub const DEFAULT_MAX_ITEMS: usize = 32;

/// Half-extent of the root cube when there is nothing to bound.
const EMPTY_WORLD_HALF_EXTENT: f64 = 1000.0;
const ROOT_PADDING: f64 = 1.0;

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    #[allow(dead_code)]
    parent: Option<usize>,
    children: Option<[usize; 8]>,
    faces: Vec<Face>,
}

impl Node {
    fn new(bounds: Aabb, depth: u32, parent: Option<usize>) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: None,
            faces: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Octree {
    nodes: Vec<Node>,
    max_depth: u32,
    max_items: usize,
    len: usize,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new(
            Aabb::cube(Vec3::ZERO, EMPTY_WORLD_HALF_EXTENT),
            DEFAULT_MAX_DEPTH,
            DEFAULT_MAX_ITEMS,
        )
    }
}

impl Octree {
    pub fn new(bounds: Aabb, max_depth: u32, max_items: usize) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0, None)],
            max_depth,
            max_items: max_items.max(1),
            len: 0,
        }
    }

    /// Builds a tree sized to the given faces with the default limits.
    pub fn build(faces: Vec<Face>) -> Self {
        let bounds = faces
            .iter()
            .map(Face::bounds)
            .reduce(|a, b| a.union(&b))
            .map(|b| b.padded(ROOT_PADDING))
            .unwrap_or_else(|| Aabb::cube(Vec3::ZERO, EMPTY_WORLD_HALF_EXTENT));

        let mut tree = Self::new(bounds, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITEMS);
        for face in faces {
            tree.insert(face);
        }
        log::debug!(
            "octree built: {} faces in {} nodes, depth {}",
            tree.len,
            tree.nodes.len(),
            tree.depth()
        );
        tree
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node depth currently allocated.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Places `face` in the deepest node that fully bounds it. Faces outside
    /// the root bounds stay at the root.
    pub fn insert(&mut self, face: Face) {
        self.len += 1;
        self.insert_at(0, face);
    }

    fn insert_at(&mut self, mut index: usize, face: Face) {
        let bounds = face.bounds();
        loop {
            match self.nodes[index].children {
                Some(children) => match self.child_containing(&children, &bounds) {
                    Some(child) => index = child,
                    None => {
                        self.nodes[index].faces.push(face);
                        return;
                    }
                },
                None => {
                    let node = &mut self.nodes[index];
                    node.faces.push(face);
                    if node.faces.len() > self.max_items && node.depth < self.max_depth {
                        self.split(index);
                    }
                    return;
                }
            }
        }
    }

    fn child_containing(&self, children: &[usize; 8], bounds: &Aabb) -> Option<usize> {
        children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].bounds.contains(bounds))
    }

    /// Creates the eight children of a leaf and pushes its faces down where
    /// they fit. Octant bit 1 selects the upper x half, 2 upper y, 4 upper z.
    fn split(&mut self, index: usize) {
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth;
        let center = bounds.center();

        let mut children = [0usize; 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            let pick = |bit: usize, lo: f64, mid: f64, hi: f64| {
                if octant & bit != 0 {
                    (mid, hi)
                } else {
                    (lo, mid)
                }
            };
            let (x0, x1) = pick(1, bounds.min.x, center.x, bounds.max.x);
            let (y0, y1) = pick(2, bounds.min.y, center.y, bounds.max.y);
            let (z0, z1) = pick(4, bounds.min.z, center.z, bounds.max.z);
            let child = Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1));

            *slot = self.nodes.len();
            self.nodes.push(Node::new(child, depth + 1, Some(index)));
        }
        self.nodes[index].children = Some(children);

        let faces = std::mem::take(&mut self.nodes[index].faces);
        for face in faces {
            match self.child_containing(&children, &face.bounds()) {
                Some(child) => self.insert_at(child, face),
                None => self.nodes[index].faces.push(face),
            }
        }
    }

    /// Every stored face, in node order.
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.nodes.iter().flat_map(|n| n.faces.iter())
    }

    /// Streams every face whose node and own bounds pass `frustum`.
    ///
    /// Runs on the rayon pool under the read lock. Child nodes are visited
    /// concurrently; the receiver disconnects once every branch finished.
    pub fn query(index: &Arc<RwLock<Octree>>, frustum: Frustum) -> Receiver<Face> {
        let (tx, rx) = mpsc::channel();
        let index = Arc::clone(index);
        rayon::spawn(move || {
            let tree = index.read().unwrap_or_else(PoisonError::into_inner);
            let tree: &Octree = &tree;
            let frustum = &frustum;
            rayon::scope(|scope| visit(scope, tree, 0, frustum, tx));
        });
        rx
    }

    /// Synchronous variant of [`Octree::query`].
    pub fn query_collect(&self, frustum: &Frustum) -> Vec<Face> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !frustum.intersects(&node.bounds) {
                continue;
            }
            out.extend(
                node.faces
                    .iter()
                    .filter(|f| frustum.intersects(&f.bounds()))
                    .cloned(),
            );
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        out
    }
}

fn visit<'s>(
    scope: &rayon::Scope<'s>,
    tree: &'s Octree,
    index: usize,
    frustum: &'s Frustum,
    tx: Sender<Face>,
) {
    let node = &tree.nodes[index];
    if !frustum.intersects(&node.bounds) {
        return;
    }
    for face in &node.faces {
        if frustum.intersects(&face.bounds()) && tx.send(face.clone()).is_err() {
            // receiver gone, nobody wants the rest
            return;
        }
    }
    if let Some(children) = node.children {
        for child in children {
            let tx = tx.clone();
            scope.spawn(move |s| visit(s, tree, child, frustum, tx));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_face(at: Vec3) -> Face {
        Face::plain([
            at,
            at + Vec3::new(0.1, 0.0, 0.0),
            at + Vec3::new(0.0, 0.1, 0.0),
        ])
    }

    fn scattered_faces(count: usize) -> Vec<Face> {
        (0..count)
            .map(|i| {
                let t = i as f64;
                tiny_face(Vec3::new(
                    (t * 7.3) % 40.0 - 20.0,
                    (t * 3.1) % 40.0 - 20.0,
                    t / count as f64 * 40.0 - 20.0,
                ))
            })
            .collect()
    }

    #[test]
    fn leaf_splits_past_capacity() {
        let mut tree = Octree::new(Aabb::cube(Vec3::ZERO, 32.0), 8, 4);
        for face in scattered_faces(5) {
            tree.insert(face);
        }
        assert!(tree.node_count() > 1);
        assert_eq!(tree.faces().count(), 5);
    }

    #[test]
    fn straddling_face_stays_in_parent() {
        let mut tree = Octree::new(Aabb::cube(Vec3::ZERO, 32.0), 8, 1);
        let straddler = Face::plain([
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
        ]);
        tree.insert(straddler);
        tree.insert(tiny_face(Vec3::new(10.0, 10.0, 10.0)));
        // root split, straddler could not move down
        assert_eq!(tree.nodes[0].faces.len(), 1);
        assert!(tree.nodes[0].children.is_some());
    }

    #[test]
    fn max_depth_nodes_accept_overflow() {
        let mut tree = Octree::new(Aabb::cube(Vec3::ZERO, 8.0), 0, 2);
        for face in scattered_faces(10) {
            tree.insert(face);
        }
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn whole_world_query_returns_every_face_once() {
        let faces = scattered_faces(500);
        let tree = Octree::build(faces);
        assert!(tree.depth() > 0);
        let frustum = Frustum::from_box(&tree.bounds());

        let index = Arc::new(RwLock::new(tree));
        let streamed: Vec<Face> = Octree::query(&index, frustum).into_iter().collect();
        assert_eq!(streamed.len(), 500);

        let mut keys: Vec<(i64, i64, i64)> = streamed
            .iter()
            .map(|f| {
                let v = f.vertices()[0];
                ((v.x * 1e6) as i64, (v.y * 1e6) as i64, (v.z * 1e6) as i64)
            })
            .collect();
        keys.sort_unstable();
        keys.dedup();
        let expected = index.read().unwrap().faces().count();
        assert_eq!(keys.len(), expected);
    }

    #[test]
    fn query_prunes_outside_region() {
        let tree = Octree::build(scattered_faces(200));
        let region = Aabb::new(Vec3::splat(0.0), Vec3::splat(20.0));
        let hits = tree.query_collect(&Frustum::from_box(&region));
        assert!(!hits.is_empty());
        assert!(hits.len() < 200);
        for face in &hits {
            let b = face.bounds();
            assert!(b.max.x >= region.min.x && b.min.x <= region.max.x);
            assert!(b.max.y >= region.min.y && b.min.y <= region.max.y);
            assert!(b.max.z >= region.min.z && b.min.z <= region.max.z);
        }
    }
}
