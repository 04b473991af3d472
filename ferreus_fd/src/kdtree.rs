/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a kd-tree for exact k-nearest-neighbour queries over generated node sets.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # kdtree
//!
//! A median-split kd-tree over node coordinates. Built once per node set and then
//! queried read-only, so concurrent stencil lookups need no locking.
//!
//! Queries are exact: results match a brute-force distance scan, with ties broken
//! by ascending node index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use faer::{Mat, Row, RowRef};
use ferreus_fd_utils::get_distance;

/// One answer of a k-nearest query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub distance: f64,
    pub id: usize,
}

impl Eq for Neighbor {}

// Orders by distance, then id. Coordinates are finite, so the partial comparison
// never actually falls through.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct KdNode {
    point: Row<f64>,
    id: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// A kd-tree over a fixed set of points, indexed by row.
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<usize>,
    dimensions: usize,
}

impl KdTree {
    /// Builds the tree; point `i` of the input keeps id `i`.
    pub fn new(points: &Mat<f64>) -> Self {
        let dimensions = points.ncols();
        let mut entries: Vec<(Row<f64>, usize)> = (0..points.nrows())
            .map(|i| (points.row(i).to_owned(), i))
            .collect();
        let mut nodes = Vec::with_capacity(entries.len());
        let root = build_subtree(&mut entries, 0, dimensions, &mut nodes);
        Self {
            nodes,
            root,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the `k` nearest points to `query`, closest first. Distance ties
    /// resolve to the lower id. Fewer than `k` results are returned only when the
    /// tree holds fewer than `k` points.
    pub fn k_nearest(&self, query: RowRef<f64>, k: usize) -> Vec<Neighbor> {
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = self.root {
            if k > 0 {
                self.search(root, query, 0, k, &mut heap);
            }
        }
        // The max-heap keeps the k best candidates; sorting ascending hands the
        // closest-first order straight back.
        heap.into_sorted_vec()
    }

    fn search(
        &self,
        node_index: usize,
        query: RowRef<f64>,
        depth: usize,
        k: usize,
        heap: &mut BinaryHeap<Neighbor>,
    ) {
        let node = &self.nodes[node_index];
        offer(
            heap,
            Neighbor {
                distance: get_distance(query, node.point.as_ref()),
                id: node.id,
            },
            k,
        );

        let axis = depth % self.dimensions;
        let offset = query[axis] - node.point[axis];
        let (near, far) = if offset < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = near {
            self.search(child, query, depth + 1, k, heap);
        }
        // The far side can only improve the answer if the splitting plane is closer
        // than the current worst candidate (or the heap is not full yet).
        let must_visit_far = match heap.peek() {
            _ if heap.len() < k => true,
            Some(worst) => offset.abs() <= worst.distance,
            None => true,
        };
        if must_visit_far {
            if let Some(child) = far {
                self.search(child, query, depth + 1, k, heap);
            }
        }
    }
}

/// Inserts a candidate, evicting the current worst when the heap is full.
fn offer(heap: &mut BinaryHeap<Neighbor>, candidate: Neighbor, k: usize) {
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek() {
        if candidate < *worst {
            heap.pop();
            heap.push(candidate);
        }
    }
}

fn build_subtree(
    entries: &mut [(Row<f64>, usize)],
    depth: usize,
    dimensions: usize,
    nodes: &mut Vec<KdNode>,
) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    let axis = depth % dimensions;
    let median = entries.len() / 2;
    // The halves only need to straddle the median, not be sorted.
    entries.select_nth_unstable_by(median, |a, b| {
        a.0[axis]
            .partial_cmp(&b.0[axis])
            .unwrap_or(Ordering::Equal)
    });
    let (left_entries, rest) = entries.split_at_mut(median);
    let (middle, right_entries) = rest.split_at_mut(1);

    let left = build_subtree(left_entries, depth + 1, dimensions, nodes);
    let right = build_subtree(right_entries, depth + 1, dimensions, nodes);
    nodes.push(KdNode {
        point: middle[0].0.to_owned(),
        id: middle[0].1,
        left,
        right,
    });
    Some(nodes.len() - 1)
}
