/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to build spatial R-trees over boundary simplex bounding boxes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # rtree
//!
//! Wrapper module for the rstar crate.
//!
//! Holds one axis-aligned bounding box per boundary simplex and answers "which
//! simplices could a query box touch" so that ray parity counts and segment
//! crossing tests only run the exact predicate against nearby simplices.

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use std::convert::TryInto;

// rstar doesn't support 1D natively, so we've worked around
// that by treating it as a 2D problem and setting the y component
// for each rectangle added/queried to a min of 0 and max of 1.
type Rect1As2 = GeomWithData<Rectangle<[f64; 2]>, usize>;
type Rect2 = GeomWithData<Rectangle<[f64; 2]>, usize>;
type Rect3 = GeomWithData<Rectangle<[f64; 3]>, usize>;

pub enum SimplexRTree {
    D1(RTree<Rect1As2>), // 1D embedded in 2D
    D2(RTree<Rect2>),
    D3(RTree<Rect3>),
}

impl SimplexRTree {
    /// Returns the indices of all simplices whose bounding box intersects the query
    /// extents (`[mins..., maxs...]`, touching counts as intersecting).
    pub fn locate_intersecting(&self, query_extents: &[f64]) -> Vec<usize> {
        match self {
            SimplexRTree::D1(tree) => locate_intersecting_1d_as2d(tree, query_extents),
            SimplexRTree::D2(tree) => locate_intersecting_nd::<2>(tree, query_extents),
            SimplexRTree::D3(tree) => locate_intersecting_nd::<3>(tree, query_extents),
        }
    }
}

/// For D=2 or D=3: `extents = [mins..., maxs...]` (len = 2*D)
fn rectangle_from_extents_nd<const D: usize>(extents: &[f64]) -> Rectangle<[f64; D]> {
    assert!(
        extents.len() == 2 * D,
        "expected {} extents for dimension {}, got {}",
        2 * D,
        D,
        extents.len()
    );
    let (min_slice, max_slice) = extents.split_at(D);
    let mins: [f64; D] = min_slice.try_into().expect("min slice length mismatch");
    let maxs: [f64; D] = max_slice.try_into().expect("max slice length mismatch");
    Rectangle::from_corners(mins, maxs)
}

/// 1D embedded as 2D with y in [0,1]
fn rectangle_from_extents_1d_as2d(extents: &[f64]) -> Rectangle<[f64; 2]> {
    assert!(extents.len() == 2, "1D expects [min_x, max_x]");
    Rectangle::from_corners([extents[0], 0.0], [extents[1], 1.0])
}

/// A wrapper that holds an AABB rectangle and the owning simplex index.
type IndexedRect<const D: usize> = GeomWithData<Rectangle<[f64; D]>, usize>;

fn locate_intersecting_nd<const D: usize>(
    tree: &RTree<IndexedRect<D>>,
    query_extents: &[f64],
) -> Vec<usize> {
    let (min_slice, max_slice) = query_extents.split_at(D);
    let mins: [f64; D] = min_slice.try_into().expect("min slice length mismatch");
    let maxs: [f64; D] = max_slice.try_into().expect("max slice length mismatch");
    let envelope = AABB::from_corners(mins, maxs);
    tree.locate_in_envelope_intersecting(&envelope)
        .map(|item| item.data)
        .collect()
}

fn locate_intersecting_1d_as2d(tree: &RTree<Rect1As2>, query_extents: &[f64]) -> Vec<usize> {
    debug_assert_eq!(query_extents.len(), 2); // [min_x, max_x]
    let envelope = AABB::from_corners([query_extents[0], 0.0], [query_extents[1], 1.0]);
    tree.locate_in_envelope_intersecting(&envelope)
        .map(|item| item.data)
        .collect()
}

/// Build a SimplexRTree from an iterator over (simplex index, extents) where
/// `extents = [mins..., maxs...]` of length 2*dimensions.
/// For `dimensions == 1`, intervals are embedded as 2D rectangles with y in [0,1].
pub fn build_simplex_rtree<'a, I>(dimensions: usize, items: I) -> SimplexRTree
where
    I: IntoIterator<Item = (usize, &'a [f64])>,
{
    match dimensions {
        1 => {
            let rects = items
                .into_iter()
                .map(|(idx, ext)| {
                    let rect = rectangle_from_extents_1d_as2d(ext);
                    GeomWithData::new(rect, idx)
                })
                .collect::<Vec<_>>();
            SimplexRTree::D1(RTree::bulk_load(rects))
        }
        2 => {
            let rects = items
                .into_iter()
                .map(|(idx, ext)| {
                    let rect = rectangle_from_extents_nd::<2>(ext);
                    GeomWithData::new(rect, idx)
                })
                .collect::<Vec<_>>();
            SimplexRTree::D2(RTree::bulk_load(rects))
        }
        3 => {
            let rects = items
                .into_iter()
                .map(|(idx, ext)| {
                    let rect = rectangle_from_extents_nd::<3>(ext);
                    GeomWithData::new(rect, idx)
                })
                .collect::<Vec<_>>();
            SimplexRTree::D3(RTree::bulk_load(rects))
        }
        _ => panic!("Unsupported dimensions for SimplexRTree"),
    }
}
