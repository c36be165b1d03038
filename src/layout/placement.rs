//! Coordinate assignment for ordered layers.

use super::engine::RankDir;
use super::layering::LayeredGraph;

/// Spacing parameters for [`place_nodes`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Spacing {
    pub node_gap: f64,
    pub layer_gap: f64,
    pub margin: f64,
    pub align_passes: usize,
    pub rank_dir: RankDir,
}

/// Top-left corner of every real node.
///
/// `sizes` holds `(width, height)` of the real nodes; waypoints take no room
/// beyond half a node gap on each side.
pub(crate) fn place_nodes(
    graph: &LayeredGraph,
    order: &[Vec<usize>],
    sizes: &[(f64, f64)],
    spacing: &Spacing,
) -> Vec<(f64, f64)> {
    let width = |n: usize| if graph.is_virtual(n) { 0.0 } else { sizes[n].0 };
    let height = |n: usize| if graph.is_virtual(n) { 0.0 } else { sizes[n].1 };
    let separation = |a: usize, b: usize| {
        let gap = if graph.is_virtual(a) || graph.is_virtual(b) {
            spacing.node_gap / 2.0
        } else {
            spacing.node_gap
        };
        (width(a) + width(b)) / 2.0 + gap
    };

    // Phase 1: pack each layer left to right
    let mut center = vec![0.0; graph.layer_of.len()];
    for layer in order {
        let mut x = 0.0;
        for (i, &node) in layer.iter().enumerate() {
            if i > 0 {
                x += separation(layer[i - 1], node);
            }
            center[node] = x;
        }
    }

    // Phase 2: pull nodes toward their neighbors, alternating direction
    for pass in 0..spacing.align_passes {
        let downward = pass % 2 == 0;
        let layer_indices: Vec<usize> = if downward {
            (1..order.len()).collect()
        } else {
            (0..order.len().saturating_sub(1)).rev().collect()
        };
        for layer in layer_indices {
            let nodes = &order[layer];
            let desired: Vec<f64> = nodes
                .iter()
                .map(|&n| {
                    let neighbors = if downward { &graph.preds[n] } else { &graph.succs[n] };
                    if neighbors.is_empty() {
                        center[n]
                    } else {
                        neighbors.iter().map(|&m| center[m]).sum::<f64>() / neighbors.len() as f64
                    }
                })
                .collect();
            let resolved = resolve_overlaps(nodes, &desired, &separation);
            for (&n, c) in nodes.iter().zip(resolved) {
                center[n] = c;
            }
        }
    }

    // Phase 3: layer coordinates along the rank axis
    let layer_height: Vec<f64> = order
        .iter()
        .map(|layer| layer.iter().map(|&n| height(n)).fold(0.0, f64::max))
        .collect();
    let mut layer_top = vec![0.0; order.len()];
    let mut y = spacing.margin;
    let stacking: Vec<usize> = match spacing.rank_dir {
        RankDir::TopToBottom => (0..order.len()).collect(),
        RankDir::BottomToTop => (0..order.len()).rev().collect(),
    };
    for layer in stacking {
        layer_top[layer] = y;
        y += layer_height[layer] + spacing.layer_gap;
    }

    // Phase 4: shift so the leftmost real node starts at the margin
    let min_left = (0..graph.real_count)
        .map(|n| center[n] - width(n) / 2.0)
        .fold(f64::INFINITY, f64::min);
    let shift = if min_left.is_finite() {
        spacing.margin - min_left
    } else {
        0.0
    };

    (0..graph.real_count)
        .map(|n| {
            let layer = graph.layer_of[n];
            let x = center[n] - width(n) / 2.0 + shift;
            let y = layer_top[layer] + (layer_height[layer] - height(n)) / 2.0;
            (x, y)
        })
        .collect()
}

/// Closest centers to `desired` that keep neighbors in `nodes` apart.
///
/// Averages a left-anchored and a right-anchored packing; both honor the
/// separations, so their mean does too.
fn resolve_overlaps(
    nodes: &[usize],
    desired: &[f64],
    separation: &impl Fn(usize, usize) -> f64,
) -> Vec<f64> {
    let count = nodes.len();
    let mut left = desired.to_vec();
    for i in 1..count {
        left[i] = left[i].max(left[i - 1] + separation(nodes[i - 1], nodes[i]));
    }
    let mut right = desired.to_vec();
    for i in (0..count.saturating_sub(1)).rev() {
        right[i] = right[i].min(right[i + 1] - separation(nodes[i], nodes[i + 1]));
    }
    left.iter().zip(&right).map(|(l, r)| (l + r) / 2.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spacing(rank_dir: RankDir) -> Spacing {
        Spacing {
            node_gap: 60.0,
            layer_gap: 80.0,
            margin: 40.0,
            align_passes: 4,
            rank_dir,
        }
    }

    #[test]
    fn test_same_layer_nodes_do_not_overlap() {
        let graph = LayeredGraph::build(3, &[(0, 2), (1, 2)]);
        let sizes = [(100.0, 50.0), (150.0, 50.0), (120.0, 50.0)];
        let pos = place_nodes(&graph, &graph.layers, &sizes, &spacing(RankDir::TopToBottom));
        let (a, b) = (pos[0], pos[1]);
        assert!(a.0 + 100.0 + 60.0 <= b.0 + 1e-9);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_rank_direction() {
        let graph = LayeredGraph::build(2, &[(0, 1)]);
        let sizes = [(100.0, 50.0), (100.0, 70.0)];

        let down = place_nodes(&graph, &graph.layers, &sizes, &spacing(RankDir::TopToBottom));
        assert_eq!(down[0].1, 40.0);
        assert_eq!(down[1].1, 40.0 + 50.0 + 80.0);

        let up = place_nodes(&graph, &graph.layers, &sizes, &spacing(RankDir::BottomToTop));
        assert_eq!(up[1].1, 40.0);
        assert_eq!(up[0].1, 40.0 + 70.0 + 80.0);
    }

    #[test]
    fn test_leftmost_node_at_margin() {
        let graph = LayeredGraph::build(3, &[(0, 2), (1, 2)]);
        let sizes = [(100.0, 50.0); 3];
        let pos = place_nodes(&graph, &graph.layers, &sizes, &spacing(RankDir::TopToBottom));
        let min_x = pos.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        assert!((min_x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_child_centered_under_parents() {
        let graph = LayeredGraph::build(3, &[(0, 2), (1, 2)]);
        let sizes = [(100.0, 50.0); 3];
        let pos = place_nodes(&graph, &graph.layers, &sizes, &spacing(RankDir::TopToBottom));
        let parents_mid = (pos[0].0 + pos[1].0) / 2.0;
        assert!((pos[2].0 - parents_mid).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_overlaps_keeps_separation() {
        let nodes = [0, 1, 2];
        let resolved = resolve_overlaps(&nodes, &[0.0, 0.0, 0.0], &|_, _| 10.0);
        assert_eq!(resolved, [-10.0, 0.0, 10.0]);
    }
}
