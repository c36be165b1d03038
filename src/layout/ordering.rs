//! Crossing reduction by barycenter sweeps.

use super::layering::LayeredGraph;

/// Reorder every layer of `graph` to reduce edge crossings.
///
/// Runs `sweeps` down/up passes and returns the best ordering seen. Ties keep
/// their previous relative order, so the result depends only on the input.
pub(crate) fn order_layers(graph: &LayeredGraph, sweeps: usize) -> Vec<Vec<usize>> {
    let mut order = graph.layers.clone();
    let mut best = order.clone();
    let mut best_crossings = count_crossings(graph, &order);

    for _ in 0..sweeps {
        if best_crossings == 0 {
            break;
        }

        for layer in 1..order.len() {
            let (fixed, free) = order.split_at_mut(layer);
            sort_by_barycenter(&mut free[0], &fixed[layer - 1], &graph.preds);
        }
        for layer in (0..order.len().saturating_sub(1)).rev() {
            let (free, fixed) = order.split_at_mut(layer + 1);
            sort_by_barycenter(&mut free[layer], &fixed[0], &graph.succs);
        }

        let crossings = count_crossings(graph, &order);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = order.clone();
        }
    }

    best
}

fn sort_by_barycenter(free: &mut [usize], fixed: &[usize], neighbors: &[Vec<usize>]) {
    let mut slot = vec![None; neighbors.len()];
    for (i, &node) in fixed.iter().enumerate() {
        slot[node] = Some(i as f64);
    }

    let mut keyed: Vec<(f64, usize)> = free
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let positions: Vec<f64> = neighbors[node].iter().filter_map(|&n| slot[n]).collect();
            let key = if positions.is_empty() {
                i as f64
            } else {
                positions.iter().sum::<f64>() / positions.len() as f64
            };
            (key, node)
        })
        .collect();

    // Stable: equal keys keep their current order.
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (target, (_, node)) in free.iter_mut().zip(keyed) {
        *target = node;
    }
}

/// Number of pairwise segment crossings between adjacent layers.
pub(crate) fn count_crossings(graph: &LayeredGraph, order: &[Vec<usize>]) -> usize {
    let mut slot = vec![0usize; graph.layer_of.len()];
    for layer in order {
        for (i, &node) in layer.iter().enumerate() {
            slot[node] = i;
        }
    }

    let mut total = 0;
    for layer in order.iter().take(order.len().saturating_sub(1)) {
        let segments: Vec<(usize, usize)> = layer
            .iter()
            .flat_map(|&u| graph.succs[u].iter().map(move |&v| (u, v)))
            .map(|(u, v)| (slot[u], slot[v]))
            .collect();

        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untangles_crossed_pair() {
        // 0 -> 3, 1 -> 2: initial order crosses once.
        let graph = LayeredGraph::build(4, &[(0, 3), (1, 2)]);
        assert_eq!(count_crossings(&graph, &graph.layers), 1);
        let order = order_layers(&graph, 4);
        assert_eq!(count_crossings(&graph, &order), 0);
    }

    #[test]
    fn test_deterministic() {
        let arcs = [(0, 4), (1, 3), (2, 4), (0, 3), (1, 5), (2, 5)];
        let graph = LayeredGraph::build(6, &arcs);
        assert_eq!(order_layers(&graph, 4), order_layers(&graph, 4));
    }

    #[test]
    fn test_zero_sweeps_keeps_input_order() {
        let graph = LayeredGraph::build(4, &[(0, 3), (1, 2)]);
        assert_eq!(order_layers(&graph, 0), graph.layers);
    }
}
