//! Layer assignment and virtual node insertion.

use std::collections::VecDeque;

use log::warn;

/// Nodes split into layers, with multi-layer arcs broken into unit segments.
///
/// Indices below `real_count` are the caller's nodes; the rest are virtual
/// waypoints of long arcs.
#[derive(Debug, Clone)]
pub(crate) struct LayeredGraph {
    pub real_count: usize,
    pub layer_of: Vec<usize>,
    /// Node indices per layer, in their initial order.
    pub layers: Vec<Vec<usize>>,
    pub preds: Vec<Vec<usize>>,
    pub succs: Vec<Vec<usize>>,
}

impl LayeredGraph {
    pub fn is_virtual(&self, node: usize) -> bool {
        node >= self.real_count
    }

    pub fn build(node_count: usize, arcs: &[(usize, usize)]) -> Self {
        let layer_of = assign_layers(node_count, arcs);
        let layer_count = layer_of.iter().max().map_or(0, |l| l + 1);

        let mut graph = LayeredGraph {
            real_count: node_count,
            layers: vec![Vec::new(); layer_count],
            preds: vec![Vec::new(); node_count],
            succs: vec![Vec::new(); node_count],
            layer_of,
        };
        for node in 0..node_count {
            graph.layers[graph.layer_of[node]].push(node);
        }

        for &(source, target) in arcs {
            let (from, to) = (graph.layer_of[source], graph.layer_of[target]);
            // Arcs closing a cycle point the wrong way; they do not take part.
            if to <= from {
                continue;
            }
            let mut prev = source;
            for layer in from + 1..to {
                let waypoint = graph.layer_of.len();
                graph.layer_of.push(layer);
                graph.preds.push(Vec::new());
                graph.succs.push(Vec::new());
                graph.layers[layer].push(waypoint);
                graph.link(prev, waypoint);
                prev = waypoint;
            }
            graph.link(prev, target);
        }

        graph
    }

    fn link(&mut self, from: usize, to: usize) {
        self.succs[from].push(to);
        self.preds[to].push(from);
    }
}

/// Longest-path layering from the sources, then every source is pulled up to
/// sit right below its nearest consumer.
///
/// Every arc ends up pointing to a strictly higher layer unless it closes a
/// cycle. Cyclic leftovers are placed one layer past their settled
/// predecessors, in index order.
pub(crate) fn assign_layers(node_count: usize, arcs: &[(usize, usize)]) -> Vec<usize> {
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];
    for &(source, target) in arcs {
        if source == target {
            continue;
        }
        succs[source].push(target);
        in_degree[target] += 1;
    }

    let is_source: Vec<bool> = in_degree.iter().map(|&d| d == 0).collect();
    let mut layer = vec![0usize; node_count];
    let mut settled = vec![false; node_count];
    let mut remaining = in_degree.clone();
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&n| remaining[n] == 0).collect();
    for &n in &queue {
        settled[n] = true;
    }

    let mut settled_count = 0;
    let mut broke_cycle = false;
    while settled_count < node_count {
        let Some(node) = queue.pop_front().or_else(|| {
            // Only a cycle can stall the queue.
            broke_cycle = true;
            let forced = (0..node_count).find(|&n| !settled[n])?;
            settled[forced] = true;
            Some(forced)
        }) else {
            break;
        };
        settled_count += 1;

        for &next in &succs[node] {
            if settled[next] {
                continue;
            }
            layer[next] = layer[next].max(layer[node] + 1);
            remaining[next] -= 1;
            if remaining[next] == 0 {
                settled[next] = true;
                queue.push_back(next);
            }
        }
    }

    if broke_cycle {
        warn!(nodes = node_count; "Lineage contains a cycle; some arcs are ignored for layering");
    }

    for node in 0..node_count {
        if !is_source[node] {
            continue;
        }
        if let Some(nearest) = succs[node].iter().map(|&s| layer[s]).min() {
            layer[node] = nearest - 1;
        }
    }

    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        assert_eq!(assign_layers(3, &[(0, 1), (1, 2)]), [0, 1, 2]);
    }

    #[test]
    fn test_sources_pulled_up() {
        // 0 -> 1 -> 2 and 3 -> 2: node 3 sits right below 2.
        let layers = assign_layers(4, &[(0, 1), (1, 2), (3, 2)]);
        assert_eq!(layers, [0, 1, 2, 1]);
    }

    #[test]
    fn test_isolated_nodes_stay_on_first_layer() {
        assert_eq!(assign_layers(2, &[]), [0, 0]);
    }

    #[test]
    fn test_cycle_terminates() {
        let layers = assign_layers(3, &[(0, 1), (1, 2), (2, 1)]);
        assert_eq!(layers.len(), 3);
        assert!(layers[1] > layers[0]);
    }

    #[test]
    fn test_long_arc_gets_waypoints() {
        let graph = LayeredGraph::build(3, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(graph.layers.len(), 3);
        // One waypoint on layer 1 for the 0 -> 2 arc.
        assert_eq!(graph.layer_of.len(), 4);
        assert!(graph.is_virtual(3));
        assert_eq!(graph.layer_of[3], 1);
        assert_eq!(graph.succs[0], [1, 3]);
        assert_eq!(graph.preds[2], [1, 3]);
    }
}
