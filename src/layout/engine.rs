//! Layout engine core implementation.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Deserialize;

use crate::config::LayoutConfig;
use crate::graph::{GraphEdge, GraphNode, Point};
use crate::measure::TextMetrics;

use super::layering::LayeredGraph;
use super::ordering::order_layers;
use super::placement::{Spacing, place_nodes};

/// Direction edges flow along the rank axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankDir {
    /// Sources at the bottom, output at the top.
    #[default]
    BottomToTop,
    TopToBottom,
}

/// Layout engine configuration and computation.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    pub(crate) metrics: TextMetrics,
    pub(crate) rank_dir: RankDir,
    pub(crate) node_gap: f64,
    pub(crate) layer_gap: f64,
    pub(crate) margin: f64,
    pub(crate) sweeps: usize,
    pub(crate) align_passes: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            metrics: config.metrics.clone(),
            rank_dir: config.rank_dir,
            node_gap: config.node_gap,
            layer_gap: config.layer_gap,
            margin: config.margin,
            sweeps: config.sweeps,
            align_passes: config.align_passes,
        }
    }

    /// Size used for layout: the renderer's measurement, else an estimate
    /// from the label and listed rows.
    pub fn node_size(&self, node: &GraphNode) -> (f64, f64) {
        match node.measured {
            Some(m) => (m.width, m.height),
            None => self.metrics.node_size(&node.label, &node.rows()),
        }
    }

    /// Compute new top-left positions.
    ///
    /// With no `focus` (or an empty one) every node is placed. Otherwise only
    /// the focused nodes are, using the edges among them, and the result is
    /// moved so its bounding box keeps the center the focused nodes had
    /// before. Only the placed nodes appear in the returned map.
    pub fn positions(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        focus: Option<&HashSet<String>>,
    ) -> HashMap<String, Point> {
        let focus = focus.filter(|f| !f.is_empty());
        let members: Vec<&GraphNode> = nodes
            .iter()
            .filter(|n| focus.is_none_or(|f| f.contains(&n.id)))
            .collect();
        if members.is_empty() {
            return HashMap::new();
        }

        // Phase 1: index members and collect the arcs among them
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, node) in members.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }
        let arcs: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|e| {
                let source = *index.get(e.source_id.as_str())?;
                let target = *index.get(e.target_id.as_str())?;
                (source != target).then_some((source, target))
            })
            .collect();
        let sizes: Vec<(f64, f64)> = members.iter().map(|n| self.node_size(n)).collect();

        // Phase 2: layering
        let layered = LayeredGraph::build(members.len(), &arcs);

        // Phase 3: crossing reduction
        let order = order_layers(&layered, self.sweeps);

        // Phase 4: coordinates
        let spacing = Spacing {
            node_gap: self.node_gap,
            layer_gap: self.layer_gap,
            margin: self.margin,
            align_passes: self.align_passes,
            rank_dir: self.rank_dir,
        };
        let mut placed = place_nodes(&layered, &order, &sizes, &spacing);

        // Phase 5: keep a selection where it was
        if focus.is_some() {
            let before: Vec<(f64, f64)> = members.iter().map(|n| (n.position.x, n.position.y)).collect();
            let (bx, by) = bounding_center(&before, &sizes);
            let (ax, ay) = bounding_center(&placed, &sizes);
            let (dx, dy) = (bx - ax, by - ay);
            for p in &mut placed {
                p.0 += dx;
                p.1 += dy;
            }
        }

        debug!(
            nodes = members.len(),
            arcs = arcs.len(),
            layers = order.len(),
            scoped = focus.is_some();
            "Layout computed"
        );

        members
            .iter()
            .zip(placed)
            .map(|(node, (x, y))| (node.id.clone(), Point { x, y }))
            .collect()
    }

    /// Copy of `nodes` with positions from [`LayoutEngine::positions`].
    /// Nodes outside `focus` come back unchanged.
    pub fn layout(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        focus: Option<&HashSet<String>>,
    ) -> Vec<GraphNode> {
        let positions = self.positions(nodes, edges, focus);
        nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                if let Some(p) = positions.get(&node.id) {
                    node.position = *p;
                }
                node
            })
            .collect()
    }
}

/// Center of the box enclosing rectangles at `corners` with `sizes`.
fn bounding_center(corners: &[(f64, f64)], sizes: &[(f64, f64)]) -> (f64, f64) {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (&(x, y), &(w, h)) in corners.iter().zip(sizes) {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x + w), max.1.max(y + h));
    }
    ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0)
}
