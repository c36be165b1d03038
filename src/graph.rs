use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::extract::OUTPUT_ID;
use crate::layout::LayoutEngine;
use crate::model::{
    CalculationViewEntity, ColumnMapping, DataSourceEntity, LayoutShape, ParsedDocument, ViewKind,
};

/// Where the output node goes when the document has no shape for it.
pub const DEFAULT_OUTPUT_POSITION: Point = Point { x: 70.0, y: 60.0 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Rendered size in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// Shape size exactly as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeSize {
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeCategory {
    Table,
    Join,
    Aggregation,
    Projection,
    Union,
    Default,
    Output,
}

impl NodeCategory {
    pub fn for_view(kind: &ViewKind) -> Self {
        match kind {
            ViewKind::Join => Self::Join,
            ViewKind::Aggregation => Self::Aggregation,
            ViewKind::Projection => Self::Projection,
            ViewKind::Union => Self::Union,
            ViewKind::Rank | ViewKind::StarJoin | ViewKind::Semantics | ViewKind::Other(_) => {
                Self::Default
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "data")]
pub enum Payload {
    DataSource(DataSourceEntity),
    View(CalculationViewEntity),
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub category: NodeCategory,
    pub label: String,
    pub position: Point,
    /// `None` when the document had no shape for this node.
    pub size: Option<ShapeSize>,
    pub expanded: bool,
    /// Size reported by the renderer, if it has measured the node.
    pub measured: Option<Dimensions>,
    pub payload: Payload,
}

impl GraphNode {
    fn from_shape(
        id: &str,
        category: NodeCategory,
        label: String,
        shape: Option<&LayoutShape>,
        payload: Payload,
    ) -> Self {
        GraphNode {
            id: id.to_string(),
            category,
            label,
            position: shape.map_or(DEFAULT_OUTPUT_POSITION, |s| Point {
                x: s.x as f64,
                y: s.y as f64,
            }),
            size: shape.map(|s| ShapeSize {
                width: s.width.clone(),
                height: s.height.clone(),
            }),
            expanded: shape.is_none_or(|s| s.expanded),
            measured: None,
            payload,
        }
    }

    /// Text lines the node lists below its header.
    pub fn rows(&self) -> Vec<String> {
        match &self.payload {
            Payload::View(view) => view
                .attributes
                .iter()
                .map(|a| match &a.datatype {
                    Some(t) => format!("{} {}", a.id, t),
                    None => a.id.clone(),
                })
                .chain(view.inputs.iter().map(|i| format!("<- {}", i.source_id)))
                .collect(),
            Payload::DataSource(ds) => ds.schema_name.iter().cloned().collect(),
            Payload::Output => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub mappings: Vec<ColumnMapping>,
}

impl GraphEdge {
    fn new(source_id: &str, target_id: &str, mappings: Vec<ColumnMapping>) -> Self {
        GraphEdge {
            id: format!("{source_id}-{target_id}"),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            mappings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    /// Build the drawable graph of `doc`.
    ///
    /// Only entities owning a layout shape become nodes, and only arcs whose
    /// endpoints are both nodes become edges.
    pub fn build(doc: &ParsedDocument) -> Self {
        let shapes: HashMap<&str, &LayoutShape> = doc
            .layout_shapes
            .iter()
            .map(|s| (s.owner_id.as_str(), s))
            .collect();

        let mut nodes = Vec::new();
        let mut node_ids: HashSet<String> = HashSet::new();

        for ds in &doc.data_sources {
            let Some(&shape) = shapes.get(ds.id.as_str()) else {
                debug!(id = ds.id.as_str(); "Data source has no shape, not drawn");
                continue;
            };
            if !node_ids.insert(ds.id.clone()) {
                debug!(id = ds.id.as_str(); "Duplicate entity id skipped");
                continue;
            }
            let label = ds.object_name.clone().unwrap_or_else(|| ds.id.clone());
            nodes.push(GraphNode::from_shape(
                &ds.id,
                NodeCategory::Table,
                label,
                Some(shape),
                Payload::DataSource(ds.clone()),
            ));
        }

        let mut visible_views: Vec<&CalculationViewEntity> = Vec::new();
        for view in &doc.calculation_views {
            let Some(&shape) = shapes.get(view.id.as_str()) else {
                debug!(id = view.id.as_str(); "Calculation view has no shape, not drawn");
                continue;
            };
            if !node_ids.insert(view.id.clone()) {
                debug!(id = view.id.as_str(); "Duplicate entity id skipped");
                continue;
            }
            nodes.push(GraphNode::from_shape(
                &view.id,
                NodeCategory::for_view(&view.kind),
                view.id.clone(),
                Some(shape),
                Payload::View(view.clone()),
            ));
            visible_views.push(view);
        }

        let mut edges = Vec::new();

        for view in visible_views {
            for input in &view.inputs {
                if !node_ids.contains(&input.source_id) {
                    debug!(source = input.source_id.as_str(), target = view.id.as_str(); "External input not drawn");
                    continue;
                }
                edges.push(GraphEdge::new(
                    &input.source_id,
                    &view.id,
                    input.mapping.clone(),
                ));
            }
        }

        let mut has_output = false;
        for source_id in doc.outputs.iter().flat_map(|o| &o.source_ids) {
            if !node_ids.contains(source_id) {
                debug!(source = source_id.as_str(); "Output bound to an undrawn node");
                continue;
            }
            edges.push(GraphEdge::new(source_id, OUTPUT_ID, Vec::new()));
            if !has_output && node_ids.insert(OUTPUT_ID.to_string()) {
                has_output = true;
                nodes.push(GraphNode::from_shape(
                    OUTPUT_ID,
                    NodeCategory::Output,
                    OUTPUT_ID.to_string(),
                    shapes.get(OUTPUT_ID).copied(),
                    Payload::Output,
                ));
            }
        }

        Graph { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Move a node, e.g. after a drag. Returns `false` for unknown ids.
    pub fn set_position(&mut self, id: &str, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Record the renderer's measurement of a node.
    pub fn set_measured(&mut self, id: &str, size: Dimensions) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.measured = Some(size);
                true
            }
            None => false,
        }
    }

    pub fn positions(&self) -> HashMap<String, Point> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Sizes of the nodes that already had a shape in the source document.
    pub fn known_sizes(&self) -> HashMap<String, ShapeSize> {
        self.nodes
            .iter()
            .filter_map(|n| n.size.clone().map(|s| (n.id.clone(), s)))
            .collect()
    }

    /// Lay out all nodes, or only `focus` when given, writing positions in place.
    pub fn apply_layout(&mut self, engine: &LayoutEngine, focus: Option<&HashSet<String>>) {
        let positions = engine.positions(&self.nodes, &self.edges, focus);
        for node in &mut self.nodes {
            if let Some(p) = positions.get(&node.id) {
                node.position = *p;
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
