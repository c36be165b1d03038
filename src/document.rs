//! A loaded document: its original text plus the graph drawn from it.

use std::collections::HashSet;

use log::debug;

use crate::error::CalcViewError;
use crate::extract::extract;
use crate::graph::Graph;
use crate::layout::LayoutEngine;
use crate::model::ParsedDocument;
use crate::patch::patch;

/// The original text stays authoritative; saving splices the current
/// positions into it and leaves the rest untouched.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    parsed: ParsedDocument,
    graph: Graph,
}

impl Document {
    pub fn load(source: impl Into<String>) -> Result<Self, CalcViewError> {
        let source = source.into();
        let parsed = extract(&source)?;
        let graph = Graph::build(&parsed);
        debug!(
            id = parsed.id.as_str(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len();
            "Document loaded"
        );
        Ok(Self {
            source,
            parsed,
            graph,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parsed(&self) -> &ParsedDocument {
        &self.parsed
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Positions and measurements are the only things meant to change here.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn auto_layout(&mut self, engine: &LayoutEngine, focus: Option<&HashSet<String>>) {
        self.graph.apply_layout(engine, focus);
    }

    /// The original text with its canvas layout replaced by current positions.
    pub fn save(&self) -> Result<String, CalcViewError> {
        Ok(patch(&self.source, &self.graph.nodes, &self.graph.known_sizes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Point;

    const XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Calculation:scenario xmlns:Calculation="http://www.sap.com/ndb/BiModelCalculation.ecore" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="V">
  <dataSources><DataSource id="T" type="DATA_BASE_TABLE"/></dataSources>
  <calculationViews>
    <calculationView xsi:type="Calculation:ProjectionView" id="P"><input node="#T"/></calculationView>
  </calculationViews>
  <outputs><output><input node="#P"/></output></outputs>
</Calculation:scenario>"##;

    #[test]
    fn test_document_without_layout_has_no_entities_drawn() {
        let doc = Document::load(XML).unwrap();
        assert!(doc.graph().nodes.is_empty());
        assert_eq!(doc.parsed().calculation_views.len(), 1);
    }

    #[test]
    fn test_save_rewrites_layout_and_reloads() {
        let xml = XML.replace(
            "</Calculation:scenario>",
            "<layout><shapes><shape modelObjectName=\"P\"/><shape modelObjectName=\"T\"/></shapes></layout>\n</Calculation:scenario>",
        );
        let mut doc = Document::load(xml).unwrap();
        doc.auto_layout(&LayoutEngine::default(), None);
        assert!(doc.graph_mut().set_position("Output", Point { x: 1.4, y: 2.6 }));

        let saved = doc.save().unwrap();
        let reloaded = Document::load(saved).unwrap();
        let output = reloaded.graph().node("Output").unwrap();
        assert_eq!(output.position, Point { x: 1.0, y: 3.0 });
        assert_eq!(reloaded.graph().nodes.len(), 3);
    }

    #[test]
    fn test_save_keeps_nested_layout() {
        let private = "<privateDataFoundation>\n    <layout>\n      <shapes>\n        <shape modelObjectName=\"T\"><upperLeftCorner x=\"1\" y=\"1\"/></shape>\n      </shapes>\n    </layout>\n  </privateDataFoundation>";
        let xml = XML.replace("<outputs>", &format!("{private}\n  <outputs>"));
        let doc = Document::load(xml.as_str()).unwrap();
        assert!(doc.parsed().layout_shapes.is_empty());

        let saved = doc.save().unwrap();
        assert!(saved.contains(private));
        assert!(saved.ends_with("  </layout>\n</Calculation:scenario>"));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            Document::load("<scenario/>"),
            Err(CalcViewError::Extract(_))
        ));
    }
}
