pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod graph;
pub mod layout;
pub mod measure;
pub mod model;
pub mod patch;
pub mod raw;

use std::collections::HashSet;

use wasm_bindgen::prelude::*;

pub use document::Document;
pub use error::CalcViewError;
pub use graph::Graph;
pub use layout::LayoutEngine;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Parse a calculation view document into its drawable graph (JSON).
#[wasm_bindgen(js_name = "parseCalculationView")]
pub fn parse_calculation_view(xml: &str) -> Result<String, String> {
    let document = Document::load(xml).map_err(|e| e.to_string())?;
    document.graph().to_json().map_err(|e| e.to_string())
}

/// Lay out a graph (JSON), optionally only the `selected` node ids.
#[wasm_bindgen(js_name = "autoLayout")]
pub fn auto_layout(graph_json: &str, selected: Option<js_sys::Array>) -> Result<String, String> {
    let focus: Option<HashSet<String>> =
        selected.map(|ids| ids.iter().filter_map(|id| id.as_string()).collect());
    relayout_json(graph_json, focus.as_ref()).map_err(|e| e.to_string())
}

/// Write the graph's (JSON) positions into the original document text.
#[wasm_bindgen(js_name = "exportToXml")]
pub fn export_to_xml(original_xml: &str, graph_json: &str) -> Result<String, String> {
    save_json(original_xml, graph_json).map_err(|e| e.to_string())
}

fn relayout_json(graph_json: &str, focus: Option<&HashSet<String>>) -> Result<String, CalcViewError> {
    let mut graph = Graph::from_json(graph_json)?;
    graph.apply_layout(&LayoutEngine::default(), focus);
    Ok(graph.to_json()?)
}

fn save_json(original_xml: &str, graph_json: &str) -> Result<String, CalcViewError> {
    let graph = Graph::from_json(graph_json)?;
    Ok(patch::patch(original_xml, &graph.nodes, &graph.known_sizes())?)
}
