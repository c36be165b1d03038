//! Write node positions back into the original document text.
//!
//! Only the canvas layout block is regenerated. Everything else is copied
//! through byte for byte; the document is never re-serialized from the tree.

use std::collections::HashMap;
use std::ops::Range;

use crate::graph::{GraphNode, NodeCategory, ShapeSize};
use crate::raw::qualified;

const LAYOUT_TAG: &str = "layout";
const ROOT_CLOSE: &str = "</Calculation:scenario>";

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] roxmltree::Error),
    #[error("No layout block and no closing </Calculation:scenario> tag to insert one before")]
    StructuralAnchorMissing,
}

/// Replace the document's canvas layout with one shape per node.
///
/// The canvas block is the root's last direct `layout` child, the same one
/// extraction reads shapes from; `layout` elements nested in other sections
/// are left alone. Without a canvas block, a new one is inserted before the
/// closing root tag.
///
/// Sizes come from `known_sizes` for nodes that had a shape before; other
/// nodes get `"0"`.
pub fn patch(
    original: &str,
    nodes: &[GraphNode],
    known_sizes: &HashMap<String, ShapeSize>,
) -> Result<String, PatchError> {
    let block = layout_block(nodes, known_sizes);

    let (canvas, root_end) = {
        let doc = roxmltree::Document::parse(original)?;
        let root = doc.root_element();
        (canvas_span(root), root.range().end)
    };

    if let Some(span) = canvas {
        let mut output = String::with_capacity(original.len() + block.len());
        output.push_str(&original[..span.start]);
        output.push_str(&block);
        output.push_str(&original[span.end..]);
        return Ok(output);
    }

    let anchor = original[..root_end]
        .rfind(ROOT_CLOSE)
        .ok_or(PatchError::StructuralAnchorMissing)?;
    let mut output = String::with_capacity(original.len() + block.len() + 3);
    output.push_str(&original[..anchor]);
    output.push_str("  ");
    output.push_str(&block);
    output.push('\n');
    output.push_str(&original[anchor..]);
    Ok(output)
}

/// Byte span of the root's last `layout` child, start tag through end tag.
fn canvas_span(root: roxmltree::Node<'_, '_>) -> Option<Range<usize>> {
    root.children()
        .rev()
        .find(|n| {
            n.is_element()
                && qualified(*n, n.tag_name().namespace(), n.tag_name().name()) == LAYOUT_TAG
        })
        .map(|n| n.range())
}

/// The `<layout>...</layout>` element, without leading indentation.
fn layout_block(nodes: &[GraphNode], known_sizes: &HashMap<String, ShapeSize>) -> String {
    let mut output = String::from("<layout>\n    <shapes>\n");

    for node in nodes {
        let (width, height) = known_sizes
            .get(&node.id)
            .map_or(("0", "0"), |s| (s.width.as_str(), s.height.as_str()));

        output.push_str(&format!(
            "      <shape expanded=\"{}\" modelObjectName=\"{}\" modelObjectNameSpace=\"{}\">\n",
            node.expanded,
            escape(&node.id),
            namespace(node.category)
        ));
        output.push_str(&format!(
            "        <upperLeftCorner x=\"{}\" y=\"{}\"/>\n",
            node.position.x.round() as i64,
            node.position.y.round() as i64
        ));
        output.push_str(&format!(
            "        <rectangleSize height=\"{}\" width=\"{}\"/>\n",
            escape(height),
            escape(width)
        ));
        output.push_str("      </shape>\n");
    }

    output.push_str("    </shapes>\n  </layout>");
    output
}

fn namespace(category: NodeCategory) -> &'static str {
    match category {
        NodeCategory::Table => "DataSource",
        NodeCategory::Output => "MeasureGroup",
        _ => "CalculationView",
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
