//! Layered auto-layout of the lineage graph.
//!
//! Edges run from data sources toward the output. Layers are assigned by
//! longest path, crossings are reduced with barycenter sweeps, and nodes are
//! packed per layer. A selection can be laid out on its own; it is then moved
//! back so the rest of the canvas is undisturbed.

mod engine;
mod layering;
mod ordering;
mod placement;

pub use engine::{LayoutEngine, RankDir};
