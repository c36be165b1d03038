//! Typed records extracted from a calculation view document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub id: String,
    pub description: Option<String>,
    pub data_sources: Vec<DataSourceEntity>,
    pub calculation_views: Vec<CalculationViewEntity>,
    pub layout_shapes: Vec<LayoutShape>,
    pub outputs: Vec<OutputBinding>,
}

/// A physical table (or foreign view) feeding the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceEntity {
    pub id: String,
    pub kind: String,
    pub schema_name: Option<String>,
    pub object_name: Option<String>,
    pub resource_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewAttribute {
    pub id: String,
    pub datatype: Option<String>,
    pub length: Option<String>,
    pub is_calculated: bool,
    /// Carried verbatim, never interpreted.
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Text,
}

impl JoinType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inner" => Some(Self::Inner),
            "leftOuter" => Some(Self::LeftOuter),
            "rightOuter" => Some(Self::RightOuter),
            "fullOuter" => Some(Self::FullOuter),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::LeftOuter => "leftOuter",
            Self::RightOuter => "rightOuter",
            Self::FullOuter => "fullOuter",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Projection,
    Join,
    Aggregation,
    Union,
    Rank,
    StarJoin,
    Semantics,
    /// A type this crate does not know; rendered with the default category.
    Other(String),
}

impl ViewKind {
    /// Map an `xsi:type` value such as `Calculation:JoinView`.
    pub fn from_xsi_type(xsi_type: &str) -> Self {
        let name = xsi_type.strip_prefix("Calculation:").unwrap_or(xsi_type);
        match name {
            "ProjectionView" => Self::Projection,
            "JoinView" => Self::Join,
            "AggregationView" => Self::Aggregation,
            "UnionView" => Self::Union,
            "RankView" => Self::Rank,
            "StarJoinView" => Self::StarJoin,
            "Semantics" => Self::Semantics,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub target: String,
    pub source: String,
}

/// Lineage reference from an upstream entity into a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRef {
    pub source_id: String,
    pub mapping: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationViewEntity {
    pub id: String,
    pub kind: ViewKind,
    /// Plain attributes first, then calculated ones, each in source order.
    pub attributes: Vec<ViewAttribute>,
    pub inputs: Vec<InputRef>,
    pub join_type: Option<JoinType>,
    pub comment: Option<String>,
    pub filter: Option<String>,
}

/// Persisted canvas position of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutShape {
    pub owner_id: String,
    pub namespace: Option<String>,
    pub x: i64,
    pub y: i64,
    pub expanded: bool,
    /// Opaque, round-tripped verbatim.
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBinding {
    /// Ids bound to the output, in source order.
    pub source_ids: Vec<String>,
}
