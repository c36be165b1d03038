//! Projection of the raw element tree into typed domain records.

use log::debug;

use crate::model::*;
use crate::raw::RawRecord;

/// Qualified name of the dialect's root container.
pub const ROOT_TAG: &str = "Calculation:scenario";

/// Id of the synthetic terminal node fed by output bindings.
pub const OUTPUT_ID: &str = "Output";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] roxmltree::Error),
    #[error("Not a calculation view document: expected <Calculation:scenario> root, found <{found}>")]
    MalformedDocument { found: String },
}

/// Parse `xml` into a [`ParsedDocument`].
pub fn extract(xml: &str) -> Result<ParsedDocument, ExtractError> {
    let root = RawRecord::parse(xml)?;
    from_record(&root)
}

/// Project an already parsed tree.
pub fn from_record(root: &RawRecord) -> Result<ParsedDocument, ExtractError> {
    if root.tag != ROOT_TAG {
        return Err(ExtractError::MalformedDocument {
            found: root.tag.clone(),
        });
    }

    let data_sources = root
        .many(&["dataSources", "DataSource"])
        .into_iter()
        .map(data_source)
        .collect();

    let mut calculation_views: Vec<CalculationViewEntity> = root
        .many(&["calculationViews", "calculationView"])
        .into_iter()
        .map(|r| {
            let kind = ViewKind::from_xsi_type(r.attr("xsi:type").unwrap_or_default());
            view_entity(
                r,
                kind,
                &[&["viewAttributes", "viewAttribute"]],
                &[&["calculatedViewAttributes", "calculatedViewAttribute"]],
            )
        })
        .collect();

    // The output-facing logical model always renders as an aggregation.
    if let Some(logical) = root.child("logicalModel") {
        calculation_views.push(view_entity(
            logical,
            ViewKind::Aggregation,
            &[&["attributes", "attribute"], &["baseMeasures", "measure"]],
            &[
                &["calculatedAttributes", "calculatedAttribute"],
                &["calculatedViewAttributes", "calculatedViewAttribute"],
            ],
        ));
    }

    // An earlier `layout` may sit inside an unrelated section; only the
    // root's own (last) one describes the canvas.
    let layout_shapes = root
        .last_child("layout")
        .map(|layout| {
            layout
                .many(&["shapes", "shape"])
                .into_iter()
                .filter_map(layout_shape)
                .collect()
        })
        .unwrap_or_default();

    let outputs = root
        .many(&["outputs", "output"])
        .into_iter()
        .map(|o| OutputBinding {
            source_ids: o
                .many(&["input"])
                .into_iter()
                .filter_map(|i| node_ref(i.attr("node")))
                .collect(),
        })
        .collect();

    let description = root
        .child("descriptions")
        .and_then(|d| d.attr("defaultDescription"))
        .map(str::to_string);

    Ok(ParsedDocument {
        id: root.attr("id").unwrap_or_default().to_string(),
        description,
        data_sources,
        calculation_views,
        layout_shapes,
        outputs,
    })
}

fn data_source(r: &RawRecord) -> DataSourceEntity {
    let column_object = r.child("columnObject");
    let lookup = |name: &str| {
        r.attr(name)
            .or_else(|| column_object.and_then(|c| c.attr(name)))
            .map(str::to_string)
    };

    DataSourceEntity {
        id: r.attr("id").unwrap_or_default().to_string(),
        kind: r.attr("type").unwrap_or_default().to_string(),
        schema_name: lookup("schemaName"),
        object_name: lookup("columnObjectName"),
        resource_uri: r
            .child("resourceUri")
            .and_then(|u| u.text.clone())
            .or_else(|| r.attr("resourceUri").map(str::to_string)),
    }
}

fn view_entity(
    r: &RawRecord,
    kind: ViewKind,
    plain_paths: &[&[&str]],
    calculated_paths: &[&[&str]],
) -> CalculationViewEntity {
    let plain = plain_paths
        .iter()
        .flat_map(|path| r.many(path))
        .map(|a| view_attribute(a, false));
    let calculated = calculated_paths
        .iter()
        .flat_map(|path| r.many(path))
        .map(|a| view_attribute(a, true));

    let id = r.attr("id").unwrap_or_default().to_string();

    let join_type = r.attr("joinType").and_then(|j| {
        let parsed = JoinType::from_str(j);
        if parsed.is_none() {
            debug!(view = id.as_str(), join_type = j; "Unknown join type ignored");
        }
        parsed
    });

    let comment = r
        .child("comment")
        .and_then(|c| c.attr("text").map(str::to_string).or_else(|| c.text.clone()));

    CalculationViewEntity {
        attributes: plain.chain(calculated).collect(),
        inputs: r.many(&["input"]).into_iter().filter_map(input_ref).collect(),
        join_type,
        comment,
        filter: r.child("filter").and_then(|f| f.text.clone()),
        id,
        kind,
    }
}

fn view_attribute(r: &RawRecord, is_calculated: bool) -> ViewAttribute {
    let formula = if is_calculated {
        r.attr("formula")
            .map(str::to_string)
            .or_else(|| r.child("formula").and_then(|f| f.text.clone()))
            .or_else(|| r.text.clone())
    } else {
        None
    };

    ViewAttribute {
        id: r.attr("id").unwrap_or_default().to_string(),
        datatype: r.attr("datatype").map(str::to_string),
        length: r.attr("length").map(str::to_string),
        is_calculated,
        formula,
    }
}

fn input_ref(r: &RawRecord) -> Option<InputRef> {
    let Some(source_id) = node_ref(r.attr("node")) else {
        debug!("Input without a node reference dropped");
        return None;
    };

    let mapping = r
        .many(&["mapping"])
        .into_iter()
        .map(|m| ColumnMapping {
            target: m.attr("target").unwrap_or_default().to_string(),
            source: m.attr("source").unwrap_or_default().to_string(),
        })
        .collect();

    Some(InputRef { source_id, mapping })
}

/// `#Projection_1` -> `Projection_1`; missing or empty references yield `None`.
fn node_ref(node: Option<&str>) -> Option<String> {
    let id = node?;
    let id = id.strip_prefix('#').unwrap_or(id);
    (!id.is_empty()).then(|| id.to_string())
}

fn layout_shape(r: &RawRecord) -> Option<LayoutShape> {
    let owner_id = r.attr("modelObjectName")?.to_string();
    let corner = r.child("upperLeftCorner");
    let size = r.child("rectangleSize");
    let coord = |name: &str| corner.and_then(|c| c.attr(name)).map_or(0, parse_int_prefix);
    let dim = |name: &str| {
        size.and_then(|s| s.attr(name))
            .unwrap_or("0")
            .to_string()
    };

    Some(LayoutShape {
        owner_id,
        namespace: r.attr("modelObjectNameSpace").map(str::to_string),
        x: coord("x"),
        y: coord("y"),
        expanded: r.attr("expanded") == Some("true"),
        width: dim("width"),
        height: dim("height"),
    })
}

/// Leading integer of `s` (`"12.7"` -> 12, `"abc"` -> 0).
fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim();
    let digits_start = usize::from(s.starts_with(['-', '+']));
    let end = s[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + digits_start);
    s[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Calculation:scenario xmlns:Calculation="http://www.sap.com/ndb/BiModelCalculation.ecore" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="SALES">
{body}
</Calculation:scenario>"#
        )
    }

    #[test]
    fn test_rejects_foreign_root() {
        let err = extract("<scenario id=\"x\"/>").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedDocument { found } if found == "scenario"));
    }

    #[test]
    fn test_rejects_broken_xml() {
        assert!(matches!(extract("<Calculation:scenario"), Err(ExtractError::Syntax(_))));
    }

    #[test]
    fn test_empty_document() {
        let parsed = extract(&doc("")).unwrap();
        assert_eq!(parsed.id, "SALES");
        assert!(parsed.data_sources.is_empty());
        assert!(parsed.calculation_views.is_empty());
        assert!(parsed.layout_shapes.is_empty());
        assert!(parsed.outputs.is_empty());
    }

    #[test]
    fn test_data_source_with_column_object() {
        let parsed = extract(&doc(
            r#"<dataSources>
                <DataSource id="ORDERS" type="DATA_BASE_TABLE">
                    <columnObject schemaName="SALES" columnObjectName="T_ORDERS"/>
                </DataSource>
            </dataSources>"#,
        ))
        .unwrap();
        let ds = &parsed.data_sources[0];
        assert_eq!(ds.id, "ORDERS");
        assert_eq!(ds.kind, "DATA_BASE_TABLE");
        assert_eq!(ds.schema_name.as_deref(), Some("SALES"));
        assert_eq!(ds.object_name.as_deref(), Some("T_ORDERS"));
    }

    #[test]
    fn test_resource_uri_from_child_or_attribute() {
        let parsed = extract(&doc(
            r#"<dataSources>
                <DataSource id="A" type="CALCULATION_VIEW"><resourceUri>/pkg/A</resourceUri></DataSource>
                <DataSource id="B" type="CALCULATION_VIEW" resourceUri="/pkg/B"/>
                <DataSource id="C" type="DATA_BASE_TABLE"/>
            </dataSources>"#,
        ))
        .unwrap();
        let uris: Vec<_> = parsed
            .data_sources
            .iter()
            .map(|d| d.resource_uri.as_deref())
            .collect();
        assert_eq!(uris, [Some("/pkg/A"), Some("/pkg/B"), None]);
    }

    #[test]
    fn test_description_and_filter() {
        let parsed = extract(&doc(
            r#"<descriptions defaultDescription="Revenue &amp; cost"/>
            <calculationViews>
                <calculationView xsi:type="Calculation:ProjectionView" id="P">
                    <filter>("YEAR" &gt;= '2020') and "REGION" = 'EU'</filter>
                </calculationView>
            </calculationViews>"#,
        ))
        .unwrap();
        assert_eq!(parsed.description.as_deref(), Some("Revenue & cost"));
        assert_eq!(
            parsed.calculation_views[0].filter.as_deref(),
            Some(r#"("YEAR" >= '2020') and "REGION" = 'EU'"#)
        );
    }

    #[test]
    fn test_single_and_repeated_elements_extract_alike() {
        let one = doc(
            r##"<dataSources><DataSource id="A" type="DATA_BASE_TABLE"/></dataSources>
            <calculationViews>
                <calculationView xsi:type="Calculation:ProjectionView" id="P">
                    <viewAttributes><viewAttribute id="X"/></viewAttributes>
                    <input node="#A"><mapping xsi:type="Calculation:AttributeMapping" target="X" source="X"/></input>
                </calculationView>
            </calculationViews>"##,
        );
        let two = doc(
            r##"<dataSources><DataSource id="A" type="DATA_BASE_TABLE"/><DataSource id="B" type="DATA_BASE_TABLE"/></dataSources>
            <calculationViews>
                <calculationView xsi:type="Calculation:ProjectionView" id="P">
                    <viewAttributes><viewAttribute id="X"/></viewAttributes>
                    <input node="#A"><mapping xsi:type="Calculation:AttributeMapping" target="X" source="X"/></input>
                </calculationView>
            </calculationViews>"##,
        );
        let one = extract(&one).unwrap();
        let two = extract(&two).unwrap();
        assert_eq!(one.data_sources.len(), 1);
        assert_eq!(one.data_sources[0], two.data_sources[0]);
        assert_eq!(one.calculation_views, two.calculation_views);
        assert_eq!(one.calculation_views[0].inputs[0].mapping.len(), 1);
    }

    #[test]
    fn test_calculated_attributes_follow_plain_ones() {
        let parsed = extract(&doc(
            r#"<calculationViews>
                <calculationView xsi:type="Calculation:AggregationView" id="AGG">
                    <viewAttributes>
                        <viewAttribute id="REGION" datatype="NVARCHAR" length="20"/>
                        <viewAttribute id="AMOUNT" datatype="DECIMAL"/>
                    </viewAttributes>
                    <calculatedViewAttributes>
                        <calculatedViewAttribute id="NET" datatype="DECIMAL">
                            <formula>"AMOUNT" * (1 - "TAX")</formula>
                        </calculatedViewAttribute>
                    </calculatedViewAttributes>
                </calculationView>
            </calculationViews>"#,
        ))
        .unwrap();
        let attrs = &parsed.calculation_views[0].attributes;
        let ids: Vec<_> = attrs.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["REGION", "AMOUNT", "NET"]);
        assert!(!attrs[0].is_calculated && !attrs[1].is_calculated);
        assert!(attrs[2].is_calculated);
        assert_eq!(attrs[2].formula.as_deref(), Some(r#""AMOUNT" * (1 - "TAX")"#));
        assert_eq!(attrs[0].length.as_deref(), Some("20"));
    }

    #[test]
    fn test_inputs_strip_marker_and_drop_missing_nodes() {
        let parsed = extract(&doc(
            r##"<calculationViews>
                <calculationView xsi:type="Calculation:JoinView" id="J" joinType="leftOuter">
                    <comment text="orders with customers"/>
                    <input node="#ORDERS"/>
                    <input/>
                    <input node="CUSTOMERS">
                        <mapping target="CID" source="ID"/>
                        <mapping target="NAME" source="NAME"/>
                    </input>
                </calculationView>
            </calculationViews>"##,
        ))
        .unwrap();
        let view = &parsed.calculation_views[0];
        assert_eq!(view.kind, ViewKind::Join);
        assert_eq!(view.join_type, Some(JoinType::LeftOuter));
        assert_eq!(view.comment.as_deref(), Some("orders with customers"));
        let sources: Vec<_> = view.inputs.iter().map(|i| i.source_id.as_str()).collect();
        assert_eq!(sources, ["ORDERS", "CUSTOMERS"]);
        assert_eq!(
            view.inputs[1].mapping[0],
            ColumnMapping {
                target: "CID".into(),
                source: "ID".into()
            }
        );
    }

    #[test]
    fn test_logical_model_is_aggregation() {
        let parsed = extract(&doc(
            r#"<calculationViews>
                <calculationView xsi:type="Calculation:RankView" id="R"/>
            </calculationViews>
            <logicalModel id="Projection_1">
                <attributes><attribute id="REGION"/></attributes>
                <baseMeasures><measure id="AMOUNT"/></baseMeasures>
            </logicalModel>"#,
        ))
        .unwrap();
        assert_eq!(parsed.calculation_views.len(), 2);
        assert_eq!(parsed.calculation_views[0].kind, ViewKind::Rank);
        let logical = &parsed.calculation_views[1];
        assert_eq!(logical.id, "Projection_1");
        assert_eq!(logical.kind, ViewKind::Aggregation);
        assert_eq!(logical.attributes.len(), 2);
    }

    #[test]
    fn test_only_root_layout_is_read() {
        let parsed = extract(&doc(
            r#"<privateDataFoundation>
                <layout><shapes><shape modelObjectName="HIDDEN"/></shapes></layout>
            </privateDataFoundation>
            <layout>
                <shapes>
                    <shape expanded="true" modelObjectName="P" modelObjectNameSpace="CalculationView">
                        <upperLeftCorner x="92" y="217.6"/>
                        <rectangleSize height="30" width="160"/>
                    </shape>
                    <shape modelObjectName="Output">
                        <upperLeftCorner x="-4"/>
                    </shape>
                </shapes>
            </layout>"#,
        ))
        .unwrap();
        assert_eq!(parsed.layout_shapes.len(), 2);
        let p = &parsed.layout_shapes[0];
        assert_eq!((p.owner_id.as_str(), p.x, p.y), ("P", 92, 217));
        assert!(p.expanded);
        assert_eq!((p.width.as_str(), p.height.as_str()), ("160", "30"));
        let out = &parsed.layout_shapes[1];
        assert_eq!((out.x, out.y), (-4, 0));
        assert!(!out.expanded);
        assert_eq!(out.width, "0");
    }

    #[test]
    fn test_outputs() {
        let parsed = extract(&doc(
            r##"<outputs><output><input node="#AGG"/><input node="#"/></output></outputs>"##,
        ))
        .unwrap();
        assert_eq!(parsed.outputs.len(), 1);
        assert_eq!(parsed.outputs[0].source_ids, ["AGG"]);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42"), 42);
        assert_eq!(parse_int_prefix(" -7.9"), -7);
        assert_eq!(parse_int_prefix("abc"), 0);
        assert_eq!(parse_int_prefix(""), 0);
    }
}
