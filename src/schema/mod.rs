//! Schema snapshot of the live graph
//!
//! The extractor reads node labels, relationship types, their properties and
//! the source/target labels of each relationship type through APOC metadata
//! procedures. `SchemaDescriptor` is the structured, immutable result.

pub mod render;

pub use render::render_schema;

use crate::database::{DatabaseResult, GraphDatabase, QueryParams};
use crate::result::ResultSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Properties of every node label
pub const NODE_PROPERTIES_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE NOT type = "RELATIONSHIP" AND elementType = "node"
WITH label AS nodeLabels, collect(property) AS properties
RETURN {labels: nodeLabels, properties: properties} AS output
"#;

/// Properties of every relationship type
pub const RELATIONSHIP_PROPERTIES_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE NOT type = "RELATIONSHIP" AND elementType = "relationship"
WITH label AS relType, collect(property) AS properties
RETURN {type: relType, properties: properties} AS output
"#;

/// Source label, relationship type and target labels
pub const RELATIONSHIP_SHAPES_QUERY: &str = r#"
CALL apoc.meta.data()
YIELD label, other, elementType, type, property
WHERE type = "RELATIONSHIP" AND elementType = "node"
RETURN {source: label, relationship: property, target: other} AS output
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub label: String,
    pub properties: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipProperties {
    pub rel_type: String,
    pub properties: BTreeSet<String>,
}

/// `(:source)-[:rel_type]->(:target)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipShape {
    pub source: String,
    pub rel_type: String,
    pub target: String,
}

/// The three metadata results as returned by the database
#[derive(Debug, Clone, Default)]
pub struct RawSchema {
    pub node_properties: ResultSet,
    pub relationship_properties: ResultSet,
    pub relationship_shapes: ResultSet,
}

/// Immutable schema snapshot; refreshed by replacing it wholesale
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub node_properties: Vec<NodeProperties>,
    pub relationship_properties: Vec<RelationshipProperties>,
    pub relationship_shapes: Vec<RelationshipShape>,
}

impl SchemaDescriptor {
    /// Structure raw metadata rows. Rows without an identifier are skipped.
    pub fn from_raw(raw: &RawSchema) -> Self {
        let node_properties = outputs(&raw.node_properties)
            .filter_map(|output| match output.get("labels").and_then(Value::as_str) {
                Some(label) => Some(NodeProperties {
                    label: label.to_string(),
                    properties: string_set(output.get("properties")),
                }),
                None => {
                    warn!("Skipping node metadata row without label: {}", output);
                    None
                }
            })
            .collect();

        let relationship_properties = outputs(&raw.relationship_properties)
            .filter_map(|output| match output.get("type").and_then(Value::as_str) {
                Some(rel_type) => Some(RelationshipProperties {
                    rel_type: rel_type.to_string(),
                    properties: string_set(output.get("properties")),
                }),
                None => {
                    warn!("Skipping relationship metadata row without type: {}", output);
                    None
                }
            })
            .collect();

        let mut relationship_shapes = Vec::new();
        for output in outputs(&raw.relationship_shapes) {
            let source = output.get("source").and_then(Value::as_str);
            let rel_type = output.get("relationship").and_then(Value::as_str);
            let (Some(source), Some(rel_type)) = (source, rel_type) else {
                warn!("Skipping relationship shape row: {}", output);
                continue;
            };
            // apoc.meta.data reports the target side as a list of labels
            let targets: Vec<&str> = match output.get("target") {
                Some(Value::String(label)) => vec![label.as_str()],
                Some(Value::Array(labels)) => labels.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            for target in targets {
                relationship_shapes.push(RelationshipShape {
                    source: source.to_string(),
                    rel_type: rel_type.to_string(),
                    target: target.to_string(),
                });
            }
        }

        Self {
            node_properties,
            relationship_properties,
            relationship_shapes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_properties.is_empty()
            && self.relationship_properties.is_empty()
            && self.relationship_shapes.is_empty()
    }
}

/// The `output` map of every row (first column when named differently)
fn outputs(rs: &ResultSet) -> impl Iterator<Item = &Value> + '_ {
    let column = rs.header().iter().position(|c| c == "output").unwrap_or(0);
    rs.rows().iter().filter_map(move |row| row.get(column))
}

fn string_set(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads the three metadata results from a live database
pub struct SchemaExtractor<'a> {
    db: &'a dyn GraphDatabase,
}

impl<'a> SchemaExtractor<'a> {
    pub fn new(db: &'a dyn GraphDatabase) -> Self {
        Self { db }
    }

    /// Run the metadata queries; any database error is returned as-is.
    pub async fn extract_raw(&self) -> DatabaseResult<RawSchema> {
        let params = QueryParams::new();
        let node_properties = self.db.run(NODE_PROPERTIES_QUERY, &params).await?;
        let relationship_properties = self.db.run(RELATIONSHIP_PROPERTIES_QUERY, &params).await?;
        let relationship_shapes = self.db.run(RELATIONSHIP_SHAPES_QUERY, &params).await?;

        Ok(RawSchema {
            node_properties,
            relationship_properties,
            relationship_shapes,
        })
    }

    pub async fn extract(&self) -> DatabaseResult<SchemaDescriptor> {
        let raw = self.extract_raw().await?;
        let schema = SchemaDescriptor::from_raw(&raw);
        info!(
            labels = schema.node_properties.len(),
            relationship_types = schema.relationship_properties.len(),
            shapes = schema.relationship_shapes.len(),
            "Extracted graph schema"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output_rows(values: Vec<Value>) -> ResultSet {
        ResultSet::new(
            vec!["output".to_string()],
            values.into_iter().map(|v| vec![v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_structures_metadata_rows() {
        let raw = RawSchema {
            node_properties: output_rows(vec![
                json!({"labels": "Person", "properties": ["name", "age", "name"]}),
                json!({"labels": "Movie", "properties": []}),
            ]),
            relationship_properties: output_rows(vec![
                json!({"type": "ACTED_IN", "properties": ["roles"]}),
            ]),
            relationship_shapes: output_rows(vec![
                json!({"source": "Person", "relationship": "ACTED_IN", "target": ["Movie"]}),
                json!({"source": "Person", "relationship": "KNOWS", "target": ["Person", "Robot"]}),
            ]),
        };

        let schema = SchemaDescriptor::from_raw(&raw);

        assert_eq!(schema.node_properties.len(), 2);
        assert_eq!(schema.node_properties[0].label, "Person");
        assert_eq!(
            schema.node_properties[0].properties.iter().collect::<Vec<_>>(),
            ["age", "name"]
        );
        assert!(schema.node_properties[1].properties.is_empty());
        assert_eq!(schema.relationship_properties[0].rel_type, "ACTED_IN");
        assert_eq!(schema.relationship_shapes.len(), 3);
        assert_eq!(schema.relationship_shapes[2].target, "Robot");
    }

    #[test]
    fn test_skips_rows_without_identifier() {
        let raw = RawSchema {
            node_properties: output_rows(vec![json!({"properties": ["x"]}), json!(null)]),
            relationship_shapes: output_rows(vec![
                json!({"source": "A", "relationship": "R", "target": "B"}),
                json!({"source": "A", "target": ["B"]}),
            ]),
            ..RawSchema::default()
        };

        let schema = SchemaDescriptor::from_raw(&raw);
        assert!(schema.node_properties.is_empty());
        assert_eq!(
            schema.relationship_shapes,
            vec![RelationshipShape {
                source: "A".to_string(),
                rel_type: "R".to_string(),
                target: "B".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_raw_schema() {
        assert!(SchemaDescriptor::from_raw(&RawSchema::default()).is_empty());
    }
}
