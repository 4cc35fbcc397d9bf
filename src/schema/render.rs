//! Grounding text for query synthesis

use crate::schema::SchemaDescriptor;
use std::collections::BTreeSet;

fn property_list(properties: &BTreeSet<String>) -> String {
    properties.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Render a schema snapshot as the natural-language block injected into the
/// synthesis system prompt. Same descriptor, same bytes.
pub fn render_schema(schema: &SchemaDescriptor) -> String {
    let mut lines = Vec::new();

    lines.push("This is the schema representation of the Neo4j database.".to_string());
    lines.push("Node properties are the following:".to_string());
    for node in &schema.node_properties {
        lines.push(format!(
            "{{labels: {}, properties: [{}]}}",
            node.label,
            property_list(&node.properties)
        ));
    }

    lines.push("Relationship properties are the following:".to_string());
    for rel in &schema.relationship_properties {
        lines.push(format!(
            "{{type: {}, properties: [{}]}}",
            rel.rel_type,
            property_list(&rel.properties)
        ));
    }

    lines.push("Relationship point from source to target nodes".to_string());
    for shape in &schema.relationship_shapes {
        lines.push(format!(
            "(:{})-[:{}]->(:{})",
            shape.source, shape.rel_type, shape.target
        ));
    }

    lines.push("Make sure to respect relationship types and directions".to_string());
    lines.join("\n")
}
