//! Serialization codec
//!
//! Maps a `Genogram` plus its `Layout` to the transport schema and back. Decoding
//! re-validates every structural invariant and either yields a complete graph or
//! fails with `MalformedGenogram`; nothing partially valid is ever constructed.
//! Off-grid coordinates are re-snapped on the way in.

pub mod schema;

pub use schema::{GenogramDocument, NodeRecord, RelationshipRecord, SCHEMA_VERSION};

use crate::aggregate::{Fetus, Genogram, Person, PersonAttributes, Relationship, RelationshipKind};
use crate::errors::{GenogramError, GenogramResult};
use crate::layout::{Layout, LayoutConfig};
use crate::value_objects::{NodeId, Position2D, RelationshipId};
use std::collections::HashSet;

/// Encode a graph and its layout
///
/// Every person and fetus must have a coordinate.
pub fn encode(graph: &Genogram, layout: &Layout) -> GenogramResult<GenogramDocument> {
    let position = |id: NodeId| {
        layout
            .get(id)
            .ok_or_else(|| GenogramError::MalformedGenogram(format!("No coordinate for {id}")))
    };

    let mut nodes = Vec::with_capacity(graph.person_count());
    for person in graph.persons() {
        let pos = position(person.id)?;
        let attrs = &person.attributes;
        nodes.push(NodeRecord::Person {
            id: person.id.to_string(),
            gender: attrs.gender,
            vital_status: attrs.vital_status,
            age: attrs.age,
            birth_year: attrs.birth_year,
            birth_order: attrs.birth_order,
            name: attrs.name.clone(),
            occupation: attrs.occupation.clone(),
            region: attrs.region.clone(),
            x: pos.x.round() as i64,
            y: pos.y.round() as i64,
        });
    }
    for fetus in graph.fetuses() {
        let pos = position(fetus.id)?;
        nodes.push(NodeRecord::Fetus {
            id: fetus.id.to_string(),
            father: fetus.father.map(|id| id.to_string()),
            mother: fetus.mother.map(|id| id.to_string()),
            status: fetus.status,
            x: pos.x.round() as i64,
            y: pos.y.round() as i64,
        });
    }

    let relationships = graph.relationships().map(encode_relationship).collect();

    Ok(GenogramDocument {
        version: SCHEMA_VERSION,
        nodes,
        relationships,
    })
}

fn encode_relationship(rel: &Relationship) -> RelationshipRecord {
    let id = rel.id.to_string();
    let label = rel.label.clone();
    match rel.kind {
        RelationshipKind::Partner { a, b, status } => RelationshipRecord::Partner {
            id,
            a: a.to_string(),
            b: b.to_string(),
            status,
            label,
        },
        RelationshipKind::ParentChild {
            father,
            mother,
            child,
            status,
        } => RelationshipRecord::ParentChild {
            id,
            father: father.map(|p| p.to_string()),
            mother: mother.map(|p| p.to_string()),
            child: child.to_string(),
            status,
            label,
        },
        RelationshipKind::Emotional { a, b, status } => RelationshipRecord::Emotional {
            id,
            a: a.to_string(),
            b: b.to_string(),
            status,
            label,
        },
    }
}

/// Decode a transport document into a fresh graph and layout
pub fn decode(
    document: &GenogramDocument,
    config: &LayoutConfig,
) -> GenogramResult<(Genogram, Layout)> {
    if document.version != SCHEMA_VERSION {
        return Err(GenogramError::MalformedGenogram(format!(
            "Unsupported schema version {} (expected {SCHEMA_VERSION})",
            document.version
        )));
    }

    let mut graph = Genogram::new();
    let mut layout = Layout::new();
    let mut resnapped = 0usize;
    let mut place = |layout: &mut Layout, id: NodeId, x: i64, y: i64| {
        let raw = Position2D::new(x as f64, y as f64);
        let snapped = config.snap_position(raw);
        if snapped != raw {
            resnapped += 1;
        }
        layout.set(id, snapped);
    };

    // Persons first so fetuses and relationships may reference any of them.
    for record in &document.nodes {
        if let NodeRecord::Person {
            id,
            gender,
            vital_status,
            age,
            birth_year,
            birth_order,
            name,
            occupation,
            region,
            x,
            y,
        } = record
        {
            let id = parse_node_id(id)?;
            let attributes = PersonAttributes {
                gender: *gender,
                vital_status: *vital_status,
                age: *age,
                birth_year: *birth_year,
                birth_order: *birth_order,
                name: name.clone(),
                occupation: occupation.clone(),
                region: region.clone(),
            };
            graph
                .insert_person(Person::new(id, attributes))
                .map_err(malformed)?;
            place(&mut layout, id, *x, *y);
        }
    }

    for record in &document.nodes {
        if let NodeRecord::Fetus {
            id,
            father,
            mother,
            status,
            x,
            y,
        } = record
        {
            let fetus = Fetus {
                id: parse_node_id(id)?,
                father: parse_optional_node_id(father.as_deref())?,
                mother: parse_optional_node_id(mother.as_deref())?,
                status: *status,
            };
            let fetus_id = fetus.id;
            graph.insert_fetus(fetus).map_err(malformed)?;
            place(&mut layout, fetus_id, *x, *y);
        }
    }

    let mut seen = HashSet::new();
    for record in &document.relationships {
        let relationship = decode_relationship(record)?;
        if !seen.insert(relationship.id) {
            return Err(GenogramError::MalformedGenogram(format!(
                "Duplicate relationship id {}",
                relationship.id
            )));
        }
        graph.insert_relationship(relationship).map_err(malformed)?;
    }

    if resnapped > 0 {
        tracing::debug!(resnapped, "Re-snapped off-grid coordinates while decoding");
    }

    Ok((graph, layout))
}

fn decode_relationship(record: &RelationshipRecord) -> GenogramResult<Relationship> {
    let (id, kind, label) = match record {
        RelationshipRecord::Partner {
            id,
            a,
            b,
            status,
            label,
        } => (
            id,
            RelationshipKind::Partner {
                a: parse_node_id(a)?,
                b: parse_node_id(b)?,
                status: *status,
            },
            label,
        ),
        RelationshipRecord::ParentChild {
            id,
            father,
            mother,
            child,
            status,
            label,
        } => (
            id,
            RelationshipKind::ParentChild {
                father: parse_optional_node_id(father.as_deref())?,
                mother: parse_optional_node_id(mother.as_deref())?,
                child: parse_node_id(child)?,
                status: *status,
            },
            label,
        ),
        RelationshipRecord::Emotional {
            id,
            a,
            b,
            status,
            label,
        } => (
            id,
            RelationshipKind::Emotional {
                a: parse_node_id(a)?,
                b: parse_node_id(b)?,
                status: *status,
            },
            label,
        ),
    };
    let id = RelationshipId::parse(id)
        .ok_or_else(|| GenogramError::MalformedGenogram(format!("Bad relationship id `{id}`")))?;
    Ok(Relationship {
        id,
        kind,
        label: label.clone(),
    })
}

/// Encode straight to JSON
pub fn to_json(graph: &Genogram, layout: &Layout) -> GenogramResult<String> {
    let document = encode(graph, layout)?;
    serde_json::to_string_pretty(&document)
        .map_err(|e| GenogramError::MalformedGenogram(e.to_string()))
}

/// Parse and decode JSON; unknown schema versions fail closed
pub fn from_json(json: &str, config: &LayoutConfig) -> GenogramResult<(Genogram, Layout)> {
    let document = parse_document(json)?;
    decode(&document, config)
}

/// Parse JSON into a transport document, checking the version before the shape
pub fn parse_document(json: &str) -> GenogramResult<GenogramDocument> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| GenogramError::MalformedGenogram(e.to_string()))?;
    match value.get("version").and_then(serde_json::Value::as_u64) {
        Some(version) if version == u64::from(SCHEMA_VERSION) => {}
        Some(version) => {
            return Err(GenogramError::MalformedGenogram(format!(
                "Unsupported schema version {version} (expected {SCHEMA_VERSION})"
            )))
        }
        None => {
            return Err(GenogramError::MalformedGenogram(
                "Missing schema version".to_string(),
            ))
        }
    }
    serde_json::from_value(value).map_err(|e| GenogramError::MalformedGenogram(e.to_string()))
}

fn parse_node_id(raw: &str) -> GenogramResult<NodeId> {
    NodeId::parse(raw)
        .ok_or_else(|| GenogramError::MalformedGenogram(format!("Bad node id `{raw}`")))
}

fn parse_optional_node_id(raw: Option<&str>) -> GenogramResult<Option<NodeId>> {
    raw.map(parse_node_id).transpose()
}

fn malformed(error: GenogramError) -> GenogramError {
    match error {
        GenogramError::MalformedGenogram(_) => error,
        other => GenogramError::MalformedGenogram(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TreeLayoutEngine;
    use crate::value_objects::{
        EmotionalStatus, FetusStatus, Gender, ParentChildStatus, PartnerStatus,
    };

    fn sample() -> (Genogram, Layout) {
        let mut graph = Genogram::new();
        let father = graph.add_person(PersonAttributes::new(Gender::Male).with_name("Jon"));
        let mother = graph.add_person(PersonAttributes::new(Gender::Female).with_age(61));
        let child = graph.add_person(PersonAttributes::new(Gender::NonBinary).deceased());
        let rel = graph.add_partner(father, mother, PartnerStatus::Divorced).unwrap();
        graph
            .add_parent_child(Some(father), Some(mother), child, ParentChildStatus::Adopted)
            .unwrap();
        graph.add_emotional(mother, child, EmotionalStatus::Cutoff).unwrap();
        graph.add_fetus(Some(father), Some(mother), FetusStatus::Abortion).unwrap();
        assert_eq!(rel, RelationshipId::new(1));
        let layout = TreeLayoutEngine::default().layout(&graph);
        (graph, layout)
    }

    #[test]
    fn test_round_trip() {
        let (graph, layout) = sample();
        let json = to_json(&graph, &layout).unwrap();
        let (decoded_graph, decoded_layout) = from_json(&json, &LayoutConfig::default()).unwrap();
        assert_eq!(decoded_graph, graph);
        assert_eq!(decoded_layout, layout);
    }

    #[test]
    fn test_transport_uses_tags_and_string_ids() {
        let (graph, layout) = sample();
        let json = to_json(&graph, &layout).unwrap();
        assert!(json.contains("\"kind\": \"parent_child\""));
        assert!(json.contains("\"status\": \"cutoff\""));
        assert!(json.contains("\"id\": \"n1\""));
        assert!(json.contains("\"gender\": \"non_binary\""));
    }

    #[test]
    fn test_unknown_version_fails_closed() {
        let json = r#"{"version": 2, "nodes": [], "relationships": []}"#;
        let result = from_json(json, &LayoutConfig::default());
        assert!(matches!(result, Err(GenogramError::MalformedGenogram(_))));

        let json = r#"{"nodes": [], "relationships": []}"#;
        assert!(from_json(json, &LayoutConfig::default()).is_err());
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let json = r#"{
            "version": 1,
            "nodes": [
                {"kind": "person", "id": "n1", "gender": "male", "vital_status": "alive", "x": 15, "y": 15}
            ],
            "relationships": [
                {"kind": "partner", "id": "r1", "a": "n1", "b": "n2", "status": "married"}
            ]
        }"#;
        let result = from_json(json, &LayoutConfig::default());
        assert!(matches!(result, Err(GenogramError::MalformedGenogram(_))));
    }

    #[test]
    fn test_unknown_vocabulary_is_rejected() {
        let json = r#"{
            "version": 1,
            "nodes": [
                {"kind": "person", "id": "n1", "gender": "robot", "vital_status": "alive", "x": 15, "y": 15}
            ],
            "relationships": []
        }"#;
        assert!(from_json(json, &LayoutConfig::default()).is_err());
    }

    #[test]
    fn test_off_grid_coordinates_are_resnapped() {
        let json = r#"{
            "version": 1,
            "nodes": [
                {"kind": "person", "id": "n4", "gender": "female", "vital_status": "alive", "x": 100, "y": 170}
            ],
            "relationships": []
        }"#;
        let (graph, layout) = from_json(json, &LayoutConfig::default()).unwrap();
        let id = NodeId::new(4);
        assert!(graph.person(id).is_some());
        assert_eq!(layout.get(id), Some(Position2D::new(105.0, 165.0)));
    }

    #[test]
    fn test_encode_requires_coordinates() {
        let (graph, _) = sample();
        let result = encode(&graph, &Layout::new());
        assert!(matches!(result, Err(GenogramError::MalformedGenogram(_))));
    }
}
