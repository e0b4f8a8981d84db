//! Schema-model boundary.
//!
//! The schema text parser is an external collaborator; this module receives
//! its output as JSON and validates it exactly once into strongly typed
//! entities, relationships and table groups. Loose cardinality tokens are
//! closed into an enum here so nothing downstream re-checks strings.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
    ZeroOrOne,
}

impl Cardinality {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "one" | "1" => Some(Self::One),
            "many" | "*" => Some(Self::Many),
            "zero-or-one" | "0..1" => Some(Self::ZeroOrOne),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Many => "many",
            Self::ZeroOrOne => "zero-or-one",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl RefAction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "cascade" => Some(Self::Cascade),
            "restrict" => Some(Self::Restrict),
            "set null" | "set-null" => Some(Self::SetNull),
            "set default" | "set-default" => Some(Self::SetDefault),
            "no action" | "no-action" => Some(Self::NoAction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub pk: bool,
    pub not_null: bool,
    pub unique: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    pub note: Option<String>,
}

impl Entity {
    /// Index of a named field, for edge anchoring. Unknown names fall back
    /// to the first row so a renamed column never breaks routing.
    pub fn field_index(&self, name: &str) -> usize {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub entity: String,
    pub fields: Vec<String>,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub from: Endpoint,
    pub to: Endpoint,
    pub name: Option<String>,
    pub on_delete: Option<RefAction>,
    pub on_update: Option<RefAction>,
}

#[derive(Debug, Clone)]
pub struct GroupDef {
    pub name: String,
    pub members: Vec<String>,
    pub color: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub groups: Vec<GroupDef>,
}

impl SchemaModel {
    pub fn from_json(input: &str) -> Result<Self, EngineError> {
        let raw: RawSchema = serde_json::from_str(input)
            .map_err(|err| EngineError::Schema(err.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, EngineError> {
        let raw: RawSchema = serde_json::from_value(value)
            .map_err(|err| EngineError::Schema(err.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    /// Total edge-endpoint count per entity, used for snowflake ranking.
    pub fn degrees(&self) -> BTreeMap<String, usize> {
        let mut degrees: BTreeMap<String, usize> = BTreeMap::new();
        for entity in &self.entities {
            degrees.insert(entity.name.clone(), 0);
        }
        for rel in &self.relationships {
            for endpoint in [&rel.from, &rel.to] {
                if let Some(count) = degrees.get_mut(&endpoint.entity) {
                    *count += 1;
                }
            }
        }
        degrees
    }

    fn from_raw(raw: RawSchema) -> Result<Self, EngineError> {
        let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
        for entity in &raw.entities {
            if seen.insert(entity.name.as_str(), ()).is_some() {
                return Err(EngineError::Schema(format!(
                    "duplicate entity name: {}",
                    entity.name
                )));
            }
        }

        let entities = raw
            .entities
            .into_iter()
            .map(|entity| Entity {
                name: entity.name,
                note: entity.note,
                fields: entity
                    .fields
                    .into_iter()
                    .map(|field| Field {
                        name: field.name,
                        type_name: field.type_name,
                        pk: field.pk,
                        not_null: field.not_null,
                        unique: field.unique,
                        note: field.note,
                    })
                    .collect(),
            })
            .collect();

        let mut relationships = Vec::with_capacity(raw.relationships.len());
        for rel in raw.relationships {
            let from = convert_endpoint(rel.from)?;
            let to = convert_endpoint(rel.to)?;
            let on_delete = convert_action(rel.on_delete.as_deref())?;
            let on_update = convert_action(rel.on_update.as_deref())?;
            relationships.push(Relationship {
                from,
                to,
                name: rel.name,
                on_delete,
                on_update,
            });
        }

        let groups = raw
            .groups
            .into_iter()
            .map(|group| GroupDef {
                name: group.name,
                members: group.members,
                color: group.color,
                note: group.note,
            })
            .collect();

        Ok(Self {
            entities,
            relationships,
            groups,
        })
    }
}

fn convert_endpoint(raw: RawEndpoint) -> Result<Endpoint, EngineError> {
    let cardinality = Cardinality::from_token(&raw.cardinality).ok_or_else(|| {
        EngineError::Schema(format!("unknown cardinality token: {}", raw.cardinality))
    })?;
    Ok(Endpoint {
        entity: raw.entity,
        fields: raw.fields,
        cardinality,
    })
}

fn convert_action(token: Option<&str>) -> Result<Option<RefAction>, EngineError> {
    let Some(token) = token else {
        return Ok(None);
    };
    RefAction::from_token(token)
        .map(Some)
        .ok_or_else(|| EngineError::Schema(format!("unknown ref action: {token}")))
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
    #[serde(default)]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: String,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    pk: bool,
    #[serde(rename = "notNull", default)]
    not_null: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    from: RawEndpoint,
    to: RawEndpoint,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "onDelete", default)]
    on_delete: Option<String>,
    #[serde(rename = "onUpdate", default)]
    on_update: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    entity: String,
    #[serde(default)]
    fields: Vec<String>,
    cardinality: String,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: String,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    note: Option<String>,
}
