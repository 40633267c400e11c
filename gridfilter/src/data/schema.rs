//! Entity schema
//!
//! Declares which entities exist, the table and fields behind each one and
//! the relations that may be traversed from it. Column paths coming from a
//! grid request are resolved against this schema by lookup; nothing outside
//! of it can reach generated SQL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::DataError;
use crate::utils::sql::is_valid_identifier;

const DEFAULT_KEY: &str = "id";

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

/// Storage type of a field, used to pick comparison semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Real,
    Boolean,
    Date,
    Datetime,
}

impl FieldKind {
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

/// A relation from an owner entity to a related entity
///
/// `foreign_key` is the column holding the reference, `references` the
/// column it points at. For `has_one`/`has_many` the foreign key lives on
/// the related entity; for `belongs_to` it lives on the owner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationDef {
    pub kind: RelationKind,
    pub entity: String,
    pub foreign_key: String,
    #[serde(default = "default_key")]
    pub references: String,
}

impl RelationDef {
    /// Join columns as (column on the related entity, column on the owner)
    pub fn join_columns(&self) -> (&str, &str) {
        match self.kind {
            RelationKind::HasOne | RelationKind::HasMany => {
                (self.foreign_key.as_str(), self.references.as_str())
            }
            RelationKind::BelongsTo => (self.references.as_str(), self.foreign_key.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityDef {
    pub table: String,
    #[serde(default = "default_key")]
    pub primary_key: String,
    pub fields: BTreeMap<String, FieldKind>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationDef>,
}

impl EntityDef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: default_key(),
            fields: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn has_one(self, name: &str, entity: &str, foreign_key: &str) -> Self {
        self.relation_to(name, RelationKind::HasOne, entity, foreign_key)
    }

    pub fn has_many(self, name: &str, entity: &str, foreign_key: &str) -> Self {
        self.relation_to(name, RelationKind::HasMany, entity, foreign_key)
    }

    pub fn belongs_to(self, name: &str, entity: &str, foreign_key: &str) -> Self {
        self.relation_to(name, RelationKind::BelongsTo, entity, foreign_key)
    }

    fn relation_to(
        mut self,
        name: &str,
        kind: RelationKind,
        entity: &str,
        foreign_key: &str,
    ) -> Self {
        self.relations.insert(
            name.to_string(),
            RelationDef {
                kind,
                entity: entity.to_string(),
                foreign_key: foreign_key.to_string(),
                references: default_key(),
            },
        );
        self
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }
}

/// All entities reachable by grid requests, keyed by entity name
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Schema {
    entities: BTreeMap<String, EntityDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: impl Into<String>, entity: EntityDef) -> Self {
        self.entities.insert(name.into(), entity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Look an entity up by its name, falling back to its table name
    pub fn find(&self, name_or_table: &str) -> Option<(&str, &EntityDef)> {
        self.entities
            .get_key_value(name_or_table)
            .or_else(|| {
                self.entities
                    .iter()
                    .find(|(_, entity)| entity.table == name_or_table)
            })
            .map(|(name, entity)| (name.as_str(), entity))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Check identifiers and cross references between entities
    pub fn validate(&self) -> Result<(), DataError> {
        for (name, entity) in &self.entities {
            if !is_valid_identifier(&entity.table) {
                return Err(DataError::invalid_schema(
                    name,
                    format!("invalid table name '{}'", entity.table),
                ));
            }
            if let Some(field) = entity.fields.keys().find(|f| !is_valid_identifier(f)) {
                return Err(DataError::invalid_schema(
                    name,
                    format!("invalid field name '{}'", field),
                ));
            }
            if !entity.fields.contains_key(&entity.primary_key) {
                return Err(DataError::invalid_schema(
                    name,
                    format!("primary key '{}' is not a field", entity.primary_key),
                ));
            }

            for (relation_name, relation) in &entity.relations {
                if !is_valid_identifier(relation_name) {
                    return Err(DataError::invalid_schema(
                        name,
                        format!("invalid relation name '{}'", relation_name),
                    ));
                }
                let target = self.entities.get(&relation.entity).ok_or_else(|| {
                    DataError::invalid_schema(
                        name,
                        format!(
                            "relation '{}' targets unknown entity '{}'",
                            relation_name, relation.entity
                        ),
                    )
                })?;

                let (related_column, owner_column) = relation.join_columns();
                if !target.fields.contains_key(related_column) {
                    return Err(DataError::invalid_schema(
                        name,
                        format!(
                            "relation '{}' joins on missing column {}.{}",
                            relation_name, relation.entity, related_column
                        ),
                    ));
                }
                if !entity.fields.contains_key(owner_column) {
                    return Err(DataError::invalid_schema(
                        name,
                        format!(
                            "relation '{}' joins on missing column {}.{}",
                            relation_name, name, owner_column
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                "posts",
                EntityDef::new("blog_posts")
                    .field("id", FieldKind::Integer)
                    .field("title", FieldKind::Text)
                    .field("author_id", FieldKind::Integer)
                    .belongs_to("author", "users", "author_id")
                    .has_many("comments", "comments", "post_id"),
            )
            .with_entity(
                "users",
                EntityDef::new("users")
                    .field("id", FieldKind::Integer)
                    .field("name", FieldKind::Text),
            )
            .with_entity(
                "comments",
                EntityDef::new("comments")
                    .field("id", FieldKind::Integer)
                    .field("post_id", FieldKind::Integer)
                    .field("body", FieldKind::Text),
            )
    }

    #[test]
    fn test_valid_schema() {
        assert!(schema().validate().is_ok());
    }

    #[test]
    fn test_find_by_name_or_table() {
        let schema = schema();
        assert_eq!(schema.find("posts").map(|(n, _)| n), Some("posts"));
        assert_eq!(schema.find("blog_posts").map(|(n, _)| n), Some("posts"));
        assert!(schema.find("missing").is_none());
    }

    #[test]
    fn test_join_columns() {
        let schema = schema();
        let posts = schema.get("posts").unwrap();
        assert_eq!(
            posts.relation("author").unwrap().join_columns(),
            ("id", "author_id")
        );
        assert_eq!(
            posts.relation("comments").unwrap().join_columns(),
            ("post_id", "id")
        );
    }

    #[test]
    fn test_unknown_relation_target() {
        let schema = Schema::new().with_entity(
            "posts",
            EntityDef::new("posts")
                .field("id", FieldKind::Integer)
                .has_one("cover", "images", "post_id"),
        );
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("unknown entity 'images'"));
    }

    #[test]
    fn test_missing_join_column() {
        let schema = Schema::new()
            .with_entity(
                "posts",
                EntityDef::new("posts")
                    .field("id", FieldKind::Integer)
                    .has_one("cover", "images", "post_id"),
            )
            .with_entity(
                "images",
                EntityDef::new("images").field("id", FieldKind::Integer),
            );
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("images.post_id"));
    }

    #[test]
    fn test_invalid_identifiers_rejected() {
        let schema = Schema::new().with_entity(
            "posts",
            EntityDef::new("posts")
                .field("id", FieldKind::Integer)
                .field("title\"; --", FieldKind::Text),
        );
        assert!(matches!(
            schema.validate(),
            Err(DataError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_missing_primary_key() {
        let schema = Schema::new().with_entity(
            "posts",
            EntityDef::new("posts")
                .key("uuid")
                .field("id", FieldKind::Integer),
        );
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "filter_test_models": {
                "table": "filter_test_models",
                "fields": {"id": "integer", "name": "text", "created_at": "datetime"},
                "relations": {
                    "relation": {"kind": "has_one", "entity": "filter_relation_models", "foreign_key": "parent_id"}
                }
            },
            "filter_relation_models": {
                "table": "filter_relation_models",
                "fields": {"id": "integer", "name": "text", "parent_id": "integer"}
            }
        }"#;
        let schema: Schema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.validate().is_ok());

        let entity = schema.get("filter_test_models").unwrap();
        assert_eq!(entity.primary_key, "id");
        assert_eq!(entity.field_kind("created_at"), Some(FieldKind::Datetime));
        assert_eq!(entity.relation("relation").unwrap().references, "id");
    }
}
