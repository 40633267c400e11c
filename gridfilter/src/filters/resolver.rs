//! Column resolution
//!
//! Maps a logical column path (`name`, `relation.name`, `a.b.field`) to the
//! alias and field it reads in the query, registering relation joins the
//! first time a relation path is seen. Only declared schema names resolve.

use super::error::FilterError;
use crate::data::{ColumnRef, FieldKind, SelectQuery};

/// A column path resolved against the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Relation names traversed from the base entity, empty for base fields
    pub owner_path: Vec<String>,
    /// Table alias the field is read from
    pub alias: String,
    pub field: String,
    pub kind: FieldKind,
}

impl ResolvedColumn {
    pub fn column(&self) -> ColumnRef {
        ColumnRef::new(self.alias.as_str(), self.field.as_str())
    }
}

pub struct ColumnResolver<'q, 's> {
    query: &'q mut SelectQuery<'s>,
}

impl<'q, 's> ColumnResolver<'q, 's> {
    pub fn new(query: &'q mut SelectQuery<'s>) -> Self {
        Self { query }
    }

    /// Resolve a dotted column path relative to the base entity
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedColumn, FilterError> {
        let segments: Vec<&str> = path.split('.').collect();
        match segments.split_last() {
            Some((field, relations)) => self.resolve_segments(path, relations, field),
            None => Err(FilterError::unresolvable(
                path,
                self.query.entity_name(),
                path,
            )),
        }
    }

    /// Resolve a field under an entity key of the `filters`/`intervals`
    /// sections. The key names the base entity (by name or table) or a
    /// relation path from it.
    pub fn resolve_in(&mut self, entity: &str, field: &str) -> Result<ResolvedColumn, FilterError> {
        let path = format!("{}.{}", entity, field);
        if entity == self.query.entity_name() || entity == self.query.alias() {
            return self.resolve_segments(&path, &[], field);
        }

        let relations: Vec<&str> = entity.split('.').collect();
        self.resolve_segments(&path, &relations, field)
    }

    fn resolve_segments(
        &mut self,
        path: &str,
        relations: &[&str],
        field: &str,
    ) -> Result<ResolvedColumn, FilterError> {
        let schema = self.query.schema();
        let mut owner = self.query.entity();
        let mut owner_name = self.query.entity_name().to_string();

        for segment in relations {
            let relation = owner
                .relation(segment)
                .ok_or_else(|| FilterError::unresolvable(path, owner_name.as_str(), *segment))?;
            owner = schema
                .get(&relation.entity)
                .ok_or_else(|| FilterError::unresolvable(path, relation.entity.as_str(), *segment))?;
            owner_name = relation.entity.clone();
        }

        let kind = owner
            .field_kind(field)
            .ok_or_else(|| FilterError::unresolvable(path, owner_name.as_str(), field))?;

        let alias = if relations.is_empty() {
            self.query.alias().to_string()
        } else {
            let relation_path = relations.join(".");
            self.query
                .include_relation(&relation_path)
                .map_err(|e| FilterError::unresolvable(path, owner_name.as_str(), e.to_string()))?
                .alias
                .clone()
        };

        Ok(ResolvedColumn {
            owner_path: relations.iter().map(|s| s.to_string()).collect(),
            alias,
            field: field.to_string(),
            kind,
        })
    }
}
