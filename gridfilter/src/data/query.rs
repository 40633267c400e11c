//! Select query builder
//!
//! A [`SelectQuery`] is owned by a single request. It starts from one base
//! entity of a [`Schema`], accumulates predicates that are ANDed together,
//! and tracks every relation join in a [`RelationRegistry`] so that a
//! relation path is joined at most once no matter how many predicates
//! reference it. Execution is deferred: callers render with
//! [`SelectQuery::to_sql`] / [`SelectQuery::count_sql`] or hand the query to
//! an executor.

use rustc_hash::FxHashMap;

use super::error::DataError;
use super::predicate::{ColumnExpr, ColumnRef, Predicate, SqlParams, SqlValue};
use super::schema::{EntityDef, Schema};
use super::sql::{Backend, SqlDialect};

/// A registered relation join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Dotted relation path from the base entity
    pub path: String,
    pub alias: String,
    /// Name of the related entity in the schema
    pub entity: String,
    pub table: String,
    related_column: String,
    owner_alias: String,
    owner_column: String,
}

impl Join {
    fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        format!(
            "LEFT JOIN {} AS {} ON {} = {}",
            dialect.quote_ident(&self.table),
            dialect.quote_ident(&self.alias),
            ColumnRef::new(&self.alias, &self.related_column).to_sql(dialect),
            ColumnRef::new(&self.owner_alias, &self.owner_column).to_sql(dialect),
        )
    }
}

/// Relation joins of one query, keyed by relation path
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    joins: Vec<Join>,
    by_path: FxHashMap<String, usize>,
}

impl RelationRegistry {
    pub fn get(&self, path: &str) -> Option<&Join> {
        self.by_path.get(path).map(|&i| &self.joins[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    fn insert(&mut self, join: Join) -> usize {
        let index = self.joins.len();
        self.by_path.insert(join.path.clone(), index);
        self.joins.push(join);
        index
    }

    /// Alias for a new join: the path with `.` replaced by `__`, suffixed
    /// when it would shadow the base table or an existing alias
    fn alias_for(&self, path: &str, base_alias: &str) -> String {
        let alias = path.replace('.', "__");
        if alias != base_alias && self.joins.iter().all(|j| j.alias != alias) {
            alias
        } else {
            format!("{}_{}", alias, self.joins.len() + 1)
        }
    }

    fn truncate(&mut self, len: usize) {
        self.joins.truncate(len);
        self.by_path.retain(|_, index| *index < len);
    }
}

/// Snapshot of a query's joins and predicates, for undoing a failed compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    joins: usize,
    predicates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// Rendered SQL with its bind values
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone)]
pub struct SelectQuery<'s> {
    schema: &'s Schema,
    entity_name: String,
    entity: &'s EntityDef,
    backend: Backend,
    columns: Vec<String>,
    relations: RelationRegistry,
    predicates: Vec<Predicate>,
    order: Vec<(String, OrderDirection)>,
    page: Option<(u32, u32)>,
}

impl<'s> SelectQuery<'s> {
    /// Start a query on an entity, looked up by name or table
    pub fn new(schema: &'s Schema, entity: &str, backend: Backend) -> Result<Self, DataError> {
        let (name, def) = schema
            .find(entity)
            .ok_or_else(|| DataError::UnknownEntity(entity.to_string()))?;

        Ok(Self {
            schema,
            entity_name: name.to_string(),
            entity: def,
            backend,
            columns: Vec::new(),
            relations: RelationRegistry::default(),
            predicates: Vec::new(),
            order: Vec::new(),
            page: None,
        })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity(&self) -> &'s EntityDef {
        self.entity
    }

    /// Alias of the base table (the table name itself)
    pub fn alias(&self) -> &'s str {
        &self.entity.table
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.backend.dialect()
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Restrict the selected base columns (default: all of them)
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = fields.into_iter().map(Into::into).collect();
        self
    }

    /// AND a predicate into the query
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    pub fn where_eq(&mut self, column: impl Into<ColumnExpr>, value: impl Into<SqlValue>) -> &mut Self {
        self.and_where(Predicate::equals(column, value))
    }

    /// AND a group of alternatives: at least one of them must hold
    pub fn or_where(&mut self, alternatives: Vec<Predicate>) -> &mut Self {
        self.and_where(Predicate::Or(alternatives))
    }

    pub fn where_between(
        &mut self,
        column: impl Into<ColumnExpr>,
        min: impl Into<SqlValue>,
        max: impl Into<SqlValue>,
    ) -> &mut Self {
        self.and_where(Predicate::between(column, min, max))
    }

    /// Join every relation along a dotted path, reusing joins that are
    /// already registered. Returns the join of the last segment.
    pub fn include_relation(&mut self, path: &str) -> Result<&Join, DataError> {
        let schema = self.schema;
        let base_alias = self.entity.table.as_str();
        let mut owner: &EntityDef = self.entity;
        let mut owner_name: &str = &self.entity_name;
        let mut owner_alias = base_alias.to_string();
        let mut prefix = String::new();
        let mut last = None;

        for segment in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            let relation = owner
                .relation(segment)
                .ok_or_else(|| DataError::UnknownRelation {
                    entity: owner_name.to_string(),
                    relation: segment.to_string(),
                })?;
            let target = schema
                .get(&relation.entity)
                .ok_or_else(|| DataError::UnknownEntity(relation.entity.clone()))?;

            let index = match self.relations.by_path.get(prefix.as_str()) {
                Some(&index) => index,
                None => {
                    let (related_column, owner_column) = relation.join_columns();
                    let alias = self.relations.alias_for(&prefix, base_alias);
                    tracing::trace!(path = %prefix, alias = %alias, "Registering relation join");
                    self.relations.insert(Join {
                        path: prefix.clone(),
                        alias,
                        entity: relation.entity.clone(),
                        table: target.table.clone(),
                        related_column: related_column.to_string(),
                        owner_alias: owner_alias.clone(),
                        owner_column: owner_column.to_string(),
                    })
                }
            };

            owner_alias = self.relations.joins[index].alias.clone();
            owner = target;
            owner_name = &relation.entity;
            last = Some(index);
        }

        last.map(|index| &self.relations.joins[index])
            .ok_or_else(|| DataError::UnknownRelation {
                entity: self.entity_name.clone(),
                relation: path.to_string(),
            })
    }

    pub fn order_by(&mut self, field: &str, direction: OrderDirection) -> &mut Self {
        self.order.push((field.to_string(), direction));
        self
    }

    pub fn paginate(&mut self, limit: u32, offset: u32) -> &mut Self {
        self.page = Some((limit, offset));
        self
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            joins: self.relations.len(),
            predicates: self.predicates.len(),
        }
    }

    /// Drop every join and predicate added after `checkpoint`
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.relations.truncate(checkpoint.joins);
        self.predicates.truncate(checkpoint.predicates);
    }

    /// Render the row query.
    ///
    /// Joined relations may repeat a base row, so any join switches the
    /// select to DISTINCT.
    pub fn to_sql(&self) -> BuiltQuery {
        let dialect = self.dialect();
        let mut params = SqlParams::default();

        let alias = dialect.quote_ident(self.alias());
        let select_list = if self.columns.is_empty() {
            format!("{}.*", alias)
        } else {
            self.columns
                .iter()
                .map(|c| ColumnRef::new(self.alias(), c.as_str()).to_sql(dialect))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let distinct = if self.relations.is_empty() {
            ""
        } else {
            "DISTINCT "
        };

        let mut sql = format!(
            "SELECT {}{} {}",
            distinct,
            select_list,
            self.from_clause(dialect, &mut params)
        );

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(field, direction)| {
                    dialect.order_by_with_nulls(
                        &ColumnRef::new(self.alias(), field.as_str()).to_sql(dialect),
                        *direction == OrderDirection::Desc,
                        true,
                    )
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some((limit, offset)) = self.page {
            sql.push(' ');
            sql.push_str(&dialect.limit_offset(limit, offset));
        }

        BuiltQuery {
            sql,
            params: params.values,
        }
    }

    /// Render the count query, counting distinct base rows when joined
    pub fn count_sql(&self) -> BuiltQuery {
        let dialect = self.dialect();
        let mut params = SqlParams::default();

        let counted = if self.relations.is_empty() {
            "COUNT(*)".to_string()
        } else {
            format!(
                "COUNT(DISTINCT {})",
                ColumnRef::new(self.alias(), self.entity.primary_key.as_str()).to_sql(dialect)
            )
        };
        let sql = format!(
            "SELECT {} {}",
            counted,
            self.from_clause(dialect, &mut params)
        );

        BuiltQuery {
            sql,
            params: params.values,
        }
    }

    fn from_clause(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        let mut sql = format!("FROM {}", dialect.quote_ident(self.alias()));

        for join in self.relations.iter() {
            sql.push(' ');
            sql.push_str(&join.to_sql(dialect));
        }

        if !self.predicates.is_empty() {
            let conditions: Vec<String> = self
                .predicates
                .iter()
                .map(|p| p.to_sql(dialect, params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql
    }
}
