//! Predicate compilation
//!
//! Walks a [`Descriptor`] and extends a [`SelectQuery`] with one predicate
//! per constraint. Stages run in a fixed order (search, explicit filters,
//! numeric intervals, date intervals) and are ANDed at the top level; OR is
//! only used among the candidate columns of one search.
//!
//! Fragments are collected first and pushed onto the query once every stage
//! succeeded. On error the query is rolled back to its state before the
//! call, joins included.

use super::coercer::{coerce_interval, coerce_scalar};
use super::config::FilterConfig;
use super::descriptor::{ComparisonOperator, Descriptor, FilterValue, ScalarValue, SearchMode};
use super::error::FilterError;
use super::resolver::{ColumnResolver, ResolvedColumn};
use crate::data::{ColumnExpr, Predicate, SelectQuery, SqlDialect, SqlValue};
use crate::utils::sql::escape_like_pattern;

/// Fragments emitted per stage, for logging
#[derive(Debug, Default, Clone, Copy)]
struct StageCounts {
    search: usize,
    filters: usize,
    intervals: usize,
    date_intervals: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PredicateCompiler {
    config: FilterConfig,
}

impl PredicateCompiler {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Apply every constraint of the descriptor to the query
    pub fn apply(
        &self,
        descriptor: &Descriptor,
        query: &mut SelectQuery<'_>,
    ) -> Result<(), FilterError> {
        tracing::debug!(entity = %query.entity_name(), "Compiling descriptor");

        let checkpoint = query.checkpoint();
        let (fragments, counts) = match self.compile(descriptor, query) {
            Ok(compiled) => compiled,
            Err(e) => {
                query.rollback(checkpoint);
                tracing::debug!(error = %e, code = e.code(), "Descriptor rejected");
                return Err(e);
            }
        };

        for fragment in fragments {
            query.and_where(fragment);
        }

        tracing::debug!(
            search = counts.search,
            filters = counts.filters,
            intervals = counts.intervals,
            date_intervals = counts.date_intervals,
            joins = query.relations().len(),
            "Descriptor compiled"
        );
        Ok(())
    }

    fn compile(
        &self,
        descriptor: &Descriptor,
        query: &mut SelectQuery<'_>,
    ) -> Result<(Vec<Predicate>, StageCounts), FilterError> {
        let dialect = query.dialect();
        let mut resolver = ColumnResolver::new(query);
        let mut fragments = Vec::new();

        let counts = StageCounts {
            search: self.search(descriptor, &mut resolver, &mut fragments)?,
            filters: self.filters(descriptor, &mut resolver, &mut fragments)?,
            intervals: self.intervals(descriptor, &mut resolver, &mut fragments, dialect, false)?,
            date_intervals: self.intervals(descriptor, &mut resolver, &mut fragments, dialect, true)?,
        };

        Ok((fragments, counts))
    }

    fn search(
        &self,
        descriptor: &Descriptor,
        resolver: &mut ColumnResolver<'_, '_>,
        fragments: &mut Vec<Predicate>,
    ) -> Result<usize, FilterError> {
        let Some(term) = descriptor.search.trimmed_term() else {
            return Ok(0);
        };

        let columns = descriptor
            .searchable_columns()
            .map(|column| resolver.resolve(&column.data))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            tracing::warn!(term, "Search term ignored, no column is searchable");
            return Ok(0);
        }

        let operator = descriptor
            .search
            .operator
            .unwrap_or(self.config.default_operator);
        let tokens: Vec<&str> = if self.config.tokenize_search {
            term.split_whitespace().collect()
        } else {
            vec![term]
        };

        for token in &tokens {
            let alternatives: Vec<Predicate> = columns
                .iter()
                .map(|column| search_fragment(column, token, operator, descriptor.search.mode))
                .collect();
            tracing::trace!(token, columns = alternatives.len(), "Search fragment");
            fragments.push(Predicate::Or(alternatives));
        }

        Ok(tokens.len())
    }

    fn filters(
        &self,
        descriptor: &Descriptor,
        resolver: &mut ColumnResolver<'_, '_>,
        fragments: &mut Vec<Predicate>,
    ) -> Result<usize, FilterError> {
        let mut count = 0;

        for (entity, fields) in &descriptor.filters {
            for (field, value) in fields {
                if value.is_empty() {
                    tracing::trace!(%entity, %field, "Skipping empty filter");
                    continue;
                }

                let resolved = resolver.resolve_in(entity, field)?;
                let coerce = |v: &ScalarValue| {
                    coerce_scalar(resolved.kind, v)
                        .map_err(|reason| FilterError::invalid_filter(entity, field, reason))
                };

                let fragment = match value {
                    FilterValue::Scalar(v) => Predicate::equals(resolved.column(), coerce(v)?),
                    FilterValue::List(values) => {
                        let values = values
                            .iter()
                            .filter(|v| !v.is_blank())
                            .map(coerce)
                            .collect::<Result<Vec<_>, _>>()?;
                        Predicate::In {
                            column: resolved.column().into(),
                            values,
                        }
                    }
                    FilterValue::Null => continue,
                };

                tracing::trace!(%entity, %field, "Filter fragment");
                fragments.push(fragment);
                count += 1;
            }
        }

        Ok(count)
    }

    fn intervals(
        &self,
        descriptor: &Descriptor,
        resolver: &mut ColumnResolver<'_, '_>,
        fragments: &mut Vec<Predicate>,
        dialect: &dyn SqlDialect,
        dates: bool,
    ) -> Result<usize, FilterError> {
        let mut count = 0;

        for (entity, fields) in &descriptor.intervals {
            for (field, spec) in fields {
                if spec.is_date() != dates {
                    continue;
                }
                if spec.bounds().is_none() {
                    tracing::trace!(%entity, %field, "Skipping interval without both bounds");
                    continue;
                }

                let resolved = resolver.resolve_in(entity, field)?;
                let Some(coerced) = coerce_interval(
                    entity,
                    field,
                    spec,
                    resolved.kind,
                    self.config.inverted_intervals,
                )?
                else {
                    continue;
                };

                let column = match coerced.storage_format {
                    Some(format) => {
                        let rendered = resolved.column().to_sql(dialect);
                        if dialect.format_date(&rendered, &format).is_none() {
                            return Err(FilterError::invalid_interval(
                                entity,
                                field,
                                format!(
                                    "date format '{}' is not supported by {}",
                                    format,
                                    dialect.name()
                                ),
                            ));
                        }
                        ColumnExpr::Date {
                            column: resolved.column(),
                            format,
                        }
                    }
                    None => resolved.column().into(),
                };

                tracing::trace!(%entity, %field, min = %coerced.min, max = %coerced.max, "Interval fragment");
                fragments.push(Predicate::Between {
                    column,
                    min: coerced.min,
                    max: coerced.max,
                });
                count += 1;
            }
        }

        Ok(count)
    }
}

fn search_fragment(
    column: &ResolvedColumn,
    term: &str,
    operator: ComparisonOperator,
    mode: SearchMode,
) -> Predicate {
    let expr = if column.kind.is_text() {
        ColumnExpr::Plain(column.column())
    } else {
        ColumnExpr::AsText(column.column())
    };

    match operator {
        ComparisonOperator::Equals => Predicate::Equals {
            column: expr,
            value: SqlValue::Text(term.to_string()),
        },
        ComparisonOperator::Like | ComparisonOperator::ILike => Predicate::Like {
            column: expr,
            pattern: mode.pattern(&escape_like_pattern(term)),
            case_insensitive: operator == ComparisonOperator::ILike,
        },
    }
}
