//! The fluent SELECT builder.
//!
//! One builder type carries the whole clause chain (joins, filter, grouping,
//! ordering, cardinality); statements render in the fixed grammar
//! `SELECT <cols> FROM [<entity>] [JOIN …]* [WHERE …] [GROUP BY …]
//! [ORDER BY …]`.

use std::marker::PhantomData;
use std::sync::Arc;

use entitystore_core::{Engine, Entity, EntityInfo, EntityInfoCollection, Result};

use crate::clause::{OrderBy, Top};
use crate::condition::{ColumnRef, Filter};
use crate::join::{Join, JoinKind};
use crate::statement::Statement;

/// A SELECT query over one root entity, optionally joined to others.
#[derive(Debug, Clone)]
pub struct SelectQuery<E: Entity> {
    registry: EntityInfoCollection,
    engine: Engine,
    /// Entities participating in the query, root first, in join order
    entities: Vec<Arc<EntityInfo>>,
    joins: Vec<Join>,
    filter: Option<Filter>,
    group_by: Vec<ColumnRef>,
    order_by: Vec<OrderBy>,
    top: Option<Top>,
    _marker: PhantomData<E>,
}

impl<E: Entity> SelectQuery<E> {
    /// Start a query over the root entity, which must be registered.
    pub fn new(registry: &EntityInfoCollection, engine: Engine) -> Result<Self> {
        let root = registry.require::<E>()?;
        Ok(Self {
            registry: registry.clone(),
            engine,
            entities: vec![root],
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            top: None,
            _marker: PhantomData,
        })
    }

    /// Join another registered entity, deriving the ON predicate from the
    /// declared foreign key between it and the entities already in the chain.
    pub fn join<F: Entity>(self) -> Result<Self> {
        self.add_join::<F>(JoinKind::Inner)
    }

    /// Left-join another registered entity.
    pub fn left_join<F: Entity>(self) -> Result<Self> {
        self.add_join::<F>(JoinKind::Left)
    }

    fn add_join<F: Entity>(mut self, kind: JoinKind) -> Result<Self> {
        let joined = self.registry.require::<F>()?;
        let chain: Vec<&EntityInfo> = self.entities.iter().map(Arc::as_ref).collect();
        let join = Join::resolve(kind, &chain, &joined)?;
        self.joins.push(join);
        self.entities.push(joined);
        Ok(self)
    }

    /// Add a filter; successive calls AND-combine.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Add a filter OR-combined with what is already there.
    pub fn or_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter {
            Some(existing) => existing.or(filter),
            None => filter,
        });
        self
    }

    /// Group by the given columns.
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by
            .extend(columns.iter().map(|c| ColumnRef::new(*c)));
        self
    }

    /// Primary ordering.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Secondary ordering, appended after the existing ones.
    pub fn then_by(self, order: OrderBy) -> Self {
        self.order_by(order)
    }

    /// Constrain result cardinality.
    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(Top(n));
        self
    }

    /// Does this query join more than one entity?
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Metadata of the root entity.
    pub fn root(&self) -> &Arc<EntityInfo> {
        &self.entities[0]
    }

    /// The engine this query renders for.
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Render the SELECT statement.
    ///
    /// Single-entity queries select `*`; joined queries select every field of
    /// every participating entity under the deterministic `<Entity><Field>`
    /// alias so the serializer can disambiguate same-named columns.
    pub fn to_statement(&self) -> Statement {
        let column_list = if self.joins.is_empty() {
            "*".to_string()
        } else {
            let mut columns = Vec::new();
            for info in &self.entities {
                let entity = info.entity_name();
                for field in info.fields() {
                    columns.push(format!(
                        "{}.{} AS {}{}",
                        self.engine.quote(entity),
                        field.name,
                        entity,
                        field.name
                    ));
                }
            }
            columns.join(", ")
        };
        self.render(&column_list, false)
    }

    /// Render a COUNT statement; with a column argument the count composes
    /// with GROUP BY into generic aggregate rows.
    pub fn count_statement(&self, column: Option<&str>) -> Statement {
        let column_list = match column {
            Some(column) => {
                let aggregate = format!("COUNT({}) AS {}Count", column, column);
                self.aggregate_columns(aggregate)
            }
            None => "COUNT(*) AS Count".to_string(),
        };
        self.render(&column_list, true)
    }

    /// Render a SUM statement over a column, composing with GROUP BY.
    pub fn sum_statement(&self, column: &str) -> Statement {
        let aggregate = format!("SUM({}) AS {}Sum", column, column);
        self.render(&self.aggregate_columns(aggregate), true)
    }

    fn aggregate_columns(&self, aggregate: String) -> String {
        if self.group_by.is_empty() {
            aggregate
        } else {
            let mut columns: Vec<String> = self
                .group_by
                .iter()
                .map(|c| c.render(self.engine))
                .collect();
            columns.push(aggregate);
            columns.join(", ")
        }
    }

    fn render(&self, column_list: &str, aggregate: bool) -> Statement {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT ");

        // TOP constrains cardinality right after SELECT on SQL Server CE
        if !aggregate {
            if let (Some(Top(n)), Engine::SqlServerCe) = (self.top, self.engine) {
                sql.push_str(&format!("TOP ({n}) "));
            }
        }

        sql.push_str(column_list);
        sql.push_str(" FROM ");
        sql.push_str(&self.engine.quote(self.entities[0].entity_name()));

        for join in &self.joins {
            sql.push_str(&join.build(self.engine));
        }

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.build(self.engine, &mut params, 0));
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            let columns: Vec<String> = self
                .group_by
                .iter()
                .map(|c| c.render(self.engine))
                .collect();
            sql.push_str(&columns.join(", "));
        }

        if !aggregate && !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders: Vec<String> = self.order_by.iter().map(|o| o.build(self.engine)).collect();
            sql.push_str(&orders.join(", "));
        }

        if !aggregate {
            if let (Some(Top(n)), Engine::Sqlite) = (self.top, self.engine) {
                sql.push_str(&format!(" LIMIT {n}"));
            }
        }

        tracing::trace!(sql = %sql, params = params.len(), "rendered select");
        Statement::new(sql, params)
    }
}
