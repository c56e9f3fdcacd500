//! Dynamic ordering built from a property path and a direction token.
//!
//! A path such as `"Customer.Name"` is resolved segment by segment against the
//! entity's [`Navigable`] property graph when the ordering is built. The
//! result is an [`OrderBy`]: an immutable combinator that adds the needed
//! joins and the `ORDER BY` clause to any `Select` of the entity.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use log::{debug, warn};
use sea_orm::sea_query::{Alias, Expr, JoinType, SimpleExpr};
use sea_orm::{EntityTrait, IdenStatic, Iterable, Order, PrimaryKeyToColumn, QueryOrder, QueryTrait, Select};

use crate::constants::{DIRECTION_ASC, DIRECTION_DESC, ORDER_JOIN_ALIAS_PREFIX, PATH_SEPARATOR};
use crate::error::{RepositoryError, Result};
use crate::properties::{find_column, table_name, Navigable};

/// Sort direction of an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Permissive parsing: exactly `"asc"` is ascending, anything else is descending.
    pub fn from_token(token: &str) -> Self {
        if token == DIRECTION_ASC {
            return SortDirection::Asc;
        }
        if token != DIRECTION_DESC {
            warn!("Sort direction '{}' is not 'asc' or 'desc', ordering descending", token);
        }
        SortDirection::Desc
    }

    /// Strict parsing: only `"asc"` and `"desc"` are accepted.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            DIRECTION_ASC => Ok(SortDirection::Asc),
            DIRECTION_DESC => Ok(SortDirection::Desc),
            other => Err(RepositoryError::InvalidDirection(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => DIRECTION_ASC,
            SortDirection::Desc => DIRECTION_DESC,
        }
    }
}

impl FromStr for SortDirection {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// One LEFT JOIN walked by an ordering path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JoinStep {
    pub(crate) table: String,
    pub(crate) from_column: String,
    pub(crate) to_column: String,
}

/// A fully resolved ordering path: the joins to walk and the column to sort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SortTarget {
    pub(crate) joins: Vec<JoinStep>,
    pub(crate) column: String,
}

/// Resolve `segments` on entity `E`, recording the resolved names in `resolved`.
pub(crate) fn resolve_path<E: Navigable>(
    segments: &[&str],
    path: &str,
    resolved: &mut Vec<String>,
) -> Result<SortTarget> {
    let Some((segment, rest)) = segments.split_first() else {
        return Err(RepositoryError::unresolved("", path, resolved));
    };

    if let Some(column) = find_column::<E>(segment) {
        resolved.push(column.as_str().to_string());
        // A scalar has no properties of its own.
        return match rest.first() {
            None => Ok(SortTarget {
                joins: Vec::new(),
                column: column.as_str().to_string(),
            }),
            Some(next) => Err(RepositoryError::unresolved(next, path, resolved)),
        };
    }

    let navigations = E::navigations();
    let Some(navigation) = navigations.get(segment) else {
        return Err(RepositoryError::unresolved(segment, path, resolved));
    };
    resolved.push(navigation.name().to_string());

    if navigation.is_collection() {
        return Err(match rest.first() {
            Some(next) => RepositoryError::unresolved(next, path, resolved),
            None => RepositoryError::QueryBuild(format!(
                "Path '{}' ends on collection navigation '{}'",
                path,
                navigation.name()
            )),
        });
    }
    if rest.is_empty() {
        return Err(RepositoryError::QueryBuild(format!(
            "Path '{}' ends on navigation '{}', which has no sortable value",
            path,
            navigation.name()
        )));
    }

    let (from, to) = navigation.join_columns()?;
    let step = JoinStep {
        table: navigation.target_table(),
        from_column: from.to_string(),
        to_column: to.to_string(),
    };
    let mut target = navigation.target().resolve(rest, path, resolved)?;
    target.joins.insert(0, step);
    Ok(target)
}

/// A reusable ordering for `Select<E>` queries.
///
/// Built once by [`OrderBy::build`]; applying it never fails, since every
/// path segment was resolved at build time.
#[derive(Debug, Clone)]
pub struct OrderBy<E: EntityTrait> {
    path: String,
    direction: SortDirection,
    target: SortTarget,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Navigable> OrderBy<E> {
    /// Build an ordering from `path` and a direction token.
    ///
    /// The token `"asc"` orders ascending; any other token orders descending.
    ///
    /// # Errors
    /// Returns [`RepositoryError::PropertyResolution`] when a path segment does
    /// not resolve, and [`RepositoryError::QueryBuild`] when the path ends on a
    /// navigation or walks a composite-key relation.
    pub fn build(path: &str, direction: &str) -> Result<Self> {
        Self::with_direction(path, SortDirection::from_token(direction))
    }

    /// Like [`OrderBy::build`], but rejects direction tokens other than `"asc"` and `"desc"`.
    pub fn build_strict(path: &str, direction: &str) -> Result<Self> {
        Self::with_direction(path, SortDirection::parse(direction)?)
    }

    pub fn with_direction(path: &str, direction: SortDirection) -> Result<Self> {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let mut resolved = Vec::with_capacity(segments.len());
        let target = resolve_path::<E>(&segments, path, &mut resolved)?;

        debug!(
            "Resolved ordering '{}' {} on '{}' as {} ({} join(s))",
            path,
            direction,
            table_name::<E>(),
            resolved.join("."),
            target.joins.len()
        );

        Ok(Self {
            path: path.to_string(),
            direction,
            target,
            _entity: PhantomData,
        })
    }
}

impl<E: EntityTrait> OrderBy<E> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Name of the column the ordering sorts on.
    pub fn column(&self) -> &str {
        &self.target.column
    }

    /// Number of tables joined to reach the sort column.
    pub fn join_count(&self) -> usize {
        self.target.joins.len()
    }

    /// Apply the ordering to a query.
    ///
    /// Rows with equal sort values are ordered by primary key ascending.
    pub fn apply(&self, mut select: Select<E>) -> Select<E> {
        let mut previous = table_name::<E>();

        for (index, join) in self.target.joins.iter().enumerate() {
            let alias = format!("{}{}", ORDER_JOIN_ALIAS_PREFIX, index);
            QueryTrait::query(&mut select).join_as(
                JoinType::LeftJoin,
                Alias::new(join.table.as_str()),
                Alias::new(alias.as_str()),
                Expr::col((Alias::new(previous.as_str()), Alias::new(join.from_column.as_str())))
                    .equals((Alias::new(alias.as_str()), Alias::new(join.to_column.as_str()))),
            );
            previous = alias;
        }

        let sort_column: SimpleExpr =
            Expr::col((Alias::new(previous.as_str()), Alias::new(self.target.column.as_str()))).into();
        select = select.order_by(sort_column, self.direction.into());

        for key in E::PrimaryKey::iter() {
            select = select.order_by(key.into_column(), Order::Asc);
        }
        select
    }
}
