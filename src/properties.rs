//! Property graph used to resolve ordering and include paths.
//!
//! Scalar properties are reflected from an entity's SeaORM column enum.
//! Navigation properties have no column of their own, so each entity lists
//! them through [`Navigable::navigations`], pointing at the SeaORM
//! [`RelationDef`] that joins the two tables.
//!
//! Names are matched case-insensitively and underscores are ignored, so the
//! path segment `"OrderIndex"` finds the column `order_index` and
//! `"customer"` finds a navigation registered as `"Customer"`.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::{Iden, TableRef};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, IdenStatic, Identity, Iterable, ModelTrait, QueryFilter,
    RelationDef, RelationType, Value,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::constants::INCLUDE_BATCH_SIZE;
use crate::error::{RepositoryError, Result};
use crate::include::{self, IncludeNode};
use crate::ordering::{self, SortTarget};

/// Entities whose navigation properties can be used in ordering and include paths.
///
/// Entities without navigations can rely on the default implementation:
///
/// ```rust,ignore
/// impl Navigable for tag::Entity {}
/// ```
///
/// Entities with navigations register them against their SeaORM relations:
///
/// ```rust,ignore
/// impl Navigable for order::Entity {
///     fn navigations() -> NavigationMap<Self> {
///         NavigationMap::new()
///             .with::<customer::Entity>("Customer", order::Relation::Customer.def())
///             .with::<line_item::Entity>("Items", order::Relation::LineItems.def())
///     }
/// }
/// ```
pub trait Navigable: EntityTrait {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new()
    }
}

/// Normalize a property, column or navigation name for lookup.
pub(crate) fn normalize(name: &str) -> String {
    name.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect()
}

/// Find the column of `E` whose name matches `name`.
pub fn find_column<E: EntityTrait>(name: &str) -> Option<E::Column> {
    let wanted = normalize(name);
    E::Column::iter().find(|column| normalize(column.as_str()) == wanted)
}

pub(crate) fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

fn single_column(identity: &Identity) -> Option<String> {
    match identity {
        Identity::Unary(iden) => Some(Iden::to_string(&**iden)),
        _ => None,
    }
}

fn table_ref_name(table: &TableRef) -> Option<String> {
    match table {
        TableRef::Table(iden)
        | TableRef::SchemaTable(_, iden)
        | TableRef::DatabaseSchemaTable(_, _, iden)
        | TableRef::TableAlias(iden, _)
        | TableRef::SchemaTableAlias(_, iden, _)
        | TableRef::DatabaseSchemaTableAlias(_, _, iden, _) => Some(Iden::to_string(&**iden)),
        _ => None,
    }
}

/// Check that `relation` joins `from` to `to` on one column each.
fn relation_columns(
    name: &str,
    relation: &RelationDef,
    from: &str,
    to: &str,
) -> std::result::Result<(String, String), String> {
    let from_table = table_ref_name(&relation.from_tbl);
    let to_table = table_ref_name(&relation.to_tbl);
    if from_table.as_deref() != Some(from) || to_table.as_deref() != Some(to) {
        return Err(format!(
            "Navigation '{}' is registered from '{}' to '{}', but its relation joins '{}' to '{}'",
            name,
            from,
            to,
            from_table.as_deref().unwrap_or("?"),
            to_table.as_deref().unwrap_or("?")
        ));
    }

    match (single_column(&relation.from_col), single_column(&relation.to_col)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(format!("Navigation '{}' uses a composite key, which is not supported", name)),
    }
}

/// Join key value compared across column types, so an `i64` foreign key
/// matches an `i32` primary key. `None` for NULL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum JoinKey {
    Integer(i128),
    Text(String),
    Other(String),
}

impl JoinKey {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let key = match value {
            Value::TinyInt(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::SmallInt(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::Int(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::BigInt(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::TinyUnsigned(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::SmallUnsigned(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::Unsigned(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::BigUnsigned(Some(v)) => JoinKey::Integer(i128::from(*v)),
            Value::String(Some(v)) => JoinKey::Text(v.to_string()),
            Value::Char(Some(v)) => JoinKey::Text(v.to_string()),
            other if other.as_null() == *other => return None,
            other => JoinKey::Other(format!("{:?}", other)),
        };
        Some(key)
    }
}

/// Case-insensitive map of the navigation properties of `E`.
#[must_use]
pub struct NavigationMap<E: EntityTrait> {
    map: HashMap<String, Navigation<E>>,
}

impl<E: EntityTrait> Default for NavigationMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> NavigationMap<E> {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Register a navigation named `name` leading to entity `U` through `relation`.
    ///
    /// A has-many relation registers a collection navigation: it can be
    /// included, but ordering paths cannot walk through it.
    pub fn with<U>(mut self, name: impl Into<String>, relation: RelationDef) -> Self
    where
        E::Model: Sync,
        U: Navigable,
        U::Model: Serialize + Sync,
    {
        let name = name.into();
        let columns = relation_columns(&name, &relation, &table_name::<E>(), &table_name::<U>());

        self.map.insert(
            normalize(&name),
            Navigation {
                name,
                collection: matches!(relation.rel_type, RelationType::HasMany),
                columns,
                target: Arc::new(Target::<E, U> { _entities: PhantomData }),
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Navigation<E>> {
        self.map.get(&normalize(name))
    }

    /// Registered navigation names, as given at registration.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.values().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A navigation property from `E` to another entity.
pub struct Navigation<E: EntityTrait> {
    name: String,
    collection: bool,
    columns: std::result::Result<(String, String), String>,
    target: Arc<dyn NavigationTarget<E>>,
}

impl<E: EntityTrait> Navigation<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the navigation leads to many rows (a has-many relation).
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Name of the table the navigation leads to.
    pub fn target_table(&self) -> String {
        self.target.table()
    }

    /// Join columns as `(column on E, column on the target)`.
    ///
    /// Fails for composite keys and for relations that do not join `E` to the
    /// navigation's target entity.
    pub(crate) fn join_columns(&self) -> Result<(&str, &str)> {
        self.columns
            .as_ref()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .map_err(|message| RepositoryError::QueryBuild(message.clone()))
    }

    pub(crate) fn target(&self) -> &dyn NavigationTarget<E> {
        self.target.as_ref()
    }
}

/// Type-erased access to the entity a navigation leads to.
#[async_trait]
pub(crate) trait NavigationTarget<E: EntityTrait>: Send + Sync {
    fn table(&self) -> String;

    /// Resolve the remaining ordering path segments on the target entity.
    fn resolve(&self, rest: &[&str], path: &str, resolved: &mut Vec<String>) -> Result<SortTarget>;

    /// Validate nested include nodes against the target entity.
    fn validate(&self, children: &[IncludeNode]) -> Result<()>;

    /// Load the related rows of every parent, in parent order.
    async fn load(
        &self,
        db: &DatabaseConnection,
        from: &str,
        to: &str,
        parents: &[E::Model],
        children: &[IncludeNode],
    ) -> Result<Vec<Vec<JsonValue>>>;
}

struct Target<E, U> {
    _entities: PhantomData<fn() -> (E, U)>,
}

fn join_column<X: EntityTrait>(name: &str) -> Result<X::Column> {
    find_column::<X>(name).ok_or_else(|| {
        RepositoryError::QueryBuild(format!("Column '{}' not found on '{}'", name, table_name::<X>()))
    })
}

#[async_trait]
impl<E, U> NavigationTarget<E> for Target<E, U>
where
    E: EntityTrait,
    E::Model: Sync,
    U: Navigable,
    U::Model: Serialize + Sync,
{
    fn table(&self) -> String {
        table_name::<U>()
    }

    fn resolve(&self, rest: &[&str], path: &str, resolved: &mut Vec<String>) -> Result<SortTarget> {
        ordering::resolve_path::<U>(rest, path, resolved)
    }

    fn validate(&self, children: &[IncludeNode]) -> Result<()> {
        include::validate_nodes::<U>(children)
    }

    async fn load(
        &self,
        db: &DatabaseConnection,
        from: &str,
        to: &str,
        parents: &[E::Model],
        children: &[IncludeNode],
    ) -> Result<Vec<Vec<JsonValue>>> {
        let from = join_column::<E>(from)?;
        let to = join_column::<U>(to)?;

        let parent_keys: Vec<Option<JoinKey>> =
            parents.iter().map(|parent| JoinKey::from_value(&parent.get(from))).collect();

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for (parent, key) in parents.iter().zip(&parent_keys) {
            if let Some(key) = key {
                if seen.insert(key.clone()) {
                    values.push(parent.get(from));
                }
            }
        }

        let mut related = Vec::new();
        for chunk in values.chunks(INCLUDE_BATCH_SIZE) {
            let rows = U::find().filter(to.is_in(chunk.iter().cloned())).all(db).await?;
            related.extend(rows);
        }
        debug!(
            "Loaded {} related row(s) from '{}' for {} key(s)",
            related.len(),
            table_name::<U>(),
            values.len()
        );

        let nested = include::load_nodes::<U>(db, &related, children).await?;

        let mut grouped: HashMap<JoinKey, Vec<JsonValue>> = HashMap::new();
        for (model, nested) in related.iter().zip(nested) {
            let Some(key) = JoinKey::from_value(&model.get(to)) else {
                continue;
            };
            let mut value = serde_json::to_value(model)?;
            if let JsonValue::Object(object) = &mut value {
                for (name, nested_rows) in nested {
                    object.insert(name, JsonValue::Array(nested_rows));
                }
            }
            grouped.entry(key).or_default().push(value);
        }

        Ok(parent_keys
            .iter()
            .map(|key| {
                key.as_ref()
                    .and_then(|key| grouped.get(key))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }
}
