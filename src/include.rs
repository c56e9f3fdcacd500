//! Eager loading of related rows requested through include paths.
//!
//! An include spec is a comma-separated list of navigation paths, for example
//! `"Customer.Address, Items"`. Every path is validated against the entity's
//! navigation registry before any query runs. Each navigation is then loaded
//! with one batched query for the whole parent set.

use std::collections::BTreeMap;

use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::constants::{INCLUDE_SEPARATOR, PATH_SEPARATOR};
use crate::error::{RepositoryError, Result};
use crate::properties::{normalize, table_name, Navigable};

/// One navigation to load, with the navigations to load beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeNode {
    pub(crate) name: String,
    pub(crate) children: Vec<IncludeNode>,
}

impl IncludeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[IncludeNode] {
        &self.children
    }
}

/// Parsed include spec. Paths sharing a prefix are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeTree {
    nodes: Vec<IncludeNode>,
}

impl IncludeTree {
    /// Parse an include spec without checking it against any entity.
    ///
    /// Empty entries between commas are skipped. An empty segment inside a
    /// dotted path is malformed.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut nodes = Vec::new();

        for entry in spec.split(INCLUDE_SEPARATOR).map(str::trim).filter(|e| !e.is_empty()) {
            let segments: Vec<&str> = entry.split(PATH_SEPARATOR).map(str::trim).collect();
            if segments.iter().any(|segment| segment.is_empty()) {
                return Err(RepositoryError::QueryBuild(format!("Malformed include path '{}'", entry)));
            }
            insert(&mut nodes, &segments);
        }

        Ok(Self { nodes })
    }

    /// Parse an include spec and validate it against the navigations of `E`.
    pub fn parse_for<E: Navigable>(spec: &str) -> Result<Self> {
        let tree = Self::parse(spec)?;
        tree.validate::<E>()?;
        Ok(tree)
    }

    pub fn validate<E: Navigable>(&self) -> Result<()> {
        validate_nodes::<E>(&self.nodes)
    }

    pub fn nodes(&self) -> &[IncludeNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn insert(nodes: &mut Vec<IncludeNode>, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    let key = normalize(first);
    let index = match nodes.iter().position(|node| normalize(&node.name) == key) {
        Some(index) => index,
        None => {
            nodes.push(IncludeNode {
                name: first.to_string(),
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };
    insert(&mut nodes[index].children, rest);
}

pub(crate) fn validate_nodes<E: Navigable>(nodes: &[IncludeNode]) -> Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }

    let navigations = E::navigations();
    for node in nodes {
        let navigation = navigations.get(&node.name).ok_or_else(|| {
            RepositoryError::QueryBuild(format!(
                "Unknown include '{}' on '{}' (available: {})",
                node.name,
                table_name::<E>(),
                available(&navigations.names())
            ))
        })?;
        navigation.join_columns()?;
        navigation.target().validate(&node.children)?;
    }
    Ok(())
}

fn available(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Load the included navigations of every model, in model order.
pub(crate) async fn load_nodes<E>(
    db: &DatabaseConnection,
    models: &[E::Model],
    nodes: &[IncludeNode],
) -> Result<Vec<BTreeMap<String, Vec<JsonValue>>>>
where
    E: Navigable,
    E::Model: Serialize + Sync,
{
    let mut related = vec![BTreeMap::new(); models.len()];
    if nodes.is_empty() || models.is_empty() {
        return Ok(related);
    }

    let navigations = E::navigations();
    for node in nodes {
        let navigation = navigations.get(&node.name).ok_or_else(|| {
            RepositoryError::QueryBuild(format!("Unknown include '{}' on '{}'", node.name, table_name::<E>()))
        })?;
        let (from, to) = navigation.join_columns()?;
        let rows = navigation.target().load(db, from, to, models, &node.children).await?;
        for (slot, rows) in related.iter_mut().zip(rows) {
            slot.insert(navigation.name().to_string(), rows);
        }
    }

    Ok(related)
}

/// Attach the included navigations to freshly materialized models.
pub(crate) async fn load<E>(
    db: &DatabaseConnection,
    models: Vec<E::Model>,
    tree: &IncludeTree,
) -> Result<Vec<Loaded<E::Model>>>
where
    E: Navigable,
    E::Model: Serialize + Sync,
{
    let related = load_nodes::<E>(db, &models, &tree.nodes).await?;
    Ok(models
        .into_iter()
        .zip(related)
        .map(|(model, related)| Loaded { model, related })
        .collect())
}

/// A materialized model with the related rows loaded for its includes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loaded<M> {
    pub model: M,
    /// Related rows keyed by navigation name. Nested includes are embedded
    /// in each related object under the nested navigation's name.
    pub related: BTreeMap<String, Vec<JsonValue>>,
}

impl<M> Loaded<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            related: BTreeMap::new(),
        }
    }

    /// Related rows loaded for `navigation`; empty when it was not included.
    pub fn related(&self, navigation: &str) -> &[JsonValue] {
        let key = normalize(navigation);
        self.related
            .iter()
            .find(|(name, _)| normalize(name) == key)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    /// Related rows for `navigation`, deserialized into `R`.
    pub fn related_as<R: DeserializeOwned>(&self, navigation: &str) -> Result<Vec<R>> {
        self.related(navigation)
            .iter()
            .map(|value| serde_json::from_value(value.clone()).map_err(RepositoryError::from))
            .collect()
    }

    pub fn into_model(self) -> M {
        self.model
    }
}
