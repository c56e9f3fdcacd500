//! Pending changes staged by repositories and flushed on commit.

use std::fmt;

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, TransactionTrait};

use crate::error::Result;
use crate::properties::table_name;
use crate::storage::DbContext;

/// Kind of a staged change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Remove,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Remove => "remove",
        };
        f.write_str(label)
    }
}

/// Description of one staged change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub kind: ChangeKind,
    pub table: String,
}

/// Counts of the changes written by a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.removed
    }

    fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Insert => self.inserted += 1,
            ChangeKind::Update => self.updated += 1,
            ChangeKind::Remove => self.removed += 1,
        }
    }
}

#[async_trait]
trait StagedChange: Send {
    fn describe(&self) -> PendingChange;

    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<()>;
}

struct Staged<A> {
    kind: ChangeKind,
    table: String,
    model: A,
}

#[async_trait]
impl<A> StagedChange for Staged<A>
where
    A: ActiveModelTrait + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    fn describe(&self) -> PendingChange {
        PendingChange {
            kind: self.kind,
            table: self.table.clone(),
        }
    }

    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<()> {
        let Staged { kind, model, .. } = *self;
        match kind {
            ChangeKind::Insert => {
                <A::Entity as EntityTrait>::insert(model).exec_without_returning(txn).await?;
            }
            ChangeKind::Update => {
                <A::Entity as EntityTrait>::update(model).exec(txn).await?;
            }
            ChangeKind::Remove => {
                <A::Entity as EntityTrait>::delete(model).exec(txn).await?;
            }
        }
        Ok(())
    }
}

/// An explicit unit of work: the ordered list of changes staged by repositories.
///
/// Nothing is written until [`UnitOfWork::commit`] (or [`DbContext::commit`])
/// applies the changes, in staging order, inside one engine transaction.
#[derive(Default)]
pub struct UnitOfWork {
    changes: Vec<Box<dyn StagedChange>>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stage<A>(&mut self, kind: ChangeKind, model: A)
    where
        A: ActiveModelTrait + Send + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let table = table_name::<A::Entity>();
        debug!("Staged {} on '{}'", kind, table);
        self.changes.push(Box::new(Staged { kind, table, model }));
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Staged changes, in the order they will be applied.
    pub fn pending(&self) -> Vec<PendingChange> {
        self.changes.iter().map(|change| change.describe()).collect()
    }

    /// Drop every staged change.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Apply every staged change inside one transaction.
    ///
    /// # Errors
    /// Returns the first store error; the transaction is rolled back and no
    /// staged change is kept.
    pub async fn commit(self, context: &DbContext) -> Result<CommitSummary> {
        let mut summary = CommitSummary::default();
        if self.changes.is_empty() {
            return Ok(summary);
        }

        let txn = context.connection().begin().await?;
        for change in self.changes {
            let kind = change.describe().kind;
            change.apply(&txn).await?;
            summary.record(kind);
        }
        txn.commit().await?;

        info!(
            "Committed {} change(s): {} inserted, {} updated, {} removed",
            summary.total(),
            summary.inserted,
            summary.updated,
            summary.removed
        );
        Ok(summary)
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork").field("pending", &self.pending()).finish()
    }
}
