//! Generic repository for database operations.

use std::marker::PhantomData;

use log::debug;
use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnAsExpr, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, IntoIdentity, Iterable, PaginatorTrait, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    QuerySelect, Value,
};
use serde::Serialize;

use crate::error::Result;
use crate::include::{self, IncludeTree, Loaded};
use crate::ordering::OrderBy;
use crate::properties::{table_name, Navigable};
use crate::storage::{ChangeKind, DbContext, UnitOfWork};

/// Repository for any entity `E`, bound to one [`DbContext`].
///
/// Reads run immediately against the context's connection. Mutations are
/// staged in a [`UnitOfWork`] and written when it is committed.
///
/// # Example
/// ```rust,ignore
/// let context = DbContext::connect("sqlite::memory:").await?;
/// let orders = context.repository::<order::Entity>();
///
/// let by_customer = orders.order_by("Customer.Name", "asc")?;
/// let rows = orders
///     .fetch(Some(order::Column::Total.gt(10).into_condition()), Some(&by_customer), "Customer")
///     .await?;
///
/// let mut uow = UnitOfWork::new();
/// orders.delete_where(&mut uow, order::Column::Total.eq(0)).await?;
/// context.commit(uow).await?;
/// ```
pub struct Repository<'ctx, E: EntityTrait> {
    context: &'ctx DbContext,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> Clone for Repository<'_, E> {
    fn clone(&self) -> Self {
        Self {
            context: self.context,
            _entity: PhantomData,
        }
    }
}

impl<'ctx, E: EntityTrait> Repository<'ctx, E> {
    pub fn new(context: &'ctx DbContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &'ctx DbContext {
        self.context
    }

    fn conn(&self) -> &'ctx DatabaseConnection {
        self.context.connection()
    }
}

impl<'ctx, E> Repository<'ctx, E>
where
    E: Navigable,
    E::Model: Serialize + Sync + IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + 'static,
{
    /// Query the entity set with an optional filter, ordering and includes.
    ///
    /// Without a filter the whole set is read. Include paths are validated
    /// before any query runs. Without an ordering, rows come back in store order.
    ///
    /// # Errors
    /// Returns [`RepositoryError::QueryBuild`](crate::RepositoryError::QueryBuild)
    /// for unknown or malformed include paths and propagates store errors.
    pub async fn fetch(
        &self,
        filter: Option<Condition>,
        order_by: Option<&OrderBy<E>>,
        include: &str,
    ) -> Result<Vec<Loaded<E::Model>>> {
        let includes = IncludeTree::parse_for::<E>(include)?;

        let mut query = E::find();
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        if let Some(order_by) = order_by {
            query = order_by.apply(query);
        }

        let models = query.all(self.conn()).await?;
        debug!(
            "Fetched {} row(s) from '{}'{}",
            models.len(),
            table_name::<E>(),
            order_by.map(|o| format!(" ordered by {} {}", o.path(), o.direction())).unwrap_or_default()
        );

        include::load::<E>(self.conn(), models, &includes).await
    }

    /// First row matching `filter`, in store order.
    pub async fn get<F: IntoCondition>(&self, filter: F) -> Result<Option<E::Model>> {
        Ok(E::find().filter(filter).one(self.conn()).await?)
    }

    /// First row matching `filter`, with the related rows named in `include`.
    pub async fn get_with<F: IntoCondition>(&self, filter: F, include: &str) -> Result<Option<Loaded<E::Model>>> {
        let includes = IncludeTree::parse_for::<E>(include)?;

        let Some(model) = E::find().filter(filter).one(self.conn()).await? else {
            return Ok(None);
        };
        Ok(include::load::<E>(self.conn(), vec![model], &includes).await?.pop())
    }

    /// Look up a row by primary key.
    pub async fn get_by_id<K>(&self, key: K) -> Result<Option<E::Model>>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        Ok(E::find_by_id(key).one(self.conn()).await?)
    }

    /// Every row of the entity set.
    pub async fn get_all(&self) -> Result<Vec<E::Model>> {
        Ok(E::find().all(self.conn()).await?)
    }

    /// Every row matching `filter`.
    pub async fn get_many<F: IntoCondition>(&self, filter: F) -> Result<Vec<E::Model>> {
        Ok(E::find().filter(filter).all(self.conn()).await?)
    }

    /// Rows matching `filter`, reading only `columns` into `R`.
    pub async fn get_by<R, F, I>(&self, filter: F, columns: I) -> Result<Vec<R>>
    where
        R: FromQueryResult,
        F: IntoCondition,
        I: IntoIterator<Item = E::Column>,
    {
        Ok(E::find()
            .filter(filter)
            .select_only()
            .columns(columns)
            .into_model::<R>()
            .all(self.conn())
            .await?)
    }

    /// Rows matching `filter`, reading each `(expression, alias)` pair of
    /// `projection` into the field of `R` named by the alias.
    ///
    /// ```rust,ignore
    /// #[derive(FromQueryResult)]
    /// struct Line { product: String, doubled: i32 }
    ///
    /// let lines: Vec<Line> = items
    ///     .get_by_as(
    ///         line_item::Column::OrderId.eq(10),
    ///         [
    ///             (line_item::Column::Product.into_simple_expr(), "product"),
    ///             (Expr::col(line_item::Column::Quantity).mul(2), "doubled"),
    ///         ],
    ///     )
    ///     .await?;
    /// ```
    pub async fn get_by_as<R, F, C, A, I>(&self, filter: F, projection: I) -> Result<Vec<R>>
    where
        R: FromQueryResult,
        F: IntoCondition,
        C: ColumnAsExpr,
        A: IntoIdentity,
        I: IntoIterator<Item = (C, A)>,
    {
        let mut query = E::find().filter(filter).select_only();
        for (expr, alias) in projection {
            query = query.column_as(expr, alias);
        }
        Ok(query.into_model::<R>().all(self.conn()).await?)
    }

    /// Number of rows matching the optional filter.
    pub async fn count(&self, filter: Option<Condition>) -> Result<u64> {
        let mut query = E::find();
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        Ok(query.count(self.conn()).await?)
    }

    /// Build an ordering for this entity.
    ///
    /// Direction tokens follow [`OrderBy::build`], or [`OrderBy::build_strict`]
    /// when the context was configured with strict directions.
    pub fn order_by(&self, path: &str, direction: &str) -> Result<OrderBy<E>> {
        if self.context.strict_direction() {
            OrderBy::build_strict(path, direction)
        } else {
            OrderBy::build(path, direction)
        }
    }

    /// Stage an insert of `model`, a `Model` or an `ActiveModel`. Returns the
    /// model for chaining.
    ///
    /// With an auto-increment primary key, a key left `NotSet`, or set to
    /// zero or NULL, is assigned by the database on commit.
    pub fn add<M>(&self, uow: &mut UnitOfWork, model: M) -> M
    where
        M: IntoActiveModel<E::ActiveModel> + Clone,
    {
        let mut active: E::ActiveModel = model.clone().into_active_model();
        if <E::PrimaryKey as PrimaryKeyTrait>::auto_increment() {
            for key in E::PrimaryKey::iter() {
                let column = key.into_column();
                if let ActiveValue::Set(value) = active.get(column) {
                    if is_generated_key_placeholder(&value) {
                        active.not_set(column);
                    }
                }
            }
        }
        uow.stage(ChangeKind::Insert, active);
        model
    }

    /// Stage an update writing the `Set` columns of `model`.
    pub fn update(&self, uow: &mut UnitOfWork, model: E::ActiveModel) {
        uow.stage(ChangeKind::Update, model);
    }

    /// Stage removal of `model`, identified by its primary key.
    pub fn delete(&self, uow: &mut UnitOfWork, model: E::Model) {
        let active: E::ActiveModel = model.into_active_model();
        uow.stage(ChangeKind::Remove, active);
    }

    /// Stage removal of every row matching `filter`.
    ///
    /// The matching rows are read now and staged one by one; rows inserted by
    /// other writers before commit are not affected. Returns the number of
    /// staged removals.
    pub async fn delete_where<F: IntoCondition>(&self, uow: &mut UnitOfWork, filter: F) -> Result<usize> {
        let models = E::find().filter(filter).all(self.conn()).await?;
        let staged = models.len();
        for model in models {
            let active: E::ActiveModel = model.into_active_model();
            uow.stage(ChangeKind::Remove, active);
        }

        debug!("Staged {} removal(s) on '{}'", staged, table_name::<E>());
        Ok(staged)
    }
}

fn is_generated_key_placeholder(value: &Value) -> bool {
    matches!(
        value,
        Value::TinyInt(Some(0))
            | Value::SmallInt(Some(0))
            | Value::Int(Some(0))
            | Value::BigInt(Some(0))
            | Value::TinyUnsigned(Some(0))
            | Value::SmallUnsigned(Some(0))
            | Value::Unsigned(Some(0))
            | Value::BigUnsigned(Some(0))
    ) || value.as_null() == *value
}
