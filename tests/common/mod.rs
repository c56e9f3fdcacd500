#![allow(dead_code)]

use query_repository::{DbContext, Navigable, NavigationMap};
use sea_orm::{ConnectionTrait, EntityTrait, RelationTrait};

pub mod address {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "addresses")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub city: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod customer {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "customers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub name: String,
        pub address_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::address::Entity",
            from = "Column::AddressId",
            to = "super::address::Column::Id"
        )]
        Address,
        #[sea_orm(has_many = "super::order::Entity")]
        Orders,
    }

    impl Related<super::address::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Address.def()
        }
    }

    impl Related<super::order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Orders.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod order {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "orders")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub customer_id: Option<i32>,
        pub total: i32,
        pub note: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customer::Entity",
            from = "Column::CustomerId",
            to = "super::customer::Column::Id"
        )]
        Customer,
        #[sea_orm(has_many = "super::line_item::Entity")]
        LineItems,
    }

    impl Related<super::customer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl Related<super::line_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::LineItems.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod line_item {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "line_items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub order_id: i32,
        pub product: String,
        pub quantity: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::order::Entity",
            from = "Column::OrderId",
            to = "super::order::Column::Id"
        )]
        Order,
    }

    impl Related<super::order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Order.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod tag {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub label: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Database-assigned keys and a 64-bit foreign key to a 32-bit primary key.
pub mod note {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "notes")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub customer_id: i64,
        pub body: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::customer::Entity",
            from = "Column::CustomerId",
            to = "super::customer::Column::Id"
        )]
        Customer,
    }

    impl Related<super::customer::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Customer.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Registers its "Order" navigation with the relation of another entity.
pub mod coupon {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "coupons")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub order_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl Navigable for address::Entity {}

impl Navigable for tag::Entity {}

impl Navigable for customer::Entity {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new()
            .with::<address::Entity>("Address", customer::Relation::Address.def())
            .with::<order::Entity>("Orders", customer::Relation::Orders.def())
    }
}

impl Navigable for order::Entity {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new()
            .with::<customer::Entity>("Customer", order::Relation::Customer.def())
            .with::<line_item::Entity>("Items", order::Relation::LineItems.def())
    }
}

impl Navigable for note::Entity {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new().with::<customer::Entity>("Customer", note::Relation::Customer.def())
    }
}

impl Navigable for coupon::Entity {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new().with::<order::Entity>("Order", order::Relation::Customer.def())
    }
}

impl Navigable for line_item::Entity {
    fn navigations() -> NavigationMap<Self> {
        NavigationMap::new().with::<order::Entity>("Order", line_item::Relation::Order.def())
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE addresses (
        id INTEGER PRIMARY KEY NOT NULL,
        city TEXT NOT NULL
    )",
    "CREATE TABLE customers (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        address_id INTEGER NULL
    )",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY NOT NULL,
        customer_id INTEGER NULL,
        total INTEGER NOT NULL,
        note TEXT NULL
    )",
    "CREATE TABLE line_items (
        id INTEGER PRIMARY KEY NOT NULL,
        order_id INTEGER NOT NULL,
        product TEXT NOT NULL,
        quantity INTEGER NOT NULL
    )",
    "CREATE TABLE notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        customer_id BIGINT NOT NULL,
        body TEXT NOT NULL
    )",
    "CREATE TABLE tags (
        id TEXT PRIMARY KEY NOT NULL,
        label TEXT NOT NULL
    )",
];

/// Rows shared by most tests:
/// - Bob (id 1) lives in Zurich, Ann (id 2) in Oslo, Cid (id 3) has no address
/// - order 10 belongs to Bob, orders 11 and 12 to Ann, order 13 to Cid
/// - orders 10 and 11 have line items, 12 and 13 have none
const SEED: &[&str] = &[
    "INSERT INTO addresses (id, city) VALUES (1, 'Zurich'), (2, 'Oslo')",
    "INSERT INTO customers (id, name, address_id) VALUES (1, 'Bob', 1), (2, 'Ann', 2), (3, 'Cid', NULL)",
    "INSERT INTO orders (id, customer_id, total, note) VALUES
        (10, 1, 50, 'first'),
        (11, 2, 20, NULL),
        (12, 2, 80, 'rush'),
        (13, 3, 5, NULL)",
    "INSERT INTO line_items (id, order_id, product, quantity) VALUES
        (100, 10, 'Widget', 2),
        (101, 10, 'Gadget', 1),
        (102, 11, 'Widget', 5)",
    "INSERT INTO tags (id, label) VALUES ('urgent', 'Urgent'), ('gift', 'Gift')",
];

/// In-memory database with the fixture schema and no rows.
pub async fn empty_context() -> DbContext {
    let context = DbContext::connect("sqlite::memory:").await.unwrap();
    for statement in SCHEMA {
        context.connection().execute_unprepared(statement).await.unwrap();
    }
    context
}

/// In-memory database with the fixture schema and the seed rows.
pub async fn seeded_context() -> DbContext {
    let context = empty_context().await;
    for statement in SEED {
        context.connection().execute_unprepared(statement).await.unwrap();
    }
    context
}

/// Insert `count` orders numbered from 1000, cycling through customers 1 to 3.
pub async fn insert_bulk_orders(context: &DbContext, count: usize) {
    let statement = format!(
        "INSERT INTO orders (id, customer_id, total, note)
         WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {})
         SELECT 999 + n, (n % 3) + 1, n, NULL FROM seq",
        count
    );
    context.connection().execute_unprepared(&statement).await.unwrap();
}

/// Insert `count` customers numbered from 1000, each with one order.
pub async fn insert_bulk_customers(context: &DbContext, count: usize) {
    for statement in [
        format!(
            "INSERT INTO customers (id, name, address_id)
             WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {})
             SELECT 999 + n, 'Bulk ' || n, NULL FROM seq",
            count
        ),
        format!(
            "INSERT INTO orders (id, customer_id, total, note)
             WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < {})
             SELECT 99999 + n, 999 + n, n, NULL FROM seq",
            count
        ),
    ] {
        context.connection().execute_unprepared(&statement).await.unwrap();
    }
}

/// Number of rows currently stored for `E`, read without the repository.
pub async fn stored_rows<E: EntityTrait>(context: &DbContext) -> usize {
    E::find().all(context.connection()).await.unwrap().len()
}
