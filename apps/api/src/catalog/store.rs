//! Catalog store: the persistence seam the market mutator writes through.
//!
//! Default: `PgCatalogStore` over the shared PostgreSQL pool.
//! `AppState` holds an `Arc<dyn CatalogStore>` so jobs and handlers can be
//! exercised against an in-memory store in tests.
//!
//! Errors are never swallowed here: a failed write is the caller's problem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::catalog::queries;
use crate::models::product::{NewProduct, ProductRow};
use crate::models::user::{NewUser, UserRow};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRow>, sqlx::Error>;

    /// Overwrites the mutable listing fields of an existing product.
    async fn update_product(&self, product: &ProductRow) -> Result<(), sqlx::Error>;

    async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, sqlx::Error>;

    async fn list_users(&self) -> Result<Vec<UserRow>, sqlx::Error>;

    async fn insert_user(&self, user: &NewUser) -> Result<UserRow, sqlx::Error>;

    async fn add_cart_item(&self, user_id: i64, product_id: i64) -> Result<(), sqlx::Error>;

    /// Records a purchase with an explicit timestamp (seeded history is backdated).
    async fn insert_purchase(
        &self,
        user_id: i64,
        product_id: i64,
        purchased_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_products(&self) -> Result<Vec<ProductRow>, sqlx::Error> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn update_product(&self, product: &ProductRow) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET title = $2, description = $3, category = $4, price = $5, image = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(&product.image)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, sqlx::Error> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (title, description, category, price, image, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(&product.image)
        .bind(product.user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_users(&self) -> Result<Vec<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>("SELECT id, email, username, avatar FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserRow, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, avatar)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, avatar
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await
    }

    async fn add_cart_item(&self, user_id: i64, product_id: i64) -> Result<(), sqlx::Error> {
        queries::add_to_cart(&self.pool, user_id, product_id).await?;
        Ok(())
    }

    async fn insert_purchase(
        &self,
        user_id: i64,
        product_id: i64,
        purchased_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO purchases (user_id, product_id, created_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(product_id)
            .bind(purchased_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory catalog for tests. `fail_writes` makes every write error out.
    #[derive(Default)]
    pub struct MemoryCatalog {
        pub products: Mutex<Vec<ProductRow>>,
        pub users: Mutex<Vec<UserRow>>,
        /// (user_id, product_id)
        pub cart: Mutex<Vec<(i64, i64)>>,
        /// (user_id, product_id, purchased_at)
        pub purchases: Mutex<Vec<(i64, i64, DateTime<Utc>)>>,
        pub fail_writes: AtomicBool,
    }

    impl MemoryCatalog {
        pub fn with_users(count: i64) -> Self {
            let catalog = Self::default();
            {
                let mut users = catalog.users.lock().unwrap();
                for id in 1..=count {
                    users.push(UserRow {
                        id,
                        email: format!("user{id}@example.com"),
                        username: Some(format!("user{id}")),
                        avatar: None,
                    });
                }
            }
            catalog
        }

        pub fn seed_product(&self, category: &str, price: f64, owner: i64) -> ProductRow {
            let mut products = self.products.lock().unwrap();
            let row = ProductRow {
                id: products.len() as i64 + 1,
                title: format!("{category} item"),
                description: format!("A used {category} item."),
                category: category.to_string(),
                price,
                image: "https://img.example/seed.jpg".to_string(),
                user_id: owner,
                created_at: Utc::now(),
            };
            products.push(row.clone());
            row
        }

        pub fn snapshot(&self) -> Vec<ProductRow> {
            self.products.lock().unwrap().clone()
        }

        fn check_writable(&self) -> Result<(), sqlx::Error> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CatalogStore for MemoryCatalog {
        async fn list_products(&self) -> Result<Vec<ProductRow>, sqlx::Error> {
            Ok(self.snapshot())
        }

        async fn update_product(&self, product: &ProductRow) -> Result<(), sqlx::Error> {
            self.check_writable()?;
            let mut products = self.products.lock().unwrap();
            let existing = products
                .iter_mut()
                .find(|p| p.id == product.id)
                .ok_or(sqlx::Error::RowNotFound)?;
            *existing = product.clone();
            Ok(())
        }

        async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, sqlx::Error> {
            self.check_writable()?;
            let mut products = self.products.lock().unwrap();
            let row = ProductRow {
                id: products.len() as i64 + 1,
                title: product.title.clone(),
                description: product.description.clone(),
                category: product.category.clone(),
                price: product.price,
                image: product.image.clone(),
                user_id: product.user_id,
                created_at: Utc::now(),
            };
            products.push(row.clone());
            Ok(row)
        }

        async fn list_users(&self) -> Result<Vec<UserRow>, sqlx::Error> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn insert_user(&self, user: &NewUser) -> Result<UserRow, sqlx::Error> {
            self.check_writable()?;
            let mut users = self.users.lock().unwrap();
            let row = UserRow {
                id: users.len() as i64 + 1,
                email: user.email.clone(),
                username: Some(user.username.clone()),
                avatar: Some(user.avatar.clone()),
            };
            users.push(row.clone());
            Ok(row)
        }

        async fn add_cart_item(&self, user_id: i64, product_id: i64) -> Result<(), sqlx::Error> {
            self.check_writable()?;
            self.cart.lock().unwrap().push((user_id, product_id));
            Ok(())
        }

        async fn insert_purchase(
            &self,
            user_id: i64,
            product_id: i64,
            purchased_at: DateTime<Utc>,
        ) -> Result<(), sqlx::Error> {
            self.check_writable()?;
            self.purchases
                .lock()
                .unwrap()
                .push((user_id, product_id, purchased_at));
            Ok(())
        }
    }
}
