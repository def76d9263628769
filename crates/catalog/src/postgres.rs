use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    CatalogError, Result,
    product::{Product, ProductCategory, ProductPatch},
    store::CatalogStore,
};

/// PostgreSQL-backed catalog store.
///
/// The stock decrement is a single conditional `UPDATE` guarded by
/// `stock >= quantity`, so linearizability of decrements for the same
/// product row is delegated to the database.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Creates a new PostgreSQL catalog store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let category_str: String = row.try_get("category")?;
        let category =
            ProductCategory::parse(&category_str).ok_or_else(|| CatalogError::InvalidProduct {
                reason: format!("unknown category in storage: {category_str}"),
            })?;

        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            category,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get::<i64, _>("stock")? as u32,
            image_url: row.try_get("image_url")?,
            description: row.try_get("description")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, price_cents, stock, image_url, description, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, price_cents, stock, image_url, description, created_at
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn insert(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, price_cents, stock, image_url, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(product.price.cents())
        .bind(product.stock as i64)
        .bind(&product.image_url)
        .bind(&product.description)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return CatalogError::ProductAlreadyExists {
                    product_id: product.id.clone(),
                };
            }
            CatalogError::Database(e)
        })?;

        Ok(())
    }

    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        // COALESCE keeps the stored value for fields absent from the
        // patch; explicit zero/empty values pass through as given.
        let row = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                price_cents = COALESCE($4, price_cents),
                stock = COALESCE($5, stock),
                image_url = COALESCE($6, image_url),
                description = COALESCE($7, description)
            WHERE id = $1
            RETURNING id, name, category, price_cents, stock, image_url, description, created_at
            "#,
        )
        .bind(id.as_str())
        .bind(patch.name)
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.price.map(|p| p.cents()))
        .bind(patch.stock.map(|s| s as i64))
        .bind(patch.image_url)
        .bind(patch.description)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(CatalogError::ProductNotFound {
                product_id: id.clone(),
            }),
        }
    }

    async fn remove(&self, id: &ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::ProductNotFound {
                product_id: id.clone(),
            });
        }
        Ok(())
    }

    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id.as_str())
        .bind(quantity as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment(&self, id: &ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(quantity as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::ProductNotFound {
                product_id: id.clone(),
            });
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
