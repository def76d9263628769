use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    LedgerError, Result,
    order::{LineItem, Order, PaymentMethod},
    status::OrderStatus,
    store::{OrderFilter, OrderStore},
};

/// PostgreSQL-backed order store.
///
/// Line items are embedded in the order row as JSONB; no join table is
/// needed. Status changes are conditional updates guarded by the expected
/// current status, and the paid flag is settled with an idempotent write.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_value(items_json)?;

        let method_str: String = row.try_get("payment_method")?;
        let payment_method = PaymentMethod::parse(&method_str).unwrap_or_default();

        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_str).unwrap_or_default();

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            total_amount: Money::from_cents(row.try_get("total_cents")?),
            payment_method,
            address: row.try_get("address")?,
            paid: row.try_get("paid")?,
            status,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, user_id, items, total_cents, payment_method, address, paid, status, created_at, updated_at";

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let items_json = serde_json::to_value(&order.items)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_cents, payment_method, address, paid, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(items_json)
        .bind(order.total_amount.cents())
        .bind(order.payment_method.as_str())
        .bind(&order.address)
        .bind(order.paid)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn query(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.created_from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if filter.created_to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC");

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(from) = filter.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.created_to {
            query = query.bind(to);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        set_paid: bool,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = $3, paid = paid OR $4, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(set_paid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(row)?)),
            None => {
                // Distinguish a lost race from a missing order.
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                        .bind(id.as_uuid())
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Ok(None)
                } else {
                    Err(LedgerError::OrderNotFound { order_id: id })
                }
            }
        }
    }

    async fn set_paid(&self, id: OrderId) -> Result<Option<Order>> {
        // Idempotent: re-marking a paid order does not touch the row's
        // modification timestamp. Cancelled unpaid orders are immutable.
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET paid = TRUE,
                updated_at = CASE WHEN paid THEN updated_at ELSE now() END
            WHERE id = $1 AND (paid OR status <> 'cancelled')
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(row)?)),
            None => {
                let status: Option<String> =
                    sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                        .bind(id.as_uuid())
                        .fetch_optional(&self.pool)
                        .await?;
                match status {
                    Some(s) => Err(LedgerError::OrderClosed {
                        order_id: id,
                        status: OrderStatus::parse(&s).unwrap_or(OrderStatus::Cancelled),
                    }),
                    None => Ok(None),
                }
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
