use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use super::{ContactMethod, Database, OrderId, OrderStatus, RestaurantId, SupplierId};
use crate::order::{line_subtotal, order_totals, OrderLine};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub supplier_id: SupplierId,
    pub supplier_name: Option<String>,
    pub order_date: String,
    pub order_time: String,
    pub status: OrderStatus,
    pub total_items: i64,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub sent_method: Option<ContactMethod>,
    pub sent_at: Option<i64>,
    pub items: Vec<OrderItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_name: String,
    pub quantity: String,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub subtotal: Option<f64>,
    pub notes: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    supplier_id: SupplierId,
    supplier_name: Option<String>,
    order_date: String,
    order_time: String,
    status: OrderStatus,
    total_items: i64,
    total_amount: f64,
    notes: Option<String>,
    sent_method: Option<ContactMethod>,
    sent_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            order_date: self.order_date,
            order_time: self.order_time,
            status: self.status,
            total_items: self.total_items,
            total_amount: self.total_amount,
            notes: self.notes,
            sent_method: self.sent_method,
            sent_at: self.sent_at,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// History filters. Dates are `YYYY-MM-DD` and inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    /// Case-insensitive match on supplier name, product names or notes.
    #[serde(default)]
    pub search: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl OrderFilter {
    fn matches_search(&self, order: &Order) -> bool {
        let Some(term) = non_blank(&self.search) else {
            return true;
        };
        let term = term.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&term);

        order.supplier_name.as_deref().is_some_and(contains)
            || order.items.iter().any(|item| contains(item.product_name.as_str()))
            || order.notes.as_deref().is_some_and(contains)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub sent: usize,
    pub confirmed: usize,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        Self {
            total: orders.len(),
            pending: count(OrderStatus::Pending),
            sent: count(OrderStatus::Sent),
            confirmed: count(OrderStatus::Confirmed),
        }
    }
}

const ORDER_SELECT: &str = "SELECT o.id, o.supplier_id, s.name AS supplier_name, o.order_date, \
     o.order_time, o.status, o.total_items, o.total_amount, o.notes, o.sent_method, o.sent_at, \
     o.created_at, o.updated_at \
     FROM orders o LEFT JOIN suppliers s ON s.id = o.supplier_id \
     WHERE o.restaurant_id = ";

impl Database {
    /// Store a new pending order with its lines, in the given order.
    pub async fn create_order(
        &self,
        restaurant: RestaurantId,
        supplier: SupplierId,
        lines: &[OrderLine],
        notes: Option<&str>,
        placed_at: NaiveDateTime,
    ) -> Result<Order> {
        let (total_items, total_amount) = order_totals(lines);
        let order_date = placed_at.format("%Y-%m-%d").to_string();
        let order_time = placed_at.format("%H:%M").to_string();
        let now = super::now_timestamp();
        tracing::debug!(
            restaurant_id = restaurant.0,
            supplier_id = supplier.0,
            total_items,
            total_amount,
            "Creating order"
        );

        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            "INSERT INTO orders \
             (restaurant_id, supplier_id, order_date, order_time, status, total_items, total_amount, \
              notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(restaurant)
        .bind(supplier)
        .bind(&order_date)
        .bind(&order_time)
        .bind(OrderStatus::Pending)
        .bind(total_items)
        .bind(total_amount)
        .bind(notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = OrderId(result.last_insert_rowid());

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items \
                 (order_id, position, product_name, quantity, unit, price, subtotal) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(position as i64)
            .bind(&line.product_name)
            .bind(&line.quantity)
            .bind(line.unit.as_deref())
            .bind(line.price)
            .bind(line_subtotal(line))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.get_order(restaurant, id)
            .await?
            .ok_or_else(|| anyhow!("order {id} missing after insert"))
    }

    async fn items_for(&self, order: OrderId) -> Result<Vec<OrderItem>> {
        sqlx::query_as(
            "SELECT id, order_id, product_name, quantity, unit, price, subtotal, notes \
             FROM order_items WHERE order_id = ? ORDER BY position, id",
        )
        .bind(order)
        .fetch_all(self.pool())
        .await
        .map_err(Into::into)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(row.with_items(items));
        }
        Ok(orders)
    }

    pub async fn get_order(&self, restaurant: RestaurantId, id: OrderId) -> Result<Option<Order>> {
        tracing::trace!(restaurant_id = restaurant.0, order_id = id.0, "Fetching order");
        let mut builder = QueryBuilder::<Sqlite>::new(ORDER_SELECT);
        builder.push_bind(restaurant).push(" AND o.id = ").push_bind(id);
        let row: Option<OrderRow> = builder.build_query_as().fetch_optional(self.pool()).await?;
        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Order history, newest first.
    pub async fn list_orders(
        &self,
        restaurant: RestaurantId,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>> {
        tracing::trace!(restaurant_id = restaurant.0, ?filter, "Listing orders");
        let mut builder = QueryBuilder::<Sqlite>::new(ORDER_SELECT);
        builder.push_bind(restaurant);
        if let Some(supplier) = filter.supplier_id {
            builder.push(" AND o.supplier_id = ").push_bind(supplier);
        }
        if let Some(status) = filter.status {
            builder.push(" AND o.status = ").push_bind(status);
        }
        if let Some(from) = non_blank(&filter.date_from) {
            builder.push(" AND o.order_date >= ").push_bind(from.to_string());
        }
        if let Some(to) = non_blank(&filter.date_to) {
            builder.push(" AND o.order_date <= ").push_bind(to.to_string());
        }
        builder.push(" ORDER BY o.order_date DESC, o.order_time DESC, o.id DESC");

        let rows: Vec<OrderRow> = builder.build_query_as().fetch_all(self.pool()).await?;
        let orders = self.attach_items(rows).await?;
        Ok(orders
            .into_iter()
            .filter(|order| filter.matches_search(order))
            .collect())
    }

    /// Change an order's status. Moving to `sent` records when and how; a
    /// missing method keeps the one recorded before.
    /// Returns the number of rows touched (0 when the order is unknown).
    pub async fn update_order_status(
        &self,
        restaurant: RestaurantId,
        id: OrderId,
        status: OrderStatus,
        sent_method: Option<ContactMethod>,
        now: i64,
    ) -> Result<u64> {
        tracing::debug!(
            restaurant_id = restaurant.0,
            order_id = id.0,
            %status,
            sent_method = ?sent_method,
            "Updating order status"
        );
        let result = if status == OrderStatus::Sent {
            sqlx::query(
                "UPDATE orders SET status = ?, sent_method = COALESCE(?, sent_method), sent_at = ?, \
                 updated_at = ? WHERE id = ? AND restaurant_id = ?",
            )
            .bind(status)
            .bind(sent_method)
            .bind(now)
            .bind(now)
            .bind(id)
            .bind(restaurant)
            .execute(self.pool())
            .await?
        } else {
            sqlx::query(
                "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND restaurant_id = ?",
            )
            .bind(status)
            .bind(now)
            .bind(id)
            .bind(restaurant)
            .execute(self.pool())
            .await?
        };
        Ok(result.rows_affected())
    }
}
