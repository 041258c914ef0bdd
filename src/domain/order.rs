use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A placed order. Its total and item snapshots are frozen at checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: i64,
    pub title_snapshot: String,
    pub price_snapshot: f64,
    pub quantity: i32,
}

/// Line item as submitted by the client at checkout
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    pub quantity: i32,
}

impl NewOrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total: f64,
    pub items: Vec<NewOrderItem>,
}
