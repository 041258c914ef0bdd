use uuid::Uuid;

use crate::authorization::{ensure_owner, Caller};
use crate::domain::{NewOrder, NewOrderItem, Order};
use crate::error::{AppError, AppResult};
use crate::store::OrderRepository;

pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Place an order for the caller
    ///
    /// Items are taken as submitted. The total is the sum of price times
    /// quantity over them, and order plus items are stored as one unit.
    ///
    /// # Errors
    /// - Forbidden when `items` is empty
    pub async fn create_order(&self, caller: &Caller, items: Vec<NewOrderItem>) -> AppResult<Order> {
        if items.is_empty() {
            return Err(AppError::forbidden("Cart is empty"));
        }

        let total = items.iter().map(NewOrderItem::line_total).sum();
        let order = self
            .store
            .create_order(NewOrder {
                user_id: caller.user_id,
                total,
                items,
            })
            .await?;

        tracing::info!(user_id = %caller.user_id, order_id = %order.id, "Order created");
        Ok(order)
    }

    pub async fn list_my_orders(&self, caller: &Caller) -> AppResult<Vec<Order>> {
        self.store.list_orders_for_user(caller.user_id).await
    }

    /// # Errors
    /// - NotFound for an unknown id
    /// - Forbidden for anyone but the buyer, admins included
    pub async fn get_my_order(&self, caller: &Caller, order_id: Uuid) -> AppResult<Order> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order not found"))?;

        ensure_owner(order.user_id, caller, "Not allowed")?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUser, Role};
    use crate::error::{AuthError, DatabaseError};
    use crate::store::{MemoryStore, UserRepository};

    async fn caller(store: &MemoryStore, email: &str, role: Role) -> Caller {
        let user = store
            .create_user(NewUser {
                email: email.to_string(),
                name: "Test".to_string(),
                password_hash: "$2b$10$placeholder".to_string(),
                role,
            })
            .await
            .unwrap();
        Caller {
            user_id: user.id,
            role,
        }
    }

    fn item(product_id: i64, price: f64, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id,
            title: format!("Product {}", product_id),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn empty_cart_is_forbidden() {
        let store = MemoryStore::new();
        let buyer = caller(&store, "buyer@example.com", Role::User).await;
        let orders = OrderService::new(store.clone());

        let err = orders.create_order(&buyer, Vec::new()).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::Forbidden(ref m)) if m == "Cart is empty"));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn total_is_sum_of_lines() {
        let store = MemoryStore::new();
        let buyer = caller(&store, "buyer@example.com", Role::User).await;
        let orders = OrderService::new(store.clone());

        let order = orders
            .create_order(&buyer, vec![item(1, 10.0, 2), item(2, 2.5, 4)])
            .await
            .unwrap();

        assert!((order.total - 30.0).abs() < f64::EPSILON);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].title_snapshot, "Product 1");
        assert_eq!(order.user_id, buyer.user_id);
    }

    #[tokio::test]
    async fn list_returns_only_own_orders() {
        let store = MemoryStore::new();
        let ann = caller(&store, "ann@example.com", Role::User).await;
        let bob = caller(&store, "bob@example.com", Role::User).await;
        let orders = OrderService::new(store.clone());

        orders.create_order(&ann, vec![item(1, 1.0, 1)]).await.unwrap();
        orders.create_order(&bob, vec![item(2, 1.0, 1)]).await.unwrap();

        let mine = orders.list_my_orders(&ann).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, ann.user_id);
    }

    #[tokio::test]
    async fn only_the_buyer_reads_an_order() {
        let store = MemoryStore::new();
        let ann = caller(&store, "ann@example.com", Role::User).await;
        let bob = caller(&store, "bob@example.com", Role::User).await;
        let admin = caller(&store, "admin@example.com", Role::Admin).await;
        let orders = OrderService::new(store.clone());

        let order = orders.create_order(&ann, vec![item(1, 1.0, 1)]).await.unwrap();

        assert_eq!(orders.get_my_order(&ann, order.id).await.unwrap().id, order.id);
        assert!(matches!(
            orders.get_my_order(&bob, order.id).await,
            Err(AppError::Auth(AuthError::Forbidden(_)))
        ));
        assert!(matches!(
            orders.get_my_order(&admin, order.id).await,
            Err(AppError::Auth(AuthError::Forbidden(_)))
        ));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let store = MemoryStore::new();
        let ann = caller(&store, "ann@example.com", Role::User).await;
        let orders = OrderService::new(store);

        assert!(matches!(
            orders.get_my_order(&ann, Uuid::new_v4()).await,
            Err(AppError::Database(DatabaseError::NotFound(_)))
        ));
    }
}
