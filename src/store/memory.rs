/// In-process store
///
/// Keeps every table in one mutex-guarded struct and applies the same
/// uniqueness rules as the Postgres schema. Used by the test suites and for
/// running the API without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{OrderRepository, RefreshTokenRepository, ReviewRepository, UserRepository};
use crate::domain::{
    NewOrder, NewRefreshToken, NewReview, NewUser, Order, OrderItem, RefreshTokenRecord, Review,
    ReviewWithAuthor, User,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshTokenRecord>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|t| t.users.len()).unwrap_or_default()
    }

    pub fn order_count(&self) -> usize {
        self.lock().map(|t| t.orders.len()).unwrap_or_default()
    }

    pub fn review_count(&self) -> usize {
        self.lock().map(|t| t.reviews.len()).unwrap_or_default()
    }

    /// All refresh token records of a user, in insertion order
    pub fn refresh_tokens_of(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.lock()
            .map(|t| {
                t.refresh_tokens
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Newest first; later inserts win ties on identical timestamps.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = rows.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}

impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::conflict("Duplicate entry"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }
}

impl RefreshTokenRepository for MemoryStore {
    async fn create_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshTokenRecord> {
        let mut tables = self.lock()?;
        if !tables.users.iter().any(|u| u.id == token.user_id) {
            return Err(AppError::not_found("User not found"));
        }

        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            token_hash: token.token_hash,
            created_at: token.created_at,
            expires_at: token.expires_at,
            revoked_at: None,
        };
        tables.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn find_active_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        let tables = self.lock()?;
        let mine: Vec<RefreshTokenRecord> = tables
            .refresh_tokens
            .iter()
            .filter(|r| r.user_id == user_id && r.is_active(now))
            .cloned()
            .collect();
        Ok(newest_first(&mine, |r| r.created_at)
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn find_unrevoked_refresh_tokens(
        &self,
        limit: usize,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        let tables = self.lock()?;
        let unrevoked: Vec<RefreshTokenRecord> = tables
            .refresh_tokens
            .iter()
            .filter(|r| r.revoked_at.is_none())
            .cloned()
            .collect();
        Ok(newest_first(&unrevoked, |r| r.created_at)
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn revoke_refresh_token(
        &self,
        token_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = self.lock()?;
        let record = tables
            .refresh_tokens
            .iter_mut()
            .find(|r| r.id == token_id)
            .ok_or_else(|| AppError::not_found("Refresh token not found"))?;
        record.revoked_at = Some(revoked_at);
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> AppResult<Order> {
        let mut tables = self.lock()?;
        if !tables.users.iter().any(|u| u.id == order.user_id) {
            return Err(AppError::not_found("User not found"));
        }

        let order_id = Uuid::new_v4();
        let items = order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: item.product_id,
                title_snapshot: item.title,
                price_snapshot: item.price,
                quantity: item.quantity,
            })
            .collect();

        let order = Order {
            id: order_id,
            user_id: order.user_id,
            total: order.total,
            created_at: Utc::now(),
            items,
        };
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> AppResult<Vec<Order>> {
        let tables = self.lock()?;
        let mine: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&mine, |o| o.created_at))
    }

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        let tables = self.lock()?;
        Ok(tables.orders.iter().find(|o| o.id == order_id).cloned())
    }
}

impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        let mut tables = self.lock()?;
        if tables
            .reviews
            .iter()
            .any(|r| r.user_id == review.user_id && r.product_id == review.product_id)
        {
            return Err(AppError::conflict("Duplicate entry"));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            product_id: review.product_id,
            user_id: review.user_id,
            email: review.email,
            rating: review.rating,
            message: review.message,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews_for_product(&self, product_id: i64) -> AppResult<Vec<ReviewWithAuthor>> {
        let tables = self.lock()?;
        let for_product: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();

        Ok(newest_first(&for_product, |r| r.created_at)
            .into_iter()
            .filter_map(|review| {
                let author = tables.users.iter().find(|u| u.id == review.user_id)?;
                Some(ReviewWithAuthor {
                    user: author.profile(),
                    review,
                })
            })
            .collect())
    }

    async fn find_review(&self, review_id: Uuid) -> AppResult<Option<Review>> {
        let tables = self.lock()?;
        Ok(tables.reviews.iter().find(|r| r.id == review_id).cloned())
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        rating: i32,
        message: String,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Review> {
        let mut tables = self.lock()?;
        let review = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| AppError::not_found("Review not found"))?;
        review.rating = rating;
        review.message = message;
        review.updated_at = updated_at;
        Ok(review.clone())
    }

    async fn delete_review(&self, review_id: Uuid) -> AppResult<()> {
        let mut tables = self.lock()?;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| r.id != review_id);
        if tables.reviews.len() == before {
            return Err(AppError::not_found("Review not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_email_is_unique_and_case_sensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("ann@example.com")).await.unwrap();

        let duplicate = store.create_user(new_user("ann@example.com")).await;
        assert!(duplicate.unwrap_err().is_unique_violation());

        assert!(store.create_user(new_user("Ann@example.com")).await.is_ok());
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn test_active_tokens_skip_revoked_and_expired() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann@example.com")).await.unwrap();
        let now = Utc::now();

        let live = store
            .create_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash: "live".to_string(),
                created_at: now,
                expires_at: now + Duration::days(7),
            })
            .await
            .unwrap();
        let revoked = store
            .create_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash: "revoked".to_string(),
                created_at: now,
                expires_at: now + Duration::days(7),
            })
            .await
            .unwrap();
        store
            .create_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash: "expired".to_string(),
                created_at: now - Duration::days(7),
                expires_at: now - Duration::seconds(1),
            })
            .await
            .unwrap();
        store.revoke_refresh_token(revoked.id, now).await.unwrap();

        let active = store
            .find_active_refresh_tokens(user.id, Utc::now(), 10)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);

        // expired but unrevoked records still count for the global scan
        let unrevoked = store.find_unrevoked_refresh_tokens(50).await.unwrap();
        assert_eq!(unrevoked.len(), 2);
    }

    #[tokio::test]
    async fn test_token_window_returns_newest_first() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann@example.com")).await.unwrap();

        let start = Utc::now();
        for i in 0..5 {
            let created_at = start + Duration::seconds(i);
            store
                .create_refresh_token(NewRefreshToken {
                    user_id: user.id,
                    token_hash: format!("hash-{}", i),
                    created_at,
                    expires_at: created_at + Duration::days(7),
                })
                .await
                .unwrap();
        }

        let window = store
            .find_active_refresh_tokens(user.id, start + Duration::seconds(5), 3)
            .await
            .unwrap();
        let hashes: Vec<&str> = window.iter().map(|r| r.token_hash.as_str()).collect();
        assert_eq!(hashes, vec!["hash-4", "hash-3", "hash-2"]);
    }

    #[tokio::test]
    async fn test_one_review_per_user_and_product() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ann@example.com")).await.unwrap();
        let review = NewReview {
            product_id: 7,
            user_id: user.id,
            email: user.email.clone(),
            rating: 5,
            message: "Great".to_string(),
        };

        store.create_review(review.clone()).await.unwrap();
        let second = store.create_review(review).await;

        assert!(second.unwrap_err().is_unique_violation());
        assert_eq!(store.review_count(), 1);
    }
}
