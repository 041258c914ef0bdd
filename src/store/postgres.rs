/// PostgreSQL store
///
/// Schema lives in `migrations/`. Uniqueness on `users.email` and on
/// `reviews (user_id, product_id)` is enforced by the database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{OrderRepository, RefreshTokenRepository, ReviewRepository, UserRepository};
use crate::domain::{
    NewOrder, NewRefreshToken, NewReview, NewUser, Order, OrderItem, RefreshTokenRecord, Review,
    ReviewWithAuthor, Role, User, UserProfile,
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    total: f64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ReviewAuthorRow {
    id: Uuid,
    product_id: i64,
    user_id: Uuid,
    email: String,
    rating: i32,
    message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_name: String,
    author_email: String,
    author_role: Role,
}

impl From<ReviewAuthorRow> for ReviewWithAuthor {
    fn from(row: ReviewAuthorRow) -> Self {
        ReviewWithAuthor {
            user: UserProfile {
                id: row.user_id,
                email: row.author_email,
                name: row.author_name,
                role: row.author_role,
            },
            review: Review {
                id: row.id,
                product_id: row.product_id,
                user_id: row.user_id,
                email: row.email,
                rating: row.rating,
                message: row.message,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Create or overwrite an administrator account keyed by email
    pub async fn upsert_admin(&self, email: &str, name: &str, password_hash: &str) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role
            RETURNING id, email, name, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(Role::Admin)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, title_snapshot, price_snapshot, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| Order {
                items: by_order.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_id: row.user_id,
                total: row.total,
                created_at: row.created_at,
            })
            .collect())
    }
}

impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, name, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

impl RefreshTokenRepository for PgStore {
    async fn create_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshTokenRecord> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, created_at, expires_at, revoked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_active_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        let records = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_unrevoked_refresh_tokens(
        &self,
        limit: usize,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        let records = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE revoked_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn revoke_refresh_token(
        &self,
        token_id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2")
            .bind(revoked_at)
            .bind(token_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl OrderRepository for PgStore {
    async fn create_order(&self, order: NewOrder) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (id, user_id, total, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, total, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.user_id)
        .bind(order.total)
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (position, item) in order.items.into_iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| AppError::Internal("too many order items".to_string()))?;
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items
                    (id, order_id, product_id, title_snapshot, price_snapshot, quantity, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, order_id, product_id, title_snapshot, price_snapshot, quantity
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(item.price)
            .bind(item.quantity)
            .bind(position)
            .fetch_one(&mut tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            total: row.total,
            created_at: row.created_at,
            items,
        })
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(rows).await
    }

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, total, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => Ok(self.attach_items(vec![row]).await?.into_iter().next()),
        }
    }
}

impl ReviewRepository for PgStore {
    async fn create_review(&self, review: NewReview) -> AppResult<Review> {
        let now = Utc::now();
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, product_id, user_id, email, rating, message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, product_id, user_id, email, rating, message, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(&review.email)
        .bind(review.rating)
        .bind(&review.message)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    async fn list_reviews_for_product(&self, product_id: i64) -> AppResult<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query_as::<_, ReviewAuthorRow>(
            r#"
            SELECT r.id, r.product_id, r.user_id, r.email, r.rating, r.message,
                   r.created_at, r.updated_at,
                   u.name AS author_name, u.email AS author_email, u.role AS author_role
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReviewWithAuthor::from).collect())
    }

    async fn find_review(&self, review_id: Uuid) -> AppResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, product_id, user_id, email, rating, message, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        rating: i32,
        message: String,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = $1, message = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, product_id, user_id, email, rating, message, created_at, updated_at
            "#,
        )
        .bind(rating)
        .bind(&message)
        .bind(updated_at)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        review.ok_or_else(|| AppError::not_found("Review not found"))
    }

    async fn delete_review(&self, review_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Review not found"));
        }
        Ok(())
    }
}
