/// Credential and commerce store
///
/// Persistence is reached only through these traits. Uniqueness constraints
/// (user email, one review per user and product) are enforced by the store
/// itself and surface as `DatabaseError::UniqueConstraintViolation`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    NewOrder, NewRefreshToken, NewReview, NewUser, Order, RefreshTokenRecord, Review,
    ReviewWithAuthor, User,
};
use crate::error::AppResult;

/// User records
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user; a taken email is a unique violation
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    /// Exact, case-sensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> AppResult<Option<User>>;
}

/// Refresh token records
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    async fn create_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshTokenRecord>;

    /// Up to `limit` records of one user that are neither revoked nor
    /// expired at `now`, newest first
    async fn find_active_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<RefreshTokenRecord>>;

    /// Up to `limit` unrevoked records across all users, newest first
    async fn find_unrevoked_refresh_tokens(&self, limit: usize)
        -> AppResult<Vec<RefreshTokenRecord>>;

    async fn revoke_refresh_token(&self, token_id: Uuid, revoked_at: DateTime<Utc>)
        -> AppResult<()>;
}

/// Orders and their line items
#[trait_variant::make(OrderRepository: Send)]
pub trait LocalOrderRepository {
    /// Insert the order and all of its items as one unit
    async fn create_order(&self, order: NewOrder) -> AppResult<Order>;

    /// Orders of one user, newest first
    async fn list_orders_for_user(&self, user_id: Uuid) -> AppResult<Vec<Order>>;

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<Order>>;
}

/// Product reviews
#[trait_variant::make(ReviewRepository: Send)]
pub trait LocalReviewRepository {
    /// Insert a review; a second review for the same (user, product) is a
    /// unique violation
    async fn create_review(&self, review: NewReview) -> AppResult<Review>;

    /// Reviews of one product with their authors, newest first
    async fn list_reviews_for_product(&self, product_id: i64) -> AppResult<Vec<ReviewWithAuthor>>;

    async fn find_review(&self, review_id: Uuid) -> AppResult<Option<Review>>;

    async fn update_review(
        &self,
        review_id: Uuid,
        rating: i32,
        message: String,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Review>;

    async fn delete_review(&self, review_id: Uuid) -> AppResult<()>;
}

/// Everything the HTTP application needs from a store
pub trait Store:
    UserRepository
    + RefreshTokenRepository
    + OrderRepository
    + ReviewRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + RefreshTokenRepository
        + OrderRepository
        + ReviewRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
