use chrono::Utc;
use uuid::Uuid;

use crate::authorization::{ensure_owner_or_admin, Caller};
use crate::domain::{NewReview, Review, ReviewWithAuthor};
use crate::error::{AppError, AppResult};
use crate::store::{ReviewRepository, UserRepository};

const NOT_ALLOWED: &str = "Not allowed";

pub struct ReviewService<S> {
    store: S,
}

impl<S> ReviewService<S>
where
    S: UserRepository + ReviewRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reviews of a product with their authors, newest first
    pub async fn list_by_product(&self, product_id: i64) -> AppResult<Vec<ReviewWithAuthor>> {
        self.store.list_reviews_for_product(product_id).await
    }

    /// Post the caller's review of a product
    ///
    /// The author's current email is copied onto the review.
    ///
    /// # Errors
    /// - NotFound if the caller no longer resolves to a user
    /// - Forbidden if the caller already reviewed this product
    pub async fn create_for_product(
        &self,
        caller: &Caller,
        product_id: i64,
        rating: i32,
        message: String,
    ) -> AppResult<Review> {
        let author = self
            .store
            .find_user_by_id(caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let review = self
            .store
            .create_review(NewReview {
                product_id,
                user_id: author.id,
                email: author.email,
                rating,
                message,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::forbidden("You already reviewed this product")
                } else {
                    e
                }
            })?;

        tracing::info!(user_id = %caller.user_id, review_id = %review.id, product_id, "Review created");
        Ok(review)
    }

    /// # Errors
    /// - NotFound for an unknown id
    /// - Forbidden unless the caller wrote the review or is an admin
    pub async fn update_review(
        &self,
        caller: &Caller,
        review_id: Uuid,
        rating: i32,
        message: String,
    ) -> AppResult<Review> {
        let review = self.existing(review_id).await?;
        ensure_owner_or_admin(review.user_id, caller, NOT_ALLOWED)?;

        self.store
            .update_review(review_id, rating, message, Utc::now())
            .await
    }

    /// # Errors
    /// - NotFound for an unknown id
    /// - Forbidden unless the caller wrote the review or is an admin
    pub async fn delete_review(&self, caller: &Caller, review_id: Uuid) -> AppResult<()> {
        let review = self.existing(review_id).await?;
        ensure_owner_or_admin(review.user_id, caller, NOT_ALLOWED)?;

        self.store.delete_review(review_id).await?;
        tracing::info!(user_id = %caller.user_id, review_id = %review_id, "Review deleted");
        Ok(())
    }

    async fn existing(&self, review_id: Uuid) -> AppResult<Review> {
        self.store
            .find_review(review_id)
            .await?
            .ok_or_else(|| AppError::not_found("Review not found"))
    }
}
