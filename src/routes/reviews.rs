/// Review Routes
///
/// Listing is public; posting, editing and deleting need a bearer token.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::Caller;
use crate::error::AppError;
use crate::services::ReviewService;
use crate::store::Store;
use crate::validators::{validate_rating, validate_review_message};

/// Body of both create and update
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    pub message: String,
}

impl ReviewRequest {
    fn validated(&self) -> Result<(i32, String), AppError> {
        let rating = validate_rating(self.rating)?;
        let message = validate_review_message(&self.message)?;
        Ok((rating, message))
    }
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
}

/// GET /products/{product_id}/reviews
pub async fn list_reviews<S: Store>(
    path: web::Path<i64>,
    reviews: web::Data<ReviewService<S>>,
) -> Result<HttpResponse, AppError> {
    let listed = reviews.list_by_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listed))
}

/// POST /products/{product_id}/reviews
///
/// # Errors
/// - 400: Rating outside 1..=5 or message shorter than 3 characters
/// - 403: Caller already reviewed this product
/// - 404: Caller's account no longer exists
pub async fn create_review<S: Store>(
    path: web::Path<i64>,
    form: web::Json<ReviewRequest>,
    caller: web::ReqData<Caller>,
    reviews: web::Data<ReviewService<S>>,
) -> Result<HttpResponse, AppError> {
    let (rating, message) = form.validated()?;

    let review = reviews
        .create_for_product(&caller, path.into_inner(), rating, message)
        .await?;

    Ok(HttpResponse::Created().json(review))
}

/// PUT /reviews/{id}
///
/// # Errors
/// - 404: Unknown review
/// - 403: Caller is neither the author nor an admin
pub async fn update_review<S: Store>(
    path: web::Path<Uuid>,
    form: web::Json<ReviewRequest>,
    caller: web::ReqData<Caller>,
    reviews: web::Data<ReviewService<S>>,
) -> Result<HttpResponse, AppError> {
    let (rating, message) = form.validated()?;

    let review = reviews
        .update_review(&caller, path.into_inner(), rating, message)
        .await?;

    Ok(HttpResponse::Ok().json(review))
}

/// DELETE /reviews/{id}
pub async fn delete_review<S: Store>(
    path: web::Path<Uuid>,
    caller: web::ReqData<Caller>,
    reviews: web::Data<ReviewService<S>>,
) -> Result<HttpResponse, AppError> {
    reviews.delete_review(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse { ok: true }))
}
