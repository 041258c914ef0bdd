use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::UserProfile;

/// Product review. At most one per (user, product).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: i64,
    pub user_id: Uuid,
    /// Author email copied at creation time
    pub email: String,
    pub rating: i32,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: UserProfile,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: Uuid,
    pub email: String,
    pub rating: i32,
    pub message: String,
}
