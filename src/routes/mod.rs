mod auth;
mod health_check;
mod orders;
mod reviews;

pub use auth::{admin_only, login, logout, me, refresh, register};
pub use health_check::health_check;
pub use orders::{create_order, get_order, list_orders};
pub use reviews::{create_review, delete_review, list_reviews, update_review};
