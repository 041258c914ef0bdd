/// Domain records
///
/// Plain data owned by the store: users, refresh-token records, orders
/// with their line items, and product reviews.

mod order;
mod refresh_token;
mod review;
mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use refresh_token::{NewRefreshToken, RefreshTokenRecord};
pub use review::{NewReview, Review, ReviewWithAuthor};
pub use user::{NewUser, Role, User, UserProfile};
