/// Order Routes
///
/// Checkout and order history for the authenticated caller. Every route here
/// sits behind `JwtMiddleware`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::authorization::Caller;
use crate::domain::NewOrderItem;
use crate::error::AppError;
use crate::services::OrderService;
use crate::store::Store;
use crate::validators::validate_order_item;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl OrderItemRequest {
    fn into_new_item(self) -> Result<NewOrderItem, AppError> {
        let title = validate_order_item(&self.title, self.price, self.quantity)?;
        Ok(NewOrderItem {
            product_id: self.product_id,
            title,
            price: self.price,
            quantity: self.quantity,
        })
    }
}

/// POST /orders
///
/// # Errors
/// - 400: An item with quantity below 1, a non-finite price or no title
/// - 403: Empty item list
pub async fn create_order<S: Store>(
    form: web::Json<CreateOrderRequest>,
    caller: web::ReqData<Caller>,
    orders: web::Data<OrderService<S>>,
) -> Result<HttpResponse, AppError> {
    let items = form
        .into_inner()
        .items
        .into_iter()
        .map(OrderItemRequest::into_new_item)
        .collect::<Result<Vec<_>, _>>()?;

    let order = orders.create_order(&caller, items).await?;

    Ok(HttpResponse::Created().json(order))
}

/// GET /orders
pub async fn list_orders<S: Store>(
    caller: web::ReqData<Caller>,
    orders: web::Data<OrderService<S>>,
) -> Result<HttpResponse, AppError> {
    let mine = orders.list_my_orders(&caller).await?;
    Ok(HttpResponse::Ok().json(mine))
}

/// GET /orders/{id}
///
/// # Errors
/// - 404: Unknown order
/// - 403: Order belongs to someone else (admins included)
pub async fn get_order<S: Store>(
    path: web::Path<Uuid>,
    caller: web::ReqData<Caller>,
    orders: web::Data<OrderService<S>>,
) -> Result<HttpResponse, AppError> {
    let order = orders.get_my_order(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}
