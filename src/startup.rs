use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionManager;
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::RequestLogger;
use crate::middleware::{JwtMiddleware, RequireRole};
use crate::routes::{
    admin_only, create_order, create_review, delete_review, get_order, health_check, list_orders,
    list_reviews, login, logout, me, refresh, register, update_review,
};
use crate::services::{OrderService, ReviewService};
use crate::store::Store;

/// Build the HTTP server on an already bound listener
///
/// Public: health check, register, login, refresh, logout, review listing.
/// Bearer token: me, orders, posting and editing reviews.
/// Bearer token and ADMIN role: admin-only greeting.
pub fn run<S: Store>(
    listener: TcpListener,
    store: S,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let sessions = web::Data::new(SessionManager::new(
        store.clone(),
        settings.jwt.clone(),
        &settings.auth,
    ));
    let tokens = sessions.tokens().clone();
    let orders = web::Data::new(OrderService::new(store.clone()));
    let reviews = web::Data::new(ReviewService::new(store));
    let auth_settings = web::Data::new(settings.auth.clone());

    let server = HttpServer::new(move || {
        // Malformed bodies get the same error shape as every other failure
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            tracing::debug!("Rejected request body: {}", err);
            AppError::Validation(ValidationError::InvalidFormat("request body".to_string())).into()
        });

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(json_config)
            .app_data(sessions.clone())
            .app_data(orders.clone())
            .app_data(reviews.clone())
            .app_data(auth_settings.clone())

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register::<S>))
                    .route("/login", web::post().to(login::<S>))
                    .route("/refresh", web::post().to(refresh::<S>))
                    .route("/logout", web::post().to(logout::<S>))
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(tokens.clone()))
                            .route(web::get().to(me::<S>)),
                    )
                    .service(
                        // RequireRole is registered first so it runs after the token check
                        web::resource("/admin-only")
                            .wrap(RequireRole::admin())
                            .wrap(JwtMiddleware::new(tokens.clone()))
                            .route(web::get().to(admin_only)),
                    ),
            )
            .service(
                web::scope("/orders")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route("", web::post().to(create_order::<S>))
                    .route("", web::get().to(list_orders::<S>))
                    .route("/{id}", web::get().to(get_order::<S>)),
            )
            .service(
                web::resource("/products/{product_id}/reviews")
                    .guard(guard::Get())
                    .route(web::get().to(list_reviews::<S>)),
            )
            .service(
                web::resource("/products/{product_id}/reviews")
                    .guard(guard::Post())
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route(web::post().to(create_review::<S>)),
            )
            .service(
                web::resource("/reviews/{id}")
                    .wrap(JwtMiddleware::new(tokens.clone()))
                    .route(web::put().to(update_review::<S>))
                    .route(web::delete().to(delete_review::<S>)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
