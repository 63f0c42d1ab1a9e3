pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::discount_service::DiscountService;
use application::order_service::OrderService;
use application::payment_service::PaymentService;
use config::AppConfig;
use domain::assembler::OrderAssembler;
use domain::errors::DomainError;
use infrastructure::cart_store::CartStore;
use infrastructure::discount_repo::DieselDiscountRepository;
use infrastructure::gateway::IyzicoClient;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Everything the handlers share, built once at startup.
pub struct AppState {
    pub orders: OrderService,
    pub discounts: DiscountService,
    pub payments: PaymentService,
    pub carts: CartStore,
    pub admin_token: String,
    pub storefront_url: String,
}

impl AppState {
    pub fn from_config(config: &AppConfig, pool: DbPool) -> Result<Self, DomainError> {
        let order_repo = Arc::new(DieselOrderRepository::new(pool.clone(), config.order_tx_timeout));
        let discount_repo = Arc::new(DieselDiscountRepository::new(pool));
        let gateway = Arc::new(IyzicoClient::new(&config.gateway, &config.payment.locale)?);

        Ok(AppState {
            orders: OrderService::new(
                order_repo.clone(),
                OrderAssembler::new(config.redemption_policy),
            ),
            discounts: DiscountService::new(discount_repo, config.redemption_policy),
            payments: PaymentService::new(order_repo, gateway, config.payment.clone()),
            carts: CartStore::new(),
            admin_token: config.admin_token.clone(),
            storefront_url: config.storefront_url.clone(),
        })
    }
}

/// Route table, shared by the server and the handler tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::{cart, discounts, orders, payments};

    cfg.route("/discounts/check", web::post().to(discounts::check_discount))
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::list_orders))
                .route("/{order_number}", web::get().to(orders::get_order))
                .route("/{order_number}/confirm", web::post().to(orders::confirm_order))
                .route("/{order_number}/cancel", web::post().to(orders::cancel_order))
                .route("/{order_number}/refund", web::post().to(orders::refund_order))
                .route(
                    "/{order_number}/bank-transfer-notifications",
                    web::post().to(orders::submit_bank_transfer_notification),
                ),
        )
        .service(
            web::scope("/payments")
                .route("/3ds/initialize", web::post().to(payments::initialize_three_ds))
                .route("/3ds/callback", web::post().to(payments::three_ds_callback))
                .route("/direct", web::post().to(payments::pay_direct))
                .route("/bin-check", web::post().to(payments::check_bin))
                .route("/{payment_id}", web::get().to(payments::payment_detail)),
        )
        .service(
            web::scope("/cart/{session}")
                .route("", web::get().to(cart::get_cart))
                .route("", web::delete().to(cart::clear_cart))
                .route("/items", web::post().to(cart::add_item))
                .route("/items/{variant_id}", web::delete().to(cart::remove_item))
                .route("/items/{variant_id}/increase", web::post().to(cart::increase_item))
                .route("/items/{variant_id}/decrease", web::post().to(cart::decrease_item))
                .route("/checkout", web::post().to(cart::checkout)),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = handlers::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(handlers::json_config())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
