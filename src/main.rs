mod coupons;
mod customers;
mod db;
mod programs;
mod redemptions;
mod scope;
mod tiers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;

use coupons::{CouponService, CouponsRepository};
use customers::{CustomerService, CustomersRepository, LedgerRepository};
use programs::{OrdersRepository, ProgramsRepository, RewardsRepository};
use redemptions::{RedemptionService, RedemptionsRepository};
use tiers::{TierService, TiersRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tier_service: TierService,
    pub customer_service: CustomerService,
    pub redemption_service: RedemptionService,
    pub coupon_service: CouponService,
}

impl AppState {
    /// Wire repositories and services over one connection pool
    pub fn new(db: PgPool) -> Self {
        let programs_repo = ProgramsRepository::new(db.clone());
        let rewards_repo = RewardsRepository::new(db.clone());
        let orders_repo = OrdersRepository::new(db.clone());
        let tiers_repo = TiersRepository::new(db.clone());
        let customers_repo = CustomersRepository::new(db.clone());
        let ledger_repo = LedgerRepository::new(db.clone());
        let redemptions_repo = RedemptionsRepository::new(db.clone());
        let coupons_repo = CouponsRepository::new(db.clone());

        let tier_service = TierService::new(tiers_repo, programs_repo.clone());
        let customer_service = CustomerService::new(
            customers_repo.clone(),
            ledger_repo,
            programs_repo.clone(),
            orders_repo.clone(),
            tier_service.clone(),
        );
        let redemption_service = RedemptionService::new(
            redemptions_repo,
            customers_repo.clone(),
            programs_repo,
            rewards_repo.clone(),
            orders_repo.clone(),
        );
        let coupon_service =
            CouponService::new(coupons_repo, customers_repo, rewards_repo, orders_repo);

        Self {
            db,
            tier_service,
            customer_service,
            redemption_service,
            coupon_service,
        }
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(db: PgPool) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let state = AppState::new(db);

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tier catalog
        .route("/api/programs/:program_id/tiers", get(tiers::list_tiers_handler))
        .route("/api/programs/:program_id/tiers", post(tiers::create_tier_handler))
        .route("/api/tiers/:id", put(tiers::update_tier_handler))
        .route("/api/tiers/:id", delete(tiers::delete_tier_handler))
        // Loyalty customers and their ledger
        .route("/api/customers", post(customers::enroll_customer_handler))
        .route("/api/customers/:id", get(customers::get_customer_handler))
        .route(
            "/api/customers/:id/transactions",
            get(customers::list_transactions_handler),
        )
        .route("/api/customers/:id/earn", post(customers::earn_points_handler))
        .route("/api/customers/:id/adjust", post(customers::adjust_points_handler))
        .route(
            "/api/customers/:id/redemptions",
            get(redemptions::list_redemptions_handler),
        )
        .route("/api/customers/:id/coupons", get(coupons::list_coupons_handler))
        // Redemptions
        .route("/api/redemptions", post(redemptions::redeem_handler))
        .route("/api/redemptions/:id", put(redemptions::update_redemption_handler))
        .route(
            "/api/redemptions/:id",
            delete(redemptions::reverse_redemption_handler),
        )
        // Coupons
        .route("/api/coupons", post(coupons::issue_coupon_handler))
        .route("/api/coupons/:id", get(coupons::get_coupon_handler))
        .route("/api/coupons/:id", put(coupons::update_coupon_handler))
        .route("/api/coupons/:id", delete(coupons::revoke_coupon_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Loyalty API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Create the application router
    let app = create_router(db_pool);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Loyalty API is running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
