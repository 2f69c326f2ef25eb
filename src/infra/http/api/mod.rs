pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::{ApiState, Repositories};

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(handlers::get_client).delete(handlers::delete_client),
        )
        .route(
            "/api/clients/{client_id}/customers",
            get(handlers::list_client_customers).post(handlers::create_client_customer),
        )
        .route(
            "/api/clients/{client_id}/customers/{customer_id}",
            get(handlers::get_client_customer).delete(handlers::delete_client_customer),
        )
        .route("/api/customers", get(handlers::list_customers))
        .route("/api/customers/{id}", get(handlers::get_customer))
        .route(
            "/api/phones",
            get(handlers::list_phones).post(handlers::create_phone),
        )
        .route(
            "/api/phones/{id}",
            get(handlers::get_phone)
                .put(handlers::update_phone)
                .delete(handlers::delete_phone),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
        .with_state(state)
}
