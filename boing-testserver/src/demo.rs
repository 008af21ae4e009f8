//! Demo e-commerce API the campaigns are aimed at.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
struct Product {
    id: u32,
    name: &'static str,
    price: f64,
    stock: u32,
}

const PRODUCTS: [(u32, &str, f64, u32); 5] = [
    (1, "Laptop", 999.99, 50),
    (2, "Mouse", 29.99, 200),
    (3, "Keyboard", 79.99, 150),
    (4, "Monitor", 299.99, 75),
    (5, "Headphones", 149.99, 100),
];

const USERS: [(u32, &str, &str); 2] = [
    (1, "john_doe", "john@example.com"),
    (2, "jane_smith", "jane@example.com"),
];

#[derive(Debug, Clone, Serialize)]
struct Order {
    id: u32,
    product_id: u32,
    quantity: u32,
    total: f64,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewOrder {
    product_id: Option<u32>,
    quantity: Option<u32>,
}

/// Mutable shop inventory. `reset` restores the seeded stock and drops all orders.
#[derive(Debug)]
pub(crate) struct Shop {
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl Default for Shop {
    fn default() -> Self {
        Self {
            products: PRODUCTS
                .iter()
                .map(|&(id, name, price, stock)| Product {
                    id,
                    name,
                    price,
                    stock,
                })
                .collect(),
            orders: Vec::new(),
        }
    }
}

pub(crate) type SharedShop = Arc<Mutex<Shop>>;

fn lock(shop: &SharedShop) -> std::sync::MutexGuard<'_, Shop> {
    shop.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{what} not found") }))).into_response()
}

pub(crate) async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to Demo E-commerce API",
        "version": "1.0.0",
        "endpoints": {
            "products": "/api/products",
            "users": "/api/users",
            "orders": "/api/orders",
        },
    }))
}

pub(crate) async fn list_products(State(state): State<AppState>) -> Response {
    Json(lock(&state.shop).products.clone()).into_response()
}

// Non-numeric ids fall through to 404 like an unmatched route would.
pub(crate) async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let shop = lock(&state.shop);
    match id
        .parse::<u32>()
        .ok()
        .and_then(|id| shop.products.iter().find(|p| p.id == id))
    {
        Some(p) => Json(p.clone()).into_response(),
        None => not_found("Product"),
    }
}

pub(crate) async fn list_users() -> Response {
    let users: Vec<_> = USERS
        .iter()
        .map(|&(id, username, email)| json!({ "id": id, "username": username, "email": email }))
        .collect();
    Json(users).into_response()
}

pub(crate) async fn get_user(Path(id): Path<String>) -> Response {
    match id
        .parse::<u32>()
        .ok()
        .and_then(|id| USERS.iter().find(|u| u.0 == id))
    {
        Some(&(id, username, email)) => {
            Json(json!({ "id": id, "username": username, "email": email })).into_response()
        }
        None => not_found("User"),
    }
}

pub(crate) async fn list_orders(State(state): State<AppState>) -> Response {
    Json(lock(&state.shop).orders.clone()).into_response()
}

pub(crate) async fn create_order(
    State(state): State<AppState>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Response {
    let Ok(Json(NewOrder {
        product_id: Some(product_id),
        quantity: Some(quantity),
    })) = body
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing required fields" })),
        )
            .into_response();
    };

    let mut shop = lock(&state.shop);
    let next_id = shop.orders.len() as u32 + 1;
    let Some(product) = shop.products.iter_mut().find(|p| p.id == product_id) else {
        return not_found("Product");
    };
    if product.stock < quantity {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Insufficient stock" })),
        )
            .into_response();
    }

    product.stock -= quantity;
    let order = Order {
        id: next_id,
        product_id,
        quantity,
        total: product.price * f64::from(quantity),
        status: "pending",
    };
    shop.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

pub(crate) async fn search(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let q = query.get("q").cloned().unwrap_or_default();
    state.stats.push_search_query(q.clone());

    let needle = q.to_lowercase();
    let hits: Vec<_> = lock(&state.shop)
        .products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    Json(hits).into_response()
}

pub(crate) async fn admin_reset(State(state): State<AppState>) -> Response {
    *lock(&state.shop) = Shop::default();
    Json(json!({ "message": "Demo data reset successfully" })).into_response()
}

pub(crate) async fn fallback() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
