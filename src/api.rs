use axum::{
    body::Body,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Extension, FromRequest, Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{
    now_timestamp, ContactMethod, Database, NewSupplier, Order, OrderFilter, OrderId, OrderStats,
    OrderStatus, RestaurantId, Supplier, SupplierId, SupplierUpdate,
};
use crate::order::{compose_lines, OrderDraft, OrderError, OrderLine};
use crate::parser::{parse_order_text, ParsedLine};
use crate::system_info::get_system_info;
use crate::template::render_message;

#[derive(Debug, Serialize, Deserialize)]
struct ParseRequest {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParseResponse {
    items: Vec<ParsedLine>,
}

#[derive(Debug, Serialize)]
struct SuppliersResponse {
    suppliers: Vec<Supplier>,
}

#[derive(Debug, Deserialize)]
struct UpdateSupplierRequest {
    id: SupplierId,
    #[serde(flatten)]
    update: SupplierUpdate,
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    id: SupplierId,
}

#[derive(Debug, Serialize)]
struct PreviewResponse {
    message: String,
    items: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
struct CreatedOrderResponse {
    order: Order,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    id: OrderId,
    status: OrderStatus,
    #[serde(default)]
    sent_method: Option<ContactMethod>,
}

#[derive(Debug, Serialize)]
struct OrdersResponse {
    orders: Vec<Order>,
    stats: OrderStats,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    info: String,
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    affected: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub rate_limit_per_second: Option<u64>,
}

#[derive(Clone, Debug)]
struct RequestContext {
    request_id: String,
}

#[derive(Clone, Debug)]
struct AuthenticatedContext {
    restaurant: RestaurantId,
    token_preview: String,
}

#[derive(Debug)]
struct RateLimiter {
    limit: u64,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

/// JSON body extractor that answers `invalid_request` instead of axum's
/// plain-text rejection.
struct ApiJson<T>(T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.request_id.clone())
            .unwrap_or_else(|| "unknown".to_string());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = %rejection.status(),
                    error = %rejection.body_text(),
                    "Rejected request body"
                );
                Err(bad_request_response())
            }
        }
    }
}

pub fn router(db: Database, config: ApiConfig) -> Router {
    let auth_layer = middleware::from_fn_with_state(db.clone(), require_auth);
    let request_id_layer = middleware::from_fn(assign_request_id);
    let mut protected = Router::new()
        .route("/api/parse", post(parse_text))
        .route("/api/suppliers", get(list_suppliers).post(create_supplier))
        .route("/api/suppliers/{id}", get(get_supplier))
        .route("/api/suppliers/update", post(update_supplier))
        .route("/api/suppliers/delete", post(delete_supplier))
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/preview", post(preview_order))
        .route("/api/orders/status", post(update_order_status))
        .with_state(db);

    if let Some(rate_limit) = config.rate_limit_per_second {
        let limiter = Arc::new(RateLimiter {
            limit: rate_limit,
            window: Duration::from_secs(1),
            timestamps: Mutex::new(VecDeque::new()),
        });
        let rate_limit_layer = middleware::from_fn_with_state(limiter, rate_limit_requests);
        protected = protected.layer(rate_limit_layer);
    }

    Router::new()
        .route("/api/info", get(system_info))
        .merge(protected.layer(auth_layer))
        .layer(request_id_layer)
}

async fn require_auth(State(db): State<Database>, mut req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.as_str())
        .unwrap_or("unknown");
    let token = match extract_bearer_token(req.headers()) {
        Some(token) => token,
        None => {
            tracing::debug!(request_id, "Missing bearer token");
            return unauthorized_response();
        }
    };

    let preview = token_preview(&token);
    tracing::debug!(request_id, token_preview = %preview, "Checking bearer token");
    let used_at = now_timestamp();
    let restaurant = match db.use_token(&token, used_at).await {
        Ok(Some(restaurant)) => restaurant,
        Ok(None) => {
            tracing::debug!(request_id, token_preview = %preview, "Bearer token rejected");
            return unauthorized_response();
        }
        Err(err) => {
            tracing::error!(request_id, token_preview = %preview, error = %err, "Failed to validate bearer token");
            return internal_error_response();
        }
    };

    tracing::debug!(
        request_id,
        restaurant_id = restaurant.0,
        token_preview = %preview,
        "Authenticated API request"
    );
    req.extensions_mut().insert(AuthenticatedContext {
        restaurant,
        token_preview: preview,
    });
    next.run(req).await
}

/// Log a storage failure with the request's identifying fields and answer 500.
fn storage_failure(
    request: &RequestContext,
    context: &AuthenticatedContext,
    err: anyhow::Error,
    what: &'static str,
) -> Response {
    tracing::error!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        token_preview = %context.token_preview,
        error = %err,
        "{what}"
    );
    internal_error_response()
}

async fn system_info() -> Response {
    (
        StatusCode::OK,
        Json(InfoResponse {
            info: get_system_info(),
        }),
    )
        .into_response()
}

async fn parse_text(
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(payload): ApiJson<ParseRequest>,
) -> Response {
    let items = parse_order_text(&payload.text);
    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        item_count = items.len(),
        "Parsed order text via API"
    );
    (StatusCode::OK, Json(ParseResponse { items })).into_response()
}

async fn list_suppliers(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
) -> Response {
    let suppliers = match db.list_suppliers(context.restaurant).await {
        Ok(suppliers) => suppliers,
        Err(err) => return storage_failure(&request, &context, err, "Failed to load suppliers"),
    };

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        supplier_count = suppliers.len(),
        "Read suppliers"
    );
    (StatusCode::OK, Json(SuppliersResponse { suppliers })).into_response()
}

async fn get_supplier(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = path else {
        return bad_request_response();
    };
    match db.get_supplier(context.restaurant, SupplierId(id)).await {
        Ok(Some(supplier)) => (StatusCode::OK, Json(supplier)).into_response(),
        Ok(None) => not_found_response(),
        Err(err) => storage_failure(&request, &context, err, "Failed to load supplier"),
    }
}

async fn create_supplier(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(payload): ApiJson<NewSupplier>,
) -> Response {
    if payload.name.trim().is_empty()
        || payload.contact_info.trim().is_empty()
        || payload
            .products
            .iter()
            .any(|p| p.name.trim().is_empty() || p.unit.trim().is_empty())
    {
        return bad_request_response();
    }

    let now = now_timestamp();
    let supplier = match db.create_supplier(context.restaurant, &payload, now).await {
        Ok(supplier) => supplier,
        Err(err) => return storage_failure(&request, &context, err, "Failed to create supplier"),
    };

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        supplier_id = supplier.id.0,
        products = supplier.products.len(),
        "Created supplier via API"
    );
    (StatusCode::CREATED, Json(supplier)).into_response()
}

async fn update_supplier(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(payload): ApiJson<UpdateSupplierRequest>,
) -> Response {
    let blank = |value: &Option<String>| value.as_deref().is_some_and(|v| v.trim().is_empty());
    if blank(&payload.update.name) || blank(&payload.update.contact_info) {
        return bad_request_response();
    }

    let now = now_timestamp();
    let supplier = match db
        .update_supplier(context.restaurant, payload.id, &payload.update, now)
        .await
    {
        Ok(Some(supplier)) => supplier,
        Ok(None) => return not_found_response(),
        Err(err) => return storage_failure(&request, &context, err, "Failed to update supplier"),
    };

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        supplier_id = supplier.id.0,
        "Updated supplier via API"
    );
    (StatusCode::OK, Json(supplier)).into_response()
}

async fn delete_supplier(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(payload): ApiJson<DeleteRequest>,
) -> Response {
    let now = now_timestamp();
    let affected = match db
        .deactivate_supplier(context.restaurant, payload.id, now)
        .await
    {
        Ok(affected) => affected,
        Err(err) => return storage_failure(&request, &context, err, "Failed to delete supplier"),
    };

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        supplier_id = payload.id.0,
        affected,
        "Deactivated supplier via API"
    );
    if affected == 0 {
        return not_found_response();
    }
    (StatusCode::OK, Json(MutationResponse { affected })).into_response()
}

/// Load the draft's supplier and compose its lines, or produce the error
/// response to send instead.
async fn prepare_order(
    db: &Database,
    context: &AuthenticatedContext,
    request: &RequestContext,
    draft: &OrderDraft,
) -> Result<(Supplier, Vec<OrderLine>), Response> {
    let supplier = match db.get_supplier(context.restaurant, draft.supplier_id).await {
        Ok(Some(supplier)) => supplier,
        Ok(None) => return Err(not_found_response()),
        Err(err) => return Err(storage_failure(request, context, err, "Failed to load supplier")),
    };

    match compose_lines(&supplier, draft) {
        Ok(lines) => Ok((supplier, lines)),
        Err(err) => {
            tracing::debug!(
                request_id = %request.request_id,
                restaurant_id = context.restaurant.0,
                supplier_id = supplier.id.0,
                error = %err,
                "Rejected order draft"
            );
            Err(order_error_response(&err))
        }
    }
}

async fn preview_order(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(draft): ApiJson<OrderDraft>,
) -> Response {
    let (supplier, lines) = match prepare_order(&db, &context, &request, &draft).await {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };
    let message = render_message(supplier.message_template.as_deref(), &lines, draft.notes());
    (
        StatusCode::OK,
        Json(PreviewResponse {
            message,
            items: lines,
        }),
    )
        .into_response()
}

async fn create_order(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(draft): ApiJson<OrderDraft>,
) -> Response {
    let (supplier, lines) = match prepare_order(&db, &context, &request, &draft).await {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let placed_at = chrono::Local::now().naive_local();
    let order = match db
        .create_order(context.restaurant, supplier.id, &lines, draft.notes(), placed_at)
        .await
    {
        Ok(order) => order,
        Err(err) => return storage_failure(&request, &context, err, "Failed to create order"),
    };
    let message = render_message(supplier.message_template.as_deref(), &lines, draft.notes());

    tracing::info!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        supplier_id = supplier.id.0,
        order_id = order.id.0,
        total_items = order.total_items,
        "Created order via API"
    );
    (
        StatusCode::CREATED,
        Json(CreatedOrderResponse { order, message }),
    )
        .into_response()
}

async fn update_order_status(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> Response {
    let now = now_timestamp();
    let affected = match db
        .update_order_status(
            context.restaurant,
            payload.id,
            payload.status,
            payload.sent_method,
            now,
        )
        .await
    {
        Ok(affected) => affected,
        Err(err) => return storage_failure(&request, &context, err, "Failed to update order"),
    };

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        order_id = payload.id.0,
        status = %payload.status,
        affected,
        "Updated order status via API"
    );
    if affected == 0 {
        return not_found_response();
    }

    match db.get_order(context.restaurant, payload.id).await {
        Ok(Some(order)) => (StatusCode::OK, Json(order)).into_response(),
        Ok(None) => not_found_response(),
        Err(err) => storage_failure(&request, &context, err, "Failed to load order"),
    }
}

async fn list_orders(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    query: Result<Query<OrderFilter>, QueryRejection>,
) -> Response {
    let filter = match query {
        Ok(Query(filter)) => filter,
        Err(rejection) => {
            tracing::debug!(
                request_id = %request.request_id,
                error = %rejection.body_text(),
                "Rejected order filter"
            );
            return bad_request_response();
        }
    };
    let orders = match db.list_orders(context.restaurant, &filter).await {
        Ok(orders) => orders,
        Err(err) => return storage_failure(&request, &context, err, "Failed to load orders"),
    };
    let stats = OrderStats::from_orders(&orders);

    tracing::debug!(
        request_id = %request.request_id,
        restaurant_id = context.restaurant.0,
        order_count = orders.len(),
        "Read order history"
    );
    (StatusCode::OK, Json(OrdersResponse { orders, stats })).into_response()
}

async fn get_order(
    State(db): State<Database>,
    Extension(context): Extension<AuthenticatedContext>,
    Extension(request): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = path else {
        return bad_request_response();
    };
    match db.get_order(context.restaurant, OrderId(id)).await {
        Ok(Some(order)) => (StatusCode::OK, Json(order)).into_response(),
        Ok(None) => not_found_response(),
        Err(err) => storage_failure(&request, &context, err, "Failed to load order"),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub(crate) fn token_preview(token: &str) -> String {
    token.chars().take(6).collect()
}

async fn assign_request_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });
    let method = req.method().clone();
    let uri = req.uri().clone();
    let mut response = next.run(req).await;
    let status = response.status();
    let header_value = match request_id.parse() {
        Ok(value) => value,
        Err(_) => {
            return response;
        }
    };
    response
        .headers_mut()
        .insert(HeaderName::from_static("x-request-id"), header_value);
    tracing::debug!(
        request_id,
        method = %method,
        uri = %uri,
        status = %status,
        "API request completed"
    );
    response
}

async fn rate_limit_requests(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.as_str())
        .unwrap_or("unknown");
    let token_preview = req
        .extensions()
        .get::<AuthenticatedContext>()
        .map(|ctx| ctx.token_preview.as_str())
        .unwrap_or("unknown");
    let now = Instant::now();
    let mut timestamps = limiter.timestamps.lock().await;
    while let Some(ts) = timestamps.front() {
        if now.duration_since(*ts) >= limiter.window {
            timestamps.pop_front();
        } else {
            break;
        }
    }

    if timestamps.len() as u64 >= limiter.limit {
        tracing::debug!(request_id, token_preview, "API rate limit exceeded");
        return error_response(StatusCode::TOO_MANY_REQUESTS, "rate_limited");
    }
    timestamps.push_back(now);
    drop(timestamps);
    next.run(req).await
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn unauthorized_response() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "unauthorized")
}

fn internal_error_response() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
}

fn bad_request_response() -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid_request")
}

fn not_found_response() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found")
}

fn order_error_response(err: &OrderError) -> Response {
    let status = match err {
        OrderError::InactiveSupplier(_) => StatusCode::CONFLICT,
        OrderError::NoItems | OrderError::UnknownProduct(_) => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::util::{init_test_db, sample_supplier};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(db: Database) -> Router {
        router(
            db,
            ApiConfig {
                rate_limit_per_second: None,
            },
        )
    }

    fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get_authed(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn parse_requires_auth() {
        let db = init_test_db().await;
        let response = app(db)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/parse")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"3x Mozzarella"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn info_is_public() {
        let db = init_test_db().await;
        let response = app(db)
            .oneshot(Request::builder().uri("/api/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert!(payload["info"].as_str().unwrap().contains("restock"));
    }

    #[tokio::test]
    async fn parse_returns_items() {
        let db = init_test_db().await;
        db.create_token(RestaurantId(1), "token-parse", 1)
            .await
            .unwrap();

        let response = app(db.clone())
            .oneshot(post_json(
                "/api/parse",
                "token-parse",
                json!({ "text": "3x Mozzarella di bufala\nLimoni - 2 kg\nok" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ParseResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            payload.items,
            vec![
                ParsedLine::new("Mozzarella di bufala", "3", "pezzi"),
                ParsedLine::new("Limoni", "2", "kg"),
            ]
        );

        let tokens = db.list_tokens(RestaurantId(1)).await.unwrap();
        assert!(tokens[0].last_used_at.is_some());
    }

    #[tokio::test]
    async fn create_supplier_validates_fields() {
        let db = init_test_db().await;
        db.create_token(RestaurantId(1), "token-sup", 1).await.unwrap();

        let response = app(db)
            .oneshot(post_json(
                "/api/suppliers",
                "token-sup",
                json!({ "name": "  ", "contact_method": "email", "contact_info": "a@b.it" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = body_json(response).await;
        assert_eq!(payload["error"], "invalid_request");
    }

    #[tokio::test]
    async fn preview_renders_supplier_template() {
        let db = init_test_db().await;
        let restaurant = RestaurantId(2);
        db.create_token(restaurant, "token-prev", 1).await.unwrap();
        let mut new = sample_supplier("Carni Rossi");
        new.message_template = Some("Ordine:\n{ORDER_DETAILS}\nGrazie".to_string());
        let supplier = db.create_supplier(restaurant, &new, 1).await.unwrap();
        let product = supplier.products[0].id;

        let response = app(db)
            .oneshot(post_json(
                "/api/orders/preview",
                "token-prev",
                json!({
                    "supplier_id": supplier.id,
                    "selections": [{ "product_id": product, "quantity": "2" }],
                    "custom_items": "Sale grosso",
                    "notes": "Entro le 11"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(
            payload["message"],
            "Ordine:\n- Bistecca di manzo: 2 kg\n- Sale grosso: 1 pezzi\n\nNote aggiuntive:\nEntro le 11\nGrazie"
        );
        assert_eq!(payload["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn preview_rejects_empty_draft() {
        let db = init_test_db().await;
        let restaurant = RestaurantId(2);
        db.create_token(restaurant, "token-empty", 1).await.unwrap();
        let supplier = db
            .create_supplier(restaurant, &sample_supplier("Carni Rossi"), 1)
            .await
            .unwrap();

        let response = app(db)
            .oneshot(post_json(
                "/api/orders/preview",
                "token-empty",
                json!({ "supplier_id": supplier.id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "no_items");
    }

    #[tokio::test]
    async fn orders_of_other_restaurants_are_hidden() {
        let db = init_test_db().await;
        db.create_token(RestaurantId(1), "token-one", 1).await.unwrap();
        db.create_token(RestaurantId(2), "token-two", 1).await.unwrap();
        let supplier = db
            .create_supplier(RestaurantId(1), &sample_supplier("Carni Rossi"), 1)
            .await
            .unwrap();

        let app = app(db);
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/orders",
                "token-one",
                json!({ "supplier_id": supplier.id, "custom_items": "Pane" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let order_id = body_json(response).await["order"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(get_authed(&format!("/api/orders/{order_id}"), "token-two"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(post_json(
                "/api/orders",
                "token-two",
                json!({ "supplier_id": supplier.id, "custom_items": "Pane" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rate_limit_rejects_excess_requests() {
        let db = init_test_db().await;
        db.create_token(RestaurantId(1), "token-rl", 1).await.unwrap();
        let app = router(
            db,
            ApiConfig {
                rate_limit_per_second: Some(1),
            },
        );

        let first = app
            .clone()
            .oneshot(get_authed("/api/suppliers", "token-rl"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(get_authed("/api/suppliers", "token-rl"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn order_errors_map_to_codes() {
        let response = order_error_response(&OrderError::InactiveSupplier(SupplierId(1)));
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = order_error_response(&OrderError::UnknownProduct(crate::db::ProductId(3)));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    proptest! {
        #[test]
        fn bearer_token_parses_from_header(token in "[A-Za-z0-9_-]{1,64}") {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                format!("Bearer {token}").parse().unwrap(),
            );
            let parsed = extract_bearer_token(&headers);
            prop_assert_eq!(parsed, Some(token));
        }
    }
}
