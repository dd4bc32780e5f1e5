// restbase-server/src/routes.rs
// Resource routing: verb + path dispatch onto the core's query and
// mutation engines, plus the transport-level concerns (artificial delay,
// pagination headers, error-to-status mapping).

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use restbase_core::{
    log_debug, mutation, transform, QueryPlan, ResourceShape, RestError, Store,
};
use serde_json::{json, Value};

pub type SharedStore = Arc<Store>;

/// Build the resource router from the store's top-level shape.
///
/// Every array entry gets collection routes, every object entry gets
/// singular routes. Any other shape aborts startup: routing cannot be
/// constructed over it.
pub fn build_router(store: SharedStore) -> restbase_core::Result<Router> {
    let shapes = store.verify_shapes()?;
    for (name, shape) in &shapes {
        log_debug!("mounting /{} as {:?}", name, shape);
    }

    Ok(Router::new()
        .route("/:name", get(list).post(create).put(replace).patch(update))
        .route("/:name/:id", get(show).delete(destroy))
        .layer(middleware::from_fn(delay_middleware))
        .with_state(store))
}

/// Artificial delay for slow-network testing: `?delay=<ms>` on any
/// request sleeps the handling task before processing. Requests are
/// delayed independently, never reordered relative to each other.
async fn delay_middleware(request: Request, next: Next) -> Response {
    let delay = request.uri().query().and_then(|query| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("delay="))
            .and_then(|value| value.parse::<u64>().ok())
    });
    if let Some(ms) = delay {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
    next.run(request).await
}

// GET /name
// GET /name?category.name=  _lte=  _gte=  _ne=  _like=
// GET /name?_start=1&_end=10
// GET /name?_sort=category.name,id&_order=desc,asc
// GET /name?_embed=subcategory.category
// GET /name?_refs=subcategory
async fn list(
    State(store): State<SharedStore>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let data = store.data();
    match data.get(&name) {
        Some(Value::Array(_)) => {
            // `delay` is a transport concern, consumed by the middleware;
            // it must not leak into the plan as an `eq` filter.
            let params: Vec<(String, String)> =
                params.into_iter().filter(|(key, _)| key != "delay").collect();
            let plan = QueryPlan::from_params(&params);
            let page = transform::run(&data, &name, &plan);

            let total = page.total;
            let mut response = Json(Value::Array(page.records)).into_response();
            if let Some(total) = total {
                let headers = response.headers_mut();
                headers.insert(
                    HeaderName::from_static("x-total-count"),
                    HeaderValue::from(total),
                );
                headers.append(
                    header::ACCESS_CONTROL_EXPOSE_HEADERS,
                    HeaderValue::from_static("X-Total-Count"),
                );
            }
            response
        }
        Some(record @ Value::Object(_)) => Json(record.clone()).into_response(),
        _ => error_response(no_such_resource(&name)),
    }
}

// GET /name/:id
async fn show(
    State(store): State<SharedStore>,
    Path((name, id)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let data = store.data();
    if !matches!(data.get(&name), Some(Value::Array(_))) {
        return error_response(no_such_resource(&name));
    }

    let Some(found) = transform::find_by_id_param(&data, &name, &id) else {
        return error_response(RestError::NotFound("No such item".to_string()));
    };

    // clone before embedding so the canonical record stays untouched
    let mut record = found.clone();
    let embed: Vec<String> = params
        .iter()
        .filter(|(key, _)| key == "_embed")
        .flat_map(|(_, value)| value.split(','))
        .map(str::to_string)
        .collect();
    transform::embed_record(&data, &mut record, &embed);

    Json(record).into_response()
}

// POST /name
async fn create(
    State(store): State<SharedStore>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    match store.shape_of(&name) {
        Some(ResourceShape::Plural) => match mutation::create(&store, &name, body) {
            Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
            Err(err) => error_response(err),
        },
        Some(ResourceShape::Singular) => error_response(mutation::create_singular()),
        None => error_response(no_such_resource(&name)),
    }
}

// PUT /name -> replaces (adds if not exists)
async fn replace(
    State(store): State<SharedStore>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let result = match store.shape_of(&name) {
        Some(ResourceShape::Plural) => mutation::replace(&store, &name, body),
        Some(ResourceShape::Singular) => mutation::replace_singular(&store, &name, body),
        None => Err(no_such_resource(&name)),
    };
    match result {
        Ok(echoed) => Json(echoed).into_response(),
        Err(err) => error_response(err),
    }
}

// PATCH /name -> updates (errors if not exists)
async fn update(
    State(store): State<SharedStore>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let result = match store.shape_of(&name) {
        Some(ResourceShape::Plural) => mutation::update(&store, &name, body),
        Some(ResourceShape::Singular) => mutation::update_singular(&store, &name, body),
        None => Err(no_such_resource(&name)),
    };
    match result {
        Ok(echoed) => Json(echoed).into_response(),
        Err(err) => error_response(err),
    }
}

// DELETE /name/:id
async fn destroy(
    State(store): State<SharedStore>,
    Path((name, id)): Path<(String, String)>,
) -> Response {
    match store.shape_of(&name) {
        Some(ResourceShape::Plural) => match mutation::destroy(&store, &name, &id) {
            Ok(body) => Json(body).into_response(),
            Err(err) => error_response(err),
        },
        Some(ResourceShape::Singular) => error_response(no_such_resource(&name)),
        None => error_response(no_such_resource(&name)),
    }
}

fn no_such_resource(name: &str) -> RestError {
    RestError::NotFound(format!("No such resource: {}", name))
}

/// Map a core error onto its response. Status codes: 400 validation,
/// 404 not found, 409 conflict; anything else is a server fault.
fn error_response(err: RestError) -> Response {
    match err {
        RestError::Validation { resource, errors } => {
            let body = match resource {
                Some(resource) => json!({"resource": resource, "errors": errors}),
                None => json!({"errors": errors}),
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        RestError::Conflict { body } => (StatusCode::CONFLICT, Json(body)).into_response(),
        RestError::NotFound(message) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": message})),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": other.to_string()})),
        )
            .into_response(),
    }
}
