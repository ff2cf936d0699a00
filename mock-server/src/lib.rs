use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const MAX_LIMIT: u64 = 50;
pub const DEFAULT_LIMIT: u64 = 20;

/// In-memory listing book. Properties are kept as JSON objects in insertion
/// order, each with a `public_id`.
#[derive(Debug, Default)]
pub struct Store {
    properties: Vec<Map<String, Value>>,
    next_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `count` listings titled `Property 1`, `Property 2`, ...
    /// with `updated_at` dates spread over 2022.
    pub fn seeded(count: usize) -> Self {
        let mut store = Self::new();
        for i in 0..count {
            let month = i % 12 + 1;
            store.insert(sample_property(
                &format!("Property {}", i + 1),
                &format!("2022-{month:02}-15T12:00:00-06:00"),
            ));
        }
        store
    }

    /// Adds a property, assigning a `public_id` when it has none.
    pub fn insert(&mut self, mut property: Map<String, Value>) -> Map<String, Value> {
        self.next_id += 1;
        if !property.contains_key("public_id") {
            property.insert(
                "public_id".to_string(),
                Value::from(format!("EB-{:05}", self.next_id)),
            );
        }
        self.properties.push(property.clone());
        property
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn find(&self, id: &str) -> Option<&Map<String, Value>> {
        self.properties
            .iter()
            .find(|p| p.get("public_id").and_then(Value::as_str) == Some(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Map<String, Value>> {
        self.properties
            .iter_mut()
            .find(|p| p.get("public_id").and_then(Value::as_str) == Some(id))
    }
}

/// A published listing with the given title and update timestamp.
pub fn sample_property(title: &str, updated_at: &str) -> Map<String, Value> {
    let value = json!({
        "title": title,
        "property_type": "Apartment",
        "status": "published",
        "location": "Roma Norte, Cuauhtémoc, Ciudad de México",
        "updated_at": updated_at,
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

pub fn app(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/properties", get(list_properties).post(create_property))
        .route("/properties/{id}", get(get_property).patch(update_property))
        .with_state(db)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store)).await
}

fn authorize(headers: &HeaderMap) -> Result<(), ApiError> {
    let key = headers
        .get("x-authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if key.is_empty() {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Unauthorized"));
    }
    Ok(())
}

fn positive_param(
    params: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ApiError> {
    match params.get(name) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if value >= 1 => Ok(value),
            _ => Err(api_error(
                StatusCode::BAD_REQUEST,
                &format!("{name} must be a positive integer"),
            )),
        },
    }
}

/// `YYYY-MM-DD` prefix of the property's `updated_at`.
fn updated_on(property: &Map<String, Value>) -> &str {
    property
        .get("updated_at")
        .and_then(Value::as_str)
        .and_then(|stamp| stamp.get(..10))
        .unwrap_or_default()
}

async fn list_properties(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;
    let page = positive_param(&params, "page", 1)?;
    let limit = positive_param(&params, "limit", DEFAULT_LIMIT)?.min(MAX_LIMIT);
    let after = params.get("search[updated_after]");
    let before = params.get("search[updated_before]");

    let store = db.read().await;
    let matching: Vec<&Map<String, Value>> = store
        .properties
        .iter()
        .filter(|p| after.map_or(true, |date| updated_on(p) >= date.as_str()))
        .filter(|p| before.map_or(true, |date| updated_on(p) <= date.as_str()))
        .collect();

    let total = matching.len() as u64;
    let start = (page - 1).saturating_mul(limit);
    let content: Vec<&Map<String, Value>> = matching
        .into_iter()
        .skip(usize::try_from(start).unwrap_or(usize::MAX))
        .take(limit as usize)
        .collect();
    let next_page = (start.saturating_add(limit) < total)
        .then(|| format!("/properties?page={}&limit={limit}", page + 1));

    info!(page, limit, total, returned = content.len(), "listed properties");
    Ok(Json(json!({
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "next_page": next_page,
        },
        "content": content,
    })))
}

fn require_text(body: &Map<String, Value>, field: &str) -> Result<(), ApiError> {
    match body.get(field).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("{field} can't be blank"),
        )),
    }
}

async fn create_property(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(&headers)?;
    let Value::Object(property) = body else {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "body must be a JSON object",
        ));
    };
    require_text(&property, "title")?;
    require_text(&property, "property_type")?;

    let created = db.write().await.insert(property);
    debug!(public_id = ?created.get("public_id"), "created property");
    Ok((StatusCode::CREATED, Json(Value::Object(created))))
}

async fn get_property(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;
    let store = db.read().await;
    store
        .find(&id)
        .map(|p| Json(Value::Object(p.clone())))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Not found"))
}

async fn update_property(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;
    let Value::Object(changes) = body else {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "body must be a JSON object",
        ));
    };

    let mut store = db.write().await;
    let property = store
        .find_mut(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Not found"))?;
    for (key, value) in changes {
        if key != "public_id" {
            property.insert(key, value);
        }
    }
    debug!(public_id = %id, "updated property");
    Ok(Json(Value::Object(property.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_sequential_public_ids() {
        let mut store = Store::new();
        let first = store.insert(sample_property("A", "2022-01-01T00:00:00Z"));
        let second = store.insert(sample_property("B", "2022-01-01T00:00:00Z"));
        assert_eq!(first["public_id"], "EB-00001");
        assert_eq!(second["public_id"], "EB-00002");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn insert_keeps_existing_public_id() {
        let mut store = Store::new();
        let mut property = sample_property("A", "2022-01-01T00:00:00Z");
        property.insert("public_id".to_string(), Value::from("EB-CUSTOM"));
        let created = store.insert(property);
        assert_eq!(created["public_id"], "EB-CUSTOM");
        assert!(store.find("EB-CUSTOM").is_some());
    }

    #[test]
    fn seeded_store_titles_are_numbered() {
        let store = Store::seeded(3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.properties[2]["title"], "Property 3");
        assert_eq!(updated_on(&store.properties[0]), "2022-01-15");
    }

    #[test]
    fn updated_on_handles_missing_timestamp() {
        let property = Map::new();
        assert_eq!(updated_on(&property), "");
    }

    #[test]
    fn positive_param_defaults_and_rejects_zero() {
        let mut params = HashMap::new();
        assert_eq!(positive_param(&params, "page", 1).unwrap(), 1);
        params.insert("page".to_string(), "0".to_string());
        assert!(positive_param(&params, "page", 1).is_err());
        params.insert("page".to_string(), "2.5".to_string());
        assert!(positive_param(&params, "page", 1).is_err());
    }
}
