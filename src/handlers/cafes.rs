//! Cafe CRUD handlers
//!
//! Each handler translates one route into at most one storage operation.
//! Success bodies use the `cafes` / `cafe` / `response` envelopes; failures
//! go through [`ApiError`].

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, State};
use axum::Json;
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::models::{Cafe, NewCafe};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CafeListResponse {
    cafes: Vec<Cafe>,
}

#[derive(Debug, Serialize)]
pub struct CafeResponse {
    cafe: Cafe,
}

fn no_cafes() -> ApiError {
    ApiError::NotFound("No cafes available.".to_string())
}

pub async fn all(State(state): State<AppState>) -> Result<Json<CafeListResponse>, ApiError> {
    let cafes = state.db.list_cafes().await?;

    if cafes.is_empty() {
        return Err(no_cafes());
    }

    Ok(Json(CafeListResponse { cafes }))
}

pub async fn random(State(state): State<AppState>) -> Result<Json<CafeResponse>, ApiError> {
    let cafes = state.db.list_cafes().await?;

    let cafe = cafes
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(no_cafes)?;

    Ok(Json(CafeResponse { cafe }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    loc: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CafeResponse>, ApiError> {
    let not_found =
        || ApiError::NotFound("Sorry, we don't have a cafe at that location.".to_string());

    let loc = params.loc.ok_or_else(not_found)?;
    let cafe = state
        .db
        .find_by_location(&loc)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(CafeResponse { cafe }))
}

#[derive(Debug, Deserialize)]
pub struct AddCafeForm {
    name: String,
    map_url: String,
    img_url: String,
    location: String,
    seats: String,
    #[serde(deserialize_with = "form_bool")]
    has_toilet: bool,
    #[serde(deserialize_with = "form_bool")]
    has_wifi: bool,
    #[serde(deserialize_with = "form_bool")]
    has_sockets: bool,
    #[serde(deserialize_with = "form_bool")]
    can_take_calls: bool,
    coffee_price: Option<String>,
}

/// Strict boolean tokens for the form fields. Anything other than
/// true/false/1/0 is rejected rather than coerced, so a submitted "false"
/// never reads as true.
fn form_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected true/false/1/0, got {other:?}"
        ))),
    }
}

pub async fn add(
    State(state): State<AppState>,
    form: Result<Form<AddCafeForm>, FormRejection>,
) -> Result<Json<Value>, ApiError> {
    let Form(form) = form.map_err(|rejection| ApiError::InvalidForm(rejection.body_text()))?;

    let new_cafe = NewCafe {
        name: form.name,
        map_url: form.map_url,
        img_url: form.img_url,
        location: form.location,
        seats: form.seats,
        has_toilet: form.has_toilet,
        has_wifi: form.has_wifi,
        has_sockets: form.has_sockets,
        can_take_calls: form.can_take_calls,
        coffee_price: form.coffee_price,
    };

    let id = state.db.insert_cafe(&new_cafe).await?;
    tracing::info!(id, "added cafe");

    Ok(Json(
        json!({ "response": { "Success": "Successfully added new cafe." } }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceParams {
    new_price: String,
}

pub async fn update_price(
    State(state): State<AppState>,
    Path(cafe_id): Path<i64>,
    Query(params): Query<UpdatePriceParams>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .db
        .update_coffee_price(cafe_id, &params.new_price)
        .await?;

    if !updated {
        return Err(ApiError::NotFound(
            "A cafe with that id was not found in the database.".to_string(),
        ));
    }

    Ok(Json(
        json!({ "response": { "success": "Successfully updated the price." } }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "api-key")]
    api_key: Option<String>,
}

pub async fn report_closed(
    State(state): State<AppState>,
    Path(cafe_id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ApiError> {
    let presented = params.api_key.unwrap_or_default();

    // The key check comes before any lookup, so a bad key never leaks
    // whether the id exists.
    if !keys_match(&presented, &state.config.api_key) {
        return Err(ApiError::Forbidden(
            "Sorry, that's not allowed. Make sure you have the correct api-key.".to_string(),
        ));
    }

    let deleted = state.db.delete_cafe(cafe_id).await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "A cafe with that id was not found in the database.".to_string(),
        ));
    }

    tracing::info!(cafe_id, "deleted cafe");

    Ok(Json(json!({
        "response": { "success": "Successfully deleted the cafe from the database." }
    })))
}

// Compared as digests so equality does not short-circuit on the first
// differing byte.
fn keys_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
