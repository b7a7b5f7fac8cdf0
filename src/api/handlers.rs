use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analytics::{BrandHealthSummary, RankingEntry, BRAKE_INDICATOR};
use crate::auth::guard::{canonicalize, ensure_same_brand};
use crate::auth::token::AuthClaims;
use crate::dataset::{DatasetAccess, Row};
use crate::errors::AppError;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub brand: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub brand: String,
}

#[derive(Serialize)]
pub struct RankingResponse {
    pub total_brands: usize,
    pub ranking: Vec<RankingEntry>,
}

// ── Auth ─────────────────────────────────────────────────────

/// POST /auth/login — verify credentials and issue a bearer token.
///
/// The brand claimed in the request must equal the brand stored for the
/// identity; a mismatch fails exactly like bad credentials (401, same body).
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.creds.verify(&payload.email, &payload.password).await?;

    if canonicalize(&payload.brand) != user.brand {
        return Err(AppError::LoginBrandMismatch);
    }

    let token = state
        .tokens
        .issue(&user.email, &user.brand)
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(email = %user.email, brand = %user.brand, "login succeeded");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".into(),
        brand: user.brand,
    }))
}

// ── Brand summary & ranking ──────────────────────────────────

/// GET /:brand/summary — fleet health summary for the caller's own brand.
pub async fn brand_summary(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<BrandHealthSummary>, AppError> {
    ensure_same_brand(&claims.brand, &brand)?;
    let summary = state
        .engine
        .summarize(&brand, state.config.summary_precision)
        .await?;
    Ok(Json(summary))
}

/// GET /ranking — cross-brand ranking, visible to any authenticated identity.
pub async fn brand_ranking(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<AuthClaims>,
) -> Result<Json<RankingResponse>, AppError> {
    let ranking = state.engine.rank(state.config.ranking_precision).await?;
    Ok(Json(RankingResponse {
        total_brands: ranking.len(),
        ranking,
    }))
}

// ── Subsystem datasets (raw passthrough) ─────────────────────

async fn guarded_rows(
    state: &AppState,
    claims: &AuthClaims,
    brand: &str,
    dataset: &str,
) -> Result<Vec<Row>, AppError> {
    ensure_same_brand(&claims.brand, brand)?;
    state.datasets.rows(brand, dataset).await
}

macro_rules! dataset_handler {
    ($name:ident, $dataset:literal) => {
        pub async fn $name(
            State(state): State<Arc<AppState>>,
            Path(brand): Path<String>,
            Extension(claims): Extension<AuthClaims>,
        ) -> Result<Json<Vec<Row>>, AppError> {
            Ok(Json(guarded_rows(&state, &claims, &brand, $dataset).await?))
        }
    };
}

dataset_handler!(engine_temp_performance, "engine_temp_perf");
dataset_handler!(engine_distribution, "engine_perf_distribution");
dataset_handler!(engine_risk, "engine_risk_summary");
dataset_handler!(battery_temp_performance, "battery_temp_perf");
dataset_handler!(battery_distribution, "battery_health_distribution");
dataset_handler!(battery_risk, "battery_risk_summary");

// ── Brakes (shaped responses) ────────────────────────────────

/// GET /:brand/brakes/temp-performance — `{temperature, wear}` pairs.
pub async fn brake_temp_performance(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<Value>>, AppError> {
    let rows = guarded_rows(&state, &claims, &brand, "brake_temp_perf").await?;

    let corrupt = |reason: &str| AppError::DatasetCorrupt {
        dataset: "brake_temp_perf".into(),
        reason: reason.into(),
    };

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let temperature = row
            .get("temp_band")
            .cloned()
            .ok_or_else(|| corrupt("missing column 'temp_band'"))?;
        let wear = row
            .get("avg_brake_temp_c")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| corrupt("missing or non-numeric column 'avg_brake_temp_c'"))?;
        out.push(json!({
            "temperature": temperature,
            "wear": (wear * 100.0).round() / 100.0,
        }));
    }
    Ok(Json(out))
}

/// GET /:brand/brakes/wear-distribution — `{label, value}` pairs from the
/// first two columns, whatever they are named.
pub async fn brake_wear_distribution(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<Value>>, AppError> {
    let rows = guarded_rows(&state, &claims, &brand, "brake_wear_distribution").await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = row.values();
        let (Some(label), Some(value)) = (values.next(), values.next()) else {
            continue;
        };
        // A non-integer count is bad data, not a zero bucket.
        let value = value.as_i64().ok_or_else(|| AppError::DatasetCorrupt {
            dataset: "brake_wear_distribution".into(),
            reason: format!("non-integer distribution value: {}", value),
        })?;
        out.push(json!({
            "label": label,
            "value": value,
        }));
    }
    Ok(Json(out))
}

/// GET /:brand/brakes/risk — risk verdict from the first summary row.
pub async fn brake_risk(
    State(state): State<Arc<AppState>>,
    Path(brand): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Value>, AppError> {
    let rows = guarded_rows(&state, &claims, &brand, "brake_risk_summary").await?;

    let corrupt = |reason: &str| AppError::DatasetCorrupt {
        dataset: "brake_risk_summary".into(),
        reason: reason.into(),
    };

    let row = rows.first().ok_or_else(|| corrupt("no rows"))?;
    let flagged = row
        .get(BRAKE_INDICATOR)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| corrupt("missing or non-numeric risk flag"))?;
    let fraction = row
        .get("fraction")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| corrupt("missing or non-numeric column 'fraction'"))?;

    Ok(Json(json!({
        "risk": if flagged == 1 { "High Risk" } else { "Low Risk" },
        "confidence": (fraction * 100.0).round(),
    })))
}
