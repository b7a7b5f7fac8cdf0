//! Keyword-matching assistant over aggregated fleet data.
//!
//! A stateless collaborator: it holds no data of its own and composes every
//! answer from AggregationEngine output. Brand isolation applies — an
//! operator can only ask about the brand in their token.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::analytics::BrandHealthSummary;
use crate::auth::guard::{canonicalize, ensure_same_brand};
use crate::auth::token::AuthClaims;
use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct AssistantQuery {
    pub question: String,
    pub brand: String,
}

#[derive(Serialize)]
pub struct AssistantAnswer {
    pub answer: String,
}

/// POST /assistant/query
pub async fn query(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthClaims>,
    Json(payload): Json<AssistantQuery>,
) -> Result<Json<AssistantAnswer>, AppError> {
    ensure_same_brand(&claims.brand, &payload.brand)?;

    let brand = canonicalize(&payload.brand);
    let question = payload.question.to_lowercase();

    let answer = if question.contains("rank") {
        let ranking = state.engine.rank(state.config.ranking_precision).await?;
        let total = ranking.len();
        match ranking.into_iter().find(|e| e.brand == brand) {
            Some(entry) => format!(
                "{} ranks #{} of {} brands with a fleet health score of {}.",
                entry.brand, entry.rank, total, entry.summary.fleet_health_score
            ),
            None => format!("{} has no master dataset and is not ranked.", brand),
        }
    } else {
        let summary = state
            .engine
            .summarize(&brand, state.config.summary_precision)
            .await?;
        answer_from_summary(&question, &brand, &summary)
    };

    Ok(Json(AssistantAnswer { answer }))
}

fn answer_from_summary(question: &str, brand: &str, s: &BrandHealthSummary) -> String {
    if question.contains("engine") {
        format!(
            "Engine health for {} is {}% across {} vehicles.",
            brand, s.engine_health, s.total_vehicles
        )
    } else if question.contains("battery") {
        format!(
            "Battery health for {} is {}% across {} vehicles.",
            brand, s.battery_health, s.total_vehicles
        )
    } else if question.contains("brake") {
        format!(
            "Brake health for {} is {}% across {} vehicles.",
            brand, s.brake_health, s.total_vehicles
        )
    } else if question.contains("fleet")
        || question.contains("summary")
        || question.contains("overall")
    {
        format!(
            "Fleet health score for {} is {} (engine {}%, battery {}%, brakes {}%) over {} vehicles.",
            brand,
            s.fleet_health_score,
            s.engine_health,
            s.battery_health,
            s.brake_health,
            s.total_vehicles
        )
    } else {
        "I can answer questions about engine, battery, brakes, ranking or the fleet summary."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> BrandHealthSummary {
        BrandHealthSummary {
            fleet_health_score: 88.9,
            engine_health: 66.7,
            battery_health: 100.0,
            brake_health: 100.0,
            total_vehicles: 3,
        }
    }

    #[test]
    fn engine_questions_quote_engine_health() {
        let answer = answer_from_summary("how is my engine doing?", "audi", &summary());
        assert!(answer.contains("66.7"));
        assert!(answer.contains("audi"));
    }

    #[test]
    fn fleet_questions_quote_the_composite_score() {
        let answer = answer_from_summary("overall fleet status", "audi", &summary());
        assert!(answer.contains("88.9"));
    }

    #[test]
    fn unknown_questions_get_a_hint() {
        let answer = answer_from_summary("what is the weather?", "audi", &summary());
        assert!(answer.contains("engine, battery, brakes"));
    }
}
