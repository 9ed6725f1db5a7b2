//! User-story generation.
//!
//! Validates the feature description, renders the prompt and relays it to the
//! configured provider. Invalid input is rejected before the provider is
//! called; provider failures are logged with the feature text and returned
//! as 500. Nothing is retried.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::MAX_FEATURE_LENGTH;
use crate::error::AppError;
use crate::provider::GenerationParams;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub feature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    #[serde(rename = "userStory")]
    pub user_story: String,
}

/// Turn the extractor result into a usable feature description
fn validate(payload: Result<Json<StoryRequest>, JsonRejection>) -> Result<String, AppError> {
    let Json(request) = payload.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::MissingBody,
        other => AppError::InvalidBody(other.body_text()),
    })?;

    let feature = request.feature.unwrap_or_default();
    if feature.trim().is_empty() {
        return Err(AppError::MissingFeature);
    }
    if feature.chars().count() > MAX_FEATURE_LENGTH {
        return Err(AppError::FeatureTooLong {
            max: MAX_FEATURE_LENGTH,
        });
    }
    Ok(feature)
}

/// `POST /api/user-story`
#[instrument(name = "story::generate", skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Json<StoryResponse>, AppError> {
    tracing::info!("User story endpoint called");
    let feature = validate(payload)?;
    tracing::info!(feature = %feature, "Received user story request");

    let prompt = state.prompts.user_story(&feature)?;

    let user_story = state
        .provider
        .generate(&prompt, &GenerationParams::user_story())
        .await
        .map_err(|e| {
            tracing::error!(
                feature = %feature,
                provider = state.provider.name(),
                error = %e,
                "Error generating user story"
            );
            AppError::from(e)
        })?;

    tracing::info!(
        feature = %feature,
        story_len = user_story.len(),
        "Generated user story"
    );
    Ok(Json(StoryResponse { user_story }))
}
