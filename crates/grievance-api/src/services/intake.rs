//! Grievance creation: normalize, optionally auto-categorize, assign an id,
//! store, then queue the confirmation message.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use grievance_core::{Grievance, GrievanceSubmission, Result};

use crate::services::notifier;
use crate::AppState;

pub async fn submit(state: &AppState, submission: GrievanceSubmission) -> Result<Grievance> {
    let normalized = submission.normalize()?;
    if normalized.client_id_supplied {
        warn!(
            subsystem = "api",
            component = "intake",
            "Ignoring client-supplied grievance id"
        );
    }

    let auto_categorize = normalized.wants_auto_category();
    let mut new = normalized.grievance;
    if auto_categorize {
        if let Some(details) = new.details.as_deref() {
            new.category_type = suggest_category(state, details).await;
        }
    }

    let id = state.ids.new_id();
    let grievance = state
        .store
        .create(Grievance::create(id, new, Utc::now()))
        .await?;

    info!(
        subsystem = "api",
        component = "intake",
        op = "create",
        grievance_id = %grievance.id,
        is_anonymous = grievance.is_anonymous,
        has_category = grievance.category_type.is_some(),
        attachments = grievance.attachments.as_ref().map_or(0, Vec::len),
        "Grievance created"
    );

    if let Some(message) = notifier::confirmation_message(&grievance) {
        notifier::dispatch(state.notifier.clone(), message, grievance.id.clone());
    }

    Ok(grievance)
}

/// Ask the advisor for a category display string.
///
/// Returns `None` when no advisor is configured, the call fails, or it runs
/// past the configured timeout. Never an error.
pub async fn suggest_category(state: &AppState, details: &str) -> Option<String> {
    let advisor = state.advisor.as_ref()?;
    let start = Instant::now();
    let timeout = Duration::from_secs(state.config.categorizer_timeout_secs);

    match tokio::time::timeout(timeout, advisor.categorize(details)).await {
        Ok(Ok(categorization)) => {
            debug!(
                subsystem = "api",
                component = "intake",
                category = %categorization.display,
                confidence = ?categorization.confidence,
                duration_ms = start.elapsed().as_millis() as u64,
                "Auto-categorized submission"
            );
            Some(categorization.display)
        }
        Ok(Err(e)) => {
            warn!(
                subsystem = "api",
                component = "intake",
                error = %e,
                duration_ms = start.elapsed().as_millis() as u64,
                "Auto-categorization failed, storing without category"
            );
            None
        }
        Err(_) => {
            warn!(
                subsystem = "api",
                component = "intake",
                timeout_secs = timeout.as_secs(),
                "Auto-categorization timed out, storing without category"
            );
            None
        }
    }
}
