//! Background drivers for the two backend calls.
//!
//! A route moves the wizard into its in-flight step, then spawns one of these.
//! The driver awaits the backend and applies the outcome to the session under
//! the ticket it was given; if the user has since moved on, the outcome is dropped.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::analytics::AnalyticsEvent;
use crate::billing::credits::fetch_credits;
use crate::models::tailoring::TailorRequest;
use crate::session::{ResultStore, Session, SessionId};
use crate::state::AppState;
use crate::workflow::skill_gap::{match_percentage, ConfirmedSkills};
use crate::workflow::upload::AnalyzeRequest;
use crate::workflow::wizard::{Ticket, WizardError};

/// Identity and credentials captured when the call was started.
#[derive(Debug, Clone)]
pub struct Caller {
    pub session: SessionId,
    pub token: Option<String>,
    pub distinct_id: String,
}

impl Caller {
    pub fn for_session(session: &Session, id: SessionId) -> Self {
        Self {
            session: id,
            token: session.access_token(),
            distinct_id: session.distinct_id(id),
        }
    }
}

pub async fn run_analysis(state: AppState, caller: Caller, ticket: Ticket, request: AnalyzeRequest) {
    let started = Instant::now();
    let outcome = state.api.analyze(&request, caller.token.as_deref()).await;

    let event = match &outcome {
        Ok(analysis) => AnalyticsEvent::AnalysisCompleted {
            match_score: match_percentage(&analysis.skill_gap, &ConfirmedSkills::default()),
            duration_ms: started.elapsed().as_millis(),
        },
        Err(e) => {
            warn!("Analysis failed ({}): {e}", e.kind());
            AnalyticsEvent::AnalysisError {
                error_type: e.kind().to_string(),
            }
        }
    };
    let outcome = outcome.map_err(|e| e.to_string());

    let applied = state
        .sessions
        .update(caller.session, |s| s.wizard.finish_analysis(ticket, outcome))
        .await;
    match applied {
        None => debug!("Session {} expired before analysis finished", caller.session.0),
        Some(Err(e)) => info!("Discarding analysis result: {e}"),
        Some(Ok(())) => state.analytics.capture(caller.distinct_id, event),
    }
}

pub async fn run_tailoring(state: AppState, caller: Caller, ticket: Ticket, request: TailorRequest) {
    let started = Instant::now();
    let outcome = state
        .api
        .tailor(&request, caller.token.as_deref())
        .await
        .map_err(|e| {
            warn!("Tailoring failed ({}): {e}", e.kind());
            e.to_string()
        });
    let succeeded = outcome.is_ok();
    let failure = outcome.as_ref().err().cloned();

    let applied = state
        .sessions
        .update(caller.session, |s| {
            let merged = s.wizard.finish_tailoring(ticket, outcome)?;
            s.results = match (merged, failure) {
                (Some(result), _) => ResultStore::Ready(Box::new(result)),
                (None, Some(message)) => ResultStore::Error(message),
                (None, None) => ResultStore::Error("Tailoring failed".to_string()),
            };
            Ok::<_, WizardError>(s.results.status())
        })
        .await;

    match applied {
        None => {
            debug!("Session {} expired before tailoring finished", caller.session.0);
            return;
        }
        Some(Err(e)) => {
            info!("Discarding tailoring result: {e}");
            return;
        }
        Some(Ok(status)) => debug!("Session {}: results {status:?}", caller.session.0),
    }

    if !succeeded {
        return;
    }
    state.analytics.capture(
        caller.distinct_id,
        AnalyticsEvent::TailoringCompleted {
            duration_ms: started.elapsed().as_millis(),
        },
    );

    // The generation spent a credit.
    if let Some(token) = caller.token {
        let credits = fetch_credits(state.api.as_ref(), &token).await;
        state
            .sessions
            .update(caller.session, |s| s.credits = Some(credits))
            .await;
    }
}
