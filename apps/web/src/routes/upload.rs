use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::analytics::AnalyticsEvent;
use crate::errors::AppError;
use crate::session::{ResultStore, Session, SessionId};
use crate::state::AppState;
use crate::views::{render, Layout, ProgressPage, SkillGapPage, UploadPage};
use crate::workflow::driver::{run_analysis, run_tailoring, Caller};
use crate::workflow::progress::{ANALYSIS_PLAN, TAILORING_PLAN};
use crate::workflow::skill_gap::SkillGapView;
use crate::workflow::upload::{AnalyzeInput, CvUpload, UploadError};
use crate::workflow::wizard::{FlowStep, FormDraft, WizardError};

const UNREADABLE_UPLOAD: &str = "The upload could not be read. Please try again.";

enum Screen {
    Form(UploadPage),
    Progress(ProgressPage),
    SkillGap(SkillGapPage),
    Done,
}

fn form_page(layout: Layout, error: Option<String>, draft: FormDraft) -> UploadPage {
    UploadPage {
        layout,
        error,
        job_description: draft.job_description,
        job_url: draft.job_url,
        company_url: draft.company_url,
    }
}

fn skill_gap_page(session: &Session, layout: Layout) -> Option<SkillGapPage> {
    let analysis = session.wizard.analysis()?;
    let confirmed = session.wizard.confirmed();
    Some(SkillGapPage {
        layout,
        role_title: analysis.job_analysis.role_title.clone(),
        company_name: analysis.company_intel.company_name.clone(),
        gap: SkillGapView::build(&analysis.skill_gap, confirmed),
        confirmed_count: confirmed.len(),
        error: session.wizard.error().map(str::to_string),
        warnings: analysis.cv_warnings.clone(),
    })
}

/// GET /upload
/// Renders whatever phase the wizard is in.
pub async fn handle_upload_page(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Result<Response, AppError> {
    let auth_enabled = state.auth.enabled();
    let screen = state
        .sessions
        .with(id, |s| {
            let layout = Layout::for_session(s, "New application", auth_enabled);
            match s.wizard.step() {
                FlowStep::Input => Screen::Form(form_page(
                    layout,
                    s.wizard.error().map(str::to_string),
                    s.wizard.draft().clone(),
                )),
                FlowStep::Analyzing => {
                    Screen::Progress(ProgressPage::new(layout, &ANALYSIS_PLAN, s.wizard.elapsed()))
                }
                FlowStep::SkillGap => match skill_gap_page(s, layout) {
                    Some(page) => Screen::SkillGap(page),
                    None => {
                        s.wizard.reset();
                        let layout = Layout::for_session(s, "New application", auth_enabled);
                        Screen::Form(form_page(layout, None, FormDraft::default()))
                    }
                },
                FlowStep::Tailoring => {
                    Screen::Progress(ProgressPage::new(layout, &TAILORING_PLAN, s.wizard.elapsed()))
                }
                FlowStep::Done => {
                    s.wizard.reset();
                    Screen::Done
                }
            }
        })
        .await;

    Ok(match screen {
        Screen::Form(page) => render(&page)?.into_response(),
        Screen::Progress(page) => render(&page)?.into_response(),
        Screen::SkillGap(page) => render(&page)?.into_response(),
        Screen::Done => Redirect::to("/results").into_response(),
    })
}

async fn read_form(multipart: &mut Multipart) -> Result<AnalyzeInput, MultipartError> {
    let mut input = AnalyzeInput::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv_pdf" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // An empty file input still sends a part with no name and no data.
                if !file_name.is_empty() || !bytes.is_empty() {
                    input.cv = Some(CvUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            "job_description" => input.job_description = field.text().await?,
            "job_url" => input.job_url = field.text().await?,
            "company_url" => input.company_url = field.text().await?,
            _ => debug!("Ignoring unexpected upload field '{name}'"),
        }
    }
    Ok(input)
}

/// Re-renders the input form with the message and the text the user typed.
async fn reject(
    state: &AppState,
    id: SessionId,
    message: String,
    typed: FormDraft,
) -> Result<Response, AppError> {
    let auth_enabled = state.auth.enabled();
    let page = state
        .sessions
        .with(id, |s| {
            if s.wizard.step() != FlowStep::Input {
                return None;
            }
            s.wizard.reject_input(message);
            Some(form_page(
                Layout::for_session(s, "New application", auth_enabled),
                s.wizard.error().map(str::to_string),
                typed,
            ))
        })
        .await;

    match page {
        Some(page) => Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)?).into_response()),
        None => Ok(Redirect::to("/upload").into_response()),
    }
}

/// POST /upload
pub async fn handle_upload_submit(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let input = match read_form(&mut multipart).await {
        Ok(input) => input,
        Err(e) => {
            debug!("Unreadable upload: {e}");
            let message = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                UploadError::TooLarge.to_string()
            } else {
                UNREADABLE_UPLOAD.to_string()
            };
            return reject(&state, id, message, FormDraft::default()).await;
        }
    };

    let draft = input.draft();
    let request = match input.validate() {
        Ok(request) => request,
        Err(e) => return reject(&state, id, e.to_string(), draft).await,
    };

    let started = state
        .sessions
        .with(id, |s| {
            let ticket = s.wizard.begin_analysis(draft)?;
            Ok::<_, WizardError>((ticket, Caller::for_session(s, id)))
        })
        .await;

    match started {
        Ok((ticket, caller)) => {
            info!("Session {}: analysis started", id.0);
            let cv = request.cv();
            state.analytics.capture(
                caller.distinct_id.clone(),
                AnalyticsEvent::ResumeUploaded {
                    file_type: cv
                        .content_type
                        .clone()
                        .unwrap_or_else(|| "application/pdf".to_string()),
                    file_size_bytes: cv.bytes.len(),
                },
            );
            state.analytics.capture(
                caller.distinct_id.clone(),
                AnalyticsEvent::AnalysisStarted {
                    has_job_url: request.job().is_url(),
                    has_company_url: !request.company_url().is_empty(),
                },
            );
            tokio::spawn(run_analysis(state.clone(), caller, ticket, request));
        }
        Err(e) => debug!("Ignoring upload: {e}"),
    }
    Ok(Redirect::to("/upload").into_response())
}

#[derive(Deserialize)]
pub struct ToggleForm {
    pub skill: String,
}

/// POST /upload/skills/toggle
pub async fn handle_toggle_skill(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Form(form): Form<ToggleForm>,
) -> Redirect {
    let toggled = state
        .sessions
        .with(id, |s| s.wizard.toggle_skill(&form.skill))
        .await;
    if let Err(e) = toggled {
        debug!("Ignoring toggle: {e}");
    }
    Redirect::to("/upload")
}

/// POST /upload/confirm
pub async fn handle_confirm(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Redirect {
    let started = state
        .sessions
        .with(id, |s| {
            let (ticket, request) = s.wizard.begin_tailoring()?;
            s.results = ResultStore::Loading;
            Ok::<_, WizardError>((ticket, request, Caller::for_session(s, id)))
        })
        .await;

    match started {
        Ok((ticket, request, caller)) => {
            info!(
                "Session {}: tailoring started with {} confirmed skills",
                id.0,
                request.confirmed_skills.confirmed_missing_skills.len()
            );
            state
                .analytics
                .capture(caller.distinct_id.clone(), AnalyticsEvent::TailoringStarted);
            tokio::spawn(run_tailoring(state.clone(), caller, ticket, request));
        }
        Err(e) => debug!("Ignoring confirm: {e}"),
    }
    Redirect::to("/upload")
}

/// POST /upload/back
pub async fn handle_back(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
) -> Redirect {
    let moved = state.sessions.with(id, |s| s.wizard.back_to_input()).await;
    if let Err(e) = moved {
        debug!("Ignoring back: {e}");
    }
    Redirect::to("/upload")
}
