use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use serde::Deserialize;

use crate::analytics::AnalyticsEvent;
use crate::errors::AppError;
use crate::results::{ExportAction, ResultTab, ResultsView};
use crate::session::{ResultStore, SessionId};
use crate::state::AppState;
use crate::views::{render, Layout, PrintPage, ResultsLoadingPage, ResultsPage};

#[derive(Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

enum Screen {
    Ready(ResultsPage, String),
    Loading(ResultsLoadingPage),
    Missing,
}

fn parse_tab(slug: &str) -> Result<ResultTab, AppError> {
    ResultTab::parse(slug).ok_or_else(|| AppError::NotFound(format!("Unknown tab '{slug}'")))
}

/// The active tab's text and the company name, when results are ready.
async fn ready_text(
    state: &AppState,
    id: SessionId,
    tab: ResultTab,
) -> Result<(String, String, String), AppError> {
    state
        .sessions
        .read(id, |s| {
            s.results.result().map(|r| {
                (
                    tab.active_text(r).to_string(),
                    r.company_intel.company_name.clone(),
                    s.distinct_id(id),
                )
            })
        })
        .await
        .flatten()
        .ok_or_else(|| AppError::NotFound("No results yet".to_string()))
}

/// GET /results
pub async fn handle_results(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Query(query): Query<TabQuery>,
) -> Result<Response, AppError> {
    let tab = query
        .tab
        .as_deref()
        .and_then(ResultTab::parse)
        .unwrap_or_default();
    let auth_enabled = state.auth.enabled();

    let screen = state
        .sessions
        .with(id, |s| {
            let layout = Layout::for_session(s, "Results", auth_enabled);
            match &s.results {
                ResultStore::Ready(result) => Screen::Ready(
                    ResultsPage {
                        layout,
                        view: ResultsView::build(result, tab),
                    },
                    s.distinct_id(id),
                ),
                ResultStore::Loading => Screen::Loading(ResultsLoadingPage {
                    layout: layout.refreshing(),
                }),
                ResultStore::Empty | ResultStore::Error(_) => Screen::Missing,
            }
        })
        .await;

    Ok(match screen {
        Screen::Ready(page, distinct_id) => {
            if let Some(event) = tab.view_event() {
                state.analytics.capture(distinct_id, event);
            }
            render(&page)?.into_response()
        }
        Screen::Loading(page) => render(&page)?.into_response(),
        Screen::Missing => Redirect::to("/upload").into_response(),
    })
}

/// GET /results/raw/:tab
/// Source for the copy button.
pub async fn handle_raw(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let tab = parse_tab(&slug)?;
    let (text, _, _) = ready_text(&state, id, tab).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}

/// GET /results/download/:tab
pub async fn handle_download(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let tab = parse_tab(&slug)?;
    let (text, _, distinct_id) = ready_text(&state, id, tab).await?;
    state.analytics.capture(
        distinct_id,
        AnalyticsEvent::ResumeDownloaded { format: "markdown" },
    );

    let disposition = format!("attachment; filename=\"{}\"", tab.download_filename());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    )
        .into_response())
}

/// GET /results/print/:tab
pub async fn handle_print(
    State(state): State<AppState>,
    Extension(id): Extension<SessionId>,
    Path(slug): Path<String>,
) -> Result<Html<String>, AppError> {
    let tab = parse_tab(&slug)?;
    let kind = tab
        .print_kind()
        .ok_or_else(|| AppError::NotFound(format!("'{}' cannot be printed", tab.label())))?;
    let (text, company, distinct_id) = ready_text(&state, id, tab).await?;
    state
        .analytics
        .capture(distinct_id, AnalyticsEvent::ResumeDownloaded { format: "pdf" });

    render(&PrintPage {
        title: format!("{} - {}", kind.title_prefix(), company),
        body: state.printer.render_body(kind, &text),
        is_resume: tab == ResultTab::Resume,
    })
}

/// GET /results/export/:tab
/// The "Download" button: printable documents open the print view, the rest download.
pub async fn handle_export(Path(slug): Path<String>) -> Result<Redirect, AppError> {
    let tab = parse_tab(&slug)?;
    Ok(match tab.export_action() {
        ExportAction::Print(_) => Redirect::to(&format!("/results/print/{}", tab.slug())),
        ExportAction::Download => Redirect::to(&format!("/results/download/{}", tab.slug())),
    })
}
