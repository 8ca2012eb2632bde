//! The upload wizard as a plain state machine.
//!
//! ```text
//! input ──submit──▶ analyzing ──ok──▶ skill-gap ──confirm──▶ tailoring ──ok──▶ done
//!   ▲                   │                 │  ▲                   │
//!   └──────err──────────┘                 │  └────────err────────┘
//!   ▲                                     │
//!   └────────────────back─────────────────┘
//! ```
//!
//! Backend calls run outside the machine. Starting a call hands out a [`Ticket`];
//! the completion must present the same ticket or it is rejected as stale.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::models::analysis::AnalysisResponse;
use crate::models::tailoring::{
    ConfirmedSkillsPayload, ProcessResponse, TailorRequest, TailorResponse,
};
use crate::workflow::skill_gap::ConfirmedSkills;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStep {
    Input,
    Analyzing,
    SkillGap,
    Tailoring,
    Done,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStep::Input => "input",
            FlowStep::Analyzing => "analyzing",
            FlowStep::SkillGap => "skill-gap",
            FlowStep::Tailoring => "tailoring",
            FlowStep::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("cannot {action} while in the {from} step")]
    InvalidTransition { from: FlowStep, action: &'static str },

    #[error("result belongs to an abandoned request")]
    Stale,

    #[error("'{0}' is not one of the missing skills")]
    UnknownSkill(String),
}

/// The text fields of the input form. File inputs cannot be refilled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub job_description: String,
    pub job_url: String,
    pub company_url: String,
}

/// Proof that a backend call was started by the wizard in its current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct Wizard {
    step: FlowStep,
    epoch: u64,
    step_started: Instant,
    analysis: Option<AnalysisResponse>,
    confirmed: ConfirmedSkills,
    error: Option<String>,
    draft: FormDraft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            step: FlowStep::Input,
            epoch: 0,
            step_started: Instant::now(),
            analysis: None,
            confirmed: ConfirmedSkills::default(),
            error: None,
            draft: FormDraft::default(),
        }
    }
}

impl Wizard {
    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// What the user typed into the last submitted form.
    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn analysis(&self) -> Option<&AnalysisResponse> {
        self.analysis.as_ref()
    }

    pub fn confirmed(&self) -> &ConfirmedSkills {
        &self.confirmed
    }

    /// Time spent in the current step; drives the cosmetic progress display.
    pub fn elapsed(&self) -> Duration {
        self.step_started.elapsed()
    }

    fn enter(&mut self, step: FlowStep) {
        self.step = step;
        self.step_started = Instant::now();
    }

    fn next_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    fn require(&self, step: FlowStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                from: self.step,
                action,
            })
        }
    }

    fn check_ticket(&self, ticket: Ticket) -> Result<(), WizardError> {
        if ticket.0 == self.epoch {
            Ok(())
        } else {
            Err(WizardError::Stale)
        }
    }

    /// Shows a validation error on the input form without leaving it.
    pub fn reject_input(&mut self, message: String) {
        if self.step == FlowStep::Input {
            self.error = Some(message);
        }
    }

    /// input → analyzing. The draft is kept until the analysis succeeds.
    pub fn begin_analysis(&mut self, draft: FormDraft) -> Result<Ticket, WizardError> {
        self.require(FlowStep::Input, "start an analysis")?;
        self.draft = draft;
        self.analysis = None;
        self.confirmed.clear();
        self.error = None;
        self.enter(FlowStep::Analyzing);
        Ok(self.next_ticket())
    }

    /// analyzing → skill-gap on success, analyzing → input with the message on failure.
    pub fn finish_analysis(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResponse, String>,
    ) -> Result<(), WizardError> {
        self.check_ticket(ticket)?;
        self.require(FlowStep::Analyzing, "finish an analysis")?;
        match outcome {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                self.draft = FormDraft::default();
                self.enter(FlowStep::SkillGap);
            }
            Err(message) => {
                self.error = Some(message);
                self.enter(FlowStep::Input);
            }
        }
        Ok(())
    }

    pub fn toggle_skill(&mut self, skill: &str) -> Result<bool, WizardError> {
        self.require(FlowStep::SkillGap, "toggle a skill")?;
        let known = self
            .analysis
            .as_ref()
            .is_some_and(|a| a.skill_gap.missing_skills.iter().any(|s| s == skill));
        if !known {
            return Err(WizardError::UnknownSkill(skill.to_string()));
        }
        Ok(self.confirmed.toggle(skill))
    }

    /// skill-gap → input. The form comes back blank.
    pub fn back_to_input(&mut self) -> Result<(), WizardError> {
        self.require(FlowStep::SkillGap, "go back")?;
        self.analysis = None;
        self.confirmed.clear();
        self.error = None;
        self.draft = FormDraft::default();
        self.epoch += 1;
        self.enter(FlowStep::Input);
        Ok(())
    }

    /// skill-gap → tailoring. Returns the request to send.
    pub fn begin_tailoring(&mut self) -> Result<(Ticket, TailorRequest), WizardError> {
        self.require(FlowStep::SkillGap, "start tailoring")?;
        let Some(analysis) = self.analysis.as_ref() else {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                action: "start tailoring without an analysis",
            });
        };
        let request = TailorRequest {
            master_cv: analysis.master_cv.clone(),
            job_analysis: analysis.job_analysis.clone(),
            company_intel: analysis.company_intel.clone(),
            confirmed_skills: ConfirmedSkillsPayload {
                confirmed_missing_skills: self.confirmed.as_slice().to_vec(),
            },
        };
        self.error = None;
        self.enter(FlowStep::Tailoring);
        Ok((self.next_ticket(), request))
    }

    /// tailoring → done with the merged result, or tailoring → skill-gap on failure.
    pub fn finish_tailoring(
        &mut self,
        ticket: Ticket,
        outcome: Result<TailorResponse, String>,
    ) -> Result<Option<ProcessResponse>, WizardError> {
        self.check_ticket(ticket)?;
        self.require(FlowStep::Tailoring, "finish tailoring")?;
        match outcome {
            Ok(tailored) => {
                let Some(analysis) = self.analysis.take() else {
                    return Err(WizardError::InvalidTransition {
                        from: self.step,
                        action: "finish tailoring without an analysis",
                    });
                };
                self.confirmed.clear();
                self.enter(FlowStep::Done);
                Ok(Some(ProcessResponse::merge(analysis, tailored)))
            }
            Err(message) => {
                self.error = Some(message);
                self.enter(FlowStep::SkillGap);
                Ok(None)
            }
        }
    }

    /// Starts over with a blank form. Any call still in flight becomes stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Wizard {
            epoch,
            ..Wizard::default()
        };
    }
}

#[cfg(test)]
pub(crate) fn sample_analysis(missing: &[&str]) -> AnalysisResponse {
    use crate::models::analysis::{CompanyIntel, JobAnalysis, SkillGapAnalysis, SkillMatch};

    AnalysisResponse {
        master_cv: serde_json::json!({"name": "Ada Lovelace"}),
        job_analysis: JobAnalysis {
            role_title: "Backend Engineer".to_string(),
            ..Default::default()
        },
        company_intel: CompanyIntel {
            company_name: "Stripe".to_string(),
            website: "stripe.com".to_string(),
            ..Default::default()
        },
        skill_gap: SkillGapAnalysis {
            matched_skills: vec![SkillMatch {
                skill: "Go".to_string(),
                found_in_cv: true,
                source: "experience".to_string(),
            }],
            missing_skills: missing.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
        cv_warnings: vec![],
    }
}

#[cfg(test)]
pub(crate) fn sample_tailored() -> TailorResponse {
    TailorResponse {
        resume_markdown: "# Ada Lovelace\n\n## Experience\n- Built payment rails".to_string(),
        cover_letter: "Dear Stripe team,\n\nI would love to join.".to_string(),
        cold_email: "Hi! Quick note about the Backend Engineer role.".to_string(),
        company_summary: "Stripe builds economic infrastructure for the internet.".to_string(),
        keywords_used: vec!["Go".to_string(), "Kubernetes".to_string()],
        matched_skills: vec!["Go".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_skill_gap(missing: &[&str]) -> Wizard {
        let mut wizard = Wizard::default();
        let ticket = wizard.begin_analysis(FormDraft::default()).unwrap();
        wizard
            .finish_analysis(ticket, Ok(sample_analysis(missing)))
            .unwrap();
        wizard
    }

    #[test]
    fn test_happy_path_reaches_done() {
        let mut wizard = at_skill_gap(&["Kubernetes", "GraphQL"]);
        assert_eq!(wizard.step(), FlowStep::SkillGap);

        assert!(wizard.toggle_skill("Kubernetes").unwrap());
        let (ticket, request) = wizard.begin_tailoring().unwrap();
        assert_eq!(wizard.step(), FlowStep::Tailoring);
        assert_eq!(
            request.confirmed_skills.confirmed_missing_skills,
            vec!["Kubernetes"]
        );

        let merged = wizard
            .finish_tailoring(ticket, Ok(sample_tailored()))
            .unwrap()
            .unwrap();
        assert_eq!(wizard.step(), FlowStep::Done);
        assert_eq!(merged.company_intel.company_name, "Stripe");
        assert!(merged.tailored_resume.resume_markdown.starts_with("# Ada"));
    }

    #[test]
    fn test_analysis_failure_returns_to_input_with_message() {
        let mut wizard = Wizard::default();
        let ticket = wizard.begin_analysis(FormDraft::default()).unwrap();
        wizard
            .finish_analysis(ticket, Err("quota exceeded".to_string()))
            .unwrap();
        assert_eq!(wizard.step(), FlowStep::Input);
        assert_eq!(wizard.error(), Some("quota exceeded"));

        // A new attempt clears the old message.
        wizard.begin_analysis(FormDraft::default()).unwrap();
        assert_eq!(wizard.error(), None);
    }

    #[test]
    fn test_analysis_failure_keeps_the_typed_form() {
        let draft = FormDraft {
            job_description: "Staff engineer, payments".to_string(),
            job_url: String::new(),
            company_url: "stripe.com".to_string(),
        };
        let mut wizard = Wizard::default();
        let ticket = wizard.begin_analysis(draft.clone()).unwrap();
        wizard
            .finish_analysis(ticket, Err("quota exceeded".to_string()))
            .unwrap();
        assert_eq!(wizard.draft(), &draft);

        let ticket = wizard.begin_analysis(draft).unwrap();
        wizard
            .finish_analysis(ticket, Ok(sample_analysis(&[])))
            .unwrap();
        assert_eq!(wizard.draft(), &FormDraft::default());
    }

    #[test]
    fn test_tailoring_failure_returns_to_skill_gap_keeping_choices() {
        let mut wizard = at_skill_gap(&["Kubernetes"]);
        wizard.toggle_skill("Kubernetes").unwrap();
        let (ticket, _) = wizard.begin_tailoring().unwrap();

        let merged = wizard
            .finish_tailoring(ticket, Err("Tailoring failed".to_string()))
            .unwrap();
        assert!(merged.is_none());
        assert_eq!(wizard.step(), FlowStep::SkillGap);
        assert_eq!(wizard.error(), Some("Tailoring failed"));
        assert!(wizard.confirmed().contains("Kubernetes"));
        assert!(wizard.analysis().is_some());
    }

    #[test]
    fn test_duplicate_submission_is_rejected() {
        let mut wizard = Wizard::default();
        wizard.begin_analysis(FormDraft::default()).unwrap();
        assert_eq!(
            wizard.begin_analysis(FormDraft::default()).unwrap_err(),
            WizardError::InvalidTransition {
                from: FlowStep::Analyzing,
                action: "start an analysis",
            }
        );
    }

    #[test]
    fn test_back_to_input_resets_to_blank_form() {
        let mut wizard = at_skill_gap(&["GraphQL"]);
        wizard.toggle_skill("GraphQL").unwrap();
        wizard.back_to_input().unwrap();

        assert_eq!(wizard.step(), FlowStep::Input);
        assert!(wizard.analysis().is_none());
        assert!(wizard.confirmed().is_empty());
        assert_eq!(wizard.draft(), &FormDraft::default());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut wizard = Wizard::default();
        let old = wizard.begin_analysis(FormDraft::default()).unwrap();
        wizard.reset();
        let fresh = wizard.begin_analysis(FormDraft::default()).unwrap();

        assert_eq!(
            wizard.finish_analysis(old, Ok(sample_analysis(&[]))),
            Err(WizardError::Stale)
        );
        assert_eq!(wizard.step(), FlowStep::Analyzing);

        wizard
            .finish_analysis(fresh, Ok(sample_analysis(&[])))
            .unwrap();
        assert_eq!(wizard.step(), FlowStep::SkillGap);
    }

    #[test]
    fn test_unknown_skill_cannot_be_toggled() {
        let mut wizard = at_skill_gap(&["Kubernetes"]);
        assert_eq!(
            wizard.toggle_skill("COBOL"),
            Err(WizardError::UnknownSkill("COBOL".to_string()))
        );
        assert!(wizard.confirmed().is_empty());
    }

    #[test]
    fn test_toggle_outside_skill_gap_is_invalid() {
        let mut wizard = Wizard::default();
        assert!(matches!(
            wizard.toggle_skill("Kubernetes"),
            Err(WizardError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reject_input_only_applies_on_the_form() {
        let mut wizard = Wizard::default();
        wizard.reject_input("Please upload a PDF file.".to_string());
        assert_eq!(wizard.error(), Some("Please upload a PDF file."));

        let mut busy = Wizard::default();
        busy.begin_analysis(FormDraft::default()).unwrap();
        busy.reject_input("ignored".to_string());
        assert_eq!(busy.error(), None);
    }
}
