//! Skill-gap confirmation: the toggle set and the numbers shown above it.

use serde::Serialize;

use crate::models::analysis::SkillGapAnalysis;

/// Missing skills the user has affirmed, in the order they were toggled on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmedSkills(Vec<String>);

impl ConfirmedSkills {
    /// Adds the skill if absent, removes it if present. Returns whether it is now confirmed.
    pub fn toggle(&mut self, skill: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|s| s == skill) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(skill.to_string());
            true
        }
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.iter().any(|s| s == skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// `round(100 * (matched + confirmed) / (matched + missing))`, 0 when nothing is required.
pub fn match_percentage(gap: &SkillGapAnalysis, confirmed: &ConfirmedSkills) -> u32 {
    let total = total_required(gap);
    if total == 0 {
        return 0;
    }
    let matched = matched_count(gap, confirmed);
    ((matched as f64 / total as f64) * 100.0).round() as u32
}

pub fn total_required(gap: &SkillGapAnalysis) -> usize {
    gap.matched_skills.len() + gap.missing_skills.len()
}

pub fn matched_count(gap: &SkillGapAnalysis, confirmed: &ConfirmedSkills) -> usize {
    gap.matched_skills.len() + confirmed.len()
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingSkillToggle {
    pub skill: String,
    pub confirmed: bool,
}

/// Everything the confirmation page renders.
#[derive(Debug, Clone, Serialize)]
pub struct SkillGapView {
    pub match_percentage: u32,
    pub matched_count: usize,
    pub total_required: usize,
    pub matched: Vec<String>,
    pub missing: Vec<MissingSkillToggle>,
    pub preferred_matched: Vec<String>,
}

impl SkillGapView {
    pub fn build(gap: &SkillGapAnalysis, confirmed: &ConfirmedSkills) -> Self {
        Self {
            match_percentage: match_percentage(gap, confirmed),
            matched_count: matched_count(gap, confirmed),
            total_required: total_required(gap),
            matched: gap.matched_skills.iter().map(|m| m.skill.clone()).collect(),
            missing: gap
                .missing_skills
                .iter()
                .map(|skill| MissingSkillToggle {
                    skill: skill.clone(),
                    confirmed: confirmed.contains(skill),
                })
                .collect(),
            preferred_matched: gap.preferred_skills_matched.clone(),
        }
    }
}
