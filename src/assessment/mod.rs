//! Generative impact analysis: structured request -> prompt -> chat call ->
//! best-effort decoding of the free-text answer.

pub mod decoder;
pub mod prompt;

use crate::llm::{ChatMessage, OpenAIClient};
use crate::matrix::{Activity, Category, EnvironmentalComponent, Phase};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Whether the caller already scored the impact. A `Scored` request asks the
/// model to justify the given values; an `Unscored` one asks it to propose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactAssessment {
    Scored { magnitude: i32, importance: i32 },
    Unscored,
}

#[derive(Debug, Clone)]
pub struct ImpactAnalysisRequest {
    pub activity_name: String,
    pub activity_description: Option<String>,
    pub component_name: String,
    pub component_category: Category,
    pub component_description: Option<String>,
    pub assessment: ImpactAssessment,
}

impl ImpactAnalysisRequest {
    pub fn for_pair(
        activity: &Activity,
        component: &EnvironmentalComponent,
        assessment: ImpactAssessment,
    ) -> Self {
        Self {
            activity_name: activity.name.clone(),
            activity_description: activity.description.clone(),
            component_name: component.name.clone(),
            component_category: component.category,
            component_description: component.description.clone(),
            assessment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    pub analysis: String,
    pub magnitude: i32,
    pub importance: i32,
    pub mitigation_measures: Vec<String>,
    pub justification: String,
}

#[derive(Debug, Clone)]
pub struct ProjectAnalysisRequest {
    pub project_name: String,
    pub project_description: Option<String>,
    pub activities: Vec<Activity>,
    pub components: Vec<EnvironmentalComponent>,
}

/// One interaction proposed by the model. Ids are kept as the raw text the
/// model wrote; resolving them against the project is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedImpact {
    pub activity_id: String,
    pub component_id: String,
    pub magnitude: i32,
    pub importance: i32,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysis {
    pub suggested_impacts: Vec<SuggestedImpact>,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct PgesImpact {
    pub activity_name: String,
    pub activity_phase: Phase,
    pub component_name: String,
    pub component_category: Category,
    pub magnitude: i32,
    pub importance: i32,
    pub analysis: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PgesRequest {
    pub project_name: String,
    pub project_description: Option<String>,
    pub impacts: Vec<PgesImpact>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Élevée")]
    High,
    #[serde(rename = "Moyenne")]
    Medium,
    #[serde(rename = "Faible")]
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "Élevée",
            Priority::Medium => "Moyenne",
            Priority::Low => "Faible",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "élevée" | "elevée" | "élevee" | "elevee" | "high" => Ok(Priority::High),
            "moyenne" | "medium" => Ok(Priority::Medium),
            "faible" | "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedImpact {
    pub activity_name: String,
    pub component_name: String,
    pub magnitude: i32,
    pub importance: i32,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub measures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringItem {
    pub indicator: String,
    pub frequency: String,
    pub responsible_party: String,
}

/// Environmental and social management plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pges {
    pub summary: String,
    pub prioritized_impacts: Vec<PrioritizedImpact>,
    pub recommendations: Vec<Recommendation>,
    pub monitoring_plan: Vec<MonitoringItem>,
}

/// Runs the three analysis contracts against a chat-completions endpoint.
/// Each call is independent; nothing is shared between them but the client.
pub struct ImpactAnalyst {
    client: OpenAIClient,
    model: String,
}

impl ImpactAnalyst {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn analyze_impact(&self, req: &ImpactAnalysisRequest) -> Result<ImpactAnalysis> {
        info!(
            activity=%req.activity_name,
            component=%req.component_name,
            scored = matches!(req.assessment, ImpactAssessment::Scored { .. }),
            "requesting impact analysis"
        );
        let content = self
            .ask(prompt::IMPACT_SYSTEM_PROMPT, prompt::impact_prompt(req))
            .await
            .context("impact analysis failed")?;
        Ok(decoder::decode_impact_analysis(&content, req.assessment))
    }

    pub async fn analyze_project(&self, req: &ProjectAnalysisRequest) -> Result<ProjectAnalysis> {
        info!(
            project=%req.project_name,
            activities = req.activities.len(),
            components = req.components.len(),
            "requesting project analysis"
        );
        let content = self
            .ask(prompt::PROJECT_SYSTEM_PROMPT, prompt::project_prompt(req))
            .await
            .context("project analysis failed")?;
        Ok(decoder::decode_project_analysis(&content))
    }

    pub async fn generate_pges(&self, req: &PgesRequest) -> Result<Pges> {
        info!(project=%req.project_name, impacts = req.impacts.len(), "requesting PGES");
        let content = self
            .ask(prompt::PGES_SYSTEM_PROMPT, prompt::pges_prompt(req))
            .await
            .context("PGES generation failed")?;
        Ok(decoder::decode_pges(&content))
    }

    async fn ask(&self, system: &str, user: String) -> Result<String> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        self.client.chat_once(&self.model, messages).await
    }
}
