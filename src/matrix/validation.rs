//! Shape and range checks applied to request payloads before anything
//! reaches storage. Every failing field is reported, not just the first one.

use super::{Category, NewActivity, NewComponent, NewImpact, NewProject, Phase};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const NAME_MIN_CHARS: usize = 3;
pub const MAGNITUDE_MIN: i64 = -10;
pub const MAGNITUDE_MAX: i64 = 10;
pub const IMPORTANCE_MIN: i64 = 1;
pub const IMPORTANCE_MAX: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactPayload {
    pub magnitude: Option<i64>,
    pub importance: Option<i64>,
    pub description: Option<String>,
    pub mitigation_measures: Option<String>,
    pub activity_id: Option<String>,
    pub environmental_component_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysisPayload {
    pub impact_id: Option<String>,
}

/// Cell reference used to ask for an unscored assessment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPayload {
    pub activity_id: Option<String>,
    pub environmental_component_id: Option<String>,
}

impl ProjectPayload {
    pub fn validate(self) -> Result<NewProject, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", self.name);
        let description = normalize_text(self.description);
        errors.into_result(|| NewProject {
            name: name.unwrap_or_default(),
            description,
        })
    }
}

impl ActivityPayload {
    pub fn validate(self) -> Result<NewActivity, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", self.name);
        let phase = match self.phase.as_deref().map(str::parse::<Phase>) {
            Some(Ok(p)) => Some(p),
            Some(Err(_)) | None => {
                errors.push(
                    "phase",
                    "phase must be one of: preparation, construction, exploitation, maintenance",
                );
                None
            }
        };
        let description = normalize_text(self.description);
        match (name, phase) {
            (Some(name), Some(phase)) if errors.is_empty() => Ok(NewActivity {
                name,
                description,
                phase,
            }),
            _ => Err(errors),
        }
    }
}

impl ComponentPayload {
    pub fn validate(self) -> Result<NewComponent, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", self.name);
        let category = match self.category.as_deref().map(str::parse::<Category>) {
            Some(Ok(c)) => Some(c),
            Some(Err(_)) | None => {
                errors.push(
                    "category",
                    "category must be one of: physique, biologique, social, economique, culturel",
                );
                None
            }
        };
        let description = normalize_text(self.description);
        match (name, category) {
            (Some(name), Some(category)) if errors.is_empty() => Ok(NewComponent {
                name,
                description,
                category,
            }),
            _ => Err(errors),
        }
    }
}

impl ImpactPayload {
    pub fn validate(self) -> Result<NewImpact, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let scores = check_scores(&mut errors, self.magnitude, self.importance);
        let activity_id = check_uuid(&mut errors, "activityId", self.activity_id.as_deref());
        let component_id = check_uuid(
            &mut errors,
            "environmentalComponentId",
            self.environmental_component_id.as_deref(),
        );
        match (scores, activity_id, component_id) {
            (Some((magnitude, importance)), Some(activity_id), Some(environmental_component_id))
                if errors.is_empty() =>
            {
                Ok(NewImpact {
                    activity_id,
                    environmental_component_id,
                    magnitude,
                    importance,
                    description: normalize_text(self.description),
                    mitigation_measures: normalize_text(self.mitigation_measures),
                })
            }
            _ => Err(errors),
        }
    }
}

impl ImpactAnalysisPayload {
    pub fn validate(self) -> Result<Uuid, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match check_uuid(&mut errors, "impactId", self.impact_id.as_deref()) {
            Some(id) => Ok(id),
            None => Err(errors),
        }
    }
}

impl CellPayload {
    pub fn validate(self) -> Result<(Uuid, Uuid), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let activity_id = check_uuid(&mut errors, "activityId", self.activity_id.as_deref());
        let component_id = check_uuid(
            &mut errors,
            "environmentalComponentId",
            self.environmental_component_id.as_deref(),
        );
        match (activity_id, component_id) {
            (Some(a), Some(c)) => Ok((a, c)),
            _ => Err(errors),
        }
    }
}

/// Range checks shared by user payloads and model-suggested scores.
pub fn validate_scores(magnitude: i64, importance: i64) -> Result<(i32, i32), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match check_scores(&mut errors, Some(magnitude), Some(importance)) {
        Some(scores) => Ok(scores),
        None => Err(errors),
    }
}

/// Parses an identifier taken from a path segment or a body field.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ValidationErrors> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ValidationErrors::single(field, "must be a valid UUID"))
}

fn check_name(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    let Some(value) = value else {
        errors.push(field, "is required");
        return None;
    };
    let trimmed = value.trim();
    if trimmed.chars().count() < NAME_MIN_CHARS {
        errors.push(
            field,
            format!("must contain at least {NAME_MIN_CHARS} characters"),
        );
        return None;
    }
    Some(trimmed.to_string())
}

fn check_scores(
    errors: &mut ValidationErrors,
    magnitude: Option<i64>,
    importance: Option<i64>,
) -> Option<(i32, i32)> {
    let magnitude = match magnitude {
        None => {
            errors.push("magnitude", "is required");
            None
        }
        Some(0) => {
            errors.push("magnitude", "must not be 0");
            None
        }
        Some(m) if !(MAGNITUDE_MIN..=MAGNITUDE_MAX).contains(&m) => {
            errors.push(
                "magnitude",
                format!("must be between {MAGNITUDE_MIN} and {MAGNITUDE_MAX}"),
            );
            None
        }
        Some(m) => Some(m as i32),
    };
    let importance = match importance {
        None => {
            errors.push("importance", "is required");
            None
        }
        Some(i) if !(IMPORTANCE_MIN..=IMPORTANCE_MAX).contains(&i) => {
            errors.push(
                "importance",
                format!("must be between {IMPORTANCE_MIN} and {IMPORTANCE_MAX}"),
            );
            None
        }
        Some(i) => Some(i as i32),
    };
    magnitude.zip(importance)
}

fn check_uuid(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<Uuid> {
    match value {
        None => {
            errors.push(field, "is required");
            None
        }
        Some(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(field, "must be a valid UUID");
                None
            }
        },
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
