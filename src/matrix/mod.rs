//! Domain records of a Leopold matrix: a project, its activities, the
//! environmental components they may affect, and the scored impacts sitting
//! in the activity x component grid.

pub mod validation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use validation::ValidationErrors;

/// Lifecycle phase an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preparation,
    Construction,
    Exploitation,
    Maintenance,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Preparation,
        Phase::Construction,
        Phase::Exploitation,
        Phase::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preparation => "preparation",
            Phase::Construction => "construction",
            Phase::Exploitation => "exploitation",
            Phase::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// Environmental component category. Wire values are the French labels used
/// by the matrix forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "physique")]
    Physical,
    #[serde(rename = "biologique")]
    Biological,
    #[serde(rename = "social")]
    Social,
    #[serde(rename = "economique")]
    Economic,
    #[serde(rename = "culturel")]
    Cultural,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Physical,
        Category::Biological,
        Category::Social,
        Category::Economic,
        Category::Cultural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Physical => "physique",
            Category::Biological => "biologique",
            Category::Social => "social",
            Category::Economic => "economique",
            Category::Cultural => "culturel",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalComponent {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub id: Uuid,
    pub project_id: Uuid,
    pub activity_id: Uuid,
    pub environmental_component_id: Uuid,
    pub magnitude: i32,
    pub importance: i32,
    pub description: Option<String>,
    pub mitigation_measures: Option<String>,
    pub ai_analysis: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An impact together with the two records it links.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactDetail {
    #[serde(flatten)]
    pub impact: Impact,
    pub activity: Activity,
    pub environmental_component: EnvironmentalComponent,
}

/// A project with everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub activities: Vec<Activity>,
    pub components: Vec<EnvironmentalComponent>,
    pub impacts: Vec<ImpactDetail>,
}

// Validated inputs. Constructed only by the validation layer.

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub phase: Phase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComponent {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewImpact {
    pub activity_id: Uuid,
    pub environmental_component_id: Uuid,
    pub magnitude: i32,
    pub importance: i32,
    pub description: Option<String>,
    pub mitigation_measures: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_and_category_round_trip_through_wire_names() {
        for p in Phase::ALL {
            assert_eq!(p.as_str().parse::<Phase>().unwrap(), p);
            assert_eq!(
                serde_json::to_value(p).unwrap(),
                serde_json::Value::String(p.as_str().to_string())
            );
        }
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
            assert_eq!(
                serde_json::to_value(c).unwrap(),
                serde_json::Value::String(c.as_str().to_string())
            );
        }
        assert!("physical".parse::<Category>().is_err());
        assert!("build".parse::<Phase>().is_err());
    }

    #[test]
    fn impact_detail_flattens_impact_fields() {
        let now = Utc::now();
        let project_id = Uuid::new_v4();
        let activity = Activity {
            id: Uuid::new_v4(),
            project_id,
            name: "Excavation".into(),
            description: None,
            phase: Phase::Construction,
            created_at: now,
        };
        let component = EnvironmentalComponent {
            id: Uuid::new_v4(),
            project_id,
            name: "River flow".into(),
            description: None,
            category: Category::Physical,
            created_at: now,
        };
        let impact = Impact {
            id: Uuid::new_v4(),
            project_id,
            activity_id: activity.id,
            environmental_component_id: component.id,
            magnitude: -5,
            importance: 8,
            description: None,
            mitigation_measures: None,
            ai_analysis: None,
            created_at: now,
        };
        let json = serde_json::to_value(ImpactDetail {
            impact,
            activity: activity.clone(),
            environmental_component: component,
        })
        .unwrap();
        assert_eq!(json["magnitude"], -5);
        assert_eq!(json["activityId"], activity.id.to_string());
        assert_eq!(json["activity"]["phase"], "construction");
        assert_eq!(json["environmentalComponent"]["category"], "physique");
    }
}
