use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Files written to the remote asset store for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub folder: String,
    /// Page images first, then `analysis.json`, then the original file.
    pub files: Vec<String>,
}

/// One completed resume evaluation, as persisted in both stores.
///
/// `result` is the raw AI payload and is never rewritten after creation.
/// `storage_path` is only populated when a record is read back from the remote
/// asset store; records created by the pipeline never carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub job_description: String,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl AnalysisRecord {
    pub fn new(name: impl Into<String>, job_description: impl Into<String>, result: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            job_description: job_description.into(),
            result,
            assets: None,
            storage_path: None,
        }
    }

    pub fn report(&self) -> AtsReport {
        AtsReport::from_value(&self.result)
    }

    pub fn summary(&self) -> AnalysisSummary {
        let report = self.report();
        AnalysisSummary {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            has_job_description: !self.job_description.trim().is_empty(),
            ats_score: report.ats_score,
            match_percentage: report.match_percentage,
            band: report.ats_score.map(ScoreBand::from_score),
            storage_path: self.storage_path.clone(),
        }
    }
}

/// Coarse rating used to colour scores in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Strong
        } else if score >= 60.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceRelevance {
    High,
    Medium,
    Low,
}

impl ExperienceRelevance {
    /// Reads the leading word, so "High - strong backend match" parses as `High`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text
            .split(|c: char| !c.is_alphabetic())
            .find(|w| !w.is_empty())?
            .to_lowercase();
        match word.as_str() {
            "high" => Some(ExperienceRelevance::High),
            "medium" => Some(ExperienceRelevance::Medium),
            "low" => Some(ExperienceRelevance::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScores {
    pub contact_info: Option<f64>,
    pub summary: Option<f64>,
    pub experience: Option<f64>,
    pub education: Option<f64>,
    pub skills: Option<f64>,
}

/// Read-only typed view over an AI result payload.
///
/// Built field by field: a missing or wrongly typed field becomes `None` or an
/// empty list and never fails the whole view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsReport {
    pub ats_score: Option<f64>,
    pub match_percentage: Option<f64>,
    pub summary: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub skills_match: SkillsMatch,
    pub experience_relevance: Option<ExperienceRelevance>,
    pub formatting_issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub section_scores: SectionScores,
}

impl AtsReport {
    pub fn from_value(value: &Value) -> Self {
        let skills = value.get("skillsMatch");
        let sections = value.get("sectionScores");
        Self {
            ats_score: score_field(Some(value), "atsScore"),
            match_percentage: score_field(Some(value), "matchPercentage"),
            summary: value
                .get("summary")
                .and_then(|v| v.as_str())
                .map(String::from),
            strengths: string_list(Some(value), "strengths"),
            weaknesses: string_list(Some(value), "weaknesses"),
            missing_keywords: string_list(Some(value), "missingKeywords"),
            skills_match: SkillsMatch {
                matched: string_list(skills, "matched"),
                missing: string_list(skills, "missing"),
            },
            experience_relevance: value
                .get("experienceRelevance")
                .and_then(|v| v.as_str())
                .and_then(ExperienceRelevance::parse),
            formatting_issues: string_list(Some(value), "formattingIssues"),
            recommendations: string_list(Some(value), "recommendations"),
            section_scores: SectionScores {
                contact_info: score_field(sections, "contactInfo"),
                summary: score_field(sections, "summary"),
                experience: score_field(sections, "experience"),
                education: score_field(sections, "education"),
                skills: score_field(sections, "skills"),
            },
        }
    }
}

/// Numeric field, also accepting numeric strings like `"85"`.
fn score_field(parent: Option<&Value>, key: &str) -> Option<f64> {
    let v = parent?.get(key)?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn string_list(parent: Option<&Value>, key: &str) -> Vec<String> {
    parent
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// One row of the analysis history listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub has_job_description: bool,
    pub ats_score: Option<f64>,
    pub match_percentage: Option<f64>,
    pub band: Option<ScoreBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}
