use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::risk_catalog;
use crate::domain::engagement::Comment;

pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub risk_type: String,
    pub image_ref: Option<String>,
    pub username: String,
    pub score: i32,
    pub resolved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub description: String,
    pub risk_type: String,
    pub image_ref: Option<String>,
    pub username: String,
    pub score: i32,
}

impl NewReport {
    pub fn title(&self) -> String {
        self.description.chars().take(TITLE_MAX_CHARS).collect()
    }
}

/// A report together with its popularity, as the store lists it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    #[serde(flatten)]
    pub report: Report,
    pub likes: i64,
}

/// A listed report as a particular viewer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportCard {
    #[serde(flatten)]
    pub report: Report,
    pub likes: i64,
    pub liked: bool,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedFilter {
    #[default]
    Unresolved,
    Resolved,
    All,
}

impl ResolvedFilter {
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("no") => Some(Self::Unresolved),
            Some("si") | Some("sí") => Some(Self::Resolved),
            Some("todos") => Some(Self::All),
            _ => None,
        }
    }

    pub fn admits(&self, resolved: bool) -> bool {
        match self {
            Self::Unresolved => !resolved,
            Self::Resolved => resolved,
            Self::All => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// `None` lists every category.
    pub risk_type: Option<String>,
    pub resolved: ResolvedFilter,
}

impl ReportFilter {
    pub fn from_query(risk_type: Option<&str>, solucionado: Option<&str>) -> Option<Self> {
        let risk_type = match risk_type.map(str::trim) {
            None | Some("") | Some("todos") => None,
            Some(name) => Some(risk_catalog::canonical_name(name)),
        };
        Some(Self {
            risk_type,
            resolved: ResolvedFilter::from_query(solucionado)?,
        })
    }

    pub fn matches(&self, report: &Report) -> bool {
        let category = match &self.risk_type {
            Some(name) => risk_catalog::fold(&report.risk_type) == risk_catalog::fold(name),
            None => true,
        };
        category && self.resolved.admits(report.resolved)
    }
}
