use anyhow::Result;
use std::sync::Arc;

use crate::app::listing;
use crate::app::media::{ImageUpload, MediaService};
use crate::app::scoring;
use crate::config::risk_catalog;
use crate::domain::account::Identity;
use crate::domain::outcome::Outcome;
use crate::domain::report::{NewReport, Report, ReportCard, ReportFilter};
use crate::infra::store::ReportStore;

pub const RISK_TYPE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct CreateReport {
    pub risk_type: String,
    pub description: String,
    pub image: Option<ImageUpload>,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    media: MediaService,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReportStore>, media: MediaService) -> Self {
        Self { store, media }
    }

    pub async fn create_report(&self, author: &Identity, input: CreateReport) -> Result<Outcome<Report>> {
        let risk_type = risk_catalog::canonical_name(&input.risk_type);
        if risk_type.is_empty() {
            return Ok(Outcome::Invalid("risk_type is required"));
        }
        if risk_type.chars().count() > RISK_TYPE_MAX_CHARS {
            return Ok(Outcome::Invalid("risk_type must be at most 100 characters"));
        }

        let image_ref = match input.image {
            Some(upload) => match self.media.store(upload).await? {
                Outcome::Done(image_ref) => Some(image_ref),
                Outcome::Invalid(reason) => return Ok(Outcome::Invalid(reason)),
                Outcome::Denied => return Ok(Outcome::Denied),
                Outcome::NotFound => return Ok(Outcome::NotFound),
            },
            None => None,
        };

        let score = scoring::score(&risk_type, &input.description);
        let new_report = NewReport {
            description: input.description,
            risk_type,
            image_ref: image_ref.clone(),
            username: author.username.clone(),
            score,
        };

        match self.store.insert_report(new_report).await {
            Ok(report) => Ok(Outcome::Done(report)),
            Err(err) => {
                // The image was written before the insert; don't leave it behind.
                if let Some(image_ref) = image_ref {
                    self.media.discard(&image_ref).await;
                }
                Err(err)
            }
        }
    }

    pub async fn get_report(&self, viewer: &Identity, report_id: i64) -> Result<Outcome<ReportCard>> {
        let summary = match self.store.get_report(report_id).await? {
            Some(summary) => summary,
            None => return Ok(Outcome::NotFound),
        };

        let ids = [report_id];
        let liked = self.store.liked_by(&viewer.username, &ids).await?;
        let comments = self.store.list_comments(&ids).await?;
        let mut cards = listing::into_cards(vec![summary], &liked, comments);
        Ok(cards.pop().into())
    }

    /// Filtered and ranked listing, fully materialized.
    pub async fn list_reports(&self, viewer: &Identity, filter: &ReportFilter) -> Result<Vec<ReportCard>> {
        let reports = listing::rank(self.store.list_reports(filter).await?);
        let ids: Vec<i64> = reports.iter().map(|summary| summary.report.id).collect();
        let liked = self.store.liked_by(&viewer.username, &ids).await?;
        let comments = self.store.list_comments(&ids).await?;
        Ok(listing::into_cards(reports, &liked, comments))
    }

    pub async fn delete_report(&self, actor: &Identity, report_id: i64) -> Result<Outcome<()>> {
        let summary = match self.store.get_report(report_id).await? {
            Some(summary) => summary,
            None => return Ok(Outcome::NotFound),
        };
        if !actor.may_delete(&summary.report.username) {
            return Ok(Outcome::Denied);
        }

        if !self.store.delete_report(report_id).await? {
            return Ok(Outcome::NotFound);
        }
        if let Some(image_ref) = &summary.report.image_ref {
            self.media.discard(image_ref).await;
        }
        Ok(Outcome::Done(()))
    }

    pub async fn update_score(&self, actor: &Identity, report_id: i64, score: i32) -> Result<Outcome<Report>> {
        if !actor.is_admin() {
            return Ok(Outcome::Denied);
        }
        if !scoring::is_valid_score(score) {
            return Ok(Outcome::Invalid("score must be between 0 and 5"));
        }
        Ok(self.store.set_score(report_id, score).await?.into())
    }

    /// One-way: there is no operation that clears the flag.
    pub async fn mark_resolved(&self, actor: &Identity, report_id: i64) -> Result<Outcome<Report>> {
        if !actor.is_admin() {
            return Ok(Outcome::Denied);
        }
        Ok(self.store.mark_resolved(report_id).await?.into())
    }
}
