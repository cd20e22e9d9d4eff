use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::engagement::{Comment, Like, LikeToggle};
use crate::domain::report::{NewReport, Report, ReportFilter, ReportSummary};
use crate::infra::store::ReportStore;

/// In-process store. Ids are handed out in insertion order like the
/// sequences of the PostgreSQL schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    next_account_id: i64,
    next_report_id: i64,
    next_comment_id: i64,
    accounts: BTreeMap<String, Account>,
    reports: BTreeMap<i64, Report>,
    likes: BTreeMap<(i64, String), Like>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn like_count(&self, report_id: i64) -> i64 {
        self.likes
            .range((report_id, String::new())..)
            .take_while(|((id, _), _)| *id == report_id)
            .count() as i64
    }

    fn summary(&self, report: &Report) -> ReportSummary {
        ReportSummary {
            report: report.clone(),
            likes: self.like_count(report.id),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        let tables = self.inner.read().await;
        Ok(tables.accounts.get(username).cloned())
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<Account>> {
        let mut tables = self.inner.write().await;
        if tables.accounts.contains_key(username) {
            return Ok(None);
        }

        tables.next_account_id += 1;
        let account = Account {
            id: tables.next_account_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
            created_at: OffsetDateTime::now_utc(),
        };
        tables
            .accounts
            .insert(account.username.clone(), account.clone());
        Ok(Some(account))
    }

    async fn update_password_hash(&self, username: &str, password_hash: &str) -> Result<bool> {
        let mut tables = self.inner.write().await;
        match tables.accounts.get_mut(username) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_report(&self, report: NewReport) -> Result<Report> {
        let mut tables = self.inner.write().await;
        tables.next_report_id += 1;
        let stored = Report {
            id: tables.next_report_id,
            title: report.title(),
            description: report.description,
            risk_type: report.risk_type,
            image_ref: report.image_ref,
            username: report.username,
            score: report.score,
            resolved: false,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.reports.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_report(&self, report_id: i64) -> Result<Option<ReportSummary>> {
        let tables = self.inner.read().await;
        Ok(tables
            .reports
            .get(&report_id)
            .map(|report| tables.summary(report)))
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportSummary>> {
        let tables = self.inner.read().await;
        Ok(tables
            .reports
            .values()
            .filter(|report| filter.matches(report))
            .map(|report| tables.summary(report))
            .collect())
    }

    async fn delete_report(&self, report_id: i64) -> Result<bool> {
        let mut tables = self.inner.write().await;
        if tables.reports.remove(&report_id).is_none() {
            return Ok(false);
        }
        tables.likes.retain(|(id, _), _| *id != report_id);
        tables
            .comments
            .retain(|_, comment| comment.report_id != report_id);
        Ok(true)
    }

    async fn set_score(&self, report_id: i64, score: i32) -> Result<Option<Report>> {
        let mut tables = self.inner.write().await;
        Ok(tables.reports.get_mut(&report_id).map(|report| {
            report.score = score;
            report.clone()
        }))
    }

    async fn mark_resolved(&self, report_id: i64) -> Result<Option<Report>> {
        let mut tables = self.inner.write().await;
        Ok(tables.reports.get_mut(&report_id).map(|report| {
            report.resolved = true;
            report.clone()
        }))
    }

    async fn toggle_like(&self, report_id: i64, username: &str) -> Result<Option<LikeToggle>> {
        let mut tables = self.inner.write().await;
        if !tables.reports.contains_key(&report_id) {
            return Ok(None);
        }

        let key = (report_id, username.to_string());
        let liked = if tables.likes.remove(&key).is_some() {
            false
        } else {
            tables.likes.insert(
                key,
                Like {
                    report_id,
                    username: username.to_string(),
                    created_at: OffsetDateTime::now_utc(),
                },
            );
            true
        };

        Ok(Some(LikeToggle {
            liked,
            likes: tables.like_count(report_id),
        }))
    }

    async fn liked_by(&self, username: &str, report_ids: &[i64]) -> Result<Vec<i64>> {
        let tables = self.inner.read().await;
        let wanted: BTreeSet<i64> = report_ids.iter().copied().collect();
        Ok(tables
            .likes
            .keys()
            .filter(|(id, name)| name == username && wanted.contains(id))
            .map(|(id, _)| *id)
            .collect())
    }

    async fn insert_comment(
        &self,
        report_id: i64,
        username: &str,
        text: &str,
    ) -> Result<Option<Comment>> {
        let mut tables = self.inner.write().await;
        if !tables.reports.contains_key(&report_id) {
            return Ok(None);
        }

        tables.next_comment_id += 1;
        let comment = Comment {
            id: tables.next_comment_id,
            report_id,
            username: username.to_string(),
            text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(Some(comment))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let tables = self.inner.read().await;
        Ok(tables.comments.get(&comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let mut tables = self.inner.write().await;
        Ok(tables.comments.remove(&comment_id).is_some())
    }

    async fn list_comments(&self, report_ids: &[i64]) -> Result<Vec<Comment>> {
        let tables = self.inner.read().await;
        let wanted: BTreeSet<i64> = report_ids.iter().copied().collect();
        Ok(tables
            .comments
            .values()
            .filter(|comment| wanted.contains(&comment.report_id))
            .cloned()
            .collect())
    }
}
