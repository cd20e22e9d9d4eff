use anyhow::Result;
use async_trait::async_trait;

use crate::domain::account::Account;
use crate::domain::engagement::{Comment, LikeToggle};
use crate::domain::report::{NewReport, Report, ReportFilter, ReportSummary};

/// Persistence for accounts, reports, likes and comments.
///
/// Implementations enforce the relational invariants themselves: one like
/// per (report, username), and deleting a report drops its likes and
/// comments. Methods that target a report return `None`/`false` when the
/// report does not exist.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn find_account(&self, username: &str) -> Result<Option<Account>>;

    /// Returns `None` when the username is taken.
    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<Account>>;

    async fn update_password_hash(&self, username: &str, password_hash: &str) -> Result<bool>;

    async fn insert_report(&self, report: NewReport) -> Result<Report>;

    async fn get_report(&self, report_id: i64) -> Result<Option<ReportSummary>>;

    /// Matching reports in insertion order.
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportSummary>>;

    async fn delete_report(&self, report_id: i64) -> Result<bool>;

    async fn set_score(&self, report_id: i64, score: i32) -> Result<Option<Report>>;

    async fn mark_resolved(&self, report_id: i64) -> Result<Option<Report>>;

    async fn toggle_like(&self, report_id: i64, username: &str) -> Result<Option<LikeToggle>>;

    /// Ids of the given reports that `username` has liked.
    async fn liked_by(&self, username: &str, report_ids: &[i64]) -> Result<Vec<i64>>;

    async fn insert_comment(
        &self,
        report_id: i64,
        username: &str,
        text: &str,
    ) -> Result<Option<Comment>>;

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;

    /// Comments on the given reports in insertion order.
    async fn list_comments(&self, report_ids: &[i64]) -> Result<Vec<Comment>>;
}
