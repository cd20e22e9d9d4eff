use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::config::PostgresConfig;
use crate::domain::account::Account;
use crate::domain::engagement::{Comment, LikeToggle};
use crate::domain::report::{NewReport, Report, ReportFilter, ReportSummary, ResolvedFilter};
use crate::infra::store::ReportStore;

const SCHEMA: &str = include_str!("../../migrations/001_init.sql");

const REPORT_COLUMNS: &str = "r.id, r.title, r.description, r.risk_type, r.image_ref, \
     r.username, r.score, r.resolved, r.created_at, \
     (SELECT COUNT(*) FROM likes l WHERE l.report_id = r.id) AS likes";

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Applies the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for Db {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_admin, created_at \
             FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| account_from_row(&row)))
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<Option<Account>> {
        let row = sqlx::query(
            "INSERT INTO accounts (username, password_hash, is_admin) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING \
             RETURNING id, username, password_hash, is_admin, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| account_from_row(&row)))
    }

    async fn update_password_hash(&self, username: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_report(&self, report: NewReport) -> Result<Report> {
        let row = sqlx::query(
            "INSERT INTO reports (title, description, risk_type, image_ref, username, score) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, title, description, risk_type, image_ref, username, score, resolved, created_at",
        )
        .bind(report.title())
        .bind(&report.description)
        .bind(&report.risk_type)
        .bind(&report.image_ref)
        .bind(&report.username)
        .bind(report.score)
        .fetch_one(&self.pool)
        .await?;

        Ok(report_from_row(&row))
    }

    async fn get_report(&self, report_id: i64) -> Result<Option<ReportSummary>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reports r WHERE r.id = $1",
            REPORT_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| summary_from_row(&row)))
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportSummary>> {
        let resolved = match filter.resolved {
            ResolvedFilter::Unresolved => Some(false),
            ResolvedFilter::Resolved => Some(true),
            ResolvedFilter::All => None,
        };

        let rows = sqlx::query(&format!(
            "SELECT {} FROM reports r \
             WHERE ($1::text IS NULL OR lower(r.risk_type) = lower($1::text)) \
               AND ($2::boolean IS NULL OR r.resolved = $2::boolean) \
             ORDER BY r.id ASC",
            REPORT_COLUMNS
        ))
        .bind(filter.risk_type.as_deref())
        .bind(resolved)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(summary_from_row).collect())
    }

    async fn delete_report(&self, report_id: i64) -> Result<bool> {
        // likes and comments go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_score(&self, report_id: i64, score: i32) -> Result<Option<Report>> {
        let row = sqlx::query(
            "UPDATE reports SET score = $2 WHERE id = $1 \
             RETURNING id, title, description, risk_type, image_ref, username, score, resolved, created_at",
        )
        .bind(report_id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| report_from_row(&row)))
    }

    async fn mark_resolved(&self, report_id: i64) -> Result<Option<Report>> {
        let row = sqlx::query(
            "UPDATE reports SET resolved = TRUE WHERE id = $1 \
             RETURNING id, title, description, risk_type, image_ref, username, score, resolved, created_at",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| report_from_row(&row)))
    }

    async fn toggle_like(&self, report_id: i64, username: &str) -> Result<Option<LikeToggle>> {
        let mut tx = self.pool.begin().await?;

        // Holding the report row keeps a concurrent delete from racing the insert.
        let exists = sqlx::query("SELECT id FROM reports WHERE id = $1 FOR SHARE")
            .bind(report_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM likes WHERE report_id = $1 AND username = $2")
            .bind(report_id)
            .bind(username)
            .execute(&mut *tx)
            .await?;

        let liked = if removed.rows_affected() > 0 {
            false
        } else {
            sqlx::query(
                "INSERT INTO likes (report_id, username) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(report_id)
            .bind(username)
            .execute(&mut *tx)
            .await?;
            true
        };

        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE report_id = $1")
            .bind(report_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(LikeToggle { liked, likes }))
    }

    async fn liked_by(&self, username: &str, report_ids: &[i64]) -> Result<Vec<i64>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT report_id FROM likes WHERE username = $1 AND report_id = ANY($2)",
        )
        .bind(username)
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn insert_comment(
        &self,
        report_id: i64,
        username: &str,
        text: &str,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "INSERT INTO comments (report_id, username, text) \
             SELECT id, $2, $3 FROM reports WHERE id = $1 \
             RETURNING id, report_id, username, text, created_at",
        )
        .bind(report_id)
        .bind(username)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| comment_from_row(&row)))
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, report_id, username, text, created_at FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| comment_from_row(&row)))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, report_ids: &[i64]) -> Result<Vec<Comment>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, report_id, username, text, created_at \
             FROM comments WHERE report_id = ANY($1) \
             ORDER BY id ASC",
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

fn report_from_row(row: &PgRow) -> Report {
    Report {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        risk_type: row.get("risk_type"),
        image_ref: row.get("image_ref"),
        username: row.get("username"),
        score: row.get("score"),
        resolved: row.get("resolved"),
        created_at: row.get("created_at"),
    }
}

fn summary_from_row(row: &PgRow) -> ReportSummary {
    ReportSummary {
        report: report_from_row(row),
        likes: row.get("likes"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        report_id: row.get("report_id"),
        username: row.get("username"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}
