use anyhow::Result;
use std::sync::Arc;

use crate::domain::account::Identity;
use crate::domain::engagement::{Comment, LikeToggle};
use crate::domain::outcome::Outcome;
use crate::infra::store::ReportStore;

pub const COMMENT_MAX_CHARS: usize = 300;

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn ReportStore>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Likes the report, or takes the like back if there already is one.
    pub async fn toggle_like(&self, actor: &Identity, report_id: i64) -> Result<Outcome<LikeToggle>> {
        Ok(self
            .store
            .toggle_like(report_id, &actor.username)
            .await?
            .into())
    }

    pub async fn add_comment(&self, actor: &Identity, report_id: i64, text: &str) -> Result<Outcome<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Invalid("comment cannot be empty"));
        }
        if text.chars().count() > COMMENT_MAX_CHARS {
            return Ok(Outcome::Invalid("comment must be at most 300 characters"));
        }

        Ok(self
            .store
            .insert_comment(report_id, &actor.username, text)
            .await?
            .into())
    }

    pub async fn delete_comment(&self, actor: &Identity, comment_id: i64) -> Result<Outcome<()>> {
        let comment = match self.store.get_comment(comment_id).await? {
            Some(comment) => comment,
            None => return Ok(Outcome::NotFound),
        };
        if !actor.may_delete(&comment.username) {
            return Ok(Outcome::Denied);
        }

        if self.store.delete_comment(comment_id).await? {
            Ok(Outcome::Done(()))
        } else {
            Ok(Outcome::NotFound)
        }
    }
}
