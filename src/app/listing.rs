use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use crate::domain::engagement::Comment;
use crate::domain::report::{ReportCard, ReportSummary};

/// Orders reports by score, then like count, both descending.
///
/// The sort is stable, so reports that tie keep the order they came in
/// (insertion order from the store).
pub fn rank(mut reports: Vec<ReportSummary>) -> Vec<ReportSummary> {
    reports.sort_by_key(|summary| (Reverse(summary.report.score), Reverse(summary.likes)));
    reports
}

/// Attaches the viewer's like state and the comments of each report.
pub fn into_cards(
    reports: Vec<ReportSummary>,
    liked: &[i64],
    comments: Vec<Comment>,
) -> Vec<ReportCard> {
    let liked: HashSet<i64> = liked.iter().copied().collect();
    let mut by_report: BTreeMap<i64, Vec<Comment>> = BTreeMap::new();
    for comment in comments {
        by_report.entry(comment.report_id).or_default().push(comment);
    }

    reports
        .into_iter()
        .map(|summary| {
            let id = summary.report.id;
            ReportCard {
                liked: liked.contains(&id),
                comments: by_report.remove(&id).unwrap_or_default(),
                likes: summary.likes,
                report: summary.report,
            }
        })
        .collect()
}
