use crate::config::risk_catalog::{self, DEFAULT_WEIGHT, MAX_SCORE, MIN_SCORE};

/// Base severity of a category; unknown categories weigh `DEFAULT_WEIGHT`.
pub fn base_weight(risk_type: &str) -> i32 {
    risk_catalog::find(risk_type)
        .map(|risk| risk.weight)
        .unwrap_or(DEFAULT_WEIGHT)
}

/// Severity estimate in `MIN_SCORE..=MAX_SCORE`.
///
/// Every keyword of the category is checked against every whitespace token
/// of the folded description (lower-cased, accents stripped); each token
/// containing the keyword adds the keyword's bonus again.
pub fn score(risk_type: &str, description: &str) -> i32 {
    let mut total = base_weight(risk_type);

    if let Some(risk) = risk_catalog::find(risk_type) {
        let folded = risk_catalog::fold(description);
        let tokens: Vec<&str> = folded.split_whitespace().collect();
        for (keyword, bonus) in risk.keywords {
            let keyword = risk_catalog::fold(keyword);
            total += tokens
                .iter()
                .filter(|token| token.contains(keyword.as_str()))
                .count() as i32
                * bonus;
        }
    }

    total.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}
