use serde::{Deserialize, Serialize};

use super::super::rubric::SectionRule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub key: String,
    pub value: f64,
    pub score: f64,
}

/// Section total before and after its cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub index: u8,
    pub key: String,
    pub label: String,
    pub raw_score: f64,
    pub capped_score: f64,
    #[serde(default)]
    pub categories: Vec<CategoryScore>,
}

pub fn aggregate_section(rule: &SectionRule, categories: Vec<CategoryScore>) -> SectionScore {
    let raw_score: f64 = categories.iter().map(|category| category.score).sum();
    let capped_score = rule.cap.apply(raw_score);

    SectionScore {
        index: rule.index,
        key: rule.key.to_string(),
        label: rule.label.to_string(),
        raw_score,
        capped_score,
        categories,
    }
}
