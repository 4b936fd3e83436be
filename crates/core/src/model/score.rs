use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::{ScoreId, SubjectId};
use crate::time::deserialize_opt_date;

/// One graded attempt of the current user, as listed by `GET /scores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub id: ScoreId,
    pub total: u32,
    pub correct: u32,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub date_of_quiz: Option<NaiveDate>,
    pub subject_id: SubjectId,
}

impl Score {
    /// Fraction of questions answered correctly, in `[0, 1]`.
    ///
    /// An empty quiz scores zero.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct.min(self.total)) / f64::from(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_score_listing() {
        let score: Score = serde_json::from_str(
            r#"{"total":4,"correct":3,"date_of_quiz":"2023-11-14","id":1,"subject_id":2}"#,
        )
        .unwrap();
        assert_eq!(score.subject_id, SubjectId::new(2));
        assert!((score.ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_quiz_ratio_is_zero() {
        let score = Score {
            id: ScoreId::new(1),
            total: 0,
            correct: 0,
            date_of_quiz: None,
            subject_id: SubjectId::new(1),
        };
        assert_eq!(score.ratio(), 0.0);
    }
}
