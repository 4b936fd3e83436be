use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChapterId, OptionId, QuestionId, QuizId, SubjectId};
use crate::time::deserialize_opt_date;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz name cannot be empty")]
    EmptyName,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("question statement cannot be empty")]
    EmptyStatement,

    #[error("question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("answer index {answer} is out of range for {options} options")]
    AnswerOutOfRange { answer: usize, options: usize },

    #[error("minutes must be < 60, got {0}")]
    InvalidMinutes(u32),

    #[error("quiz duration must be > 0")]
    ZeroDuration,
}

//
// ─── SERVER RECORDS ────────────────────────────────────────────────────────────
//

/// A quiz as listed by `GET /quizzes`.
///
/// `subject` and `chapter` are display names here, not ids. Correct answers
/// are never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "quiz_id")]
    pub id: QuizId,
    pub name: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub chapter: String,
    #[serde(rename = "hh", default)]
    pub hours: u32,
    #[serde(rename = "mm", default)]
    pub minutes: u32,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub date_of_quiz: Option<NaiveDate>,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Whether the current user already has a score for this quiz.
    #[serde(default)]
    pub done: bool,
}

impl Quiz {
    #[must_use]
    pub fn duration_minutes(&self) -> u64 {
        u64::from(self.hours) * 60 + u64::from(self.minutes)
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub statement: String,
    #[serde(default)]
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub statement: String,
}

//
// ─── PAYLOADS ──────────────────────────────────────────────────────────────────
//

/// Payload for `POST /quizzes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuiz {
    name: String,
    remarks: String,
    subject: SubjectId,
    chapter: ChapterId,
    date_of_quiz: NaiveDate,
    hh: u32,
    mm: u32,
    questions: Vec<NewQuestion>,
}

impl NewQuiz {
    /// Creates a quiz payload with a default duration of 30 minutes.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyName` or `QuizError::NoQuestions`.
    pub fn new(
        name: impl Into<String>,
        subject: SubjectId,
        chapter: ChapterId,
        date_of_quiz: NaiveDate,
        questions: Vec<NewQuestion>,
    ) -> Result<Self, QuizError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(QuizError::EmptyName);
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            name,
            remarks: String::new(),
            subject,
            chapter,
            date_of_quiz,
            hh: 0,
            mm: 30,
            questions,
        })
    }

    #[must_use]
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// # Errors
    ///
    /// Returns `QuizError::InvalidMinutes` if `minutes >= 60`, or
    /// `QuizError::ZeroDuration` if both parts are zero.
    pub fn with_duration(mut self, hours: u32, minutes: u32) -> Result<Self, QuizError> {
        if minutes >= 60 {
            return Err(QuizError::InvalidMinutes(minutes));
        }
        if hours == 0 && minutes == 0 {
            return Err(QuizError::ZeroDuration);
        }
        self.hh = hours;
        self.mm = minutes;
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    #[must_use]
    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    #[must_use]
    pub fn chapter(&self) -> ChapterId {
        self.chapter
    }

    #[must_use]
    pub fn date_of_quiz(&self) -> NaiveDate {
        self.date_of_quiz
    }

    #[must_use]
    pub fn hours(&self) -> u32 {
        self.hh
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.mm
    }

    #[must_use]
    pub fn questions(&self) -> &[NewQuestion] {
        &self.questions
    }
}

/// A question in a `NewQuiz`; `answer` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuestion {
    statement: String,
    options: Vec<NewOption>,
    answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOption {
    pub statement: String,
}

impl NewQuestion {
    /// # Errors
    ///
    /// Returns `QuizError` if the statement is blank, there are fewer than two
    /// options, or `answer` does not index an option.
    pub fn new<S: Into<String>>(
        statement: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        answer: usize,
    ) -> Result<Self, QuizError> {
        let statement = statement.into().trim().to_owned();
        if statement.is_empty() {
            return Err(QuizError::EmptyStatement);
        }
        let options: Vec<NewOption> = options
            .into_iter()
            .map(|s| NewOption { statement: s.into() })
            .collect();
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions(options.len()));
        }
        if answer >= options.len() {
            return Err(QuizError::AnswerOutOfRange {
                answer,
                options: options.len(),
            });
        }
        Ok(Self {
            statement,
            options,
            answer,
        })
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn options(&self) -> &[NewOption] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> usize {
        self.answer
    }
}

/// Payload for `POST /quiz/{id}/submit`: the chosen option per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    selected: BTreeMap<QuestionId, OptionId>,
}

impl QuizSubmission {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer, replacing any earlier choice for the same question.
    #[must_use]
    pub fn select(mut self, question: QuestionId, option: OptionId) -> Self {
        self.selected.insert(question, option);
        self
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeMap<QuestionId, OptionId> {
        &self.selected
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_date;

    fn question() -> NewQuestion {
        NewQuestion::new("2 + 2?", ["3", "4"], 1).unwrap()
    }

    #[test]
    fn quiz_decodes_server_listing() {
        let quiz: Quiz = serde_json::from_str(
            r#"{
                "quiz_id": 9, "name": "Week 1", "remarks": "", "subject": "Math",
                "chapter": "Algebra", "hh": 1, "mm": 15,
                "date_of_quiz": "Tue, 14 Nov 2023 00:00:00 GMT",
                "questions": [{"id": 1, "statement": "2 + 2?",
                               "options": [{"id": 10, "statement": "4"}]}],
                "done": true
            }"#,
        )
        .unwrap();
        assert_eq!(quiz.id, QuizId::new(9));
        assert_eq!(quiz.duration_minutes(), 75);
        assert_eq!(quiz.date_of_quiz, Some(fixed_date()));
        assert_eq!(quiz.question(QuestionId::new(1)).unwrap().options.len(), 1);
        assert!(quiz.done);
    }

    #[test]
    fn duration_of_huge_listing_does_not_overflow() {
        let quiz: Quiz =
            serde_json::from_str(r#"{"quiz_id":1,"name":"x","hh":4294967295,"mm":59}"#).unwrap();
        assert_eq!(quiz.duration_minutes(), u64::from(u32::MAX) * 60 + 59);
    }

    #[test]
    fn quiz_requires_id() {
        let err = serde_json::from_str::<Quiz>(r#"{"name":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn new_quiz_serializes_wire_shape() {
        let quiz = NewQuiz::new(
            "Week 1",
            SubjectId::new(2),
            ChapterId::new(3),
            fixed_date(),
            vec![question()],
        )
        .unwrap()
        .with_duration(1, 5)
        .unwrap();
        let json = serde_json::to_value(&quiz).unwrap();
        assert_eq!(json["subject"], 2);
        assert_eq!(json["chapter"], 3);
        assert_eq!(json["hh"], 1);
        assert_eq!(json["mm"], 5);
        assert_eq!(json["date_of_quiz"], "2023-11-14");
        assert_eq!(json["questions"][0]["answer"], 1);
        assert_eq!(json["questions"][0]["options"][1]["statement"], "4");
    }

    #[test]
    fn new_quiz_validation() {
        let empty = NewQuiz::new("Q", SubjectId::new(1), ChapterId::new(1), fixed_date(), vec![]);
        assert_eq!(empty, Err(QuizError::NoQuestions));

        let quiz = NewQuiz::new("Q", SubjectId::new(1), ChapterId::new(1), fixed_date(), vec![question()])
            .unwrap();
        assert_eq!(
            quiz.clone().with_duration(0, 75),
            Err(QuizError::InvalidMinutes(75))
        );
        assert_eq!(quiz.with_duration(0, 0), Err(QuizError::ZeroDuration));
    }

    #[test]
    fn question_answer_must_index_an_option() {
        assert_eq!(
            NewQuestion::new("q", ["a", "b"], 2),
            Err(QuizError::AnswerOutOfRange {
                answer: 2,
                options: 2
            })
        );
        assert_eq!(
            NewQuestion::new("q", ["a"], 0),
            Err(QuizError::TooFewOptions(1))
        );
    }

    #[test]
    fn submission_serializes_question_ids_as_keys() {
        let submission = QuizSubmission::new()
            .select(QuestionId::new(1), OptionId::new(10))
            .select(QuestionId::new(2), OptionId::new(21));
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json, serde_json::json!({"selected": {"1": 10, "2": 21}}));
    }
}
