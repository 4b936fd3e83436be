//! Response envelopes, one per listing endpoint.

use quiz_core::model::{CurrentUser, Quiz, Score, Subject};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentUserEnvelope {
    pub current_user: CurrentUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectsEnvelope {
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizzesEnvelope {
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoresEnvelope {
    pub scores: Vec<Score>,
}

/// Body of the submit endpoint. The server reports failures in `code`
/// while still answering 200.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmitReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
}

impl SubmitReply {
    pub(crate) fn failure_code(&self) -> Option<u16> {
        self.code.filter(|code| *code >= 400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_envelope_key_is_an_error() {
        assert!(serde_json::from_str::<QuizzesEnvelope>(r#"{"msg":"Missing cookie"}"#).is_err());
        let ok: QuizzesEnvelope = serde_json::from_str(r#"{"quizzes":[]}"#).unwrap();
        assert!(ok.quizzes.is_empty());
    }

    #[test]
    fn submit_reply_failure_code() {
        let reply: SubmitReply =
            serde_json::from_str(r#"{"message":"unknown error: x","code":500}"#).unwrap();
        assert_eq!(reply.failure_code(), Some(500));
        let reply: SubmitReply =
            serde_json::from_str(r#"{"message":"user score updated!","code":201}"#).unwrap();
        assert_eq!(reply.failure_code(), None);
    }
}
