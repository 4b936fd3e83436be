use std::fmt;

use quiz_core::model::{QuizId, SubjectId};
use reqwest::Method;

/// Every endpoint the client talks to, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Register,
    Login,
    Logout,
    CurrentUser,
    Subjects,
    CreateSubject,
    DeleteSubject(SubjectId),
    Quizzes,
    CreateQuiz,
    DeleteQuiz(QuizId),
    Scores,
    UserStats,
    AdminStats,
    SubmitQuiz(QuizId),
}

impl Route {
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Register | Self::Login | Self::CreateSubject | Self::CreateQuiz => Method::POST,
            Self::SubmitQuiz(_) => Method::POST,
            Self::DeleteSubject(_) | Self::DeleteQuiz(_) => Method::DELETE,
            Self::Logout
            | Self::CurrentUser
            | Self::Subjects
            | Self::Quizzes
            | Self::Scores
            | Self::UserStats
            | Self::AdminStats => Method::GET,
        }
    }

    /// Path with ids substituted, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Register => "/register".into(),
            Self::Login => "/login".into(),
            Self::Logout => "/logout".into(),
            Self::CurrentUser => "/users/me".into(),
            Self::Subjects | Self::CreateSubject => "/subjects".into(),
            Self::DeleteSubject(id) => format!("/subjects/{id}"),
            Self::Quizzes | Self::CreateQuiz => "/quizzes".into(),
            Self::DeleteQuiz(id) => format!("/quizzes/{id}"),
            Self::Scores => "/scores".into(),
            Self::UserStats => "/user/stats".into(),
            Self::AdminStats => "/admin/stats".into(),
            Self::SubmitQuiz(id) => format!("/quiz/{id}/submit"),
        }
    }

    /// Stable label used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register => "POST /register",
            Self::Login => "POST /login",
            Self::Logout => "GET /logout",
            Self::CurrentUser => "GET /users/me",
            Self::Subjects => "GET /subjects",
            Self::CreateSubject => "POST /subjects",
            Self::DeleteSubject(_) => "DELETE /subjects/{id}",
            Self::Quizzes => "GET /quizzes",
            Self::CreateQuiz => "POST /quizzes",
            Self::DeleteQuiz(_) => "DELETE /quizzes/{id}",
            Self::Scores => "GET /scores",
            Self::UserStats => "GET /user/stats",
            Self::AdminStats => "GET /admin/stats",
            Self::SubmitQuiz(_) => "POST /quiz/{id}/submit",
        }
    }

    /// Whether the session credential is attached to this request.
    #[must_use]
    pub fn sends_credential(&self) -> bool {
        !matches!(self, Self::Register | Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
