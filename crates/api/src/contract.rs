use async_trait::async_trait;
use quiz_core::model::{
    Credentials, CurrentUser, NewQuiz, NewSubject, Quiz, QuizId, QuizSubmission, Registration,
    Score, Stats, Subject, SubjectId,
};

use crate::credential::SessionCredential;
use crate::error::ApiError;

/// Remote contract of the quiz server.
///
/// Each method is exactly one HTTP round trip. Methods that take a
/// `session` attach it when present; whether a missing credential is
/// acceptable is the server's decision.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or is refused.
    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

    /// Exchange credentials for a session credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` on bad credentials, or
    /// `ApiError::MissingCredential` if the server set no cookie.
    async fn login(&self, credentials: &Credentials) -> Result<SessionCredential, ApiError>;

    /// Ask the server to drop the session cookie.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn logout(&self, session: Option<&SessionCredential>) -> Result<(), ApiError>;

    /// Fetch the user the credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body lacks `current_user`.
    async fn current_user(
        &self,
        session: Option<&SessionCredential>,
    ) -> Result<CurrentUser, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body lacks `subjects`.
    async fn subjects(&self, session: Option<&SessionCredential>) -> Result<Vec<Subject>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body lacks `quizzes`.
    async fn quizzes(&self, session: Option<&SessionCredential>) -> Result<Vec<Quiz>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body lacks `scores`.
    async fn scores(&self, session: Option<&SessionCredential>) -> Result<Vec<Score>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body is not an object.
    async fn user_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body is not an object.
    async fn admin_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or is refused.
    async fn create_subject(
        &self,
        session: Option<&SessionCredential>,
        subject: &NewSubject,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or is refused.
    async fn create_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: &NewQuiz,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or is refused.
    async fn delete_subject(
        &self,
        session: Option<&SessionCredential>,
        id: SubjectId,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or is refused.
    async fn delete_quiz(&self, session: Option<&SessionCredential>, id: QuizId)
    -> Result<(), ApiError>;

    /// Submit answers for `quiz`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails, or `ApiError::Rejected` when
    /// the server reports an error code inside a 2xx reply.
    async fn submit_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: QuizId,
        submission: &QuizSubmission,
    ) -> Result<(), ApiError>;
}
