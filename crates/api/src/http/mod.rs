use async_trait::async_trait;
use quiz_core::model::{
    Credentials, CurrentUser, NewQuiz, NewSubject, Quiz, QuizId, QuizSubmission, Registration,
    Score, Stats, Subject, SubjectId,
};
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::contract::QuizApi;
use crate::credential::SessionCredential;
use crate::error::ApiError;
use crate::route::Route;

mod envelope;

use envelope::{CurrentUserEnvelope, QuizzesEnvelope, ScoresEnvelope, SubjectsEnvelope, SubmitReply};

/// `QuizApi` over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: ApiConfig,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, route: Route, session: Option<&SessionCredential>) -> RequestBuilder {
        let builder = self
            .client
            .request(route.method(), self.config.endpoint(&route));
        match session {
            Some(credential) if route.sends_credential() => {
                builder.header(COOKIE, credential.header_value())
            }
            _ => builder,
        }
    }

    /// Send and reject any non-2xx reply.
    async fn execute(&self, route: Route, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.inspect_err(|err| {
            warn!(route = %route, error = %err, "request failed before a response arrived");
        })?;
        let status = response.status();
        debug!(route = %route, %status, "api round trip");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                route: route.name(),
                status,
                body,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        route: Route,
        session: Option<&SessionCredential>,
    ) -> Result<T, ApiError> {
        let response = self.execute(route, self.request(route, session)).await?;
        decode(route, &response.text().await?)
    }

    async fn send_json<B: Serialize + ?Sized + Sync>(
        &self,
        route: Route,
        session: Option<&SessionCredential>,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.execute(route, self.request(route, session).json(body))
            .await
    }
}

fn decode<T: DeserializeOwned>(route: Route, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        route: route.name(),
        source,
    })
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.send_json(Route::Register, None, registration).await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<SessionCredential, ApiError> {
        let response = self.send_json(Route::Login, None, credentials).await?;
        let issued = response
            .cookies()
            .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()));
        SessionCredential::from_pairs(issued).ok_or(ApiError::MissingCredential)
    }

    async fn logout(&self, session: Option<&SessionCredential>) -> Result<(), ApiError> {
        self.execute(Route::Logout, self.request(Route::Logout, session))
            .await?;
        Ok(())
    }

    async fn current_user(
        &self,
        session: Option<&SessionCredential>,
    ) -> Result<CurrentUser, ApiError> {
        let envelope: CurrentUserEnvelope = self.fetch(Route::CurrentUser, session).await?;
        Ok(envelope.current_user)
    }

    async fn subjects(&self, session: Option<&SessionCredential>) -> Result<Vec<Subject>, ApiError> {
        let envelope: SubjectsEnvelope = self.fetch(Route::Subjects, session).await?;
        Ok(envelope.subjects)
    }

    async fn quizzes(&self, session: Option<&SessionCredential>) -> Result<Vec<Quiz>, ApiError> {
        let envelope: QuizzesEnvelope = self.fetch(Route::Quizzes, session).await?;
        Ok(envelope.quizzes)
    }

    async fn scores(&self, session: Option<&SessionCredential>) -> Result<Vec<Score>, ApiError> {
        let envelope: ScoresEnvelope = self.fetch(Route::Scores, session).await?;
        Ok(envelope.scores)
    }

    async fn user_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError> {
        self.fetch(Route::UserStats, session).await
    }

    async fn admin_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError> {
        self.fetch(Route::AdminStats, session).await
    }

    async fn create_subject(
        &self,
        session: Option<&SessionCredential>,
        subject: &NewSubject,
    ) -> Result<(), ApiError> {
        self.send_json(Route::CreateSubject, session, subject)
            .await?;
        Ok(())
    }

    async fn create_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: &NewQuiz,
    ) -> Result<(), ApiError> {
        self.send_json(Route::CreateQuiz, session, quiz).await?;
        Ok(())
    }

    async fn delete_subject(
        &self,
        session: Option<&SessionCredential>,
        id: SubjectId,
    ) -> Result<(), ApiError> {
        let route = Route::DeleteSubject(id);
        self.execute(route, self.request(route, session)).await?;
        Ok(())
    }

    async fn delete_quiz(
        &self,
        session: Option<&SessionCredential>,
        id: QuizId,
    ) -> Result<(), ApiError> {
        let route = Route::DeleteQuiz(id);
        self.execute(route, self.request(route, session)).await?;
        Ok(())
    }

    async fn submit_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: QuizId,
        submission: &QuizSubmission,
    ) -> Result<(), ApiError> {
        let route = Route::SubmitQuiz(quiz);
        let response = self.send_json(route, session, submission).await?;
        let body = response.text().await?;
        // Non-JSON bodies carry no error code.
        let reply: SubmitReply = serde_json::from_str(&body).unwrap_or_default();
        match reply.failure_code() {
            Some(code) => Err(ApiError::Rejected {
                route: route.name(),
                code,
                message: reply.message,
            }),
            None => Ok(()),
        }
    }
}
