use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_api::{ApiConfig, ApiError, HttpQuizApi, QuizApi, SessionCredential};
use quiz_core::model::{
    Credentials, CurrentUser, NewQuiz, NewSubject, Quiz, QuizId, QuizSubmission, Registration,
    Score, Stats, Subject, SubjectId,
};
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Client-side mirror of the quiz server's state.
///
/// Each operation performs its round trips against `QuizApi` and then
/// replaces the matching part of the snapshot. The snapshot lock is only
/// taken between awaits, so concurrent operations interleave and the last
/// response to arrive wins. Failures are logged and returned; they never
/// touch the snapshot.
pub struct ClientStore {
    api: Arc<dyn QuizApi>,
    snapshot: Mutex<Snapshot>,
}

fn failed(action: &'static str) -> impl FnOnce(ApiError) -> StoreError {
    move |err| {
        error!(action, error = %err, "request failed");
        StoreError::Api(err)
    }
}

fn resync(err: StoreError) -> StoreError {
    StoreError::Resync(Box::new(err))
}

impl ClientStore {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self {
            api,
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    /// Build a store talking HTTP to the configured server.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn http(config: ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(HttpQuizApi::new(config)?)))
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_snapshot<R>(&self, read: impl FnOnce(&Snapshot) -> R) -> R {
        read(&self.lock())
    }

    fn credential(&self) -> Option<SessionCredential> {
        self.lock().session().credential().cloned()
    }

    /// Credential of the logged-in user, or `LoginRequired` without a request.
    fn require_user(&self, action: &'static str) -> Result<SessionCredential, StoreError> {
        let snapshot = self.lock();
        let session = snapshot.session();
        match (session.user(), session.credential()) {
            (Some(_), Some(credential)) => Ok(credential.clone()),
            _ => {
                warn!(action, "user login required");
                Err(StoreError::LoginRequired)
            }
        }
    }

    //
    // ─── SESSION ───────────────────────────────────────────────────────────────
    //

    /// Create an account. The snapshot is not touched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the server refuses the registration.
    pub async fn register(&self, registration: &Registration) -> Result<(), StoreError> {
        self.api
            .register(registration)
            .await
            .map_err(failed("register"))?;
        info!(email = registration.email(), "account registered");
        Ok(())
    }

    /// Log in, then fetch the current user with the new credential.
    ///
    /// The session is replaced only once both round trips succeed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if either round trip fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser, StoreError> {
        let credential = self.api.login(credentials).await.map_err(failed("login"))?;
        let user = self
            .api
            .current_user(Some(&credential))
            .await
            .map_err(failed("fetch current user"))?;
        self.lock().authenticate(user.clone(), credential);
        info!(user = %user.name, admin = user.is_admin, "logged in");
        Ok(user)
    }

    /// Forget the current user locally. No request is made and the
    /// authenticated flag keeps its value.
    pub fn logout(&self) {
        self.lock().forget_user();
        debug!("user cleared from session");
    }

    /// Ask the server to end the session, then clear the local session
    /// entirely. Local state is cleared even when the request fails.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the logout request fails.
    pub async fn end_session(&self) -> Result<(), StoreError> {
        let credential = self.credential();
        let result = self.api.logout(credential.as_ref()).await;
        self.lock().clear_session();
        result.map_err(failed("logout"))?;
        info!("session ended");
        Ok(())
    }

    //
    // ─── LISTINGS ──────────────────────────────────────────────────────────────
    //

    /// Replace the subject list with the server's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LoginRequired` without a request when nobody is
    /// logged in, or `StoreError::Api` if the fetch fails.
    pub async fn fetch_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let credential = self.require_user("fetch subjects")?;
        let subjects = self
            .api
            .subjects(Some(&credential))
            .await
            .map_err(failed("fetch subjects"))?;
        self.lock().set_subjects(subjects.clone());
        Ok(subjects)
    }

    /// Replace the quiz list with the server's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LoginRequired` without a request when nobody is
    /// logged in, or `StoreError::Api` if the fetch fails.
    pub async fn fetch_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let credential = self.require_user("fetch quizzes")?;
        let quizzes = self
            .api
            .quizzes(Some(&credential))
            .await
            .map_err(failed("fetch quizzes"))?;
        self.lock().set_quizzes(quizzes.clone());
        Ok(quizzes)
    }

    /// Replace the score list with the server's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LoginRequired` without a request when nobody is
    /// logged in, or `StoreError::Api` if the fetch fails.
    pub async fn fetch_scores(&self) -> Result<Vec<Score>, StoreError> {
        let credential = self.require_user("fetch scores")?;
        let scores = self
            .api
            .scores(Some(&credential))
            .await
            .map_err(failed("fetch scores"))?;
        self.lock().set_scores(scores.clone());
        Ok(scores)
    }

    /// Replace stats with the current user's statistics.
    ///
    /// Not guarded: the request goes out even without a session and the
    /// server decides.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails.
    pub async fn fetch_user_stats(&self) -> Result<Stats, StoreError> {
        let credential = self.credential();
        let stats = self
            .api
            .user_stats(credential.as_ref())
            .await
            .map_err(failed("fetch user stats"))?;
        self.lock().set_stats(stats.clone());
        Ok(stats)
    }

    /// Replace stats with the site-wide statistics, for admins only.
    ///
    /// Returns `Ok(None)` without a request when the user is not an admin.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LoginRequired` when nobody is logged in, or
    /// `StoreError::Api` if the fetch fails.
    pub async fn fetch_admin_stats(&self) -> Result<Option<Stats>, StoreError> {
        let (is_admin, credential) = {
            let snapshot = self.lock();
            let session = snapshot.session();
            (session.is_admin(), session.credential().cloned())
        };
        match is_admin {
            None => {
                warn!(action = "fetch admin stats", "user login required");
                Err(StoreError::LoginRequired)
            }
            Some(false) => {
                debug!("admin stats skipped for non-admin user");
                Ok(None)
            }
            Some(true) => {
                let stats = self
                    .api
                    .admin_stats(credential.as_ref())
                    .await
                    .map_err(failed("fetch admin stats"))?;
                self.lock().set_stats(stats.clone());
                Ok(Some(stats))
            }
        }
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Create a subject, then refetch subjects to pick up server-assigned ids.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if creation fails (no refetch is made), or
    /// `StoreError::Resync` if creation succeeded but the refetch did not.
    pub async fn create_subject(&self, subject: &NewSubject) -> Result<Vec<Subject>, StoreError> {
        let credential = self.credential();
        self.api
            .create_subject(credential.as_ref(), subject)
            .await
            .map_err(failed("create subject"))?;
        info!(name = subject.name(), "subject created");
        self.fetch_subjects().await.map_err(resync)
    }

    /// Create a quiz, then refetch quizzes to pick up server-assigned ids.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if creation fails (no refetch is made), or
    /// `StoreError::Resync` if creation succeeded but the refetch did not.
    pub async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Vec<Quiz>, StoreError> {
        let credential = self.credential();
        self.api
            .create_quiz(credential.as_ref(), quiz)
            .await
            .map_err(failed("create quiz"))?;
        info!(name = quiz.name(), "quiz created");
        self.fetch_quizzes().await.map_err(resync)
    }

    /// Delete a subject, then refetch subjects.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the delete fails (no refetch is made), or
    /// `StoreError::Resync` if the delete succeeded but the refetch did not.
    pub async fn delete_subject(&self, id: SubjectId) -> Result<Vec<Subject>, StoreError> {
        let credential = self.credential();
        self.api
            .delete_subject(credential.as_ref(), id)
            .await
            .map_err(failed("delete subject"))?;
        info!(subject = %id, "subject deleted");
        self.fetch_subjects().await.map_err(resync)
    }

    /// Delete a quiz, then refetch quizzes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the delete fails (no refetch is made), or
    /// `StoreError::Resync` if the delete succeeded but the refetch did not.
    pub async fn delete_quiz(&self, id: QuizId) -> Result<Vec<Quiz>, StoreError> {
        let credential = self.credential();
        self.api
            .delete_quiz(credential.as_ref(), id)
            .await
            .map_err(failed("delete quiz"))?;
        info!(quiz = %id, "quiz deleted");
        self.fetch_quizzes().await.map_err(resync)
    }

    //
    // ─── QUIZ ATTEMPT ──────────────────────────────────────────────────────────
    //

    /// Mark `quiz` as the one being taken. Purely local.
    pub fn start_quiz(&self, quiz: QuizId) {
        self.lock().set_active_quiz(Some(quiz));
        debug!(quiz = %quiz, "quiz started");
    }

    /// Submit answers for the active quiz and clear it, whatever the outcome.
    ///
    /// Returns the id the answers were submitted for.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoActiveQuiz` without a request when no quiz was
    /// started, or `StoreError::Api` if the submission fails.
    pub async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizId, StoreError> {
        let (active, credential) = {
            let snapshot = self.lock();
            (
                snapshot.active_quiz(),
                snapshot.session().credential().cloned(),
            )
        };
        let Some(quiz) = active else {
            warn!("submit requested with no quiz in progress");
            return Err(StoreError::NoActiveQuiz);
        };
        let result = self
            .api
            .submit_quiz(credential.as_ref(), quiz, submission)
            .await;
        self.lock().set_active_quiz(None);
        result.map_err(failed("submit quiz"))?;
        info!(quiz = %quiz, answers = submission.selected().len(), "quiz submitted");
        Ok(quiz)
    }

    /// Toggle the navigation bar, e.g. while a quiz is full screen.
    pub fn set_navbar_hidden(&self, hidden: bool) {
        self.lock().set_navbar_hidden(hidden);
    }
}
