use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use quiz_core::model::{
    Chapter, ChapterId, Credentials, CurrentUser, NewQuiz, NewSubject, OptionId, Question,
    QuestionId, Quiz, QuizId, QuizOption, QuizSubmission, Registration, Score, ScoreId, Stats,
    Subject, SubjectId, UserId,
};
use reqwest::StatusCode;

use crate::contract::QuizApi;
use crate::credential::{SESSION_COOKIE, SessionCredential};
use crate::error::ApiError;
use crate::route::Route;

/// In-memory quiz server for tests and prototyping.
///
/// Mirrors the real server's observable behavior closely enough to drive the
/// client end to end: cookie sessions, admin-only stats, server-assigned ids,
/// cascading subject deletes and graded submissions. Every route it serves is
/// recorded, and individual routes can be made to fail.
#[derive(Clone, Default)]
pub struct InMemoryQuizApi {
    state: Arc<Mutex<ServerState>>,
}

#[derive(Default)]
struct ServerState {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    subjects: Vec<Subject>,
    quizzes: Vec<StoredQuiz>,
    scores: Vec<(String, Score, QuizId)>,
    user_stats: Stats,
    admin_stats: Stats,
    next_id: u64,
    calls: Vec<Route>,
    failures: Vec<Route>,
}

struct Account {
    password: String,
    user: CurrentUser,
}

struct StoredQuiz {
    quiz: Quiz,
    subject: SubjectId,
    answers: HashMap<QuestionId, OptionId>,
}

impl ServerState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Record the call, then apply any injected failure for it.
    fn serve(&mut self, route: Route) -> Result<(), ApiError> {
        self.calls.push(route);
        if self.failures.contains(&route) {
            return Err(refuse(route, StatusCode::SERVICE_UNAVAILABLE, "injected failure"));
        }
        Ok(())
    }

    fn authenticate(
        &self,
        route: Route,
        session: Option<&SessionCredential>,
    ) -> Result<&Account, ApiError> {
        session
            .and_then(|credential| credential.get(SESSION_COOKIE))
            .and_then(|token| self.sessions.get(token))
            .and_then(|email| self.accounts.get(email))
            .ok_or_else(|| refuse(route, StatusCode::UNAUTHORIZED, "Missing cookie"))
    }

    fn email_of(&self, session: Option<&SessionCredential>) -> Option<String> {
        session
            .and_then(|credential| credential.get(SESSION_COOKIE))
            .and_then(|token| self.sessions.get(token))
            .cloned()
    }
}

fn refuse(route: Route, status: StatusCode, body: &str) -> ApiError {
    ApiError::Status {
        route: route.name(),
        status,
        body: body.to_owned(),
    }
}

impl InMemoryQuizApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an account directly, bypassing `register`.
    pub fn add_account(&self, email: &str, password: &str, user: CurrentUser) {
        let mut state = self.lock();
        let user = if user.id.is_some() {
            user
        } else {
            let id = state.next_id();
            user.with_id(UserId::new(id))
        };
        state.accounts.insert(
            email.to_owned(),
            Account {
                password: password.to_owned(),
                user,
            },
        );
    }

    pub fn set_user_stats(&self, stats: Stats) {
        self.lock().user_stats = stats;
    }

    pub fn set_admin_stats(&self, stats: Stats) {
        self.lock().admin_stats = stats;
    }

    /// Make every later call to `route` fail with 503.
    pub fn fail_on(&self, route: Route) {
        self.lock().failures.push(route);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Every route served so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<Route> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, route: Route) -> usize {
        self.lock().calls.iter().filter(|r| **r == route).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current server-side subjects, bypassing the call log.
    #[must_use]
    pub fn stored_subjects(&self) -> Vec<Subject> {
        self.lock().subjects.clone()
    }

    /// Scores recorded for `email`, bypassing the call log.
    #[must_use]
    pub fn stored_scores(&self, email: &str) -> Vec<Score> {
        self.lock()
            .scores
            .iter()
            .filter(|(owner, _, _)| owner == email)
            .map(|(_, score, _)| score.clone())
            .collect()
    }
}

#[async_trait]
impl QuizApi for InMemoryQuizApi {
    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let route = Route::Register;
        let mut state = self.lock();
        state.serve(route)?;
        if state.accounts.contains_key(registration.email()) {
            return Err(refuse(route, StatusCode::BAD_REQUEST, "user already exists"));
        }
        let id = state.next_id();
        let user = CurrentUser::new(registration.name(), false).with_id(UserId::new(id));
        let password = registration.credentials().password().to_owned();
        state
            .accounts
            .insert(registration.email().to_owned(), Account { password, user });
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<SessionCredential, ApiError> {
        let route = Route::Login;
        let mut state = self.lock();
        state.serve(route)?;
        let account = state
            .accounts
            .get(credentials.email())
            .ok_or_else(|| refuse(route, StatusCode::NOT_FOUND, "failed to login user"))?;
        if account.password != credentials.password() {
            return Err(refuse(route, StatusCode::UNAUTHORIZED, "invalid credentials"));
        }
        let token = format!("token-{}", state.next_id());
        state
            .sessions
            .insert(token.clone(), credentials.email().to_owned());
        Ok(SessionCredential::new(SESSION_COOKIE, token))
    }

    async fn logout(&self, session: Option<&SessionCredential>) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.serve(Route::Logout)?;
        if let Some(token) = session.and_then(|credential| credential.get(SESSION_COOKIE)) {
            state.sessions.remove(token);
        }
        Ok(())
    }

    async fn current_user(
        &self,
        session: Option<&SessionCredential>,
    ) -> Result<CurrentUser, ApiError> {
        let route = Route::CurrentUser;
        let mut state = self.lock();
        state.serve(route)?;
        Ok(state.authenticate(route, session)?.user.clone())
    }

    async fn subjects(&self, session: Option<&SessionCredential>) -> Result<Vec<Subject>, ApiError> {
        let route = Route::Subjects;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        Ok(state.subjects.clone())
    }

    async fn quizzes(&self, session: Option<&SessionCredential>) -> Result<Vec<Quiz>, ApiError> {
        let route = Route::Quizzes;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        let email = state.email_of(session).unwrap_or_default();
        let listing = state
            .quizzes
            .iter()
            .map(|stored| {
                let mut quiz = stored.quiz.clone();
                quiz.done = state
                    .scores
                    .iter()
                    .any(|(owner, _, id)| *owner == email && *id == quiz.id);
                quiz
            })
            .collect();
        Ok(listing)
    }

    async fn scores(&self, session: Option<&SessionCredential>) -> Result<Vec<Score>, ApiError> {
        let route = Route::Scores;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        let email = state.email_of(session).unwrap_or_default();
        Ok(state
            .scores
            .iter()
            .filter(|(owner, _, _)| *owner == email)
            .map(|(_, score, _)| score.clone())
            .collect())
    }

    async fn user_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError> {
        let route = Route::UserStats;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        Ok(state.user_stats.clone())
    }

    async fn admin_stats(&self, session: Option<&SessionCredential>) -> Result<Stats, ApiError> {
        let route = Route::AdminStats;
        let mut state = self.lock();
        state.serve(route)?;
        if !state.authenticate(route, session)?.user.is_admin {
            return Err(refuse(route, StatusCode::FORBIDDEN, "admin only"));
        }
        Ok(state.admin_stats.clone())
    }

    async fn create_subject(
        &self,
        session: Option<&SessionCredential>,
        subject: &NewSubject,
    ) -> Result<(), ApiError> {
        let route = Route::CreateSubject;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        if state.subjects.iter().any(|s| s.name == subject.name()) {
            return Err(refuse(route, StatusCode::BAD_REQUEST, "subject already exists"));
        }
        let id = SubjectId::new(state.next_id());
        let chapters = subject
            .chapters()
            .iter()
            .map(|chapter| Chapter {
                id: ChapterId::new(state.next_id()),
                name: chapter.name.clone(),
                description: chapter.description.clone(),
            })
            .collect();
        state.subjects.push(Subject {
            id,
            name: subject.name().to_owned(),
            description: subject.description().to_owned(),
            chapters,
        });
        Ok(())
    }

    async fn create_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: &NewQuiz,
    ) -> Result<(), ApiError> {
        let route = Route::CreateQuiz;
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        let (subject_name, chapter_name) = {
            let subject = state
                .subjects
                .iter()
                .find(|s| s.id == quiz.subject())
                .ok_or_else(|| refuse(route, StatusCode::INTERNAL_SERVER_ERROR, "failed to create quiz"))?;
            let chapter = subject
                .chapter(quiz.chapter())
                .ok_or_else(|| refuse(route, StatusCode::INTERNAL_SERVER_ERROR, "failed to create quiz"))?;
            (subject.name.clone(), chapter.name.clone())
        };

        let id = QuizId::new(state.next_id());
        let mut answers = HashMap::new();
        let mut questions = Vec::with_capacity(quiz.questions().len());
        for draft in quiz.questions() {
            let question_id = QuestionId::new(state.next_id());
            let options: Vec<QuizOption> = draft
                .options()
                .iter()
                .map(|option| QuizOption {
                    id: OptionId::new(state.next_id()),
                    statement: option.statement.clone(),
                })
                .collect();
            if let Some(correct) = options.get(draft.answer()) {
                answers.insert(question_id, correct.id);
            }
            questions.push(Question {
                id: question_id,
                statement: draft.statement().to_owned(),
                options,
            });
        }

        state.quizzes.push(StoredQuiz {
            quiz: Quiz {
                id,
                name: quiz.name().to_owned(),
                remarks: quiz.remarks().to_owned(),
                subject: subject_name,
                chapter: chapter_name,
                hours: quiz.hours(),
                minutes: quiz.minutes(),
                date_of_quiz: Some(quiz.date_of_quiz()),
                questions,
                done: false,
            },
            subject: quiz.subject(),
            answers,
        });
        Ok(())
    }

    async fn delete_subject(
        &self,
        session: Option<&SessionCredential>,
        id: SubjectId,
    ) -> Result<(), ApiError> {
        let route = Route::DeleteSubject(id);
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        state.subjects.retain(|s| s.id != id);
        state.quizzes.retain(|q| q.subject != id);
        Ok(())
    }

    async fn delete_quiz(
        &self,
        session: Option<&SessionCredential>,
        id: QuizId,
    ) -> Result<(), ApiError> {
        let route = Route::DeleteQuiz(id);
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        let before = state.quizzes.len();
        state.quizzes.retain(|q| q.quiz.id != id);
        if state.quizzes.len() == before {
            return Err(refuse(route, StatusCode::NOT_FOUND, "quiz not found"));
        }
        Ok(())
    }

    async fn submit_quiz(
        &self,
        session: Option<&SessionCredential>,
        quiz: QuizId,
        submission: &QuizSubmission,
    ) -> Result<(), ApiError> {
        let route = Route::SubmitQuiz(quiz);
        let mut state = self.lock();
        state.serve(route)?;
        state.authenticate(route, session)?;
        let email = state.email_of(session).unwrap_or_default();
        let stored = state
            .quizzes
            .iter()
            .find(|stored| stored.quiz.id == quiz)
            .ok_or_else(|| ApiError::Rejected {
                route: route.name(),
                code: 500,
                message: "unknown error: quiz not found".to_owned(),
            })?;
        let correct = stored
            .answers
            .iter()
            .filter(|(question, option)| submission.selected().get(question) == Some(option))
            .count();
        let total = stored.quiz.questions.len();
        let (date_of_quiz, subject_id) = (stored.quiz.date_of_quiz, stored.subject);
        let score = Score {
            id: ScoreId::new(state.next_id()),
            total: u32::try_from(total).unwrap_or(u32::MAX),
            correct: u32::try_from(correct).unwrap_or(u32::MAX),
            date_of_quiz,
            subject_id,
        };
        state.scores.push((email, score, quiz));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{NewChapter, NewQuestion};
    use quiz_core::time::fixed_date;

    async fn logged_in(api: &InMemoryQuizApi, admin: bool) -> SessionCredential {
        api.add_account("a@b.c", "pw", CurrentUser::new("a", admin));
        api.login(&Credentials::new("a@b.c", "pw").unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn credentialed_routes_require_a_session() {
        let api = InMemoryQuizApi::new();
        let err = api.quizzes(None).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.calls(), vec![Route::Quizzes]);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let api = InMemoryQuizApi::new();
        api.add_account("a@b.c", "pw", CurrentUser::new("a", false));
        let err = api
            .login(&Credentials::new("a@b.c", "nope").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn admin_stats_are_admin_only() {
        let api = InMemoryQuizApi::new();
        let session = logged_in(&api, false).await;
        let err = api.admin_stats(Some(&session)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn submission_is_graded_against_the_answer_key() {
        let api = InMemoryQuizApi::new();
        let session = logged_in(&api, true).await;
        let subject = NewSubject::new("Math", "", vec![NewChapter::new("Algebra", "")]).unwrap();
        api.create_subject(Some(&session), &subject).await.unwrap();
        let stored = api.subjects(Some(&session)).await.unwrap();
        let chapter = stored[0].chapters[0].id;

        let quiz = NewQuiz::new(
            "Week 1",
            stored[0].id,
            chapter,
            fixed_date(),
            vec![
                NewQuestion::new("1 + 1?", ["2", "3"], 0).unwrap(),
                NewQuestion::new("2 + 2?", ["3", "4"], 1).unwrap(),
            ],
        )
        .unwrap();
        api.create_quiz(Some(&session), &quiz).await.unwrap();
        let listed = api.quizzes(Some(&session)).await.unwrap();
        let q = &listed[0];

        let submission = QuizSubmission::new()
            .select(q.questions[0].id, q.questions[0].options[0].id)
            .select(q.questions[1].id, q.questions[1].options[0].id);
        api.submit_quiz(Some(&session), q.id, &submission)
            .await
            .unwrap();

        let scores = api.stored_scores("a@b.c");
        assert_eq!(scores.len(), 1);
        assert_eq!((scores[0].correct, scores[0].total), (1, 2));
        assert!(api.quizzes(Some(&session)).await.unwrap()[0].done);
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_calls() {
        let api = InMemoryQuizApi::new();
        let session = logged_in(&api, false).await;
        api.fail_on(Route::Scores);
        let err = api.scores(Some(&session)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(api.call_count(Route::Scores), 1);

        api.clear_failures();
        assert!(api.scores(Some(&session)).await.unwrap().is_empty());
    }
}
