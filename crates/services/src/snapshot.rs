use quiz_api::SessionCredential;
use quiz_core::model::{CurrentUser, Quiz, QuizId, Score, Stats, Subject};

/// Who is logged in, as far as this client knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<CurrentUser>,
    authenticated: bool,
    credential: Option<SessionCredential>,
}

impl Session {
    #[must_use]
    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn credential(&self) -> Option<&SessionCredential> {
        self.credential.as_ref()
    }

    /// Admin flag of the logged-in user; `None` when nobody is logged in.
    #[must_use]
    pub fn is_admin(&self) -> Option<bool> {
        self.user.as_ref().map(|user| user.is_admin)
    }
}

/// Everything the client mirrors from the server.
///
/// Every list is either empty or the complete server listing from the most
/// recent successful fetch. Fields are only written through `ClientStore`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    session: Session,
    quizzes: Vec<Quiz>,
    subjects: Vec<Subject>,
    scores: Vec<Score>,
    stats: Option<Stats>,
    active_quiz: Option<QuizId>,
    navbar_hidden: bool,
}

impl Snapshot {
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn quizzes(&self) -> &[Quiz] {
        &self.quizzes
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    #[must_use]
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn active_quiz(&self) -> Option<QuizId> {
        self.active_quiz
    }

    #[must_use]
    pub fn navbar_hidden(&self) -> bool {
        self.navbar_hidden
    }

    pub(crate) fn authenticate(&mut self, user: CurrentUser, credential: SessionCredential) {
        self.session = Session {
            user: Some(user),
            authenticated: true,
            credential: Some(credential),
        };
    }

    /// Drops the user and credential. The authenticated flag is untouched.
    pub(crate) fn forget_user(&mut self) {
        self.session.user = None;
        self.session.credential = None;
    }

    pub(crate) fn clear_session(&mut self) {
        self.session = Session::default();
    }

    pub(crate) fn set_quizzes(&mut self, quizzes: Vec<Quiz>) {
        self.quizzes = quizzes;
    }

    pub(crate) fn set_subjects(&mut self, subjects: Vec<Subject>) {
        self.subjects = subjects;
    }

    pub(crate) fn set_scores(&mut self, scores: Vec<Score>) {
        self.scores = scores;
    }

    pub(crate) fn set_stats(&mut self, stats: Stats) {
        self.stats = Some(stats);
    }

    pub(crate) fn set_active_quiz(&mut self, quiz: Option<QuizId>) {
        self.active_quiz = quiz;
    }

    pub(crate) fn set_navbar_hidden(&mut self, hidden: bool) {
        self.navbar_hidden = hidden;
    }
}
