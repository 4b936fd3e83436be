mod ids;
mod quiz;
mod score;
mod stats;
mod subject;
mod user;

pub use ids::{ChapterId, OptionId, ParseIdError, QuestionId, QuizId, ScoreId, SubjectId, UserId};

pub use quiz::{NewOption, NewQuestion, NewQuiz, Question, Quiz, QuizError, QuizOption, QuizSubmission};
pub use score::Score;
pub use stats::Stats;
pub use subject::{Chapter, NewChapter, NewSubject, Subject, SubjectError};
pub use user::{AccountError, Credentials, CurrentUser, Qualification, Registration};
