mod answers;
mod assessment;
mod ids;
mod result;

pub use answers::{AnswerMap, SubmittedAnswer};
pub use assessment::{
    AnswerOption, Assessment, AssessmentError, DEFAULT_TIME_LIMIT_MINUTES, Question,
};
pub use ids::{AssessmentId, CourseId, OptionId, QuestionId, RawId};
pub use result::AssessmentResult;
