//! Offline sample used by `take --demo`.

use std::collections::HashMap;

use edusync_core::model::{
    AnswerOption, Assessment, AssessmentError, AssessmentId, CourseId, OptionId, Question,
    QuestionId,
};
use gateway::InMemoryGateway;

struct SampleQuestion {
    text: &'static str,
    options: [&'static str; 4],
    correct: usize,
}

const SAMPLE: [SampleQuestion; 5] = [
    SampleQuestion {
        text: "What does HTML stand for?",
        options: [
            "Hyper Text Markup Language",
            "High Tech Multi Language",
            "Hyper Transfer Markup Language",
            "Hyper Text Multiple Language",
        ],
        correct: 0,
    },
    SampleQuestion {
        text: "Which language is used to style web pages?",
        options: ["HTML", "JavaScript", "CSS", "XML"],
        correct: 2,
    },
    SampleQuestion {
        text: "Which of these is NOT a JavaScript framework or library?",
        options: ["React", "Angular", "Vue", "Pascal"],
        correct: 3,
    },
    SampleQuestion {
        text: "Which HTML element renders the largest heading?",
        options: ["<heading>", "<h1>", "<h6>", "<head>"],
        correct: 1,
    },
    SampleQuestion {
        text: "Which CSS property changes the background color?",
        options: ["color", "bgcolor", "background-color", "background"],
        correct: 2,
    },
];

/// Build the sample assessment under `id` along with its answer key.
fn sample(
    id: AssessmentId,
    time_limit_minutes: Option<u32>,
) -> Result<(Assessment, HashMap<QuestionId, OptionId>), AssessmentError> {
    let mut key = HashMap::new();
    let mut questions = Vec::with_capacity(SAMPLE.len());
    let mut next_option = 1_u64;

    for (n, sample) in (1_u64..).zip(SAMPLE.iter()) {
        let question_id = QuestionId::new(n);
        let mut options = Vec::with_capacity(sample.options.len());
        for (i, text) in sample.options.iter().enumerate() {
            let option_id = OptionId::new(next_option);
            next_option += 1;
            if i == sample.correct {
                key.insert(question_id.clone(), option_id.clone());
            }
            options.push(AnswerOption::new(option_id, *text));
        }
        questions.push(Question::new(question_id, sample.text, options)?);
    }

    let assessment = Assessment::new(id, "Web Development Fundamentals Quiz", questions)?
        .with_description(Some("Check your grasp of web development basics.".to_owned()))
        .with_course(
            Some(CourseId::new(1)),
            Some("Introduction to Web Development".to_owned()),
        )
        .with_time_limit_minutes(time_limit_minutes);
    Ok((assessment, key))
}

/// In-memory gateway seeded with the sample assessment.
///
/// # Errors
///
/// Returns `AssessmentError` if the sample data is inconsistent.
pub fn gateway(
    id: AssessmentId,
    time_limit_minutes: Option<u32>,
) -> Result<InMemoryGateway, AssessmentError> {
    let (assessment, key) = sample(id.clone(), time_limit_minutes)?;
    let gateway = InMemoryGateway::new().with_assessment(assessment);
    gateway.set_answer_key(id, key);
    Ok(gateway)
}
