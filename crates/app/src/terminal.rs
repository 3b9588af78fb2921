//! Plain-text rendering of assessment views and parsing of typed commands.

use std::fmt::Write as _;

use services::SubmitTrigger;
use ui::vm::{AssessmentView, PrimaryAction, QuestionView, ResultView};

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// One-based option number on the current question.
    Choose(usize),
    Next,
    Previous,
    /// One-based question number.
    GoTo(usize),
    Submit,
    Confirm,
    Decline,
    Quit,
    Help,
}

impl Input {
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let head = words.next()?.to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return None;
        }

        match (head.as_str(), arg) {
            ("n" | "next", None) => Some(Input::Next),
            ("p" | "prev" | "previous", None) => Some(Input::Previous),
            ("g" | "go", Some(n)) => n.parse().ok().filter(|n| *n > 0).map(Input::GoTo),
            ("s" | "submit", None) => Some(Input::Submit),
            ("y" | "yes", None) => Some(Input::Confirm),
            ("c" | "cancel" | "no", None) => Some(Input::Decline),
            ("q" | "quit", None) => Some(Input::Quit),
            ("h" | "help" | "?", None) => Some(Input::Help),
            (number, None) => number.parse().ok().filter(|n| *n > 0).map(Input::Choose),
            _ => None,
        }
    }
}

pub const HELP: &str = "\
commands:
  <number>   choose an option
  n          next question
  p          previous question
  g <number> go to a question
  s          submit (asks for confirmation)
  q          leave without submitting";

/// Whether the screen offers submission right now.
#[must_use]
pub fn can_submit(view: &QuestionView) -> bool {
    matches!(view.primary, PrimaryAction::Submit { enabled: true }) || view.finish_early == Some(true)
}

/// Identity of a view for redraw purposes; countdown ticks alone don't count.
#[must_use]
pub fn redraw_key(view: &AssessmentView) -> AssessmentView {
    match view {
        AssessmentView::Taking(question) => AssessmentView::Taking(QuestionView {
            countdown: String::new(),
            urgent: false,
            ..question.clone()
        }),
        other => other.clone(),
    }
}

#[must_use]
pub fn render(view: &AssessmentView) -> String {
    match view {
        AssessmentView::Loading => "Loading assessment...".to_owned(),
        AssessmentView::Failed { message } => format!("Error: {message}"),
        AssessmentView::Taking(question) => render_question(question),
        AssessmentView::Submitting { trigger } => match trigger {
            SubmitTrigger::Manual => "Submitting your answers...".to_owned(),
            SubmitTrigger::TimeExpired => "Time is up. Submitting your answers...".to_owned(),
        },
        AssessmentView::Completed(result) => render_result(result),
    }
}

fn render_question(view: &QuestionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} [{}]", view.title, view.countdown);
    let _ = writeln!(
        out,
        "{} ({})  {}",
        view.position_label, view.progress_label, view.answered_label
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", view.text);
    for (n, option) in (1..).zip(&view.options) {
        let mark = if option.selected { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {n}. {}", option.text);
    }
    let _ = writeln!(out);

    let mut actions = Vec::new();
    if view.can_go_previous {
        actions.push("p: previous".to_owned());
    }
    let state = if view.primary.enabled() { "" } else { " (answer first)" };
    let key = match view.primary {
        PrimaryAction::Next { .. } => "n",
        PrimaryAction::Submit { .. } => "s",
    };
    actions.push(format!("{key}: {}{state}", view.primary.label()));
    if let Some(enabled) = view.finish_early {
        let state = if enabled { "" } else { " (answer all first)" };
        actions.push(format!("s: Finish Early{state}"));
    }
    let _ = write!(out, "{}", actions.join("  |  "));
    if let Some(course) = &view.course_title {
        let _ = write!(out, "\nCourse: {course}");
    }
    out
}

fn render_result(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Assessment Completed: {}", view.title);
    if view.timed_out {
        let _ = writeln!(out, "Time ran out and your answers were submitted automatically.");
    }
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {notice}");
    }
    if let Some(score) = &view.score_label {
        let _ = writeln!(out, "Your score: {score}");
    }
    if let Some(summary) = &view.summary {
        let _ = writeln!(out, "{summary}");
    }
    if let Some(feedback) = &view.feedback {
        let _ = writeln!(out, "Feedback: {feedback}");
    }
    if let Some(course) = &view.return_to {
        let _ = write!(out, "Return to course {course}");
    }
    out.trim_end().to_owned()
}
