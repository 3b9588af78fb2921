mod assessment_vm;
mod result_vm;

pub use assessment_vm::{
    AssessmentView, ConfirmPrompt, OptionView, PrimaryAction, QuestionView, URGENT_BELOW_SECONDS,
    load_error_message,
};
pub use result_vm::ResultView;
