use serde::{Deserialize, Serialize};

use crate::model::{OptionId, Question, QuestionId};

/// One answered question, in the shape the results endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_option_id: OptionId,
}

/// Selected option per question index.
///
/// The index set is fixed at construction and always equals `0..len`; entries are
/// only ever overwritten, never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerMap {
    slots: Vec<Option<OptionId>>,
}

impl AnswerMap {
    /// A map with every question unanswered.
    #[must_use]
    pub fn unanswered(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.slots.len()
    }

    /// The selected option for `index`, or `None` when unanswered or out of range.
    #[must_use]
    pub fn selected(&self, index: usize) -> Option<&OptionId> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.selected(index).is_some()
    }

    /// Overwrite the answer at `index`. Returns `false` if the index is out of range.
    pub fn record(&mut self, index: usize, option: OptionId) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(option);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&OptionId>)> {
        self.slots.iter().enumerate().map(|(i, slot)| (i, slot.as_ref()))
    }

    /// Payload entries for every answered index, in question order.
    ///
    /// Unanswered questions are left out entirely rather than sent as nulls.
    #[must_use]
    pub fn to_submission(&self, questions: &[Question]) -> Vec<SubmittedAnswer> {
        self.slots
            .iter()
            .zip(questions)
            .filter_map(|(slot, question)| {
                slot.as_ref().map(|option| SubmittedAnswer {
                    question_id: question.id().clone(),
                    selected_option_id: option.clone(),
                })
            })
            .collect()
    }
}
