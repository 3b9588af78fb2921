/// Progress through an attempt, derived on demand from the answer map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub current_index: usize,
}

impl SessionProgress {
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.unanswered == 0
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.total
    }

    /// Position of the current question as a percentage of the whole attempt.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current_index + 1) as f64 / self.total as f64 * 100.0
    }
}
