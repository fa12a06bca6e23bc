//! Quiz evaluation: pure scoring functions and the per-result attempt state.
//!
//! Scoring is total and side-effect-free: identical inputs always produce
//! identical scores, so a submission can be replayed or re-rendered without
//! drift.

use std::collections::BTreeMap;

use crate::types::QuizQuestion;

/// Selections keyed by question index; values are option letters.
pub type Selections = BTreeMap<usize, String>;

/// The outcome of scoring a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    /// Number of questions answered correctly.
    pub correct: usize,
    /// Total number of questions in the quiz.
    pub total: usize,
}

/// Returns the display letter for an option position (`0 → A`, `1 → B`, …).
///
/// Positions beyond `Z` have no letter.
#[must_use]
pub fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}

/// Scores a set of selections against the quiz's answer key.
///
/// A question counts as correct iff the selection equals its
/// `correct_answer` exactly (case-sensitive). Unanswered questions never
/// count as correct.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use swot_core::quiz::score;
/// use swot_core::QuizQuestion;
///
/// let quiz = vec![
///     QuizQuestion {
///         question: "Pick B".into(),
///         options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
///         correct_answer: "B".into(),
///     },
///     QuizQuestion {
///         question: "Pick A".into(),
///         options: vec!["a".into(), "b".into()],
///         correct_answer: "A".into(),
///     },
/// ];
/// let selections = BTreeMap::from([(0, "B".to_string()), (1, "B".to_string())]);
///
/// let result = score(&quiz, &selections);
/// assert_eq!((result.correct, result.total), (1, 2));
/// ```
#[must_use]
pub fn score(quiz: &[QuizQuestion], selections: &Selections) -> QuizScore {
    let correct = quiz
        .iter()
        .enumerate()
        .filter(|(index, question)| selections.get(index) == Some(&question.correct_answer))
        .count();

    QuizScore {
        correct,
        total: quiz.len(),
    }
}

/// Returns `true` once every question has a selection.
///
/// Partial submission is rejected by the caller; this function only answers
/// the completeness question.
#[must_use]
pub fn can_submit(quiz: &[QuizQuestion], selections: &Selections) -> bool {
    selections.len() == quiz.len()
}

/// Mutable state of one quiz attempt.
///
/// Created fresh per study result and discarded when a new result replaces
/// the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    selections: Selections,
    submitted: bool,
}

impl QuizAttempt {
    /// Creates an attempt with no selections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection for a question.
    ///
    /// Returns `false` without recording once the attempt has been
    /// submitted; answers are frozen while results are shown.
    pub fn select(&mut self, question: usize, letter: impl Into<String>) -> bool {
        if self.submitted {
            return false;
        }
        self.selections.insert(question, letter.into());
        true
    }

    /// Returns the selections made so far.
    #[must_use]
    pub const fn selections(&self) -> &Selections {
        &self.selections
    }

    /// Returns `true` once the attempt has been submitted.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Returns `true` once every question in `quiz` has a selection.
    #[must_use]
    pub fn can_submit(&self, quiz: &[QuizQuestion]) -> bool {
        can_submit(quiz, &self.selections)
    }

    /// Submits the attempt and returns its score.
    ///
    /// Returns `None` (and stays unsubmitted) while any question is
    /// unanswered. Submitting twice is idempotent: the score is recomputed
    /// from the same frozen selections.
    pub fn submit(&mut self, quiz: &[QuizQuestion]) -> Option<QuizScore> {
        if !self.can_submit(quiz) {
            return None;
        }
        self.submitted = true;
        Some(score(quiz, &self.selections))
    }

    /// Discards all selections and the submitted flag in one step.
    ///
    /// A partially cleared attempt is never observable.
    pub fn reset(&mut self) {
        self.selections.clear();
        self.submitted = false;
    }
}
