use std::collections::HashMap;

use crate::models::quiz::QuizQuestion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerState {
    Answering,
    Answered { choice: String, correct: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Excellent,
    GreatJob,
    GoodWork,
    NotBad,
    KeepStudying,
}

impl PerformanceTier {
    pub fn from_percent(percent: f64) -> Self {
        match percent {
            p if p >= 90.0 => PerformanceTier::Excellent,
            p if p >= 80.0 => PerformanceTier::GreatJob,
            p if p >= 70.0 => PerformanceTier::GoodWork,
            p if p >= 60.0 => PerformanceTier::NotBad,
            _ => PerformanceTier::KeepStudying,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent!",
            PerformanceTier::GreatJob => "Great job!",
            PerformanceTier::GoodWork => "Good work!",
            PerformanceTier::NotBad => "Not bad.",
            PerformanceTier::KeepStudying => "Keep studying.",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Outstanding performance!",
            PerformanceTier::GreatJob => "You've mastered most of the material.",
            PerformanceTier::GoodWork => "You have a solid understanding.",
            PerformanceTier::NotBad => "Some areas need more focus.",
            PerformanceTier::KeepStudying => "This topic needs more review.",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent | PerformanceTier::GreatJob => "tier-high",
            PerformanceTier::GoodWork | PerformanceTier::NotBad => "tier-mid",
            PerformanceTier::KeepStudying => "tier-low",
        }
    }
}

/// One student's pass through a ready quiz. Answering is local state only;
/// nothing here talks to a provider.
#[derive(Debug, Clone)]
pub struct StudentSession {
    questions: Vec<QuizQuestion>,
    answers: Vec<AnswerState>,
}

impl StudentSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![AnswerState::Answering; questions.len()];
        Self { questions, answers }
    }

    /// Restores a session from submitted form fields named `q0`, `q1`, ...
    pub fn from_form(questions: Vec<QuizQuestion>, fields: &HashMap<String, String>) -> Self {
        let mut session = Self::new(questions);
        for idx in 0..session.questions.len() {
            if let Some(choice) = fields.get(&format!("q{}", idx)) {
                session.answer(idx, choice);
            }
        }
        session
    }

    /// Answering → Answered. Returns whether the choice was correct, or
    /// `None` when the index or label does not exist.
    pub fn answer(&mut self, idx: usize, choice: &str) -> Option<bool> {
        let question = self.questions.get(idx)?;
        let choice = choice.trim().to_ascii_lowercase();
        if !question.options.contains_key(&choice) {
            return None;
        }
        let correct = question.is_correct(&choice);
        self.answers[idx] = AnswerState::Answered { choice, correct };
        Some(correct)
    }

    pub fn state(&self, idx: usize) -> Option<&AnswerState> {
        self.answers.get(idx)
    }

    pub fn answered_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| matches!(a, AnswerState::Answered { .. }))
            .count()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn scorecard(&self) -> Scorecard {
        let correct = self
            .answers
            .iter()
            .filter(|a| matches!(a, AnswerState::Answered { correct: true, .. }))
            .count();
        Scorecard {
            correct,
            answered: self.answered_count(),
            total: self.questions.len(),
        }
    }
}

/// Unanswered questions count against the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorecard {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
}

impl Scorecard {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 * 100.0 / self.total as f64
    }

    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_percent(self.percent())
    }

    pub fn is_complete(&self) -> bool {
        self.answered == self.total
    }
}
