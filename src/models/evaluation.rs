// src/models/evaluation.rs

use serde::{Deserialize, Serialize};

use crate::config::PASSING_SCORE;

pub const BLANK_ANSWER_FEEDBACK: &str = "Answer was blank or empty.";
pub const UNAVAILABLE_MESSAGE: &str = "Evaluation not available or invalid format.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn from_score(score: u8) -> Self {
        if score > PASSING_SCORE {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

/// The grade of one open-ended answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// 0..=100
    pub score: u8,
    pub feedback: String,
    pub result: Outcome,
}

impl Evaluation {
    /// Builds an evaluation whose result always agrees with its score.
    pub fn new(score: u8, feedback: impl Into<String>) -> Self {
        let score = score.min(100);
        Self {
            score,
            feedback: feedback.into(),
            result: Outcome::from_score(score),
        }
    }

    /// Fixed grade for an empty answer. Never involves the model.
    pub fn blank() -> Self {
        Self {
            score: 0,
            feedback: BLANK_ANSWER_FEEDBACK.to_string(),
            result: Outcome::Fail,
        }
    }
}

/// Per-question grading slot: either a grade or an explicit "unavailable" marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GradeSlot {
    Graded(Evaluation),
    Unavailable { message: String },
}

impl GradeSlot {
    pub fn unavailable() -> Self {
        GradeSlot::Unavailable {
            message: UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            GradeSlot::Graded(e) => Some(e),
            GradeSlot::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_iff_above_sixty() {
        for score in 0..=100u8 {
            let expected = if score > 60 { Outcome::Pass } else { Outcome::Fail };
            assert_eq!(Evaluation::new(score, "").result, expected, "score {}", score);
        }
    }

    #[test]
    fn test_sixty_is_a_fail() {
        assert_eq!(Outcome::from_score(60), Outcome::Fail);
        assert_eq!(Outcome::from_score(61), Outcome::Pass);
    }

    #[test]
    fn test_blank_evaluation_is_fixed() {
        let e = Evaluation::blank();
        assert_eq!(e.score, 0);
        assert_eq!(e.feedback, "Answer was blank or empty.");
        assert_eq!(e.result, Outcome::Fail);
    }

    #[test]
    fn test_grade_slot_serialization() {
        let graded = serde_json::to_value(GradeSlot::Graded(Evaluation::new(85, "good"))).unwrap();
        assert_eq!(graded["status"], "graded");
        assert_eq!(graded["score"], 85);
        assert_eq!(graded["result"], "pass");

        let missing = serde_json::to_value(GradeSlot::unavailable()).unwrap();
        assert_eq!(missing["status"], "unavailable");
        assert_eq!(missing["message"], "Evaluation not available or invalid format.");
    }
}
