// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which of the three generated lists a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Coding,
    Subjective,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Coding => "coding",
            QuestionKind::Subjective => "subjective",
        }
    }
}

/// A multiple-choice question as produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct McqQuestion {
    #[validate(length(min = 1))]
    pub question: String,

    /// Exactly four distinct options, in display order.
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    /// The correct option, verbatim.
    pub answer: String,
}

impl McqQuestion {
    /// Field rules plus "the answer is one of the options".
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        if !self.options.iter().any(|o| o == &self.answer) {
            return Err(format!("answer {:?} is not one of the options", self.answer));
        }
        Ok(())
    }

    pub fn has_option(&self, candidate: &str) -> bool {
        self.options.iter().any(|o| o == candidate)
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != 4 {
        return Err(validator::ValidationError::new("options_must_be_four"));
    }
    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(validator::ValidationError::new("options_must_be_distinct"));
    }
    Ok(())
}

/// A coding or subjective question. No stored answer; the model grades it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OpenQuestion {
    #[validate(length(min = 1))]
    pub question: String,
}

/// DTO for sending an MCQ to the client before results (excludes answer).
#[derive(Debug, Serialize)]
pub struct PublicMcq {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&McqQuestion> for PublicMcq {
    fn from(q: &McqQuestion) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(options: &[&str], answer: &str) -> McqQuestion {
        McqQuestion {
            question: "Which keyword declares a function in Go?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_valid_mcq() {
        assert!(mcq(&["def", "func", "fn", "function"], "func").check().is_ok());
    }

    #[test]
    fn test_mcq_needs_four_options() {
        assert!(mcq(&["def", "func", "fn"], "func").check().is_err());
        assert!(mcq(&["a", "b", "c", "d", "e"], "a").check().is_err());
    }

    #[test]
    fn test_mcq_options_distinct() {
        assert!(mcq(&["a", "a", "c", "d"], "a").check().is_err());
    }

    #[test]
    fn test_mcq_answer_must_match_option_verbatim() {
        let err = mcq(&["def", "func", "fn", "function"], "Func")
            .check()
            .unwrap_err();
        assert!(err.contains("not one of the options"));
    }

    #[test]
    fn test_public_mcq_hides_answer() {
        let q = mcq(&["def", "func", "fn", "function"], "func");
        let json = serde_json::to_value(PublicMcq::from(&q)).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(json["options"][1], "func");
    }
}
