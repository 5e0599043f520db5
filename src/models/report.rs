// src/models/report.rs

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{
    evaluation::GradeSlot,
    question::{McqQuestion, OpenQuestion},
    session::{AnswerSheet, QuestionSet},
};

pub const NOT_ANSWERED: &str = "Not Answered";
pub const MISSING_IDENTIFIERS: &str = "Email and Test ID must be provided to submit results.";

/// Outcome of the one outbound score submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct McqReview {
    pub question: String,
    pub correct_answer: String,
    pub your_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqSummary {
    pub correct: usize,
    pub total: usize,
    /// 0..=100, two decimals.
    pub percentage: f64,
    pub items: Vec<McqReview>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenReview {
    pub question: String,
    pub evaluation: GradeSlot,
}

/// What the test-taker sees once grading is done.
#[derive(Debug, Clone, Serialize)]
pub struct ExamReport {
    pub mcq: McqSummary,
    pub subjective: Vec<OpenReview>,
    pub coding: Vec<OpenReview>,
    pub subjective_score: f64,
    pub coding_score: f64,
    pub submission: SubmissionStatus,
}

impl ExamReport {
    pub fn build(
        set: &QuestionSet,
        answers: &AnswerSheet,
        subjective: &BTreeMap<String, GradeSlot>,
        coding: &BTreeMap<String, GradeSlot>,
    ) -> Self {
        let (correct, percentage) = calculate_mcq_score(&set.mcq, &answers.mcq);

        let items = set
            .mcq
            .iter()
            .enumerate()
            .map(|(i, q)| McqReview {
                question: q.question.clone(),
                correct_answer: q.answer.clone(),
                your_answer: answers
                    .mcq
                    .get(&i.to_string())
                    .cloned()
                    .unwrap_or_else(|| NOT_ANSWERED.to_string()),
            })
            .collect();

        Self {
            mcq: McqSummary {
                correct,
                total: set.mcq.len(),
                percentage: round2(percentage),
                items,
            },
            subjective: review(&set.subjective, subjective),
            coding: review(&set.coding, coding),
            subjective_score: round2(average_score(subjective)),
            coding_score: round2(average_score(coding)),
            submission: SubmissionStatus::Pending,
        }
    }
}

fn review(questions: &[OpenQuestion], grades: &BTreeMap<String, GradeSlot>) -> Vec<OpenReview> {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| OpenReview {
            question: q.question.clone(),
            evaluation: grades
                .get(&i.to_string())
                .cloned()
                .unwrap_or_else(GradeSlot::unavailable),
        })
        .collect()
}

/// Helper function to calculate the MCQ score.
/// Returns (correct_count, score_percentage).
pub fn calculate_mcq_score(
    questions: &[McqQuestion],
    user_answers: &HashMap<String, String>,
) -> (usize, f64) {
    let total_questions = questions.len();

    if total_questions == 0 {
        return (0, 0.0);
    }

    let correct_count = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            // Simple strict string matching
            user_answers
                .get(&i.to_string())
                .is_some_and(|ans| ans == &q.answer)
        })
        .count();

    let score = (correct_count as f64 / total_questions as f64) * 100.0;
    (correct_count, score)
}

/// Mean score over graded answers only; unavailable grades are not counted.
pub fn average_score(grades: &BTreeMap<String, GradeSlot>) -> f64 {
    let scores: Vec<f64> = grades
        .values()
        .filter_map(GradeSlot::evaluation)
        .map(|e| f64::from(e.score))
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
