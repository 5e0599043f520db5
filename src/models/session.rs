// src/models/session.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::config::{DEFAULT_EXPERIENCE, DEFAULT_KEYWORDS};
use crate::error::ExamError;
use crate::models::{
    evaluation::GradeSlot,
    question::{McqQuestion, OpenQuestion, PublicMcq, QuestionKind},
    report::{ExamReport, SubmissionStatus},
};

/// Where a session is in its one-way progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    QuestionsGenerating,
    QuestionsReady,
    AnswersSubmitted,
    ResultsDisplayed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {action} while the session is {actual:?}")]
    WrongPhase { action: &'static str, actual: Phase },

    #[error("Please answer all MCQ questions before submitting (missing: {missing:?})")]
    Incomplete { missing: Vec<usize> },

    #[error("There is no {} question at index {key:?}", .kind.as_str())]
    UnknownQuestion { kind: QuestionKind, key: String },

    #[error("{value:?} is not an option of MCQ question {index}")]
    InvalidOption { index: usize, value: String },
}

/// Inbound parameters that identify what to test and who is being tested.
#[derive(Debug, Clone, Serialize)]
pub struct SessionProfile {
    pub keywords: String,
    /// Already normalized, e.g. "3 years".
    pub experience: String,
    pub email: Option<String>,
    pub test_id: Option<String>,
}

/// DTO for opening a session. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 100))]
    pub keywords: Option<String>,

    /// Whole years, as a number or a numeric string.
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(custom(function = validate_experience))]
    pub experience: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub test_id: Option<String>,
}

impl CreateSessionRequest {
    /// Validates and applies defaults. Nothing external is called before this passes.
    pub fn into_profile(self) -> Result<SessionProfile, ExamError> {
        self.validate()
            .map_err(|e| ExamError::Validation(e.to_string()))?;

        let experience = match self.experience {
            Some(raw) => format!("{} years", parse_years(&raw)?),
            None => DEFAULT_EXPERIENCE.to_string(),
        };
        let keywords = self
            .keywords
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYWORDS.to_string());

        Ok(SessionProfile {
            keywords,
            experience,
            email: self.email.filter(|e| !e.is_empty()),
            test_id: self.test_id.filter(|t| !t.is_empty()),
        })
    }
}

fn parse_years(raw: &str) -> Result<u32, ExamError> {
    raw.trim().parse::<u32>().map_err(|_| {
        ExamError::Validation("Invalid experience value. Must be an integer.".to_string())
    })
}

fn validate_experience(raw: &str) -> Result<(), validator::ValidationError> {
    parse_years(raw)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("experience_must_be_integer"))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// The three generated lists. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    pub mcq: Vec<McqQuestion>,
    pub coding: Vec<OpenQuestion>,
    pub subjective: Vec<OpenQuestion>,
}

/// Answers keyed by zero-based index as a string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerSheet {
    #[serde(default)]
    pub mcq: HashMap<String, String>,
    #[serde(default)]
    pub subjective: HashMap<String, String>,
    #[serde(default)]
    pub coding: HashMap<String, String>,
}

impl AnswerSheet {
    pub fn is_empty(&self) -> bool {
        self.mcq.is_empty() && self.subjective.is_empty() && self.coding.is_empty()
    }
}

/// Open-ended questions paired with their answers, handed to the grader.
#[derive(Debug, Clone)]
pub struct GradingJob {
    pub subjective: Vec<(OpenQuestion, String)>,
    pub coding: Vec<(OpenQuestion, String)>,
}

#[derive(Debug, Clone)]
pub struct ExamSession {
    pub id: Uuid,
    pub profile: SessionProfile,
    pub created_at: DateTime<Utc>,
    phase: Phase,
    questions: Option<QuestionSet>,
    answers: AnswerSheet,
    subjective_grades: BTreeMap<String, GradeSlot>,
    coding_grades: BTreeMap<String, GradeSlot>,
    report: Option<ExamReport>,
}

impl ExamSession {
    pub fn new(profile: SessionProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            created_at: Utc::now(),
            phase: Phase::NotStarted,
            questions: None,
            answers: AnswerSheet::default(),
            subjective_grades: BTreeMap::new(),
            coding_grades: BTreeMap::new(),
            report: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> Option<&QuestionSet> {
        self.questions.as_ref()
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn report(&self) -> Option<&ExamReport> {
        self.report.as_ref()
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::WrongPhase {
                action,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// NOT_STARTED -> QUESTIONS_GENERATING
    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::NotStarted, "start the exam")?;
        self.phase = Phase::QuestionsGenerating;
        Ok(())
    }

    /// QUESTIONS_GENERATING -> QUESTIONS_READY
    pub fn questions_ready(&mut self, set: QuestionSet) -> Result<(), SessionError> {
        self.expect_phase(Phase::QuestionsGenerating, "store questions")?;
        self.questions = Some(set);
        self.phase = Phase::QuestionsReady;
        Ok(())
    }

    /// Rolls QUESTIONS_GENERATING back to NOT_STARTED after a failed attempt.
    pub fn abort_generation(&mut self) {
        if self.phase == Phase::QuestionsGenerating {
            self.phase = Phase::NotStarted;
        }
    }

    /// Merges an answer update. Every key must address an existing question.
    pub fn record_answers(&mut self, update: AnswerSheet) -> Result<(), SessionError> {
        self.expect_phase(Phase::QuestionsReady, "record answers")?;
        let Some(set) = self.questions.as_ref() else {
            return Err(SessionError::WrongPhase {
                action: "record answers",
                actual: self.phase,
            });
        };

        for (key, value) in &update.mcq {
            let index = resolve_index(QuestionKind::Mcq, key, set.mcq.len())?;
            if !set.mcq[index].has_option(value) {
                return Err(SessionError::InvalidOption {
                    index,
                    value: value.clone(),
                });
            }
        }
        for key in update.subjective.keys() {
            resolve_index(QuestionKind::Subjective, key, set.subjective.len())?;
        }
        for key in update.coding.keys() {
            resolve_index(QuestionKind::Coding, key, set.coding.len())?;
        }

        // Keys are normalized so "01" and "1" address the same slot.
        let normalize = |map: HashMap<String, String>| {
            map.into_iter()
                .filter_map(|(k, v)| k.trim().parse::<usize>().ok().map(|i| (i.to_string(), v)))
                .collect::<Vec<_>>()
        };
        self.answers.mcq.extend(normalize(update.mcq));
        self.answers.subjective.extend(normalize(update.subjective));
        self.answers.coding.extend(normalize(update.coding));
        Ok(())
    }

    /// Indices of MCQ questions without a non-empty selected answer.
    pub fn unanswered_mcq(&self) -> Vec<usize> {
        let total = self.questions.as_ref().map_or(0, |s| s.mcq.len());
        (0..total)
            .filter(|i| {
                self.answers
                    .mcq
                    .get(&i.to_string())
                    .is_none_or(|a| a.is_empty())
            })
            .collect()
    }

    /// QUESTIONS_READY -> ANSWERS_SUBMITTED, gated on every MCQ being answered.
    ///
    /// Returns the open-ended work for the grader; missing answers are graded as blank.
    pub fn begin_submission(&mut self) -> Result<GradingJob, SessionError> {
        self.expect_phase(Phase::QuestionsReady, "submit answers")?;

        let missing = self.unanswered_mcq();
        if !missing.is_empty() {
            return Err(SessionError::Incomplete { missing });
        }

        let Some(set) = self.questions.as_ref() else {
            return Err(SessionError::WrongPhase {
                action: "submit answers",
                actual: self.phase,
            });
        };

        let pair = |questions: &[OpenQuestion], answers: &HashMap<String, String>| {
            questions
                .iter()
                .enumerate()
                .map(|(i, q)| {
                    let answer = answers.get(&i.to_string()).cloned().unwrap_or_default();
                    (q.clone(), answer)
                })
                .collect::<Vec<_>>()
        };

        let job = GradingJob {
            subjective: pair(&set.subjective[..], &self.answers.subjective),
            coding: pair(&set.coding[..], &self.answers.coding),
        };

        self.phase = Phase::AnswersSubmitted;
        Ok(job)
    }

    /// ANSWERS_SUBMITTED -> RESULTS_DISPLAYED. Stores grades and computes the report.
    pub fn complete_grading(
        &mut self,
        subjective: Vec<GradeSlot>,
        coding: Vec<GradeSlot>,
    ) -> Result<&ExamReport, SessionError> {
        self.expect_phase(Phase::AnswersSubmitted, "store evaluations")?;
        let Some(set) = self.questions.as_ref() else {
            return Err(SessionError::WrongPhase {
                action: "store evaluations",
                actual: self.phase,
            });
        };

        self.subjective_grades = index_map(subjective);
        self.coding_grades = index_map(coding);

        let report = ExamReport::build(
            set,
            &self.answers,
            &self.subjective_grades,
            &self.coding_grades,
        );
        self.phase = Phase::ResultsDisplayed;
        Ok(&*self.report.insert(report))
    }

    /// ANSWERS_SUBMITTED -> RESULTS_DISPLAYED when the grading run itself died.
    ///
    /// Every open-ended slot is unavailable and no scores are submitted.
    pub fn abandon_grading(&mut self, reason: &str) -> Result<(), SessionError> {
        let (subjective, coding) = self
            .questions
            .as_ref()
            .map_or((0, 0), |set| (set.subjective.len(), set.coding.len()));
        self.complete_grading(
            vec![GradeSlot::unavailable(); subjective],
            vec![GradeSlot::unavailable(); coding],
        )?;
        self.record_submission(SubmissionStatus::Failed {
            error: reason.to_string(),
        });
        Ok(())
    }

    pub fn record_submission(&mut self, status: SubmissionStatus) {
        if let Some(report) = self.report.as_mut() {
            report.submission = status;
        }
    }

    /// Client-facing view. MCQ answers stay hidden until results are shown.
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            phase: self.phase,
            profile: self.profile.clone(),
            created_at: self.created_at,
            questions: self.questions.as_ref().map(|set| QuestionsView {
                mcq: set.mcq.iter().map(PublicMcq::from).collect(),
                coding: set.coding.clone(),
                subjective: set.subjective.clone(),
            }),
            answers: self.answers.clone(),
        }
    }
}

fn resolve_index(kind: QuestionKind, key: &str, len: usize) -> Result<usize, SessionError> {
    match key.trim().parse::<usize>() {
        Ok(index) if index < len => Ok(index),
        _ => Err(SessionError::UnknownQuestion {
            kind,
            key: key.to_string(),
        }),
    }
}

fn index_map(slots: Vec<GradeSlot>) -> BTreeMap<String, GradeSlot> {
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| (i.to_string(), slot))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct QuestionsView {
    pub mcq: Vec<PublicMcq>,
    pub coding: Vec<OpenQuestion>,
    pub subjective: Vec<OpenQuestion>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub phase: Phase,
    pub profile: SessionProfile,
    pub created_at: DateTime<Utc>,
    pub questions: Option<QuestionsView>,
    pub answers: AnswerSheet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluation::Evaluation;

    fn profile() -> SessionProfile {
        SessionProfile {
            keywords: "Go".to_string(),
            experience: "3 years".to_string(),
            email: None,
            test_id: None,
        }
    }

    fn question_set() -> QuestionSet {
        let mcq = |answer: &str| McqQuestion {
            question: format!("Pick {}", answer),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.to_string(),
        };
        QuestionSet {
            mcq: vec![mcq("B"), mcq("A"), mcq("D")],
            coding: vec![OpenQuestion {
                question: "Reverse a slice in place.".into(),
            }],
            subjective: vec![
                OpenQuestion {
                    question: "Explain goroutines.".into(),
                },
                OpenQuestion {
                    question: "Explain channels.".into(),
                },
            ],
        }
    }

    fn ready_session() -> ExamSession {
        let mut s = ExamSession::new(profile());
        s.begin_generation().unwrap();
        s.questions_ready(question_set()).unwrap();
        s
    }

    fn sheet(mcq: &[(&str, &str)]) -> AnswerSheet {
        AnswerSheet {
            mcq: mcq
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn request(json: serde_json::Value) -> CreateSessionRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_profile_defaults() {
        let p = request(serde_json::json!({})).into_profile().unwrap();
        assert_eq!(p.keywords, "Python");
        assert_eq!(p.experience, "2 years");
        assert!(p.email.is_none() && p.test_id.is_none());
    }

    #[test]
    fn test_profile_accepts_integer_experience() {
        let p = request(serde_json::json!({"keywords": "Go", "experience": "3"}))
            .into_profile()
            .unwrap();
        assert_eq!(p.keywords, "Go");
        assert_eq!(p.experience, "3 years");

        let p = request(serde_json::json!({"experience": 7})).into_profile().unwrap();
        assert_eq!(p.experience, "7 years");
    }

    #[test]
    fn test_profile_rejects_non_integer_experience() {
        for bad in ["three", "3 years", "2.5", "-1", ""] {
            let err = request(serde_json::json!({"experience": bad}))
                .into_profile()
                .unwrap_err();
            assert!(matches!(err, ExamError::Validation(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_profile_rejects_bad_email() {
        let err = request(serde_json::json!({"email": "not-an-email", "test_id": "T1"}))
            .into_profile()
            .unwrap_err();
        assert!(matches!(err, ExamError::Validation(_)));
    }

    #[test]
    fn test_new_session_is_not_started() {
        let s = ExamSession::new(profile());
        assert_eq!(s.phase(), Phase::NotStarted);
        assert!(s.questions().is_none());
    }

    #[test]
    fn test_failed_generation_rolls_back() {
        let mut s = ExamSession::new(profile());
        s.begin_generation().unwrap();
        assert_eq!(s.phase(), Phase::QuestionsGenerating);
        s.abort_generation();
        assert_eq!(s.phase(), Phase::NotStarted);
        // A fresh attempt is allowed after rollback.
        assert!(s.begin_generation().is_ok());
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut s = ready_session();
        let err = s.begin_generation().unwrap_err();
        assert_eq!(
            err,
            SessionError::WrongPhase {
                action: "start the exam",
                actual: Phase::QuestionsReady
            }
        );
    }

    #[test]
    fn test_abort_is_noop_outside_generation() {
        let mut s = ready_session();
        s.abort_generation();
        assert_eq!(s.phase(), Phase::QuestionsReady);
    }

    #[test]
    fn test_record_answers_rejects_unknown_index() {
        let mut s = ready_session();
        let err = s.record_answers(sheet(&[("7", "A")])).unwrap_err();
        assert!(matches!(err, SessionError::UnknownQuestion { kind: QuestionKind::Mcq, .. }));

        let mut bad_coding = AnswerSheet::default();
        bad_coding.coding.insert("x".into(), "code".into());
        assert!(s.record_answers(bad_coding).is_err());
    }

    #[test]
    fn test_record_answers_rejects_non_option() {
        let mut s = ready_session();
        let err = s.record_answers(sheet(&[("0", "E")])).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidOption {
                index: 0,
                value: "E".into()
            }
        );
    }

    #[test]
    fn test_record_answers_merges() {
        let mut s = ready_session();
        s.record_answers(sheet(&[("0", "A")])).unwrap();
        s.record_answers(sheet(&[("0", "B"), ("1", "C")])).unwrap();
        assert_eq!(s.answers().mcq.get("0").map(String::as_str), Some("B"));
        assert_eq!(s.answers().mcq.get("1").map(String::as_str), Some("C"));
    }

    #[test]
    fn test_submit_blocked_until_all_mcq_answered() {
        let mut s = ready_session();
        s.record_answers(sheet(&[("0", "B"), ("2", "D")])).unwrap();

        let err = s.begin_submission().unwrap_err();
        assert_eq!(err, SessionError::Incomplete { missing: vec![1] });
        assert_eq!(s.phase(), Phase::QuestionsReady);
    }

    #[test]
    fn test_full_progression() {
        let mut s = ready_session();
        let mut answers = sheet(&[("0", "B"), ("1", "C"), ("2", "D")]);
        answers.subjective.insert("0".into(), "Lightweight threads.".into());
        s.record_answers(answers).unwrap();

        let job = s.begin_submission().unwrap();
        assert_eq!(s.phase(), Phase::AnswersSubmitted);
        assert_eq!(job.subjective.len(), 2);
        assert_eq!(job.subjective[0].1, "Lightweight threads.");
        // Unanswered open questions are graded as blank.
        assert_eq!(job.subjective[1].1, "");
        assert_eq!(job.coding[0].1, "");

        // No more edits once submitted.
        assert!(s.record_answers(sheet(&[("0", "A")])).is_err());

        let report = s
            .complete_grading(
                vec![
                    GradeSlot::Graded(Evaluation::new(80, "ok")),
                    GradeSlot::Graded(Evaluation::blank()),
                ],
                vec![GradeSlot::unavailable()],
            )
            .unwrap();
        assert_eq!(report.mcq.correct, 2);
        assert_eq!(s.phase(), Phase::ResultsDisplayed);
        assert!(s.begin_submission().is_err());
    }

    #[test]
    fn test_abandoned_grading_closes_out_the_session() {
        let mut s = ready_session();
        s.record_answers(sheet(&[("0", "B"), ("1", "A"), ("2", "A")])).unwrap();

        // Only legal once answers are submitted.
        assert!(s.abandon_grading("too early").is_err());

        s.begin_submission().unwrap();
        s.abandon_grading("Grading was interrupted").unwrap();
        assert_eq!(s.phase(), Phase::ResultsDisplayed);

        let report = s.report().unwrap();
        assert_eq!(report.mcq.correct, 2);
        assert_eq!(report.subjective.len(), 2);
        assert!(report.subjective.iter().all(|r| r.evaluation.evaluation().is_none()));
        assert_eq!(report.coding_score, 0.0);
        assert_eq!(
            report.submission,
            SubmissionStatus::Failed {
                error: "Grading was interrupted".to_string()
            }
        );
    }

    #[test]
    fn test_view_hides_mcq_answers() {
        let s = ready_session();
        let json = serde_json::to_value(s.view()).unwrap();
        assert_eq!(json["phase"], "questions_ready");
        assert!(json["questions"]["mcq"][0].get("answer").is_none());
        assert_eq!(json["questions"]["subjective"].as_array().unwrap().len(), 2);
    }
}
