// src/ai/grader.rs

use std::sync::Arc;

use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    ai::{client::LanguageModel, parser::parse_strict_fenced, prompts::grading_prompt},
    config::GRADING_TEMPERATURE,
    error::ExamError,
    models::{
        evaluation::{Evaluation, GradeSlot, Outcome},
        question::{OpenQuestion, QuestionKind},
        session::GradingJob,
    },
};

/// Grades one open-ended answer.
///
/// Blank answers get a fixed zero without calling the model. A reply that is
/// not a valid grade is an error; no score is invented for it.
pub async fn evaluate_answer(
    model: &dyn LanguageModel,
    question: &OpenQuestion,
    answer: &str,
) -> Result<Evaluation, ExamError> {
    if answer.trim().is_empty() {
        return Ok(Evaluation::blank());
    }

    let prompt = grading_prompt(&question.question, answer);
    let raw = model.complete(&prompt, GRADING_TEMPERATURE).await?;

    let value = parse_strict_fenced(&raw).ok_or(ExamError::Parse { what: "evaluation" })?;
    evaluation_from_value(&value).ok_or_else(|| {
        tracing::warn!("Grading reply has the wrong shape: {}", value);
        ExamError::Parse { what: "evaluation" }
    })
}

fn evaluation_from_value(value: &Value) -> Option<Evaluation> {
    let score = value.get("score")?.as_f64()?;
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return None;
    }
    let feedback = value.get("feedback")?.as_str()?;
    let evaluation = Evaluation::new(score.round() as u8, feedback);

    let claimed = value.get("result").and_then(Value::as_str);
    let derived = match evaluation.result {
        Outcome::Pass => "pass",
        Outcome::Fail => "fail",
    };
    if let Some(claimed) = claimed {
        if !claimed.eq_ignore_ascii_case(derived) {
            tracing::warn!(
                "Model said {:?} for score {}; using {:?}",
                claimed,
                evaluation.score,
                derived
            );
        }
    }
    Some(evaluation)
}

/// Grades every answer in the job, at most `concurrency` model calls at a time.
///
/// Returns (subjective, coding) slots in question order. Failures become
/// `GradeSlot::Unavailable`.
pub async fn grade_job(
    model: Arc<dyn LanguageModel>,
    job: GradingJob,
    concurrency: usize,
) -> (Vec<GradeSlot>, Vec<GradeSlot>) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut subjective = vec![GradeSlot::unavailable(); job.subjective.len()];
    let mut coding = vec![GradeSlot::unavailable(); job.coding.len()];

    let tagged = job
        .subjective
        .into_iter()
        .enumerate()
        .map(|(i, pair)| (QuestionKind::Subjective, i, pair))
        .chain(
            job.coding
                .into_iter()
                .enumerate()
                .map(|(i, pair)| (QuestionKind::Coding, i, pair)),
        );

    let mut tasks = JoinSet::new();
    for (kind, index, (question, answer)) in tagged {
        let model = model.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let outcome = evaluate_answer(model.as_ref(), &question, &answer).await;
            (kind, index, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (kind, index, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("Grading task crashed: {}", e);
                continue;
            }
        };

        let slot = match outcome {
            Ok(evaluation) => GradeSlot::Graded(evaluation),
            Err(e) => {
                tracing::warn!("{} answer {} could not be graded: {}", kind.as_str(), index, e);
                GradeSlot::unavailable()
            }
        };

        match kind {
            QuestionKind::Subjective => subjective[index] = slot,
            QuestionKind::Coding => coding[index] = slot,
            QuestionKind::Mcq => {}
        }
    }

    (subjective, coding)
}
