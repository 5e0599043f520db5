// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::{
    ai::{generator::generate_question_set, grader::grade_job},
    error::AppError,
    models::{
        report::{ExamReport, MISSING_IDENTIFIERS, SubmissionStatus},
        session::{AnswerSheet, SessionProfile, SessionView},
    },
    state::AppState,
    utils::{jwt::Claims, store::SessionStore, submit::ScoreSubmission},
};

/// Generates the question set for the caller's session.
///
/// * NOT_STARTED -> QUESTIONS_GENERATING -> QUESTIONS_READY.
/// * Any failed list rolls the session back to NOT_STARTED.
/// * The work runs in its own task so a dropped request cannot strand the phase.
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.session_id()?;
    let profile = state.sessions.with_session(&id, |s| {
        s.begin_generation()?;
        Ok::<_, AppError>(s.profile.clone())
    })??;

    let sessions = state.sessions.clone();
    let model = state.model.clone();
    let task = tokio::spawn(async move {
        let generated =
            generate_question_set(model.as_ref(), &profile.keywords, &profile.experience).await;

        sessions.with_session(&id, |s| -> Result<SessionView, AppError> {
            match generated {
                Ok(set) => {
                    s.questions_ready(set)?;
                    Ok(s.view())
                }
                Err(e) => {
                    tracing::error!("Question generation for session {} failed: {}", id, e);
                    s.abort_generation();
                    Err(AppError::from(e))
                }
            }
        })?
    });

    let view = task.await.map_err(|e| {
        // The task died without committing; release the phase for a retry.
        let _ = state.sessions.with_session(&id, |s| s.abort_generation());
        AppError::InternalServerError(e.to_string())
    })??;

    tracing::info!(
        "Session {} ready: {} questions",
        id,
        view.questions.as_ref().map_or(0, |q| q.mcq.len() + q.coding.len() + q.subjective.len())
    );
    Ok(Json(view))
}

/// Merges answers into the caller's sheet. Only while QUESTIONS_READY.
pub async fn save_answers(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AnswerSheet>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(update) = payload?;
    let id = claims.session_id()?;
    let view = sessions.with_session(&id, |s| {
        s.record_answers(update)?;
        Ok::<_, AppError>(s.view())
    })??;
    Ok(Json(view))
}

/// Submits the exam.
///
/// * Merges any answers in the optional body, then requires every MCQ to be answered.
/// * Grades open-ended answers, computes the report, moves to RESULTS_DISPLAYED.
/// * Posts the aggregate scores once, if the session carries email and test id.
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Option<Json<AnswerSheet>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let update = payload?.map(|Json(sheet)| sheet).unwrap_or_default();
    let id = claims.session_id()?;
    let (job, profile) = state.sessions.with_session(&id, |s| {
        if !update.is_empty() {
            s.record_answers(update)?;
        }
        let job = s.begin_submission()?;
        Ok::<_, AppError>((job, s.profile.clone()))
    })??;

    tracing::info!(
        "Session {} submitted; grading {} open-ended answers",
        id,
        job.subjective.len() + job.coding.len()
    );

    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let state = task_state;
        let (subjective, coding) =
            grade_job(state.model.clone(), job, state.config.grading_concurrency).await;

        let report = state.sessions.with_session(&id, |s| {
            s.complete_grading(subjective, coding)
                .map(ExamReport::clone)
                .map_err(AppError::from)
        })??;

        let status = submit_scores(&state, &profile, &report).await;
        state
            .sessions
            .with_session(&id, |s| s.record_submission(status.clone()))?;

        Ok::<_, AppError>(ExamReport {
            submission: status,
            ..report
        })
    });

    let report = match task.await {
        Ok(result) => result?,
        Err(e) => {
            // Grading died mid-flight; close the session out with nothing graded.
            tracing::error!("Grading for session {} aborted: {}", id, e);
            let reason = format!("Grading was interrupted: {}", e);
            if let Err(err) = state.sessions.with_session(&id, |s| s.abandon_grading(&reason))? {
                tracing::error!("Session {} left in {:?}: {}", id, err, reason);
            }
            return Err(AppError::InternalServerError(e.to_string()));
        }
    };
    Ok(Json(report))
}

/// Returns the final report. Only once RESULTS_DISPLAYED.
pub async fn get_results(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.session_id()?;
    let report = sessions
        .with_session(&id, |s| s.report().cloned())?
        .ok_or_else(|| AppError::Conflict("Results are not available yet".to_string()))?;
    Ok(Json(report))
}

/// Posts the aggregate scores. Failure is reported, never raised.
async fn submit_scores(
    state: &AppState,
    profile: &SessionProfile,
    report: &ExamReport,
) -> SubmissionStatus {
    let (Some(email), Some(test_id)) = (&profile.email, &profile.test_id) else {
        tracing::warn!("Results not submitted: email or test id missing");
        return SubmissionStatus::Skipped {
            reason: MISSING_IDENTIFIERS.to_string(),
        };
    };

    let Some(submitter) = state.submitter.as_ref() else {
        tracing::warn!("Results not submitted: no score endpoint configured");
        return SubmissionStatus::Skipped {
            reason: "No score endpoint is configured.".to_string(),
        };
    };

    let submission = ScoreSubmission {
        email: email.clone(),
        test_id: test_id.clone(),
        mcq_score: report.mcq.percentage,
        subjective_score: report.subjective_score,
        coding_score: report.coding_score,
    };

    match submitter.submit(&submission).await {
        Ok(()) => {
            tracing::info!("Test results for {} submitted successfully", test_id);
            SubmissionStatus::Submitted
        }
        Err(e) => {
            tracing::error!("Error submitting test results for {}: {}", test_id, e);
            SubmissionStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}
