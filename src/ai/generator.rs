// src/ai/generator.rs

use crate::{
    ai::{
        client::LanguageModel,
        parser::{parse_mcq_list, parse_question_list},
        prompts::build_prompts,
    },
    config::{
        CODING_QUESTION_COUNT, GENERATION_TEMPERATURE, MCQ_QUESTION_COUNT,
        SUBJECTIVE_QUESTION_COUNT,
    },
    error::ExamError,
    models::{question::OpenQuestion, session::QuestionSet},
};

/// Generates the full question set for one topic/experience pair.
///
/// The three calls run concurrently. Any failure (transport or parse) fails
/// the whole set; partial results are discarded.
pub async fn generate_question_set(
    model: &dyn LanguageModel,
    topic: &str,
    experience: &str,
) -> Result<QuestionSet, ExamError> {
    let prompts = build_prompts(topic, experience);

    tracing::info!("Generating questions for {} ({})", topic, experience);

    let (mcq, coding, subjective) = tokio::try_join!(
        async {
            let raw = model.complete(&prompts.mcq, GENERATION_TEMPERATURE).await?;
            parse_mcq_list(&raw)
        },
        async {
            let raw = model.complete(&prompts.coding, GENERATION_TEMPERATURE).await?;
            parse_question_list::<OpenQuestion>(&raw, "coding")
        },
        async {
            let raw = model
                .complete(&prompts.subjective, GENERATION_TEMPERATURE)
                .await?;
            parse_question_list::<OpenQuestion>(&raw, "subjective")
        },
    )?;

    warn_on_count("mcq", mcq.len(), MCQ_QUESTION_COUNT);
    warn_on_count("coding", coding.len(), CODING_QUESTION_COUNT);
    warn_on_count("subjective", subjective.len(), SUBJECTIVE_QUESTION_COUNT);

    Ok(QuestionSet {
        mcq,
        coding,
        subjective,
    })
}

fn warn_on_count(what: &str, got: usize, requested: usize) {
    if got != requested {
        tracing::warn!("Model returned {} {} questions, {} requested", got, what, requested);
    }
}
