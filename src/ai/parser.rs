// src/ai/parser.rs

//! Coerces free-text model completions into JSON.
//!
//! Chat models intermittently wrap JSON in markdown fences or leave a trailing
//! comma. [`parse_lenient`] tries a fixed chain of increasingly aggressive
//! rewrites, in order, and stops at the first one that parses.
//!
//! Known limitation: the trailing-comma rewrite is a plain substring replace of
//! `,]` and `,}`. A string value that literally contains either sequence gets
//! corrupted by it.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::{error::ExamError, models::question::McqQuestion};

type Rewrite = fn(&str) -> Cow<'_, str>;

/// Each attempt rewrites the output of the previous one.
const REWRITES: [Rewrite; 3] = [as_is, strip_fences_and_newlines, drop_trailing_commas];

fn as_is(s: &str) -> Cow<'_, str> {
    Cow::Borrowed(s)
}

fn strip_fences_and_newlines(s: &str) -> Cow<'_, str> {
    Cow::Owned(s.replace('\n', "").replace("```json", "").replace("```", ""))
}

fn drop_trailing_commas(s: &str) -> Cow<'_, str> {
    Cow::Owned(s.replace(",]", "]").replace(",}", "}"))
}

/// Returns `None` when every attempt fails. Never panics.
pub fn parse_lenient(raw: &str) -> Option<Value> {
    let mut current: Cow<'_, str> = Cow::Borrowed(raw);
    for (step, rewrite) in REWRITES.iter().enumerate() {
        let next = match rewrite(&current) {
            Cow::Borrowed(_) => current.clone(),
            Cow::Owned(s) => Cow::Owned(s),
        };
        match serde_json::from_str::<Value>(&next) {
            Ok(value) => {
                if step > 0 {
                    tracing::debug!("Completion parsed after cleanup step {}", step);
                }
                return Some(value);
            }
            Err(_) => current = next,
        }
    }
    None
}

/// Single pass used for grading replies: strip fences once, then parse.
pub fn parse_strict_fenced(raw: &str) -> Option<Value> {
    let cleaned = raw.trim().replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim()).ok()
}

/// Decodes a non-empty JSON array of question records, validating each one.
///
/// `what` names the question kind in the resulting error.
pub fn parse_question_list<T: DeserializeOwned + Validate>(
    raw: &str,
    what: &'static str,
) -> Result<Vec<T>, ExamError> {
    let value = parse_lenient(raw).ok_or(ExamError::Parse { what })?;

    let items: Vec<T> = serde_json::from_value(value).map_err(|e| {
        tracing::warn!("{} completion is JSON but not a question list: {}", what, e);
        ExamError::Parse { what }
    })?;

    if items.is_empty() {
        tracing::warn!("{} completion is an empty list", what);
        return Err(ExamError::Parse { what });
    }

    for (i, item) in items.iter().enumerate() {
        if let Err(e) = item.validate() {
            tracing::warn!("{} record {} rejected: {}", what, i, e);
            return Err(ExamError::Parse { what });
        }
    }
    Ok(items)
}

/// Like [`parse_question_list`], plus the four-distinct-options rule on every record.
pub fn parse_mcq_list(raw: &str) -> Result<Vec<McqQuestion>, ExamError> {
    let items: Vec<McqQuestion> = parse_question_list(raw, "mcq")?;
    for (i, q) in items.iter().enumerate() {
        if let Err(reason) = q.check() {
            tracing::warn!("MCQ record {} rejected: {}", i, reason);
            return Err(ExamError::Parse { what: "mcq" });
        }
    }
    Ok(items)
}
