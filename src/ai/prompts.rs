// src/ai/prompts.rs

use crate::config::{CODING_QUESTION_COUNT, MCQ_QUESTION_COUNT, SUBJECTIVE_QUESTION_COUNT};

/// The three generation prompts for one topic/experience pair.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub mcq: String,
    pub coding: String,
    pub subjective: String,
}

/// Topic and experience are interpolated verbatim.
pub fn build_prompts(topic: &str, experience: &str) -> PromptSet {
    PromptSet {
        mcq: mcq_prompt(topic, experience),
        coding: coding_prompt(topic, experience),
        subjective: subjective_prompt(topic, experience),
    }
}

fn mcq_prompt(topic: &str, experience: &str) -> String {
    format!(
        r#"You are an expert author of multiple choice questions (MCQ) about programming.
Write exactly {count} MCQ questions for a developer working with '{topic}' who has {experience} of experience.

RULES:
1. Every question has exactly four (4) distinct options.
2. Exactly one option is correct, and "answer" repeats that option verbatim.
3. Prefer code snippets, program output and core concepts of {topic}.
4. Keep questions challenging but fair for the stated experience. Avoid ambiguity.
5. Reply with ONLY a JSON array of objects with the keys "question", "options" (a list of four strings) and "answer" (a string).
6. Do not write any text before or after the JSON. Do not wrap it in markdown code fences.

EXAMPLE:
[
  {{"question": "What does print(2 + 2) output in Python?", "options": ["3", "4", "5", "22"], "answer": "4"}}
]

Language: {topic}
Experience: {experience}
"#,
        count = MCQ_QUESTION_COUNT,
    )
}

fn coding_prompt(topic: &str, experience: &str) -> String {
    format!(
        r#"You are an expert author of programming exercises.
Write exactly {count} coding questions for a developer working with '{topic}' who has {experience} of experience.

RULES:
1. Each question asks the candidate to write working {topic} code that shows practical skill.
2. Reply with ONLY a JSON array of objects with the single key "question".
3. Do not write any text before or after the JSON. Do not wrap it in markdown code fences.

EXAMPLE:
[
  {{"question": "Write a {topic} function that removes duplicates from a list while keeping order."}}
]

Skillset: {topic}
Experience: {experience}
"#,
        count = CODING_QUESTION_COUNT,
    )
}

fn subjective_prompt(topic: &str, experience: &str) -> String {
    format!(
        r#"You are an expert author of theoretical programming questions.
Write exactly {count} subjective questions for a developer working with '{topic}' who has {experience} of experience.

RULES:
1. Each question asks the candidate to explain a {topic} concept or justify a design decision in prose.
2. Reply with ONLY a JSON array of objects with the single key "question".
3. Do not write any text before or after the JSON. Do not wrap it in markdown code fences.

EXAMPLE:
[
  {{"question": "Explain when you would choose composition over inheritance in {topic}, with an example."}}
]

Skillset: {topic}
Experience: {experience}
"#,
        count = SUBJECTIVE_QUESTION_COUNT,
    )
}

/// Prompt that asks the model to grade one open-ended answer.
pub fn grading_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"You are an expert exam evaluator. Grade the student's answer to the question below.

Question: {question}
Student Answer: {answer}

CRITERIA:
1. Judge correctness and completeness. The question may be a coding or a theoretical one.
2. Give "score" as an integer percentage from 0 to 100, where 100 is a perfect answer.
3. Give "feedback" explaining the score, with strengths and weaknesses.
4. Set "result" to "pass" if the score is greater than 60, otherwise "fail".

Reply with ONLY a single JSON object with exactly the keys "score" (integer), "feedback" (string) and "result" ("pass" or "fail"). No other text.

EXAMPLE:
{{"score": 85, "feedback": "Correct and idiomatic, but misses the empty-input case.", "result": "pass"}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_interpolate_topic_and_experience() {
        let set = build_prompts("Go", "3 years");
        for prompt in [&set.mcq, &set.coding, &set.subjective] {
            assert!(prompt.contains("'Go'"));
            assert!(prompt.contains("3 years of experience"));
            assert!(prompt.contains("ONLY a JSON array"));
            assert!(prompt.contains("markdown code fences"));
        }
    }

    #[test]
    fn test_prompts_fix_question_counts() {
        let set = build_prompts("Rust", "1 years");
        assert!(set.mcq.contains("exactly 5 MCQ"));
        assert!(set.coding.contains("exactly 2 coding"));
        assert!(set.subjective.contains("exactly 2 subjective"));
    }

    #[test]
    fn test_mcq_prompt_requires_four_distinct_options() {
        let set = build_prompts("Rust", "1 years");
        assert!(set.mcq.contains("exactly four (4) distinct options"));
        assert!(set.mcq.contains("verbatim"));
        assert!(set.mcq.contains("\"options\""));
        assert!(!set.coding.contains("\"options\""));
    }

    #[test]
    fn test_values_are_not_sanitized() {
        let set = build_prompts("C++ {weird}", "ten");
        assert!(set.mcq.contains("C++ {weird}"));
        assert!(set.coding.contains("ten of experience"));
    }

    #[test]
    fn test_grading_prompt_embeds_both_texts() {
        let p = grading_prompt("Explain traits.", "They are interfaces.");
        assert!(p.contains("Question: Explain traits."));
        assert!(p.contains("Student Answer: They are interfaces."));
        assert!(p.contains("greater than 60"));
        assert!(p.contains("\"score\""));
    }
}
