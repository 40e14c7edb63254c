//! LLM-as-judge correctness grading.

use std::sync::Arc;

use tracing::debug;

use crate::llm::client::LLMClient;
use crate::types::{Feedback, Result};

const QA_PROMPT: &str = "You are a teacher grading a quiz.
You are given a question, the student's answer, and the true answer, and are asked to score the student answer as either CORRECT or INCORRECT.

Example Format:
QUESTION: question here
STUDENT ANSWER: student's answer here
TRUE ANSWER: true answer here
GRADE: CORRECT or INCORRECT here

Grade the student answers based ONLY on their factual accuracy. Ignore differences in punctuation and phrasing between the student answer and true answer. It is OK if the student answer contains more information than the true answer, as long as it does not contain any conflicting statements. Begin!

QUESTION: {query}
STUDENT ANSWER: {result}
TRUE ANSWER: {answer}
GRADE:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn score(&self) -> f64 {
        match self {
            Verdict::Correct => 1.0,
            Verdict::Incorrect => 0.0,
        }
    }

    /// The last `CORRECT` or `INCORRECT` word in `text` decides, ignoring case.
    pub fn parse(text: &str) -> Option<Verdict> {
        text.split(|c: char| !c.is_ascii_alphabetic())
            .rev()
            .find_map(|word| {
                if word.eq_ignore_ascii_case("correct") {
                    Some(Verdict::Correct)
                } else if word.eq_ignore_ascii_case("incorrect") {
                    Some(Verdict::Incorrect)
                } else {
                    None
                }
            })
    }
}

/// The "qa" evaluator: asks a grader model whether a generated answer agrees
/// with the reference answer.
pub struct QaEvaluator {
    llm: Arc<dyn LLMClient>,
    feedback_key: String,
}

impl QaEvaluator {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            feedback_key: "correctness".to_string(),
        }
    }

    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = key.into();
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn render_prompt(question: &str, reference: &str, prediction: &str) -> String {
        QA_PROMPT
            .replace("{query}", question)
            .replace("{result}", prediction)
            .replace("{answer}", reference)
    }

    /// Grade one answer. A reply without a verdict yields feedback with no score.
    pub async fn evaluate(
        &self,
        question: &str,
        reference: &str,
        prediction: &str,
    ) -> Result<Feedback> {
        let prompt = Self::render_prompt(question, reference, prediction);
        let reply = self.llm.generate(&prompt).await?;
        let verdict = Verdict::parse(&reply);
        debug!(question = %question, verdict = ?verdict, "Graded answer");

        Ok(Feedback {
            key: self.feedback_key.clone(),
            score: verdict.map(|v| v.score()),
            comment: Some(reply.trim().to_string()),
        })
    }
}
