//! Documentation Q&A prompt rendering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppError, ChatMessage};

const SYSTEM_TEMPLATE: &str = "You are a helpful documentation Q&A assistant, trained to answer questions from LangSmith's documentation. LangChain is a framework for building applications using large language models.
The current time is {time}.

Relevant documents will be retrieved in the following messages.";

const STRICT_REMINDER: &str = "Respond as best as you can. If no documents are retrieved or if you do not see an answer in the retrieved documents, admit you do not know or that you don't see it being supported at the moment.";

/// Prompt configuration evaluated as one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    /// Instructions, context and question
    Baseline,
    /// Baseline plus a trailing reminder to admit missing support
    Strict,
}

impl PromptVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptVariant::Baseline => "baseline",
            PromptVariant::Strict => "strict",
        }
    }

    pub fn all() -> [PromptVariant; 2] {
        [PromptVariant::Baseline, PromptVariant::Strict]
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptVariant {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(PromptVariant::Baseline),
            "strict" => Ok(PromptVariant::Strict),
            other => Err(AppError::InvalidInput(format!(
                "Unknown prompt variant '{}' (expected 'baseline' or 'strict')",
                other
            ))),
        }
    }
}

/// Renders the ordered message list for one question.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    variant: PromptVariant,
}

impl PromptTemplate {
    pub fn new(variant: PromptVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> PromptVariant {
        self.variant
    }

    /// Messages in order: instructions, context, question, then the reminder for `strict`
    pub fn render(&self, question: &str, context: &str, now: DateTime<Utc>) -> Vec<ChatMessage> {
        let time = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let mut messages = vec![
            ChatMessage::system(SYSTEM_TEMPLATE.replace("{time}", &time)),
            ChatMessage::system(context),
            ChatMessage::user(question),
        ];

        if self.variant == PromptVariant::Strict {
            messages.push(ChatMessage::system(STRICT_REMINDER));
        }

        messages
    }
}
