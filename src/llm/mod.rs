//! LLM Provider Clients and Abstractions
//!
//! Both chat models the workflow talks to, the answer generator and the
//! grader, sit behind the [`LLMClient`] trait. [`LLMClientFactory`] builds
//! them from the `[models]` and `[providers]` sections of `ragcheck.toml`.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API and compatible endpoints
//! - `ollama` - Local Ollama server
//!
//! # Streaming
//!
//! Providers implement [`LLMClient::stream_with_messages`], which returns a
//! [`TextStream`] of text deltas; the non-streaming calls collect it.

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, LLMClientFactory, Provider, TextStream};
