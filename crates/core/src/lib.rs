//! Core types and utilities for dbsage
//!
//! Domain types shared across all other crates, the typed configuration
//! loader, and the pure SQL text utilities (normalizer, scope scanner,
//! anti-pattern signatures). Nothing in this crate performs I/O except
//! reading configuration files.

mod anti_pattern;
mod catalog;
pub mod config;
mod constants;
mod env_config;
mod error;
mod json_utils;
mod lexer;
mod normalizer;
mod outcome;
mod scope;

pub use anti_pattern::*;
pub use catalog::*;
pub use config::{
    AppConfig, EmbeddingConfig, EvidenceConfig, GroundingPolicy, LlmConfig, PlannerConfig,
    PostgresConfig, QdrantConfig, deep_merge, load_config, load_query_definitions,
};
pub use constants::*;
pub use error::ConfigError;
pub use json_utils::strip_markdown_fence;
pub use normalizer::{KeywordCase, NormalizeOptions, PLACEHOLDER, normalize, substitute_placeholders};
pub use outcome::{QueryOutcome, Row};
pub use scope::{RelationRef, referenced_relations};
