//! The responder: retrieval, prompt assembly and one completion per turn.
//!
//! Failures never escape [`Coach::respond`]; they are rendered into an
//! apology so an interactive caller always has something to show.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::QueryError;
use crate::models::{CoachReply, SearchResult};
use crate::services::prompt::{build_coaching_prompt, build_context};
use crate::services::{CompletionModel, Retriever};

const APOLOGY_PREFIX: &str =
    "I apologize, but I encountered an error while processing your request: ";

/// User-facing message for a failed turn.
pub fn apology(err: &QueryError) -> String {
    format!("{APOLOGY_PREFIX}{err}")
}

pub struct Coach {
    retriever: Retriever,
    completion: Arc<dyn CompletionModel>,
    top_k: usize,
}

impl Coach {
    pub fn new(retriever: Retriever, completion: Arc<dyn CompletionModel>, top_k: usize) -> Self {
        Self {
            retriever,
            completion,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Reply text for a belief; the apology string on any failure.
    pub async fn respond(&self, belief: &str) -> String {
        self.respond_detailed(belief).await.reply
    }

    /// Reply plus the files its context came from.
    pub async fn respond_detailed(&self, belief: &str) -> CoachReply {
        match self.try_respond(belief).await {
            Ok((reply, retrieved)) => {
                let mut sources: Vec<String> = Vec::new();
                for result in &retrieved {
                    if !sources.contains(&result.metadata.filename) {
                        sources.push(result.metadata.filename.clone());
                    }
                }
                CoachReply {
                    belief: belief.to_string(),
                    reply,
                    sources,
                    success: true,
                }
            }
            Err(e) => {
                error!(error = %e, "coaching turn failed");
                CoachReply {
                    belief: belief.to_string(),
                    reply: apology(&e),
                    sources: Vec::new(),
                    success: false,
                }
            }
        }
    }

    /// Fallible turn: retrieve, compose and complete.
    pub async fn try_respond(
        &self,
        belief: &str,
    ) -> Result<(String, Vec<SearchResult>), QueryError> {
        let retrieved = self.retriever.retrieve(belief, self.top_k).await?;
        if retrieved.is_empty() {
            return Err(QueryError::EmptyRetrieval);
        }

        let context = build_context(&retrieved);
        info!(
            retrieved = retrieved.len(),
            context_chars = context.chars().count(),
            "retrieved context"
        );

        let prompt = build_coaching_prompt(belief, &context);
        let reply = self.completion.complete(&prompt).await?;
        Ok((reply, retrieved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompletionError, EmbeddingError};

    #[test]
    fn test_apology_embeds_error_detail() {
        let err = QueryError::from(EmbeddingError::ConnectionError(
            "connection refused".to_string(),
        ));
        let message = apology(&err);
        assert!(message.starts_with("I apologize, but I encountered an error"));
        assert!(message.ends_with("connection refused"));
    }

    #[test]
    fn test_apology_for_empty_retrieval() {
        let message = apology(&QueryError::EmptyRetrieval);
        assert!(message.contains("no relevant context"));

        let message = apology(&QueryError::from(CompletionError::Timeout));
        assert!(message.contains("completion timeout"));
    }
}
