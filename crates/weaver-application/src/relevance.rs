//! Relevance gate: asks a classifier whether a prompt is poetic.
//!
//! The gate fails open. When the classifier cannot answer, the prompt is
//! treated as relevant and the failure only shows up in the logs.

use std::sync::Arc;
use weaver_core::agent::TextAgent;
use weaver_core::error::RelevanceCheckUnavailable;

/// Verdict of one relevance check.
#[derive(Debug, Clone, PartialEq)]
pub enum Relevance {
    Relevant,
    NotRelevant,
    /// The classifier failed; the caller proceeds as if relevant.
    Unavailable(RelevanceCheckUnavailable),
}

impl Relevance {
    pub fn allows_generation(&self) -> bool {
        !matches!(self, Self::NotRelevant)
    }
}

pub struct RelevanceGate {
    classifier: Arc<dyn TextAgent>,
}

impl RelevanceGate {
    pub fn new(classifier: Arc<dyn TextAgent>) -> Self {
        Self { classifier }
    }

    /// The yes/no question sent to the classifier.
    pub fn question(prompt: &str) -> String {
        format!("Is this poetic? Yes or No only.\n\n{prompt}")
    }

    pub async fn check(&self, prompt: &str) -> Relevance {
        match self.classifier.execute(&Self::question(prompt)).await {
            Ok(answer) if answer.to_lowercase().contains("yes") => Relevance::Relevant,
            Ok(answer) => {
                tracing::debug!(answer = %answer.trim(), "[RelevanceGate] Prompt judged not poetic");
                Relevance::NotRelevant
            }
            Err(cause) => {
                tracing::debug!(
                    classifier = self.classifier.expertise(),
                    "[RelevanceGate] Classifier unavailable, failing open: {}",
                    cause
                );
                Relevance::Unavailable(RelevanceCheckUnavailable { cause })
            }
        }
    }

    /// True unless the classifier answered and the answer was not "yes".
    pub async fn is_relevant(&self, prompt: &str) -> bool {
        self.check(prompt).await.allows_generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedAgent;
    use weaver_core::error::AgentError;

    fn gate(agent: ScriptedAgent) -> RelevanceGate {
        RelevanceGate::new(Arc::new(agent))
    }

    #[tokio::test]
    async fn test_yes_anywhere_in_answer_is_relevant() {
        for answer in ["Yes", "yes.", "YES, definitely", "Well... yes"] {
            assert!(gate(ScriptedAgent::answer(answer)).is_relevant("the sea").await);
        }
    }

    #[tokio::test]
    async fn test_no_is_not_relevant() {
        let gate = gate(ScriptedAgent::answer("No"));
        assert_eq!(gate.check("quarterly tax form").await, Relevance::NotRelevant);
        assert!(!gate.is_relevant("quarterly tax form").await);
    }

    #[tokio::test]
    async fn test_any_classifier_failure_fails_open() {
        let failures = [
            AgentError::ExecutionFailed("boom".into()),
            AgentError::ProcessError {
                status_code: Some(503),
                message: "overloaded".into(),
                is_retryable: true,
                retry_after: None,
            },
            AgentError::Other("quota".into()),
        ];
        for failure in failures {
            let gate = gate(ScriptedAgent::failure(failure));
            assert!(matches!(gate.check("x").await, Relevance::Unavailable(_)));
            assert!(gate.is_relevant("x").await);
        }
    }

    #[tokio::test]
    async fn test_question_embeds_prompt() {
        let agent = Arc::new(ScriptedAgent::answer("yes"));
        let gate = RelevanceGate::new(agent.clone());
        gate.check("falling leaves").await;

        assert_eq!(
            agent.instructions(),
            vec!["Is this poetic? Yes or No only.\n\nfalling leaves".to_string()]
        );
    }
}
