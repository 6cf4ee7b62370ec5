//! Instructions shown alongside an assigned task
//!
//! Each concept carries a short explanation. A learner sees the explanation
//! the first time they get a task containing the concept, never again.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use flocs_common::{LearnerId, Result, Task};

/// Pseudo-concept for tasks with a block limit
const BLOCKS_LIMIT: &str = "blocks-limit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub concept: String,
    pub text: String,
}

/// Instruction lookup collaborator
#[async_trait]
pub trait InstructionsProvider: Send + Sync {
    /// Instructions to show with `task`
    async fn instructions_for(&self, learner: LearnerId, task: &Task) -> Result<Vec<Instruction>>;
}

/// Instructions keyed by concept, each delivered once per learner
pub struct ConceptInstructions {
    texts: BTreeMap<String, String>,
    shown: DashMap<LearnerId, HashSet<String>>,
}

impl ConceptInstructions {
    pub fn new(texts: BTreeMap<String, String>) -> Self {
        Self {
            texts,
            shown: DashMap::new(),
        }
    }

    pub fn with_text(mut self, concept: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(concept.into(), text.into());
        self
    }
}

impl Default for ConceptInstructions {
    fn default() -> Self {
        Self::new(BTreeMap::new())
            .with_text("loops", "The repeat block runs the blocks inside it several times.")
            .with_text("conditions", "The if block runs its body only when the condition holds.")
            .with_text("colors", "Colored fields can be tested with the color condition.")
            .with_text("tokens", "Collect every diamond before reaching the goal.")
            .with_text("pits", "Falling into a pit ends the attempt.")
            .with_text(BLOCKS_LIMIT, "The program must fit into the given number of blocks.")
    }
}

#[async_trait]
impl InstructionsProvider for ConceptInstructions {
    async fn instructions_for(&self, learner: LearnerId, task: &Task) -> Result<Vec<Instruction>> {
        let mut shown = self.shown.entry(learner).or_default();
        let mut concepts = task.concepts.clone();
        if task.blocks_limit.is_some() {
            concepts.push(BLOCKS_LIMIT.to_string());
        }

        let mut instructions = Vec::new();
        for concept in concepts {
            let Some(text) = self.texts.get(&concept) else {
                continue;
            };
            if shown.insert(concept.clone()) {
                instructions.push(Instruction {
                    concept,
                    text: text.clone(),
                });
            }
        }
        Ok(instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flocs_common::TaskId;

    #[tokio::test]
    async fn test_instruction_shown_once_per_learner() {
        let provider = ConceptInstructions::default();
        let task = Task::new(TaskId(1), "Loop it").with_concepts(["loops"]);

        let first = provider.instructions_for(LearnerId(1), &task).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].concept, "loops");

        let again = provider.instructions_for(LearnerId(1), &task).await.unwrap();
        assert!(again.is_empty());

        let other = provider.instructions_for(LearnerId(2), &task).await.unwrap();
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_concepts_skipped() {
        let provider = ConceptInstructions::default();
        let task = Task::new(TaskId(1), "Mystery")
            .with_concepts(["recursion", "pits"])
            .with_blocks_limit(5);

        let instructions = provider.instructions_for(LearnerId(1), &task).await.unwrap();
        let concepts: Vec<&str> = instructions.iter().map(|i| i.concept.as_str()).collect();
        assert_eq!(concepts, vec!["pits", "blocks-limit"]);
    }
}
