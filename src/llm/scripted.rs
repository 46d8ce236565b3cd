use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::{LlmError, LlmResult};
use super::LanguageModel;

/// Replays a fixed queue of answers and remembers every prompt it saw
#[derive(Debug, Default)]
pub struct ScriptedModel {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.prompts.lock().await.push(prompt.to_string());
        self.answers.lock().await.pop_front().ok_or(LlmError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_answers_in_order() {
        let model = ScriptedModel::new(["first", "second"]);

        assert_eq!(model.complete("a").await.unwrap(), "first");
        assert_eq!(model.complete("b").await.unwrap(), "second");
        assert!(matches!(model.complete("c").await, Err(LlmError::Exhausted)));
        assert_eq!(model.prompts().await, vec!["a", "b", "c"]);
    }
}
