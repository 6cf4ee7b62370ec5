//! Task (exercise) record
//!
//! Content authoring is out of scope; the engine only needs the identity, the
//! concepts a task exercises (for instructions) and a structured rendering of
//! its settings for the assignment payload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ids::TaskId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    /// Toolbox level the task requires (1 = simplest)
    #[serde(default = "default_level")]
    pub level: u8,

    /// Concepts contained in the task (e.g. "loops", "colors")
    #[serde(default)]
    pub concepts: Vec<String>,

    /// Limit on blocks the learner can use, if any
    #[serde(default)]
    pub blocks_limit: Option<u32>,

    /// Maze grid and tokens
    #[serde(default)]
    pub maze_settings: Value,

    /// Editor workspace settings
    #[serde(default)]
    pub workspace_settings: Value,
}

fn default_level() -> u8 {
    1
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            level: default_level(),
            concepts: Vec::new(),
            blocks_limit: None,
            maze_settings: json!({}),
            workspace_settings: json!({}),
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blocks_limit(mut self, limit: u32) -> Self {
        self.blocks_limit = Some(limit);
        self
    }

    pub fn with_maze_settings(mut self, settings: Value) -> Self {
        self.maze_settings = settings;
        self
    }

    /// Workspace settings merged with the block limit
    pub fn workspace_json(&self) -> Value {
        let mut workspace = match &self.workspace_settings {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        workspace.insert("blocks-limit".to_string(), json!(self.blocks_limit));
        Value::Object(workspace)
    }

    /// Structured content handed to the learner on assignment
    pub fn to_json(&self) -> Value {
        json!({
            "task-id": self.id,
            "title": self.title,
            "level": self.level,
            "maze-settings": self.maze_settings,
            "workspace-settings": self.workspace_json(),
        })
    }
}
