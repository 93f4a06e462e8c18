use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No agent with name: {0}")]
    UnknownAgent(String),

    #[error("No depends on task with name: {0}")]
    UnknownDependency(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Cyclic dependency detected at task: {0}")]
    CyclicDependency(String),

    #[error("Agent not available: {0}")]
    AgentNotAvailable(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
