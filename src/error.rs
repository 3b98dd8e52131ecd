use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramecastError {
    #[error("topic not found: {0}")]
    TopicNotFound(String),
}

pub type Result<T> = std::result::Result<T, FramecastError>;
