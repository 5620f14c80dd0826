use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[cfg(feature = "redis-backend")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Wrong type for key {0}")]
    WrongType(String),

    #[error("Value at key {0} is not an integer")]
    NotAnInteger(String),

    #[error("Increment would overflow at key {0}")]
    Overflow(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}
