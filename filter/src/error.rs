#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("filter error at byte {position}: {message}")]
    Parse { position: usize, message: String },
}

pub type Result<T> = std::result::Result<T, FilterError>;
