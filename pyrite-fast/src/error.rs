#[derive(Debug, Clone)]
pub enum FastError {
    InvalidImageSize { width: usize, height: usize },
    InvalidBorder { border: usize, min_border: usize },
    StrideTooSmall { vstep: usize, required: usize },
    BufferTooSmall { expected_len: usize, actual_len: usize },
    InvalidBucketLimit { bucket_limit: usize },
}

impl std::fmt::Display for FastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be 1-4095 per axis)", width, height)
            }
            FastError::InvalidBorder { border, min_border } => {
                write!(f, "Border {} too small (minimum {})", border, min_border)
            }
            FastError::StrideTooSmall { vstep, required } => {
                write!(f, "Row stride {} too small (need at least {})", vstep, required)
            }
            FastError::BufferTooSmall { expected_len, actual_len } => {
                write!(f, "Buffer too small: need {} bytes, got {}", expected_len, actual_len)
            }
            FastError::InvalidBucketLimit { bucket_limit } => {
                write!(f, "Invalid bucket limit: {} (must be > 0)", bucket_limit)
            }
        }
    }
}

impl std::error::Error for FastError {}

pub type FastResult<T> = Result<T, FastError>;
