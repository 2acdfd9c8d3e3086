use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidConfig(String),
    InvalidData(String),
    Overlap(String),
}

impl CoreError {
    pub fn invalid_config<M: Into<String>>(message: M) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn overlap<M: Into<String>>(message: M) -> Self {
        Self::Overlap(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidData(_) => "invalid_data",
            Self::Overlap(_) => "overlap",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidConfig(message) => message,
            Self::InvalidData(message) => message,
            Self::Overlap(message) => message,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for CoreError {}
