use std::fmt;

#[derive(Debug, Clone)]
pub enum HitCounterError {
    ConfigLoad(String),
    StorageOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    DateParse(String),
}

impl HitCounterError {
    pub fn code(&self) -> &'static str {
        match self {
            HitCounterError::ConfigLoad(_) => "E001",
            HitCounterError::StorageOperation(_) => "E002",
            HitCounterError::Validation(_) => "E003",
            HitCounterError::NotFound(_) => "E004",
            HitCounterError::Serialization(_) => "E005",
            HitCounterError::DateParse(_) => "E006",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            HitCounterError::ConfigLoad(_) => "Configuration Load Error",
            HitCounterError::StorageOperation(_) => "Storage Operation Error",
            HitCounterError::Validation(_) => "Validation Error",
            HitCounterError::NotFound(_) => "Resource Not Found",
            HitCounterError::Serialization(_) => "Serialization Error",
            HitCounterError::DateParse(_) => "Date Parse Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HitCounterError::ConfigLoad(msg) => msg,
            HitCounterError::StorageOperation(msg) => msg,
            HitCounterError::Validation(msg) => msg,
            HitCounterError::NotFound(msg) => msg,
            HitCounterError::Serialization(msg) => msg,
            HitCounterError::DateParse(msg) => msg,
        }
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for HitCounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for HitCounterError {}

// 便捷的构造函数
impl HitCounterError {
    pub fn config_load<T: Into<String>>(msg: T) -> Self {
        HitCounterError::ConfigLoad(msg.into())
    }

    pub fn storage_operation<T: Into<String>>(msg: T) -> Self {
        HitCounterError::StorageOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        HitCounterError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        HitCounterError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        HitCounterError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        HitCounterError::DateParse(msg.into())
    }
}

impl From<std::io::Error> for HitCounterError {
    fn from(err: std::io::Error) -> Self {
        HitCounterError::StorageOperation(err.to_string())
    }
}

impl From<serde_json::Error> for HitCounterError {
    fn from(err: serde_json::Error) -> Self {
        HitCounterError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HitCounterError {
    fn from(err: toml::de::Error) -> Self {
        HitCounterError::ConfigLoad(err.to_string())
    }
}

impl From<chrono::ParseError> for HitCounterError {
    fn from(err: chrono::ParseError) -> Self {
        HitCounterError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HitCounterError>;
