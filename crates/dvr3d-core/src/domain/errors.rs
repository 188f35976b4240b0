use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DvrResult<T> = Result<T, DvrError>;
pub type CodecResult<T> = DvrResult<T>;
pub type PipelineResult<T> = DvrResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DvrErrorCategory {
    Success,
    FormatError,
    TypeError,
    ParseError,
    LookupError,
    ConsistencyError,
    ExternalProcessError,
    IoError,
    InternalError,
}

impl DvrErrorCategory {
    pub const fn exit_placeholder(self) -> ExitPlaceholder {
        match self {
            Self::Success => ExitPlaceholder {
                exit_code: 0,
                rust_category: "Success",
                exit_class: "SUCCESS",
            },
            Self::FormatError => ExitPlaceholder {
                exit_code: 2,
                rust_category: "FormatError",
                exit_class: "INPUT_FATAL",
            },
            Self::TypeError => ExitPlaceholder {
                exit_code: 2,
                rust_category: "TypeError",
                exit_class: "INPUT_FATAL",
            },
            Self::ParseError => ExitPlaceholder {
                exit_code: 2,
                rust_category: "ParseError",
                exit_class: "INPUT_FATAL",
            },
            Self::LookupError => ExitPlaceholder {
                exit_code: 2,
                rust_category: "LookupError",
                exit_class: "INPUT_FATAL",
            },
            Self::IoError => ExitPlaceholder {
                exit_code: 3,
                rust_category: "IoError",
                exit_class: "IO_FATAL",
            },
            Self::ConsistencyError => ExitPlaceholder {
                exit_code: 4,
                rust_category: "ConsistencyError",
                exit_class: "RUN_FATAL",
            },
            Self::ExternalProcessError => ExitPlaceholder {
                exit_code: 4,
                rust_category: "ExternalProcessError",
                exit_class: "RUN_FATAL",
            },
            Self::InternalError => ExitPlaceholder {
                exit_code: 5,
                rust_category: "InternalError",
                exit_class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_placeholder().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_placeholder().rust_category
    }

    pub const fn exit_class(self) -> &'static str {
        self.exit_placeholder().exit_class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPlaceholder {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub exit_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DvrError {
    category: DvrErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl DvrError {
    pub fn new(
        category: DvrErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn format(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::FormatError, placeholder, message)
    }

    pub fn type_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::TypeError, placeholder, message)
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::ParseError, placeholder, message)
    }

    pub fn lookup(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::LookupError, placeholder, message)
    }

    pub fn consistency(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::ConsistencyError, placeholder, message)
    }

    pub fn external_process(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::ExternalProcessError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::IoError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(DvrErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> DvrErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for DvrError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for DvrError {}
