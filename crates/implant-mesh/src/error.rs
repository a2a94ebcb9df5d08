//! Error types for implant generation with rich diagnostics.
//!
//! Every error carries:
//! - A machine-readable error code
//! - A recovery suggestion
//! - Terminal-friendly help text via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `IMPL-XXXX`:
//! - `IMPL-1xxx`: I/O errors (configuration files, mesh export)
//! - `IMPL-2xxx`: Parameter errors (values or ordering rejected before sampling)
//! - `IMPL-3xxx`: Generation errors (numerical faults in the produced geometry)
//!
//! # Example
//!
//! ```
//! use implant_mesh::{ErrorCode, ImplantError};
//!
//! let err = ImplantError::invalid_parameter("thread_pitch", -1.0, "must be positive");
//! assert_eq!(err.code(), ErrorCode::InvalidParameter);
//! assert_eq!(err.code().as_str(), "IMPL-2001");
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for implant operations.
pub type ImplantResult<T> = Result<T, ImplantError>;

/// Machine-readable error codes.
///
/// Codes follow the pattern `IMPL-XXXX` where:
/// - 1xxx = I/O errors
/// - 2xxx = Parameter errors
/// - 3xxx = Generation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// IMPL-1001: Failed to read file
    IoRead = 1001,
    /// IMPL-1002: Failed to write file
    IoWrite = 1002,
    /// IMPL-1003: Failed to parse a configuration file
    ConfigParse = 1003,
    /// IMPL-1004: Unsupported file format
    UnsupportedFormat = 1004,

    // Parameter errors (2xxx)
    /// IMPL-2001: A single parameter has an invalid value
    InvalidParameter = 2001,
    /// IMPL-2002: Parameters violate the longitudinal ordering
    InvalidOrdering = 2002,

    // Generation errors (3xxx)
    /// IMPL-3001: The profile produced a NaN or infinite radius
    NonFiniteRadius = 3001,
    /// IMPL-3002: A mesh vertex has a NaN or infinite coordinate
    InvalidCoordinate = 3002,
    /// IMPL-3003: A face references a vertex that does not exist
    InvalidVertexIndex = 3003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `IMPL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "IMPL-1001",
            ErrorCode::IoWrite => "IMPL-1002",
            ErrorCode::ConfigParse => "IMPL-1003",
            ErrorCode::UnsupportedFormat => "IMPL-1004",
            ErrorCode::InvalidParameter => "IMPL-2001",
            ErrorCode::InvalidOrdering => "IMPL-2002",
            ErrorCode::NonFiniteRadius => "IMPL-3001",
            ErrorCode::InvalidCoordinate => "IMPL-3002",
            ErrorCode::InvalidVertexIndex => "IMPL-3003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for implant errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Change one or more parameters.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Check the file system.
    CheckPath { checks: Vec<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Fix the configuration file syntax.
    FixConfig { hint: String },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::CheckPath { checks } => {
                write!(f, "Check: {}", checks.join(", "))
            }
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::FixConfig { hint } => write!(f, "{}", hint),
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Errors that can occur while configuring, generating or exporting an implant.
#[derive(Debug, Error, Diagnostic)]
pub enum ImplantError {
    /// Error reading a file.
    #[error("failed to read {path}")]
    #[diagnostic(
        code(implant::io::read),
        help("Check that the file exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a file.
    #[error("failed to write mesh to {path}")]
    #[diagnostic(
        code(implant::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration {path}: {details}")]
    #[diagnostic(
        code(implant::config::parse),
        help("Run `implant params` to print a valid configuration to start from.")
    )]
    ConfigParse { path: PathBuf, details: String },

    /// Unsupported file format.
    #[error("unsupported file format: {extension:?}")]
    #[diagnostic(
        code(implant::format::unsupported),
        help("Meshes: STL, OBJ. Configurations: TOML, JSON.")
    )]
    UnsupportedFormat { extension: Option<String> },

    /// A parameter has an invalid value.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    #[diagnostic(
        code(implant::params::value),
        help("All lengths are in millimeters and must be finite and positive.")
    )]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: String,
    },

    /// The longitudinal ordering of the parameters is violated.
    #[error("invalid parameter ordering: {details}")]
    #[diagnostic(
        code(implant::params::ordering),
        help(
            "Heights must satisfy 0 < apex_length < thread_start_height < thread_end_height < total_length - collar_height."
        )
    )]
    InvalidOrdering { details: String },

    /// The profile evaluated to NaN or infinity.
    #[error("profile produced a non-finite radius {radius} at height {height}, angle {angle}")]
    #[diagnostic(
        code(implant::generate::radius),
        help("This indicates extreme parameter values. Check lengths and thread settings.")
    )]
    NonFiniteRadius { height: f64, angle: f64, radius: f64 },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(implant::generate::coordinate),
        help("Check for numerical issues in the placement axis or the parameters.")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// A face references a missing vertex.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(code(implant::generate::vertex_index))]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },
}

impl ImplantError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ImplantError::IoRead { .. } => ErrorCode::IoRead,
            ImplantError::IoWrite { .. } => ErrorCode::IoWrite,
            ImplantError::ConfigParse { .. } => ErrorCode::ConfigParse,
            ImplantError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            ImplantError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            ImplantError::InvalidOrdering { .. } => ErrorCode::InvalidOrdering,
            ImplantError::NonFiniteRadius { .. } => ErrorCode::NonFiniteRadius,
            ImplantError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            ImplantError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            ImplantError::IoRead { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            ImplantError::IoWrite { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            ImplantError::ConfigParse { .. } => RecoverySuggestion::FixConfig {
                hint: "Compare the file against the output of `implant params`".into(),
            },
            ImplantError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec![".stl".into(), ".obj".into(), ".toml".into(), ".json".into()],
            },
            ImplantError::InvalidParameter { name, reason, .. } => {
                RecoverySuggestion::AdjustParameters {
                    parameters: vec![((*name).to_string(), reason.clone())],
                }
            }
            ImplantError::InvalidOrdering { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("apex_length".into(), "below thread_start_height".into()),
                    (
                        "thread_end_height".into(),
                        "below total_length - collar_height".into(),
                    ),
                ],
            },
            ImplantError::NonFiniteRadius { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("thread_pitch".into(), "use a moderate value".into())],
            },
            ImplantError::InvalidCoordinate { .. } | ImplantError::InvalidVertexIndex { .. } => {
                RecoverySuggestion::None
            }
        }
    }

    // Constructor helpers for common error patterns

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        ImplantError::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    /// Create an InvalidOrdering error.
    pub fn invalid_ordering(details: impl Into<String>) -> Self {
        ImplantError::InvalidOrdering {
            details: details.into(),
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImplantError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImplantError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ConfigParse error.
    pub fn config_parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        ImplantError::ConfigParse {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(extension: Option<String>) -> Self {
        ImplantError::UnsupportedFormat { extension }
    }

    /// Whether this error came from parameter validation.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            ImplantError::InvalidParameter { .. } | ImplantError::InvalidOrdering { .. }
        )
    }
}

/// Issues collected while checking generated mesh data.
///
/// Unlike `ImplantError`, these can be collected without stopping the check.
#[derive(Debug, Clone)]
pub enum ValidationIssue {
    /// Face references a vertex index that doesn't exist.
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },
    /// Vertex has a NaN coordinate.
    NaNCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
    },
    /// Vertex has an infinite coordinate.
    InfiniteCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },
}

impl ValidationIssue {
    /// Returns an error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationIssue::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex.as_str(),
            ValidationIssue::NaNCoordinate { .. } | ValidationIssue::InfiniteCoordinate { .. } => {
                ErrorCode::InvalidCoordinate.as_str()
            }
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            } => write!(
                f,
                "[{}] face {} references vertex {} (mesh has {} vertices)",
                self.code(),
                face_index,
                vertex_index,
                vertex_count
            ),
            ValidationIssue::NaNCoordinate {
                vertex_index,
                coordinate,
            } => write!(
                f,
                "[{}] vertex {} has NaN {} coordinate",
                self.code(),
                vertex_index,
                coordinate
            ),
            ValidationIssue::InfiniteCoordinate {
                vertex_index,
                coordinate,
                value,
            } => write!(
                f,
                "[{}] vertex {} has infinite {} coordinate ({})",
                self.code(),
                vertex_index,
                coordinate,
                value
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::IoRead.as_str(), "IMPL-1001");
        assert_eq!(ErrorCode::InvalidOrdering.as_str(), "IMPL-2002");
        assert_eq!(ErrorCode::NonFiniteRadius.to_string(), "IMPL-3001");
    }

    #[test]
    fn test_error_code_mapping() {
        let err = ImplantError::invalid_ordering("apex_length >= thread_start_height");
        assert_eq!(err.code(), ErrorCode::InvalidOrdering);
        assert!(err.is_parameter_error());

        let err = ImplantError::unsupported_format(Some("ply".into()));
        assert_eq!(err.code(), ErrorCode::UnsupportedFormat);
        assert!(!err.is_parameter_error());
    }

    #[test]
    fn test_error_display() {
        let err = ImplantError::invalid_parameter("thread_pitch", 0.0, "must be positive");
        let msg = err.to_string();
        assert!(msg.contains("thread_pitch"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_recovery_suggestion_names_parameter() {
        let err = ImplantError::invalid_parameter("body_radius", -2.0, "must be positive");
        let suggestion = err.recovery_suggestion().to_string();
        assert!(suggestion.contains("body_radius"));
    }

    #[test]
    fn test_io_error_helpers() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ImplantError::io_read("implant.toml", source);
        assert_eq!(err.code(), ErrorCode::IoRead);
        assert!(err.to_string().contains("implant.toml"));
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::NaNCoordinate {
            vertex_index: 7,
            coordinate: "x",
        };
        let text = issue.to_string();
        assert!(text.contains("IMPL-3002"));
        assert!(text.contains("vertex 7"));
    }
}
