/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 30/09/2026
Last Modified: 16/10/2026
License: MIT
*/

use thiserror::Error;

/// Schema errors raised while a tool's descriptor table is being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("parameter '{parameter}' is declared more than once")]
    DuplicateParameter { parameter: String },

    #[error("parameter '{parameter}' cannot be {role}: {reason}")]
    IncompatibleRole {
        parameter: String,
        role: String,
        reason: String,
    },

    #[error("invalid domain on parameter '{parameter}': {reason}")]
    InvalidDomain { parameter: String, reason: String },

    #[error("invalid default value '{value}' on parameter '{parameter}': {reason}")]
    InvalidDefault {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("coded value token '{token}' is mapped to more than one member")]
    DuplicateToken { token: String },

    #[error("coded value member '{member}' is declared more than once")]
    DuplicateMember { member: String },

    #[error("a coded value map needs at least one entry")]
    EmptyCodedValues,

    #[error("tool '{tool}' is already registered")]
    DuplicateTool { tool: String },
}

/// Failures translating between enum members and wire tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("'{member}' is not a declared member")]
    UnknownEnumMember { member: String },

    #[error("token '{token}' is not in the coded value map")]
    UnrecognizedToken { token: String },
}

/// Failures reported by an executor collaborator. The runtime never
/// interprets these, it only forwards them.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("tool execution failed: {}", .messages.join("; "))]
    ToolFailed { messages: Vec<String> },

    #[error("tool execution was cancelled")]
    Cancelled,

    #[error("tool execution exceeded its deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed engine response: {0}")]
    Protocol(#[from] serde_json::Error),
}

/// Errors surfaced by `ProcessRuntime::execute` and the tool registry.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("tool '{tool}' is missing required parameter '{parameter}'")]
    MissingRequiredParameter { tool: String, parameter: String },

    #[error("value for parameter '{parameter}' violates its domain: {reason}")]
    DomainViolation { parameter: String, reason: String },

    #[error("environment setting(s) {} are not valid for tool '{tool}'", .keys.join(", "))]
    InvalidEnvironmentKey { tool: String, keys: Vec<String> },

    #[error("parameter '{parameter}' expects {expected}, found {found}")]
    TypeMismatch {
        parameter: String,
        expected: String,
        found: String,
    },

    #[error("'{member}' is not a declared member for parameter '{parameter}'")]
    UnknownEnumMember { parameter: String, member: String },

    #[error("tool '{tool}' has no parameter named '{parameter}'")]
    UnknownParameter { tool: String, parameter: String },

    #[error("parameter '{parameter}' is derived and cannot be assigned")]
    ReadOnlyParameter { parameter: String },

    #[error("unrecognized tool name {0}")]
    UnknownTool(String),

    #[error(transparent)]
    ExecutionFailed(#[from] ExecutorError),
}

impl ProcessError {
    /// True for caller mistakes detected before the executor is reached.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ProcessError::MissingRequiredParameter { .. }
                | ProcessError::DomainViolation { .. }
                | ProcessError::InvalidEnvironmentKey { .. }
                | ProcessError::UnknownParameter { .. }
                | ProcessError::ReadOnlyParameter { .. }
                | ProcessError::UnknownTool(_)
        )
    }

    pub(crate) fn from_codec(parameter: &str, err: CodecError) -> ProcessError {
        match err {
            CodecError::UnknownEnumMember { member } => ProcessError::UnknownEnumMember {
                parameter: parameter.to_string(),
                member,
            },
            CodecError::UnrecognizedToken { token } => ProcessError::DomainViolation {
                parameter: parameter.to_string(),
                reason: format!("'{}' is not one of the coded values", token),
            },
        }
    }
}
