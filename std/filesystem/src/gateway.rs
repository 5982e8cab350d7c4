//! Error contract between the tool router and the transport.
//!
//! A tool call never fails at the protocol level: router failures (unknown
//! tool, arguments that do not fit the tool's schema) are turned into
//! error-flagged text results, the same shape tool errors already take.

use crate::error::FsError;
use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
};

/// Wrap an error as an error-flagged tool result.
pub fn error_result(error: &FsError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error.to_tool_text())])
}

/// Convert a routing failure for `tool` into a tool result.
///
/// `known` tells whether the router has a handler under that name; if it
/// does, the failure came from argument validation.
pub fn router_failure(tool: &str, known: bool, err: &ErrorData) -> CallToolResult {
    let error = if known {
        FsError::Schema(err.message.to_string())
    } else {
        FsError::UnknownTool(tool.to_string())
    };
    error_result(&error)
}
