//! Calculator tool result type.

use crate::error::ToolError;

/// The outcome of one calculator invocation.
///
/// Consumed immediately by the persona engine; only its formatted text
/// survives (as an agent turn in memory).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The expression that was evaluated
    pub expression: String,

    /// The numeric value, or why there is none
    pub value: std::result::Result<f64, ToolError>,
}

impl ToolResult {
    pub fn success(&self) -> bool {
        self.value.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_reflects_value() {
        let ok = ToolResult {
            expression: "2 + 2".into(),
            value: Ok(4.0),
        };
        let err = ToolResult {
            expression: "1 / 0".into(),
            value: Err(ToolError::DivisionByZero),
        };
        assert!(ok.success());
        assert!(!err.success());
    }
}
