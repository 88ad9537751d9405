use thiserror::Error;

/// Addressing failures. None of these are fatal: they are reported back to
/// the caller so it can correct the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The heading, path, block or field does not exist. `available` lists
    /// what was found instead.
    #[error("{target_type} '{target}' not found. Available: {}", format_available(.available))]
    NotFound {
        target_type: String,
        target: String,
        available: Vec<String>,
    },

    #[error("invalid operation: {0}. Must be one of: append, prepend, replace")]
    InvalidOperation(String),

    #[error("invalid target_type: {0}. Must be one of: heading, block, frontmatter")]
    InvalidTargetType(String),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        format!("[{}]", available.join(", "))
    }
}

impl TargetError {
    pub fn not_found(
        target_type: impl Into<String>,
        target: impl Into<String>,
        available: Vec<String>,
    ) -> Self {
        TargetError::NotFound {
            target_type: target_type.into(),
            target: target.into(),
            available,
        }
    }

    pub fn invalid_operation(operation: impl Into<String>) -> Self {
        TargetError::InvalidOperation(operation.into())
    }

    pub fn invalid_target_type(target_type: impl Into<String>) -> Self {
        TargetError::InvalidTargetType(target_type.into())
    }

    /// Alternatives discovered while searching, if any.
    pub fn available(&self) -> &[String] {
        match self {
            TargetError::NotFound { available, .. } => available,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_lists_alternatives() {
        let err = TargetError::not_found(
            "heading",
            "Nope",
            vec!["Intro".to_string(), "Setup".to_string()],
        );

        assert_eq!("heading 'Nope' not found. Available: [Intro, Setup]", err.to_string());
        assert_eq!(2, err.available().len());
    }

    #[test]
    fn not_found_message_without_alternatives() {
        let err = TargetError::not_found("block", "abc", Vec::new());
        assert_eq!("block 'abc' not found. Available: none", err.to_string());
    }
}
