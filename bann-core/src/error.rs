//! Error taxonomy shared by every bann crate.
//!
//! Three failure classes, none of them retried internally:
//!
//! - **Parameter** — invalid K, negative or non-finite EPS, unknown divergence tag.
//! - **Dimension** — mismatched vector lengths, empty or ragged point sets.
//! - **Domain**    — a coordinate outside the generator's domain for a kind
//!   (zero or negative entries for `kl`/`is`, NaN or infinity anywhere).

use crate::divergence::DivergenceKind;

/// Which side of a query a point set came from. Used in diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Data,
    Query,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Data => f.write_str("data"),
            Role::Query => f.write_str("query"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BannError {
    #[error("invalid parameter `{name}`: {reason}")]
    Parameter { name: &'static str, reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual} ({context})")]
    Dimension {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("{role} point {index}, coordinate {coord} = {value} is outside the domain of `{kind}` ({requirement})")]
    Domain {
        kind: DivergenceKind,
        role: Role,
        index: usize,
        coord: usize,
        value: f64,
        requirement: &'static str,
    },
}

impl BannError {
    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        BannError::Parameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn dimension(expected: usize, actual: usize, context: impl Into<String>) -> Self {
        BannError::Dimension {
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, BannError::Parameter { .. })
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self, BannError::Dimension { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, BannError::Domain { .. })
    }
}

pub type Result<T> = std::result::Result<T, BannError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = BannError::dimension(3, 2, "query row 4");
        assert_eq!(
            err.to_string(),
            "dimension mismatch: expected 3, got 2 (query row 4)"
        );

        let err = BannError::Domain {
            kind: DivergenceKind::ItakuraSaito,
            role: Role::Data,
            index: 7,
            coord: 1,
            value: 0.0,
            requirement: "strictly positive",
        };
        let msg = err.to_string();
        assert!(msg.contains("data point 7"), "{msg}");
        assert!(msg.contains("`is`"), "{msg}");
    }

    #[test]
    fn test_classification() {
        assert!(BannError::parameter("k", "must be at least 1").is_parameter());
        assert!(BannError::dimension(1, 2, "x").is_dimension());
        assert!(!BannError::dimension(1, 2, "x").is_domain());
    }
}
