//! Error types for the bootstrap

use thiserror::Error;

/// Environment configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {var}")]
    Missing { var: &'static str },

    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Asset catalog lookups
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Symbol {symbol} not found in the {cluster} catalog")]
    UnknownSymbol { symbol: String, cluster: String },

    #[error("No asset catalog for cluster {cluster}")]
    ClusterNotSupported { cluster: String },

    #[error("Catalog address {address} for {symbol} is not a valid pubkey")]
    InvalidAddress { symbol: String, address: String },
}

/// Chain client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("RPC endpoint unreachable at {url}")]
    Unreachable { url: String },

    #[error("RPC request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Request rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to load keypair from {path}: {message}")]
    Keypair { path: String, message: String },
}

impl ClientError {
    /// Short machine-readable code, used as a log field
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::Timeout { .. } => "timeout",
            Self::AlreadyExists { .. } => "already_exists",
            Self::NotFound { .. } => "not_found",
            Self::Rejected { .. } => "rejected",
            Self::ParseError(_) => "parse_error",
            Self::Keypair { .. } => "keypair",
        }
    }

    /// The resource the call would create is already on chain
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Worth re-running later: network trouble or a read-back that lagged a write
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_codes() {
        let err = ClientError::AlreadyExists {
            resource: "group 0".into(),
        };
        assert_eq!(err.error_code(), "already_exists");
        assert!(err.is_duplicate());
        assert!(!err.is_transient());

        let err = ClientError::NotFound {
            resource: "stub oracle".into(),
        };
        assert_eq!(err.error_code(), "not_found");
        assert!(err.is_transient());

        let err = ClientError::Rejected {
            code: -32000,
            message: "bad instruction".into(),
        };
        assert!(!err.is_duplicate());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::UnknownSymbol {
            symbol: "DOGE".into(),
            cluster: "mainnet-beta".into(),
        };
        assert_eq!(
            err.to_string(),
            "Symbol DOGE not found in the mainnet-beta catalog"
        );

        let err = ConfigError::Missing { var: "CLUSTER_URL" };
        assert_eq!(
            err.to_string(),
            "Missing required environment variable CLUSTER_URL"
        );
    }
}
