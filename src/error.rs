use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use serde_dynamo::Error as SerdeDynamoError;
use std::error::Error as StdError;
use std::fmt;

type DynamoBatchGetItemError = SdkError<BatchGetItemError, Response>;
type DynamoBatchWriteItemError = SdkError<BatchWriteItemError, Response>;

/// Key composition or bulk table operation error
#[derive(Debug)]
pub enum Error {
    /// A facet declared by the index is absent or empty in the supplied values
    MissingFacet {
        /// Index whose template declares the facet
        index: String,
        /// Name of the facet that could not be resolved
        facet: String,
    },
    /// A physical key string does not match the template shape of its index
    MalformedKey {
        /// Index whose template the key was parsed against
        index: String,
        /// The offending physical key (or key attribute) text
        key: String,
    },
    /// No index with this name is registered for the entity
    UnknownIndex {
        /// Entity the lookup was scoped to
        entity: String,
        /// Requested index name
        index: String,
    },
    /// Serde DynamoDB serialization/deserialization error
    SerdeDynamo(SerdeDynamoError),
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// DynamoDB BatchGetItem operation error
    DynamoBatchGetItemError(DynamoBatchGetItemError),
    /// DynamoDB BatchWriteItem operation error
    DynamoBatchWriteItemError(DynamoBatchWriteItemError),
}

impl Error {
    /// Check if the error was raised while composing or parsing physical keys
    ///
    /// Composition errors are raised before any network call and are never
    /// retried.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::MissingFacet { .. } | Error::MalformedKey { .. } | Error::UnknownIndex { .. }
        )
    }

    /// Check if the error came back from the store or transport layer
    ///
    /// Store errors are hard failures: the bulk call rejects as a whole and
    /// any results aggregated on earlier attempts are discarded with it.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::DynamoBatchGetItemError(_) | Error::DynamoBatchWriteItemError(_)
        )
    }

    /// Check if the error is a serialization/deserialization error
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::SerdeDynamo(_))
    }
}

macro_rules! impl_from_error {
    ($name:ident, $variant:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$variant(e)
            }
        }
    };
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(SerdeDynamoError, SerdeDynamo);
impl_from_error!(BuildError);
impl_from_error!(DynamoBatchGetItemError);
impl_from_error!(DynamoBatchWriteItemError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingFacet { index, facet } => {
                write!(f, "missing facet '{}' for index '{}'", facet, index)
            }
            Error::MalformedKey { index, key } => {
                write!(f, "malformed physical key for index '{}': '{}'", index, key)
            }
            Error::UnknownIndex { entity, index } => {
                write!(f, "no index '{}' registered for entity '{}'", index, entity)
            }
            Error::SerdeDynamo(e) => write!(f, "DynamoDB serialization error: {}", e),
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::DynamoBatchGetItemError(e) => {
                write!(f, "DynamoDB BatchGetItem operation failed: {}", e)
            }
            Error::DynamoBatchWriteItemError(e) => {
                write!(f, "DynamoDB BatchWriteItem operation failed: {}", e)
            }
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_composition_error() {
        let err = Error::MissingFacet {
            index: "primary".to_string(),
            facet: "org".to_string(),
        };
        assert!(err.is_composition_error());
        assert!(!err.is_store_error());
    }

    #[test]
    fn test_is_store_error() {
        let err = Error::DynamoBatchGetItemError(SdkError::timeout_error("simulated"));
        assert!(err.is_store_error());
        assert!(!err.is_composition_error());
    }

    #[test]
    fn test_error_conversion() {
        let build_err = BuildError::other("test");
        let err: Error = build_err.into();
        assert!(matches!(err, Error::BuildError(_)));
    }

    #[test]
    fn test_display_names_the_operation() {
        let err = Error::DynamoBatchWriteItemError(SdkError::timeout_error("simulated"));
        assert!(err.to_string().contains("BatchWriteItem"));
    }

    #[test]
    fn test_display_names_the_facet() {
        let err = Error::MissingFacet {
            index: "gsi1".to_string(),
            facet: "tenant".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("gsi1"));
        assert!(text.contains("tenant"));
    }
}
