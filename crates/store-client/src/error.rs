//! Object store client errors

use thiserror::Error;

/// Errors that can occur when talking to an object store
///
/// `NotFound`, `AlreadyExists` and `Conflict` are the store-native signals
/// callers pattern-match on; they are never rewrapped by higher layers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or client-side Kubernetes error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The client could not be built (bad kubeconfig, unreachable endpoint)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The addressed object does not exist
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// `namespace/name` of the missing object
        name: String,
    },

    /// An object with the same key already exists
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists {
        /// Kind of the conflicting object
        kind: String,
        /// `namespace/name` of the conflicting object
        name: String,
    },

    /// Optimistic-concurrency conflict (stale resourceVersion)
    #[error("Operation cannot be fulfilled on {kind} \"{name}\": {message}")]
    Conflict {
        /// Kind of the contended object
        kind: String,
        /// `namespace/name` of the contended object
        name: String,
        /// Server-provided explanation
        message: String,
    },

    /// The store rejected the request for another reason
    #[error("Store API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The object cannot be addressed (missing name, apiVersion or kind)
    #[error("Invalid object: {0}")]
    InvalidObject(String),
}

impl StoreError {
    /// Whether the addressed object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether a create collided with an existing object
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Whether a write lost an optimistic-concurrency race
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Translate a kube error for the object `kind` `name` into the store taxonomy
    pub(crate) fn from_kube(err: kube::Error, kind: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(response) => match (response.code, response.reason.as_str()) {
                (404, _) => StoreError::NotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                },
                (409, "AlreadyExists") => StoreError::AlreadyExists {
                    kind: kind.to_string(),
                    name: name.to_string(),
                },
                (409, _) => StoreError::Conflict {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    message: response.message.clone(),
                },
                (code, reason) => {
                    StoreError::Api(format!("{} {}: {}", code, reason, response.message))
                }
            },
            other => StoreError::Kube(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_matches_api_server() {
        let err = StoreError::NotFound {
            kind: "Secret".to_string(),
            name: "fleet/creds".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());
        assert_eq!(err.to_string(), "Secret \"fleet/creds\" not found");
    }

    #[test]
    fn test_already_exists_message() {
        let err = StoreError::AlreadyExists {
            kind: "Node".to_string(),
            name: "worker-0".to_string(),
        };
        assert!(err.is_already_exists());
        assert!(err.to_string().contains("already exists"));
    }
}
