//! Host capabilities available to components.
//!
//! The host decides how files are stored and how outbound HTTP is made;
//! components only see these traits.

use indexmap::IndexMap;

/// Error from a capability call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// No file with that name
    #[error("File not found: {name}")]
    NotFound {
        /// File name
        name: String,
    },
    /// The host does not allow the operation
    #[error("Capability denied: {reason}")]
    Denied {
        /// Why it was denied
        reason: String,
    },
    /// The operation was attempted and failed
    #[error("Capability failed: {reason}")]
    Failed {
        /// Failure description
        reason: String,
    },
}

/// Result of an outbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResult {
    /// Status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Per-component file storage
pub trait FileStorage: Send + Sync {
    /// Read a stored file
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no file has that name
    fn load_file(&self, name: &str) -> Result<Vec<u8>, CapabilityError>;

    /// Store a file, replacing any earlier one
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    fn store_file(&self, name: &str, data: &[u8]) -> Result<(), CapabilityError>;

    /// Delete a stored file
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no file has that name
    fn delete_file(&self, name: &str) -> Result<(), CapabilityError>;

    /// Names of all stored files
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be listed
    fn list_files(&self) -> Result<Vec<String>, CapabilityError>;
}

/// Outbound HTTP access
pub trait HttpAccess: Send + Sync {
    /// GET a URL
    ///
    /// # Errors
    ///
    /// Returns error if no response was obtained
    fn http_get(
        &self,
        url: &str,
        headers: &IndexMap<String, String>,
    ) -> Result<HttpResult, CapabilityError>;

    /// POST a body to a URL
    ///
    /// # Errors
    ///
    /// Returns error if no response was obtained
    fn http_post(
        &self,
        url: &str,
        body: &str,
        headers: &IndexMap<String, String>,
    ) -> Result<HttpResult, CapabilityError>;

    /// Set basic credentials for later requests
    fn http_set_credentials(&self, account: &str, password: &str);
}

/// Everything a host may offer a component
pub trait Capabilities: FileStorage + HttpAccess {}

impl<T: FileStorage + HttpAccess> Capabilities for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryHost {
        files: Mutex<IndexMap<String, Vec<u8>>>,
        credentials: Mutex<Option<(String, String)>>,
    }

    impl FileStorage for MemoryHost {
        fn load_file(&self, name: &str) -> Result<Vec<u8>, CapabilityError> {
            self.files
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| CapabilityError::NotFound { name: name.into() })
        }

        fn store_file(&self, name: &str, data: &[u8]) -> Result<(), CapabilityError> {
            self.files.lock().unwrap().insert(name.into(), data.to_vec());
            Ok(())
        }

        fn delete_file(&self, name: &str) -> Result<(), CapabilityError> {
            self.files
                .lock()
                .unwrap()
                .shift_remove(name)
                .map(|_| ())
                .ok_or_else(|| CapabilityError::NotFound { name: name.into() })
        }

        fn list_files(&self) -> Result<Vec<String>, CapabilityError> {
            Ok(self.files.lock().unwrap().keys().cloned().collect())
        }
    }

    impl HttpAccess for MemoryHost {
        fn http_get(
            &self,
            url: &str,
            _headers: &IndexMap<String, String>,
        ) -> Result<HttpResult, CapabilityError> {
            Err(CapabilityError::Denied { reason: format!("no network for {url}") })
        }

        fn http_post(
            &self,
            url: &str,
            _body: &str,
            _headers: &IndexMap<String, String>,
        ) -> Result<HttpResult, CapabilityError> {
            Err(CapabilityError::Denied { reason: format!("no network for {url}") })
        }

        fn http_set_credentials(&self, account: &str, password: &str) {
            *self.credentials.lock().unwrap() = Some((account.into(), password.into()));
        }
    }

    #[test]
    fn test_capabilities_object() {
        let host: Arc<dyn Capabilities> = Arc::new(MemoryHost::default());
        host.store_file("a.txt", b"hello").unwrap();
        assert_eq!(host.load_file("a.txt").unwrap(), b"hello");
        assert_eq!(host.list_files().unwrap(), vec!["a.txt".to_string()]);
        host.delete_file("a.txt").unwrap();
        assert!(matches!(
            host.load_file("a.txt"),
            Err(CapabilityError::NotFound { .. })
        ));
        assert!(host.http_get("http://example.com", &IndexMap::new()).is_err());
        host.http_set_credentials("user", "secret");
    }
}
