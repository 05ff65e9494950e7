use crate::common::error::RustUdError;
use crate::resources::ResourceProvider;
use std::path::PathBuf;

/// # Resource backed by a file already present on disk
///
/// Points the pipeline at a bundle file (weights, configuration or vocabulary)
/// that needs no downloading, for offline use or locally trained bundles.
#[derive(PartialEq, Eq, Clone)]
pub struct LocalResource {
    /// Path of the file on disk
    pub local_path: PathBuf,
}

impl ResourceProvider for LocalResource {
    /// Returns the stored path unchanged. The file is not opened or checked for
    /// existence; a missing file surfaces later, when the pipeline reads it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_ud::resources::{LocalResource, ResourceProvider};
    /// use std::path::PathBuf;
    /// let config_resource = LocalResource {
    ///     local_path: PathBuf::from("path/to/config.json"),
    /// };
    /// let config_path = config_resource.get_local_path();
    /// ```
    fn get_local_path(&self) -> Result<PathBuf, RustUdError> {
        Ok(self.local_path.clone())
    }
}
