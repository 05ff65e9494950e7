//! # Resource definitions for pretrained bundle files
//!
//! The annotation pipelines rely on the concept of Resources to access the files of a
//! pretrained bundle:
//! - model weights (TorchScript archive)
//! - configuration file (label vocabularies, tokenizer settings)
//! - vocabulary file (wordpiece vocabulary)
//!
//! These are expected in the pipeline configurations or are used as utilities to reference
//! the resource location. Two types of resources are pre-defined:
//! - LocalResource: points to a local file
//! - RemoteResource: points to a remote file via a URL
//!
//! For both types of resources, the local location of the file can be retrieved using
//! `get_local_path`, allowing to reference the resource file location regardless if it is a
//! remote or local resource. Default implementations for the shipped pretrained bundles are
//! available as constants in the `udify` module.

mod local;

use crate::common::error::RustUdError;
pub use local::LocalResource;
use std::path::PathBuf;

/// # Resource Trait that can provide the location of a bundle file
pub trait ResourceProvider {
    /// Provides the local path for a resource.
    ///
    /// # Returns
    ///
    /// * `PathBuf` pointing to the resource file
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
    fn get_local_path(&self) -> Result<PathBuf, RustUdError>;
}

#[cfg(feature = "remote")]
mod remote;
#[cfg(feature = "remote")]
pub use remote::RemoteResource;
