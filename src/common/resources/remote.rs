use super::*;
use crate::common::error::RustUdError;
use cached_path::{Cache, Options, ProgressBar};
use dirs::cache_dir;
use lazy_static::lazy_static;
use std::path::PathBuf;

/// # Resource fetched over HTTP and kept in the shared cache
///
/// Declares where a bundle file lives remotely and under which cache
/// subdirectory it should land. Nothing is transferred until
/// `get_local_path` is called; repeated calls reuse the cached copy.
#[derive(PartialEq, Eq, Clone)]
pub struct RemoteResource {
    /// Source URL of the file
    pub url: String,
    /// Subdirectory of the cache root the file is stored under
    pub cache_subdir: String,
}

impl RemoteResource {
    /// Declares a remote resource with an explicit cache subdirectory.
    ///
    /// # Arguments
    ///
    /// * `url` - `&str` Source URL of the file
    /// * `cache_subdir` - `&str` Subdirectory of the cache root to store the file under
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_ud::resources::RemoteResource;
    /// let config_resource = RemoteResource::new("http://config_json_location", "configs");
    /// ```
    pub fn new(url: &str, cache_subdir: &str) -> RemoteResource {
        RemoteResource {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
        }
    }

    /// Declares a remote resource from one of the pretrained registry tuples
    /// (cache subdirectory, URL), as listed in the `Udify*Resources` constants.
    ///
    /// # Arguments
    ///
    /// * `name_url_tuple` - `(&str, &str)` Cache subdirectory and source URL of the file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_ud::resources::RemoteResource;
    /// let model_resource = RemoteResource::from_pretrained((
    ///     "pt_core_news_sm/model",
    ///     "https://huggingface.co/rust-ud/pt_core_news_sm/resolve/main/model.pt",
    /// ));
    /// ```
    pub fn from_pretrained(name_url_tuple: (&str, &str)) -> RemoteResource {
        let cache_subdir = name_url_tuple.0.to_string();
        let url = name_url_tuple.1.to_string();
        RemoteResource { url, cache_subdir }
    }
}

impl ResourceProvider for RemoteResource {
    /// Downloads the file into the cache if it is not there yet and returns the
    /// cached location.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_ud::resources::{RemoteResource, ResourceProvider};
    /// let model_resource = RemoteResource::from_pretrained((
    ///     "pt_core_news_sm/vocab",
    ///     "https://huggingface.co/rust-ud/pt_core_news_sm/resolve/main/vocab.txt",
    /// ));
    /// let vocab_path = model_resource.get_local_path();
    /// ```
    fn get_local_path(&self) -> Result<PathBuf, RustUdError> {
        let cached_path = CACHE
            .cached_path_with_options(&self.url, &Options::default().subdir(&self.cache_subdir))?;
        Ok(cached_path)
    }
}

lazy_static! {
    #[derive(Copy, Clone, Debug)]
/// # Cache shared by every remote resource
/// Rooted at `$RUSTUD_CACHE` when that environment variable is set, otherwise at
/// `.rustud` inside the user cache directory (`$XDG_CACHE_HOME` or the platform
/// equivalent).
    pub static ref CACHE: Cache = Cache::builder()
        .dir(_get_cache_directory())
        .progress_bar(Some(ProgressBar::Light))
        .build().unwrap();
}

fn _get_cache_directory() -> PathBuf {
    match std::env::var("RUSTUD_CACHE") {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            let mut home = cache_dir().unwrap();
            home.push(".rustud");
            home
        }
    }
}
