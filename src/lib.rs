//! Ready-to-use Universal Dependencies annotation pipelines.
//!
//! This crate loads pretrained annotation bundles (TorchScript artifacts executed
//! through [tch](https://github.com/LaurentMazare/tch-rs), tokenized with
//! [rust_tokenizers](https://github.com/guillaume-be/rust-tokenizers)) and applies
//! them to input strings, producing annotated documents: part-of-speech tags,
//! dependency edges and named entity spans. An interactive local visualization
//! server renders dependency trees and entity highlights for browser viewing.
//!
//! The linguistic behaviour is entirely contained in the pretrained bundle; the
//! crate decodes the artifact's output tensors and does not implement tokenization
//! rules, tagging rules or parsing algorithms of its own.
//!
//! # Quick start
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use rust_ud::pipelines::annotation::LanguageModel;
//! use rust_ud::viz::{self, VisualizationStyle};
//!
//! let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
//! let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
//!
//! for line in docs[0].pos_lines() {
//!     println!("{line}");
//! }
//!
//! // blocks until the process is interrupted
//! viz::serve(&docs, VisualizationStyle::Dependency, Default::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Loading
//!
//! Pretrained bundles are resolved by a locale+size identifier against the crate's
//! registry (`pt_core_news_sm`, `pt_core_news_md`). The three bundle files (weights,
//! configuration, vocabulary) are downloaded and cached on first use under
//! `$RUSTUD_CACHE` (defaulting to the user cache directory, `~/.cache/.rustud` on
//! most Linux systems). Unknown identifiers fail with
//! `RustUdError::ModelNotAvailableError`; loading is not retried.

pub mod common;
pub mod pipelines;
pub mod udify;
pub mod viz;

pub use common::error::RustUdError;
pub use common::resources;
pub use common::Config;
