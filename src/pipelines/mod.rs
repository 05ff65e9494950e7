//! # Ready-to-use annotation pipelines
//!
//! Based on pretrained Universal Dependencies bundles resolved by name. The following
//! capabilities are currently available:
//!
//! #### 1. Annotation
//! Applies a pretrained bundle to input strings, producing one annotated `Doc` per
//! input: an ordered token sequence with Universal POS tags, fine-grained tags,
//! dependency edges and named entity spans.
//!
//! ```no_run
//! use rust_ud::pipelines::annotation::LanguageModel;
//! # fn main() -> anyhow::Result<()> {
//! let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
//! let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
//! # Ok(())
//! # }
//! ```
//!
//! #### 2. Reporting
//! `Doc::pos_lines` yields one human-readable line per token in the form
//! `<text>:<UPOS>`:
//!
//! ```no_run
//! # use rust_ud::pipelines::annotation::LanguageModel;
//! # fn main() -> anyhow::Result<()> {
//! # let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
//! # let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
//! for line in docs[0].pos_lines() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//! Output: \
//! `Eu:PRON` \
//! `vi:VERB` \
//! `o:DET` \
//! `menino:NOUN` \
//! `com:ADP` \
//! `o:DET` \
//! `telescópio:NOUN`

pub mod annotation;
pub mod doc;
