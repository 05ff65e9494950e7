// Copyright 2023 The rust-ud Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Interactive visualization of annotated documents
//!
//! Renders annotated `Doc`s as an HTML page (dependency-arc SVG for the `dep` style,
//! entity-highlight HTML for the `ent` style) and serves it from a blocking local
//! HTTP server for browser viewing:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use rust_ud::pipelines::annotation::LanguageModel;
//! use rust_ud::viz::{self, VisualizationStyle};
//!
//! let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
//! let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
//! viz::serve(&docs, VisualizationStyle::Dependency, Default::default())?;
//! # Ok(())
//! # }
//! ```

mod dependency;
mod entity;
mod server;

pub use server::{serve, VisualizationServerConfig};

use crate::common::error::RustUdError;
use crate::pipelines::doc::Doc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// # Display style for the visualizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualizationStyle {
    /// Dependency-tree view (selector string `"dep"`)
    Dependency,
    /// Named-entity view (selector string `"ent"`)
    Entity,
}

impl FromStr for VisualizationStyle {
    type Err = RustUdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dep" => Ok(VisualizationStyle::Dependency),
            "ent" => Ok(VisualizationStyle::Entity),
            _ => Err(RustUdError::InvalidConfigurationError(format!(
                "{value} is not a visualization style (expected \"dep\" or \"ent\")"
            ))),
        }
    }
}

impl fmt::Display for VisualizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisualizationStyle::Dependency => "dep",
            VisualizationStyle::Entity => "ent",
        })
    }
}

const PAGE_STYLE: &str = "\
body { font-family: sans-serif; background: #fafafa; margin: 2em; }\n\
figure { margin: 0 0 4em 0; overflow-x: auto; }\n\
svg { font-size: 16px; }\n\
.ents { font-size: 18px; line-height: 2.4; max-width: 60em; }\n\
mark { background: #ddd; padding: 0.3em 0.4em; border-radius: 0.35em; }\n\
mark .label { font-size: 0.66em; font-weight: bold; vertical-align: middle; margin-left: 0.5em; }\n";

/// Renders the full visualization page for a collection of documents.
/// Pure with respect to its inputs.
pub fn render(docs: &[Doc], style: VisualizationStyle) -> String {
    render_page(docs, style, "rust-ud")
}

pub(crate) fn render_page(docs: &[Doc], style: VisualizationStyle, title: &str) -> String {
    let mut body = String::new();
    for doc in docs {
        body.push_str("<figure>\n");
        match style {
            VisualizationStyle::Dependency => body.push_str(&dependency::render_svg(doc)),
            VisualizationStyle::Entity => body.push_str(&entity::render_html(doc)),
        }
        body.push_str("\n</figure>\n");
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        PAGE_STYLE,
        body
    )
}

/// Minimal HTML escaping for text interpolated into markup.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(character),
        }
    }
    escaped
}
