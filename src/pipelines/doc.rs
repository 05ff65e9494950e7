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

//! # Annotated document model
//! Output types of the annotation pipeline: a `Doc` per input string, holding the
//! ordered `Token` sequence and the document-level entity spans.

use rust_tokenizers::Offset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::slice::Iter;
use std::str::FromStr;

/// # Universal POS tag
/// Closed set of the 17 Universal Dependencies part-of-speech categories.
/// Label strings outside the tagset map to `UposTag::X` (other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UposTag {
    /// Adjective
    Adj,
    /// Adposition
    Adp,
    /// Adverb
    Adv,
    /// Auxiliary
    Aux,
    /// Coordinating conjunction
    Cconj,
    /// Determiner
    Det,
    /// Interjection
    Intj,
    /// Noun
    Noun,
    /// Numeral
    Num,
    /// Particle
    Part,
    /// Pronoun
    Pron,
    /// Proper noun
    Propn,
    /// Punctuation
    Punct,
    /// Subordinating conjunction
    Sconj,
    /// Symbol
    Sym,
    /// Verb
    Verb,
    /// Other
    X,
}

impl UposTag {
    /// Canonical (upper-case) tagset string for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            UposTag::Adj => "ADJ",
            UposTag::Adp => "ADP",
            UposTag::Adv => "ADV",
            UposTag::Aux => "AUX",
            UposTag::Cconj => "CCONJ",
            UposTag::Det => "DET",
            UposTag::Intj => "INTJ",
            UposTag::Noun => "NOUN",
            UposTag::Num => "NUM",
            UposTag::Part => "PART",
            UposTag::Pron => "PRON",
            UposTag::Propn => "PROPN",
            UposTag::Punct => "PUNCT",
            UposTag::Sconj => "SCONJ",
            UposTag::Sym => "SYM",
            UposTag::Verb => "VERB",
            UposTag::X => "X",
        }
    }
}

impl FromStr for UposTag {
    type Err = ();

    /// Parses a tagset label, mapping unknown labels to `UposTag::X`. Never fails.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Ok(match label {
            "ADJ" => UposTag::Adj,
            "ADP" => UposTag::Adp,
            "ADV" => UposTag::Adv,
            "AUX" => UposTag::Aux,
            "CCONJ" => UposTag::Cconj,
            "DET" => UposTag::Det,
            "INTJ" => UposTag::Intj,
            "NOUN" => UposTag::Noun,
            "NUM" => UposTag::Num,
            "PART" => UposTag::Part,
            "PRON" => UposTag::Pron,
            "PROPN" => UposTag::Propn,
            "PUNCT" => UposTag::Punct,
            "SCONJ" => UposTag::Sconj,
            "SYM" => UposTag::Sym,
            "VERB" => UposTag::Verb,
            _ => UposTag::X,
        })
    }
}

impl fmt::Display for UposTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Token generated by a `LanguageModel`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Word position index within the document
    pub index: usize,
    /// String representation of the Token, sliced from the original input
    pub text: String,
    /// Universal POS tag
    pub pos: UposTag,
    /// Fine-grained (treebank-specific) tag
    pub tag: String,
    /// Dependency relation to the syntactic head
    pub dep: String,
    /// Word position index of the syntactic head. The root token is its own head.
    pub head: usize,
    /// Character offsets of the token in the original input
    pub offset: Option<Offset>,
    /// Tagger confidence score
    pub score: f64,
}

/// # Named entity span decoded from per-token IOB labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpan {
    /// String representation of the span, sliced from the original input
    pub text: String,
    /// Entity label (e.g. PER, LOC, ORG)
    pub label: String,
    /// Mean confidence score over the covered tokens
    pub score: f64,
    /// Index of the first covered token
    pub start: usize,
    /// Index after the last covered token
    pub end: usize,
}

/// # Annotated document
/// Result of applying a `LanguageModel` to one input string. Owns its ordered token
/// sequence; immutable after creation. Token order matches the left-to-right order
/// of the surface text in the original input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc {
    /// Original input string
    pub text: String,
    /// Ordered token sequence
    pub tokens: Vec<Token>,
    /// Entity spans over the token sequence
    pub ents: Vec<EntitySpan>,
}

impl Doc {
    /// Restartable iterator over the token sequence.
    pub fn iter(&self) -> Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Number of tokens in the document.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the document contains no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lazy, restartable sequence of report lines, one per token, in the form
    /// `<text>:<UPOS>`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use rust_ud::pipelines::annotation::LanguageModel;
    ///
    /// let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
    /// let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
    /// for line in docs[0].pos_lines() {
    ///     println!("{line}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn pos_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.tokens
            .iter()
            .map(|token| format!("{}:{}", token.text, token.pos))
    }
}

impl fmt::Display for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<'a> IntoIterator for &'a Doc {
    type Item = &'a Token;
    type IntoIter = Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
