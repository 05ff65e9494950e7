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

//! # Universal Dependencies annotation pipeline
//! Loads a pretrained bundle by name and applies it to input strings, producing one
//! annotated `Doc` per input (UPOS tags, fine-grained tags, dependency edges and
//! named entity spans).
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use rust_ud::pipelines::annotation::LanguageModel;
//!
//! let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
//! let docs = model.annotate(&["Eu vi o menino com o telescópio"]);
//! for token in &docs[0] {
//!     println!("{}:{}", token.text, token.pos);
//! }
//! # Ok(())
//! # }
//! ```

use crate::common::error::RustUdError;
use crate::pipelines::doc::{Doc, EntitySpan, Token, UposTag};
use crate::resources::ResourceProvider;
use crate::udify::{UdifyConfig, UdifyModel};
use crate::Config;
use ordered_float::OrderedFloat;
use rust_tokenizers::tokenizer::{BertTokenizer, Tokenizer};
use rust_tokenizers::{Mask, Offset, TokenIdsWithOffsets};
use std::cmp::min;
use std::collections::HashMap;
use tch::{no_grad, Device, Kind, Tensor};
use tracing::{debug, info};

#[cfg(feature = "remote")]
use crate::{
    resources::RemoteResource,
    udify::{UdifyConfigResources, UdifyModelResources, UdifyVocabResources},
};

/// # Sub-token level label, input to word-level label consolidation
#[derive(Debug, Clone)]
pub struct SubTokenLabel {
    /// Label index
    pub label_index: i64,
    /// Label string
    pub label: String,
    /// Confidence score
    pub score: f64,
}

type LabelAggregationFunction = Box<fn(&[SubTokenLabel]) -> (i64, String)>;

/// # Enum defining the label aggregation method for sub tokens
/// Defines the behaviour for consolidating the labels of wordpiece sub-tokens into
/// word-level labels.
pub enum LabelAggregationOption {
    /// The label of the first sub token is assigned to the entire token
    First,
    /// The label of the last sub token is assigned to the entire token
    Last,
    /// The most frequent sub-token label is assigned to the entire token
    Mode,
    /// The user can provide a function mapping a `&[SubTokenLabel]` to a `(i64, String)` tuple corresponding to the label index, label String to return
    Custom(LabelAggregationFunction),
}

/// # Configuration for the annotation pipeline
/// Contains information regarding the bundle to load and device to place the model on.
pub struct AnnotationConfig {
    /// Model weights resource (TorchScript archive)
    pub model_resource: Box<dyn ResourceProvider + Send>,
    /// Config resource (label vocabularies, tokenizer settings)
    pub config_resource: Box<dyn ResourceProvider + Send>,
    /// Vocab resource (wordpiece vocabulary)
    pub vocab_resource: Box<dyn ResourceProvider + Send>,
    /// Automatically lower case all input upon tokenization (assumes a lower-cased model)
    pub lower_case: bool,
    /// Flag indicating if the tokenizer should strip accents (normalization)
    pub strip_accents: Option<bool>,
    /// Device to place the model on (default: CUDA/GPU when available)
    pub device: Device,
    /// Sub-tokens aggregation method for UPOS and entity labels (default:
    /// `LabelAggregationOption::First`). Fine-grained tags and dependency relations are
    /// always read from the word-leading sub-token.
    pub label_aggregation_function: LabelAggregationOption,
    /// Batch size for annotation
    pub batch_size: usize,
}

impl AnnotationConfig {
    /// Instantiate a new annotation configuration.
    ///
    /// # Arguments
    ///
    /// * model_resource - The `ResourceProvider` pointing to the scripted model to load (e.g. model.pt)
    /// * config_resource - The `ResourceProvider` pointing to the bundle configuration to load (e.g. config.json)
    /// * vocab_resource - The `ResourceProvider` pointing to the tokenizer's vocabulary to load (e.g. vocab.txt)
    /// * lower_case - A `bool` indicating whether the tokenizer should lower case all input (in case of a lower-cased model)
    pub fn new<RM, RC, RV>(
        model_resource: RM,
        config_resource: RC,
        vocab_resource: RV,
        lower_case: bool,
        strip_accents: impl Into<Option<bool>>,
        label_aggregation_function: LabelAggregationOption,
    ) -> AnnotationConfig
    where
        RM: ResourceProvider + Send + 'static,
        RC: ResourceProvider + Send + 'static,
        RV: ResourceProvider + Send + 'static,
    {
        AnnotationConfig {
            model_resource: Box::new(model_resource),
            config_resource: Box::new(config_resource),
            vocab_resource: Box::new(vocab_resource),
            lower_case,
            strip_accents: strip_accents.into(),
            device: Device::cuda_if_available(),
            label_aggregation_function,
            batch_size: 64,
        }
    }

    /// Resolves a pipeline identifier against the pretrained registry.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Locale+size identifier (e.g. `"pt_core_news_sm"`)
    ///
    /// # Returns
    ///
    /// * `AnnotationConfig` referencing the registered remote bundle, or
    /// `RustUdError::ModelNotAvailableError` if no bundle is registered under this name
    #[cfg(feature = "remote")]
    pub fn from_pretrained(model_name: &str) -> Result<AnnotationConfig, RustUdError> {
        let (model, config, vocab) = match model_name {
            "pt_core_news_sm" => (
                UdifyModelResources::PT_CORE_NEWS_SM,
                UdifyConfigResources::PT_CORE_NEWS_SM,
                UdifyVocabResources::PT_CORE_NEWS_SM,
            ),
            "pt_core_news_md" => (
                UdifyModelResources::PT_CORE_NEWS_MD,
                UdifyConfigResources::PT_CORE_NEWS_MD,
                UdifyVocabResources::PT_CORE_NEWS_MD,
            ),
            _ => {
                return Err(RustUdError::ModelNotAvailableError(format!(
                    "{model_name} is not a registered pretrained bundle"
                )))
            }
        };
        Ok(AnnotationConfig::new(
            RemoteResource::from_pretrained(model),
            RemoteResource::from_pretrained(config),
            RemoteResource::from_pretrained(vocab),
            false,
            None,
            LabelAggregationOption::First,
        ))
    }
}

#[derive(Debug)]
struct InputFeature {
    /// Encoded input ids
    input_ids: Vec<i64>,
    /// Offsets reference to the original string
    offsets: Vec<Option<Offset>>,
    /// Token category (mask)
    mask: Vec<Mask>,
}

/// Decoded batch tensors shared by the per-document decoding passes.
struct BatchAnnotations {
    upos_score: Tensor,
    upos_labels: Tensor,
    xpos_labels: Tensor,
    deprel_labels: Tensor,
    head_scores: Tensor,
    entity_score: Tensor,
    entity_labels: Tensor,
}

/// Word-level annotation assembled from consolidated sub-tokens, prior to head
/// resolution.
struct WordAnnotation {
    leading_position: usize,
    text: String,
    offset: Option<Offset>,
    pos: UposTag,
    score: f64,
    tag: String,
    deprel_index: i64,
    entity_label: String,
    entity_score: f64,
}

/// Tensor-to-document decoding rules: label mapping, sub-token consolidation, head
/// resolution and entity span assembly. Kept separate from the model so the decoding
/// passes can run on any `BatchAnnotations`, whether produced by a forward pass or
/// constructed directly.
struct DocumentDecoder {
    upos_mapping: HashMap<i64, String>,
    xpos_mapping: Option<HashMap<i64, String>>,
    deprel_mapping: HashMap<i64, String>,
    entity_mapping: HashMap<i64, String>,
    label_aggregation_function: LabelAggregationOption,
}

/// # LanguageModel, a loaded Universal Dependencies annotation pipeline
pub struct LanguageModel {
    tokenizer: BertTokenizer,
    model: UdifyModel,
    decoder: DocumentDecoder,
    max_length: usize,
    pad_token_id: i64,
    batch_size: usize,
    device: Device,
}

impl LanguageModel {
    /// Build a new `LanguageModel`
    ///
    /// # Arguments
    ///
    /// * `config` - `AnnotationConfig` object containing the resource references (model, vocabulary, configuration) and device placement (CPU/GPU)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use rust_ud::pipelines::annotation::{AnnotationConfig, LanguageModel};
    ///
    /// let model = LanguageModel::new(AnnotationConfig::from_pretrained("pt_core_news_sm")?)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: AnnotationConfig) -> Result<LanguageModel, RustUdError> {
        let config_path = config.config_resource.get_local_path()?;
        let vocab_path = config.vocab_resource.get_local_path()?;
        let weights_path = config.model_resource.get_local_path()?;

        let udify_config = UdifyConfig::from_file(config_path);
        let lower_case = udify_config.do_lower_case.unwrap_or(config.lower_case);
        let strip_accents = udify_config
            .strip_accents
            .or(config.strip_accents)
            .unwrap_or(lower_case);
        let tokenizer = BertTokenizer::from_file(
            vocab_path.to_str().ok_or_else(|| {
                RustUdError::InvalidConfigurationError(format!(
                    "Invalid vocabulary path {vocab_path:?}"
                ))
            })?,
            lower_case,
            strip_accents,
        )?;
        let model = UdifyModel::new(&weights_path, config.device)?;
        info!(weights = %weights_path.display(), "loaded pretrained annotation bundle");

        Ok(LanguageModel {
            tokenizer,
            model,
            decoder: DocumentDecoder {
                upos_mapping: udify_config.id2upos,
                xpos_mapping: udify_config.id2xpos,
                deprel_mapping: udify_config.id2deprel,
                entity_mapping: udify_config.id2ent,
                label_aggregation_function: config.label_aggregation_function,
            },
            max_length: udify_config.max_position_embeddings as usize,
            pad_token_id: udify_config.pad_token_id.unwrap_or(0),
            batch_size: config.batch_size,
            device: config.device,
        })
    }

    /// Build a `LanguageModel` from a pretrained registry identifier.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Locale+size identifier (e.g. `"pt_core_news_sm"`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use rust_ud::pipelines::annotation::LanguageModel;
    ///
    /// let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "remote")]
    pub fn from_pretrained(model_name: &str) -> Result<LanguageModel, RustUdError> {
        LanguageModel::new(AnnotationConfig::from_pretrained(model_name)?)
    }

    /// Annotate a set of input strings, producing one `Doc` per input.
    ///
    /// # Arguments
    ///
    /// * `input` - `&[&str]` Array of texts to annotate.
    ///
    /// # Returns
    ///
    /// * `Vec<Doc>` containing the annotated documents, in input order
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use rust_ud::pipelines::annotation::LanguageModel;
    ///
    /// let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
    /// let docs = model.annotate(&[
    ///     "Eu vi o menino com o telescópio",
    ///     "Luiz bebeu água, porém continua feio",
    /// ]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn annotate<S>(&self, input: &[S]) -> Vec<Doc>
    where
        S: AsRef<str>,
    {
        let mut features = input
            .iter()
            .map(|example| self.generate_features(example.as_ref()))
            .collect::<Vec<InputFeature>>();

        let mut docs = input
            .iter()
            .map(|example| Doc {
                text: example.as_ref().to_string(),
                tokens: Vec::new(),
                ents: Vec::new(),
            })
            .collect::<Vec<Doc>>();

        let len_features = features.len();
        let mut start = 0usize;
        while start < len_features {
            let end = start + min(len_features - start, self.batch_size);
            debug!(batch_start = start, batch_end = end, "annotating batch");

            no_grad(|| {
                let batch_features = &mut features[start..end];
                let (input_ids, attention_masks) = self.pad_features(batch_features);
                let output = self.model.forward(&input_ids, &attention_masks);
                let upos_score = output.upos_logits.exp()
                    / output
                        .upos_logits
                        .exp()
                        .sum_dim_intlist([-1].as_slice(), true, Kind::Float);
                let entity_score = output.entity_logits.exp()
                    / output
                        .entity_logits
                        .exp()
                        .sum_dim_intlist([-1].as_slice(), true, Kind::Float);
                let annotations = BatchAnnotations {
                    upos_labels: upos_score.argmax(-1, false),
                    upos_score,
                    xpos_labels: output.xpos_logits.argmax(-1, false),
                    deprel_labels: output.deprel_logits.argmax(-1, false),
                    head_scores: output.head_scores,
                    entity_labels: entity_score.argmax(-1, false),
                    entity_score,
                };
                for (batch_idx, feature) in batch_features.iter().enumerate() {
                    let example_index = start + batch_idx;
                    let original = input[example_index].as_ref();
                    let (tokens, ents) = self.decoder.decode_document(
                        original,
                        feature,
                        &annotations,
                        batch_idx as i64,
                    );
                    docs[example_index].tokens = tokens;
                    docs[example_index].ents = ents;
                }
            });
            start = end;
        }
        docs
    }

    fn generate_features(&self, input: &str) -> InputFeature {
        let tokenized_input = self.tokenizer.tokenize_with_offsets(input);
        let token_ids = self.tokenizer.convert_tokens_to_ids(&tokenized_input.tokens);

        let sequence_added_tokens = self
            .tokenizer
            .build_input_with_special_tokens(
                TokenIdsWithOffsets {
                    ids: vec![],
                    offsets: vec![],
                    reference_offsets: vec![],
                    masks: vec![],
                },
                None,
            )
            .token_ids
            .len();

        // Sentence-scale inputs: truncate to the artifact position budget rather than
        // striding, as dependency heads cannot cross window boundaries.
        let max_content_length = self.max_length - sequence_added_tokens;
        let end_token = min(token_ids.len(), max_content_length);

        let encoded_input = self.tokenizer.build_input_with_special_tokens(
            TokenIdsWithOffsets {
                ids: token_ids[..end_token].to_vec(),
                offsets: tokenized_input.offsets[..end_token].to_vec(),
                reference_offsets: tokenized_input.reference_offsets[..end_token].to_vec(),
                masks: tokenized_input.masks[..end_token].to_vec(),
            },
            None,
        );

        InputFeature {
            input_ids: encoded_input.token_ids,
            offsets: encoded_input.token_offsets,
            mask: encoded_input.mask,
        }
    }

    fn pad_features(&self, features: &mut [InputFeature]) -> (Tensor, Tensor) {
        let max_len = features
            .iter()
            .map(|feature| feature.input_ids.len())
            .max()
            .unwrap();

        let attention_masks = features
            .iter()
            .map(|feature| &feature.input_ids)
            .map(|input| {
                let mut attention_mask = Vec::with_capacity(max_len);
                attention_mask.resize(input.len(), 1i64);
                attention_mask.resize(max_len, 0i64);
                attention_mask
            })
            .map(|input| Tensor::from_slice(&input))
            .collect::<Vec<_>>();

        for feature in features.iter_mut() {
            feature.input_ids.resize(max_len, self.pad_token_id);
            feature.offsets.resize(max_len, None);
            feature.mask.resize(max_len, Mask::Special);
        }

        let padded_input_ids = features
            .iter()
            .map(|input| Tensor::from_slice(input.input_ids.as_slice()))
            .collect::<Vec<_>>();

        let input_ids = Tensor::stack(&padded_input_ids, 0).to(self.device);
        let attention_masks = Tensor::stack(&attention_masks, 0).to(self.device);
        (input_ids, attention_masks)
    }
}

impl DocumentDecoder {
    fn decode_document(
        &self,
        original: &str,
        feature: &InputFeature,
        annotations: &BatchAnnotations,
        sentence_idx: i64,
    ) -> (Vec<Token>, Vec<EntitySpan>) {
        let original_chars = original.chars().collect::<Vec<char>>();

        // group wordpiece positions into words, skipping special and padding positions
        let mut words: Vec<Vec<usize>> = Vec::new();
        for (position, mask) in feature.mask.iter().enumerate() {
            match mask {
                Mask::Special => {}
                Mask::Continuation => {
                    if let Some(word) = words.last_mut() {
                        word.push(position);
                    }
                }
                _ => words.push(vec![position]),
            }
        }

        let mut word_annotations = Vec::with_capacity(words.len());
        for positions in &words {
            word_annotations.push(self.decode_word(
                &original_chars,
                feature,
                annotations,
                sentence_idx,
                positions,
            ));
        }

        let tokens = self.resolve_heads(&word_annotations, annotations, sentence_idx);
        let ents = decode_entity_spans(&tokens, &word_annotations, &original_chars);
        (tokens, ents)
    }

    fn decode_word(
        &self,
        original_chars: &[char],
        feature: &InputFeature,
        annotations: &BatchAnnotations,
        sentence_idx: i64,
        positions: &[usize],
    ) -> WordAnnotation {
        let leading_position = positions[0];
        let trailing_position = *positions.last().unwrap();

        let offset = match (
            feature.offsets[leading_position].as_ref(),
            feature.offsets[trailing_position].as_ref(),
        ) {
            (Some(first), Some(last)) => Some(Offset::new(first.begin, last.end)),
            _ => None,
        };
        let text = offset
            .map(|offset| {
                let begin = offset.begin as usize;
                let end = min(offset.end as usize, original_chars.len());
                original_chars[begin..end].iter().collect::<String>()
            })
            .unwrap_or_default();

        let upos_sub_labels = positions
            .iter()
            .map(|&position| {
                sub_token_label(
                    &annotations.upos_labels,
                    &annotations.upos_score,
                    &self.upos_mapping,
                    sentence_idx,
                    position,
                )
            })
            .collect::<Vec<SubTokenLabel>>();
        let (upos_index, upos_label) =
            consolidate_labels(&upos_sub_labels, &self.label_aggregation_function);
        let score = consolidated_score(&upos_sub_labels, upos_index);

        let entity_sub_labels = positions
            .iter()
            .map(|&position| {
                sub_token_label(
                    &annotations.entity_labels,
                    &annotations.entity_score,
                    &self.entity_mapping,
                    sentence_idx,
                    position,
                )
            })
            .collect::<Vec<SubTokenLabel>>();
        let (entity_index, entity_label) =
            consolidate_labels(&entity_sub_labels, &self.label_aggregation_function);
        let entity_score = consolidated_score(&entity_sub_labels, entity_index);

        let tag = self
            .xpos_mapping
            .as_ref()
            .map(|mapping| {
                mapping
                    .get(
                        &annotations
                            .xpos_labels
                            .int64_value(&[sentence_idx, leading_position as i64]),
                    )
                    .expect("Index out of vocabulary bounds.")
                    .to_owned()
            })
            .unwrap_or_default();

        let deprel_index = annotations
            .deprel_labels
            .int64_value(&[sentence_idx, leading_position as i64]);

        WordAnnotation {
            leading_position,
            text,
            offset,
            pos: upos_label.parse().unwrap_or(UposTag::X),
            score,
            tag,
            deprel_index,
            entity_label,
            entity_score,
        }
    }

    /// Resolves the syntactic head of each word. Head candidates are restricted to
    /// the leading wordpiece positions of other words plus the synthetic root column,
    /// so decoded trees never contain word-level self-loops.
    fn resolve_heads(
        &self,
        words: &[WordAnnotation],
        annotations: &BatchAnnotations,
        sentence_idx: i64,
    ) -> Vec<Token> {
        let position_to_word = words
            .iter()
            .enumerate()
            .map(|(word_index, word)| (word.leading_position, word_index))
            .collect::<HashMap<usize, usize>>();

        words
            .iter()
            .enumerate()
            .map(|(word_index, word)| {
                let position = word.leading_position as i64;
                let mut best_column = 0usize;
                let mut best_score =
                    annotations
                        .head_scores
                        .double_value(&[sentence_idx, position, 0]);
                for other in words {
                    if other.leading_position == word.leading_position {
                        continue;
                    }
                    let column = other.leading_position + 1;
                    let score = annotations.head_scores.double_value(&[
                        sentence_idx,
                        position,
                        column as i64,
                    ]);
                    if score > best_score {
                        best_score = score;
                        best_column = column;
                    }
                }

                let (head, dep) = if best_column == 0 {
                    (word_index, String::from("root"))
                } else {
                    let head_word = position_to_word[&(best_column - 1)];
                    let dep = self
                        .deprel_mapping
                        .get(&word.deprel_index)
                        .expect("Index out of vocabulary bounds.")
                        .to_owned();
                    (head_word, dep)
                };

                Token {
                    index: word_index,
                    text: word.text.clone(),
                    pos: word.pos,
                    tag: word.tag.clone(),
                    dep,
                    head,
                    offset: word.offset,
                    score: word.score,
                }
            })
            .collect()
    }
}

fn sub_token_label(
    labels: &Tensor,
    scores: &Tensor,
    mapping: &HashMap<i64, String>,
    sentence_idx: i64,
    position: usize,
) -> SubTokenLabel {
    let label_index = labels.int64_value(&[sentence_idx, position as i64]);
    SubTokenLabel {
        label_index,
        label: mapping
            .get(&label_index)
            .expect("Index out of vocabulary bounds.")
            .to_owned(),
        score: scores.double_value(&[sentence_idx, position as i64, label_index]),
    }
}

fn consolidate_labels(
    labels: &[SubTokenLabel],
    aggregation: &LabelAggregationOption,
) -> (i64, String) {
    match aggregation {
        LabelAggregationOption::First => {
            let label = labels.first().unwrap();
            (label.label_index, label.label.clone())
        }
        LabelAggregationOption::Last => {
            let label = labels.last().unwrap();
            (label.label_index, label.label.clone())
        }
        LabelAggregationOption::Mode => {
            let counts = labels.iter().fold(HashMap::new(), |mut m, c| {
                let (ref mut count, ref mut score) = m
                    .entry((c.label_index, c.label.as_str()))
                    .or_insert((0, 0.0_f64));
                *count += 1;
                *score = score.max(c.score);
                m
            });
            counts
                .into_iter()
                .max_by_key(|&(_, (count, score))| (count, OrderedFloat(score)))
                .map(|((label_index, label), _)| (label_index, label.to_owned()))
                .unwrap()
        }
        LabelAggregationOption::Custom(function) => function(labels),
    }
}

fn consolidated_score(labels: &[SubTokenLabel], label_index: i64) -> f64 {
    labels
        .iter()
        .map(|label| {
            if label.label_index == label_index {
                label.score
            } else {
                1.0 - label.score
            }
        })
        .product()
}

/// Decodes word-level IOB entity labels into half-open entity spans. Span text is
/// sliced from the original string between the first and last covered token offsets.
fn decode_entity_spans(
    tokens: &[Token],
    words: &[WordAnnotation],
    original_chars: &[char],
) -> Vec<EntitySpan> {
    let mut spans: Vec<EntitySpan> = Vec::new();
    let mut current: Option<(usize, String, Vec<f64>)> = None;

    for (index, word) in words.iter().enumerate() {
        let (prefix, category) = match word.entity_label.split_once('-') {
            Some((prefix, category)) => (prefix, category),
            None => ("O", ""),
        };
        let continues = matches!(&current, Some((_, open, _)) if prefix == "I" && open == category);
        if continues {
            if let Some((_, _, scores)) = current.as_mut() {
                scores.push(word.entity_score);
            }
            continue;
        }
        if let Some(span) = close_entity_span(current.take(), index, tokens, original_chars) {
            spans.push(span);
        }
        if prefix == "B" || prefix == "I" {
            current = Some((index, category.to_string(), vec![word.entity_score]));
        }
    }
    if let Some(span) = close_entity_span(current.take(), words.len(), tokens, original_chars) {
        spans.push(span);
    }
    spans
}

fn close_entity_span(
    current: Option<(usize, String, Vec<f64>)>,
    end: usize,
    tokens: &[Token],
    original_chars: &[char],
) -> Option<EntitySpan> {
    let (start, label, scores) = current?;
    let text = match (tokens[start].offset.as_ref(), tokens[end - 1].offset.as_ref()) {
        (Some(first), Some(last)) => {
            let begin = first.begin as usize;
            let stop = min(last.end as usize, original_chars.len());
            original_chars[begin..stop].iter().collect::<String>()
        }
        _ => tokens[start..end]
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<&str>>()
            .join(" "),
    };
    let score = scores.iter().sum::<f64>() / scores.len() as f64;
    Some(EntitySpan {
        text,
        label,
        score,
        start,
        end,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn sub_label(label_index: i64, label: &str, score: f64) -> SubTokenLabel {
        SubTokenLabel {
            label_index,
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn first_aggregation_takes_leading_sub_token() {
        let labels = [
            sub_label(3, "NOUN", 0.9),
            sub_label(5, "VERB", 0.8),
            sub_label(5, "VERB", 0.7),
        ];
        let (index, label) = consolidate_labels(&labels, &LabelAggregationOption::First);
        assert_eq!((index, label.as_str()), (3, "NOUN"));
    }

    #[test]
    fn mode_aggregation_takes_most_frequent_label() {
        let labels = [
            sub_label(3, "NOUN", 0.9),
            sub_label(5, "VERB", 0.8),
            sub_label(5, "VERB", 0.7),
        ];
        let (index, label) = consolidate_labels(&labels, &LabelAggregationOption::Mode);
        assert_eq!((index, label.as_str()), (5, "VERB"));
    }

    #[test]
    fn mode_aggregation_breaks_ties_by_score() {
        let labels = [sub_label(3, "NOUN", 0.6), sub_label(5, "VERB", 0.9)];
        let (index, label) = consolidate_labels(&labels, &LabelAggregationOption::Mode);
        assert_eq!((index, label.as_str()), (5, "VERB"));
    }

    #[test]
    fn custom_aggregation_applies_user_function() {
        let labels = [sub_label(3, "NOUN", 0.9), sub_label(5, "VERB", 0.8)];
        let aggregation =
            LabelAggregationOption::Custom(Box::new(|labels| {
                let label = labels.last().unwrap();
                (label.label_index, label.label.clone())
            }));
        let (index, label) = consolidate_labels(&labels, &aggregation);
        assert_eq!((index, label.as_str()), (5, "VERB"));
    }

    #[test]
    fn consolidated_score_multiplies_matching_sub_tokens() {
        let labels = [sub_label(3, "NOUN", 0.5), sub_label(3, "NOUN", 0.5)];
        assert!((consolidated_score(&labels, 3) - 0.25).abs() < 1e-12);
        let mixed = [sub_label(3, "NOUN", 0.5), sub_label(5, "VERB", 0.75)];
        assert!((consolidated_score(&mixed, 3) - 0.125).abs() < 1e-12);
    }

    fn word(text: &str, begin: u32, end: u32, entity_label: &str, entity_score: f64) -> (Token, WordAnnotation) {
        let offset = Some(Offset::new(begin, end));
        let token = Token {
            index: 0,
            text: text.to_string(),
            pos: UposTag::Propn,
            tag: String::new(),
            dep: String::from("dep"),
            head: 0,
            offset,
            score: 1.0,
        };
        let annotation = WordAnnotation {
            leading_position: begin as usize,
            text: text.to_string(),
            offset,
            pos: UposTag::Propn,
            score: 1.0,
            tag: String::new(),
            deprel_index: 0,
            entity_label: entity_label.to_string(),
            entity_score,
        };
        (token, annotation)
    }

    #[test]
    fn iob_labels_decode_to_half_open_spans() {
        let text = "Luiz Inácio mora em Brasília";
        let chars = text.chars().collect::<Vec<char>>();
        let specs = [
            ("Luiz", 0u32, 4u32, "B-PER", 0.9),
            ("Inácio", 5, 11, "I-PER", 0.7),
            ("mora", 12, 16, "O", 0.99),
            ("em", 17, 19, "O", 0.99),
            ("Brasília", 20, 28, "B-LOC", 0.8),
        ];
        let (tokens, words): (Vec<Token>, Vec<WordAnnotation>) =
            specs.iter().map(|&(t, b, e, l, s)| word(t, b, e, l, s)).unzip();

        let spans = decode_entity_spans(&tokens, &words, &chars);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Luiz Inácio");
        assert_eq!(spans[0].label, "PER");
        assert_eq!((spans[0].start, spans[0].end), (0, 2));
        assert!((spans[0].score - 0.8).abs() < 1e-12);
        assert_eq!(spans[1].text, "Brasília");
        assert_eq!(spans[1].label, "LOC");
        assert_eq!((spans[1].start, spans[1].end), (4, 5));
    }

    #[test]
    fn dangling_inside_label_opens_a_new_span() {
        let text = "em Brasília hoje";
        let chars = text.chars().collect::<Vec<char>>();
        let specs = [
            ("em", 0u32, 2u32, "O", 0.99),
            ("Brasília", 3, 11, "I-LOC", 0.8),
            ("hoje", 12, 16, "O", 0.99),
        ];
        let (tokens, words): (Vec<Token>, Vec<WordAnnotation>) =
            specs.iter().map(|&(t, b, e, l, s)| word(t, b, e, l, s)).unzip();

        let spans = decode_entity_spans(&tokens, &words, &chars);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Brasília");
        assert_eq!(spans[0].label, "LOC");
    }

    #[test]
    fn adjacent_begin_labels_split_spans() {
        let text = "Luiz Maria";
        let chars = text.chars().collect::<Vec<char>>();
        let specs = [("Luiz", 0u32, 4u32, "B-PER", 0.9), ("Maria", 5, 10, "B-PER", 0.9)];
        let (tokens, words): (Vec<Token>, Vec<WordAnnotation>) =
            specs.iter().map(|&(t, b, e, l, s)| word(t, b, e, l, s)).unzip();

        let spans = decode_entity_spans(&tokens, &words, &chars);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Luiz");
        assert_eq!(spans[1].text, "Maria");
    }

    fn label_mapping(labels: &[&str]) -> HashMap<i64, String> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| (index as i64, label.to_string()))
            .collect()
    }

    fn decoder_fixture() -> DocumentDecoder {
        DocumentDecoder {
            upos_mapping: label_mapping(&["PRON", "VERB", "DET", "PROPN"]),
            xpos_mapping: Some(label_mapping(&["pron-pers", "v-fin", "prop", "n"])),
            deprel_mapping: label_mapping(&["nsubj", "obj", "det", "punct"]),
            entity_mapping: label_mapping(&["O", "B-PER", "I-PER"]),
            label_aggregation_function: LabelAggregationOption::First,
        }
    }

    /// "Eu vi Maria" encoded as `[CLS] eu vi ma ##ria [SEP]`.
    fn feature_fixture() -> InputFeature {
        InputFeature {
            input_ids: vec![101, 11, 12, 13, 14, 102],
            offsets: vec![
                None,
                Some(Offset::new(0, 2)),
                Some(Offset::new(3, 5)),
                Some(Offset::new(6, 8)),
                Some(Offset::new(8, 11)),
                None,
            ],
            mask: vec![
                Mask::Special,
                Mask::None,
                Mask::None,
                Mask::None,
                Mask::Continuation,
                Mask::Special,
            ],
        }
    }

    fn annotations_fixture() -> BatchAnnotations {
        let upos_score = [
            [0.7, 0.1, 0.1, 0.1],
            [0.9, 0.05, 0.03, 0.02],
            [0.05, 0.8, 0.1, 0.05],
            [0.1, 0.1, 0.2, 0.6],
            [0.2, 0.1, 0.2, 0.5],
            [0.7, 0.1, 0.1, 0.1],
        ]
        .concat();
        // columns: 0 = root, j + 1 = sequence position j
        let head_scores = [
            [0.0; 7],
            [0.1, 0.0, 0.0, 0.9, 0.2, 5.0, 0.0],
            [3.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0],
            [0.2, 0.0, 0.3, 0.8, 0.0, 0.0, 0.0],
            [0.0; 7],
            [0.0; 7],
        ]
        .concat();
        let entity_score = [
            [1.0, 0.0, 0.0],
            [0.99, 0.005, 0.005],
            [0.99, 0.005, 0.005],
            [0.1, 0.8, 0.1],
            [0.1, 0.2, 0.7],
            [1.0, 0.0, 0.0],
        ]
        .concat();
        BatchAnnotations {
            upos_score: Tensor::from_slice(&upos_score).view([1, 6, 4]),
            upos_labels: Tensor::from_slice(&[0i64, 0, 1, 3, 3, 0]).view([1, 6]),
            xpos_labels: Tensor::from_slice(&[0i64, 0, 1, 2, 3, 0]).view([1, 6]),
            deprel_labels: Tensor::from_slice(&[0i64, 0, 3, 1, 2, 0]).view([1, 6]),
            head_scores: Tensor::from_slice(&head_scores).view([1, 6, 7]),
            entity_score: Tensor::from_slice(&entity_score).view([1, 6, 3]),
            entity_labels: Tensor::from_slice(&[0i64, 0, 0, 1, 2, 0]).view([1, 6]),
        }
    }

    #[test]
    fn head_candidates_are_restricted_to_word_leading_positions() {
        let decoder = decoder_fixture();
        let (tokens, _) =
            decoder.decode_document("Eu vi Maria", &feature_fixture(), &annotations_fixture(), 0);

        // the continuation position ("##ria", column 5) carries the highest raw head
        // score for "Eu" and must not be selected over the leading position of "vi"
        let heads = tokens.iter().map(|token| token.head).collect::<Vec<usize>>();
        let deps = tokens
            .iter()
            .map(|token| token.dep.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(heads, vec![1, 1, 1]);
        assert_eq!(deps, vec!["nsubj", "root", "obj"]);
    }

    #[test]
    fn root_column_attaches_the_word_to_itself() {
        let decoder = decoder_fixture();
        let (tokens, _) =
            decoder.decode_document("Eu vi Maria", &feature_fixture(), &annotations_fixture(), 0);

        assert_eq!(tokens[1].head, tokens[1].index);
        assert_eq!(tokens[1].dep, "root");
    }

    #[test]
    fn word_surfaces_are_sliced_from_the_original_string() {
        let decoder = decoder_fixture();
        let (tokens, _) =
            decoder.decode_document("Eu vi Maria", &feature_fixture(), &annotations_fixture(), 0);

        let texts = tokens
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(texts, vec!["Eu", "vi", "Maria"]);
        assert_eq!(tokens[2].offset, Some(Offset::new(6, 11)));
        assert_eq!(tokens[2].pos, UposTag::Propn);
    }

    #[test]
    fn fine_grained_tags_come_from_the_leading_sub_token() {
        let decoder = decoder_fixture();
        let (tokens, _) =
            decoder.decode_document("Eu vi Maria", &feature_fixture(), &annotations_fixture(), 0);

        // "##ria" predicts "n"; the word keeps the leading "ma" prediction
        assert_eq!(tokens[2].tag, "prop");
        assert_eq!(tokens[0].tag, "pron-pers");
    }

    #[test]
    fn entity_spans_are_decoded_from_batch_tensors() {
        let decoder = decoder_fixture();
        let (_, ents) =
            decoder.decode_document("Eu vi Maria", &feature_fixture(), &annotations_fixture(), 0);

        assert_eq!(ents.len(), 1);
        assert_eq!(ents[0].text, "Maria");
        assert_eq!(ents[0].label, "PER");
        assert_eq!((ents[0].start, ents[0].end), (2, 3));
    }

    #[test]
    fn decoding_the_same_tensors_twice_is_identical() {
        let decoder = decoder_fixture();
        let feature = feature_fixture();
        let annotations = annotations_fixture();

        let (first_tokens, first_ents) =
            decoder.decode_document("Eu vi Maria", &feature, &annotations, 0);
        let (second_tokens, second_ents) =
            decoder.decode_document("Eu vi Maria", &feature, &annotations, 0);

        let signature = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|token| (token.text.clone(), token.pos, token.head, token.dep.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(signature(&first_tokens), signature(&second_tokens));
        assert_eq!(first_ents.len(), second_ents.len());
    }

    #[test]
    #[cfg(feature = "remote")]
    fn unknown_identifiers_are_rejected() {
        let result = AnnotationConfig::from_pretrained("en_core_web_sm");
        assert!(matches!(
            result,
            Err(RustUdError::ModelNotAvailableError(_))
        ));
    }

    #[test]
    #[ignore] // no need to run, compilation is enough to verify it is Send
    #[cfg(feature = "remote")]
    fn model_is_send() {
        let config = AnnotationConfig::from_pretrained("pt_core_news_sm").unwrap();
        let _: Box<dyn Send> = Box::new(LanguageModel::new(config));
    }
}
