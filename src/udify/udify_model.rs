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

use crate::common::error::RustUdError;
use crate::Config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tch::{CModule, Device, IValue, Tensor};

/// # UDify pretrained model weight files
pub struct UdifyModelResources;

/// # UDify pretrained model config files
pub struct UdifyConfigResources;

/// # UDify pretrained model vocab files
pub struct UdifyVocabResources;

impl UdifyModelResources {
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_SM: (&'static str, &'static str) = (
        "pt_core_news_sm/model",
        "https://huggingface.co/rust-ud/pt_core_news_sm/resolve/main/model.pt",
    );
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_MD: (&'static str, &'static str) = (
        "pt_core_news_md/model",
        "https://huggingface.co/rust-ud/pt_core_news_md/resolve/main/model.pt",
    );
}

impl UdifyConfigResources {
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_SM: (&'static str, &'static str) = (
        "pt_core_news_sm/config",
        "https://huggingface.co/rust-ud/pt_core_news_sm/resolve/main/config.json",
    );
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_MD: (&'static str, &'static str) = (
        "pt_core_news_md/config",
        "https://huggingface.co/rust-ud/pt_core_news_md/resolve/main/config.json",
    );
}

impl UdifyVocabResources {
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_SM: (&'static str, &'static str) = (
        "pt_core_news_sm/vocab",
        "https://huggingface.co/rust-ud/pt_core_news_sm/resolve/main/vocab.txt",
    );
    /// Shared under CC-BY-SA 4.0 license by the Universal Dependencies contributors. Trained on the Bosque-UD Portuguese treebank, exported to TorchScript.
    pub const PT_CORE_NEWS_MD: (&'static str, &'static str) = (
        "pt_core_news_md/vocab",
        "https://huggingface.co/rust-ud/pt_core_news_md/resolve/main/vocab.txt",
    );
}

/// # UDify bundle configuration
/// Label vocabularies and tokenizer settings shipped with the pretrained bundle
/// (`config.json`). Defines the mapping from output tensor indices to label strings
/// for each of the artifact's prediction heads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdifyConfig {
    /// Universal POS tag label map (id to label)
    pub id2upos: HashMap<i64, String>,
    /// Fine-grained (treebank-specific) tag label map
    pub id2xpos: Option<HashMap<i64, String>>,
    /// Dependency relation label map
    pub id2deprel: HashMap<i64, String>,
    /// IOB entity label map
    pub id2ent: HashMap<i64, String>,
    /// Maximum sequence length accepted by the artifact
    pub max_position_embeddings: i64,
    /// Padding token index of the wordpiece vocabulary
    pub pad_token_id: Option<i64>,
    /// Flag indicating if the bundle tokenizer lower cases its input
    pub do_lower_case: Option<bool>,
    /// Flag indicating if the bundle tokenizer strips accents
    pub strip_accents: Option<bool>,
}

impl Config for UdifyConfig {}

/// # Output tensors of the artifact forward pass
/// All tensors are batch-major. Sequence positions refer to wordpiece positions
/// (including special tokens) of the padded input batch.
pub struct UdifyModelOutput {
    /// UPOS logits (batch size, sequence length, UPOS labels)
    pub upos_logits: Tensor,
    /// Fine-grained tag logits (batch size, sequence length, XPOS labels)
    pub xpos_logits: Tensor,
    /// Dependency relation logits (batch size, sequence length, relation labels)
    pub deprel_logits: Tensor,
    /// Head attachment scores (batch size, sequence length, sequence length + 1).
    /// Column 0 scores attachment to the synthetic root; column `j + 1` scores
    /// attachment to sequence position `j`.
    pub head_scores: Tensor,
    /// IOB entity logits (batch size, sequence length, entity labels)
    pub entity_logits: Tensor,
}

/// # UdifyModel, executing the scripted annotation artifact
pub struct UdifyModel {
    module: CModule,
}

impl UdifyModel {
    /// Loads the TorchScript archive on the provided device.
    ///
    /// # Arguments
    ///
    /// * `weights_path` - Path to the scripted archive (`model.pt`)
    /// * `device` - Device to execute the artifact on
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> anyhow::Result<()> {
    /// use rust_ud::udify::UdifyModel;
    /// use tch::Device;
    ///
    /// let model = UdifyModel::new("path/to/model.pt", Device::Cpu)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<P: AsRef<Path>>(weights_path: P, device: Device) -> Result<UdifyModel, RustUdError> {
        let module = CModule::load_on_device(weights_path.as_ref(), device)?;
        Ok(UdifyModel { module })
    }

    /// Forward pass through the artifact.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Input wordpiece ids (batch size, sequence length)
    /// * `attention_mask` - Attention mask (batch size, sequence length)
    ///
    /// # Returns
    ///
    /// * `UdifyModelOutput` holding the five prediction-head tensors
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> UdifyModelOutput {
        let output = self
            .module
            .forward_is(&[
                IValue::Tensor(input_ids.shallow_clone()),
                IValue::Tensor(attention_mask.shallow_clone()),
            ])
            .expect("Error in udify forward pass");
        let mut tensors = match output {
            IValue::Tuple(values) => values
                .into_iter()
                .map(|value| match value {
                    IValue::Tensor(tensor) => tensor,
                    _ => panic!("Unexpected non-tensor output in udify forward pass"),
                })
                .collect::<Vec<Tensor>>(),
            _ => panic!("Unexpected output type in udify forward pass"),
        };
        if tensors.len() != 5 {
            panic!(
                "Expected 5 output tensors from the udify artifact, got {}",
                tensors.len()
            );
        }
        let entity_logits = tensors.pop().unwrap();
        let head_scores = tensors.pop().unwrap();
        let deprel_logits = tensors.pop().unwrap();
        let xpos_logits = tensors.pop().unwrap();
        let upos_logits = tensors.pop().unwrap();
        UdifyModelOutput {
            upos_logits,
            xpos_logits,
            deprel_logits,
            head_scores,
            entity_logits,
        }
    }
}
