//! # UDify-style multi-task annotation artifact
//!
//! Wrapper around the pretrained TorchScript bundle performing joint part-of-speech
//! tagging, dependency parsing and named entity recognition. The artifact is treated
//! as a black box: this module only loads the scripted archive, executes its forward
//! pass and exposes the raw output tensors. All linguistic behaviour (wordpiece
//! interactions, tag assignment, arc scoring) is internal to the artifact.

mod udify_model;

pub use udify_model::{
    UdifyConfig, UdifyConfigResources, UdifyModel, UdifyModelOutput, UdifyModelResources,
    UdifyVocabResources,
};
