pub mod request;
pub mod validation;

pub use request::*;
pub use validation::*;

use std::collections::HashMap;

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1";

/// Chute that serves any model missing from [`MODEL_MAPPING`]
pub const DEFAULT_CHUTE: &str = "chutes-deepseek-ai-deepseek-r1";

/// Public model identifier -> Chutes deployment name, in listing order
pub const MODEL_MAPPING: &[(&str, &str)] = &[
    (
        "nvidia/Llama-3.1-405B-Instruct-FP8",
        "chutes-nvidia-llama-3-1-405b-instruct-fp8",
    ),
    ("deepseek-ai/DeepSeek-R1", "chutes-deepseek-ai-deepseek-r1"),
    (
        "Qwen/Qwen2.5-72B-Instruct",
        "chutes-qwen-qwen2-5-72b-instruct",
    ),
    (
        "Qwen/Qwen2.5-Coder-32B-Instruc",
        "chutes-qwen-qwen2-5-coder-32b-instruct",
    ),
    (
        "bytedance-research/UI-TARS-72B-DPO",
        "chutes-bytedance-research-ui-tars-72b-dpo",
    ),
    (
        "OpenGVLab/InternVL2_5-78B",
        "chutes-opengvlab-internvl2-5-78b",
    ),
    (
        "hugging-quants/Meta-Llama-3.1-70B-Instruct-AWQ-INT4",
        "chutes-hugging-quants-meta-llama-3-1-70b-instruct-awq-int4",
    ),
    (
        "NousResearch/Hermes-3-Llama-3.1-8B",
        "cxmplexbb-nousresearch-hermes-3-llama-3-1-8b",
    ),
    ("Qwen/QVQ-72B-Preview", "chutes-qwen-qvq-72b-preview"),
    (
        "deepseek-ai/DeepSeek-R1-Distill-Qwen-32B",
        "chutes-deepseek-ai-deepseek-r1-distill-qwen-32b",
    ),
    ("jondurbin/bagel-8b-v1.0", "chutes-jondurbin-bagel-8b-v1-0"),
    (
        "unsloth/QwQ-32B-Preview",
        "cxmplexbb-unsloth-qwq-32b-preview",
    ),
    ("Qwen/QwQ-32B-Preview", "chutes-qwq-32b-preview"),
    (
        "jondurbin/airoboros-34b-3.3",
        "chutes-jondurbin-airoboros-34b-3-3",
    ),
    (
        "NovaSky-AI/Sky-T1-32B-Preview",
        "chutes-novasky-ai-sky-t1-32b-preview",
    ),
    (
        "driaforall/Dria-Agent-a-3B",
        "chutes-driaforall-dria-agent-a-3b",
    ),
    (
        "NousResearch/Nous-Hermes-Llama2-13b",
        "cxmplexbb-nousresearch-nous-hermes-llama2-13b",
    ),
    (
        "unsloth/Llama-3.2-1B-Instruct",
        "chutes-unsloth-llama-3-2-1b-instruct",
    ),
];

lazy_static::lazy_static! {
    static ref MODEL_INDEX: HashMap<&'static str, &'static str> =
        MODEL_MAPPING.iter().copied().collect();
}

/// Maps a public model identifier to the chute that serves it
pub fn map_model_name(model: &str) -> &'static str {
    MODEL_INDEX.get(model).copied().unwrap_or(DEFAULT_CHUTE)
}

/// Public model identifiers in listing order
pub fn supported_models() -> impl Iterator<Item = &'static str> {
    MODEL_MAPPING.iter().map(|(public, _)| *public)
}
