//! Base model registry and encoder kind dispatch
//!
//! The framework names its pretrained checkpoints with a kind suffix
//! (`_de`/`_de_v2` for dual encoders, `_ce`/`_ce_v2` for cross encoders);
//! everything downstream of argument parsing branches on that suffix.

use anyhow::{bail, Result};

/// The two retrieval model families the framework ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderKind {
    /// Separate query/passage embeddings scored by similarity.
    Dual,
    /// Joint query/passage encoding producing a relevance score.
    Cross,
}

impl EncoderKind {
    /// Dispatch on the kind suffix of a model name.
    pub fn from_model_name(name: &str) -> Result<Self> {
        if name.ends_with("_de") || name.ends_with("_de_v2") {
            Ok(Self::Dual)
        } else if name.ends_with("_ce") || name.ends_with("_ce_v2") {
            Ok(Self::Cross)
        } else {
            bail!(
                "Cannot infer encoder kind from model name: {} (expected a _de, _de_v2, _ce or _ce_v2 suffix)",
                name
            )
        }
    }

    /// Directory name the promoted checkpoint is served from.
    pub fn params_dir_name(&self) -> &'static str {
        match self {
            Self::Dual => "dual_params",
            Self::Cross => "cross_params",
        }
    }
}

impl std::fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dual => write!(f, "dual_encoder"),
            Self::Cross => write!(f, "cross_encoder"),
        }
    }
}

/// Base models the framework can load by name.
const AVAILABLE_MODELS: &[&str] = &[
    "v1_marco_de",
    "v1_marco_ce",
    "v1_nq_de",
    "v1_nq_ce",
    "pair_marco_de",
    "pair_nq_de",
    "v2_marco_de",
    "v2_marco_ce",
    "v2_nq_de",
    "zh_dureader_de",
    "zh_dureader_ce",
    "zh_dureader_de_v2",
    "zh_dureader_ce_v2",
];

/// Names accepted as `base_model` by the train command.
pub fn available_models() -> &'static [&'static str] {
    AVAILABLE_MODELS
}

pub fn is_available(name: &str) -> bool {
    AVAILABLE_MODELS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_dispatch() {
        assert_eq!(
            EncoderKind::from_model_name("zh_dureader_de").unwrap(),
            EncoderKind::Dual
        );
        assert_eq!(
            EncoderKind::from_model_name("zh_dureader_de_v2").unwrap(),
            EncoderKind::Dual
        );
        assert_eq!(
            EncoderKind::from_model_name("zh_dureader_ce").unwrap(),
            EncoderKind::Cross
        );
        assert_eq!(
            EncoderKind::from_model_name("zh_dureader_ce_v2").unwrap(),
            EncoderKind::Cross
        );
    }

    #[test]
    fn test_unknown_suffix_rejected() {
        assert!(EncoderKind::from_model_name("bert_base").is_err());
        assert!(EncoderKind::from_model_name("").is_err());
    }

    #[test]
    fn test_params_dir_name() {
        assert_eq!(EncoderKind::Dual.params_dir_name(), "dual_params");
        assert_eq!(EncoderKind::Cross.params_dir_name(), "cross_params");
    }

    #[test]
    fn test_registry_names_all_dispatch() {
        for name in available_models() {
            assert!(EncoderKind::from_model_name(name).is_ok(), "{}", name);
        }
    }
}
