//! Inference-graph export contract
//!
//! The framework names its data-reader outputs positionally
//! (`read_file_0.tmp_<slot>`); which slots an encoder consumes and which
//! graph variables it exposes depend on the encoder kind. The contract
//! pins those names per kind, so the export call never carries loose
//! tensor-name strings.

use crate::model::EncoderKind;

/// A named tensor the exported inference graph is fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRole {
    // Dual encoder inputs, one block per tower.
    QueryTokenIds,
    QueryTextTypeIds,
    QueryPositionIds,
    QueryInputMask,
    ParaTokenIds,
    ParaTextTypeIds,
    ParaPositionIds,
    ParaInputMask,
    // Cross encoder inputs for the joint query/passage sequence.
    TokenIds,
    TextTypeIds,
    PositionIds,
    InputMask,
}

/// A graph variable fetched from the exported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchVar {
    /// Query embedding of a dual encoder.
    QueryRep,
    /// Passage embedding of a dual encoder.
    ParaRep,
    /// Relevance probabilities of a cross encoder.
    Probs,
}

impl FetchVar {
    pub fn graph_name(self) -> &'static str {
        match self {
            Self::QueryRep => "q_rep",
            Self::ParaRep => "p_rep",
            Self::Probs => "probs",
        }
    }
}

/// Reader slots consumed by the dual encoder inference graph: the query
/// block then the para block. The remaining slots carry training-only
/// inputs the inference graph does not take.
const DUAL_FEED_SLOTS: &[(FeedRole, usize)] = &[
    (FeedRole::QueryTokenIds, 0),
    (FeedRole::QueryTextTypeIds, 1),
    (FeedRole::QueryPositionIds, 2),
    (FeedRole::QueryInputMask, 4),
    (FeedRole::ParaTokenIds, 5),
    (FeedRole::ParaTextTypeIds, 6),
    (FeedRole::ParaPositionIds, 7),
    (FeedRole::ParaInputMask, 9),
];

/// Reader slots consumed by the cross encoder inference graph.
const CROSS_FEED_SLOTS: &[(FeedRole, usize)] = &[
    (FeedRole::TokenIds, 0),
    (FeedRole::TextTypeIds, 1),
    (FeedRole::PositionIds, 2),
    (FeedRole::InputMask, 4),
];

/// Maps reader slots to their in-graph tensor names.
#[derive(Debug, Clone)]
pub struct GraphNaming {
    /// Name prefix of the data reader's output tensors.
    pub reader_prefix: String,
}

impl Default for GraphNaming {
    fn default() -> Self {
        Self {
            reader_prefix: "read_file_0.tmp_".to_string(),
        }
    }
}

impl GraphNaming {
    pub fn reader_var(&self, slot: usize) -> String {
        format!("{}{}", self.reader_prefix, slot)
    }
}

/// Feed and fetch variables for exporting one encoder kind.
#[derive(Debug, Clone)]
pub struct ExportContract {
    feeds: Vec<(FeedRole, String)>,
    fetches: Vec<FetchVar>,
}

impl ExportContract {
    pub fn for_kind(kind: EncoderKind) -> Self {
        Self::with_naming(kind, &GraphNaming::default())
    }

    pub fn with_naming(kind: EncoderKind, naming: &GraphNaming) -> Self {
        let (slots, fetches) = match kind {
            EncoderKind::Dual => (DUAL_FEED_SLOTS, vec![FetchVar::QueryRep, FetchVar::ParaRep]),
            EncoderKind::Cross => (CROSS_FEED_SLOTS, vec![FetchVar::Probs]),
        };
        let feeds = slots
            .iter()
            .map(|&(role, slot)| (role, naming.reader_var(slot)))
            .collect();
        Self { feeds, fetches }
    }

    pub fn feeds(&self) -> &[(FeedRole, String)] {
        &self.feeds
    }

    pub fn fetches(&self) -> &[FetchVar] {
        &self.fetches
    }

    /// Feed tensor names, in reader order.
    pub fn feed_names(&self) -> Vec<String> {
        self.feeds.iter().map(|(_, name)| name.clone()).collect()
    }

    /// Fetch variable names, in output order.
    pub fn fetch_names(&self) -> Vec<String> {
        self.fetches
            .iter()
            .map(|var| var.graph_name().to_string())
            .collect()
    }
}
