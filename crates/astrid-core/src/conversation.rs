//! Conversation items and content blocks (data model §3).
//!
//! These types are the provider-agnostic representation the agentic loop
//! accumulates, compacts, and eventually hands to a [`crate::ids`] and
//! [`crate::tool_descriptor`]-typed [`crate::ProviderPort`]-style adapter for
//! wire-format conversion.

use serde::{Deserialize, Serialize};

use crate::ids::ToolCallId;

/// The role a [`Message`] item was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// End-user input.
    User,
    /// Model-generated content.
    Assistant,
    /// Immutable system instructions.
    System,
    /// Developer-authored instructions (distinct from end-user input).
    Developer,
}

/// Detail level requested for an input image, mirroring provider vocabulary
/// (affects the token estimator's per-image cost, see `astrid-runtime::context`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDetail {
    /// Cheap, fixed-cost encoding.
    Low,
    /// Tile-based encoding, cost scales with image size.
    High,
    /// Provider decides.
    Auto,
}

/// Where image bytes for an [`ContentBlock::InputImage`] come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// A fetchable URL.
    Url(String),
    /// An inline `data:` URI.
    DataUri(String),
}

/// One block of content inside a [`ConversationItem::Message`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text supplied to the model.
    InputText {
        /// The text.
        text: String,
    },
    /// Text produced by the model.
    OutputText {
        /// The text.
        text: String,
    },
    /// An image supplied to the model.
    InputImage {
        /// Image location.
        source: ImageSource,
        /// Requested detail level.
        detail: ImageDetail,
    },
    /// An assistant-originated tool-call intent.
    ToolUse {
        /// Unique id, echoed by the matching `ToolResult`.
        id: ToolCallId,
        /// Tool name as registered with the `ToolManager`.
        name: String,
        /// Raw JSON arguments exactly as emitted by the provider.
        raw_arguments: String,
        /// Arguments parsed against the tool's schema, once validated.
        parsed_arguments: Option<serde_json::Value>,
    },
    /// The user-role result of a tool call.
    ToolResult {
        /// The [`ContentBlock::ToolUse::id`] this result answers.
        tool_use_id: ToolCallId,
        /// Result content (text, or a JSON-encoded error payload).
        content: String,
        /// Whether this result represents a failed tool call.
        is_error: bool,
        /// Image attachments returned alongside the result, if any.
        #[serde(default)]
        images: Vec<ImageSource>,
    },
    /// Opaque provider "thinking" content embedded within a message.
    Thinking {
        /// Human-readable summary text, if the provider exposes one.
        text: String,
        /// Provider signature; signed blocks must round-trip unchanged,
        /// unsigned blocks may be dropped during compaction.
        signature: Option<String>,
    },
}

impl ContentBlock {
    /// The tool-call id this block references, if it is a `ToolUse` or
    /// `ToolResult` block.
    #[must_use]
    pub fn tool_call_id(&self) -> Option<&ToolCallId> {
        match self {
            Self::ToolUse { id, .. } => Some(id),
            Self::ToolResult { tool_use_id, .. } => Some(tool_use_id),
            _ => None,
        }
    }

    /// Whether this block is a `ToolUse` block.
    #[must_use]
    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    /// Whether this block is a `ToolResult` block.
    #[must_use]
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }
}

/// A single item in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    /// An ordinary message with one or more content blocks.
    Message {
        /// Author role.
        role: Role,
        /// Content blocks, in order.
        content: Vec<ContentBlock>,
    },
    /// A standalone provider reasoning item, separate from any message.
    Reasoning {
        /// Optional human-readable summary of the reasoning.
        text: Option<String>,
        /// Provider signature; present for blocks that must round-trip.
        signature: Option<String>,
    },
    /// A synthetic marker recording that a compaction strategy removed or
    /// summarized a range of prior items.
    CompactionMarker {
        /// Summary text describing what was elided.
        summary: String,
        /// Number of original items this marker replaces.
        elided_count: usize,
    },
}

impl ConversationItem {
    /// Construct a plain user-text message.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::User,
            content: vec![ContentBlock::InputText { text: text.into() }],
        }
    }

    /// Construct a plain assistant-text message.
    #[must_use]
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::Message {
            role: Role::Assistant,
            content: vec![ContentBlock::OutputText { text: text.into() }],
        }
    }

    /// Construct the user-role message carrying one tool result.
    #[must_use]
    pub fn tool_result(
        tool_use_id: ToolCallId,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self::Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id,
                content: content.into(),
                is_error,
                images: Vec::new(),
            }],
        }
    }

    /// All `ToolUse` ids introduced by this item, if it is a message.
    #[must_use]
    pub fn tool_use_ids(&self) -> Vec<&ToolCallId> {
        match self {
            Self::Message { content, .. } => content
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, .. } => Some(id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// All `ToolResult` ids answered by this item, if it is a message.
    #[must_use]
    pub fn tool_result_ids(&self) -> Vec<&ToolCallId> {
        match self {
            Self::Message { content, .. } => content
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Verify that every `ToolUse` id in `items` has a matching `ToolResult`
/// elsewhere in `items`, and vice versa. Returns the set of unpaired ids.
///
/// A non-empty result does not necessarily indicate corruption: the
/// conversation may be mid-iteration, with results still pending.
#[must_use]
pub fn unpaired_tool_call_ids(items: &[ConversationItem]) -> Vec<ToolCallId> {
    let mut uses = std::collections::HashSet::new();
    let mut results = std::collections::HashSet::new();
    for item in items {
        for id in item.tool_use_ids() {
            uses.insert(id.clone());
        }
        for id in item.tool_result_ids() {
            results.insert(id.clone());
        }
    }
    uses.symmetric_difference(&results).cloned().collect()
}
