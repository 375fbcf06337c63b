use std::fmt;

use crate::graph::spec::NodeId;

/// Engine-level error kinds surfaced to widgets.
///
/// Every fallible operation in the engine resolves to one of these kinds.
/// Widgets render them as a status line; they never carry stack traces.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The audio runtime is locked and no user gesture was supplied.
    GestureRequired,
    /// A sample could not be fetched.
    LoadFailed { url: String, cause: String },
    /// A sample was fetched but could not be decoded.
    DecodeFailed { url: String, cause: String },
    /// File type or size outside the accepted set (wav/mp3, ≤ 50 MB).
    UnsupportedFile { url: String },
    /// An operation was attempted in a state that does not permit it.
    InvalidState(String),
    /// An export was requested before the source sample finished loading.
    NotLoaded,
    /// An export was requested with nothing audible to capture.
    NothingToRender,
    /// The offline render itself failed.
    RenderFailed { cause: String },
    /// An operation reached a handle after `Graph::dispose`.
    DisposedHandle { node: NodeId },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::GestureRequired => {
                write!(f, "audio is locked; unlock requires a user gesture")
            }
            EngineError::LoadFailed { url, cause } => {
                write!(f, "failed to load '{url}': {cause}")
            }
            EngineError::DecodeFailed { url, cause } => {
                write!(f, "failed to decode '{url}': {cause}")
            }
            EngineError::UnsupportedFile { url } => {
                write!(f, "unsupported audio file '{url}'")
            }
            EngineError::InvalidState(what) => write!(f, "invalid state: {what}"),
            EngineError::NotLoaded => write!(f, "source sample is not loaded"),
            EngineError::NothingToRender => write!(f, "nothing to render"),
            EngineError::RenderFailed { cause } => write!(f, "render failed: {cause}"),
            EngineError::DisposedHandle { node } => {
                write!(f, "node {node} has been disposed")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors raised while validating or materializing a [`crate::graph::spec::GraphSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The spec references a node id that does not exist.
    UnknownNode(NodeId),
    /// The spec contains a cycle outside an effect's encapsulated feedback.
    CycleDetected,
    /// The spec does not terminate at exactly one destination.
    DestinationCount(usize),
    /// An edge addresses a port the node does not have.
    BadPort { node: NodeId, port: usize },
    /// A node kind rejected its initial parameters.
    BadParam { node: NodeId, param: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::UnknownNode(id) => write!(f, "unknown node id {id}"),
            GraphError::CycleDetected => write!(f, "graph spec contains a cycle"),
            GraphError::DestinationCount(n) => {
                write!(f, "graph spec must have exactly one destination, found {n}")
            }
            GraphError::BadPort { node, port } => {
                write!(f, "node {node} has no port {port}")
            }
            GraphError::BadParam { node, param } => {
                write!(f, "node {node} rejected parameter '{param}'")
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for EngineError {
    fn from(e: GraphError) -> Self {
        EngineError::InvalidState(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        let err = EngineError::LoadFailed {
            url: "samples/kick.wav".into(),
            cause: "connection reset".into(),
        };
        let text = err.to_string();
        assert!(text.contains("samples/kick.wav"), "got: {text}");
        assert!(text.contains("connection reset"), "got: {text}");
    }

    #[test]
    fn graph_error_converts_to_engine_error() {
        let engine: EngineError = GraphError::CycleDetected.into();
        assert!(matches!(engine, EngineError::InvalidState(_)));
    }
}
