//! Error types for the protocol layer.

/// Errors that can occur while parsing protocol values from strings.
///
/// Deserialization from JSON goes through serde and produces serde
/// errors; this enum covers the non-serde entry points (`FromStr`).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The string is not a UUID-shaped room identifier.
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),
}
