//! Artifact framing for compiled grammars.
//!
//! Layout: 4 magic bytes, little-endian u16 format version, little-endian
//! u32 crc32 of the payload, postcard payload. Decoding validates each in
//! turn and then structurally checks the tables, so a decoded artifact is
//! as trustworthy as a freshly compiled one.

use crate::CompiledGrammar;

/// Leading bytes of every compiled grammar artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"CNPY";

/// Bumped whenever the serialized table layout changes.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4;

/// Error decoding a compiled grammar artifact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    #[error("not a canopy artifact (bad magic bytes)")]
    Magic,

    #[error("artifact format version {found} is not supported (expected {FORMAT_VERSION})")]
    Version { found: u16 },

    #[error("artifact checksum mismatch")]
    Checksum,

    #[error("artifact payload is malformed: {0}")]
    Decode(String),

    #[error("table structure is malformed: {0}")]
    Malformed(&'static str),

    #[error("pattern DFA is malformed: {0}")]
    Dfa(String),
}

impl CompiledGrammar {
    /// Serialize to the framed artifact format.
    pub fn to_artifact_bytes(&self) -> Vec<u8> {
        let payload = postcard::to_allocvec(self).expect("serialization should not fail");
        let checksum = crc32fast::hash(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&ARTIFACT_MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&checksum.to_le_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Decode and validate a framed artifact.
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < HEADER_LEN || bytes[..4] != ARTIFACT_MAGIC {
            return Err(ArtifactError::Magic);
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(ArtifactError::Version { found: version });
        }

        let stored = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload = &bytes[HEADER_LEN..];
        if crc32fast::hash(payload) != stored {
            return Err(ArtifactError::Checksum);
        }

        let grammar: CompiledGrammar =
            postcard::from_bytes(payload).map_err(|e| ArtifactError::Decode(e.to_string()))?;
        grammar.validate()?;
        Ok(grammar)
    }
}
