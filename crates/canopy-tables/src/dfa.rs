//! DFA deserialization for pattern terminals.

use regex_automata::dfa::sparse::DFA;

/// Deserialize a sparse DFA from table bytes.
///
/// The bytes must have been produced by `DFA::to_bytes_little_endian()`.
/// We only serialize DFAs we built, and the format is stable within the
/// same regex-automata version.
pub fn deserialize_dfa(bytes: &[u8]) -> Result<DFA<&[u8]>, String> {
    DFA::from_bytes(bytes)
        .map(|(dfa, _)| dfa)
        .map_err(|e| e.to_string())
}
