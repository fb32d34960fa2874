//! Process-wide registry of compiled grammars.
//!
//! Tables are expensive to build and immutable once built, so they are
//! compiled once per grammar fingerprint and handed out as `Arc` clones.
//! The lifecycle is explicit: populated by [`compile_cached`], read by
//! [`lookup`], cleared by [`reset`]. Readers never block compilation of
//! other grammars for longer than the map insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use canopy_core::Grammar;
use canopy_tables::CompiledGrammar;

use crate::GrammarError;

static TABLES: OnceLock<Mutex<HashMap<u64, Arc<CompiledGrammar>>>> = OnceLock::new();

fn tables() -> &'static Mutex<HashMap<u64, Arc<CompiledGrammar>>> {
    TABLES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Compile a grammar, reusing the cached tables when this grammar (by
/// fingerprint) was compiled before.
pub fn compile_cached(grammar: &Grammar) -> Result<Arc<CompiledGrammar>, GrammarError> {
    let fingerprint = crate::fingerprint(grammar);

    if let Some(cached) = lookup(fingerprint) {
        return Ok(cached);
    }

    // Compile outside the lock; a racing duplicate compile produces an
    // identical table, so last-insert-wins is harmless.
    let compiled = Arc::new(crate::compile(grammar)?);
    tables()
        .lock()
        .expect("registry lock poisoned")
        .insert(fingerprint, Arc::clone(&compiled));
    Ok(compiled)
}

/// Fetch previously compiled tables by fingerprint.
pub fn lookup(fingerprint: u64) -> Option<Arc<CompiledGrammar>> {
    tables()
        .lock()
        .expect("registry lock poisoned")
        .get(&fingerprint)
        .cloned()
}

/// Register externally produced tables (e.g. decoded from an artifact).
pub fn register(compiled: Arc<CompiledGrammar>) {
    tables()
        .lock()
        .expect("registry lock poisoned")
        .insert(compiled.fingerprint, compiled);
}

/// Drop every cached table. Outstanding `Arc` handles stay valid.
pub fn reset() {
    tables().lock().expect("registry lock poisoned").clear();
}
