//! X.509 path validation against the trust store pools.
//!
//! Builds a candidate chain from the leaf through the intermediates
//! pool to a seeded root, then applies the chain checks: signatures
//! (verified during path building), validity windows at the supplied
//! time, CA basic constraints and keyCertSign, and the leaf's extended
//! key usage.

mod chain;
mod checks;

use crate::cert::ParsedCert;
use crate::TppvError;
use std::sync::Arc;

use chain::build_chain_dfs;
use checks::{check_chain_ca_fitness, check_chain_time_validity, check_leaf_purpose};

/// Verify `leaf` against `roots` at time `now_ts`, drawing candidate
/// issuers from `pool`.
///
/// Returns the first valid chain found, leaf-first with the trust
/// anchor as its last element. Fails with [`TppvError::Untrusted`] when
/// no path reaches a root or a chain check rejects the path.
pub fn verify_path(
    leaf: &Arc<ParsedCert>,
    roots: &[Arc<ParsedCert>],
    pool: &[Arc<ParsedCert>],
    now_ts: i64,
) -> Result<Vec<Arc<ParsedCert>>, TppvError> {
    if roots.is_empty() {
        return Err(TppvError::Untrusted("trust store has no roots".into()));
    }

    let chain = build_chain_dfs(leaf, pool, roots)?
        .ok_or_else(|| TppvError::Untrusted("no path to a trusted root".into()))?;

    let mut errors = Vec::new();
    check_chain_time_validity(&chain, now_ts, &mut errors);
    check_chain_ca_fitness(&chain, &mut errors)?;
    check_leaf_purpose(leaf, &mut errors)?;

    if !errors.is_empty() {
        return Err(TppvError::Untrusted(errors.join("; ")));
    }

    Ok(chain)
}
