//! Certificate chain building via DFS path finding.
//!
//! Given a leaf and the pooled intermediates, finds a chain that
//! terminates at a trust anchor using depth-first search with
//! backtracking, so cross-signed or duplicate intermediates cannot
//! wedge the search.

use crate::cert::ParsedCert;
use crate::TppvError;
use std::sync::Arc;

/// Maximum chain length during path building. Regulatory CA trees are
/// depth 5 at most; the bound exists to terminate on adversarial pools.
pub(crate) const MAX_CHAIN_DEPTH: usize = 16;

/// Check whether `child`'s signature verifies under `issuer`'s key.
/// Parse failures count as non-matches so the search backtracks
/// instead of aborting.
fn signed_by(child: &ParsedCert, issuer: &ParsedCert) -> bool {
    let (Ok(child_x509), Ok(issuer_x509)) = (child.x509(), issuer.x509()) else {
        return false;
    };
    child_x509
        .verify_signature(Some(issuer_x509.public_key()))
        .is_ok()
}

/// Build a chain from `leaf` to a trust anchor.
///
/// Returns `Ok(None)` when no path exists. The returned chain is
/// leaf-first and ends with the anchoring root.
pub(crate) fn build_chain_dfs(
    leaf: &Arc<ParsedCert>,
    pool: &[Arc<ParsedCert>],
    roots: &[Arc<ParsedCert>],
) -> Result<Option<Vec<Arc<ParsedCert>>>, TppvError> {
    let mut chain = vec![Arc::clone(leaf)];
    let mut used = vec![false; pool.len()];
    if dfs(leaf, &mut chain, &mut used, pool, roots) {
        Ok(Some(chain))
    } else {
        Ok(None)
    }
}

fn dfs(
    current: &Arc<ParsedCert>,
    chain: &mut Vec<Arc<ParsedCert>>,
    used: &mut [bool],
    pool: &[Arc<ParsedCert>],
    roots: &[Arc<ParsedCert>],
) -> bool {
    // The current certificate may itself be a seeded anchor.
    if roots.iter().any(|r| r.sha256() == current.sha256()) {
        return true;
    }

    // Does a root directly issue the current certificate?
    for root in roots {
        if root.subject_der() == current.issuer_der() && signed_by(current, root) {
            chain.push(Arc::clone(root));
            return true;
        }
    }

    if chain.len() >= MAX_CHAIN_DEPTH {
        return false;
    }

    // Try each unused pooled intermediate as the next link.
    for (idx, candidate) in pool.iter().enumerate() {
        if used[idx]
            || candidate.subject_der() != current.issuer_der()
            || candidate.sha256() == current.sha256()
        {
            continue;
        }
        if !signed_by(current, candidate) {
            continue;
        }

        used[idx] = true;
        chain.push(Arc::clone(candidate));

        if dfs(candidate, chain, used, pool, roots) {
            return true;
        }

        chain.pop();
        used[idx] = false;
    }

    false
}
