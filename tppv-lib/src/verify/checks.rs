//! Individual chain check functions.
//!
//! Each check pushes human-readable findings into a shared error list;
//! the caller decides whether the accumulated findings reject the path.

use crate::cert::ParsedCert;
use crate::TppvError;
use std::sync::Arc;

/// Every path member must be inside its validity window at `now_ts`.
pub(crate) fn check_chain_time_validity(
    chain: &[Arc<ParsedCert>],
    now_ts: i64,
    errors: &mut Vec<String>,
) {
    for (depth, cert) in chain.iter().enumerate() {
        if now_ts < cert.not_before() {
            errors.push(format!(
                "certificate at depth {} ({}) is not yet valid",
                depth,
                cert.subject()
            ));
        }
        if now_ts > cert.not_after() {
            errors.push(format!(
                "certificate at depth {} ({}) has expired",
                depth,
                cert.subject()
            ));
        }
    }
}

/// Every certificate above the leaf must be a CA (BasicConstraints
/// CA:TRUE) and, when a key-usage extension is present, carry
/// keyCertSign (RFC 5280 Sections 4.2.1.9 and 4.2.1.3).
pub(crate) fn check_chain_ca_fitness(
    chain: &[Arc<ParsedCert>],
    errors: &mut Vec<String>,
) -> Result<(), TppvError> {
    for (depth, cert) in chain.iter().enumerate().skip(1) {
        let x509 = cert.x509()?;

        match x509.basic_constraints() {
            Ok(Some(bc)) if bc.value.ca => {}
            _ => {
                errors.push(format!(
                    "certificate at depth {} ({}) is used as issuer but is not a CA",
                    depth,
                    cert.subject()
                ));
            }
        }

        if let Ok(Some(ku)) = x509.key_usage() {
            if !ku.value.key_cert_sign() {
                errors.push(format!(
                    "certificate at depth {} ({}) is a CA but Key Usage does not \
                     include keyCertSign",
                    depth,
                    cert.subject()
                ));
            }
        }
    }
    Ok(())
}

/// The leaf's extended key usage, when the extension is present, must
/// include clientAuth, serverAuth, or anyExtendedKeyUsage. An absent
/// extension is accepted; QSEALs routinely omit it.
pub(crate) fn check_leaf_purpose(
    leaf: &Arc<ParsedCert>,
    errors: &mut Vec<String>,
) -> Result<(), TppvError> {
    let x509 = leaf.x509()?;
    if let Ok(Some(eku)) = x509.extended_key_usage() {
        let eku = eku.value;
        if !(eku.any || eku.client_auth || eku.server_auth) {
            errors.push(format!(
                "leaf ({}) extended key usage allows neither client nor server \
                 authentication",
                leaf.subject()
            ));
        }
    }
    Ok(())
}
