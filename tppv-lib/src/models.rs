//! TPP directory entry model and open banking identifier handling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// A payment service a TPP may be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Service {
    /// Account information service.
    #[serde(rename = "AIS")]
    Ais,
    /// Payment initiation service.
    #[serde(rename = "PIS")]
    Pis,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Ais => write!(f, "AIS"),
            Service::Pis => write!(f, "PIS"),
        }
    }
}

/// A TPP as registered in the regulatory directory.
///
/// `ob_id` follows the open banking shape
/// `PSD<country>-<authority>-<natRefCode>` with dashes and spaces
/// stripped from the national reference code; see [`normalize_ob_id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tpp {
    pub ob_id: String,
    pub name_latin: String,
    pub name_native: String,
    pub authority: String,
    pub country: String,
    /// Registered services per country code, in registry order.
    pub services: BTreeMap<String, Vec<Service>>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub authorized_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub withdrawn_at: Option<OffsetDateTime>,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub registry: String,
}

/// Normalize a TPP identifier to directory form.
///
/// The identifier embedded in a certificate subject is
/// `PSD<country>-<authority>-<natRef>` where the national reference may
/// itself contain dashes (e.g. `PSDFI-FINFSA-0111027-9`). The first two
/// tokens are kept, the rest is joined with dashes removed, and any
/// embedded spaces are stripped. Idempotent.
pub fn normalize_ob_id(id: &str) -> String {
    let cleaned: String = id.chars().filter(|c| *c != ' ').collect();
    let mut parts = cleaned.split('-');
    match (parts.next(), parts.next()) {
        (Some(prefix), Some(authority)) => {
            let nat_ref: String = parts.collect();
            if nat_ref.is_empty() {
                format!("{}-{}", prefix, authority)
            } else {
                format!("{}-{}-{}", prefix, authority, nat_ref)
            }
        }
        _ => cleaned,
    }
}
