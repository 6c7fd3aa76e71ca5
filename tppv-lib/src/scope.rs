//! Intersection of certificate roles with registered TPP services.

use crate::cert::ParsedCert;
use crate::models::{Service, Tpp};
use crate::oid;
use std::collections::BTreeMap;
use tracing::debug;

/// Map a PSD2 role OID to the service it authorizes. The reserved
/// roles (PSP_AS, PSP_IC) stay on the certificate's role list for
/// audit but grant no scope.
fn role_service(role_oid: &str) -> Option<Service> {
    match role_oid {
        oid::ROLE_PSP_PI => Some(Service::Pis),
        oid::ROLE_PSP_AI => Some(Service::Ais),
        _ => None,
    }
}

/// Intersect the leaf's PSD2 roles with the TPP's per-country services.
///
/// The order of each country's service list follows the TPP's registry
/// entry; countries with an empty intersection are omitted entirely.
pub fn resolve_scopes(leaf: &ParsedCert, tpp: &Tpp) -> BTreeMap<String, Vec<Service>> {
    let mut granted: Vec<Service> = Vec::new();
    for role in leaf.roles() {
        match role_service(&role.oid) {
            Some(service) => granted.push(service),
            None => {
                debug!(oid = %role.oid, name = %role.name, "role grants no scope, skipping");
            }
        }
    }

    let mut scopes = BTreeMap::new();
    for (country, services) in &tpp.services {
        let intersection: Vec<Service> = services
            .iter()
            .copied()
            .filter(|s| granted.contains(s))
            .collect();
        if !intersection.is_empty() {
            scopes.insert(country.clone(), intersection);
        }
    }
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_roles_grant_nothing() {
        assert_eq!(role_service(oid::ROLE_PSP_PI), Some(Service::Pis));
        assert_eq!(role_service(oid::ROLE_PSP_AI), Some(Service::Ais));
        assert_eq!(role_service(oid::ROLE_PSP_AS), None);
        assert_eq!(role_service(oid::ROLE_PSP_IC), None);
        assert_eq!(role_service("1.2.3.4"), None);
    }
}
