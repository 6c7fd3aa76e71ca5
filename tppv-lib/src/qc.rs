//! qcStatements extension decoding (RFC 3739 / ETSI EN 319 412-5).
//!
//! The extension value is a SEQUENCE OF `QCStatement { id OID, value
//! ANY OPTIONAL }`. Two statements matter here: the PSD2 statement
//! (ETSI TS 119 495) carrying the PSP's roles and the National
//! Competent Authority identity, and the QcPDS statement carrying
//! disclosure URL/language pairs.

use crate::oid;
use crate::TppvError;
use serde::{Deserialize, Serialize};
use x509_parser::der_parser::ber::BerObject;
use x509_parser::der_parser::parse_der;
use x509_parser::prelude::*;

/// One role from the PSD2 statement, e.g. `(0.4.0.19495.1.1, "PSP_PI")`.
///
/// Reserved roles are preserved for audit even though only PSP_PI and
/// PSP_AI contribute to scope intersection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PspRole {
    pub oid: String,
    pub name: String,
}

/// National Competent Authority identity from the PSD2 statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nca {
    /// Two-letter country code, the leading characters of `id`.
    pub country: String,
    pub name: String,
    pub id: String,
}

/// Decoded PSD2 QcStatement.
#[derive(Debug, Clone)]
pub struct Psd2Attributes {
    pub roles: Vec<PspRole>,
    pub nca: Nca,
}

/// A QcPDS URL/language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyUrl {
    pub url: String,
    pub lang: String,
}

fn qc_error(what: &str) -> TppvError {
    TppvError::BadFormat(format!("malformed qcStatements extension: {}", what))
}

/// Locate the qcStatements extension and return its parsed statement
/// sequence, or `None` when the extension is absent.
fn statements<'a>(x509: &'a X509Certificate) -> Result<Option<BerObject<'a>>, TppvError> {
    for ext in x509.extensions() {
        if ext.oid.to_id_string() != oid::EXT_QC_STATEMENTS {
            continue;
        }
        let (_, obj) =
            parse_der(ext.value).map_err(|_| qc_error("not a DER sequence"))?;
        return Ok(Some(obj));
    }
    Ok(None)
}

/// Extract the PSD2 roles and NCA identity, or `None` when the
/// certificate carries no qcStatements extension or no PSD2 statement.
pub(crate) fn psd2_attributes(
    x509: &X509Certificate,
) -> Result<Option<Psd2Attributes>, TppvError> {
    let obj = match statements(x509)? {
        Some(obj) => obj,
        None => return Ok(None),
    };
    let stmts = obj.as_sequence().map_err(|_| qc_error("not a sequence"))?;

    for stmt in stmts {
        let fields = stmt
            .as_sequence()
            .map_err(|_| qc_error("statement is not a sequence"))?;
        let id = fields
            .first()
            .and_then(|o| o.as_oid().ok())
            .ok_or_else(|| qc_error("statement without OID"))?;
        if id.to_id_string() != oid::QC_PSD2 {
            continue;
        }
        let value = fields
            .get(1)
            .ok_or_else(|| qc_error("PSD2 statement without value"))?;
        return decode_psd2(value).map(Some);
    }
    Ok(None)
}

/// Decode `PSD2QcType { rolesOfPSP SEQUENCE OF Role, ncaName, ncaId }`.
fn decode_psd2(value: &BerObject) -> Result<Psd2Attributes, TppvError> {
    let fields = value
        .as_sequence()
        .map_err(|_| qc_error("PSD2 value is not a sequence"))?;
    if fields.len() < 3 {
        return Err(qc_error("PSD2 value is too short"));
    }

    let mut roles = Vec::new();
    let role_list = fields[0]
        .as_sequence()
        .map_err(|_| qc_error("rolesOfPSP is not a sequence"))?;
    for role in role_list {
        let parts = role
            .as_sequence()
            .map_err(|_| qc_error("role is not a sequence"))?;
        let role_oid = parts
            .first()
            .and_then(|o| o.as_oid().ok())
            .ok_or_else(|| qc_error("role without OID"))?;
        let name = parts
            .get(1)
            .and_then(|o| o.as_str().ok())
            .ok_or_else(|| qc_error("role without name"))?;
        roles.push(PspRole {
            oid: role_oid.to_id_string(),
            name: name.to_string(),
        });
    }

    let nca_name = fields[1]
        .as_str()
        .map_err(|_| qc_error("ncaName is not a string"))?;
    let nca_id = fields[2]
        .as_str()
        .map_err(|_| qc_error("ncaId is not a string"))?;

    Ok(Psd2Attributes {
        roles,
        nca: Nca {
            country: nca_id.chars().take(2).collect(),
            name: nca_name.to_string(),
            id: nca_id.to_string(),
        },
    })
}

/// Extract the QcPDS URL/language pairs. Decoded for completeness;
/// nothing in the verdict path consumes them.
pub fn policy_urls(cert: &crate::ParsedCert) -> Result<Vec<PolicyUrl>, TppvError> {
    let x509 = cert.x509()?;
    let obj = match statements(&x509)? {
        Some(obj) => obj,
        None => return Ok(Vec::new()),
    };
    let stmts = obj.as_sequence().map_err(|_| qc_error("not a sequence"))?;

    let mut urls = Vec::new();
    for stmt in stmts {
        let fields = stmt
            .as_sequence()
            .map_err(|_| qc_error("statement is not a sequence"))?;
        let id = fields
            .first()
            .and_then(|o| o.as_oid().ok())
            .ok_or_else(|| qc_error("statement without OID"))?;
        if id.to_id_string() != oid::QC_PDS {
            continue;
        }
        let pairs = fields
            .get(1)
            .and_then(|o| o.as_sequence().ok())
            .ok_or_else(|| qc_error("QcPDS value is not a sequence"))?;
        for pair in pairs {
            let parts = pair
                .as_sequence()
                .map_err(|_| qc_error("QcPDS entry is not a sequence"))?;
            let url = parts
                .first()
                .and_then(|o| o.as_str().ok())
                .ok_or_else(|| qc_error("QcPDS entry without URL"))?;
            let lang = parts
                .get(1)
                .and_then(|o| o.as_str().ok())
                .ok_or_else(|| qc_error("QcPDS entry without language"))?;
            urls.push(PolicyUrl {
                url: url.to_string(),
                lang: lang.to_string(),
            });
        }
    }
    Ok(urls)
}
