//! OCSP revocation checking (RFC 6960).
//!
//! Builds an unsigned single-certificate OCSP request, POSTs it to the
//! leaf's responder, and parses the response far enough to recover the
//! certificate status for the matching CertID. `good` and `unknown`
//! both mean "not revoked"; transport and parse failures are errors so
//! the caller can distinguish "checked, fine" from "could not check".

use crate::cert::ParsedCert;
use crate::der::{self, Tlv};
use crate::http::HttpClient;
use crate::oid;
use crate::TppvError;
use digest::Digest;
use std::sync::Arc;
use tracing::debug;

/// Certificate status reported by a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStatus {
    Good,
    Revoked,
    Unknown,
}

/// Queries the leaf's first OCSP responder over an injected HTTP client.
pub struct RevocationChecker {
    http: Arc<dyn HttpClient>,
}

fn ocsp_error(what: impl Into<String>) -> TppvError {
    TppvError::Revocation(what.into())
}

impl RevocationChecker {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        RevocationChecker { http }
    }

    /// Ask the leaf's responder whether the certificate is revoked.
    ///
    /// Returns `Ok(true)` only for a definitive `revoked` status;
    /// `good` and `unknown` yield `Ok(false)`. Missing responder URL,
    /// non-200 status, and unparseable responses are errors.
    pub async fn is_revoked(
        &self,
        leaf: &ParsedCert,
        issuer: &ParsedCert,
    ) -> Result<bool, TppvError> {
        let url = leaf
            .ocsps()
            .first()
            .ok_or_else(|| ocsp_error("certificate has no OCSP responder URL"))?;

        let request = build_request(leaf, issuer)?;
        let response = self
            .http
            .post(
                url,
                "application/ocsp-request",
                "application/ocsp-response",
                request,
            )
            .await
            .map_err(|e| ocsp_error(format!("POST {}: {}", url, e)))?;
        if response.status != 200 {
            return Err(ocsp_error(format!(
                "responder {} returned status {}",
                url, response.status
            )));
        }

        let status = parse_response(&response.body, leaf, issuer)?;
        debug!(url = %url, serial = leaf.serial(), ?status, "OCSP responder answered");
        Ok(status == CertStatus::Revoked)
    }
}

/// Assemble an unsigned OCSPRequest for `(leaf, issuer)` with a SHA-1
/// CertID:
///
/// `OCSPRequest ::= SEQUENCE { tbsRequest TBSRequest }`
/// `TBSRequest ::= SEQUENCE { requestList SEQUENCE OF Request }`
/// `Request ::= SEQUENCE { reqCert CertID }`
pub(crate) fn build_request(
    leaf: &ParsedCert,
    issuer: &ParsedCert,
) -> Result<Vec<u8>, TppvError> {
    let serial = leaf.serial_bytes();
    if serial.is_empty() {
        return Err(ocsp_error("certificate serial number unavailable"));
    }

    let cert_id = encode_cert_id(
        oid::SHA1,
        &sha1::Sha1::digest(issuer.subject_der()),
        &sha1::Sha1::digest(issuer.public_key_raw()),
        &serial,
    )?;
    let request = der::der_wrap(der::TAG_SEQUENCE, &cert_id)?;
    let request_list = der::der_wrap(der::TAG_SEQUENCE, &request)?;
    let tbs_request = der::der_wrap(der::TAG_SEQUENCE, &request_list)?;
    der::der_wrap(der::TAG_SEQUENCE, &tbs_request)
}

/// Encode `CertID ::= SEQUENCE { hashAlgorithm, issuerNameHash,
/// issuerKeyHash, serialNumber }`.
fn encode_cert_id(
    hash_oid: &str,
    name_hash: &[u8],
    key_hash: &[u8],
    serial: &[u8],
) -> Result<Vec<u8>, TppvError> {
    let mut alg = der::encode_oid(hash_oid)?;
    alg.extend_from_slice(&[der::TAG_NULL, 0x00]);
    let alg_id = der::der_wrap(der::TAG_SEQUENCE, &alg)?;

    let mut content = alg_id;
    content.extend_from_slice(&der::der_wrap(der::TAG_OCTET_STRING, name_hash)?);
    content.extend_from_slice(&der::der_wrap(der::TAG_OCTET_STRING, key_hash)?);
    content.extend_from_slice(&der::encode_unsigned_integer(serial)?);
    Ok(content)
}

/// Parse an OCSPResponse and return the status of the SingleResponse
/// whose CertID matches `(leaf, issuer)`.
pub(crate) fn parse_response(
    body: &[u8],
    leaf: &ParsedCert,
    issuer: &ParsedCert,
) -> Result<CertStatus, TppvError> {
    // OCSPResponse ::= SEQUENCE { responseStatus ENUMERATED,
    //                             responseBytes [0] EXPLICIT OPTIONAL }
    let (outer, _) = der::expect_tlv(body, der::TAG_SEQUENCE)
        .map_err(|_| ocsp_error("response is not a DER sequence"))?;
    let (status, rest) = der::expect_tlv(outer.content, 0x0a)
        .map_err(|_| ocsp_error("missing responseStatus"))?;
    match status.content {
        [0] => {}
        [code] => return Err(ocsp_error(format!("responder error status {}", code))),
        _ => return Err(ocsp_error("malformed responseStatus")),
    }

    let (response_bytes_wrapper, _) =
        der::read_tlv(rest).map_err(|_| ocsp_error("missing responseBytes"))?;
    if !(response_bytes_wrapper.is_context() && response_bytes_wrapper.tag_number() == 0) {
        return Err(ocsp_error("missing responseBytes"));
    }

    // ResponseBytes ::= SEQUENCE { responseType OID, response OCTET STRING }
    let (response_bytes, _) =
        der::expect_tlv(response_bytes_wrapper.content, der::TAG_SEQUENCE)
            .map_err(|_| ocsp_error("malformed responseBytes"))?;
    let (response_type, rest) = der::expect_tlv(response_bytes.content, der::TAG_OID)
        .map_err(|_| ocsp_error("missing responseType"))?;
    if der::decode_oid(response_type.content)? != oid::OCSP_BASIC {
        return Err(ocsp_error("unsupported responseType"));
    }
    let (basic_octets, _) = der::expect_tlv(rest, der::TAG_OCTET_STRING)
        .map_err(|_| ocsp_error("missing response octets"))?;

    // BasicOCSPResponse ::= SEQUENCE { tbsResponseData ResponseData, ... }
    let (basic, _) = der::expect_tlv(basic_octets.content, der::TAG_SEQUENCE)
        .map_err(|_| ocsp_error("malformed BasicOCSPResponse"))?;
    let (response_data, _) = der::expect_tlv(basic.content, der::TAG_SEQUENCE)
        .map_err(|_| ocsp_error("malformed ResponseData"))?;

    // ResponseData ::= SEQUENCE { version [0] OPTIONAL, responderID,
    //                             producedAt, responses SEQUENCE OF ... }
    let mut responses: Option<Tlv> = None;
    for element in der::iter_tlvs(response_data.content) {
        let element = element?;
        if element.tag == der::TAG_SEQUENCE {
            responses = Some(element);
            break;
        }
    }
    let responses = responses.ok_or_else(|| ocsp_error("missing responses list"))?;

    for single in der::iter_tlvs(responses.content) {
        let single = single?;
        if single.tag != der::TAG_SEQUENCE {
            continue;
        }
        if let Some(status) = match_single_response(single.content, leaf, issuer)? {
            return Ok(status);
        }
    }

    Err(ocsp_error("no response entry matches the certificate"))
}

/// Check one `SingleResponse ::= SEQUENCE { certID, certStatus, ... }`
/// against the presented pair; returns the status when the CertID
/// matches.
fn match_single_response(
    content: &[u8],
    leaf: &ParsedCert,
    issuer: &ParsedCert,
) -> Result<Option<CertStatus>, TppvError> {
    let (cert_id, rest) = der::expect_tlv(content, der::TAG_SEQUENCE)
        .map_err(|_| ocsp_error("malformed CertID"))?;
    if !cert_id_matches(cert_id.content, leaf, issuer)? {
        return Ok(None);
    }

    let (status, _) = der::read_tlv(rest).map_err(|_| ocsp_error("missing certStatus"))?;
    if !status.is_context() {
        return Err(ocsp_error("malformed certStatus"));
    }
    match status.tag_number() {
        0 => Ok(Some(CertStatus::Good)),
        1 => Ok(Some(CertStatus::Revoked)),
        2 => Ok(Some(CertStatus::Unknown)),
        other => Err(ocsp_error(format!("unknown certStatus tag {}", other))),
    }
}

/// Compare a response CertID against hashes recomputed from the
/// presented issuer and the leaf serial, honoring the response's own
/// hash algorithm (SHA-1 or SHA-256).
fn cert_id_matches(
    content: &[u8],
    leaf: &ParsedCert,
    issuer: &ParsedCert,
) -> Result<bool, TppvError> {
    let (alg_id, rest) = der::expect_tlv(content, der::TAG_SEQUENCE)
        .map_err(|_| ocsp_error("malformed CertID algorithm"))?;
    let (alg_oid, _) = der::expect_tlv(alg_id.content, der::TAG_OID)
        .map_err(|_| ocsp_error("malformed CertID algorithm"))?;

    let (expected_name, expected_key) = match der::decode_oid(alg_oid.content)?.as_str() {
        oid::SHA1 => (
            sha1::Sha1::digest(issuer.subject_der()).to_vec(),
            sha1::Sha1::digest(issuer.public_key_raw()).to_vec(),
        ),
        oid::SHA256 => (
            sha2::Sha256::digest(issuer.subject_der()).to_vec(),
            sha2::Sha256::digest(issuer.public_key_raw()).to_vec(),
        ),
        other => return Err(ocsp_error(format!("unsupported CertID hash {}", other))),
    };

    let (name_hash, rest) = der::expect_tlv(rest, der::TAG_OCTET_STRING)
        .map_err(|_| ocsp_error("malformed issuerNameHash"))?;
    let (key_hash, rest) = der::expect_tlv(rest, der::TAG_OCTET_STRING)
        .map_err(|_| ocsp_error("malformed issuerKeyHash"))?;
    let (serial, _) = der::expect_tlv(rest, der::TAG_INTEGER)
        .map_err(|_| ocsp_error("malformed serialNumber"))?;

    let leaf_serial = leaf.serial_bytes();
    Ok(name_hash.content == expected_name.as_slice()
        && key_hash.content == expected_key.as_slice()
        && strip_leading_zeros(serial.content) == strip_leading_zeros(&leaf_serial))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
