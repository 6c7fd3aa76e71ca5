//! Shared test fixtures: generated PSD2 certificate chains, a canned
//! HTTP client, and DER builders for qcStatements / AIA extensions and
//! OCSP responses.

#![allow(dead_code)] // each integration test binary uses a subset

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CustomExtension, DistinguishedName,
    DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::sync::Mutex;
use ::time::OffsetDateTime;
use tppv_lib::{HttpClient, HttpResponse, TppvError};
use x509_parser::prelude::*;

/// Fixed verification clock: 2025-06-15T12:00:00Z. All generated
/// certificates get validity windows around this instant.
pub const NOW: i64 = 1_749_988_800;

pub const QC_STATEMENTS_OID: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 3];
pub const AIA_OID: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 1];

// ---------------------------------------------------------------------------
// Minimal DER builders
// ---------------------------------------------------------------------------

pub mod der {
    pub fn wrap(tag: u8, content: &[u8]) -> Vec<u8> {
        let len = content.len();
        let mut out = vec![tag];
        if len < 0x80 {
            out.push(len as u8);
        } else if len < 0x100 {
            out.push(0x81);
            out.push(len as u8);
        } else {
            out.push(0x82);
            out.push((len >> 8) as u8);
            out.push(len as u8);
        }
        out.extend_from_slice(content);
        out
    }

    pub fn oid(dotted: &str) -> Vec<u8> {
        let arcs: Vec<u64> = dotted.split('.').map(|p| p.parse().unwrap()).collect();
        let mut content = vec![(arcs[0] * 40 + arcs[1]) as u8];
        for &arc in &arcs[2..] {
            let mut stack = Vec::new();
            let mut v = arc;
            loop {
                stack.push((v & 0x7f) as u8);
                v >>= 7;
                if v == 0 {
                    break;
                }
            }
            stack.reverse();
            let last = stack.len() - 1;
            for (i, b) in stack.into_iter().enumerate() {
                content.push(if i < last { b | 0x80 } else { b });
            }
        }
        wrap(0x06, &content)
    }

    pub fn utf8(s: &str) -> Vec<u8> {
        wrap(0x0c, s.as_bytes())
    }

    pub fn printable(s: &str) -> Vec<u8> {
        wrap(0x13, s.as_bytes())
    }

    pub fn ia5(s: &str) -> Vec<u8> {
        wrap(0x16, s.as_bytes())
    }

    pub fn octet(bytes: &[u8]) -> Vec<u8> {
        wrap(0x04, bytes)
    }

    pub fn integer(magnitude: &[u8]) -> Vec<u8> {
        let stripped: &[u8] = match magnitude.iter().position(|&b| b != 0) {
            Some(pos) => &magnitude[pos..],
            None => &[0],
        };
        let mut content = Vec::new();
        if stripped[0] & 0x80 != 0 {
            content.push(0);
        }
        content.extend_from_slice(stripped);
        wrap(0x02, &content)
    }

    pub fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
        wrap(0x30, &parts.concat())
    }

    pub fn generalized_time(s: &str) -> Vec<u8> {
        wrap(0x18, s.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Extension payloads
// ---------------------------------------------------------------------------

/// Build a qcStatements extension value carrying the PSD2 statement
/// (and a QcPDS statement, matching real issuance).
pub fn qc_statements_der(roles: &[(&str, &str)], nca_name: &str, nca_id: &str) -> Vec<u8> {
    let role_seq: Vec<Vec<u8>> = roles
        .iter()
        .map(|(oid, name)| der::sequence(&[der::oid(oid), der::utf8(name)]))
        .collect();
    let psd2_value = der::sequence(&[
        der::sequence(&role_seq),
        der::printable(nca_name),
        der::printable(nca_id),
    ]);
    let psd2_stmt = der::sequence(&[der::oid("0.4.0.19495.2"), psd2_value]);

    let pds_value = der::sequence(&[der::sequence(&[
        der::ia5("https://example.com/qcps_en"),
        der::printable("en"),
    ])]);
    let pds_stmt = der::sequence(&[der::oid("0.4.0.1862.1.5"), pds_value]);

    der::sequence(&[pds_stmt, psd2_stmt])
}

/// Build an AuthorityInfoAccess extension value. GeneralName URIs are
/// context tag [6], primitive.
pub fn aia_der(ca_issuers: &[&str], ocsp: &[&str]) -> Vec<u8> {
    let mut descs = Vec::new();
    for url in ocsp {
        descs.push(der::sequence(&[
            der::oid("1.3.6.1.5.5.7.48.1"),
            der::wrap(0x86, url.as_bytes()),
        ]));
    }
    for url in ca_issuers {
        descs.push(der::sequence(&[
            der::oid("1.3.6.1.5.5.7.48.2"),
            der::wrap(0x86, url.as_bytes()),
        ]));
    }
    der::sequence(&descs)
}

// ---------------------------------------------------------------------------
// Certificate generation
// ---------------------------------------------------------------------------

pub struct TestCa {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl TestCa {
    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }
}

fn validity(params: &mut CertificateParams) {
    params.not_before = OffsetDateTime::from_unix_timestamp(NOW - 365 * 86_400).unwrap();
    params.not_after = OffsetDateTime::from_unix_timestamp(NOW + 365 * 86_400).unwrap();
}

fn ca_params(cn: &str) -> CertificateParams {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "FI");
    dn.push(DnType::OrganizationName, "Test Trust Services");
    dn.push(DnType::CommonName, cn);
    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    validity(&mut params);
    params
}

/// Self-signed root CA.
pub fn make_root(cn: &str) -> TestCa {
    let key = KeyPair::generate().unwrap();
    let cert = ca_params(cn).self_signed(&key).unwrap();
    TestCa { cert, key }
}

/// Intermediate CA signed by `issuer`, optionally carrying a caIssuers
/// URL pointing at the issuer's certificate.
pub fn make_intermediate(cn: &str, issuer: &TestCa, aia_url: Option<&str>) -> TestCa {
    let key = KeyPair::generate().unwrap();
    let mut params = ca_params(cn);
    if let Some(url) = aia_url {
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(
                AIA_OID,
                aia_der(&[url], &[]),
            ));
    }
    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    TestCa { cert, key }
}

/// Everything a PSD2 leaf test certificate can vary.
pub struct LeafSpec<'a> {
    pub company_id: &'a str,
    pub roles: &'a [(&'a str, &'a str)],
    pub nca_name: &'a str,
    pub nca_id: &'a str,
    /// keyEncipherment → QWAC, contentCommitment → QSEAL.
    pub key_usages: Vec<KeyUsagePurpose>,
    pub ca_url: Option<&'a str>,
    pub ocsp_url: Option<&'a str>,
    /// Shift both validity bounds by this many seconds relative to the
    /// default window around [`NOW`]; large negative values produce an
    /// expired certificate.
    pub validity_shift: i64,
}

impl Default for LeafSpec<'_> {
    fn default() -> Self {
        LeafSpec {
            company_id: "PSDFI-FINFSA-1234567-8",
            roles: &[
                ("0.4.0.19495.1.1", "PSP_PI"),
                ("0.4.0.19495.1.2", "PSP_AI"),
            ],
            nca_name: "Finnish Financial Supervisory Authority",
            nca_id: "FI-FINFSA",
            key_usages: vec![KeyUsagePurpose::KeyEncipherment],
            ca_url: Some("http://ca.test/issuing-ca.crt"),
            ocsp_url: Some("http://ocsp.test/status"),
            validity_shift: 0,
        }
    }
}

/// Generate a PSD2 leaf signed by `issuer`; returns the DER bytes.
pub fn make_leaf(spec: &LeafSpec, issuer: &TestCa) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "FI");
    dn.push(DnType::LocalityName, "HELSINKI");
    dn.push(DnType::OrganizationName, "Some Company Name");
    dn.push(DnType::CustomDnType(vec![2, 5, 4, 97]), spec.company_id);
    dn.push(DnType::CommonName, "domain.com");

    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.key_usages = spec.key_usages.clone();
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::ServerAuth,
    ];
    params.not_before =
        OffsetDateTime::from_unix_timestamp(NOW - 365 * 86_400 + spec.validity_shift).unwrap();
    params.not_after =
        OffsetDateTime::from_unix_timestamp(NOW + 365 * 86_400 + spec.validity_shift).unwrap();

    params
        .custom_extensions
        .push(CustomExtension::from_oid_content(
            QC_STATEMENTS_OID,
            qc_statements_der(spec.roles, spec.nca_name, spec.nca_id),
        ));
    let ca_urls: Vec<&str> = spec.ca_url.into_iter().collect();
    let ocsp_urls: Vec<&str> = spec.ocsp_url.into_iter().collect();
    if !ca_urls.is_empty() || !ocsp_urls.is_empty() {
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(
                AIA_OID,
                aia_der(&ca_urls, &ocsp_urls),
            ));
    }

    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    cert.der().to_vec()
}

/// PEM-wrap DER bytes.
pub fn to_pem(der: &[u8]) -> String {
    use base64::Engine;
    let body = base64::engine::general_purpose::STANDARD.encode(der);
    let wrapped: Vec<&str> = body
        .as_bytes()
        .chunks(64)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();
    format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        wrapped.join("\n")
    )
}

// ---------------------------------------------------------------------------
// OCSP response fabrication
// ---------------------------------------------------------------------------

pub enum OcspStatus {
    Good,
    Revoked,
    Unknown,
}

/// Build a DER OCSPResponse for `leaf` as vouched by `issuer`.
pub fn ocsp_response_der(leaf_der: &[u8], issuer_der: &[u8], status: OcspStatus) -> Vec<u8> {
    let (_, leaf) = X509Certificate::from_der(leaf_der).unwrap();
    let (_, issuer) = X509Certificate::from_der(issuer_der).unwrap();

    let name_hash = Sha1::digest(issuer.subject().as_raw());
    let key_hash = Sha1::digest(&issuer.public_key().subject_public_key.data);
    let serial = leaf.tbs_certificate.raw_serial();

    let alg_id = der::sequence(&[der::oid("1.3.14.3.2.26"), vec![0x05, 0x00]]);
    let cert_id = der::sequence(&[
        alg_id.clone(),
        der::octet(&name_hash),
        der::octet(&key_hash),
        der::integer(serial),
    ]);

    let cert_status = match status {
        OcspStatus::Good => vec![0x80, 0x00],
        OcspStatus::Revoked => der::wrap(0xa1, &der::generalized_time("20250601000000Z")),
        OcspStatus::Unknown => vec![0x82, 0x00],
    };

    let single = der::sequence(&[
        cert_id,
        cert_status,
        der::generalized_time("20250615110000Z"),
    ]);
    let responses = der::sequence(&[single]);

    let responder_id = der::wrap(0xa2, &der::octet(&key_hash));
    let response_data = der::sequence(&[
        responder_id,
        der::generalized_time("20250615110000Z"),
        responses,
    ]);

    let basic = der::sequence(&[
        response_data,
        alg_id,
        der::wrap(0x03, &[0x00, 0xde, 0xad, 0xbe, 0xef]),
    ]);

    let response_bytes = der::sequence(&[
        der::oid("1.3.6.1.5.5.7.48.1.1"),
        der::octet(&basic),
    ]);

    der::wrap(
        0x30,
        &[
            der::wrap(0x0a, &[0x00]),
            der::wrap(0xa0, &response_bytes),
        ]
        .concat(),
    )
}

// ---------------------------------------------------------------------------
// Canned HTTP client
// ---------------------------------------------------------------------------

/// [`HttpClient`] that serves canned bodies and counts calls, standing
/// in for AIA hosts and OCSP responders.
#[derive(Default)]
pub struct MockHttp {
    get_routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    post_routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    get_counts: Mutex<HashMap<String, usize>>,
    post_counts: Mutex<HashMap<String, usize>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(&self, url: &str, status: u16, body: Vec<u8>) {
        self.get_routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body));
    }

    pub fn on_post(&self, url: &str, status: u16, body: Vec<u8>) {
        self.post_routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body));
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.get_counts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn post_count(&self, url: &str) -> usize {
        self.post_counts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.get_counts.lock().unwrap().values().sum::<usize>()
            + self.post_counts.lock().unwrap().values().sum::<usize>()
    }
}

#[async_trait::async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, TppvError> {
        *self
            .get_counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        match self.get_routes.lock().unwrap().get(url) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(TppvError::UpstreamFetch(format!("no route for GET {}", url))),
        }
    }

    async fn post(
        &self,
        url: &str,
        _content_type: &str,
        _accept: &str,
        _body: Vec<u8>,
    ) -> Result<HttpResponse, TppvError> {
        *self
            .post_counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        match self.post_routes.lock().unwrap().get(url) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(TppvError::UpstreamFetch(format!("no route for POST {}", url))),
        }
    }
}
