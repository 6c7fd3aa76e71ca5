//! Parsed certificate type and derived PSD2 fields.

use crate::qc::{self, Nca, PspRole};
use crate::util;
use crate::TppvError;
use digest::Digest;
use serde::{Deserialize, Serialize};
use x509_parser::prelude::*;

/// Where a certificate sits in a chain, as recorded by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Root,
    Intermediate,
    Leaf,
}

/// Certificate usage derived from key-usage bits.
///
/// PSD2 qualified certificates come in two flavors: QWACs (website
/// authentication, keyEncipherment) and QSEALs (electronic seals,
/// contentCommitment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Usage {
    Qwac,
    Qseal,
    Unknown,
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Usage::Qwac => write!(f, "QWAC"),
            Usage::Qseal => write!(f, "QSEAL"),
            Usage::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A decoded X.509 certificate with the fields the verification flow
/// needs, owned and immutable.
///
/// The original DER stays attached so signatures can be verified and
/// the fingerprint recomputed at any point; everything else is derived
/// once at construction.
#[derive(Debug, Clone)]
pub struct ParsedCert {
    raw: Vec<u8>,
    sha256: String,
    serial: String,
    subject: String,
    issuer: String,
    subject_der: Vec<u8>,
    issuer_der: Vec<u8>,
    public_key_raw: Vec<u8>,
    company_id: String,
    not_before: i64,
    not_after: i64,
    usage: Usage,
    parent_links: Vec<String>,
    crls: Vec<String>,
    ocsps: Vec<String>,
    roles: Vec<PspRole>,
    nca: Option<Nca>,
    self_signed: bool,
}

impl ParsedCert {
    /// Parse a single DER-encoded certificate. Trailing bytes are an
    /// error; use [`crate::decode_certs`] for concatenated input.
    pub fn from_der(der: &[u8]) -> Result<Self, TppvError> {
        let (rest, parsed) = Self::from_der_prefix(der)?;
        if !rest.is_empty() {
            return Err(TppvError::BadFormat(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }
        Ok(parsed)
    }

    /// Parse one certificate from the front of `der`, returning the
    /// remaining bytes. Only the consumed bytes enter the stored raw
    /// DER, so the fingerprint covers exactly one certificate.
    pub(crate) fn from_der_prefix(der: &[u8]) -> Result<(&[u8], Self), TppvError> {
        let (remaining, x509) = X509Certificate::from_der(der)
            .map_err(|e| TppvError::BadFormat(format!("{}", e)))?;
        let cert_len = der.len() - remaining.len();
        let parsed = Self::build(&x509, &der[..cert_len])?;
        Ok((remaining, parsed))
    }

    fn build(x509: &X509Certificate, raw_der: &[u8]) -> Result<Self, TppvError> {
        let tbs = &x509.tbs_certificate;

        let psd2 = qc::psd2_attributes(x509)?;
        let (roles, nca) = match psd2 {
            Some(attrs) => (attrs.roles, Some(attrs.nca)),
            None => (Vec::new(), None),
        };

        let mut parent_links = Vec::new();
        let mut ocsps = Vec::new();
        let mut crls = Vec::new();
        for ext in x509.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::AuthorityInfoAccess(aia) => {
                    for desc in &aia.accessdescs {
                        if let GeneralName::URI(uri) = &desc.access_location {
                            match desc.access_method.to_id_string().as_str() {
                                crate::oid::ACCESS_CA_ISSUERS => {
                                    parent_links.push(uri.to_string())
                                }
                                crate::oid::ACCESS_OCSP => ocsps.push(uri.to_string()),
                                _ => {}
                            }
                        }
                    }
                }
                ParsedExtension::CRLDistributionPoints(cdp) => {
                    for point in &cdp.points {
                        if let Some(x509_parser::extensions::DistributionPointName::FullName(
                            names,
                        )) = &point.distribution_point
                        {
                            for gn in names {
                                if let GeneralName::URI(uri) = gn {
                                    crls.push(uri.to_string());
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(ParsedCert {
            sha256: hex::encode(sha2::Sha256::digest(raw_der)),
            serial: util::hex_colon_upper(tbs.raw_serial()),
            subject: dn_oneline(&tbs.subject),
            issuer: dn_oneline(&tbs.issuer),
            subject_der: tbs.subject.as_raw().to_vec(),
            issuer_der: tbs.issuer.as_raw().to_vec(),
            public_key_raw: tbs.subject_pki.subject_public_key.data.to_vec(),
            company_id: subject_attr(&tbs.subject, crate::oid::ORGANIZATION_IDENTIFIER)
                .unwrap_or_default(),
            not_before: tbs.validity.not_before.timestamp(),
            not_after: tbs.validity.not_after.timestamp(),
            usage: derive_usage(x509),
            parent_links,
            crls,
            ocsps,
            roles,
            nca,
            self_signed: tbs.subject.as_raw() == tbs.issuer.as_raw(),
            raw: raw_der.to_vec(),
        })
    }

    /// Re-parse the stored DER. Infallible in practice (the bytes were
    /// produced by a successful parse), but the error is propagated
    /// rather than unwrapped.
    pub(crate) fn x509(&self) -> Result<X509Certificate<'_>, TppvError> {
        X509Certificate::from_der(&self.raw)
            .map(|(_, cert)| cert)
            .map_err(|e| TppvError::BadFormat(format!("{}", e)))
    }

    /// Re-encode as PEM.
    pub fn to_pem(&self) -> String {
        format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            util::base64_wrap(&self.raw)
        )
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Hex-encoded SHA-256 of the DER bytes. This is the certificate's
    /// identity everywhere: trust pools, directory rows, dedup guards.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Serial number as colon-separated uppercase hex.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Raw DER of the subject Name, for issuer/subject linkage checks.
    pub(crate) fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    /// Raw DER of the issuer Name.
    pub(crate) fn issuer_der(&self) -> &[u8] {
        &self.issuer_der
    }

    /// Content bytes of the subjectPublicKey BIT STRING.
    pub(crate) fn public_key_raw(&self) -> &[u8] {
        &self.public_key_raw
    }

    /// Serial INTEGER magnitude bytes, recovered from the stored DER.
    pub(crate) fn serial_bytes(&self) -> Vec<u8> {
        self.x509()
            .map(|x| x.tbs_certificate.raw_serial().to_vec())
            .unwrap_or_default()
    }

    /// The subject organizationIdentifier (OID 2.5.4.97), or empty when
    /// the certificate does not carry one.
    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// caIssuers URLs from the Authority Information Access extension.
    pub fn parent_links(&self) -> &[String] {
        &self.parent_links
    }

    pub fn crls(&self) -> &[String] {
        &self.crls
    }

    /// OCSP responder URLs from the Authority Information Access extension.
    pub fn ocsps(&self) -> &[String] {
        &self.ocsps
    }

    /// PSD2 roles in certificate order, reserved roles included.
    pub fn roles(&self) -> &[PspRole] {
        &self.roles
    }

    pub fn nca(&self) -> Option<&Nca> {
        self.nca.as_ref()
    }

    pub fn is_self_signed(&self) -> bool {
        self.self_signed
    }

    /// Whether `ts` falls inside the validity window.
    pub fn valid_at(&self, ts: i64) -> bool {
        self.not_before <= ts && ts <= self.not_after
    }
}

/// Derive QWAC/QSEAL/UNKNOWN from the key-usage bits.
fn derive_usage(x509: &X509Certificate) -> Usage {
    match x509.key_usage() {
        Ok(Some(ku)) if ku.value.key_encipherment() => Usage::Qwac,
        Ok(Some(ku)) if ku.value.non_repudiation() => Usage::Qseal,
        _ => Usage::Unknown,
    }
}

/// Find a subject attribute by OID.
fn subject_attr(name: &X509Name, oid: &str) -> Option<String> {
    for rdn in name.iter() {
        for attr in rdn.iter() {
            if attr.attr_type().to_id_string() == oid {
                return attr.as_str().ok().map(|s| s.to_string());
            }
        }
    }
    None
}

/// Format a distinguished name as a comma-separated one-line string,
/// e.g. `C = FI, O = Some Company, organizationIdentifier = PSDFI-...`.
fn dn_oneline(name: &X509Name) -> String {
    let mut out = String::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(&util::oid_short_name(&attr.attr_type().to_id_string()));
            out.push_str(" = ");
            out.push_str(attr.as_str().unwrap_or("<binary>"));
        }
    }
    out
}
