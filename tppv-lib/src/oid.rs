//! Centralized OID string constants used throughout tppv-lib.
//!
//! Object Identifiers (OIDs) are defined by ITU-T X.660 and referenced
//! in RFC 5280 (X.509), RFC 6960 (OCSP), ETSI TS 119 495 (PSD2
//! qualified certificate profile) and ETSI EN 319 412-5 (qcStatements).
//! Grouping them here avoids magic strings scattered across modules and
//! gives each OID a readable name.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";

/// organizationIdentifier (X.520). Carries the TPP's open banking ID in
/// PSD2 qualified certificates.
pub const ORGANIZATION_IDENTIFIER: &str = "2.5.4.97";

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";

// ── PKIX Authority Information Access (RFC 5280 Section 4.2.2) ──────────

pub const EXT_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const ACCESS_OCSP: &str = "1.3.6.1.5.5.7.48.1";
pub const ACCESS_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

// ── Extended Key Usage values (RFC 5280 Section 4.2.1.12) ────────────────

pub const EKU_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const EKU_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const EKU_ANY: &str = "2.5.29.37.0";

// ── qcStatements (RFC 3739 / ETSI EN 319 412-5) ──────────────────────────

/// The qcStatements certificate extension.
pub const EXT_QC_STATEMENTS: &str = "1.3.6.1.5.5.7.1.3";

/// QcPDS statement carrying PKI disclosure URL/language pairs.
pub const QC_PDS: &str = "0.4.0.1862.1.5";

// ── PSD2 (ETSI TS 119 495) ───────────────────────────────────────────────

/// PSD2 QcStatement: roles of the PSP plus the NCA name and identifier.
pub const QC_PSD2: &str = "0.4.0.19495.2";

pub const ROLE_PSP_PI: &str = "0.4.0.19495.1.1";
pub const ROLE_PSP_AI: &str = "0.4.0.19495.1.2";
pub const ROLE_PSP_AS: &str = "0.4.0.19495.1.3";
pub const ROLE_PSP_IC: &str = "0.4.0.19495.1.4";

// ── OCSP (RFC 6960) ──────────────────────────────────────────────────────

/// id-pkix-ocsp-basic: the BasicOCSPResponse response type.
pub const OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";

// ── Digest algorithms ────────────────────────────────────────────────────

pub const SHA1: &str = "1.3.14.3.2.26";
pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
