//! PKCS#7 / CMS certificate extraction (RFC 2315).
//!
//! EU trust-service providers publish CA bundles at AIA URLs as
//! certificates-only SignedData. Only the `certificates` field is of
//! interest here; digests and signer infos are skipped.

use crate::der::{self, Tlv};
use crate::TppvError;

const SIGNED_DATA: &str = "1.2.840.113549.1.7.2";

fn p7_error(what: &str) -> TppvError {
    TppvError::BadFormat(format!("not a PKCS#7 structure: {}", what))
}

/// Extract the DER certificates from a PKCS#7 SignedData blob, in the
/// order they appear.
///
/// Layout walked here:
/// `ContentInfo ::= SEQUENCE { contentType OID, [0] EXPLICIT SignedData }`
/// `SignedData ::= SEQUENCE { version, digestAlgorithms, contentInfo,
///  certificates [0] IMPLICIT OPTIONAL, crls [1] OPTIONAL, signerInfos }`
pub(crate) fn extract_certificates(input: &[u8]) -> Result<Vec<Vec<u8>>, TppvError> {
    let (content_info, rest) = der::expect_tlv(input, der::TAG_SEQUENCE)?;
    if !rest.is_empty() {
        return Err(p7_error("trailing bytes after ContentInfo"));
    }

    let (content_type, after_oid) = der::expect_tlv(content_info.content, der::TAG_OID)?;
    if der::decode_oid(content_type.content)? != SIGNED_DATA {
        return Err(p7_error("contentType is not signedData"));
    }

    let (wrapper, _) = der::read_tlv(after_oid)?;
    if !(wrapper.is_context() && wrapper.is_constructed() && wrapper.tag_number() == 0) {
        return Err(p7_error("missing [0] content"));
    }

    let (signed_data, _) = der::expect_tlv(wrapper.content, der::TAG_SEQUENCE)?;

    // Skip version, digestAlgorithms, encapContentInfo; the next
    // context-[0] element is the certificate set.
    let mut fields = der::iter_tlvs(signed_data.content);
    let mut cert_set: Option<Tlv> = None;
    for field in &mut fields {
        let field = field?;
        if field.is_context() && field.tag_number() == 0 {
            cert_set = Some(field);
            break;
        }
        if field.is_context() && field.tag_number() == 1 {
            // crls come after certificates; seeing them first means
            // the bundle carries no certificates at all.
            break;
        }
    }
    let cert_set = cert_set.ok_or(TppvError::Empty)?;

    let mut certs = Vec::new();
    for element in der::iter_tlvs(cert_set.content) {
        let element = element?;
        if element.tag == der::TAG_SEQUENCE {
            certs.push(element.raw.to_vec());
        }
    }
    if certs.is_empty() {
        return Err(TppvError::Empty);
    }
    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::der::der_wrap;

    fn wrap_signed_data(certs: &[&[u8]]) -> Vec<u8> {
        let version = vec![der::TAG_INTEGER, 0x01, 0x01];
        let digest_algs = der_wrap(0x31, &[]).unwrap();
        let inner_oid = crate::der::encode_oid("1.2.840.113549.1.7.1").unwrap();
        let encap = der_wrap(der::TAG_SEQUENCE, &inner_oid).unwrap();
        let mut cert_content = Vec::new();
        for c in certs {
            cert_content.extend_from_slice(c);
        }
        let cert_set = der_wrap(0xa0, &cert_content).unwrap();
        let signer_infos = der_wrap(0x31, &[]).unwrap();

        let mut sd = Vec::new();
        sd.extend_from_slice(&version);
        sd.extend_from_slice(&digest_algs);
        sd.extend_from_slice(&encap);
        sd.extend_from_slice(&cert_set);
        sd.extend_from_slice(&signer_infos);
        let signed_data = der_wrap(der::TAG_SEQUENCE, &sd).unwrap();

        let mut ci = crate::der::encode_oid(SIGNED_DATA).unwrap();
        let explicit = der_wrap(0xa0, &signed_data).unwrap();
        ci.extend_from_slice(&explicit);
        der_wrap(der::TAG_SEQUENCE, &ci).unwrap()
    }

    #[test]
    fn extracts_certificates_in_order() {
        let cert_a = der_wrap(der::TAG_SEQUENCE, &[0x01, 0x02]).unwrap();
        let cert_b = der_wrap(der::TAG_SEQUENCE, &[0x03, 0x04, 0x05]).unwrap();
        let p7 = wrap_signed_data(&[&cert_a, &cert_b]);
        let certs = extract_certificates(&p7).unwrap();
        assert_eq!(certs, vec![cert_a, cert_b]);
    }

    #[test]
    fn rejects_wrong_content_type() {
        let mut ci = crate::der::encode_oid("1.2.840.113549.1.7.1").unwrap();
        let explicit = der_wrap(0xa0, &[]).unwrap();
        ci.extend_from_slice(&explicit);
        let blob = der_wrap(der::TAG_SEQUENCE, &ci).unwrap();
        assert!(extract_certificates(&blob).is_err());
    }

    #[test]
    fn empty_certificate_set_is_empty_error() {
        let p7 = wrap_signed_data(&[]);
        assert!(matches!(
            extract_certificates(&p7),
            Err(TppvError::Empty)
        ));
    }
}
