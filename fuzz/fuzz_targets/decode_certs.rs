#![no_main]

use libfuzzer_sys::fuzz_target;
use tppv_lib::decode_certs;

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, regardless of input shape:
    // PEM, raw base64, DER, PKCS#7, or garbage.
    if let Ok(certs) = decode_certs(data) {
        // If decoding succeeds, exercise the derived fields.
        for cert in &certs {
            let _ = cert.sha256();
            let _ = cert.serial();
            let _ = cert.subject();
            let _ = cert.issuer();
            let _ = cert.company_id();
            let _ = cert.usage();
            let _ = cert.parent_links();
            let _ = cert.crls();
            let _ = cert.ocsps();
            let _ = cert.roles();
            let _ = cert.nca();
            let _ = cert.valid_at(0);
            let _ = cert.to_pem();
            let _ = tppv_lib::policy_urls(cert);
        }
    }
});
