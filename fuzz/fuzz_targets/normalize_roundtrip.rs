#![no_main]

use libfuzzer_sys::fuzz_target;
use tppv_lib::{decode_certs, normalize_armor};

fuzz_target!(|data: &[u8]| {
    // Armor normalization must be idempotent on any input.
    let once = normalize_armor(data);
    let twice = normalize_armor(once.as_bytes());
    assert_eq!(once, twice, "normalize_armor is not idempotent");

    // If the raw input decodes, the normalized form must decode to the
    // same certificate.
    if let Ok(certs) = decode_certs(data) {
        if certs.len() == 1 {
            if let Ok(renormalized) = decode_certs(once.as_bytes()) {
                if renormalized.len() == 1 {
                    assert_eq!(
                        certs[0].sha256(),
                        renormalized[0].sha256(),
                        "normalization changed certificate identity"
                    );
                }
            }
        }
    }
});
