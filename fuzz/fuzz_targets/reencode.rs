#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlfold::EncodeOptions;

// Whatever decodes must encode to a document that decodes again
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(mapping) = xmlfold::try_decode(s) {
            let xml = xmlfold::encode(&mapping, &EncodeOptions::default());
            assert!(xmlfold::try_decode(&xml).is_ok(), "re-encoded output failed to parse: {xml}");
        }
    }
});
