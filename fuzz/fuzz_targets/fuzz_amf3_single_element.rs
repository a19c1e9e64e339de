//! Decodes one value and, when that succeeds, checks the encoder accepts it back
#![no_main]
use libfuzzer_sys::fuzz_target;

use rtmp_amf::amf3;
use rtmp_amf::amf3::Externals;
use rtmp_amf::reference_tables::ReferenceTables;

fuzz_target!(|data: &[u8]| {
    let externals = Externals::with_flex();
    if let Ok((node, _)) = amf3::decode(data, &mut ReferenceTables::default(), &externals) {
        let _ = amf3::encode(&node, &mut ReferenceTables::default(), &externals);
    }
});
