#![no_main]
use libfuzzer_sys::fuzz_target;

use rtmp_amf::amf0;
use rtmp_amf::amf3::Externals;
use rtmp_amf::reference_tables::ReferenceTables;

fuzz_target!(|data: &[u8]| {
    let externals = Externals::with_flex();
    let _ = amf0::decode_all(data, &mut ReferenceTables::default(), &externals);
});
