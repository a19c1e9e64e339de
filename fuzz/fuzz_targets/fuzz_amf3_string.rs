#![no_main]
use libfuzzer_sys::fuzz_target;

use rtmp_amf::amf3::{AMF3Decoder, Externals};
use rtmp_amf::reference_tables::ReferenceTables;

fuzz_target!(|data: &[u8]| {
    let externals = Externals::new();
    let mut tables = ReferenceTables::default();
    let _ = AMF3Decoder::new(&mut tables, &externals).parse_string(data);
});
