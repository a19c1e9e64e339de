#![no_main]
use libfuzzer_sys::fuzz_target;

use rtmp_amf::amf3::varint::read_u29;

fuzz_target!(|data: &[u8]| {
    let _ = read_u29(data);
});
