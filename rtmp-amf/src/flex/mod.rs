use crate::amf3::read::AMF3Decoder;
use crate::amf3::{ExternalCodec, Externals};
use crate::nom_utils::AMFResult;
use log::trace;
use nom::number::complete::be_u8;
use std::fmt::Write as _;
use std::sync::Arc;

mod collection;
mod json;
mod message;

pub use collection::CollectionCodec;
pub use json::JsonCodec;
pub use message::MessageCodec;

/// Class name of the async message header
pub const ASYNC_MESSAGE: &str = "DSA";
/// Class name of the acknowledge message header
pub const ACKNOWLEDGE_MESSAGE: &str = "DSK";
/// Class names that wrap a single array
pub const COLLECTION_CLASSES: [&str; 2] = [
    "flex.messaging.io.ArrayCollection",
    "flex.messaging.io.ArrayList",
];
/// Class names whose body is a length prefixed json document
pub const JSON_CLASSES: [&str; 4] = [
    "com.riotgames.platform.systemstate.ClientSystemStatesNotification",
    "com.riotgames.platform.broadcast.BroadcastNotification",
    "com.riotgames.platform.summoner.SummonerCatalog",
    "com.riotgames.platform.game.GameTypeConfigDTO",
];

const NEXT_FLAG: u8 = 128;

const CLIENT_ID_BYTES_FLAG: u8 = 1;
const MESSAGE_ID_BYTES_FLAG: u8 = 2;

const CORRELATION_ID_FLAG: u8 = 1;
const CORRELATION_ID_BYTES_FLAG: u8 = 2;

/// Register the codecs for every class in this module
pub fn register_codecs(externals: &mut Externals) {
    externals.register(ASYNC_MESSAGE, Arc::new(MessageCodec::async_message()));
    externals.register(ACKNOWLEDGE_MESSAGE, Arc::new(MessageCodec::acknowledge()));

    let collection: Arc<dyn ExternalCodec> = Arc::new(CollectionCodec);
    for name in COLLECTION_CLASSES {
        externals.register(name, collection.clone());
    }

    let json: Arc<dyn ExternalCodec> = Arc::new(JsonCodec);
    for name in JSON_CLASSES {
        externals.register(name, json.clone());
    }
}

/// Read a sequence of flag bytes, each one continues the sequence if its high bit is set
fn parse_flags(i: &[u8]) -> AMFResult<'_, Vec<u8>> {
    let mut flags = Vec::new();

    let mut k = i;
    loop {
        let (j, flag) = be_u8(k)?;
        flags.push(flag);
        k = j;
        if flag & NEXT_FLAG == 0 {
            break;
        }
    }

    Ok((k, flags))
}

/// Read and discard one value for every set bit from `reserved` up to bit 5
fn skip_unknown_fields<'a>(
    i: &'a [u8],
    decoder: &mut AMF3Decoder<'_>,
    flag: u8,
    reserved: u32,
) -> AMFResult<'a, ()> {
    let mut k = i;
    if flag >> reserved == 0 {
        return Ok((k, ()));
    }

    for bit in reserved..6 {
        if (flag >> bit) & 1 != 0 {
            let (j, value) = decoder.parse_single_element(k)?;
            trace!("Discarding unknown flex field {bit}: {value:?}");
            k = j;
        }
    }

    Ok((k, ()))
}

/// Format id bytes as lowercase hex with dashes before bytes 4, 6, 8 and 10
pub fn format_uuid(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2 + 4);
    for (index, byte) in bytes.iter().enumerate() {
        if matches!(index, 4 | 6 | 8 | 10) {
            s.push('-');
        }
        let _ = write!(s, "{byte:02x}");
    }
    s
}

/// Parse a `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` string back into its 16 bytes
pub fn parse_uuid(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return None;
    }

    let mut out = Vec::with_capacity(16);
    let mut index = 0;
    while index < bytes.len() {
        if matches!(index, 8 | 13 | 18 | 23) {
            if bytes[index] != b'-' {
                return None;
            }
            index += 1;
            continue;
        }
        let pair = &bytes[index..index + 2];
        if !pair.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        let pair = std::str::from_utf8(pair).ok()?;
        out.push(u8::from_str_radix(pair, 16).ok()?);
        index += 2;
    }

    Some(out)
}
