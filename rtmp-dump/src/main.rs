use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};
use log::{debug, error};
use rtmp_amf::amf0;
use rtmp_amf::amf3::Externals;
use rtmp_amf::chunk::CHUNK_SIZE;
use rtmp_amf::handshake::HANDSHAKE_SIZE;
use rtmp_amf::message::MessageReassembler;
use rtmp_amf::reference_tables::{ReferenceTables, TableScope};
use rtmp_amf::session::AMF0_COMMAND;
use serde_json::json;

fn cli() -> Command {
    Command::new("RTMP capture -> json dumper")
        .version("1.0")
        .about("Prints every AMF0 command message in a captured server to client chunk stream")
        .arg(
            Arg::new("INPUT")
                .help("File holding the captured stream")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("Chunk size the stream was written with")
                .default_value("128")
                .value_parser(value_parser!(NonZeroUsize)),
        )
        .arg(
            Arg::new("table-scope")
                .long("table-scope")
                .help("Lifetime of the AMF reference tables")
                .default_value("per-message")
                .value_parser(["per-message", "per-connection"]),
        )
        .arg(
            Arg::new("skip-handshake")
                .long("skip-handshake")
                .help("Skip the S0, S1 and S2 handshake packets at the start of the capture")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    env_logger::init();

    let matched = cli().get_matches();

    let path = matched
        .get_one::<PathBuf>("INPUT")
        .expect("INPUT is required");
    let chunk_size = matched
        .get_one::<NonZeroUsize>("chunk-size")
        .copied()
        .unwrap_or(CHUNK_SIZE);
    let scope = match matched.get_one::<String>("table-scope").map(String::as_str) {
        Some("per-connection") => TableScope::PerConnection,
        _ => TableScope::PerMessage,
    };

    let data = std::fs::read(path).expect("Unable to read capture");
    let data = if matched.get_flag("skip-handshake") {
        data.get(1 + 2 * HANDSHAKE_SIZE..).unwrap_or_default().to_vec()
    } else {
        data
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Unable to start runtime");
    if let Err(e) = runtime.block_on(dump(&data, chunk_size, scope)) {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn dump(data: &[u8], chunk_size: NonZeroUsize, scope: TableScope) -> Result<(), rtmp_amf::Error> {
    let externals = Externals::with_flex();
    let mut tables = ReferenceTables::new(scope);
    let mut reassembler = MessageReassembler::new(chunk_size);

    let mut reader = data;
    while let Some(message) = reassembler.read_next_message(&mut reader).await? {
        if message.message.type_id != AMF0_COMMAND {
            debug!(
                "Skipping message of type 0x{:02x} on channel {}",
                message.message.type_id,
                message.channel_id()
            );
            continue;
        }

        tables.begin_message();
        let body = amf0::decode_all(&message.payload, &mut tables, &externals)?;
        let json = json!({
            "channel": message.channel_id(),
            "header": message.message,
            "body": body,
        });
        println!("{json}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_chunk_size_rejected() {
        let matched = cli().try_get_matches_from(["rtmp-dump", "capture.bin", "--chunk-size", "0"]);
        assert!(matched.is_err());

        let matched = cli()
            .try_get_matches_from(["rtmp-dump", "capture.bin", "--chunk-size", "4096"])
            .unwrap();
        assert_eq!(
            matched.get_one::<NonZeroUsize>("chunk-size").map(|size| size.get()),
            Some(4096)
        );
    }
}
