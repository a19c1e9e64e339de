use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rtmp_amf::amf3::Externals;
use rtmp_amf::reference_tables::{ReferenceTables, TableScope};
use rtmp_amf::types::{Amf0Node, Amf3Node, Amf3Object};
use rtmp_amf::{amf0, amf3};

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

fn command() -> Vec<Amf0Node> {
    let message = Amf3Object::typed("DSK")
        .with("body", Amf3Object::anonymous().with("status", "ok").with("count", 3))
        .with("clientId", "12345678-9abc-def0-0123-456789abcdef")
        .with("messageId", "12345678-9abc-def0-0123-456789abcdef")
        .with("timeStamp", 1.6e12)
        .with("correlationId", "abc");
    vec![
        Amf0Node::from("_result"),
        Amf0Node::from(1.0),
        Amf0Node::Null,
        Amf0Node::Amf3(vec![Amf3Node::from(message)]),
    ]
}

fn collection(size: i32) -> Vec<Amf3Node> {
    let items = (0..size)
        .map(|i| {
            Amf3Node::from(
                Amf3Object::typed("com.example.Item")
                    .with("id", i)
                    .with("name", "item"),
            )
        })
        .collect::<Vec<_>>();
    vec![Amf3Node::from(
        Amf3Object::typed("flex.messaging.io.ArrayCollection").with("array", items),
    )]
}

fn criterion_benchmark(c: &mut Criterion) {
    let externals = Externals::with_flex();

    let nodes = command();
    let bytes = amf0::encode_all(&nodes, &mut ReferenceTables::default(), &externals)
        .expect("Unable to encode command");
    c.bench_function("decode_amf0_command", |b| {
        b.iter(|| {
            let mut tables = ReferenceTables::new(TableScope::PerMessage);
            black_box(amf0::decode_all(&bytes, &mut tables, &externals).unwrap());
        })
    });
    c.bench_function("encode_amf0_command", |b| {
        b.iter(|| {
            let mut tables = ReferenceTables::new(TableScope::PerMessage);
            black_box(amf0::encode_all(&nodes, &mut tables, &externals).unwrap());
        })
    });

    let nodes = collection(500);
    let bytes = amf3::encode_all(&nodes, &mut ReferenceTables::default(), &externals)
        .expect("Unable to encode collection");
    c.bench_function("decode_amf3_collection", |b| {
        b.iter(|| {
            let mut tables = ReferenceTables::new(TableScope::PerMessage);
            black_box(amf3::decode_all(&bytes, &mut tables, &externals).unwrap());
        })
    });
    c.bench_function("encode_amf3_collection", |b| {
        b.iter(|| {
            let mut tables = ReferenceTables::new(TableScope::PerMessage);
            black_box(amf3::encode_all(&nodes, &mut tables, &externals).unwrap());
        })
    });
}
