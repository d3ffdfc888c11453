use criterion::{black_box, criterion_group, criterion_main, Criterion};
use seastore::cipher;
use seastore::codec;
use seastore::record::{Record, Value};
use seastore::store::{Store, StoreConfig};
use tempfile::TempDir;

fn sample_text(records: usize) -> String {
    (0..records)
        .map(|i| {
            format!(
                "id=b{i};title=Book number {i};pages={};status=available",
                100 + i
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_entropy_codec(c: &mut Criterion) {
    let text = sample_text(200);
    let encoded = codec::encode(&text).unwrap();

    c.bench_function("fano_encode_200_records", |b| {
        b.iter(|| codec::encode(black_box(&text)).unwrap())
    });
    c.bench_function("fano_decode_200_records", |b| {
        b.iter(|| codec::decode(black_box(&encoded.bits), &encoded.table).unwrap())
    });
}

fn bench_cipher(c: &mut Criterion) {
    let payload = "01101".repeat(2000);
    let key = "BENCHKEY12345678";

    c.bench_function("cipher_encrypt_10k", |b| {
        b.iter(|| cipher::encrypt(black_box(&payload), key).unwrap())
    });
}

fn bench_store_roundtrip(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(StoreConfig::new(dir.path()).with_master_key("BENCHMASTER")).unwrap();

    let records: Vec<Record> = (0..50)
        .map(|i| {
            let mut rec = Record::new();
            rec.insert("id".into(), Value::Text(format!("b{i}")));
            rec.insert("title".into(), Value::Text(format!("Book number {i}")));
            rec.insert("pages".into(), Value::Number(100.0 + i as f64));
            rec
        })
        .collect();

    c.bench_function("store_save_load_50_records", |b| {
        b.iter(|| {
            store.save("bench", black_box(&records)).unwrap();
            store.load("bench").unwrap()
        })
    });
}

criterion_group!(benches, bench_entropy_codec, bench_cipher, bench_store_roundtrip);
criterion_main!(benches);
