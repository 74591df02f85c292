use colspec::{
    parse_schema, read_all, schema_to_string, to_csv_string, BinaryEncoding, CsvOptions,
    FieldValue, RecordSet,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;

const SPEC: &str = "Id:int,Name:string[64],Email:string?,Balance:decimal{N2},Active:bool,\
                    Created:DateTime,Avatar:Binary?,{Date}>Sales*:double?";

fn sample(rows: usize) -> RecordSet {
    let mut set = RecordSet::new(
        ["Id", "Name", "Email", "Balance", "Active", "Created", "Avatar", "2024-01-01"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    let created = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    for i in 0..rows {
        set.push(vec![
            FieldValue::Int32(i as i32),
            FieldValue::String(format!("User, {}", i)),
            FieldValue::from(format!("user{}@example.com", i)),
            FieldValue::Decimal(Decimal::new(i as i64 * 12345, 2)),
            FieldValue::Boolean(i % 3 == 0),
            FieldValue::DateTime(created),
            FieldValue::Binary(vec![i as u8; 48]),
            FieldValue::Double(i as f64 * 0.5),
        ]);
    }
    set
}

fn benchmark_schema_spec(c: &mut Criterion) {
    c.bench_function("parse_schema", |b| b.iter(|| parse_schema(black_box(SPEC))));

    let schema = parse_schema(SPEC).unwrap();
    c.bench_function("serialize_schema", |b| {
        b.iter(|| schema_to_string(black_box(&schema), false))
    });
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    let schema = parse_schema(SPEC).unwrap();

    for rows in [10, 100, 1000].iter() {
        let set = sample(*rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &set, |b, set| {
            b.iter(|| {
                let mut set = set.clone();
                to_csv_string(&mut set, CsvOptions::new(), Some(schema.clone()))
            })
        });
    }

    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    let schema = parse_schema(SPEC).unwrap();

    for buffer_size in [64, 4096, 0x4000].iter() {
        let options = CsvOptions::new().with_buffer_size(*buffer_size);
        let text = to_csv_string(&mut sample(1000), options.clone(), Some(schema.clone())).unwrap();
        group.bench_with_input(BenchmarkId::new("buffer", buffer_size), &text, |b, text| {
            b.iter(|| read_all(black_box(text), options.clone(), Some(schema.clone())))
        });
    }

    group.finish();
}

fn benchmark_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_64k");
    let schema = parse_schema("Data:Binary").unwrap();
    let payload: Vec<u8> = (0..65_536u32).map(|i| (i % 251) as u8).collect();

    for encoding in [BinaryEncoding::Base64, BinaryEncoding::Hexadecimal] {
        let options = CsvOptions::new().with_binary_encoding(encoding);
        let mut set = RecordSet::new(vec!["Data".to_string()]);
        set.push(vec![FieldValue::Binary(payload.clone())]);
        let text = to_csv_string(&mut set.clone(), options.clone(), None).unwrap();

        group.bench_function(BenchmarkId::new("encode", format!("{:?}", encoding)), |b| {
            b.iter(|| to_csv_string(&mut set.clone(), options.clone(), None))
        });
        group.bench_function(BenchmarkId::new("decode", format!("{:?}", encoding)), |b| {
            b.iter(|| read_all(black_box(&text), options.clone(), Some(schema.clone())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_schema_spec,
    benchmark_write,
    benchmark_read,
    benchmark_binary
);
criterion_main!(benches);
