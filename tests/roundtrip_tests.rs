use chrono::{DateTime, NaiveDate, NaiveTime};
use colspec::{
    parse_schema, read_all, to_csv_string, BinaryEncoding, CsvOptions, CsvReader, CsvWriter,
    Culture, FieldValue, RecordSet, Schema,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn round_trip(options: CsvOptions, schema: &Schema, set: &mut RecordSet) -> RecordSet {
    let text = to_csv_string(set, options.clone(), Some(schema.clone())).unwrap();
    read_all(&text, options, Some(schema.clone())).unwrap()
}

fn typed_row(seed: i64) -> Vec<FieldValue> {
    let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(seed as u64);
    vec![
        FieldValue::Boolean(seed % 2 == 0),
        FieldValue::Byte((seed % 256) as u8),
        FieldValue::Char('ä'),
        FieldValue::Int16(-(seed as i16)),
        FieldValue::Int32(seed as i32 * 1000),
        FieldValue::Int64(i64::MAX - seed),
        FieldValue::Single(0.1 + seed as f32),
        FieldValue::Double(-1.0 / 3.0 * seed as f64),
        FieldValue::Decimal(Decimal::new(seed * 101, 2)),
        FieldValue::String(format!("line {}\nwith \"quotes\", commas; and \\ slashes", seed)),
        FieldValue::Binary((0..seed as u8).collect()),
        FieldValue::Date(date),
        FieldValue::Time(NaiveTime::from_hms_milli_opt(13, 5, 7, 250).unwrap()),
        FieldValue::DateTime(date.and_hms_micro_opt(23, 59, 1, 123_456).unwrap()),
        FieldValue::DateTimeOffset(
            DateTime::parse_from_rfc3339("2024-06-30T18:00:00-05:00").unwrap(),
        ),
        FieldValue::Guid(Uuid::from_u128(seed as u128 * 0x1234_5678)),
        FieldValue::Null,
    ]
}

const TYPED_SPEC: &str = "b:bool,y:Byte,c:Char,s:short,i:int,l:long,f:float,d:double,m:decimal,\
                          t:string,x:Binary,dt:Date,tm:Time,ts:DateTime,tz:DateTimeOffset,g:Guid,\
                          n:int?";

#[test]
fn test_every_type_round_trips() {
    let schema = parse_schema(TYPED_SPEC).unwrap();
    let configs = [
        CsvOptions::new(),
        CsvOptions::escaped().with_binary_encoding(BinaryEncoding::Hexadecimal),
        CsvOptions::new()
            .with_delimiter(';')
            .with_culture(Culture::from_name("it-IT").unwrap())
            .with_new_line("\r\n")
            .with_buffer_size(16),
        CsvOptions::new()
            .with_delimiter('\t')
            .with_escape('\\')
            .with_culture(Culture::from_name("fr-FR").unwrap()),
    ];
    for options in configs {
        let mut set = RecordSet::new(schema.header_names().iter().map(|s| s.to_string()).collect());
        for seed in 1..6 {
            set.push(typed_row(seed));
        }
        let back = round_trip(options.clone(), &schema, &mut set);
        assert_eq!(back.header_names(), set.header_names(), "{:?}", options);
        assert_eq!(back.rows(), set.rows(), "{:?}", options);
    }
}

#[test]
fn test_large_binary_at_small_buffer() {
    let payload: Vec<u8> = (0..6 * 1024).map(|i| (i * 7 % 256) as u8).collect();
    let schema = parse_schema("Id:int,Payload:Binary").unwrap();
    for encoding in [BinaryEncoding::Hexadecimal, BinaryEncoding::Base64] {
        let options = CsvOptions::new()
            .with_binary_encoding(encoding)
            .with_buffer_size(16);
        let mut set = RecordSet::new(vec!["Id".into(), "Payload".into()]);
        set.push(vec![1.into(), payload.clone().into()]);
        set.push(vec![2.into(), Vec::<u8>::new().into()]);

        let text = to_csv_string(&mut set, options.clone(), Some(schema.clone())).unwrap();
        assert!(!text.lines().nth(1).unwrap().contains(char::is_whitespace));

        let back = read_all(&text, options, Some(schema.clone())).unwrap();
        assert_eq!(back.rows()[0][1], FieldValue::Binary(payload.clone()));
        assert_eq!(back.rows()[1][1], FieldValue::Binary(Vec::new()));
    }
}

#[test]
fn test_ragged_rows_keep_their_lengths() {
    let text = "a,b,c\n1\n1,2\n1,2,3,4,5\n\n1,,\n";
    for options in [CsvOptions::new(), CsvOptions::escaped()] {
        let mut reader = CsvReader::new(text.as_bytes(), options.clone()).unwrap();
        let mut writer = CsvWriter::new(Vec::new(), options).unwrap();
        writer.write_all(&mut reader).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, text);
    }
}

#[test]
fn test_date_time_kinds_keep_their_instant() {
    let schema = parse_schema("naive:DateTime,offset:DateTimeOffset").unwrap();
    let offset = DateTime::parse_from_rfc3339("2024-01-15T23:30:00+05:30").unwrap();
    let naive = offset.naive_utc();
    let mut set = RecordSet::new(vec!["naive".into(), "offset".into()]);
    set.push(vec![naive.into(), offset.into()]);

    let back = round_trip(CsvOptions::new(), &schema, &mut set);
    let row = &back.rows()[0];
    assert_eq!(row[0].to_utc(), row[1].to_utc());
    assert_eq!(row[1], FieldValue::DateTimeOffset(offset));
}

#[test]
fn test_custom_formats_round_trip() {
    let schema = parse_schema("d:Date{%d.%m.%Y},ok:bool{yes|no},p:double{F3}").unwrap();
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    let mut set = RecordSet::new(vec!["d".into(), "ok".into(), "p".into()]);
    set.push(vec![date.into(), true.into(), 2.5.into()]);

    let text = to_csv_string(&mut set, CsvOptions::new(), Some(schema.clone())).unwrap();
    assert_eq!(text, "d,ok,p\n31.12.1999,yes,2.500\n");
    let back = read_all(&text, CsvOptions::new(), Some(schema)).unwrap();
    assert_eq!(back.rows(), set.rows());
}

#[test]
fn test_unrecognized_number_formats_fall_back_to_general() {
    let schema = parse_schema("p:double{\u{20ac}},q:int{\u{e9}2},r:double{F4000000000}").unwrap();
    let mut set = RecordSet::new(vec!["p".into(), "q".into(), "r".into()]);
    set.push(vec![1.5.into(), 3.into(), 2.25.into()]);

    let text = to_csv_string(&mut set, CsvOptions::new(), Some(schema.clone())).unwrap();
    assert_eq!(text, "p,q,r\n1.5,3,2.25\n");
    let back = read_all(&text, CsvOptions::new(), Some(schema)).unwrap();
    assert_eq!(back.rows(), set.rows());
}

#[test]
fn test_column_size_is_not_enforced() {
    let schema = parse_schema("s:string[3],b:Binary[2]").unwrap();
    let mut set = RecordSet::new(vec!["s".into(), "b".into()]);
    set.push(vec!["abcdef".into(), FieldValue::Binary(vec![1, 2, 3, 4])]);
    let back = round_trip(CsvOptions::new(), &schema, &mut set);
    assert_eq!(back.rows(), set.rows());
}
