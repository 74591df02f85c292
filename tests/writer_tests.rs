use chrono::{DateTime, NaiveDate};
use colspec::{
    parse_schema, to_csv_string, BinaryEncoding, CsvOptions, CsvReader, CsvWriter, Culture,
    Error, FieldValue, RecordSet,
};
use rust_decimal::Decimal;
use std::io::{self, Write};
use uuid::Uuid;

fn render(options: CsvOptions, headers: &[&str], rows: Vec<Vec<FieldValue>>) -> String {
    let mut set = RecordSet::new(headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        set.push(row);
    }
    to_csv_string(&mut set, options, None).unwrap()
}

/// Counts write calls to observe buffering.
struct Counting {
    out: Vec<u8>,
    writes: usize,
}

impl Write for Counting {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_quoting_examples() {
    let out = render(
        CsvOptions::new(),
        &["Text"],
        vec![vec!["Test, 1".into()], vec!["\"test2\"".into()], vec!["plain".into()]],
    );
    assert_eq!(out, "Text\n\"Test, 1\"\n\"\"\"test2\"\"\"\nplain\n");
}

#[test]
fn test_escaped_comment_marker() {
    let out = render(
        CsvOptions::escaped(),
        &["Text"],
        vec![vec!["#Comment".into()], vec!["a,b\nc".into()]],
    );
    assert_eq!(out, "Text\n\\#Comment\na\\,b\\\nc\n");
}

#[test]
fn test_comment_marker_is_quoted_in_standard_style() {
    let out = render(
        CsvOptions::new().with_comment(Some('#')),
        &[],
        vec![vec!["#x".into(), "#y".into()]],
    );
    assert_eq!(out, "\"#x\",#y\n");
}

#[test]
fn test_italian_culture() {
    let italian = Culture::from_name("it-IT").unwrap();
    let row = || vec![vec![FieldValue::Double(12.34)]];

    let comma = render(CsvOptions::new().with_culture(italian.clone()), &["V"], row());
    assert_eq!(comma, "V\n\"12,34\"\n");

    let semicolon = render(
        CsvOptions::new().with_culture(italian).with_delimiter(';'),
        &["V"],
        row(),
    );
    assert_eq!(semicolon, "V\n12,34\n");
}

#[test]
fn test_grouped_number_format() {
    let schema = parse_schema("Total:decimal{N2}").unwrap();
    let mut set = RecordSet::new(Vec::new());
    set.push(vec![Decimal::new(123456789, 2).into()]);
    let options = CsvOptions::new()
        .with_delimiter(';')
        .with_culture(Culture::from_name("de-DE").unwrap());
    let out = to_csv_string(&mut set, options, Some(schema)).unwrap();
    assert_eq!(out, "Total\n1.234.567,89\n");
}

#[test]
fn test_header_suppressed_and_crlf() {
    let out = render(
        CsvOptions::new().with_write_header(false).with_new_line("\r\n"),
        &["a", "b"],
        vec![vec![1.into(), FieldValue::Null], vec![]],
    );
    assert_eq!(out, "1,\r\n\r\n");
}

#[test]
fn test_typed_literals() {
    let guid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    let offset = DateTime::parse_from_rfc3339("2024-03-01T10:00:00.250+02:00").unwrap();
    let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let out = render(
        CsvOptions::new().with_write_header(false),
        &[],
        vec![vec![
            guid.into(),
            offset.into(),
            naive.into(),
            naive.date().into(),
            'c'.into(),
            (-7i16).into(),
            f64::NAN.into(),
        ]],
    );
    assert_eq!(
        out,
        "67e55044-10b1-426f-9247-bb680e5fe0c8,2024-03-01T10:00:00.250+02:00,2024-03-01T10:00:00,2024-03-01,c,-7,NaN\n"
    );
}

#[test]
fn test_binary_encodings() {
    let bytes = vec![0u8, 1, 2, 0xfe, 0xff];
    let hex = render(
        CsvOptions::new()
            .with_write_header(false)
            .with_binary_encoding(BinaryEncoding::Hexadecimal),
        &[],
        vec![vec![bytes.clone().into()]],
    );
    assert_eq!(hex, "000102feff\n");

    let base64 = render(
        CsvOptions::new().with_write_header(false),
        &[],
        vec![vec![bytes.into()]],
    );
    assert_eq!(base64, "AAEC/v8=\n");
}

#[test]
fn test_output_is_buffered() {
    let sink = Counting {
        out: Vec::new(),
        writes: 0,
    };
    let mut writer = CsvWriter::new(sink, CsvOptions::new().with_buffer_size(32)).unwrap();
    for i in 0..20 {
        writer.write_record(&[i.into(), "row".into()]).unwrap();
    }
    let sink = writer.into_inner().unwrap();
    assert!(sink.writes > 1);
    assert!(sink.writes < 20);
    assert!(String::from_utf8(sink.out).unwrap().starts_with("0,row\n1,row\n"));
}

#[test]
fn test_schema_header_with_series() {
    let schema = parse_schema("Id:int,date>jan*:int,date>feb*:int").unwrap();
    let mut writer = CsvWriter::with_schema(Vec::new(), CsvOptions::new(), schema).unwrap();
    writer.write_schema_header().unwrap();
    writer.write_record(&[1.into(), 10.into(), 20.into()]).unwrap();
    assert!(matches!(writer.write_schema_header(), Err(Error::InvalidState(_))));
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(out, "Id,jan,feb\n1,10,20\n");
}

#[test]
fn test_formats_follow_header_order() {
    let schema = parse_schema("d:Date{%d.%m.%Y},p:double{F3}").unwrap();
    let input = "p,d\n2.500,31.12.1999\n";
    let mut reader =
        CsvReader::with_schema(input.as_bytes(), CsvOptions::new(), schema.clone()).unwrap();
    let mut writer = CsvWriter::with_schema(Vec::new(), CsvOptions::new(), schema).unwrap();
    assert_eq!(writer.write_all(&mut reader).unwrap(), 1);
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(out, input);
}

#[test]
fn test_formats_bind_without_writing_a_header() {
    let schema = parse_schema("d:Date{%d.%m.%Y},p:double{F3}").unwrap();
    let mut set = RecordSet::new(vec!["p".into(), "d".into()]);
    set.push(vec![2.5.into(), NaiveDate::from_ymd_opt(1999, 12, 31).unwrap().into()]);
    let options = CsvOptions::new().with_write_header(false);
    let out = to_csv_string(&mut set, options, Some(schema)).unwrap();
    assert_eq!(out, "2.500,31.12.1999\n");
}
