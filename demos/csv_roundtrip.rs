//! Typed reading and writing with a schema.
//!
//! Run with: cargo run --example csv_roundtrip

use chrono::NaiveDate;
use colspec::{parse_schema, CsvOptions, CsvReader, CsvWriter, FieldValue};
use rust_decimal::Decimal;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let schema = parse_schema("Id:int,Customer,Total:decimal{F2},Shipped:Date?,Notes:string?")?;

    let mut writer = CsvWriter::with_schema(Vec::new(), CsvOptions::new(), schema.clone())?;
    writer.write_schema_header()?;
    writer.write_record(&[
        1.into(),
        "Smith, J".into(),
        Decimal::new(12999, 2).into(),
        NaiveDate::from_ymd_opt(2024, 5, 17).map(FieldValue::from).unwrap_or_default(),
        "said \"leave at door\"".into(),
    ])?;
    writer.write_record(&[
        2.into(),
        "Jones".into(),
        Decimal::new(500, 0).into(),
        FieldValue::Null,
    ])?;
    let csv = String::from_utf8(writer.into_inner()?)?;
    println!("Written:\n{}", csv);

    let mut reader = CsvReader::with_schema(csv.as_bytes(), CsvOptions::new(), schema)?;
    println!("Headers: {:?}", reader.headers());
    while reader.read()? {
        println!("Row {}:", reader.row_number());
        for (ordinal, value) in reader.values()?.iter().enumerate() {
            println!("  {} = {:?}", ordinal, value);
        }
        // Short rows read missing fields as null
        println!("  notes null? {}", reader.is_null(4)?);
    }

    // Malformed fields are reported per field; the reader keeps going
    let bad = "Id,Customer\nx,Ann\n2,Bob\n";
    let mut reader = CsvReader::with_schema(
        bad.as_bytes(),
        CsvOptions::new(),
        parse_schema("Id:int,Customer")?,
    )?;
    while reader.read()? {
        match reader.get_i32(0) {
            Ok(id) => println!("id {}", id),
            Err(e) => println!("skipped: {}", e),
        }
    }

    Ok(())
}
