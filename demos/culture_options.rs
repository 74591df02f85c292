//! Cultures, the escaped style and binary encodings.
//!
//! Run with: cargo run --example culture_options

use colspec::{
    read_all, to_csv_string, BinaryEncoding, CsvOptions, Culture, FieldValue, RecordSet,
};
use std::error::Error;

fn sample() -> RecordSet {
    let mut set = RecordSet::new(vec!["Label".into(), "Price".into(), "Blob".into()]);
    set.push(vec![
        "#1, first".into(),
        12.34.into(),
        FieldValue::Binary(b"hello".to_vec()),
    ]);
    set.push(vec!["second\nline".into(), 1234567.5.into(), FieldValue::Null]);
    set
}

fn main() -> Result<(), Box<dyn Error>> {
    let italian = Culture::from_name("it-IT").ok_or("unknown culture")?;

    // Comma decimals collide with the comma delimiter, so numbers get quoted
    println!("it-IT with ',':");
    println!("{}", to_csv_string(&mut sample(), CsvOptions::new().with_culture(italian.clone()), None)?);

    // Switching the delimiter avoids the quotes
    println!("it-IT with ';':");
    let options = CsvOptions::new().with_culture(italian).with_delimiter(';');
    println!("{}", to_csv_string(&mut sample(), options, None)?);

    // Escape characters instead of quotes; `#` lines are comments
    println!("Escaped style, hex binary:");
    let options = CsvOptions::escaped().with_binary_encoding(BinaryEncoding::Hexadecimal);
    let text = to_csv_string(&mut sample(), options.clone(), None)?;
    println!("{}", text);

    let back = read_all(&format!("# exported\n{}", text), options, None)?;
    for row in back.rows() {
        println!("{:?}", row);
    }

    Ok(())
}
