//! Parsing, inspecting and re-serializing schema specs.
//!
//! Run with: cargo run --example schema_spec

use colspec::{parse_schema, schema_to_string, Column, DataType, Schema};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let spec = "Id:int,Source>Name:string[80],Amount:decimal?{N2},\
                Created:DateTime{%Y-%m-%d %H:%M},{Date}>Sales*:double?";
    let schema = parse_schema(spec)?;

    println!("Columns:");
    for (ordinal, column) in schema.iter().enumerate() {
        println!(
            "  {:>2}  {:<8} {:<15} nullable={:<5} size={:?} format={:?}",
            ordinal,
            column.header_name(),
            column.data_type().to_string(),
            column.is_nullable(),
            column.size(),
            column.format(),
        );
    }

    for group in schema.series_groups() {
        println!("\nSeries group {:?} has {} member(s)", group.key(), group.len());
        for column in group.columns() {
            println!(
                "  ordinal {:?}, key type {:?}, e.g. header {:?}",
                column.series_ordinal(),
                column.series_value_type(),
                column.series_header("2024-01-01"),
            );
        }
    }

    // Serialization is the inverse of parsing
    println!("\nSingle line:\n{}", schema_to_string(&schema, false));
    println!("\nMulti line:\n{}", schema_to_string(&schema, true));
    assert_eq!(parse_schema(&schema_to_string(&schema, true))?, schema);

    // Schemas can also be built in code
    let built = Schema::builder()
        .add(Column::builder("Id").data_type(DataType::Int64).build()?)
        .add(Column::builder("Payload").data_type(DataType::Binary).nullable(true).build()?)
        .build();
    println!("\nBuilt: {}", built);

    // Errors name the offending column
    if let Err(e) = parse_schema("Id:int,Name:varchar") {
        println!("\nRejected: {}", e);
    }

    Ok(())
}
