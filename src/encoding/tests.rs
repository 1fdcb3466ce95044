use super::*;
use crate::dataset::{BuilderOptions, Column, ColumnBuilder, CompressionType, Value};

fn int_column(values: &[i64]) -> Column {
    let mut builder = ColumnBuilder::new("", BuilderOptions::int64(1024)).unwrap();
    for (row, v) in values.iter().enumerate() {
        builder.append(row, Value::Int64(*v)).unwrap();
    }
    builder.flush().unwrap()
}

fn label_column(name: &str, values: &[&str]) -> Column {
    let options = BuilderOptions::string(1024, CompressionType::default());
    let mut builder = ColumnBuilder::new(name, options).unwrap();
    for (row, v) in values.iter().enumerate() {
        builder.append(row, Value::from(*v)).unwrap();
    }
    builder.flush().unwrap()
}

fn write_column(
    section: &mut StreamsEncoder<'_>,
    column_type: ColumnType,
    column: Column,
) -> Result<(), EncodingError> {
    let mut enc = section.open_column(column_type, &column.info)?;
    for page in column.pages {
        enc.append_page(page)?;
    }
    enc.commit()
}

#[test]
fn test_commit_makes_section_visible() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    write_column(&mut section, ColumnType::StreamId, int_column(&[1, 2])).unwrap();
    write_column(&mut section, ColumnType::Label, label_column("app", &["a", "b"])).unwrap();
    assert_eq!(section.columns(), 2);
    section.commit().unwrap();

    let sections = encoder.sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].kind, SectionKind::Streams);
    assert_eq!(sections[0].rows(), 2);
    assert_eq!(sections[0].columns[1].column_type, ColumnType::Label);
    assert_eq!(sections[0].columns[1].info.name, "app");
}

#[test]
fn test_dropped_section_is_discarded() {
    let mut encoder = Encoder::new();
    {
        let mut section = encoder.open_streams().unwrap();
        write_column(&mut section, ColumnType::StreamId, int_column(&[1])).unwrap();
    }
    assert!(encoder.sections().is_empty());

    let section = encoder.open_streams().unwrap();
    section.discard();
    assert!(encoder.sections().is_empty());
}

#[test]
fn test_dropped_column_is_not_added() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    let column = int_column(&[1, 2, 3]);
    {
        let mut enc = section.open_column(ColumnType::Rows, &column.info).unwrap();
        for page in column.pages {
            enc.append_page(page).unwrap();
        }
    }
    assert_eq!(section.columns(), 0);
    section.commit().unwrap();
    assert_eq!(encoder.sections()[0].columns.len(), 0);
}

#[test]
fn test_column_row_count_must_match_info() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    let column = int_column(&[1, 2, 3]);

    // Commit without any pages
    let enc = section.open_column(ColumnType::Rows, &column.info).unwrap();
    let err = enc.commit().unwrap_err();
    assert!(matches!(
        err,
        EncodingError::RowCountMismatch {
            expected: 3,
            actual: 0,
            ..
        }
    ));
    assert_eq!(section.columns(), 0);
}

#[test]
fn test_page_mismatch_rejected() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    let ints = int_column(&[1]);
    let labels = label_column("app", &["a"]);

    let mut enc = section.open_column(ColumnType::Label, &labels.info).unwrap();
    let err = enc.append_page(ints.pages[0].clone()).unwrap_err();
    assert!(matches!(err, EncodingError::PageMismatch { .. }));
}

#[test]
fn test_misaligned_columns_fail_commit() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    write_column(&mut section, ColumnType::StreamId, int_column(&[1, 2])).unwrap();
    write_column(&mut section, ColumnType::Label, label_column("app", &["a"])).unwrap();

    let err = section.commit().unwrap_err();
    assert!(matches!(
        err,
        EncodingError::MisalignedColumns {
            expected: 2,
            actual: 1,
            ..
        }
    ));
    assert!(encoder.sections().is_empty());
}

#[test]
fn test_column_limit() {
    let mut encoder = Encoder::with_config(EncoderConfig::default().max_section_columns(1));
    let mut section = encoder.open_streams().unwrap();
    write_column(&mut section, ColumnType::StreamId, int_column(&[1])).unwrap();

    let err = write_column(&mut section, ColumnType::Rows, int_column(&[1])).unwrap_err();
    assert!(matches!(err, EncodingError::TooManyColumns { limit: 1 }));
}

#[test]
fn test_section_limit() {
    let mut encoder = Encoder::with_config(EncoderConfig::default().max_sections(1));
    encoder.open_streams().unwrap().commit().unwrap();

    let err = encoder.open_streams().unwrap_err();
    assert!(matches!(err, EncodingError::TooManySections { limit: 1 }));
}

#[test]
fn test_section_byte_limit() {
    let mut encoder = Encoder::with_config(EncoderConfig::default().max_section_bytes(4));
    let mut section = encoder.open_streams().unwrap();

    let err = write_column(&mut section, ColumnType::Label, label_column("app", &["abcdefgh"]))
        .unwrap_err();
    assert!(matches!(err, EncodingError::SectionTooLarge { limit: 4, .. }));
}

#[test]
fn test_flush_layout_and_page_offsets() {
    let mut encoder = Encoder::new();
    for ids in [[1i64, 2], [3, 4]] {
        let mut section = encoder.open_streams().unwrap();
        write_column(&mut section, ColumnType::StreamId, int_column(&ids)).unwrap();
        write_column(&mut section, ColumnType::Label, label_column("app", &["x", "y"])).unwrap();
        section.commit().unwrap();
    }

    let mut object = Vec::new();
    let written = encoder.flush(&mut object).unwrap();
    assert_eq!(written as usize, object.len());
    assert!(object.starts_with(MAGIC));
    assert!(object.ends_with(MAGIC));
    assert!(encoder.sections().is_empty());

    let metadata = FileMetadata::read_from(&object).unwrap();
    assert_eq!(metadata.format_version, FORMAT_VERSION);
    assert_eq!(metadata.sections.len(), 2);

    let second_ids = &metadata.sections[1].columns[0];
    let values: Vec<Value> = second_ids
        .read_pages(&object)
        .unwrap()
        .iter()
        .flat_map(|p| p.decode().unwrap())
        .collect();
    assert_eq!(values, vec![Value::Int64(3), Value::Int64(4)]);

    let labels = &metadata.sections[0].columns[1];
    let values: Vec<Value> = labels
        .read_pages(&object)
        .unwrap()
        .iter()
        .flat_map(|p| p.decode().unwrap())
        .collect();
    assert_eq!(values, vec![Value::from("x"), Value::from("y")]);
}

#[test]
fn test_read_from_rejects_garbage() {
    assert!(matches!(
        FileMetadata::read_from(b"DOBJ"),
        Err(EncodingError::InvalidFile(_))
    ));
    assert!(matches!(
        FileMetadata::read_from(b"XXXXxxxxxxxxXXXX"),
        Err(EncodingError::InvalidFile(_))
    ));
}

#[test]
fn test_read_pages_rejects_out_of_bounds_offsets() {
    let mut encoder = Encoder::new();
    let mut section = encoder.open_streams().unwrap();
    write_column(&mut section, ColumnType::StreamId, int_column(&[1, 2])).unwrap();
    section.commit().unwrap();

    let mut object = Vec::new();
    encoder.flush(&mut object).unwrap();
    let metadata = FileMetadata::read_from(&object).unwrap();
    let column = &metadata.sections[0].columns[0];
    assert!(column.read_pages(&object).is_ok());

    for offset in [u64::MAX, object.len() as u64] {
        let mut crafted = column.clone();
        crafted.pages[0].offset = offset;
        assert!(matches!(
            crafted.read_pages(&object),
            Err(EncodingError::InvalidFile(_))
        ));
    }

    let mut crafted = column.clone();
    crafted.pages[0].info.compressed_size = usize::MAX;
    assert!(matches!(
        crafted.read_pages(&object),
        Err(EncodingError::InvalidFile(_))
    ));
}
