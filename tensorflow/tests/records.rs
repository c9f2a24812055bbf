use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use convnet_tensorflow::prelude::*;
use convnet_tensorflow::record::*;
use convnet_tensorflow::tfpb::example;

fn serialized(label: i64, boxes: usize) -> Vec<u8> {
    let coords: Vec<f32> = (0..boxes).map(|b| b as f32 / 10.0).collect();
    example()
        .bytes(IMAGE_ENCODED, format!("image {label}"))
        .int64(CLASS_LABEL, label)
        .bytes(CLASS_TEXT, format!("class {label}"))
        .int64(HEIGHT, 100 + label)
        .int64(WIDTH, 200 + label)
        .floats(BBOX_XMIN, &coords)
        .floats(BBOX_YMIN, &coords)
        .floats(BBOX_XMAX, &coords)
        .floats(BBOX_YMAX, &coords)
        .write_to_bytes()
}

fn write_file(path: &std::path::Path, count: i64) {
    let mut writer = RecordWriter::new(BufWriter::new(File::create(path).unwrap()));
    for label in 0..count {
        writer.write_record(&serialized(label, label as usize % 3)).unwrap();
    }
    writer.flush().unwrap();
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train-00000-of-01024");
    write_file(&path, 10);

    let reader = RecordReader::new(BufReader::new(File::open(&path).unwrap()));
    let records: Vec<Record> = reader.map(|bytes| decode(&bytes?)).collect::<NetResult<_>>().unwrap();
    assert_eq!(records.len(), 10);
    for (label, record) in records.iter().enumerate() {
        assert_eq!(record.label(), label as i32);
        assert_eq!(record.image(), format!("image {label}").as_bytes());
        assert_eq!(record.text(), format!("class {label}"));
        assert_eq!(record.height(), 100 + label as i64);
        assert_eq!(record.width(), 200 + label as i64);
        assert_eq!(record.boxes().len(), label % 3);
    }
}

#[test]
fn truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated");
    write_file(&path, 3);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 2);

    let results: Vec<_> = RecordReader::new(&*bytes).collect();
    assert_eq!(results.len(), 3);
    assert!(results[..2].iter().all(|r| r.is_ok()));
    let e = results[2].as_ref().unwrap_err();
    assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
}

#[test]
fn corrupted_payload() {
    let mut framed = vec![];
    {
        let mut writer = RecordWriter::new(&mut framed);
        writer.write_record(&serialized(1, 1)).unwrap();
        writer.write_record(&serialized(2, 1)).unwrap();
    }
    // last byte of the first payload
    let first = serialized(1, 1).len();
    framed[12 + first - 1] ^= 0x40;

    let mut reader = RecordReader::new(&*framed);
    let e = reader.next().unwrap().unwrap_err();
    assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    assert!(reader.next().is_none());
}

#[test]
fn framed_garbage_is_not_a_record() {
    let mut framed = vec![];
    RecordWriter::new(&mut framed).write_record(b"\x0a\x05garbage").unwrap();
    let payload = RecordReader::new(&*framed).next().unwrap().unwrap();
    let e = decode(&payload).unwrap_err();
    assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
}

#[test]
fn writer_flushes_into_any_sink() {
    let mut sink = vec![];
    let mut writer = RecordWriter::new(&mut sink);
    writer.write_record(b"").unwrap();
    writer.flush().unwrap();
    writer.into_inner().flush().unwrap();
    assert_eq!(sink.len(), 16);
}
