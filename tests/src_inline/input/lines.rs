use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_file_is_open_error() {
    let dir = tempdir().expect("tempdir");
    let err = LineSource::open(&dir.path().join("nope.txt")).err().expect("error");
    assert!(matches!(err, InputError::Open { .. }));
}

#[test]
fn reports_total_bytes_and_strips_terminators() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("in.txt");
    fs::write(&path, "1 2 3 4\r\nab\n\nlast").expect("write");

    let source = LineSource::open(&path).expect("open");
    assert_eq!(source.total_bytes(), 17);
    let lines: Vec<Line> = source.map(|l| l.expect("line")).collect();
    assert_eq!(
        lines,
        vec![
            Line { text: "1 2 3 4".to_string(), bytes: 7 },
            Line { text: "ab".to_string(), bytes: 2 },
            Line { text: String::new(), bytes: 0 },
            Line { text: "last".to_string(), bytes: 4 },
        ]
    );
}

#[test]
fn chunks_are_bounded_and_numbered() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("in.txt");
    fs::write(&path, "a\nbb\nccc\ndddd\neeeee\n").expect("write");

    let mut source = LineSource::open(&path).expect("open");
    let first = source.next_chunk(2).expect("read").expect("chunk");
    assert_eq!(first.first_line, 1);
    assert_eq!(first.lines, vec!["a", "bb"]);
    assert_eq!(first.last_line_bytes, 2);

    let second = source.next_chunk(2).expect("read").expect("chunk");
    assert_eq!(second.first_line, 3);
    assert_eq!(second.last_line_bytes, 4);

    let third = source.next_chunk(2).expect("read").expect("chunk");
    assert_eq!(third.lines, vec!["eeeee"]);
    assert_eq!(third.first_line, 5);

    assert!(source.next_chunk(2).expect("read").is_none());
    assert_eq!(source.lines_read(), 5);
}

#[test]
fn empty_file_has_no_chunks() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.txt");
    fs::write(&path, "").expect("write");
    let mut source = LineSource::open(&path).expect("open");
    assert_eq!(source.total_bytes(), 0);
    assert!(source.next_chunk(512).expect("read").is_none());
}

#[cfg(feature = "gz")]
#[test]
fn reads_gzip_input() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("in.txt.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(b"1 2 3 4\n5 6 7 8\n").expect("encode");
    fs::write(&path, enc.finish().expect("finish")).expect("write");

    let source = LineSource::open(&path).expect("open");
    let texts: Vec<String> = source.map(|l| l.expect("line").text).collect();
    assert_eq!(texts, vec!["1 2 3 4", "5 6 7 8"]);
}
