use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
///
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match Path::new(input_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not; "stdout" is allowed
///
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    let file = File::create(output_file)?;
    match Path::new(output_file).extension().and_then(|x| x.to_str()) {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Read non-empty, non-comment lines and split them into words
///
/// * `input_file` - file name--either gzipped or not
/// * lines starting with `#` or `%` are skipped
///
pub fn read_lines_of_words(input_file: &str) -> anyhow::Result<Vec<Vec<Box<str>>>> {
    let buf = open_buf_reader(input_file)?;
    let mut lines = vec![];
    for line in buf.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        lines.push(
            line.split_whitespace()
                .map(|x| x.to_owned().into_boxed_str())
                .collect(),
        );
    }
    Ok(lines)
}

///
/// Write each item on its own line
///
/// * `lines` - anything printable
/// * `output_file` - file name--either gzipped or not
///
pub fn write_types<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        writeln!(buf, "{}", line)?;
    }
    buf.flush()?;
    Ok(())
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

///
/// File name without directories or any extension
/// * `file` - e.g. `dir/cascade_1.txt.gz` gives `cascade_1`
///
pub fn basename(file: &str) -> anyhow::Result<Box<str>> {
    let name = Path::new(file)
        .file_name()
        .and_then(|x| x.to_str())
        .ok_or_else(|| anyhow::anyhow!("no file name in {}", file))?;
    match name.split('.').next() {
        Some(base) if !base.is_empty() => Ok(base.into()),
        _ => Err(anyhow::anyhow!("no file stem in {}", file)),
    }
}

/// Parse a word, attaching the offending text to the error
pub fn parse_word<T>(word: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    word.parse::<T>()
        .map_err(|e| anyhow::anyhow!("failed to parse '{}': {}", word, e))
}
