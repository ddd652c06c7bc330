use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};

/// Open `input` for reading. `stdin` reads standard input, `.gz` files are
/// decompressed on the fly.
///
/// ```
/// use std::io::Write;
/// let dir = tempfile::TempDir::new().unwrap();
/// let path = dir.path().join("list.txt");
/// std::fs::File::create(&path).unwrap().write_all(b"a\nb\nc\n").unwrap();
///
/// let reader = slink::reader(path.to_str().unwrap()).unwrap();
/// assert_eq!(std::io::BufRead::lines(reader).count(), 3);
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Open `output` for writing. `stdout` writes to the screen.
pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

/// Read the whole input into a string.
pub fn read_to_string(input: &str) -> anyhow::Result<String> {
    let mut content = String::new();
    reader(input)?
        .read_to_string(&mut content)
        .with_context(|| format!("could not read {}", input))?;
    Ok(content)
}

/// First column of every non-empty, non-comment line.
pub fn read_first_column(input: &str) -> anyhow::Result<Vec<String>> {
    let mut names = vec![];
    for line in reader(input)?.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(first) = line.split('\t').next() {
            names.push(first.trim().to_string());
        }
    }
    Ok(names)
}
