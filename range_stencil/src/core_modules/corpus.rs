// THEORY:
// The corpus loader turns sample files into in-memory vectors before any parallel work
// starts. Files are streams of numbers separated by whitespace: `x,y` pairs for
// regression corpora, plain integers for the prime filter. Reading stops at the first
// position where the next record does not parse, keeping everything read before it.
//
// A missing or unreadable file is not an error at this layer. It is logged and counts
// as zero records; the orchestrator decides whether an all-empty corpus is fatal.
// Several sources load concurrently on the tokio runtime and come back in the order
// they were requested.

use crate::core_modules::series::Point;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Records loaded from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub path: PathBuf,
    pub records: usize,
}

/// Samples gathered from every source, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus<T> {
    pub samples: Vec<T>,
    pub sources: Vec<SourceCount>,
}

impl<T> Corpus<T> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Human-readable list of the sources, used in `EmptyInput` diagnostics.
    pub fn describe_sources(&self) -> String {
        self.sources
            .iter()
            .map(|source| source.path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parses `x,y` pairs. Whitespace may precede either number, but the comma must follow
/// `x` directly; `1.0, 2.0` is a pair, `1.0 ,2.0` ends the stream. Characters after `y`
/// that do not start another pair also end it, so `1,2,3` yields one point.
pub fn parse_points(text: &str) -> Vec<Point> {
    let mut scanner = Scanner::new(text);
    let mut points = Vec::new();
    while let Some(point) = scanner.point() {
        points.push(point);
    }
    points
}

/// Parses whitespace-separated integers. A token such as `12abc` contributes `12` and
/// ends the stream.
pub fn parse_integers(text: &str) -> Vec<i64> {
    let mut scanner = Scanner::new(text);
    let mut integers = Vec::new();
    while let Some(value) = scanner.integer() {
        integers.push(value);
    }
    integers
}

/// Forward-only number reader over a corpus file. Each read skips leading whitespace,
/// consumes the longest numeric prefix, and leaves the cursor untouched on failure.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn point(&mut self) -> Option<Point> {
        let start = self.pos;
        let parsed = self.pair();
        if parsed.is_none() {
            self.pos = start;
        }
        parsed
    }

    fn pair(&mut self) -> Option<Point> {
        let x = self.float()?;
        self.literal(b',')?;
        let y = self.float()?;
        Some(Point::new(x, y))
    }

    fn integer(&mut self) -> Option<i64> {
        self.skip_whitespace();
        let start = self.pos;
        let mut end = self.sign(start);
        end = self.digits(end)?;
        let value = i64::from_str(&self.text[start..end]).ok()?;
        self.pos = end;
        Some(value)
    }

    fn float(&mut self) -> Option<f64> {
        self.skip_whitespace();
        let start = self.pos;
        let mut end = self.sign(start);
        let whole = self.digits(end);
        end = whole.unwrap_or(end);
        let mut fraction = None;
        if self.byte(end) == Some(b'.') {
            fraction = self.digits(end + 1);
            end = fraction.unwrap_or(end + 1);
        }
        if whole.is_none() && fraction.is_none() {
            return None;
        }
        if matches!(self.byte(end), Some(b'e' | b'E')) {
            let exponent = self.sign(end + 1);
            if let Some(after) = self.digits(exponent) {
                end = after;
            }
        }
        let value = f64::from_str(&self.text[start..end]).ok()?;
        self.pos = end;
        Some(value)
    }

    fn literal(&mut self, expected: u8) -> Option<()> {
        (self.byte(self.pos) == Some(expected)).then(|| self.pos += 1)
    }

    fn skip_whitespace(&mut self) {
        while self.byte(self.pos).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn sign(&self, at: usize) -> usize {
        match self.byte(at) {
            Some(b'+' | b'-') => at + 1,
            _ => at,
        }
    }

    /// End of the digit run starting at `at`, or `None` if there is none.
    fn digits(&self, at: usize) -> Option<usize> {
        let mut end = at;
        while self.byte(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        (end > at).then_some(end)
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.text.as_bytes().get(at).copied()
    }
}

async fn read_source(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not open corpus file; treating it as empty");
            None
        }
    }
}

/// Loads `x,y` pairs from one file. Missing files yield no points.
pub async fn load_points(path: impl AsRef<Path>) -> Vec<Point> {
    let path = path.as_ref();
    let points = read_source(path).await.map(|t| parse_points(&t)).unwrap_or_default();
    debug!(path = %path.display(), records = points.len(), "loaded points");
    points
}

/// Loads integers from one file. Missing files yield no integers.
pub async fn load_integers(path: impl AsRef<Path>) -> Vec<i64> {
    let path = path.as_ref();
    let integers = read_source(path).await.map(|t| parse_integers(&t)).unwrap_or_default();
    debug!(path = %path.display(), records = integers.len(), "loaded integers");
    integers
}

pub async fn load_all_points<P: AsRef<Path>>(paths: &[P]) -> Corpus<Point> {
    let loaded = join_all(paths.iter().map(|path| load_points(path.as_ref()))).await;
    assemble(paths, loaded)
}

pub async fn load_all_integers<P: AsRef<Path>>(paths: &[P]) -> Corpus<i64> {
    let loaded = join_all(paths.iter().map(|path| load_integers(path.as_ref()))).await;
    assemble(paths, loaded)
}

fn assemble<T, P: AsRef<Path>>(paths: &[P], loaded: Vec<Vec<T>>) -> Corpus<T> {
    let mut samples = Vec::with_capacity(loaded.iter().map(Vec::len).sum());
    let mut sources = Vec::with_capacity(paths.len());
    for (path, records) in paths.iter().zip(loaded) {
        sources.push(SourceCount {
            path: path.as_ref().to_path_buf(),
            records: records.len(),
        });
        samples.extend(records);
    }
    Corpus { samples, sources }
}
