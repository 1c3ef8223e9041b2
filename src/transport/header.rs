//! The header block of a transport document.
//!
//! This is a private module. Its public items are re-exported by the parent.

use std::{fmt, str};
use std::borrow::Cow;
use encoding_rs::WINDOWS_1251;
use tracing::warn;


//------------ HeaderEncoding ------------------------------------------------

/// How header values are converted into text.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum HeaderEncoding {
    /// Use UTF-8 if the value is valid UTF-8, Windows-1251 otherwise.
    #[default]
    Auto,

    /// Always use UTF-8.
    Utf8,

    /// Always use Windows-1251.
    Windows1251,
}

impl HeaderEncoding {
    /// Decodes octets into text.
    ///
    /// Returns the text and whether it had to be decoded lossily.
    fn decode(self, octets: &[u8]) -> (Cow<str>, bool) {
        match self {
            HeaderEncoding::Auto => match str::from_utf8(octets) {
                Ok(text) => (Cow::Borrowed(text), false),
                Err(_) => {
                    let (text, lossy) = WINDOWS_1251
                        .decode_without_bom_handling(octets);
                    (text, lossy)
                }
            },
            HeaderEncoding::Utf8 => match str::from_utf8(octets) {
                Ok(text) => (Cow::Borrowed(text), false),
                Err(_) => (String::from_utf8_lossy(octets), true),
            },
            HeaderEncoding::Windows1251 => {
                WINDOWS_1251.decode_without_bom_handling(octets)
            }
        }
    }
}


//------------ Headers -------------------------------------------------------

/// The headers of a transport document.
///
/// Headers are kept in the order they first appeared in. If a key appears
/// more than once, the last value wins but the position of the first
/// occurrence is kept.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header.
    ///
    /// Surrounding whitespace is removed from the key, as it would be when
    /// parsing a header block.
    ///
    /// Returns the previous value if the key was already present.
    pub fn insert(
        &mut self, key: impl Into<String>, value: impl Into<String>
    ) -> Option<String> {
        let mut key = key.into();
        if key.trim().len() != key.len() {
            key = key.trim().to_string();
        }
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value of the header with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the keys and values in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut res = Headers::new();
        for (key, value) in iter {
            res.insert(key, value);
        }
        res
    }
}


//------------ HeaderWarning -------------------------------------------------

/// A problem with a single header line.
///
/// Header problems never fail a document. They are collected and logged
/// instead.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HeaderWarning {
    /// The key of the header, decoded lossily if necessary.
    pub key: String,

    /// The number of the line within the header block, starting at 1.
    pub line: usize,

    /// What was wrong.
    pub kind: WarningKind,
}

impl fmt::Display for HeaderWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "header {} in line {}: {}", self.key, self.line, self.kind)
    }
}

/// The kind of a header problem.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WarningKind {
    /// The text couldn’t be decoded and was replaced lossily.
    InvalidEncoding,

    /// The line has no separator. It was kept with an empty value.
    MissingSeparator,

    /// The key appeared before. The earlier value was replaced.
    DuplicateKey,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            WarningKind::InvalidEncoding => "value decoded lossily",
            WarningKind::MissingSeparator => "missing separator",
            WarningKind::DuplicateKey => "duplicate key",
        })
    }
}


//------------ Parsing and Composing -----------------------------------------

/// Parses a header block.
///
/// The block consists of lines `KEY=value` or `KEY: value` separated by
/// CRLF. Values may contain lone LFs, as PEM encoded certificates do. Only
/// if the block contains no CRLF at all, lines are separated by LF. The
/// block ends at the end of the data, at the first blank line, or at a NUL
/// octet.
pub(super) fn parse_block(
    block: &[u8], encoding: HeaderEncoding
) -> (Headers, Vec<HeaderWarning>) {
    let block = match block.iter().position(|&ch| ch == 0) {
        Some(end) => &block[..end],
        None => block,
    };
    let mut headers = Headers::new();
    let mut warnings = Vec::new();

    for (idx, line) in lines(block).enumerate() {
        if line.is_empty() {
            break
        }
        let mut warn_about = |key: &str, kind| {
            let warning = HeaderWarning {
                key: key.into(), line: idx + 1, kind
            };
            warn!(
                key = %warning.key, line = warning.line,
                "{}", warning.kind
            );
            warnings.push(warning);
        };

        let sep = line.iter().position(|&ch| ch == b'=' || ch == b':');
        let (raw_key, raw_value) = match sep {
            Some(pos) => {
                let value = &line[pos + 1..];
                let value = if line[pos] == b':' {
                    value.strip_prefix(b" ").unwrap_or(value)
                }
                else {
                    value
                };
                (&line[..pos], value)
            }
            None => (line, &b""[..]),
        };

        let (key, key_lossy) = encoding.decode(raw_key);
        let key = key.trim().to_string();
        let (value, value_lossy) = encoding.decode(raw_value);
        if sep.is_none() {
            warn_about(&key, WarningKind::MissingSeparator);
        }
        if key_lossy || value_lossy {
            warn_about(&key, WarningKind::InvalidEncoding);
        }
        if headers.insert(key.clone(), value.into_owned()).is_some() {
            warn_about(&key, WarningKind::DuplicateKey);
        }
    }
    (headers, warnings)
}

/// Returns the lines of a header block.
fn lines<'a>(block: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
    let crlf = block.windows(2).any(|pair| pair == b"\r\n");
    let mut rest = Some(block);
    std::iter::from_fn(move || {
        let data = rest.take()?;
        let (line, next) = if crlf {
            match data.windows(2).position(|pair| pair == b"\r\n") {
                Some(pos) => (&data[..pos], Some(&data[pos + 2..])),
                None => (data, None),
            }
        }
        else {
            match data.iter().position(|&ch| ch == b'\n') {
                Some(pos) => {
                    let line = &data[..pos];
                    (line.strip_suffix(b"\r").unwrap_or(line),
                     Some(&data[pos + 1..]))
                }
                None => (data.strip_suffix(b"\r").unwrap_or(data), None),
            }
        };
        rest = next;
        Some(line)
    })
}

/// Composes a header block with values in Windows-1251.
///
/// Characters that don’t exist in Windows-1251 are written as numeric
/// character references. Carriage returns and NUL characters can’t be
/// represented in a header block and are dropped. The block is terminated
/// by a NUL octet.
pub(super) fn compose_block(headers: &Headers) -> Vec<u8> {
    let mut res = Vec::new();
    for (key, value) in headers.iter() {
        let key = writable(key);
        let value = writable(value);
        let (key, _, _) = WINDOWS_1251.encode(&key);
        let (value, _, _) = WINDOWS_1251.encode(&value);
        res.extend_from_slice(&key);
        res.push(b'=');
        res.extend_from_slice(&value);
        res.extend_from_slice(b"\r\n");
    }
    res.push(0);
    res
}

/// Removes the characters that would end a line or the block.
fn writable(text: &str) -> Cow<str> {
    if text.contains(['\r', '\0']) {
        Cow::Owned(text.replace(['\r', '\0'], ""))
    }
    else {
        Cow::Borrowed(text)
    }
}


//============ Tests =========================================================
