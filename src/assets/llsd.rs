//! Structured-data (LLSD) XML codec
//!
//! Pose files are a plain concatenation of `<llsd>` documents, one record per
//! document:
//!
//! ```xml
//! <?xml version="1.0" ?>
//! <llsd>
//!   <map>
//!     <key>type</key>
//!     <integer>1</integer>
//!   </map>
//! </llsd>
//! ```
//!
//! [`LlsdReader`] walks such a stream one document at a time. A document cut
//! off by the end of the input is treated as the end of the stream, not as an
//! error; anything else that is not well-formed is a parse error.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::errors::{PoseError, Result};

/// A structured-data value.
///
/// Maps are ordered by key, which keeps serialization deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LlsdValue {
    #[default]
    Undefined,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(Vec<LlsdValue>),
    Map(BTreeMap<String, LlsdValue>),
}

impl LlsdValue {
    #[must_use]
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Inserts into a map value. No-op on other variants.
    pub fn insert(&mut self, key: &str, value: impl Into<LlsdValue>) {
        if let Self::Map(map) = self {
            map.insert(key.to_string(), value.into());
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LlsdValue> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, LlsdValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[LlsdValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers and booleans widen to reals.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(*i as f64),
            Self::Boolean(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Integer view; reals truncate towards zero.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Real(r) => Some(*r as i64),
            Self::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl From<bool> for LlsdValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for LlsdValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for LlsdValue {
    fn from(value: f32) -> Self {
        Self::Real(f64::from(value))
    }
}

impl From<f64> for LlsdValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for LlsdValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LlsdValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<LlsdValue>> for LlsdValue {
    fn from(value: Vec<LlsdValue>) -> Self {
        Self::Array(value)
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Appends one complete `<llsd>` document holding `value` to `out`.
pub fn write_document(out: &mut Vec<u8>, value: &LlsdValue) -> Result<()> {
    let mut writer = Writer::new_with_indent(&mut *out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(BytesStart::new("llsd")))?;
    write_value(&mut writer, value)?;
    writer.write_event(Event::End(BytesEnd::new("llsd")))?;
    out.push(b'\n');
    Ok(())
}

/// Serializes `records` as consecutive documents.
pub fn write_stream(records: &[LlsdValue]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        write_document(&mut out, record)?;
    }
    Ok(out)
}

fn write_value<W: Write>(writer: &mut Writer<W>, value: &LlsdValue) -> Result<()> {
    match value {
        LlsdValue::Undefined => {
            writer.write_event(Event::Empty(BytesStart::new("undef")))?;
        }
        LlsdValue::Boolean(b) => write_scalar(writer, "boolean", if *b { "1" } else { "0" })?,
        LlsdValue::Integer(i) => write_scalar(writer, "integer", &i.to_string())?,
        LlsdValue::Real(r) => write_scalar(writer, "real", &r.to_string())?,
        LlsdValue::String(s) => write_scalar(writer, "string", s)?,
        LlsdValue::Array(items) => {
            writer.write_event(Event::Start(BytesStart::new("array")))?;
            for item in items {
                write_value(writer, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new("array")))?;
        }
        LlsdValue::Map(map) => {
            writer.write_event(Event::Start(BytesStart::new("map")))?;
            for (key, item) in map {
                write_scalar(writer, "key", key)?;
                write_value(writer, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new("map")))?;
        }
    }
    Ok(())
}

fn write_scalar<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

enum ReadError {
    /// Input ended inside a document.
    Truncated,
    Fatal(PoseError),
}

impl From<quick_xml::Error> for ReadError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Fatal(err.into())
    }
}

impl From<PoseError> for ReadError {
    fn from(err: PoseError) -> Self {
        Self::Fatal(err)
    }
}

type ReadResult<T> = std::result::Result<T, ReadError>;

/// Pull reader over a stream of `<llsd>` documents.
pub struct LlsdReader<'a> {
    reader: Reader<&'a [u8]>,
    len: usize,
    finished: bool,
}

impl<'a> LlsdReader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            len: bytes.len(),
            finished: false,
        }
    }

    /// Returns the next document, or `None` once the stream is exhausted or
    /// the remaining input is a truncated document.
    pub fn next_document(&mut self) -> Result<Option<LlsdValue>> {
        if self.finished {
            return Ok(None);
        }
        match self.read_document() {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(ReadError::Truncated) => {
                log::debug!("Ignoring truncated trailing record");
                self.finished = true;
                Ok(None)
            }
            Err(ReadError::Fatal(err)) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Reads every remaining document.
    pub fn read_all(mut self) -> Result<Vec<LlsdValue>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_document()? {
            records.push(record);
        }
        Ok(records)
    }

    fn read_document(&mut self) -> ReadResult<Option<LlsdValue>> {
        loop {
            let event = match self.reader.read_event() {
                Ok(Event::Eof) => return Ok(None),
                Ok(event) => event,
                Err(err) => return Err(self.classify(err)),
            };

            match event {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                Event::Empty(tag) if tag.name().as_ref() == b"llsd" => {
                    return Ok(Some(LlsdValue::Undefined));
                }
                Event::Start(tag) if tag.name().as_ref() == b"llsd" => {
                    let value = match self.next_value_event()? {
                        ValueEvent::Open(name) => self.read_value(&name)?,
                        ValueEvent::Empty(name) => empty_value(&name)?,
                        ValueEvent::Close(_) => return Ok(Some(LlsdValue::Undefined)),
                    };
                    match self.next_value_event()? {
                        ValueEvent::Close(name) if name == "llsd" => return Ok(Some(value)),
                        _ => {
                            return Err(PoseError::parse("<llsd> must hold exactly one value").into());
                        }
                    }
                }
                _ => return Err(PoseError::parse("expected <llsd> document").into()),
            }
        }
    }

    fn classify(&self, err: quick_xml::Error) -> ReadError {
        if self.reader.buffer_position() as usize >= self.len {
            ReadError::Truncated
        } else {
            err.into()
        }
    }

    fn next_event(&mut self) -> ReadResult<Event<'a>> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Eof) => return Err(ReadError::Truncated),
                Ok(Event::Comment(_) | Event::PI(_)) => {}
                Ok(event) => return Ok(event),
                Err(err) => return Err(self.classify(err)),
            }
        }
    }

    fn next_value_event(&mut self) -> ReadResult<ValueEvent> {
        match self.next_event()? {
            Event::Start(tag) => Ok(ValueEvent::Open(tag_name(tag.name().as_ref())?)),
            Event::Empty(tag) => Ok(ValueEvent::Empty(tag_name(tag.name().as_ref())?)),
            Event::End(tag) => Ok(ValueEvent::Close(tag_name(tag.name().as_ref())?)),
            _ => Err(PoseError::parse("unexpected text between values").into()),
        }
    }

    /// Reads the body of an element whose start tag `name` was just consumed.
    fn read_value(&mut self, name: &str) -> ReadResult<LlsdValue> {
        match name {
            "map" => {
                let mut map = BTreeMap::new();
                loop {
                    let key = match self.next_value_event()? {
                        ValueEvent::Close(end) if end == "map" => break,
                        ValueEvent::Open(tag) if tag == "key" => self.read_text("key")?,
                        ValueEvent::Empty(tag) if tag == "key" => String::new(),
                        _ => return Err(PoseError::parse("expected <key> in <map>").into()),
                    };
                    let value = match self.next_value_event()? {
                        ValueEvent::Open(tag) => self.read_value(&tag)?,
                        ValueEvent::Empty(tag) => empty_value(&tag)?,
                        ValueEvent::Close(_) => {
                            return Err(PoseError::parse(format!("key '{key}' has no value")).into());
                        }
                    };
                    map.insert(key, value);
                }
                Ok(LlsdValue::Map(map))
            }
            "array" => {
                let mut items = Vec::new();
                loop {
                    match self.next_value_event()? {
                        ValueEvent::Close(end) if end == "array" => break,
                        ValueEvent::Open(tag) => items.push(self.read_value(&tag)?),
                        ValueEvent::Empty(tag) => items.push(empty_value(&tag)?),
                        ValueEvent::Close(_) => {
                            return Err(PoseError::parse("mismatched </array>").into());
                        }
                    }
                }
                Ok(LlsdValue::Array(items))
            }
            _ => {
                let text = self.read_text(name)?;
                Ok(scalar_value(name, &text)?)
            }
        }
    }

    fn read_text(&mut self, name: &str) -> ReadResult<String> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(chunk) => text.push_str(&chunk.unescape()?),
                Event::CData(chunk) => text.push_str(&String::from_utf8_lossy(&chunk)),
                Event::End(tag) if tag.name().as_ref() == name.as_bytes() => return Ok(text),
                _ => return Err(PoseError::parse(format!("<{name}> must hold text only")).into()),
            }
        }
    }
}

enum ValueEvent {
    Open(String),
    Empty(String),
    Close(String),
}

fn tag_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| PoseError::parse("tag name is not UTF-8"))
}

fn empty_value(name: &str) -> Result<LlsdValue> {
    match name {
        "map" => Ok(LlsdValue::map()),
        "array" => Ok(LlsdValue::Array(Vec::new())),
        _ => scalar_value(name, ""),
    }
}

fn scalar_value(name: &str, text: &str) -> Result<LlsdValue> {
    let text = text.trim();
    match name {
        "undef" => Ok(LlsdValue::Undefined),
        "boolean" => match text {
            "" | "0" | "false" => Ok(LlsdValue::Boolean(false)),
            "1" | "true" => Ok(LlsdValue::Boolean(true)),
            _ => Err(PoseError::parse(format!("invalid boolean '{text}'"))),
        },
        "integer" => {
            if text.is_empty() {
                return Ok(LlsdValue::Integer(0));
            }
            text.parse()
                .map(LlsdValue::Integer)
                .map_err(|_| PoseError::parse(format!("invalid integer '{text}'")))
        }
        "real" => {
            if text.is_empty() {
                return Ok(LlsdValue::Real(0.0));
            }
            text.parse()
                .map(LlsdValue::Real)
                .map_err(|_| PoseError::parse(format!("invalid real '{text}'")))
        }
        "string" | "uuid" | "uri" | "date" | "binary" => Ok(LlsdValue::String(text.to_string())),
        _ => Err(PoseError::parse(format!("unknown element <{name}>"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LlsdValue {
        let mut record = LlsdValue::map();
        record.insert("bone", "mHead");
        record.insert("enabled", true);
        record.insert("type", 2_i64);
        record.insert(
            "rotation",
            vec![LlsdValue::from(0.5_f64), LlsdValue::from(-0.25_f64), LlsdValue::from(1.0_f64)],
        );
        record
    }

    #[test]
    fn reads_back_consecutive_documents() {
        let records = vec![sample_record(), LlsdValue::map(), sample_record()];
        let bytes = write_stream(&records).unwrap();
        let parsed = LlsdReader::new(&bytes).read_all().unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn escapes_strings() {
        let mut record = LlsdValue::map();
        record.insert("bone", "a<b & c>");
        let bytes = write_stream(std::slice::from_ref(&record)).unwrap();
        let parsed = LlsdReader::new(&bytes).read_all().unwrap();
        assert_eq!(parsed[0].get("bone").and_then(LlsdValue::as_str), Some("a<b & c>"));
    }

    #[test]
    fn truncated_tail_ends_stream() {
        let mut bytes = write_stream(&[sample_record()]).unwrap();
        bytes.extend_from_slice(b"<?xml version=\"1.0\" ?>\n<llsd>\n  <map>\n    <key>bo");
        let parsed = LlsdReader::new(&bytes).read_all().unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn tail_cut_between_elements_ends_stream() {
        let mut bytes = write_stream(&[sample_record()]).unwrap();
        bytes.extend_from_slice(b"<llsd><map><key>bone</key><string>mNeck</string>");
        let parsed = LlsdReader::new(&bytes).read_all().unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn malformed_record_is_an_error() {
        let bytes = b"<llsd><map><key>type</key><integer>abc</integer></map></llsd>\n<llsd></llsd>";
        assert!(LlsdReader::new(bytes).read_all().is_err());
    }

    #[test]
    fn unknown_element_is_an_error() {
        let bytes = b"<llsd><pose/></llsd>\n";
        assert!(LlsdReader::new(bytes).read_all().is_err());
    }

    #[test]
    fn empty_elements_take_defaults() {
        let bytes = b"<llsd><map><key>a</key><real/><key>b</key><string/><key>c</key><undef/></map></llsd>";
        let parsed = LlsdReader::new(bytes).read_all().unwrap();
        assert_eq!(parsed[0].get("a"), Some(&LlsdValue::Real(0.0)));
        assert_eq!(parsed[0].get("b"), Some(&LlsdValue::String(String::new())));
        assert_eq!(parsed[0].get("c"), Some(&LlsdValue::Undefined));
    }

    #[test]
    fn reserializing_is_stable() {
        let bytes = write_stream(&[sample_record(), sample_record()]).unwrap();
        let parsed = LlsdReader::new(&bytes).read_all().unwrap();
        assert_eq!(write_stream(&parsed).unwrap(), bytes);
    }
}
