//! Desired-property extraction from an inbound twin document.
//!
//! The document is scanned once and must be well-formed JSON throughout.
//! Objects of the form `{"value": <scalar>, ...}` whose dotted path names a
//! bound property are indexed, so with a binding for `Thermostat.Target`,
//! `{"desired":{"Thermostat":{"Target":{"value":21.5}}}}` yields the entry
//! `Thermostat.Target -> 21.5`. Keys containing a literal `.` are never
//! descended into. Numbers and booleans are decoded with `serde-json-core`.

use super::{DeviceTwinBinding, MAX_DEVICE_TWINS, MAX_PROPERTY_NAME_LEN};
use heapless::{String, Vec};

/// Deepest object/array nesting accepted in a twin document.
const MAX_NESTING: usize = 32;

pub(crate) type PropertyPath = String<MAX_PROPERTY_NAME_LEN>;

/// Why a twin document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ParseError {
    /// Not valid UTF-8 or not well-formed JSON.
    Malformed,
    /// Nested deeper than [`MAX_NESTING`].
    TooDeep,
}

/// A `value` member as found in the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum JsonScalar<'de> {
    Number(f64),
    Bool(bool),
    /// Raw string contents, escapes not decoded.
    Str(&'de str),
    /// `null`, an object or an array.
    Other,
}

impl<'de> JsonScalar<'de> {
    fn decode(raw: &'de [u8]) -> Self {
        let decoded = match raw.first() {
            Some(b'"') => {
                // The scanner has already validated the token.
                return core::str::from_utf8(&raw[1..raw.len() - 1])
                    .map(JsonScalar::Str)
                    .unwrap_or(JsonScalar::Other);
            }
            Some(b't' | b'f') => {
                serde_json_core::from_slice::<bool>(raw).map(|(b, _)| JsonScalar::Bool(b))
            }
            Some(b'-' | b'0'..=b'9') => {
                serde_json_core::from_slice::<f64>(raw).map(|(n, _)| JsonScalar::Number(n))
            }
            _ => return JsonScalar::Other,
        };
        decoded.unwrap_or(JsonScalar::Other)
    }
}

/// Flat index of bound `value` members keyed by dotted path.
#[derive(Debug)]
pub(crate) struct PropertyTree<'de> {
    entries: Vec<(PropertyPath, JsonScalar<'de>), MAX_DEVICE_TWINS>,
}

impl<'de> PropertyTree<'de> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Only called for bound paths, which are unique, so at most one entry
    /// per binding is ever pushed.
    fn insert(&mut self, path: &str, value: JsonScalar<'de>) {
        if self.get(path).is_some() {
            return;
        }
        if let Ok(path) = PropertyPath::try_from(path) {
            let _ = self.entries.push((path, value));
        }
    }

    /// The `value` member of the object at `property`, first occurrence wins.
    pub(crate) fn get(&self, property: &str) -> Option<JsonScalar<'de>> {
        self.entries
            .iter()
            .find(|(path, _)| path.as_str() == property)
            .map(|(_, value)| *value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Indexed twin document.
#[derive(Debug)]
pub(crate) struct TwinDocument<'de> {
    desired: Option<PropertyTree<'de>>,
    root: PropertyTree<'de>,
}

impl<'de> TwinDocument<'de> {
    /// The `desired` section if the document has one, else the root.
    pub(crate) fn desired_properties(&self) -> &PropertyTree<'de> {
        self.desired.as_ref().unwrap_or(&self.root)
    }

    /// Whether a top-level `desired` object was present.
    pub(crate) fn has_desired_section(&self) -> bool {
        self.desired.is_some()
    }
}

/// Scan a twin document and index the properties named by `bindings`.
/// The top-level value must be an object.
pub(crate) fn parse<'de>(
    document: &'de [u8],
    bindings: &[DeviceTwinBinding],
) -> Result<TwinDocument<'de>, ParseError> {
    core::str::from_utf8(document).map_err(|_| ParseError::Malformed)?;

    let mut scanner = Scanner::new(document, bindings);
    let mut desired: Option<PropertyTree<'de>> = None;
    let mut root = PropertyTree::new();

    scanner.object(|scanner, key| {
        if key == "desired" && desired.is_none() && scanner.peek() == Some(b'{') {
            let mut section = PropertyTree::new();
            scanner.walk("", &mut section)?;
            desired = Some(section);
            return Ok(());
        }
        scanner.member(key, "", &mut root)
    })?;

    if scanner.peek().is_some() {
        return Err(ParseError::Malformed);
    }
    Ok(TwinDocument { desired, root })
}

/// `prefix.key`, or `None` if it does not fit or `key` itself holds a dot.
fn child_path(prefix: &str, key: &str) -> Option<PropertyPath> {
    if key.contains('.') {
        return None;
    }
    let mut path = PropertyPath::new();
    if !prefix.is_empty() {
        path.push_str(prefix).ok()?;
        path.push('.').ok()?;
    }
    path.push_str(key).ok()?;
    Some(path)
}

struct Scanner<'de, 'b> {
    bytes: &'de [u8],
    pos: usize,
    depth: usize,
    bindings: &'b [DeviceTwinBinding],
}

impl<'de, 'b> Scanner<'de, 'b> {
    fn new(bytes: &'de [u8], bindings: &'b [DeviceTwinBinding]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
            bindings,
        }
    }

    fn is_bound(&self, path: &str) -> bool {
        self.bindings.iter().any(|binding| binding.property == path)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.bytes.get(self.pos) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ParseError::Malformed)
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ParseError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Index the members of the object at `prefix` into `tree`.
    fn walk(&mut self, prefix: &str, tree: &mut PropertyTree<'de>) -> Result<(), ParseError> {
        self.object(|scanner, key| scanner.member(key, prefix, &mut *tree))
    }

    /// Handle one member of the object at `prefix`; the value is next.
    fn member(
        &mut self,
        key: &'de str,
        prefix: &str,
        tree: &mut PropertyTree<'de>,
    ) -> Result<(), ParseError> {
        if key == "value" && !prefix.is_empty() {
            let raw = self.value()?;
            if self.is_bound(prefix) {
                tree.insert(prefix, JsonScalar::decode(raw));
            }
            return Ok(());
        }
        match (self.peek(), child_path(prefix, key)) {
            (Some(b'{'), Some(path)) => self.walk(&path, tree),
            _ => self.value().map(|_| ()),
        }
    }

    /// Parse `{ "key": value, ... }`, handing each key to `member`, which
    /// must consume the member's value.
    fn object<F>(&mut self, mut member: F) -> Result<(), ParseError>
    where
        F: FnMut(&mut Self, &'de str) -> Result<(), ParseError>,
    {
        self.expect(b'{')?;
        self.enter()?;
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.leave();
            return Ok(());
        }
        loop {
            let key = self.string()?;
            self.expect(b':')?;
            member(self, key)?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(ParseError::Malformed),
            }
        }
        self.leave();
        Ok(())
    }

    fn array(&mut self) -> Result<(), ParseError> {
        self.expect(b'[')?;
        self.enter()?;
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.leave();
            return Ok(());
        }
        loop {
            self.value()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(ParseError::Malformed),
            }
        }
        self.leave();
        Ok(())
    }

    /// Raw contents of a string token, escapes left in place.
    fn string(&mut self) -> Result<&'de str, ParseError> {
        self.expect(b'"')?;
        let start = self.pos;
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(ParseError::Malformed),
                Some(b'"') => break,
                Some(b'\\') => self.escape()?,
                Some(&b) if b < 0x20 => return Err(ParseError::Malformed),
                Some(_) => self.pos += 1,
            }
        }
        let raw = &self.bytes[start..self.pos];
        self.pos += 1;
        core::str::from_utf8(raw).map_err(|_| ParseError::Malformed)
    }

    /// Validate one escape sequence starting at the backslash.
    fn escape(&mut self) -> Result<(), ParseError> {
        match self.bytes.get(self.pos + 1) {
            Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                self.pos += 2;
                Ok(())
            }
            Some(b'u') => {
                let hex = self
                    .bytes
                    .get(self.pos + 2..self.pos + 6)
                    .ok_or(ParseError::Malformed)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(ParseError::Malformed);
                }
                self.pos += 6;
                Ok(())
            }
            _ => Err(ParseError::Malformed),
        }
    }

    fn literal(&mut self, word: &[u8]) -> Result<(), ParseError> {
        if self.bytes[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(())
        } else {
            Err(ParseError::Malformed)
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.bytes.get(self.pos) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    fn number(&mut self) -> Result<(), ParseError> {
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        match self.bytes.get(self.pos) {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                self.digits();
            }
            _ => return Err(ParseError::Malformed),
        }
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            if self.digits() == 0 {
                return Err(ParseError::Malformed);
            }
        }
        if let Some(b'e' | b'E') = self.bytes.get(self.pos) {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.bytes.get(self.pos) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(ParseError::Malformed);
            }
        }
        Ok(())
    }

    /// Consume one value of any type and return its raw bytes.
    fn value(&mut self) -> Result<&'de [u8], ParseError> {
        let first = self.peek().ok_or(ParseError::Malformed)?;
        let start = self.pos;
        match first {
            b'{' => self.object(|scanner, _| scanner.value().map(|_| ()))?,
            b'[' => self.array()?,
            b'"' => self.string().map(|_| ())?,
            b't' => self.literal(b"true")?,
            b'f' => self.literal(b"false")?,
            b'n' => self.literal(b"null")?,
            b'-' | b'0'..=b'9' => self.number()?,
            _ => return Err(ParseError::Malformed),
        }
        Ok(&self.bytes[start..self.pos])
    }
}
