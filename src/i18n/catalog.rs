use crate::error::{BuildError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const MO_MAGIC: u32 = 0x9504_12de;
const MO_HEADER_LEN: usize = 28;
const CONTEXT_SEPARATOR: char = '\u{4}';

/// Singular translations of one gettext domain for one language.
///
/// Entries with a message context are ignored: only plain `gettext` lookups
/// are needed for manifests and page titles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Loads a compiled (`.mo`) or source (`.po`) catalog, chosen by extension.
    pub fn load(path: &Path) -> Result<Catalog> {
        let is_po = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("po"))
            .unwrap_or(false);
        if is_po {
            let txt = fs::read_to_string(path)
                .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
            Catalog::from_po_str(&txt, path)
        } else {
            let bytes = fs::read(path)
                .map_err(|e| BuildError::io(format!("Failed to read {}", path.display()), e))?;
            Catalog::from_mo_bytes(&bytes, path)
        }
    }

    pub fn lookup(&self, msgid: &str) -> Option<&str> {
        self.messages
            .get(msgid)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    fn insert(&mut self, msgid: &str, msgstr: &str) {
        if msgid.is_empty() || msgid.contains(CONTEXT_SEPARATOR) || msgstr.is_empty() {
            return;
        }
        // Plural entries: keep the singular form only.
        let id = msgid.split('\0').next().unwrap_or(msgid);
        let translated = msgstr.split('\0').next().unwrap_or(msgstr);
        self.messages.insert(id.to_string(), translated.to_string());
    }

    /// Parses a GNU `.mo` file in either byte order.
    pub fn from_mo_bytes(bytes: &[u8], origin: &Path) -> Result<Catalog> {
        if bytes.len() < MO_HEADER_LEN {
            return Err(malformed_mo(origin, "file too short for a .mo header"));
        }
        let little_endian = match u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) {
            MO_MAGIC => true,
            m if m.swap_bytes() == MO_MAGIC => false,
            _ => return Err(malformed_mo(origin, "bad magic number")),
        };
        let reader = MoReader {
            bytes,
            little_endian,
            origin,
        };

        if reader.u32_at(4)? >> 16 > 1 {
            return Err(malformed_mo(origin, "unsupported revision"));
        }
        let count = reader.u32_at(8)?;
        let originals = reader.u32_at(12)?;
        let translations = reader.u32_at(16)?;

        let mut catalog = Catalog::default();
        for i in 0..count {
            let msgid = reader.str_at(originals, i)?;
            let msgstr = reader.str_at(translations, i)?;
            catalog.insert(msgid, msgstr);
        }
        Ok(catalog)
    }

    /// Parses a `.po` source catalog. Fuzzy and obsolete entries are skipped,
    /// matching what `msgfmt` compiles by default.
    pub fn from_po_str(txt: &str, origin: &Path) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        let mut entry = PoEntry::default();
        let mut pending_fuzzy = false;
        let txt = txt.strip_prefix('\u{feff}').unwrap_or(txt);

        for (idx, raw_line) in txt.lines().enumerate() {
            let line_no = idx + 1;
            let malformed = |reason: &str| BuildError::MalformedCatalog {
                path: origin.to_path_buf(),
                reason: format!("line {}: {}", line_no, reason),
            };
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with("#~") {
                continue;
            }
            if let Some(flags) = line.strip_prefix("#,") {
                if flags.split(',').any(|f| f.trim() == "fuzzy") {
                    pending_fuzzy = true;
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if line.starts_with('"') {
                let value = unquote(line).map_err(malformed)?;
                entry
                    .current_mut()
                    .ok_or_else(|| malformed("string outside of an entry"))?
                    .push_str(&value);
                continue;
            }

            let (keyword, rest) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| malformed("expected keyword and string"))?;
            let value = unquote(rest.trim()).map_err(malformed)?;

            match keyword {
                "msgctxt" | "msgid" => {
                    let starts_new = keyword == "msgctxt" || entry.field != Some(PoField::Context);
                    if starts_new && entry.seen_msgstr {
                        entry.flush_into(&mut catalog);
                        entry = PoEntry::default();
                    }
                    if starts_new {
                        entry.fuzzy = pending_fuzzy;
                        pending_fuzzy = false;
                    }
                    if keyword == "msgctxt" {
                        entry.context = Some(value);
                        entry.field = Some(PoField::Context);
                    } else {
                        entry.msgid = value;
                        entry.field = Some(PoField::Id);
                    }
                }
                "msgid_plural" => {
                    entry.field = Some(PoField::IdPlural);
                }
                "msgstr" => {
                    entry.msgstr = value;
                    entry.seen_msgstr = true;
                    entry.field = Some(PoField::Str);
                }
                k if k.starts_with("msgstr[") && k.ends_with(']') => {
                    let n = &k["msgstr[".len()..k.len() - 1];
                    let n: usize = n.parse().map_err(|_| malformed("bad plural index"))?;
                    entry.seen_msgstr = true;
                    if n == 0 {
                        entry.msgstr = value;
                        entry.field = Some(PoField::Str);
                    } else {
                        entry.field = Some(PoField::OtherPlural);
                    }
                }
                other => return Err(malformed(&format!("unknown keyword '{}'", other))),
            }
        }
        entry.flush_into(&mut catalog);
        Ok(catalog)
    }
}

fn malformed_mo(origin: &Path, reason: &str) -> BuildError {
    BuildError::MalformedCatalog {
        path: origin.to_path_buf(),
        reason: reason.to_string(),
    }
}

struct MoReader<'a> {
    bytes: &'a [u8],
    little_endian: bool,
    origin: &'a Path,
}

impl<'a> MoReader<'a> {
    fn u32_at(&self, at: usize) -> Result<usize> {
        let raw: [u8; 4] = self
            .bytes
            .get(at..at.saturating_add(4))
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| malformed_mo(self.origin, "offset out of range"))?;
        let v = if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        };
        Ok(v as usize)
    }

    /// Reads entry `index` of a (length, offset) string table.
    fn str_at(&self, table: usize, index: usize) -> Result<&'a str> {
        let slot = table.saturating_add(index.saturating_mul(8));
        let len = self.u32_at(slot)?;
        let offset = self.u32_at(slot.saturating_add(4))?;
        let raw = self
            .bytes
            .get(offset..offset.saturating_add(len))
            .ok_or_else(|| malformed_mo(self.origin, "string out of range"))?;
        std::str::from_utf8(raw).map_err(|_| malformed_mo(self.origin, "string is not UTF-8"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PoField {
    Context,
    Id,
    IdPlural,
    Str,
    OtherPlural,
}

#[derive(Debug, Default)]
struct PoEntry {
    context: Option<String>,
    msgid: String,
    msgstr: String,
    fuzzy: bool,
    seen_msgstr: bool,
    field: Option<PoField>,
    // Continuation lines of fields we do not keep land here.
    discard: String,
}

impl PoEntry {
    fn current_mut(&mut self) -> Option<&mut String> {
        match self.field? {
            PoField::Context => self.context.as_mut(),
            PoField::Id => Some(&mut self.msgid),
            PoField::Str => Some(&mut self.msgstr),
            PoField::IdPlural | PoField::OtherPlural => Some(&mut self.discard),
        }
    }

    fn flush_into(&self, catalog: &mut Catalog) {
        if self.seen_msgstr && !self.fuzzy && self.context.is_none() {
            catalog.insert(&self.msgid, &self.msgstr);
        }
    }
}

/// Strips the surrounding quotes of a `.po` string and resolves C escapes,
/// including `\xHH` and octal `\NNN` byte escapes.
fn unquote(s: &str) -> std::result::Result<String, &'static str> {
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or("unterminated string")?;
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let escape = *bytes.get(i).ok_or("unterminated string")?;
        i += 1;
        let decoded = match escape {
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'x' => {
                let v = take_digits(bytes, &mut i, 2, 16).ok_or("empty hex escape")?;
                v as u8
            }
            b'0'..=b'7' => {
                i -= 1;
                let v = take_digits(bytes, &mut i, 3, 8).ok_or("bad octal escape")?;
                u8::try_from(v).map_err(|_| "octal escape out of range")?
            }
            other => other,
        };
        out.push(decoded);
    }
    String::from_utf8(out).map_err(|_| "string is not UTF-8")
}

/// Consumes up to `max` digits of `radix` starting at `*i`.
fn take_digits(bytes: &[u8], i: &mut usize, max: usize, radix: u32) -> Option<u32> {
    let start = *i;
    while *i < bytes.len() && *i - start < max && (bytes[*i] as char).is_digit(radix) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    let digits = std::str::from_utf8(&bytes[start..*i]).ok()?;
    u32::from_str_radix(digits, radix).ok()
}
