use crate::error::{BuildError, Result};

enum Piece<'a> {
    Text(&'a str),
    Field(&'a str),
}

/// Splits a `{field}` template into literal text and placeholders.
/// `{{` and `}}` stand for literal braces.
fn tokenize<'a>(template: &'a str, name: &str) -> Result<Vec<Piece<'a>>> {
    let malformed = |reason: String| BuildError::MalformedTemplate {
        template: name.to_string(),
        reason,
    };

    let mut pieces = Vec::new();
    let bytes = template.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                pieces.push(Piece::Text(&template[start..=i]));
                i += 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                pieces.push(Piece::Text(&template[start..=i]));
                i += 2;
                start = i;
            }
            b'{' => {
                pieces.push(Piece::Text(&template[start..i]));
                let close = template[i + 1..]
                    .find('}')
                    .ok_or_else(|| malformed(format!("unclosed '{{' at byte {}", i)))?;
                let field = &template[i + 1..i + 1 + close];
                if field.is_empty() || field.contains('{') {
                    return Err(malformed(format!("invalid placeholder at byte {}", i)));
                }
                pieces.push(Piece::Field(field));
                i += close + 2;
                start = i;
            }
            b'}' => {
                return Err(malformed(format!("single '}}' at byte {}", i)));
            }
            _ => i += 1,
        }
    }
    pieces.push(Piece::Text(&template[start..]));
    Ok(pieces)
}

/// Renders a template. Every placeholder is checked against `lookup` before
/// anything is substituted.
///
/// ### Parameters
/// - `template`: The template text
/// - `name`: Template name used in error messages
/// - `lookup`: Resolves a placeholder name to its value
///
pub fn render<'v, F>(template: &str, name: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let pieces = tokenize(template, name)?;

    for piece in &pieces {
        if let Piece::Field(f) = piece {
            if lookup(f).is_none() {
                return Err(BuildError::MissingField {
                    template: name.to_string(),
                    field: f.to_string(),
                });
            }
        }
    }

    let mut out = String::with_capacity(template.len());
    for piece in pieces {
        match piece {
            Piece::Text(t) => out.push_str(t),
            Piece::Field(f) => out.push_str(lookup(f).unwrap_or_default()),
        }
    }
    Ok(out)
}
