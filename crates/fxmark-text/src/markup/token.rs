//! Character-level tokenizer for effect markup.
//!
//! Text tokens are already unescaped: `\<` and `\\` collapse to one
//! character and the entities `&lt;`, `&gt;`, `&amp;` are decoded exactly
//! once. A `<` that does not start a well-formed tag is kept as literal
//! text together with whatever it would have enclosed.

/// Whether a tag opens, closes, or does both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name .../>`
    SelfClosing,
}

/// A syntactically valid tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Open, close, or self-closing.
    pub kind: TagKind,
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order; keys lowercased, values decoded.
    pub attrs: Vec<(String, String)>,
    /// The tag exactly as written, brackets included.
    pub source: String,
}

/// One lexical unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decoded literal text.
    Text(String),
    /// A tag.
    Tag(Tag),
}

/// Key used for the `<name=value>` shorthand.
pub const SHORTHAND_KEY: &str = "value";

/// Split `source` into text and tag tokens.
///
/// # Example
/// ```
/// use fxmark_text::markup::{Token, tokenize};
///
/// let tokens = tokenize("a<b>c</b>");
/// assert_eq!(tokens.len(), 4);
/// assert_eq!(tokens[0], Token::Text("a".into()));
/// ```
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let ends = chars.contains(&'<').then(|| TagEnds::new(&chars));
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' if matches!(chars.get(i + 1), Some('<' | '\\')) => {
                text.push(chars[i + 1]);
                i += 2;
            }
            '&' => match decode_entity(&chars[i..]) {
                Some((ch, used)) => {
                    text.push(ch);
                    i += used;
                }
                None => {
                    text.push('&');
                    i += 1;
                }
            },
            '<' => {
                let close = ends.as_ref().and_then(|ends| ends.find(i + 1));
                let Some(end) = close else {
                    text.push('<');
                    i += 1;
                    continue;
                };
                let raw: String = chars[i..=end].iter().collect();
                match parse_tag(&chars[i + 1..end], raw) {
                    Ok(tag) => {
                        if !text.is_empty() {
                            tokens.push(Token::Text(std::mem::take(&mut text)));
                        }
                        tokens.push(Token::Tag(tag));
                    }
                    Err(raw) => text.push_str(&raw),
                }
                i = end + 1;
            }
            ch => {
                text.push(ch);
                i += 1;
            }
        }
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

/// Decode one entity at the start of `chars`, returning the character and
/// how many source chars it used.
fn decode_entity(chars: &[char]) -> Option<(char, usize)> {
    const ENTITIES: [(&str, char); 3] = [("&lt;", '<'), ("&gt;", '>'), ("&amp;", '&')];
    ENTITIES.iter().find_map(|(name, ch)| {
        let len = name.len();
        (chars.len() >= len && chars[..len].iter().copied().eq(name.chars())).then_some((*ch, len))
    })
}

/// Decode entities in an attribute value.
fn decode_entities(value: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        if value[i] == '&'
            && let Some((ch, used)) = decode_entity(&value[i..])
        {
            out.push(ch);
            i += used;
            continue;
        }
        out.push(value[i]);
        i += 1;
    }
    out
}

/// Where a scan for the closing `>` stops, for every start position and
/// quote state. Built once, right to left, so every `<` costs one lookup.
struct TagEnds {
    /// Per position: `[outside quotes, inside "", inside '']`.
    ends: Vec<[Option<u32>; 3]>,
}

impl TagEnds {
    fn new(chars: &[char]) -> Self {
        let mut ends = vec![[None; 3]; chars.len() + 1];
        for (k, &ch) in chars.iter().enumerate().rev() {
            let next = ends[k + 1];
            ends[k] = [
                match ch {
                    '>' => u32::try_from(k).ok(),
                    '"' => next[1],
                    '\'' => next[2],
                    _ => next[0],
                },
                if ch == '"' { next[0] } else { next[1] },
                if ch == '\'' { next[0] } else { next[2] },
            ];
        }
        Self { ends }
    }

    /// Index of the next `>` outside quotes, scanning from `from`.
    fn find(&self, from: usize) -> Option<usize> {
        self.ends.get(from)?[0].map(|end| end as usize)
    }
}

/// Valid tag names start with an ASCII letter and continue with ASCII
/// alphanumerics or `_ - : .`.
fn is_valid_name(name: &[char]) -> bool {
    match name.split_first() {
        Some((first, rest)) => {
            first.is_ascii_alphabetic()
                && rest
                    .iter()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
        }
        None => false,
    }
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | '/' | '"' | '\'')
}

/// Parse the inside of `<...>`. On failure the raw source comes back so the
/// caller can emit it as text.
fn parse_tag(body: &[char], source: String) -> Result<Tag, String> {
    if let Some(('/', rest)) = body.split_first().map(|(c, r)| (*c, r)) {
        let name = trim(rest);
        if !is_valid_name(name) {
            return Err(source);
        }
        return Ok(Tag {
            kind: TagKind::Close,
            name: lower(name),
            attrs: Vec::new(),
            source,
        });
    }

    let mut body = trim_end(body);
    let mut kind = TagKind::Open;
    if let Some((&'/', head)) = body.split_last() {
        kind = TagKind::SelfClosing;
        body = trim_end(head);
    }

    let name_len = body.iter().take_while(|&&c| is_name_char(c)).count();
    let name = &body[..name_len];
    if !is_valid_name(name) {
        return Err(source);
    }

    let mut attrs = Vec::new();
    let mut i = name_len;
    if body.get(i) == Some(&'=') {
        let Some((value, next)) = read_value(body, i + 1) else {
            return Err(source);
        };
        attrs.push((SHORTHAND_KEY.to_string(), value));
        i = next;
    }

    loop {
        let ws = body[i..].iter().take_while(|c| c.is_whitespace()).count();
        i += ws;
        if i >= body.len() {
            break;
        }
        if ws == 0 {
            // Attributes must be whitespace-separated.
            return Err(source);
        }

        let key_len = body[i..].iter().take_while(|&&c| is_name_char(c)).count();
        if key_len == 0 {
            return Err(source);
        }
        let key = lower(&body[i..i + key_len]);
        i += key_len;

        if body.get(i) == Some(&'=') {
            let Some((value, next)) = read_value(body, i + 1) else {
                return Err(source);
            };
            attrs.push((key, value));
            i = next;
        } else {
            attrs.push((key, "true".to_string()));
        }
    }

    Ok(Tag {
        kind,
        name: lower(name),
        attrs,
        source,
    })
}

/// Read a quoted or bare value starting at `at`; returns the decoded value
/// and the index just past it.
fn read_value(body: &[char], at: usize) -> Option<(String, usize)> {
    match body.get(at) {
        Some(&q @ ('"' | '\'')) => {
            let len = body[at + 1..].iter().position(|&c| c == q)?;
            let value = decode_entities(&body[at + 1..at + 1 + len]);
            Some((value, at + len + 2))
        }
        Some(_) => {
            let len = body[at..].iter().take_while(|c| !c.is_whitespace()).count();
            Some((decode_entities(&body[at..at + len]), at + len))
        }
        None => Some((String::new(), at)),
    }
}

fn trim(chars: &[char]) -> &[char] {
    let start = chars
        .iter()
        .position(|c| !c.is_whitespace())
        .unwrap_or(chars.len());
    trim_end(&chars[start..])
}

fn trim_end(chars: &[char]) -> &[char] {
    let end = chars
        .iter()
        .rposition(|c| !c.is_whitespace())
        .map_or(0, |p| p + 1);
    &chars[..end]
}

fn lower(chars: &[char]) -> String {
    chars.iter().map(|c| c.to_ascii_lowercase()).collect()
}
