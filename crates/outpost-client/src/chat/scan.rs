//! Scanners for coordinates, links, and color tags in chat text.
//!
//! All offsets are byte offsets into the scanned `&str` and always fall on
//! char boundaries: every delimiter the scanners stop at is ASCII.
//!
//! A coordinate is two digit runs separated by whitespace and/or commas,
//! with optional color tags (`[...]`) directly after the first number or
//! directly before the second. A link is an optional `http(s)://` scheme, a
//! host of up to 256 characters, a dot, a 1 to 6 character top-level label
//! ending on a word boundary, and any trailing path characters.

use glam::Vec2;

/// A coordinate pair found in chat text.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundCoordinate {
    pub start: usize,
    pub end: usize,
    /// Tile coordinates as written.
    pub tile: Vec2,
}

impl FoundCoordinate {
    /// World position of the referenced tile.
    pub fn world(&self, tile_size: f32) -> Vec2 {
        self.tile * tile_size
    }
}

/// A link found in chat text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundLink {
    pub start: usize,
    pub end: usize,
    /// Target URL, with `https://` added when the text had no scheme.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_host(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-@:%._+~#=".contains(&b)
}

fn is_tld(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'(' || b == b')'
}

fn is_path(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-()@:%_+.~#?&/=".contains(&b)
}

fn run_end(bytes: &[u8], from: usize, class: impl Fn(u8) -> bool) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| !class(b))
        .map_or(bytes.len(), |n| from + n)
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Skip zero or more `[...]` tags starting at `i`.
fn skip_tags(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i) == Some(&b'[') {
        match bytes[i + 1..].iter().position(|&b| b == b']') {
            Some(n) => i += n + 2,
            None => break,
        }
    }
    i
}

/// Match a coordinate pair starting exactly at `start`.
/// Returns the match end and the two digit ranges.
fn coord_at(bytes: &[u8], start: usize) -> Option<(usize, (usize, usize), (usize, usize))> {
    let x_end = run_end(bytes, start, |b| b.is_ascii_digit());
    if x_end == start {
        return None;
    }
    let sep_start = skip_tags(bytes, x_end);
    let sep_end = run_end(bytes, sep_start, |b| is_space(b) || b == b',');
    if sep_end == sep_start {
        return None;
    }
    let y_start = skip_tags(bytes, sep_end);
    let y_end = run_end(bytes, y_start, |b| b.is_ascii_digit());
    if y_end == y_start {
        return None;
    }
    Some((y_end, (start, x_end), (y_start, y_end)))
}

fn parse_pair(text: &str, x: (usize, usize), y: (usize, usize)) -> Option<Vec2> {
    let x: f32 = text[x.0..x.1].parse().ok()?;
    let y: f32 = text[y.0..y.1].parse().ok()?;
    Some(Vec2::new(x, y))
}

/// Every coordinate pair in `text`, left to right, non-overlapping.
pub fn find_coords(text: &str) -> Vec<FoundCoordinate> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match coord_at(bytes, i) {
            Some((end, x, y)) => {
                if let Some(tile) = parse_pair(text, x, y) {
                    out.push(FoundCoordinate { start: i, end, tile });
                }
                i = end;
            }
            None => i += 1,
        }
    }
    out
}

/// Wrap the first coordinate, together with the non-space text glued to
/// either side of it, in a `[scarlet]` highlight. Color tags inside the
/// highlighted span are removed. Returns the new text and the tile
/// coordinates, or `None` if the text has no coordinate.
pub fn highlight_first_coord(text: &str) -> Option<(String, Vec2)> {
    let bytes = text.as_bytes();
    let (start, (end, x, y)) = (0..bytes.len()).find_map(|i| coord_at(bytes, i).map(|m| (i, m)))?;
    let tile = parse_pair(text, x, y)?;

    let whole_start = bytes[..start]
        .iter()
        .rposition(|&b| is_space(b))
        .map_or(0, |p| p + 1);
    let whole_end = run_end(bytes, end, |b| !is_space(b));

    let mut out = String::with_capacity(text.len() + 12);
    out.push_str(&text[..whole_start]);
    out.push_str("[scarlet]");
    out.push_str(&strip_colors(&text[whole_start..whole_end]));
    out.push_str("[]");
    out.push_str(&text[whole_end..]);
    Some((out, tile))
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

fn boundary(bytes: &[u8], at: usize) -> bool {
    let before = at.checked_sub(1).and_then(|i| bytes.get(i)).is_some_and(|&b| is_word(b));
    let after = bytes.get(at).is_some_and(|&b| is_word(b));
    before != after
}

/// Match host, dot and top-level label starting at `host`. Returns the end
/// of the label.
fn domain_at(bytes: &[u8], host: usize) -> Option<usize> {
    let host_end = run_end(bytes, host, is_host);
    // The dot itself is a host character, so it must sit before the run end.
    let last_dot = host_end.checked_sub(1)?.min(host + 256);
    (host + 1..=last_dot).rev().filter(|&i| bytes[i] == b'.').find_map(|dot| {
        let tld_max = run_end(bytes, dot + 1, is_tld).min(dot + 7);
        (dot + 2..=tld_max).rev().find(|&end| boundary(bytes, end))
    })
}

fn link_at(bytes: &[u8], start: usize) -> Option<(usize, bool)> {
    let rest = &bytes[start..];
    let scheme = if rest.starts_with(b"https://") {
        8
    } else if rest.starts_with(b"http://") {
        7
    } else {
        0
    };
    if scheme > 0
        && let Some(label_end) = domain_at(bytes, start + scheme)
    {
        return Some((run_end(bytes, label_end, is_path), true));
    }
    domain_at(bytes, start).map(|label_end| (run_end(bytes, label_end, is_path), false))
}

/// Every link in `text` that starts at or after `from`.
///
/// Matching always begins at the start of the text, so a link that
/// straddles `from` is skipped rather than cut.
pub fn find_links(text: &str, from: usize) -> Vec<FoundLink> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match link_at(bytes, i) {
            Some((end, has_scheme)) => {
                if i >= from {
                    let matched = &text[i..end];
                    let url = if has_scheme {
                        matched.to_string()
                    } else {
                        format!("https://{matched}")
                    };
                    out.push(FoundLink { start: i, end, url });
                }
                i = end.max(i + 1);
            }
            None => i += 1,
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Color tags
// ---------------------------------------------------------------------------

fn is_color_tag(content: &str) -> bool {
    if content.is_empty() {
        return true;
    }
    if let Some(hex) = content.strip_prefix('#') {
        return !hex.is_empty() && hex.len() <= 8 && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    content.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Remove color markup: `[name]`, `[#hex]` and `[]` disappear, `[[` becomes `[`.
pub fn strip_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(tail) = after.strip_prefix('[') {
            out.push('[');
            rest = tail;
            continue;
        }
        match after.find(']') {
            Some(close) if is_color_tag(&after[..close]) => rest = &after[close + 1..],
            _ => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
