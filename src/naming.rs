use rand::Rng;
use time::OffsetDateTime;

/// Leaves room for the timestamp, suffix and extension within the usual
/// 255-byte file name limit.
const MAX_SLUG_BYTES: usize = 200;

/// Turns a human title into something usable both as a file name and as a
/// URL path segment.
///
/// Whitespace runs collapse into a single `_`. Letters, digits, `-`, `_` and
/// `.` are kept; anything else (separators, URL delimiters such as `#` or
/// `%`, control characters) becomes `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.split_whitespace().collect::<Vec<_>>().join("_").chars() {
        let c = match c {
            c if c.is_alphanumeric() => c,
            '-' | '_' | '.' => c,
            _ => '-',
        };
        if slug.len() + c.len_utf8() > MAX_SLUG_BYTES {
            break;
        }
        slug.push(c);
    }
    slug
}

/// `<timestamp>_<slug>_<suffix>`, shared by the markup and output files of a
/// single request.
pub fn stem(title: &str, timestamp: i64, suffix: &str) -> String {
    format!("{}_{}_{}", timestamp, slugify(title), suffix)
}

pub fn fresh_stem(title: &str) -> String {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    let suffix = format!("{:08x}", rand::thread_rng().gen::<u32>());
    stem(title, timestamp, &suffix)
}
