//! Literal substring search/replace with explicit case and global control.
//!
//! Matching walks the source one character at a time. With case folding off,
//! two characters are equal only if identical; with it on they are also equal
//! when their Unicode lowercase mappings agree. Matches never overlap.
use super::splice;
use crate::transform::{Transform, TransformCall, TransformContext, TransformError};
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralOptions {
    pub case_sensitive: bool,
    /// Replace every occurrence, not just the first.
    pub matches_all: bool,
}

impl Default for LiteralOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            matches_all: true,
        }
    }
}

/// One occurrence of the search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    /// Byte range in the source.
    pub range: Range<usize>,
    /// Character index of the first matched character.
    pub index: usize,
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && a.to_lowercase().eq(b.to_lowercase()))
}

/// Find the occurrences of `search` in `source`, left to right.
pub fn find_matches(source: &str, search: &str, options: LiteralOptions) -> Vec<LiteralMatch> {
    let needle: Vec<char> = search.chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let hay: Vec<(usize, char)> = source.char_indices().collect();
    let mut matches = Vec::new();
    let mut i = 0;

    while i + needle.len() <= hay.len() {
        let hit = chars_equal(hay[i].1, needle[0], options.case_sensitive)
            && hay[i + 1..i + needle.len()]
                .iter()
                .zip(&needle[1..])
                .all(|(&(_, a), &b)| chars_equal(a, b, options.case_sensitive));

        if !hit {
            i += 1;
            continue;
        }

        let end = hay
            .get(i + needle.len())
            .map_or(source.len(), |&(byte, _)| byte);
        matches.push(LiteralMatch {
            range: hay[i].0..end,
            index: i,
        });
        if !options.matches_all {
            break;
        }
        i += needle.len();
    }

    matches
}

/// Replace occurrences of `search` with `replacement`.
///
/// An empty search term or an empty replacement leaves `source` unchanged.
pub fn replace_literal(
    source: &str,
    search: &str,
    replacement: &str,
    options: LiteralOptions,
) -> String {
    if replacement.is_empty() {
        return source.to_string();
    }
    replace_literal_with(source, search, options, |_, _, _| replacement.to_string())
}

/// Replace occurrences of `search` with the value computed by `replacer`,
/// called as `(matched, char_index, source)` for each match in order.
pub fn replace_literal_with<F>(source: &str, search: &str, options: LiteralOptions, mut replacer: F) -> String
where
    F: FnMut(&str, usize, &str) -> String,
{
    let matches = find_matches(source, search, options);
    splice(
        source,
        matches.into_iter().map(|m| {
            let value = replacer(&source[m.range.clone()], m.index, source);
            (m.range, value)
        }),
    )
}

/// Replace occurrences using a scripted replacer; every call is issued
/// before any is awaited.
pub async fn replace_literal_transform(
    source: &str,
    search: &str,
    options: LiteralOptions,
    transform: &Arc<dyn Transform>,
    ctx: &TransformContext,
) -> Result<String, TransformError> {
    let (ranges, futures): (Vec<_>, Vec<_>) = find_matches(source, search, options)
        .into_iter()
        .map(|m| {
            let call = TransformCall {
                matched: source[m.range.clone()].to_string(),
                groups: Vec::new(),
                offset: m.index,
                source: source.to_string(),
            };
            (m.range, transform.call(call, ctx.clone()))
        })
        .unzip();
    let values = futures::future::try_join_all(futures).await?;
    Ok(splice(source, ranges.into_iter().zip(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::from_sync_fn;

    const FIRST: LiteralOptions = LiteralOptions {
        case_sensitive: false,
        matches_all: false,
    };

    #[test]
    fn test_replace_first_only() {
        assert_eq!(replace_literal("aaa", "a", "b", FIRST), "baa");
    }

    #[test]
    fn test_replace_all_non_overlapping() {
        let opts = LiteralOptions::default();
        assert_eq!(replace_literal("aaaa", "aa", "b", opts), "bb");
        assert_eq!(replace_literal("aaa", "aa", "b", opts), "ba");
    }

    #[test]
    fn test_case_folding() {
        let insensitive = LiteralOptions::default();
        let sensitive = LiteralOptions {
            case_sensitive: true,
            matches_all: true,
        };
        assert_eq!(replace_literal("FooFOOfoo", "foo", "x", insensitive), "xxx");
        assert_eq!(replace_literal("FooFOOfoo", "foo", "x", sensitive), "FooFOOx");
        assert_eq!(replace_literal("ÉTÉ été", "été", "summer", insensitive), "summer summer");
    }

    #[test]
    fn test_empty_inputs_leave_source() {
        let opts = LiteralOptions::default();
        assert_eq!(replace_literal("abc", "", "x", opts), "abc");
        assert_eq!(replace_literal("abc", "b", "", opts), "abc");
        assert!(find_matches("abc", "", opts).is_empty());
    }

    #[test]
    fn test_match_positions_are_char_indices() {
        let found = find_matches("ñaña", "a", LiteralOptions::default());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].range, 2..3);
        assert_eq!(found[1].index, 3);
    }

    #[test]
    fn test_replacer_receives_match_index_source() {
        let mut seen = Vec::new();
        let out = replace_literal_with("xAyA", "a", LiteralOptions::default(), |m, i, src| {
            seen.push((m.to_string(), i, src.to_string()));
            format!("<{i}>")
        });
        assert_eq!(out, "x<1>y<3>");
        assert_eq!(seen[0], ("A".to_string(), 1, "xAyA".to_string()));
    }

    #[test]
    fn test_transform_replacer() {
        let upper = from_sync_fn(|call| call.matched.to_uppercase());
        let out = futures::executor::block_on(replace_literal_transform(
            "one two one",
            "one",
            LiteralOptions::default(),
            &upper,
            &TransformContext::default(),
        ));
        assert_eq!(out.unwrap(), "ONE two ONE");
    }
}
