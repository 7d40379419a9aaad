//! Regular-expression search/replace.
use super::splice;
use crate::model::SearchSettings;
use crate::transform::{Transform, TransformCall, TransformContext, TransformError};
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::Arc;

/// Rewrite a replacement string into `regex` crate syntax for `regex`.
///
/// `$&` becomes the whole match. `$N` and `$NN` refer to a group only when
/// `regex` has that group: a two-digit reference that does not exist falls
/// back to one digit plus a literal, and a reference to no group stays
/// literal text. `$<name>` names an existing group. `$$` and any other `$`
/// are literal.
pub fn translate_replacement(text: &str, regex: &Regex) -> String {
    let groups = regex.captures_len().saturating_sub(1);
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.get(i).copied() {
            Some('$') => {
                i += 1;
                out.push_str("$$");
            }
            Some('&') => {
                i += 1;
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                let one = d.to_digit(10).map_or(0, |v| v as usize);
                let two = chars
                    .get(i + 1)
                    .and_then(|n| n.to_digit(10))
                    .map(|n| one * 10 + n as usize);
                match two {
                    Some(index) if index >= 1 && index <= groups => {
                        i += 2;
                        out.push_str(&format!("${{{index}}}"));
                    }
                    _ if one >= 1 && one <= groups => {
                        i += 1;
                        out.push_str(&format!("${{{one}}}"));
                    }
                    _ => out.push_str("$$"),
                }
            }
            Some('<') => {
                let close = chars[i..].iter().position(|&ch| ch == '>');
                let name = close.map(|len| chars[i + 1..i + len].iter().collect::<String>());
                match (close, name) {
                    (Some(len), Some(name))
                        if regex.capture_names().flatten().any(|n| n == name) =>
                    {
                        i += len + 1;
                        out.push_str(&format!("${{{name}}}"));
                    }
                    _ => out.push_str("$$"),
                }
            }
            _ => out.push_str("$$"),
        }
    }
    out
}

/// A compiled search pattern plus its global flag.
#[derive(Debug, Clone)]
pub struct RegexStrategy {
    regex: Regex,
    matches_all: bool,
}

impl RegexStrategy {
    /// Build from the search settings; the input is the pattern.
    pub fn new(settings: &SearchSettings) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&settings.input)
            .case_insensitive(!settings.is_case_sensitive)
            .build()?;
        Ok(Self {
            regex,
            matches_all: settings.matches_all,
        })
    }

    /// Replace with a literal replacement string (`$` expansion applies).
    pub fn replace(&self, source: &str, replacement: &str) -> String {
        let replacement = translate_replacement(replacement, &self.regex);
        let limit = if self.matches_all { 0 } else { 1 };
        self.regex
            .replacen(source, limit, replacement.as_str())
            .into_owned()
    }

    /// Every match that would be replaced, with the call a scripted replacer
    /// receives for it.
    pub fn collect_calls(&self, source: &str) -> Vec<(Range<usize>, TransformCall)> {
        let limit = if self.matches_all { usize::MAX } else { 1 };
        self.regex
            .captures_iter(source)
            .take(limit)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let call = TransformCall {
                    matched: whole.as_str().to_string(),
                    groups: caps
                        .iter()
                        .skip(1)
                        .map(|g| g.map(|g| g.as_str().to_string()))
                        .collect(),
                    offset: source[..whole.start()].chars().count(),
                    source: source.to_string(),
                };
                Some((whole.range(), call))
            })
            .collect()
    }

    /// Replace using a scripted replacer.
    ///
    /// All replacement futures are created before any is awaited; the string
    /// is rebuilt in match order once every value has resolved.
    pub async fn replace_with(
        &self,
        source: &str,
        transform: &Arc<dyn Transform>,
        ctx: &TransformContext,
    ) -> Result<String, TransformError> {
        let calls = self.collect_calls(source);
        let (ranges, futures): (Vec<_>, Vec<_>) = calls
            .into_iter()
            .map(|(range, call)| (range, transform.call(call, ctx.clone())))
            .unzip();
        let values = futures::future::try_join_all(futures).await?;
        Ok(splice(source, ranges.into_iter().zip(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::from_sync_fn;
    use futures::executor::block_on;

    fn strategy(pattern: &str, all: bool, case_sensitive: bool) -> RegexStrategy {
        RegexStrategy::new(&SearchSettings {
            input: pattern.into(),
            is_regex: true,
            matches_all: all,
            is_case_sensitive: case_sensitive,
            use_function: false,
        })
        .unwrap()
    }

    #[test]
    fn test_translate_replacement() {
        let two = Regex::new(r"(\w)(\w)").unwrap();
        assert_eq!(translate_replacement("[$&]", &two), "[${0}]");
        assert_eq!(translate_replacement("$1a", &two), "${1}a");
        assert_eq!(translate_replacement("$$1", &two), "$$1");
        assert_eq!(translate_replacement("$12", &two), "${1}2");
        assert_eq!(translate_replacement("$3", &two), "$$3");
        assert_eq!(translate_replacement("$0", &two), "$$0");
        assert_eq!(translate_replacement("${name}", &two), "$${name}");
        assert_eq!(translate_replacement("cost $", &two), "cost $$");

        let named = Regex::new(r"(?P<year>\d{4})").unwrap();
        assert_eq!(translate_replacement("y$<year>", &named), "y${year}");
        assert_eq!(translate_replacement("$<month>", &named), "$$<month>");

        let many = Regex::new(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)").unwrap();
        assert_eq!(translate_replacement("$10", &many), "${10}");
        assert_eq!(translate_replacement("$01", &many), "${1}");
    }

    /// Dollar signs that name no group are kept as typed.
    #[test]
    fn test_literal_dollar_replacement() {
        let s = strategy("price", true, false);
        assert_eq!(s.replace("price.txt", "$5"), "$5.txt");
        assert_eq!(s.replace("price.txt", "US$100"), "US$100.txt");
        assert_eq!(s.replace("price.txt", "$x"), "$x.txt");

        let grouped = strategy("(pri)ce", true, false);
        assert_eq!(grouped.replace("price.txt", "$10"), "pri0.txt");
    }

    #[test]
    fn test_case_insensitive_global() {
        assert_eq!(strategy("a", true, false).replace("AaA", "_"), "___");
        assert_eq!(strategy("a", true, true).replace("AaA", "_"), "A_A");
        assert_eq!(strategy("a", false, false).replace("AaA", "_"), "_aA");
    }

    #[test]
    fn test_group_expansion() {
        let s = strategy(r"(\w+)\.(\w+)", true, false);
        assert_eq!(s.replace("photo.jpeg", "$2.$1"), "jpeg.photo");
        assert_eq!(s.replace("photo.jpeg", "$1_x.$2"), "photo_x.jpeg");
    }

    #[test]
    fn test_collect_calls_reports_char_offsets() {
        let s = strategy("b(x)?", true, true);
        let calls = s.collect_calls("ébab");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.offset, 1);
        assert_eq!(calls[1].1.offset, 3);
        assert_eq!(calls[0].1.groups, vec![None]);
        assert_eq!(calls[0].0, 2..3);
    }

    #[test]
    fn test_replace_with_transform() {
        let s = strategy("[0-9]+", true, false);
        let pad = from_sync_fn(|call| format!("{:0>3}", call.matched));
        let out = block_on(s.replace_with("v1-22", &pad, &TransformContext::default()));
        assert_eq!(out.unwrap(), "v001-022");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RegexStrategy::new(&SearchSettings::regex("(")).is_err());
    }
}
