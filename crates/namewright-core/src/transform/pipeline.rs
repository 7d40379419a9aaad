//! The pipeline language: a `|`-separated chain of string steps.
//!
//! The value flowing through the pipeline starts as the call's `matched`
//! text. Each step maps it to a new string; the last value is the result.
//!
//! | step | effect |
//! |---|---|
//! | `lower`, `upper` | Unicode case mapping |
//! | `title`, `kebab`, `snake`, `camel`, `pascal` | word-case conversions |
//! | `capitalize` | first character uppercased |
//! | `trim` | strip surrounding whitespace |
//! | `prefix(t)`, `suffix(t)` | add a rendered [template](super::template) |
//! | `strip_prefix(t)`, `strip_suffix(t)` | remove a literal affix if present |
//! | `replace(from, to)` | replace every literal occurrence |
//! | `regex(pattern, to)` | regex replace-all with `$` expansion |
//! | `set(t)` | replace the value with a rendered template |
//! | `slice(start[, end])` | character slice, negative indices from the end |
//! | `pad(width[, fill])` | left-pad to `width` characters (fill `"0"`) |
//! | `skip_files`, `skip_folders` | return the original text for that kind |
use super::parser::{self, Arg, StepAst};
use super::template::{Template, MAX_PAD_WIDTH};
use super::{ScriptEngine, Transform, TransformCall, TransformContext, TransformError, TransformFuture};
use crate::replace::regex::translate_replacement;
use futures::FutureExt;
use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase, ToTitleCase};
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
enum Step {
    Lower,
    Upper,
    Title,
    Kebab,
    Snake,
    Camel,
    Pascal,
    Capitalize,
    Trim,
    Prefix(Template),
    Suffix(Template),
    StripPrefix(String),
    StripSuffix(String),
    Replace(String, String),
    Regex(Regex, String),
    Set(Template),
    Slice(i64, Option<i64>),
    Pad(usize, char),
    SkipFiles,
    SkipFolders,
}

/// Outcome of one step: keep going, or short-circuit with the original text.
enum Flow {
    Continue(String),
    Skip,
}

impl Step {
    fn compile(ast: StepAst) -> Result<Self, TransformError> {
        let StepAst { name, args, .. } = ast;
        let found = args.len();
        let arity = |expected: &'static str| TransformError::Arity {
            step: name.clone(),
            expected,
            found,
        };
        let bad = |message: String| TransformError::BadArgument {
            step: name.clone(),
            message,
        };
        let string = |arg: Arg| match arg {
            Arg::Str(s) => Ok(s),
            Arg::Int(n) => Err(bad(format!("expected a string, found {n}"))),
        };
        let int = |arg: Arg| match arg {
            Arg::Int(n) => Ok(n),
            Arg::Str(s) => Err(bad(format!("expected an integer, found \"{s}\""))),
        };

        let mut args = args.into_iter();
        let step = match (name.as_str(), found) {
            ("lower", 0) => Self::Lower,
            ("upper", 0) => Self::Upper,
            ("title", 0) => Self::Title,
            ("kebab", 0) => Self::Kebab,
            ("snake", 0) => Self::Snake,
            ("camel", 0) => Self::Camel,
            ("pascal", 0) => Self::Pascal,
            ("capitalize", 0) => Self::Capitalize,
            ("trim", 0) => Self::Trim,
            ("skip_files", 0) => Self::SkipFiles,
            ("skip_folders", 0) => Self::SkipFolders,
            (
                "lower" | "upper" | "title" | "kebab" | "snake" | "camel" | "pascal"
                | "capitalize" | "trim" | "skip_files" | "skip_folders",
                _,
            ) => return Err(arity("0")),
            ("prefix" | "suffix" | "set" | "strip_prefix" | "strip_suffix", 1) => {
                let text = args.next().map_or(Err(arity("1")), string)?;
                match name.as_str() {
                    "prefix" => Self::Prefix(Template::parse(&text)?),
                    "suffix" => Self::Suffix(Template::parse(&text)?),
                    "set" => Self::Set(Template::parse(&text)?),
                    "strip_prefix" => Self::StripPrefix(text),
                    _ => Self::StripSuffix(text),
                }
            }
            ("prefix" | "suffix" | "set" | "strip_prefix" | "strip_suffix", _) => {
                return Err(arity("1"))
            }
            ("replace" | "regex", 2) => {
                let from = args.next().map_or(Err(arity("2")), string)?;
                let to = args.next().map_or(Err(arity("2")), string)?;
                if name == "replace" {
                    if from.is_empty() {
                        return Err(bad("search text must not be empty".into()));
                    }
                    Self::Replace(from, to)
                } else {
                    let re = Regex::new(&from)
                        .map_err(|e| TransformError::InvalidPattern(e.to_string()))?;
                    let to = translate_replacement(&to, &re);
                    Self::Regex(re, to)
                }
            }
            ("replace" | "regex", _) => return Err(arity("2")),
            ("slice", 1 | 2) => {
                let start = args.next().map_or(Err(arity("1 or 2")), int)?;
                let end = args.next().map(int).transpose()?;
                Self::Slice(start, end)
            }
            ("pad", 1 | 2) => {
                let width = args.next().map_or(Err(arity("1 or 2")), int)?;
                let width = usize::try_from(width)
                    .map_err(|_| bad(format!("width must not be negative, found {width}")))?;
                if width > MAX_PAD_WIDTH {
                    return Err(bad(format!("width must be at most {MAX_PAD_WIDTH}, found {width}")));
                }
                let fill = match args.next().map(string).transpose()? {
                    None => '0',
                    Some(s) => {
                        let mut chars = s.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => c,
                            _ => {
                                return Err(bad(format!(
                                    "fill must be one character, found \"{s}\""
                                )))
                            }
                        }
                    }
                };
                Self::Pad(width, fill)
            }
            ("slice" | "pad", _) => return Err(arity("1 or 2")),
            _ => return Err(TransformError::UnknownStep(name)),
        };

        Ok(step)
    }

    fn reads_counters(&self) -> bool {
        match self {
            Self::Prefix(t) | Self::Suffix(t) | Self::Set(t) => t.reads_counters(),
            _ => false,
        }
    }

    fn apply(&self, value: String, call: &TransformCall, ctx: &TransformContext) -> Flow {
        let next = match self {
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
            Self::Title => value.to_title_case(),
            Self::Kebab => value.to_kebab_case(),
            Self::Snake => value.to_snake_case(),
            Self::Camel => value.to_lower_camel_case(),
            Self::Pascal => value.to_pascal_case(),
            Self::Capitalize => {
                let mut chars = value.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => value,
                }
            }
            Self::Trim => value.trim().to_string(),
            Self::Prefix(t) => format!("{}{value}", t.render(&value, call, ctx)),
            Self::Suffix(t) => format!("{value}{}", t.render(&value, call, ctx)),
            Self::StripPrefix(p) => match value.strip_prefix(p.as_str()) {
                Some(rest) => rest.to_string(),
                None => value,
            },
            Self::StripSuffix(s) => match value.strip_suffix(s.as_str()) {
                Some(rest) => rest.to_string(),
                None => value,
            },
            Self::Replace(from, to) => value.replace(from.as_str(), to),
            Self::Regex(re, to) => re.replace_all(&value, to.as_str()).into_owned(),
            Self::Set(t) => t.render(&value, call, ctx),
            Self::Slice(start, end) => slice_chars(&value, *start, *end),
            Self::Pad(width, fill) => {
                let len = value.chars().count();
                if len >= *width {
                    value
                } else {
                    std::iter::repeat(*fill)
                        .take(width - len)
                        .chain(value.chars())
                        .collect()
                }
            }
            Self::SkipFiles if !ctx.is_folder => return Flow::Skip,
            Self::SkipFolders if ctx.is_folder => return Flow::Skip,
            Self::SkipFiles | Self::SkipFolders => value,
        };
        Flow::Continue(next)
    }
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`.
fn resolve_index(index: i64, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs() as usize)
    } else {
        (index as usize).min(len)
    }
}

fn slice_chars(value: &str, start: i64, end: Option<i64>) -> String {
    let len = value.chars().count();
    let from = resolve_index(start, len);
    let to = end.map_or(len, |end| resolve_index(end, len));
    if to <= from {
        return String::new();
    }
    value.chars().skip(from).take(to - from).collect()
}

/// A compiled pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
    reads_counters: bool,
}

impl Pipeline {
    pub fn compile(source: &str) -> Result<Self, TransformError> {
        let steps = parser::parse(source)?
            .into_iter()
            .map(Step::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let reads_counters = steps.iter().any(Step::reads_counters);
        debug!(steps = steps.len(), reads_counters, "Pipeline compiled");
        Ok(Self {
            steps,
            reads_counters,
        })
    }

    /// Run every step over `call.matched`.
    pub fn run(&self, call: &TransformCall, ctx: &TransformContext) -> String {
        let mut value = call.matched.clone();
        for step in &self.steps {
            match step.apply(value, call, ctx) {
                Flow::Continue(next) => value = next,
                Flow::Skip => return call.matched.clone(),
            }
        }
        value
    }
}

impl Transform for Pipeline {
    fn call(&self, call: TransformCall, ctx: TransformContext) -> TransformFuture {
        futures::future::ready(Ok(self.run(&call, &ctx))).boxed()
    }

    fn reads_counters(&self) -> bool {
        self.reads_counters
    }
}

/// [`ScriptEngine`] for the pipeline language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineEngine;

impl ScriptEngine for PipelineEngine {
    fn compile(&self, source: &str) -> Result<Arc<dyn Transform>, TransformError> {
        Ok(Arc::new(Pipeline::compile(source)?))
    }
}
