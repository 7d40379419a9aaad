//! `{placeholder}` templates used by `prefix`, `suffix` and `set`.
use super::{TransformCall, TransformContext, TransformError};
use chrono::format::{Item, StrftimeItems};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest pad width accepted by templates and the `pad` step.
pub const MAX_PAD_WIDTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    Value,
    Match,
    Offset,
    Global,
    Folder,
    Kind,
    Size,
    Modified,
    Created,
    Group(usize),
}

impl Var {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "value" => Self::Value,
            "match" => Self::Match,
            "offset" => Self::Offset,
            "global" => Self::Global,
            "folder" => Self::Folder,
            "kind" => Self::Kind,
            "size" => Self::Size,
            "modified" => Self::Modified,
            "created" => Self::Created,
            _ => match name.parse::<usize>() {
                Ok(n @ 1..=9) => Self::Group(n),
                _ => return None,
            },
        })
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Offset | Self::Global | Self::Folder | Self::Size)
    }

    fn is_date(self) -> bool {
        matches!(self, Self::Modified | Self::Created)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Format {
    None,
    Width(usize),
    Date(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Var(Var, Format),
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<Part>,
}

fn syntax(position: usize, message: impl Into<String>) -> TransformError {
    TransformError::Syntax {
        position,
        message: message.into(),
    }
}

impl Template {
    /// Compile `source`. Positions in errors are character offsets into it.
    pub fn parse(source: &str) -> Result<Self, TransformError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().enumerate().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, n)| n) == Some('{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek().map(|&(_, n)| n) == Some('}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(syntax(i, "unmatched `}`")),
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, ch)) => body.push(ch),
                            None => return Err(syntax(i, "unterminated placeholder")),
                        }
                    }
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(Self::placeholder(&body, i)?);
                }
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }

        Ok(Self { parts })
    }

    fn placeholder(body: &str, position: usize) -> Result<Part, TransformError> {
        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (name.trim(), Some(spec)),
            None => (body.trim(), None),
        };
        let var = Var::parse(name).ok_or_else(|| TransformError::UnknownPlaceholder(name.into()))?;

        let format = match spec {
            None if var.is_date() => Format::Date(DEFAULT_DATE_FORMAT.to_string()),
            None => Format::None,
            Some(spec) if var.is_numeric() => {
                let width = spec
                    .parse::<usize>()
                    .map_err(|_| syntax(position, format!("`{spec}` is not a pad width")))?;
                if width > MAX_PAD_WIDTH {
                    return Err(syntax(
                        position,
                        format!("pad width {width} exceeds {MAX_PAD_WIDTH}"),
                    ));
                }
                Format::Width(width)
            }
            Some(spec) if var.is_date() => {
                if StrftimeItems::new(spec).any(|item| matches!(item, Item::Error)) {
                    return Err(syntax(position, format!("invalid date format `{spec}`")));
                }
                Format::Date(spec.to_string())
            }
            Some(_) => return Err(syntax(position, format!("`{name}` takes no format"))),
        };

        Ok(Part::Var(var, format))
    }

    /// Whether rendering depends on the walk counters.
    pub fn reads_counters(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::Var(Var::Global | Var::Folder, _)))
    }

    /// Render with `value` as the current pipeline value.
    pub fn render(&self, value: &str, call: &TransformCall, ctx: &TransformContext) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Var(var, format) => render_var(&mut out, *var, format, value, call, ctx),
            }
        }
        out
    }
}

fn render_var(
    out: &mut String,
    var: Var,
    format: &Format,
    value: &str,
    call: &TransformCall,
    ctx: &TransformContext,
) {
    let number = match var {
        Var::Value => return out.push_str(value),
        Var::Match => return out.push_str(&call.matched),
        Var::Kind => return out.push_str(if ctx.is_folder { "folder" } else { "file" }),
        Var::Group(n) => {
            if let Some(Some(group)) = call.groups.get(n - 1) {
                out.push_str(group);
            }
            return;
        }
        Var::Modified | Var::Created => {
            let meta = ctx.metadata.as_ref();
            let stamp = match var {
                Var::Modified => meta.and_then(|m| m.modified),
                _ => meta.and_then(|m| m.created),
            };
            if let (Some(stamp), Format::Date(fmt)) = (stamp, format) {
                out.push_str(&stamp.format(fmt).to_string());
            }
            return;
        }
        Var::Offset => Some(call.offset as u64),
        Var::Global => Some(ctx.global_index as u64),
        Var::Folder => ctx.file_in_folder_index.map(|n| n as u64),
        Var::Size => Some(ctx.metadata.as_ref().map_or(0, |m| m.size)),
    };

    if let Some(number) = number {
        match format {
            Format::Width(width) => out.push_str(&format!("{number:0width$}", width = *width)),
            _ => out.push_str(&number.to_string()),
        }
    }
}
