//! Tokenizer and parser for the pipeline language.
//!
//! ```text
//! script := step ( '|' step )*
//! step   := ident [ '(' [ arg ( ',' arg )* ] ')' ]
//! arg    := string | integer
//! ```
//!
//! Positions in errors are character offsets into the source.
use super::TransformError;

/// A literal argument of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Str(String),
    Int(i64),
}

/// One parsed step, before its arguments are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAst {
    /// Step name with `-` normalised to `_`.
    pub name: String,
    pub args: Vec<Arg>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Pipe,
    LParen,
    RParen,
    Comma,
}

fn syntax(position: usize, message: impl Into<String>) -> TransformError {
    TransformError::Syntax {
        position,
        message: message.into(),
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, TransformError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push((start, Token::Pipe));
                i += 1;
            }
            '(' => {
                tokens.push((start, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((start, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((start, Token::Comma));
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    let Some(&ch) = chars.get(i) else {
                        return Err(syntax(start, "unterminated string"));
                    };
                    i += 1;
                    if ch == quote {
                        break;
                    }
                    if ch == '\\' {
                        let Some(&escaped) = chars.get(i) else {
                            return Err(syntax(start, "unterminated string"));
                        };
                        i += 1;
                        let unescaped = match escaped {
                            'n' => '\n',
                            't' => '\t',
                            '\\' | '"' | '\'' => escaped,
                            // Unknown escapes stay verbatim so regex classes like `\d` survive.
                            other => {
                                text.push('\\');
                                other
                            }
                        };
                        text.push(unescaped);
                    } else {
                        text.push(ch);
                    }
                }
                tokens.push((start, Token::Str(text)));
            }
            '-' | '0'..='9' => {
                let mut end = i + 1;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                let literal: String = chars[i..end].iter().collect();
                let value = literal
                    .parse::<i64>()
                    .map_err(|_| syntax(start, format!("invalid number `{literal}`")))?;
                tokens.push((start, Token::Int(value)));
                i = end;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i + 1;
                while end < chars.len()
                    && (chars[end].is_alphanumeric() || chars[end] == '_' || chars[end] == '-')
                {
                    end += 1;
                }
                let ident: String = chars[i..end].iter().collect();
                tokens.push((start, Token::Ident(ident.replace('-', "_"))));
                i = end;
            }
            other => return Err(syntax(start, format!("unexpected character `{other}`"))),
        }
    }

    Ok(tokens)
}

/// Parse `source` into its list of steps.
pub fn parse(source: &str) -> Result<Vec<StepAst>, TransformError> {
    let tokens = tokenize(source)?;
    let end = source.chars().count();
    let mut steps = Vec::new();
    let mut pos = 0;

    loop {
        let (position, name) = match tokens.get(pos) {
            Some((p, Token::Ident(name))) => (*p, name.clone()),
            Some((p, _)) => return Err(syntax(*p, "expected a step name")),
            None => return Err(syntax(end, "expected a step name")),
        };
        pos += 1;

        let mut args = Vec::new();
        if matches!(tokens.get(pos), Some((_, Token::LParen))) {
            pos += 1;
            if matches!(tokens.get(pos), Some((_, Token::RParen))) {
                pos += 1;
            } else {
                loop {
                    match tokens.get(pos) {
                        Some((_, Token::Str(s))) => args.push(Arg::Str(s.clone())),
                        Some((_, Token::Int(n))) => args.push(Arg::Int(*n)),
                        Some((p, _)) => return Err(syntax(*p, "expected an argument")),
                        None => return Err(syntax(end, "expected an argument")),
                    }
                    pos += 1;
                    match tokens.get(pos) {
                        Some((_, Token::Comma)) => pos += 1,
                        Some((_, Token::RParen)) => {
                            pos += 1;
                            break;
                        }
                        Some((p, _)) => return Err(syntax(*p, "expected `,` or `)`")),
                        None => return Err(syntax(end, "missing `)`")),
                    }
                }
            }
        }

        steps.push(StepAst {
            name,
            args,
            position,
        });

        match tokens.get(pos) {
            None => break,
            Some((_, Token::Pipe)) => pos += 1,
            Some((p, _)) => return Err(syntax(*p, "expected `|` between steps")),
        }
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_steps() {
        let steps = parse("lower | trim").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "lower");
        assert!(steps[0].args.is_empty());
        assert_eq!(steps[1].name, "trim");
        assert_eq!(steps[1].position, 8);
    }

    #[test]
    fn test_parse_arguments() {
        let steps = parse(r#"replace(" ", '_') | pad(3, "0") | slice(-4)"#).unwrap();
        assert_eq!(
            steps[0].args,
            vec![Arg::Str(" ".into()), Arg::Str("_".into())]
        );
        assert_eq!(steps[1].args, vec![Arg::Int(3), Arg::Str("0".into())]);
        assert_eq!(steps[2].args, vec![Arg::Int(-4)]);
    }

    #[test]
    fn test_parse_escapes() {
        let steps = parse(r##"set("a\"b\n") | regex("\d+", "#")"##).unwrap();
        assert_eq!(steps[0].args, vec![Arg::Str("a\"b\n".into())]);
        assert_eq!(steps[1].args[0], Arg::Str("\\d+".into()));
    }

    #[test]
    fn test_parse_dash_names_normalised() {
        let steps = parse("strip-prefix(\"x\")").unwrap();
        assert_eq!(steps[0].name, "strip_prefix");
    }

    #[test]
    fn test_parse_empty_call() {
        let steps = parse("upper()").unwrap();
        assert!(steps[0].args.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(""), Err(TransformError::Syntax { .. })));
        assert!(matches!(parse("lower |"), Err(TransformError::Syntax { .. })));
        assert!(matches!(parse("lower upper"), Err(TransformError::Syntax { .. })));
        assert!(matches!(
            parse("prefix(\"x\""),
            Err(TransformError::Syntax { .. })
        ));
        assert!(matches!(
            parse("set(\"open"),
            Err(TransformError::Syntax { position: 4, .. })
        ));
        assert!(matches!(parse("s => s"), Err(TransformError::Syntax { .. })));
    }
}
