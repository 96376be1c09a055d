//! Minimal `#define` / `#if` resolver for WGSL templates
//!
//! WGSL has no preprocessor, so shader variants are expressed as numeric
//! defines plus conditional blocks which are resolved here before the text
//! reaches naga. Supported directives:
//!
//! - `#define NAME 123`
//! - `#if NAME == X`, `#if NAME != X` (X is an integer or a defined name)
//! - `#elif ...` with the same condition syntax, `#else`, `#endif`
//!
//! Directive lines and inactive lines are replaced by empty lines so that
//! line numbers in compiler diagnostics still match the template.

use std::collections::HashMap;

use crate::error::{BlitError, BlitResult};

struct Block {
    /// Enclosing block is emitting
    parent_active: bool,
    /// Some branch of this block has already been taken
    taken: bool,
    /// Current branch is emitting
    active: bool,
    seen_else: bool,
}

/// Resolve all directives in `source` and return plain WGSL
pub fn preprocess(source: &str) -> BlitResult<String> {
    let mut defines: HashMap<&str, i64> = HashMap::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut output = String::with_capacity(source.len());

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let active = stack.last().is_none_or(|b| b.active);
        let trimmed = line.trim_start();

        let Some(directive) = trimmed.strip_prefix('#') else {
            if active {
                output.push_str(line);
            }
            output.push('\n');
            continue;
        };

        let (keyword, rest) = directive
            .split_once(char::is_whitespace)
            .unwrap_or((directive, ""));
        let rest = rest.trim();

        match keyword {
            "define" => {
                if active {
                    let (name, value) = parse_define(rest, line_no)?;
                    if defines.insert(name, value).is_some() {
                        return Err(error(line_no, format!("`{name}` is already defined")));
                    }
                }
            }
            "if" => {
                let cond = active && evaluate(rest, &defines, line_no)?;
                stack.push(Block {
                    parent_active: active,
                    taken: cond,
                    active: cond,
                    seen_else: false,
                });
            }
            "elif" => {
                let block = stack
                    .last_mut()
                    .ok_or_else(|| error(line_no, "#elif without #if"))?;
                if block.seen_else {
                    return Err(error(line_no, "#elif after #else"));
                }
                let cond = block.parent_active
                    && !block.taken
                    && evaluate(rest, &defines, line_no)?;
                block.active = cond;
                block.taken |= cond;
            }
            "else" => {
                let block = stack
                    .last_mut()
                    .ok_or_else(|| error(line_no, "#else without #if"))?;
                if block.seen_else {
                    return Err(error(line_no, "duplicate #else"));
                }
                block.seen_else = true;
                block.active = block.parent_active && !block.taken;
                block.taken = true;
            }
            "endif" => {
                stack
                    .pop()
                    .ok_or_else(|| error(line_no, "#endif without #if"))?;
            }
            other => {
                return Err(error(line_no, format!("unknown directive `#{other}`")));
            }
        }
        output.push('\n');
    }

    if !stack.is_empty() {
        return Err(BlitError::compilation(format!(
            "{} unterminated #if block(s)",
            stack.len()
        )));
    }
    Ok(output)
}

fn error(line: usize, msg: impl AsRef<str>) -> BlitError {
    BlitError::compilation(format!("line {line}: {}", msg.as_ref()))
}

fn parse_define(rest: &str, line: usize) -> BlitResult<(&str, i64)> {
    let mut parts = rest.split_whitespace();
    let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(error(line, "expected `#define NAME VALUE`"));
    };
    let value = value
        .parse()
        .map_err(|_| error(line, format!("`{value}` is not an integer")))?;
    Ok((name, value))
}

fn evaluate(cond: &str, defines: &HashMap<&str, i64>, line: usize) -> BlitResult<bool> {
    let mut parts = cond.split_whitespace();
    let (Some(lhs), Some(op), Some(rhs), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(error(line, format!("malformed condition `{cond}`")));
    };

    let lookup = |token: &str| -> BlitResult<i64> {
        if let Ok(value) = token.parse() {
            return Ok(value);
        }
        defines
            .get(token)
            .copied()
            .ok_or_else(|| error(line, format!("`{token}` is not defined")))
    };

    let (lhs, rhs) = (lookup(lhs)?, lookup(rhs)?);
    match op {
        "==" => Ok(lhs == rhs),
        "!=" => Ok(lhs != rhs),
        _ => Err(error(line, format!("unsupported operator `{op}`"))),
    }
}
