//! Grammar-level parsing of one command line (spec.md §6 EBNF excerpt).
//!
//! This stage only recognizes the shape `[handle ["," handle]] "=" op "(" args ")"`
//! and splits `args` on top-level commas; it does not know what any
//! argument *means* (column reference, handle, literal int, or `"null"`) —
//! that resolution is the dispatcher's job, mirroring how the reference
//! splits `parse.c` (syntax) from `db_manager.c` (semantics).

use crate::error::{CsError, CsResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub handles: Vec<String>,
    pub op: String,
    pub args: Vec<String>,
}

/// Parses one line, returning `None` for a comment (`--...`) or blank line.
pub fn parse_line(line: &str) -> CsResult<Option<ParsedCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("--") {
        return Ok(None);
    }

    let (handle_part, rest) = match line.split_once('=') {
        Some((h, r)) => (Some(h.trim()), r.trim()),
        None => (None, line),
    };

    let open = rest
        .find('(')
        .ok_or_else(|| CsError::IncorrectFormat(format!("missing '(' in: {line}")))?;
    if !rest.ends_with(')') {
        return Err(CsError::IncorrectFormat(format!("missing closing ')' in: {line}")));
    }

    let op = rest[..open].trim().to_string();
    if op.is_empty() {
        return Err(CsError::UnknownCommand(line.to_string()));
    }

    let args_str = &rest[open + 1..rest.len() - 1];
    let args: Vec<String> = if args_str.trim().is_empty() {
        Vec::new()
    } else {
        args_str.split(',').map(|s| s.trim().to_string()).collect()
    };

    let handles = match handle_part {
        Some(h) if !h.is_empty() => h.split(',').map(|s| s.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    Ok(Some(ParsedCommand { handles, op, args }))
}

/// Parses `"null"` as `None`, otherwise a decimal `i32` bound.
pub fn parse_int_or_null(s: &str) -> CsResult<Option<i32>> {
    if s == "null" {
        Ok(None)
    } else {
        s.parse::<i32>()
            .map(Some)
            .map_err(|_| CsError::IncorrectFormat(format!("expected int or null, got '{s}'")))
    }
}

/// Strips one layer of surrounding `"`, used for the quoted name arguments
/// in `create(...)`.
pub fn unquote(s: &str) -> &str {
    s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        assert_eq!(parse_line("-- a comment").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn bare_op_without_handle() {
        let cmd = parse_line("print(db1.t1.a)").unwrap().unwrap();
        assert!(cmd.handles.is_empty());
        assert_eq!(cmd.op, "print");
        assert_eq!(cmd.args, vec!["db1.t1.a"]);
    }

    #[test]
    fn single_handle_assignment() {
        let cmd = parse_line("h1=select(db1.t1.a,2,5)").unwrap().unwrap();
        assert_eq!(cmd.handles, vec!["h1"]);
        assert_eq!(cmd.op, "select");
        assert_eq!(cmd.args, vec!["db1.t1.a", "2", "5"]);
    }

    #[test]
    fn two_handle_assignment_for_join() {
        let cmd = parse_line("h1,h2=join(v1,p1,v2,p2,hash)").unwrap().unwrap();
        assert_eq!(cmd.handles, vec!["h1", "h2"]);
    }

    #[test]
    fn null_bound_and_int_bound() {
        assert_eq!(parse_int_or_null("null").unwrap(), None);
        assert_eq!(parse_int_or_null("42").unwrap(), Some(42));
        assert!(parse_int_or_null("abc").is_err());
    }

    #[test]
    fn missing_parens_is_incorrect_format() {
        assert!(parse_line("select db1.t1.a, 2, 5)").is_err());
        assert!(parse_line("select(db1.t1.a, 2, 5").is_err());
    }

    #[test]
    fn unquote_strips_one_layer() {
        assert_eq!(unquote("\"t1\""), "t1");
        assert_eq!(unquote("t1"), "t1");
    }
}
