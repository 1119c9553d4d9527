//! Command-line tokenizing and argument parsing helpers

use crate::error::{Result, TableError};
use crate::query::{CompareOp, Condition};

/// Split a command line into arguments.
///
/// Whitespace separates arguments. A double-quoted segment keeps its spaces;
/// inside quotes `\"` and `\\` are escapes. Quotes may appear mid-argument:
/// `name="Ada Lovelace"` is one argument.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(TableError::syntax("unbalanced quotes")),
                        },
                        Some(other) => current.push(other),
                        None => return Err(TableError::syntax("unbalanced quotes")),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }

    if in_arg {
        args.push(current);
    }
    Ok(args)
}

/// Split `<col>=<value>` with the condition grammar; any operator other
/// than `=`, or an empty column or value, is a syntax error.
pub fn parse_assignment(token: &str) -> Result<(String, String)> {
    match Condition::parse(token) {
        Ok(Condition {
            column,
            op: CompareOp::Eq,
            value,
        }) => Ok((column, value)),
        _ => Err(TableError::syntax("each field must be <col>=<value>")),
    }
}

pub(crate) fn parse_assignments<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<(String, String)>> {
    tokens.iter().map(|t| parse_assignment(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("  INSERT app.users  name=ada age=36 ").unwrap(),
            vec!["INSERT", "app.users", "name=ada", "age=36"]
        );
        assert_eq!(
            tokenize(r#"INSERT t name="Ada Lovelace" note="say \"hi\"""#).unwrap(),
            vec!["INSERT", "t", "name=Ada Lovelace", "note=say \"hi\""]
        );
        assert_eq!(tokenize(r#"x "" y"#).unwrap(), vec!["x", "", "y"]);
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize(r#"INSERT t name="open"#).is_err());
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            parse_assignment("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());

        for token in ["note=", "s>=5", "a<b=5", "n<=1"] {
            assert!(
                matches!(parse_assignment(token), Err(TableError::Syntax(_))),
                "{token}"
            );
        }
    }
}
