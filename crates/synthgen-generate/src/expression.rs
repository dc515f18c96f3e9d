//! Parsing of `name(arg, arg, ...)` leaf expressions.
//!
//! Parsing is purely structural: the function name and the raw argument
//! substrings are extracted here, evaluation happens in [`crate::functions`]
//! and only for the arguments a function actually needs.

/// A function call recognized in a template leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression<'a> {
    /// Function name as written, e.g. `datetime:simple`.
    pub name: &'a str,
    /// Everything between the first `(` and the last `)`.
    pub inner: &'a str,
    /// `inner` split at top-level commas, trimmed.
    pub raw_args: Vec<&'a str>,
}

impl<'a> Expression<'a> {
    /// Parse `text` as a function call, `None` when it is not one.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.trim();
        let open = text.find('(')?;
        let close = text.rfind(')')?;
        if close < open {
            return None;
        }
        let name = text[..open].trim_matches(|ch| ch == '"' || ch == '\'');
        if !is_function_name(name) {
            return None;
        }
        let inner = &text[open + 1..close];
        Some(Self {
            name,
            inner,
            raw_args: split_args(inner),
        })
    }

    /// Expression for a bare keyword such as `int` or `uuid`.
    pub fn bare(name: &'a str) -> Self {
        Self {
            name,
            inner: "",
            raw_args: Vec::new(),
        }
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.raw_args.get(index).copied()
    }

    pub fn arg_count(&self) -> usize {
        self.raw_args.len()
    }
}

fn is_function_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == ':')
}

/// Split an argument list at commas that are outside any bracket group and
/// outside quotes. Empty input yields no arguments.
///
/// A quote only opens a quoted run where a value can start: at the start of
/// an argument or right after `(`, `[`, `{`, `,` or `:`. An apostrophe inside
/// a word (`O'Brien`) is plain text.
pub fn split_args(value: &str) -> Vec<&str> {
    if value.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut previous: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in value.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
                previous = Some(ch);
            }
            continue;
        }
        match ch {
            '"' | '\'' if opens_value(previous) => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(value[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
        if !ch.is_whitespace() {
            previous = Some(ch);
        }
    }
    args.push(value[start..].trim());
    args
}

fn opens_value(previous: Option<char>) -> bool {
    matches!(previous, None | Some('(' | '[' | '{' | ',' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_only_top_level_commas() {
        let args = split_args("upper(alpha(3)), seq(1), COMMA");
        assert_eq!(args, vec!["upper(alpha(3))", "seq(1)", "COMMA"]);
    }

    #[test]
    fn keeps_quoted_and_braced_commas() {
        let args = split_args(r#"{"a":"int(1,2)","b":[1,2]}, 3, 'x,y'"#);
        assert_eq!(
            args,
            vec![r#"{"a":"int(1,2)","b":[1,2]}"#, "3", "'x,y'"]
        );
    }

    #[test]
    fn apostrophe_inside_a_word_is_text() {
        let args = split_args("O'Brien, SPACE, alpha(3)");
        assert_eq!(args, vec!["O'Brien", "SPACE", "alpha(3)"]);

        let args = split_args("now, yyyy-MM-dd'T'HH:mm, UTC");
        assert_eq!(args, vec!["now", "yyyy-MM-dd'T'HH:mm", "UTC"]);
    }

    #[test]
    fn empty_parentheses_have_no_args() {
        let expr = Expression::parse("seq()").expect("expression");
        assert_eq!(expr.name, "seq");
        assert_eq!(expr.arg_count(), 0);
    }

    #[test]
    fn parses_name_with_colon() {
        let expr = Expression::parse("datetime:simple(2018-01-01 00:00:00, 2018-02-01 00:00:00)")
            .expect("expression");
        assert_eq!(expr.name, "datetime:simple");
        assert_eq!(expr.raw_args.len(), 2);
    }

    #[test]
    fn rejects_prose_with_parentheses() {
        assert!(Expression::parse("hello (world)").is_none());
        assert!(Expression::parse("broken)(").is_none());
    }
}
