//! Named placeholder rewriting.
//!
//! sqlx binds SQLite arguments by position only, so `@name`, `:name` and
//! `$name` placeholders are rewritten to `?N`, numbered by first
//! appearance. String literals, quoted identifiers and comments are left
//! untouched. Bare `?`, `?N` and `$N` placeholders are reported so callers
//! can refuse statements that mix both styles.

/// Statement text ready for sqlx plus the placeholder names in bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RewrittenStatement {
    pub sql: String,
    pub names: Vec<String>,
    /// The original text also contains positional placeholders.
    pub positional: bool,
}

pub(crate) fn rewrite_named_placeholders(sql: &str) -> RewrittenStatement {
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut positional = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                for (_, q) in chars.by_ref() {
                    out.push(q);
                    if q == c {
                        break;
                    }
                }
            }
            '[' => {
                out.push(c);
                for (_, q) in chars.by_ref() {
                    out.push(q);
                    if q == ']' {
                        break;
                    }
                }
            }
            '-' if matches!(chars.peek(), Some((_, '-'))) => {
                out.push(c);
                for (_, q) in chars.by_ref() {
                    out.push(q);
                    if q == '\n' {
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                out.push(c);
                let mut prev = '\0';
                for (_, q) in chars.by_ref() {
                    out.push(q);
                    if prev == '*' && q == '/' {
                        break;
                    }
                    prev = q;
                }
            }
            '@' | ':' | '$'
                if matches!(chars.peek(), Some((_, n)) if n.is_alphabetic() || *n == '_') =>
            {
                let mut end = start + c.len_utf8();
                while let Some((i, n)) = chars.peek().copied() {
                    if n.is_alphanumeric() || n == '_' {
                        end = i + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &sql[start..end];
                let position = match names.iter().position(|n| n == name) {
                    Some(i) => i + 1,
                    None => {
                        names.push(name.to_string());
                        names.len()
                    }
                };
                out.push('?');
                out.push_str(&position.to_string());
            }
            '?' => {
                positional = true;
                out.push(c);
            }
            '$' if matches!(chars.peek(), Some((_, n)) if n.is_ascii_digit()) => {
                positional = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    RewrittenStatement {
        sql: out,
        names,
        positional,
    }
}
