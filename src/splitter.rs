//! Line-oriented, quote-aware splitting of migration files into statements.
//!
//! This is a lexer, not a parser. Lines are trimmed and scanned one character at
//! a time; a semicolon ends a statement unless it sits inside a single- or
//! double-quoted literal. A doubled quote inside a literal of the same kind is an
//! escaped quote. Lines that begin with `--`, `#` or `/*` are dropped whole, and a
//! block comment is only recognised on its opening line.

const COMMENT_PREFIXES: [&str; 3] = ["--", "#", "/*"];

/// Split raw SQL text into trimmed, non-empty statements in source order.
///
/// Trailing text without a closing semicolon becomes the last statement.
///
/// ```
/// use sqlx_conn_registry::split_statements;
///
/// let statements = split_statements("INSERT INTO t VALUES ('a;b');\nINSERT INTO t VALUES ('c');");
/// assert_eq!(
///     statements,
///     vec!["INSERT INTO t VALUES ('a;b')", "INSERT INTO t VALUES ('c')"]
/// );
/// ```
pub fn split_statements(sql: &str) -> Vec<String> {
   let mut statements = Vec::new();
   let mut current = String::new();
   let mut quote: Option<char> = None;

   for line in sql.lines() {
      let line = line.trim();
      if line.is_empty() || is_comment_line(line) {
         continue;
      }

      let mut chars = line.chars().peekable();
      while let Some(ch) = chars.next() {
         match quote {
            None if ch == '\'' || ch == '"' => {
               quote = Some(ch);
               current.push(ch);
            }
            Some(open) if ch == open => {
               if chars.peek() == Some(&open) {
                  // Doubled quote, keep both and stay inside the literal
                  chars.next();
                  current.push(open);
                  current.push(open);
               } else {
                  quote = None;
                  current.push(ch);
               }
            }
            None if ch == ';' => finish_statement(&mut current, &mut statements),
            _ => current.push(ch),
         }
      }

      if !current.is_empty() {
         current.push('\n');
      }
   }

   finish_statement(&mut current, &mut statements);
   statements
}

fn is_comment_line(line: &str) -> bool {
   COMMENT_PREFIXES
      .iter()
      .any(|prefix| line.starts_with(prefix))
}

fn finish_statement(current: &mut String, statements: &mut Vec<String>) {
   let statement = current.trim();
   if !statement.is_empty() {
      statements.push(statement.to_string());
   }
   current.clear();
}
