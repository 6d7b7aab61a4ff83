// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Splits a raw command line into argument tokens.
//!
//! One linear scan over the chars of the line. At each position the cases are tried in
//! this order:
//! 1. `"..."` span. Backslash pairs are honored, and unescaped when the
//!    [`EscapePolicy`] says so.
//! 2. `'...'` span. Taken verbatim.
//! 3. Whitespace. Ends the current token, never emitted.
//! 4. Any other control char. This is an error.
//! 5. Bare word. Runs until whitespace or a quote, backslash pairs handled like in a
//!    double quoted span.
//!
//! Spans and words with no whitespace between them glue into a single token, so
//! `--value='a'"b"c` is the one token `--value=abc`.

use crate::TokenizeError;

pub const DOUBLE_QUOTE: char = '"';
pub const SINGLE_QUOTE: char = '\'';
pub const BACKSLASH: char = '\\';

/// What happens to `\x` pairs inside double quotes and bare words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapePolicy {
    /// `\x` becomes `x`.
    Unescape,
    /// `\x` is kept as is, which leaves Windows paths like `C:\temp` alone. Pairs are
    /// still recognized, so `"a \" b"` is one token.
    Preserve,
}

impl EscapePolicy {
    /// [`EscapePolicy::Unescape`] on unix, [`EscapePolicy::Preserve`] elsewhere.
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(unix) {
            EscapePolicy::Unescape
        } else {
            EscapePolicy::Preserve
        }
    }
}

impl Default for EscapePolicy {
    fn default() -> Self { Self::platform_default() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenizerOptions {
    pub escape_policy: EscapePolicy,
}

impl TokenizerOptions {
    /// Unix always unescapes. Everywhere else, unescape only if `escape_on_windows` is
    /// set.
    #[must_use]
    pub fn with_escape_on_windows(escape_on_windows: bool) -> Self {
        let escape_policy = if cfg!(unix) || escape_on_windows {
            EscapePolicy::Unescape
        } else {
            EscapePolicy::Preserve
        };
        Self { escape_policy }
    }
}

/// A token along with where it started in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Escape resolved text.
    pub text: String,
    /// Char index of the first char of the fragment.
    pub start: usize,
    /// The quote char, if the fragment opened with one.
    pub quote: Option<char>,
}

/// Result of [`tokenize_partial`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialLine {
    /// Tokens before the one under the cursor.
    pub complete: Vec<String>,
    /// The token under the cursor. Empty when the line ends in whitespace.
    pub fragment: Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Strict,
    /// An unterminated quote is fine, it just runs to the end of the line.
    Partial,
}

struct Span {
    text: String,
    end: usize,
    terminated: bool,
}

/// Tokenize with [`TokenizerOptions::default`].
///
/// # Errors
///
/// See [`tokenize_with`].
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    tokenize_with(line, &TokenizerOptions::default())
}

/// Empty and whitespace only lines produce no tokens. `--` passes through untouched.
///
/// # Errors
///
/// Returns [`TokenizeError`] for unterminated quotes and control chars outside quotes.
pub fn tokenize_with(
    line: &str,
    options: &TokenizerOptions,
) -> Result<Vec<String>, TokenizeError> {
    match scan(line, options, ScanMode::Strict) {
        Ok((mut tokens, pending)) => {
            tokens.extend(pending);
            Ok(tokens.into_iter().map(|it| it.text).collect())
        }
        Err(err) => {
            tracing::warn!(message = "tokenize failed", %err, line);
            Err(err)
        }
    }
}

/// Same as [`tokenize`] but only reports whether the line is well formed.
#[must_use]
pub fn verify(line: &str) -> bool {
    scan(line, &TokenizerOptions::default(), ScanMode::Strict).is_ok()
}

/// Tokenize the text before the cursor, for completion. The last token is the one being
/// typed, and may have an unterminated quote.
///
/// # Errors
///
/// Returns [`TokenizeError::InvalidCharacter`] for control chars outside quotes.
pub fn tokenize_partial(
    prefix: &str,
    options: &TokenizerOptions,
) -> Result<PartialLine, TokenizeError> {
    let (complete, pending) = scan(prefix, options, ScanMode::Partial)?;
    let fragment = pending.unwrap_or_else(|| Fragment {
        text: String::new(),
        start: prefix.chars().count(),
        quote: None,
    });
    Ok(PartialLine {
        complete: complete.into_iter().map(|it| it.text).collect(),
        fragment,
    })
}

/// Wrap `token` in quotes if it would not survive [`tokenize`] as a single token.
#[must_use]
pub fn quote_if_needed(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token.chars().any(|ch| {
            ch.is_whitespace()
                || ch.is_control()
                || matches!(ch, DOUBLE_QUOTE | SINGLE_QUOTE | BACKSLASH)
        });
    match needs_quotes {
        false => token.to_string(),
        true if !token.contains(SINGLE_QUOTE) => quote_with(token, SINGLE_QUOTE),
        true => quote_with(token, DOUBLE_QUOTE),
    }
}

/// Wrap `token` in `quote`. Falls back to double quotes when a single quoted span can't
/// hold the token.
#[must_use]
pub fn quote_with(token: &str, quote: char) -> String {
    if quote == SINGLE_QUOTE && !token.contains(SINGLE_QUOTE) {
        return format!("{SINGLE_QUOTE}{token}{SINGLE_QUOTE}");
    }
    let mut acc = String::with_capacity(token.len() + 2);
    acc.push(DOUBLE_QUOTE);
    for ch in token.chars() {
        if matches!(ch, DOUBLE_QUOTE | BACKSLASH) {
            acc.push(BACKSLASH);
        }
        acc.push(ch);
    }
    acc.push(DOUBLE_QUOTE);
    acc
}

fn scan(
    line: &str,
    options: &TokenizerOptions,
    mode: ScanMode,
) -> Result<(Vec<Fragment>, Option<Fragment>), TokenizeError> {
    let chars: Vec<char> = line.chars().collect();
    let policy = options.escape_policy;
    let mut tokens = vec![];
    let mut pending: Option<Fragment> = None;
    let mut index = 0;

    while let Some(&ch) = chars.get(index) {
        match ch {
            DOUBLE_QUOTE => {
                let span = scan_double_quoted(&chars, index + 1, policy);
                if !span.terminated && mode == ScanMode::Strict {
                    return Err(TokenizeError::UnterminatedDoubleQuote { offset: index });
                }
                start_or_extend(&mut pending, index, Some(ch)).text += &span.text;
                index = span.end;
            }
            SINGLE_QUOTE => {
                let span = scan_single_quoted(&chars, index + 1);
                if !span.terminated && mode == ScanMode::Strict {
                    return Err(TokenizeError::UnterminatedSingleQuote { offset: index });
                }
                start_or_extend(&mut pending, index, Some(ch)).text += &span.text;
                index = span.end;
            }
            _ if ch.is_whitespace() => {
                tokens.extend(pending.take());
                index += 1;
            }
            _ if ch.is_control() => {
                return Err(TokenizeError::InvalidCharacter { offset: index, ch });
            }
            _ => {
                let span = scan_bare_word(&chars, index, policy);
                start_or_extend(&mut pending, index, None).text += &span.text;
                index = span.end;
            }
        }
    }

    Ok((tokens, pending))
}

fn start_or_extend(
    pending: &mut Option<Fragment>,
    start: usize,
    quote: Option<char>,
) -> &mut Fragment {
    pending.get_or_insert_with(|| Fragment {
        text: String::new(),
        start,
        quote,
    })
}

/// `index` is just past the opening quote.
fn scan_double_quoted(chars: &[char], mut index: usize, policy: EscapePolicy) -> Span {
    let mut text = String::new();
    while let Some(&ch) = chars.get(index) {
        match ch {
            DOUBLE_QUOTE => {
                return Span {
                    text,
                    end: index + 1,
                    terminated: true,
                };
            }
            BACKSLASH => index = push_escape_pair(chars, index, policy, &mut text),
            _ => {
                text.push(ch);
                index += 1;
            }
        }
    }
    Span {
        text,
        end: index,
        terminated: false,
    }
}

/// `index` is just past the opening quote.
fn scan_single_quoted(chars: &[char], start: usize) -> Span {
    let rest = chars.get(start..).unwrap_or_default();
    match rest.iter().position(|ch| *ch == SINGLE_QUOTE) {
        Some(len) => Span {
            text: rest[..len].iter().collect(),
            end: start + len + 1,
            terminated: true,
        },
        None => Span {
            text: rest.iter().collect(),
            end: chars.len(),
            terminated: false,
        },
    }
}

fn scan_bare_word(chars: &[char], mut index: usize, policy: EscapePolicy) -> Span {
    let mut text = String::new();
    while let Some(&ch) = chars.get(index) {
        match ch {
            DOUBLE_QUOTE | SINGLE_QUOTE => break,
            BACKSLASH => index = push_escape_pair(chars, index, policy, &mut text),
            _ if ch.is_whitespace() || ch.is_control() => break,
            _ => {
                text.push(ch);
                index += 1;
            }
        }
    }
    Span {
        text,
        end: index,
        terminated: true,
    }
}

/// `chars[index]` is a backslash. Returns the index after the pair. A lone trailing
/// backslash is literal.
fn push_escape_pair(
    chars: &[char],
    index: usize,
    policy: EscapePolicy,
    text: &mut String,
) -> usize {
    let Some(&escaped) = chars.get(index + 1) else {
        text.push(BACKSLASH);
        return index + 1;
    };
    if policy == EscapePolicy::Preserve {
        text.push(BACKSLASH);
    }
    text.push(escaped);
    index + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const UNESCAPE: TokenizerOptions = TokenizerOptions {
        escape_policy: EscapePolicy::Unescape,
    };
    const PRESERVE: TokenizerOptions = TokenizerOptions {
        escape_policy: EscapePolicy::Preserve,
    };

    #[test_case("", &[] ; "empty line")]
    #[test_case("  \t ", &[] ; "whitespace only")]
    #[test_case("a b  c", &["a", "b", "c"] ; "plain words")]
    #[test_case(r#"--value "a b c""#, &["--value", "a b c"] ; "double quoted")]
    #[test_case("--value 'a b c'", &["--value", "a b c"] ; "single quoted")]
    #[test_case(r#"--value "a 'b' c""#, &["--value", "a 'b' c"] ; "single inside double")]
    #[test_case(r#"--value "a \"b\" c""#, &["--value", r#"a "b" c"#] ; "escaped double quote")]
    #[test_case(r#"--value='a'"b"c"#, &["--value=abc"] ; "glued fragments")]
    #[test_case(r#"x "" y"#, &["x", "", "y"] ; "empty double quotes")]
    #[test_case("''", &[""] ; "empty single quotes")]
    #[test_case(r"a\ b", &["a b"] ; "escaped space")]
    #[test_case(r"'C:\temp'", &[r"C:\temp"] ; "single quotes are verbatim")]
    #[test_case(r"end\", &[r"end\"] ; "trailing backslash")]
    #[test_case("-l -- db=string", &["-l", "--", "db=string"] ; "double dash passes through")]
    #[test_case("日本 語", &["日本", "語"] ; "wide chars")]
    fn test_tokenize_unescape(line: &str, expected: &[&str]) {
        assert_eq!(tokenize_with(line, &UNESCAPE).unwrap(), expected);
    }

    #[test_case(r"C:\temp\x", &[r"C:\temp\x"] ; "bare word keeps backslashes")]
    #[test_case(r#""a \" b""#, &[r#"a \" b"#] ; "pairs still recognized")]
    #[test_case(r"a\ b", &[r"a\ b"] ; "escaped space still glues")]
    fn test_tokenize_preserve(line: &str, expected: &[&str]) {
        assert_eq!(tokenize_with(line, &PRESERVE).unwrap(), expected);
    }

    #[test_case(r#"say "hi"#, TokenizeError::UnterminatedDoubleQuote { offset: 4 } ; "open double")]
    #[test_case("say 'hi", TokenizeError::UnterminatedSingleQuote { offset: 4 } ; "open single")]
    #[test_case(r#"a"b"c"d"#, TokenizeError::UnterminatedDoubleQuote { offset: 5 } ; "stray quote")]
    #[test_case("a\u{7}b", TokenizeError::InvalidCharacter { offset: 1, ch: '\u{7}' } ; "bell")]
    fn test_tokenize_errors(line: &str, expected: TokenizeError) {
        assert_eq!(tokenize_with(line, &UNESCAPE), Err(expected));
    }

    #[test]
    fn test_join_then_tokenize_is_identity() {
        let tokens = vec!["git", "commit", "-m", "wip", "--amend", "path/to/file.rs", "ü"];
        assert_eq!(tokenize(&tokens.join(" ")).unwrap(), tokens);
        assert_eq!(tokenize(&tokens.join("   ")).unwrap(), tokens);
    }

    #[test]
    fn test_verify() {
        assert!(verify("a 'b c'"));
        assert!(!verify("a 'b c"));
    }

    #[test]
    fn test_options_from_escape_on_windows() {
        assert_eq!(
            TokenizerOptions::with_escape_on_windows(true).escape_policy,
            EscapePolicy::Unescape
        );
        if cfg!(unix) {
            assert_eq!(
                TokenizerOptions::with_escape_on_windows(false).escape_policy,
                EscapePolicy::Unescape
            );
            assert_eq!(EscapePolicy::platform_default(), EscapePolicy::Unescape);
        }
    }

    #[test]
    fn test_partial_with_open_quote() {
        let it = tokenize_partial(r#"open "my fi"#, &UNESCAPE).unwrap();
        assert_eq!(it.complete, vec!["open".to_string()]);
        assert_eq!(
            it.fragment,
            Fragment {
                text: "my fi".into(),
                start: 5,
                quote: Some(DOUBLE_QUOTE),
            }
        );
    }

    #[test]
    fn test_partial_ending_in_whitespace() {
        let it = tokenize_partial("open ", &UNESCAPE).unwrap();
        assert_eq!(it.complete, vec!["open".to_string()]);
        assert_eq!(it.fragment.text, "");
        assert_eq!(it.fragment.start, 5);
        assert_eq!(it.fragment.quote, None);
    }

    #[test]
    fn test_partial_bare_fragment() {
        let it = tokenize_partial("--na", &UNESCAPE).unwrap();
        assert!(it.complete.is_empty());
        assert_eq!(it.fragment.text, "--na");
        assert_eq!(it.fragment.start, 0);
    }

    #[test_case("plain", "plain" ; "no quoting")]
    #[test_case("a b", "'a b'" ; "space")]
    #[test_case("", "''" ; "empty")]
    #[test_case("it's here", r#""it's here""# ; "single quote inside")]
    fn test_quote_if_needed(token: &str, expected: &str) {
        let quoted = quote_if_needed(token);
        assert_eq!(quoted, expected);
        assert_eq!(tokenize_with(&quoted, &UNESCAPE).unwrap(), vec![token.to_string()]);
    }

    #[test]
    fn test_quote_with_keeps_requested_quote() {
        assert_eq!(quote_with("my file", DOUBLE_QUOTE), r#""my file""#);
        assert_eq!(quote_with("my file", SINGLE_QUOTE), "'my file'");
        assert_eq!(quote_with("it's", SINGLE_QUOTE), r#""it's""#);
    }
}
