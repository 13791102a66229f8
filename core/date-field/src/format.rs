//! FILENAME: core/date-field/src/format.rs
//! PURPOSE: Splits a field format string into tokens and literal separators.
//! CONTEXT: Left-to-right walk. Runs of the same token letter are resolved
//! against the adapter's token table, longest match first. Quoted text,
//! `[bracketed]` text and `\`-escaped characters are always literal.

use crate::adapter::{DateAdapter, TokenMeta};
use crate::error::{DateFieldError, Result};

/// One piece of a tokenized format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatPiece {
    Token {
        token: String,
        meta: TokenMeta,
        /// Character position of the token in the format string.
        position: usize,
    },
    Literal(String),
}

/// Letters that may start a format token.
pub fn is_token_char(ch: char) -> bool {
    matches!(ch, 'Y' | 'M' | 'D' | 'H' | 'h' | 'm' | 's' | 'a' | 'A')
}

/// Count consecutive occurrences of a character (case-sensitive).
fn count_consecutive(chars: &[char], start: usize, target: char) -> usize {
    chars[start..].iter().take_while(|&&c| c == target).count()
}

fn push_literal(pieces: &mut Vec<FormatPiece>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(FormatPiece::Literal(last)) = pieces.last_mut() {
        last.push_str(text);
    } else {
        pieces.push(FormatPiece::Literal(text.to_string()));
    }
}

pub fn tokenize<A: DateAdapter>(format: &str, adapter: &A) -> Result<Vec<FormatPiece>> {
    let chars: Vec<char> = format.chars().collect();
    let len = chars.len();
    let mut pieces: Vec<FormatPiece> = Vec::new();
    let mut i = 0;

    while i < len {
        let ch = chars[i];

        match ch {
            // Quoted literal strings
            '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '"')
                    .ok_or(DateFieldError::UnterminatedLiteral(i))?;
                let lit: String = chars[i + 1..i + 1 + close].iter().collect();
                push_literal(&mut pieces, &lit);
                i += close + 2;
            }

            // Bracketed literal text
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or(DateFieldError::UnterminatedLiteral(i))?;
                let lit: String = chars[i + 1..i + 1 + close].iter().collect();
                push_literal(&mut pieces, &lit);
                i += close + 2;
            }

            // Backslash escape
            '\\' => {
                if i + 1 < len {
                    push_literal(&mut pieces, &chars[i + 1].to_string());
                    i += 2;
                } else {
                    i += 1;
                }
            }

            c if is_token_char(c) => {
                let run = count_consecutive(&chars, i, c);
                let mut consumed = 0;
                while consumed < run {
                    let remaining = run - consumed;
                    let position = i + consumed;
                    let matched = (1..=remaining).rev().find_map(|width| {
                        let token: String = std::iter::repeat(c).take(width).collect();
                        adapter.token_meta(&token).map(|meta| (token, meta, width))
                    });
                    let Some((token, meta, width)) = matched else {
                        return Err(DateFieldError::UnknownToken {
                            token: std::iter::repeat(c).take(remaining).collect(),
                            position,
                        });
                    };
                    pieces.push(FormatPiece::Token { token, meta, position });
                    consumed += width;
                }
                i += run;
            }

            other => {
                push_literal(&mut pieces, &other.to_string());
                i += 1;
            }
        }
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ChronoAdapter, SectionType};

    fn tokens(format: &str) -> Vec<String> {
        tokenize(format, &ChronoAdapter::new())
            .unwrap()
            .into_iter()
            .map(|p| match p {
                FormatPiece::Token { token, .. } => format!("<{}>", token),
                FormatPiece::Literal(lit) => lit,
            })
            .collect()
    }

    #[test]
    fn test_tokenize_date_and_time() {
        assert_eq!(tokens("MM/DD/YYYY"), vec!["<MM>", "/", "<DD>", "/", "<YYYY>"]);
        assert_eq!(tokens("hh:mm a"), vec!["<hh>", ":", "<mm>", " ", "<a>"]);
    }

    #[test]
    fn test_tokenize_literals() {
        assert_eq!(tokens("YYYY \"at\" HH"), vec!["<YYYY>", " at ", "<HH>"]);
        assert_eq!(tokens("[Day] D"), vec!["Day ", "<D>"]);
        assert_eq!(tokens("\\M MM"), vec!["M ", "<MM>"]);
    }

    #[test]
    fn test_longest_match_wins() {
        let pieces = tokenize("MMMM", &ChronoAdapter::new()).unwrap();
        let FormatPiece::Token { meta, .. } = &pieces[0] else {
            panic!("expected token");
        };
        assert_eq!(meta.section_type, SectionType::Month);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn test_unknown_and_unterminated() {
        let adapter = ChronoAdapter::new();
        assert_eq!(
            tokenize("YYY", &adapter).unwrap_err(),
            DateFieldError::UnknownToken { token: "Y".to_string(), position: 2 }
        );
        assert_eq!(
            tokenize("DD \"oops", &adapter).unwrap_err(),
            DateFieldError::UnterminatedLiteral(3)
        );
    }
}
