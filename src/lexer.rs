//! Word scanner.
//!
//! Scripts are split into whitespace-delimited words. A word starting with
//! `"` runs to the next unescaped `"`, keeping spaces; `\"` inside it becomes a
//! literal quote. A newline always ends the current word, quoted or not.
//! Malformed quoting never fails, it only moves word boundaries.

/// A word and the 1-based line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub line: usize,
}

/// Scanner state: tracks position in the input bytes.
pub struct Scanner<'a> {
    input: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Scanner {
            input,
            offset: 0,
            line: 1,
        }
    }

    /// The line the scanner is currently on.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Next word, or `None` once the input is exhausted.
    ///
    /// An empty line yields an empty word.
    pub fn next_word(&mut self) -> Option<Word> {
        if self.is_eof() {
            return None;
        }

        let line = self.line;
        let mut word: Vec<u8> = Vec::new();
        let mut quoted = false;

        while let Some(&byte) = self.input.get(self.offset) {
            self.offset += 1;

            if byte == b'\n' {
                self.line += 1;
                return Some(make_word(word, line));
            }

            if word.is_empty() && !quoted && is_blank(byte) {
                continue;
            }

            if byte == b'"' {
                match word.last_mut() {
                    Some(last) if *last == b'\\' => {
                        *last = b'"';
                        continue;
                    }
                    Some(_) => return Some(make_word(word, line)),
                    None if quoted => return Some(make_word(word, line)),
                    None => {
                        quoted = true;
                        continue;
                    }
                }
            }

            if !quoted && is_blank(byte) {
                return Some(make_word(word, line));
            }

            word.push(byte);
        }

        if word.is_empty() && !quoted {
            return None;
        }
        Some(make_word(word, line))
    }
}

impl Iterator for Scanner<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        self.next_word()
    }
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r')
}

fn make_word(bytes: Vec<u8>, line: usize) -> Word {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Word { text, line }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(input: &str) -> Vec<String> {
        Scanner::new(input.as_bytes()).map(|w| w.text).collect()
    }

    #[test]
    fn splits_on_spaces() {
        assert_eq!(texts("abc def ghi jkl"), vec!["abc", "def", "ghi", "jkl"]);
    }

    #[test]
    fn skips_leading_blanks_and_tabs() {
        assert_eq!(texts("  \tabc\t def  "), vec!["abc", "def"]);
    }

    #[test]
    fn quoted_words_keep_spaces() {
        assert_eq!(
            texts(r#"log "hello world" done"#),
            vec!["log", "hello world", "done"]
        );
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        assert_eq!(texts(r#""say \"hi\"" x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn empty_quotes_give_empty_word() {
        assert_eq!(texts(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn newline_ends_words_and_counts_lines() {
        let mut scanner = Scanner::new(b"a b\n\nc");
        let words: Vec<Word> = scanner.by_ref().collect();
        assert_eq!(
            words,
            vec![
                Word { text: "a".into(), line: 1 },
                Word { text: "b".into(), line: 1 },
                Word { text: "".into(), line: 2 },
                Word { text: "c".into(), line: 3 },
            ]
        );
        assert_eq!(scanner.line(), 3);
    }

    #[test]
    fn newline_closes_unterminated_quote() {
        assert_eq!(texts("\"open string\nnext"), vec!["open string", "next"]);
    }

    #[test]
    fn partial_word_at_eof_is_returned_once() {
        let mut scanner = Scanner::new(b"\"tail");
        assert_eq!(scanner.next_word().map(|w| w.text), Some("tail".to_string()));
        assert_eq!(scanner.next_word(), None);
        assert_eq!(scanner.next_word(), None);
    }

    #[test]
    fn quote_inside_word_ends_it() {
        assert_eq!(texts(r#"ab"cd"#), vec!["ab", "cd"]);
    }
}
