//! Link classification for bracketed spans.
//!
//! A bracketed span is only a real link when the next non-whitespace text
//! after it starts with `(`. Each span is judged on its own lookahead.

use std::ops::Range;

use pulldown_cmark::{Event, Parser, Tag};

/// Classification result for one candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Plain,
}

impl Verdict {
    pub fn is_verified(self) -> bool {
        self == Verdict::Verified
    }
}

/// Anything that can report the text following it.
///
/// Runs are yielded in document order. Whitespace-only runs are skipped by
/// the classifier.
pub trait CandidateSpan {
    fn following_runs(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

pub fn classify<S: CandidateSpan + ?Sized>(span: &S) -> Verdict {
    for run in span.following_runs() {
        let trimmed = run.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        return if trimmed.starts_with('(') {
            Verdict::Verified
        } else {
            Verdict::Plain
        };
    }
    Verdict::Plain
}

pub fn classify_all<S: CandidateSpan>(spans: &[S]) -> Vec<Verdict> {
    spans.iter().map(classify).collect()
}

/// A `[label]` span found in markdown source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub label: &'a str,
    rest: &'a str,
}

impl CandidateSpan for SourceSpan<'_> {
    fn following_runs(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(std::iter::once(self.rest))
    }
}

/// Byte ranges of inline code and code blocks, in document order.
fn code_ranges(markdown: &str) -> Vec<Range<usize>> {
    Parser::new(markdown)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// A `[` is escaped when an odd number of backslashes precede it.
fn is_escaped(bytes: &[u8], at: usize) -> bool {
    let backslashes = bytes[..at].iter().rev().take_while(|&&b| b == b'\\').count();
    backslashes % 2 == 1
}

/// Scan markdown source for single-bracket spans.
///
/// Footnote markers (`[^x]`), wiki links (`[[x]]`), image alt text (`![x]`)
/// and anything inside code are not candidates. Nested brackets are not
/// tracked: a span ends at the first `]`.
pub fn bracket_spans(markdown: &str) -> Vec<SourceSpan<'_>> {
    let bytes = markdown.as_bytes();
    let code = code_ranges(markdown);
    let mut next_code = 0;
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        while next_code < code.len() && code[next_code].end <= i {
            next_code += 1;
        }
        if let Some(range) = code.get(next_code)
            && range.start <= i
        {
            i = range.end;
            continue;
        }

        let escaped = is_escaped(bytes, i);
        let image = i > 0 && bytes[i - 1] == b'!';
        let wiki = bytes.get(i + 1) == Some(&b'[');
        let footnote = bytes.get(i + 1) == Some(&b'^');
        if wiki {
            // skip the whole [[...]]
            match markdown[i..].find("]]") {
                Some(close) => i += close + 2,
                None => i += 2,
            }
            continue;
        }

        let Some(close) = markdown[i + 1..].find(']') else {
            break;
        };
        let end = i + 1 + close + 1;
        if !(escaped || image || footnote) && close > 0 {
            spans.push(SourceSpan {
                start: i,
                end,
                label: &markdown[i + 1..end - 1],
                rest: &markdown[end..],
            });
        }
        i = end;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Runs(Vec<String>);

    impl CandidateSpan for Runs {
        fn following_runs(&self) -> Box<dyn Iterator<Item = &str> + '_> {
            Box::new(self.0.iter().map(String::as_str))
        }
    }

    fn runs(parts: &[&str]) -> Runs {
        Runs(parts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_paren_after_whitespace_runs_is_verified() {
        assert_eq!(classify(&runs(&["  ", "\n", "(https://x)"])), Verdict::Verified);
    }

    #[test]
    fn test_other_text_is_plain() {
        assert_eq!(classify(&runs(&[" ", "and more"])), Verdict::Plain);
    }

    #[test]
    fn test_nothing_following_is_plain() {
        assert_eq!(classify(&runs(&[])), Verdict::Plain);
        assert_eq!(classify(&runs(&["   "])), Verdict::Plain);
    }

    #[test]
    fn test_leading_whitespace_inside_a_run() {
        assert_eq!(classify(&runs(&["  (x)"])), Verdict::Verified);
    }

    #[test]
    fn test_classify_all_judges_independently() {
        let spans = vec![runs(&["(a)"]), runs(&["b"]), runs(&["", "(c)"])];
        assert_eq!(
            classify_all(&spans),
            vec![Verdict::Verified, Verdict::Plain, Verdict::Verified]
        );
    }

    #[test]
    fn test_bracket_spans_in_source() {
        let md = "A [link](x.md), a [plain] word, [^1] and [[Wiki]] and ![alt](i.png).";
        let spans = bracket_spans(md);
        let labels: Vec<_> = spans.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["link", "plain"]);
        assert_eq!(classify_all(&spans), vec![Verdict::Verified, Verdict::Plain]);
    }

    #[test]
    fn test_source_span_whitespace_before_paren() {
        let spans = bracket_spans("[spaced] \n (target)");
        assert_eq!(spans.len(), 1);
        assert!(classify(&spans[0]).is_verified());
    }

    #[test]
    fn test_span_at_end_of_text_is_plain() {
        let spans = bracket_spans("trailing [label]");
        assert_eq!(spans[0].start, 9);
        assert_eq!(spans[0].end, 16);
        assert_eq!(classify(&spans[0]), Verdict::Plain);
    }

    #[test]
    fn test_escaped_and_empty_brackets_are_skipped() {
        assert!(bracket_spans(r"\[not a link](x) and [](y)").is_empty());
    }

    #[test]
    fn test_escaped_backslash_does_not_escape_bracket() {
        let spans = bracket_spans(r"\\[x](y) and \\\[z](w)");
        let labels: Vec<_> = spans.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["x"]);
        assert!(classify(&spans[0]).is_verified());
    }

    #[test]
    fn test_brackets_inside_inline_code_are_skipped() {
        let spans = bracket_spans("`[x](y)` and [z](w)");
        let labels: Vec<_> = spans.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["z"]);
        assert_eq!(spans[0].start, 13);
    }

    #[test]
    fn test_brackets_inside_fenced_code_are_skipped() {
        let md = "```\n[a](b)\n```\n\nSee [c] and\n\n    [d](e)\n";
        let labels: Vec<_> = bracket_spans(md).iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["c"]);
    }

    #[test]
    fn test_unclosed_bracket() {
        assert!(bracket_spans("an [open bracket").is_empty());
    }
}
