use ratatui::style::Style;
use ratatui::text::Span;
use tracing::debug;

use crate::language::Language;
use crate::syntax::{TokenSpan, token_spans, tokenize};
use crate::theme::Theme;

/// Token spans for the current document, rebuilt from scratch on every
/// refresh. Rendering slices them per line.
#[derive(Debug, Default)]
pub(crate) struct Highlighter {
    spans: Vec<TokenSpan>,
    line_starts: Vec<usize>,
}

impl Highlighter {
    pub(crate) fn refresh(&mut self, text: &str, lang: Language) {
        self.spans = token_spans(&tokenize(text, lang));
        self.line_starts.clear();
        self.line_starts.push(0);
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                self.line_starts.push(i + 1);
            }
        }
        debug!(lang = %lang, spans = self.spans.len(), "re-highlighted document");
    }

    #[cfg(test)]
    pub(crate) fn spans(&self) -> &[TokenSpan] {
        &self.spans
    }

    /// Styled pieces of one 0-indexed line. Tabs expand to four spaces; kinds
    /// the theme has no color for keep `base`.
    pub(crate) fn line_spans(
        &self,
        row: usize,
        line: &str,
        theme: &Theme,
        base: Style,
    ) -> Vec<Span<'static>> {
        let len = line.chars().count();
        let Some(&line_start) = self.line_starts.get(row) else {
            return vec![Span::styled(line.replace('\t', "    "), base)];
        };
        let line_end = line_start + len;
        let mut out: Vec<Span<'static>> = Vec::new();
        let mut covered = 0usize;
        let first = self.spans.partition_point(|s| s.end <= line_start);
        for span in &self.spans[first..] {
            if span.start >= line_end {
                break;
            }
            let from = span.start.max(line_start) - line_start;
            let to = span.end.min(line_end) - line_start;
            if from >= to {
                continue;
            }
            let text: String = line.chars().skip(from).take(to - from).collect();
            let style = match theme.token_color(span.kind) {
                Some(color) => base.fg(color),
                None => base,
            };
            out.push(Span::styled(text.replace('\t', "    "), style));
            covered = to;
        }
        // Stale spans (document edited since the last refresh) leave a tail.
        if covered < len {
            let rest: String = line.chars().skip(covered).collect();
            out.push(Span::styled(rest.replace('\t', "    "), base));
        }
        out
    }
}
