use unicode_width::UnicodeWidthChar;

/// Inputs available to prompt directives while expanding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptContext<'a> {
    /// Line number shown by `%N` (base line offset plus continuation index)
    pub line_number: usize,
    /// Missing token from an incomplete parse, shown by `%M`
    pub missing: &'a str,
    /// Visible width of the expanded primary prompt, used by `%Pc`
    pub initial_width: usize,
}

/// A `%`-template prompt.
///
/// Directives: `%N` line number, `%M` missing token, `%nPc` pad with `c` to
/// width `n`, `%Pc` pad to the primary prompt's width, `%%` literal percent,
/// `%{...%}` zero-width passthrough for embedded escape sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl From<&str> for PromptTemplate {
    fn from(source: &str) -> Self {
        PromptTemplate {
            source: source.to_string(),
        }
    }
}

impl From<String> for PromptTemplate {
    fn from(source: String) -> Self {
        PromptTemplate { source }
    }
}

/// The result of expanding a template: text (possibly holding zero-width
/// escape sequences) plus the visible width of each line, used to align
/// continuation prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedPrompt {
    pub lines: Vec<String>,
    pub line_widths: Vec<usize>,
}

impl ExpandedPrompt {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Visible width of the last line, where the buffer starts.
    pub fn last_width(&self) -> usize {
        self.line_widths.last().copied().unwrap_or(0)
    }
}

impl PromptTemplate {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expand(&self, ctx: PromptContext<'_>) -> ExpandedPrompt {
        let mut lines: Vec<String> = vec![String::new()];
        let mut widths: Vec<usize> = vec![0];

        let mut push_visible = |lines: &mut Vec<String>, widths: &mut Vec<usize>, text: &str| {
            for c in text.chars() {
                if c == '\n' {
                    lines.push(String::new());
                    widths.push(0);
                } else {
                    lines.last_mut().unwrap().push(c);
                    *widths.last_mut().unwrap() += c.width().unwrap_or(0);
                }
            }
        };

        let mut chars = self.source.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                push_visible(&mut lines, &mut widths, &c.to_string());
                continue;
            }
            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    push_visible(&mut lines, &mut widths, "%");
                }
                Some('N') => {
                    chars.next();
                    push_visible(&mut lines, &mut widths, &ctx.line_number.to_string());
                }
                Some('M') => {
                    chars.next();
                    let missing = ctx.missing.to_string();
                    push_visible(&mut lines, &mut widths, &missing);
                }
                Some('{') => {
                    chars.next();
                    // Zero-width region: copy verbatim until %}
                    let mut region = String::new();
                    while let Some(c) = chars.next() {
                        if c == '%' && chars.peek() == Some(&'}') {
                            chars.next();
                            break;
                        }
                        region.push(c);
                    }
                    lines.last_mut().unwrap().push_str(&region);
                }
                Some('P') => {
                    chars.next();
                    let pad = chars.next().unwrap_or(' ');
                    self.pad_to(&mut lines, &mut widths, ctx.initial_width, pad);
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut digits = String::new();
                    while let Some(d) = chars.peek() {
                        if d.is_ascii_digit() {
                            digits.push(*d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if chars.peek() == Some(&'P') {
                        chars.next();
                        let pad = chars.next().unwrap_or(' ');
                        let target = digits.parse().unwrap_or(0);
                        self.pad_to(&mut lines, &mut widths, target, pad);
                    } else {
                        // Not a pad directive after all; keep what we read
                        push_visible(&mut lines, &mut widths, &digits);
                    }
                }
                Some(other) => {
                    chars.next();
                    push_visible(&mut lines, &mut widths, &other.to_string());
                }
                None => push_visible(&mut lines, &mut widths, "%"),
            }
        }

        ExpandedPrompt {
            lines,
            line_widths: widths,
        }
    }

    fn pad_to(&self, lines: &mut [String], widths: &mut [usize], target: usize, pad: char) {
        let width = widths.last_mut().unwrap();
        let line = lines.last_mut().unwrap();
        let pad_width = pad.width().unwrap_or(1).max(1);
        while *width + pad_width <= target {
            line.push(pad);
            *width += pad_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn expand(template: &str, ctx: PromptContext) -> ExpandedPrompt {
        PromptTemplate::from(template).expand(ctx)
    }

    #[test]
    fn literal_prompt_measures_width() {
        let p = expand("> ", PromptContext::default());
        assert_eq!(p.lines, vec!["> "]);
        assert_eq!(p.line_widths, vec![2]);
    }

    #[test]
    fn percent_escapes() {
        let p = expand("100%% ", PromptContext::default());
        assert_eq!(p.text(), "100% ");
    }

    #[rstest]
    #[case(1, "1> ")]
    #[case(42, "42> ")]
    fn line_number_directive(#[case] n: usize, #[case] expected: &str) {
        let ctx = PromptContext {
            line_number: n,
            ..Default::default()
        };
        assert_eq!(expand("%N> ", ctx).text(), expected);
    }

    #[test]
    fn missing_token_directive() {
        let ctx = PromptContext {
            missing: "\"",
            ..Default::default()
        };
        assert_eq!(expand("%M> ", ctx).text(), "\"> ");
    }

    #[test]
    fn zero_width_region_keeps_text_but_not_width() {
        let p = expand("%{\x1b[1m%}>%{\x1b[0m%} ", PromptContext::default());
        assert_eq!(p.text(), "\x1b[1m>\x1b[0m ");
        assert_eq!(p.line_widths, vec![2]);
    }

    #[test]
    fn numbered_pad_fills_to_width() {
        let p = expand("%5P.", PromptContext::default());
        assert_eq!(p.text(), ".....");
        assert_eq!(p.line_widths, vec![5]);
    }

    #[test]
    fn pad_to_initial_prompt_width_aligns_continuations() {
        let primary = expand("sql> ", PromptContext::default());
        let ctx = PromptContext {
            initial_width: primary.last_width(),
            ..Default::default()
        };
        let cont = expand("%P.", ctx);
        assert_eq!(cont.text(), ".....");
    }

    #[test]
    fn multi_line_template_tracks_per_line_widths() {
        let p = expand("top\n> ", PromptContext::default());
        assert_eq!(p.lines, vec!["top", "> "]);
        assert_eq!(p.line_widths, vec![3, 2]);
        assert_eq!(p.last_width(), 2);
    }

    #[test]
    fn wide_chars_count_double() {
        let p = expand("日> ", PromptContext::default());
        assert_eq!(p.line_widths, vec![4]);
    }
}
