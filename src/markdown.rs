//! Markdown to styled terminal text.
//!
//! Covers the subset the advisor service actually produces: headings,
//! lists, quotes, fenced code, rules and the usual inline markers.
//! Anything that does not close cleanly is rendered literally.

use std::sync::OnceLock;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use regex::Regex;

struct BlockPatterns {
    heading: Regex,
    rule: Regex,
    bullet: Regex,
    ordered: Regex,
    quote: Regex,
}

fn patterns() -> &'static BlockPatterns {
    static PATTERNS: OnceLock<BlockPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| BlockPatterns {
        heading: Regex::new(r"^\s*(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("valid heading regex"),
        rule: Regex::new(r"^\s*(?:-(?:\s*-){2,}|\*(?:\s*\*){2,}|_(?:\s*_){2,})\s*$").expect("valid rule regex"),
        bullet: Regex::new(r"^(\s*)[-*+]\s+(.*)$").expect("valid bullet regex"),
        ordered: Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$").expect("valid ordered regex"),
        quote: Regex::new(r"^\s*>\s?(.*)$").expect("valid quote regex"),
    })
}

fn code_style() -> Style {
    Style::default().fg(Color::LightYellow)
}

/// Render a whole markdown document into display lines.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let p = patterns();
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        if raw.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            lines.push(Line::from(Span::styled(
                format!("  {}", raw),
                code_style(),
            )));
            continue;
        }

        if raw.trim().is_empty() {
            lines.push(Line::default());
            continue;
        }

        if let Some(caps) = p.heading.captures(raw) {
            let style = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            lines.push(Line::from(parse_inline(&caps[2], style)));
            continue;
        }

        if p.rule.is_match(raw) {
            lines.push(Line::from(Span::styled(
                "─".repeat(24),
                Style::default().fg(Color::DarkGray),
            )));
            continue;
        }

        if let Some(caps) = p.bullet.captures(raw) {
            let mut spans = vec![Span::raw(format!("{}• ", &caps[1]))];
            spans.extend(parse_inline(&caps[2], Style::default()));
            lines.push(Line::from(spans));
            continue;
        }

        if let Some(caps) = p.ordered.captures(raw) {
            let mut spans = vec![Span::raw(format!("{}{}. ", &caps[1], &caps[2]))];
            spans.extend(parse_inline(&caps[3], Style::default()));
            lines.push(Line::from(spans));
            continue;
        }

        if let Some(caps) = p.quote.captures(raw) {
            let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
            spans.extend(parse_inline(
                &caps[1],
                Style::default().add_modifier(Modifier::ITALIC),
            ));
            lines.push(Line::from(spans));
            continue;
        }

        lines.push(Line::from(parse_inline(raw, Style::default())));
    }

    lines
}

fn find(chars: &[char], from: usize, pat: &[char]) -> Option<usize> {
    if pat.is_empty() || from + pat.len() > chars.len() {
        return None;
    }
    (from..=chars.len() - pat.len()).find(|&j| chars[j..j + pat.len()] == *pat)
}

fn is_word_char(c: Option<&char>) -> bool {
    c.map(|c| c.is_alphanumeric()).unwrap_or(false)
}

/// Parse `**bold**`, `*italic*`, `_italic_`, `` `code` `` and `[text](url)`
/// into spans layered on top of `base`.
pub fn parse_inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut i = 0;

    let flush = |buf: &mut String, spans: &mut Vec<Span<'static>>| {
        if !buf.is_empty() {
            spans.push(Span::styled(std::mem::take(buf), base));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' => {
                if let Some(end) = find(&chars, i + 1, &['`']).filter(|&end| end > i + 1) {
                    flush(&mut current_text, &mut spans);
                    let code: String = chars[i + 1..end].iter().collect();
                    spans.push(Span::styled(code, base.patch(code_style())));
                    i = end + 1;
                    continue;
                }
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                if let Some(end) = find(&chars, i + 2, &['*', '*']).filter(|&end| end > i + 2) {
                    flush(&mut current_text, &mut spans);
                    let inner: String = chars[i + 2..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::BOLD)));
                    i = end + 2;
                } else {
                    // No closing **, treat as literal
                    current_text.push_str("**");
                    i += 2;
                }
                continue;
            }
            '*' | '_' => {
                let opens = chars.get(i + 1).map(|n| !n.is_whitespace()).unwrap_or(false)
                    && (c == '*' || !is_word_char(i.checked_sub(1).and_then(|p| chars.get(p))));
                let close = find(&chars, i + 1, &[c])
                    .filter(|&end| end > i + 1)
                    .filter(|&end| c == '*' || !is_word_char(chars.get(end + 1)));
                if let (true, Some(end)) = (opens, close) {
                    flush(&mut current_text, &mut spans);
                    let inner: String = chars[i + 1..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::ITALIC)));
                    i = end + 1;
                    continue;
                }
            }
            '[' => {
                if let Some(close) = find(&chars, i + 1, &[']']) {
                    if chars.get(close + 1) == Some(&'(') {
                        if let Some(paren) = find(&chars, close + 2, &[')']) {
                            flush(&mut current_text, &mut spans);
                            let label: String = chars[i + 1..close].iter().collect();
                            let url: String = chars[close + 2..paren].iter().collect();
                            spans.push(Span::styled(
                                label,
                                base.add_modifier(Modifier::UNDERLINED),
                            ));
                            if !url.is_empty() {
                                spans.push(Span::styled(
                                    format!(" ({})", url),
                                    Style::default().fg(Color::DarkGray),
                                ));
                            }
                            i = paren + 1;
                            continue;
                        }
                    }
                }
            }
            _ => {}
        }

        current_text.push(c);
        i += 1;
    }

    flush(&mut current_text, &mut spans);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn bold_span_is_styled() {
        let spans = parse_inline("save **early** and often", Style::default());
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "early");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn unclosed_bold_stays_literal() {
        let spans = parse_inline("**oops", Style::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "**oops");
    }

    #[test]
    fn italic_with_star_and_underscore() {
        let spans = parse_inline("*risk* and _return_", Style::default());
        let italic: Vec<_> = spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::ITALIC))
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(italic, vec!["risk", "return"]);
    }

    #[test]
    fn snake_case_is_not_italic() {
        let spans = parse_inline("call max_tax_rate now", Style::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "call max_tax_rate now");
    }

    #[test]
    fn bold_can_contain_italic() {
        let spans = parse_inline("**very _important_**", Style::default());
        let last = spans.last().unwrap();
        assert_eq!(last.content, "important");
        assert!(last.style.add_modifier.contains(Modifier::BOLD | Modifier::ITALIC));
    }

    #[test]
    fn inline_code_is_colored() {
        let spans = parse_inline("use `401k` plans", Style::default());
        assert_eq!(spans[1].content, "401k");
        assert_eq!(spans[1].style.fg, Some(Color::LightYellow));
    }

    #[test]
    fn link_renders_label_and_url() {
        let lines = render_markdown("see [SEC](https://sec.gov) for more");
        assert_eq!(text_of(&lines[0]), "see SEC (https://sec.gov) for more");
    }

    #[test]
    fn heading_drops_hashes_and_is_bold() {
        let lines = render_markdown("## Emergency Fund");
        assert_eq!(text_of(&lines[0]), "Emergency Fund");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn heading_keeps_hash_inside_text() {
        let lines = render_markdown("# Learn C#\n## Title ##");
        assert_eq!(text_of(&lines[0]), "Learn C#");
        assert_eq!(text_of(&lines[1]), "Title");
    }

    #[test]
    fn lists_get_markers() {
        let lines = render_markdown("- stocks\n* bonds\n3. cash");
        assert_eq!(text_of(&lines[0]), "• stocks");
        assert_eq!(text_of(&lines[1]), "• bonds");
        assert_eq!(text_of(&lines[2]), "3. cash");
    }

    #[test]
    fn rule_is_not_a_bullet() {
        let lines = render_markdown("---\n* * *\n- - -\n_ _ _");
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert!(text_of(line).starts_with('─'));
        }
    }

    #[test]
    fn code_fence_content_is_verbatim() {
        let lines = render_markdown("before\n```\nrate = **0.05**\n```\nafter");
        assert_eq!(lines.len(), 3);
        assert_eq!(text_of(&lines[1]), "  rate = **0.05**");
        assert_eq!(text_of(&lines[2]), "after");
    }

    #[test]
    fn blank_lines_are_kept() {
        let lines = render_markdown("a\n\nb");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn quote_gets_bar() {
        let lines = render_markdown("> past returns are no guarantee");
        assert_eq!(text_of(&lines[0]), "│ past returns are no guarantee");
    }
}
