use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.\s").expect("valid numbered item pattern"));
static STRONG_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid emphasis pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Strong(String),
}

/// One rendered line. Headings keep their text literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet(Vec<Span>),
    Numbered(Vec<Span>),
    Spacer,
    Paragraph(Vec<Span>),
}

/// Line-by-line formatter: no nesting, no code blocks, no links.
pub fn render(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }

    text.split('\n').map(render_line).collect()
}

fn render_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::Heading { level: 4, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return Block::Heading { level: 3, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return Block::Heading { level: 2, text: rest.to_string() };
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Block::Bullet(inline(rest));
    }
    if let Some(m) = NUMBERED_ITEM.find(line) {
        return Block::Numbered(inline(&line[m.end()..]));
    }
    if line.trim().is_empty() {
        return Block::Spacer;
    }
    Block::Paragraph(inline(line))
}

/// Split `**bold**` spans out of a line. An unmatched `**` stays literal.
pub fn inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in STRONG_SPAN.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Plain(text[last..whole.start()].to_string()));
        }
        spans.push(Span::Strong(inner.as_str().to_string()));
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Span {
        Span::Plain(s.to_string())
    }

    fn strong(s: &str) -> Span {
        Span::Strong(s.to_string())
    }

    #[test]
    fn test_heading_bullet_paragraph() {
        let blocks = render("# Title\n- item one\n**bold** text");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 2, text: "Title".to_string() },
                Block::Bullet(vec![plain("item one")]),
                Block::Paragraph(vec![strong("bold"), plain(" text")]),
            ]
        );
    }

    #[test]
    fn test_heading_levels_checked_longest_first() {
        let blocks = render("### Small\n## Medium\n# Large");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 4, text: "Small".to_string() },
                Block::Heading { level: 3, text: "Medium".to_string() },
                Block::Heading { level: 2, text: "Large".to_string() },
            ]
        );
    }

    #[test]
    fn test_heading_text_is_literal() {
        assert_eq!(
            render("## **Not bold**"),
            vec![Block::Heading { level: 3, text: "**Not bold**".to_string() }]
        );
    }

    #[test]
    fn test_lists() {
        let blocks = render("* star item\n12. twelfth **step**\n3.missing space");
        assert_eq!(
            blocks,
            vec![
                Block::Bullet(vec![plain("star item")]),
                Block::Numbered(vec![plain("twelfth "), strong("step")]),
                Block::Paragraph(vec![plain("3.missing space")]),
            ]
        );
    }

    #[test]
    fn test_numbered_items_need_ascii_digits() {
        assert_eq!(
            render("\u{0661}. item"),
            vec![Block::Paragraph(vec![plain("\u{0661}. item")])]
        );
        assert_eq!(render("7.\u{A0}item"), vec![Block::Numbered(vec![plain("item")])]);
    }

    #[test]
    fn test_blank_lines_are_spacers() {
        let blocks = render("one\n\n   \ntwo\n");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![plain("one")]),
                Block::Spacer,
                Block::Spacer,
                Block::Paragraph(vec![plain("two")]),
                Block::Spacer,
            ]
        );
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(render("").is_empty());
    }

    #[test]
    fn test_markers_need_a_space() {
        let blocks = render("#Title\n-dash\n  - indented");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![plain("#Title")]),
                Block::Paragraph(vec![plain("-dash")]),
                Block::Paragraph(vec![plain("  - indented")]),
            ]
        );
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(inline("no emphasis"), vec![plain("no emphasis")]);
        assert_eq!(
            inline("a **b** c **d**"),
            vec![plain("a "), strong("b"), plain(" c "), strong("d")]
        );
        assert_eq!(inline("open **only"), vec![plain("open **only")]);
        assert_eq!(inline("**x** **y"), vec![strong("x"), plain(" **y")]);
        assert!(inline("").is_empty());
    }
}
