//! Structural markup serialization for body paragraphs.
//!
//! Paragraph text is handed to the renderer with its inline formatting
//! tags intact, minus decorative wrappers such as `<font>`. Rather than
//! stripping tags from serialized HTML, the element tree is walked and
//! written back out with the wrapper elements skipped and their children
//! kept in place.

use scraper::ElementRef;
use scraper::node::Node;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize everything between `element`'s opening and closing tag,
/// unwrapping any element whose name is in `unwrap_tags`.
///
/// Comments and processing instructions are dropped.
pub fn inner_markup(element: ElementRef<'_>, unwrap_tags: &[String]) -> String {
    let mut out = String::new();
    write_children(element, unwrap_tags, &mut out);
    out
}

/// All descendant text of `element`, concatenated and trimmed.
pub fn flattened_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// True when the element has at least one text node or child element.
pub fn has_text_or_child(element: ElementRef<'_>) -> bool {
    element
        .children()
        .any(|child| matches!(child.value(), Node::Text(_) | Node::Element(_)))
}

fn write_children(element: ElementRef<'_>, unwrap_tags: &[String], out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_escaped(out, text, false),
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if unwrap_tags.iter().any(|tag| tag.eq_ignore_ascii_case(name)) {
                    write_children(child_ref, unwrap_tags, out);
                    continue;
                }

                out.push('<');
                out.push_str(name);
                for (attr, value) in el.attrs() {
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    push_escaped(out, value, true);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&name) {
                    continue;
                }
                write_children(child_ref, unwrap_tags, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            _ => {}
        }
    }
}

fn push_escaped(out: &mut String, s: &str, in_attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn with_p<R>(html: &str, f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("p").unwrap();
        let p = doc.select(&sel).next().unwrap();
        f(p)
    }

    fn font() -> Vec<String> {
        vec!["font".to_string()]
    }

    #[test]
    fn test_font_wrappers_are_unwrapped() {
        let markup = with_p(
            r#"<p><font color="red" face="楷体">Hello <strong>bold</strong></font> world</p>"#,
            |p| inner_markup(p, &font()),
        );
        assert_eq!(markup, "Hello <strong>bold</strong> world");
    }

    #[test]
    fn test_nested_font_inside_other_tags() {
        let markup = with_p(r#"<p><b><FONT size="2">x</FONT></b></p>"#, |p| inner_markup(p, &font()));
        assert_eq!(markup, "<b>x</b>");
    }

    #[test]
    fn test_image_paragraph_serializes_img_first() {
        let markup = with_p(
            r#"<p><font><img src="/i/1.png?a=1&b=2"></font></p>"#,
            |p| inner_markup(p, &font()),
        );
        assert_eq!(markup, r#"<img src="/i/1.png?a=1&amp;b=2">"#);
        assert!(markup.starts_with("<img"));
    }

    #[test]
    fn test_text_is_escaped_and_comments_dropped() {
        let markup = with_p("<p>1 &lt; 2 &amp; 3<!-- note --></p>", |p| inner_markup(p, &font()));
        assert_eq!(markup, "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_flattened_text_and_predicate() {
        with_p("<p>  <span>作者</span>：Jane  </p>", |p| {
            assert_eq!(flattened_text(p), "作者：Jane");
            assert!(has_text_or_child(p));
        });
        with_p("<p></p>", |p| assert!(!has_text_or_child(p)));
        with_p("<p><!-- only a comment --></p>", |p| assert!(!has_text_or_child(p)));
    }
}
