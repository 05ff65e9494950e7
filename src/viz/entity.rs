//! Entity-highlight HTML renderer. The original text is emitted verbatim with each
//! entity span wrapped in a `<mark>` element carrying a label chip.

use crate::pipelines::doc::Doc;
use crate::viz::escape;

pub(crate) fn render_html(doc: &Doc) -> String {
    let chars = doc.text.chars().collect::<Vec<char>>();
    let mut html = String::from("<div class=\"ents\">");
    let mut cursor = 0usize;

    for span in &doc.ents {
        let bounds = match (
            doc.tokens.get(span.start).and_then(|t| t.offset),
            span.end
                .checked_sub(1)
                .and_then(|last| doc.tokens.get(last))
                .and_then(|t| t.offset),
        ) {
            (Some(first), Some(last)) => (first.begin as usize, last.end as usize),
            _ => continue,
        };
        let (begin, end) = bounds;
        if begin < cursor || end > chars.len() {
            continue;
        }
        html.push_str(&escape(&chars[cursor..begin].iter().collect::<String>()));
        html.push_str("<mark>");
        html.push_str(&escape(&chars[begin..end].iter().collect::<String>()));
        html.push_str(&format!(
            "<span class=\"label\">{}</span></mark>",
            escape(&span.label)
        ));
        cursor = end;
    }
    html.push_str(&escape(&chars[cursor..].iter().collect::<String>()));
    html.push_str("</div>");
    html
}
