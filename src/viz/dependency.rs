//! Dependency-arc SVG renderer. One word row along the bottom, levelled arcs between
//! word anchors above it, arrowheads pointing at the dependent.

use crate::pipelines::doc::Doc;
use crate::viz::escape;

const MARGIN: usize = 40;
const WORD_SPACING: usize = 130;
const LEVEL_HEIGHT: usize = 38;
const ARC_BASE_OFFSET: usize = 20;
const WORD_ROW_HEIGHT: usize = 60;

/// Arc between two word anchors. `start < end`; the arrow is drawn at `at`.
struct Arc {
    start: usize,
    end: usize,
    at: usize,
    label: String,
    level: usize,
}

pub(crate) fn render_svg(doc: &Doc) -> String {
    let arcs = layout_arcs(doc);
    let max_level = arcs.iter().map(|arc| arc.level).max().unwrap_or(0);

    let width = 2 * MARGIN + doc.tokens.len() * WORD_SPACING;
    let arc_base = ARC_BASE_OFFSET + (max_level + 1) * LEVEL_HEIGHT;
    let height = arc_base + WORD_ROW_HEIGHT;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\n"
    );

    for (index, token) in doc.tokens.iter().enumerate() {
        let x = anchor(index);
        svg.push_str(&format!(
            "  <text x=\"{x}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
            arc_base + 25,
            escape(&token.text)
        ));
        svg.push_str(&format!(
            "  <text x=\"{x}\" y=\"{}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#888\">{}</text>\n",
            arc_base + 45,
            token.pos
        ));
    }

    for arc in &arcs {
        let x1 = anchor(arc.start);
        let x2 = anchor(arc.end);
        let top = arc_base - arc.level * LEVEL_HEIGHT;
        svg.push_str(&format!(
            "  <path d=\"M{x1},{arc_base} C{x1},{top} {x2},{top} {x2},{arc_base}\" \
             fill=\"none\" stroke=\"#666\" stroke-width=\"1.5\"/>\n"
        ));
        let arrow_x = anchor(arc.at);
        svg.push_str(&format!(
            "  <polygon points=\"{},{} {},{} {},{}\" fill=\"#666\"/>\n",
            arrow_x,
            arc_base,
            arrow_x - 4,
            arc_base - 8,
            arrow_x + 4,
            arc_base - 8
        ));
        let label_x = (x1 + x2) / 2;
        svg.push_str(&format!(
            "  <text x=\"{label_x}\" y=\"{}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#444\">{}</text>\n",
            top - 6,
            escape(&arc.label)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn anchor(index: usize) -> usize {
    MARGIN + index * WORD_SPACING + WORD_SPACING / 2
}

/// Computes the arcs of a document with nesting levels: an arc spanning other arcs is
/// raised above them so that nested attachments stay readable.
fn layout_arcs(doc: &Doc) -> Vec<Arc> {
    let mut arcs = doc
        .tokens
        .iter()
        .filter(|token| token.head != token.index)
        .map(|token| Arc {
            start: token.index.min(token.head),
            end: token.index.max(token.head),
            at: token.index,
            label: token.dep.clone(),
            level: 1,
        })
        .collect::<Vec<Arc>>();

    // shorter spans first, so inner arcs are levelled before the arcs containing them
    arcs.sort_by_key(|arc| arc.end - arc.start);
    for outer in 1..arcs.len() {
        let mut level = 1;
        for inner in 0..outer {
            let contained = arcs[inner].start >= arcs[outer].start
                && arcs[inner].end <= arcs[outer].end;
            if contained {
                level = level.max(arcs[inner].level + 1);
            }
        }
        arcs[outer].level = level;
    }
    arcs.sort_by_key(|arc| arc.start);
    arcs
}
