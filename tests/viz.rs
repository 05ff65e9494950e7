use rust_tokenizers::Offset;
use rust_ud::pipelines::doc::{Doc, EntitySpan, Token, UposTag};
use rust_ud::viz::{self, VisualizationServerConfig, VisualizationStyle};
use rust_ud::RustUdError;

fn telescope_doc() -> Doc {
    let words = [
        ("Eu", 0u32, 2u32, UposTag::Pron, "nsubj", 1usize),
        ("vi", 3, 5, UposTag::Verb, "root", 1),
        ("o", 6, 7, UposTag::Det, "det", 3),
        ("menino", 8, 14, UposTag::Noun, "obj", 1),
        ("com", 15, 18, UposTag::Adp, "case", 6),
        ("o", 19, 20, UposTag::Det, "det", 6),
        ("telescópio", 21, 31, UposTag::Noun, "nmod", 3),
    ];
    Doc {
        text: String::from("Eu vi o menino com o telescópio"),
        tokens: words
            .iter()
            .enumerate()
            .map(|(index, &(text, begin, end, pos, dep, head))| Token {
                index,
                text: text.to_string(),
                pos,
                tag: String::new(),
                dep: dep.to_string(),
                head,
                offset: Some(Offset::new(begin, end)),
                score: 1.0,
            })
            .collect(),
        ents: vec![],
    }
}

fn luiz_doc() -> Doc {
    let mut doc = telescope_doc();
    doc.text = String::from("Luiz bebeu água");
    doc.tokens.truncate(3);
    doc.tokens[0].text = String::from("Luiz");
    doc.tokens[0].offset = Some(Offset::new(0, 4));
    doc.tokens[1].text = String::from("bebeu");
    doc.tokens[1].offset = Some(Offset::new(5, 10));
    doc.tokens[2].text = String::from("água");
    doc.tokens[2].offset = Some(Offset::new(11, 15));
    doc.tokens[2].dep = String::from("obj");
    doc.tokens[2].head = 1;
    doc.ents = vec![EntitySpan {
        text: String::from("Luiz"),
        label: String::from("PER"),
        score: 0.97,
        start: 0,
        end: 1,
    }];
    doc
}

#[test]
fn dependency_page_renders_every_document() {
    let docs = vec![telescope_doc(), luiz_doc()];
    let page = viz::render(&docs, VisualizationStyle::Dependency);

    assert!(page.contains("<svg"));
    assert!(page.contains(">telescópio</text>"));
    assert!(page.contains(">Luiz</text>"));
    assert_eq!(page.matches("<figure>").count(), docs.len());
}

#[test]
fn entity_page_highlights_spans() {
    let page = viz::render(&[luiz_doc()], VisualizationStyle::Entity);

    assert!(page.contains("<mark>Luiz<span class=\"label\">PER</span></mark>"));
    assert!(!page.contains("<svg"));
}

#[test]
fn rendering_is_pure() {
    let docs = vec![telescope_doc()];
    let first = viz::render(&docs, VisualizationStyle::Dependency);
    let second = viz::render(&docs, VisualizationStyle::Dependency);
    assert_eq!(first, second);
}

#[test]
fn serve_fails_fast_when_the_port_is_taken() -> anyhow::Result<()> {
    // occupy a port, then ask the visualizer for the same one
    let occupied = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = occupied.local_addr()?.port();

    let config = VisualizationServerConfig {
        port,
        ..Default::default()
    };
    let result = viz::serve(&[telescope_doc()], VisualizationStyle::Dependency, config);
    assert!(matches!(result, Err(RustUdError::ServerError(_))));
    Ok(())
}
