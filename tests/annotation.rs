use rust_ud::pipelines::annotation::{AnnotationConfig, LanguageModel};
use rust_ud::RustUdError;

#[test]
#[cfg(feature = "remote")]
fn registry_rejects_unknown_identifiers() {
    for name in ["en_core_web_sm", "pt_core_news_lg", ""] {
        let result = AnnotationConfig::from_pretrained(name);
        assert!(
            matches!(result, Err(RustUdError::ModelNotAvailableError(_))),
            "{name:?} should not resolve"
        );
    }
}

#[test]
#[cfg(feature = "remote")]
fn registry_resolves_shipped_bundles() -> anyhow::Result<()> {
    for name in ["pt_core_news_sm", "pt_core_news_md"] {
        let _ = AnnotationConfig::from_pretrained(name)?;
    }
    Ok(())
}

#[test]
#[ignore] // requires the downloaded pretrained bundle
#[cfg(feature = "remote")]
fn annotate_telescope_sentence() -> anyhow::Result<()> {
    //    Set-up model
    let model = LanguageModel::from_pretrained("pt_core_news_sm")?;

    //    Define input
    let input = ["Eu vi o menino com o telescópio"];

    //    Run model
    let docs = model.annotate(&input);

    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert!(!doc.is_empty());
    assert_eq!(doc.tokens[0].text, "Eu");

    // token order matches the left-to-right order of the surface text
    let mut last_end = 0u32;
    for token in doc {
        let offset = token.offset.expect("token without offsets");
        assert!(offset.begin >= last_end);
        last_end = offset.end;
    }

    // exactly one root, pointing at itself
    let roots = doc
        .iter()
        .filter(|token| token.head == token.index)
        .collect::<Vec<_>>();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].dep, "root");
    Ok(())
}

#[test]
#[ignore] // requires the downloaded pretrained bundle
#[cfg(feature = "remote")]
fn report_lines_match_token_count() -> anyhow::Result<()> {
    let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
    let docs = model.annotate(&["Luiz bebeu água, porém continua feio"]);

    let doc = &docs[0];
    let lines = doc.pos_lines().collect::<Vec<String>>();
    assert_eq!(lines.len(), doc.len());
    for (line, token) in lines.iter().zip(doc.iter()) {
        assert_eq!(*line, format!("{}:{}", token.text, token.pos));
    }
    Ok(())
}

#[test]
#[ignore] // requires the downloaded pretrained bundle
#[cfg(feature = "remote")]
fn annotation_is_idempotent() -> anyhow::Result<()> {
    let model = LanguageModel::from_pretrained("pt_core_news_sm")?;
    let input = ["Eu vi o menino que carregava o telescópio"];

    let first = model.annotate(&input);
    let second = model.annotate(&input);

    let pairs = |docs: &[rust_ud::pipelines::doc::Doc]| {
        docs[0]
            .iter()
            .map(|token| (token.text.clone(), token.pos))
            .collect::<Vec<_>>()
    };
    assert_eq!(pairs(&first), pairs(&second));
    Ok(())
}
