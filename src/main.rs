//! Demonstration binary: loads the Portuguese news bundle, annotates three example
//! sentences, prints each token and its part-of-speech tag, then serves the
//! dependency-tree visualization until interrupted.

use rust_ud::pipelines::annotation::LanguageModel;
use rust_ud::viz::{self, VisualizationStyle};
use rust_ud::RustUdError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), RustUdError> {
    // logs go to stderr, keeping stdout for the report lines
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_ud=info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    //    Set-up model
    let model = LanguageModel::from_pretrained("pt_core_news_sm")?;

    //    Annotate the example sentences
    let docs = model.annotate(&[
        "Eu vi o menino com o telescópio",
        "Eu vi o menino que carregava o telescópio",
        "Luiz bebeu água, porém continua feio",
    ]);

    //    Print each token, then each token with its part-of-speech tag
    for token in &docs[0] {
        println!("{}", token.text);
    }
    for line in docs[0].pos_lines() {
        println!("{line}");
    }

    //    Serve the dependency-tree visualization (blocks until interrupted)
    viz::serve(&docs, VisualizationStyle::Dependency, Default::default())?;

    Ok(())
}
