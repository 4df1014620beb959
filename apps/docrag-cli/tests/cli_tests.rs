use tempfile::TempDir;

use docrag_core::config::Settings;
use docrag_core::types::{Namespace, QueryRequest};

#[tokio::test]
async fn engine_from_default_settings_indexes_and_queries() {
    let tmp = TempDir::new().expect("tempdir");
    let docs = tmp.path().join("docs");
    std::fs::create_dir_all(&docs).expect("mkdir");
    std::fs::write(docs.join("faq.md"), "Deliveries arrive every Tuesday.").expect("write");

    let mut settings = Settings::default();
    settings.embedding.use_fake = true;
    let engine = docrag_cli::build_engine(&settings, tmp.path()).await.expect("engine");
    let ns = Namespace::new("shop").expect("namespace");
    let report = engine.index_directory(&ns, &docs).await.expect("index");
    assert_eq!(report.documents, 1);

    let result = engine.query(&QueryRequest::new("deliveries tuesday", ns.clone())).await.expect("query");
    assert_eq!(result.metadatas[0].source, "faq.md");
    assert_eq!(engine.namespaces().await.expect("list"), vec![ns]);
}
