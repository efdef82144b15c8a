//! Service-level tests driving `SolveService` through the public API with a
//! scripted model shared behind an `Arc`.

use std::sync::Arc;

use snapsolve::core::types::SolveOutcome;
use snapsolve::io::model::ModelClient;
use snapsolve::solve::{SolveService, SolveSettings};
use snapsolve::test_support::{ScriptedModel, jpeg_data_url};

const FIRST: &str = r#"{"steps":[{"desc":"$$~~a~~$$","code":"d['a'] = 1"}]}"#;
const SECOND: &str = r#"{"steps":[{"desc":"$$~~a~~ ~~b~~$$","code":"d['b'] = 2"}]}"#;

#[tokio::test]
async fn concurrent_requests_do_not_share_values() {
    let model = Arc::new(ScriptedModel::new().reply(FIRST).reply(SECOND));
    let service = SolveService::new(Arc::clone(&model), SolveSettings::default()).expect("service");

    let image = jpeg_data_url();
    let (left, right) = tokio::join!(service.solve(&image), service.solve(&image));
    let mut rendered: Vec<String> = [left, right]
        .into_iter()
        .map(|outcome| outcome.expect("solve").into_result().steps[0].fragments[1].clone())
        .collect();
    rendered.sort();

    // `a` from one request never leaks into the other.
    assert_eq!(rendered, vec!["1".to_string(), "~~a~~ 2".to_string()]);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn trait_objects_can_back_the_service() {
    let model: Arc<dyn ModelClient> = Arc::new(ScriptedModel::new().reply(FIRST));
    let service = SolveService::new(model, SolveSettings::default()).expect("service");
    let outcome = service.solve(&jpeg_data_url()).await.expect("solve");
    assert!(matches!(outcome, SolveOutcome::Solved(_)));
    assert_eq!(service.model().name(), "scripted");
}

#[tokio::test]
async fn each_request_makes_exactly_one_model_call() {
    let model = Arc::new(ScriptedModel::new().reply("{}").reply(FIRST));
    let service = SolveService::new(Arc::clone(&model), SolveSettings::default()).expect("service");

    let degraded = service.solve(&jpeg_data_url()).await.expect("solve");
    assert!(degraded.is_degraded());
    assert_eq!(model.calls(), 1);

    let solved = service.solve(&jpeg_data_url()).await.expect("solve");
    assert!(!solved.is_degraded());
    assert_eq!(model.calls(), 2);
}
