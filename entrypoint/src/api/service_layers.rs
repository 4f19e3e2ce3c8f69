use axum::http::Method;
use tower::{
    ServiceBuilder,
    layer::util::{Identity, Stack},
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

type Layers = Stack<CorsLayer, Stack<TraceLayer<SharedClassifier<ServerErrorsAsFailures>>, Identity>>;

pub(crate) fn build_service_layers() -> ServiceBuilder<Layers> {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
}
