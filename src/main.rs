use std::sync::Arc;

mod api;
mod config;
mod models;
mod persistence;
mod service;
mod telemetry;
mod validator;

use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server,
};
use tower::Service as _;

#[cfg(feature = "telemetry")]
use {
    axum::{body::Body, http},
    tower_http::trace::TraceLayer,
    tower_request_id::{RequestId, RequestIdLayer},
    tracing::error_span,
    tracing_subscriber::{
        layer::{Layer, SubscriberExt},
        util::SubscriberInitExt,
    },
};

#[tokio::main]
async fn main() {
    #[cfg(feature = "telemetry")]
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
                .pretty()
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .init();

    let config = config::Config::from_env().unwrap_or_else(|e| panic!("invalid configuration: {}", e));

    let repo = Arc::new(
        persistence::database::Repository::new(&config.database)
            .await
            .unwrap_or_else(|e| {
                panic!(
                    "failed to connect to postgres database on {}: {}",
                    config.database.host, e
                )
            }),
    );

    let service = service::Service::new(repo, config.limits);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap_or_else(|_| panic!("failed to bind listener to port: {}", config.port));

    telemetry::info!(
        "Listening on {} (max withdrawal {}, minimum balance {})",
        listener.local_addr().expect("failed to get local addr"),
        config.limits.max_withdrawal,
        config.limits.minimum_balance
    );

    let app = api::app::new(Arc::new(service));

    #[cfg(feature = "telemetry")]
    let app = app
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown".into());

                error_span!(
                    "request",
                    id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(RequestIdLayer);

    // Continuously accept new connections.
    loop {
        let socket = match listener.accept().await {
            Ok((socket, _remote_addr)) => socket,
            #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
            Err(err) => {
                telemetry::error!("failed to accept connection: {}", err);

                continue;
            }
        };
        let tower_service = app.clone();

        tokio::spawn(async move {
            let socket = TokioIo::new(socket);

            let hyper_service =
                hyper::service::service_fn(move |request: axum::extract::Request<Incoming>| {
                    tower_service.clone().call(request)
                });

            #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
            if let Err(err) = server::conn::auto::Builder::new(TokioExecutor::new())
                .http2()
                .keep_alive_timeout(std::time::Duration::from_secs(120))
                .keep_alive_interval(std::time::Duration::from_secs(30))
                .timer(TokioTimer::new())
                .serve_connection(socket, hyper_service)
                .await
            {
                telemetry::error!("failed to serve connection: {}", err);
            }
        });
    }
}
