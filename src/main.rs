use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use docx2html::{
    application::{convert::ConvertService, error::AppError},
    config,
    infra::{
        docx::DocxConverter,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SOURCE: &str = "docx2html::server";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let settings = Arc::new(settings);
    let convert = ConvertService::new(Arc::new(DocxConverter::new(
        settings.uploads.max_file_bytes.get(),
    )));
    let router = http::build_router(HttpState::new(convert, settings.clone()));

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = SOURCE,
        addr = %settings.server.addr,
        max_upload_bytes = settings.uploads.max_file_bytes.get(),
        "docx2html listening"
    );

    serve(listener, router, settings.server.graceful_shutdown).await
}

async fn serve(
    listener: TcpListener,
    router: axum::Router,
    graceful_shutdown: Duration,
) -> Result<(), AppError> {
    let (signalled_tx, mut signalled_rx) = watch::channel(false);

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(true);
    });

    // Bound how long in-flight requests may keep the process alive after a signal.
    let deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(graceful_shutdown).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| InfraError::server(err.to_string()))?;
            info!(target = SOURCE, "server stopped");
        }
        () = deadline => {
            warn!(
                target = SOURCE,
                timeout_secs = graceful_shutdown.as_secs(),
                "graceful shutdown timed out, dropping in-flight requests"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = SOURCE, error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = SOURCE, error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(target = SOURCE, "received Ctrl+C, shutting down gracefully"),
        () = terminate => info!(target = SOURCE, "received SIGTERM, shutting down gracefully"),
    }
}
