//! Stand-in for the companion script: `stub-companion <addr> [behavior]`.
//!
//! Launched by the supervisor as `<interpreter> <script>`, so the listen
//! address arrives as the single argument. Logs go to stderr, where the
//! supervisor captures them.

use std::net::SocketAddr;
use std::process::ExitCode;

use flashgen_testkit::{StubBehavior, serve};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(addr) = args.next().and_then(|a| a.parse::<SocketAddr>().ok()) else {
        error!("usage: stub-companion <addr> [respond|missing-field|malformed|hang]");
        return ExitCode::from(2);
    };
    let behavior = match args.next().map(|b| b.parse::<StubBehavior>()) {
        None => StubBehavior::default(),
        Some(Ok(behavior)) => behavior,
        Some(Err(e)) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, ?behavior, "Stub companion listening");
    println!("Running on http://{addr}/");

    match serve(listener, behavior).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Stub companion server error");
            ExitCode::FAILURE
        }
    }
}
