use crate::cli::Cli;
use crate::error::AppError;
use crate::http::handle_client;
use crate::resolve::ServedRoot;
use log::{debug, error, info};
use rand::Rng;
use std::net::{SocketAddr, TcpListener};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use threadpool::ThreadPool;

/// Binds the listener and runs the accept loop until a shutdown signal
/// arrives on `shutdown_rx` (if given). Each accepted connection is handed
/// to its own pool worker, so one slow client never stalls the others; the
/// only state shared between workers is the read-only served root.
///
/// `addr_tx` reports the bound address back to the caller, which lets
/// tests bind port 0 and learn the real port.
pub fn run_server(
    cli: Cli,
    shutdown_rx: Option<mpsc::Receiver<()>>,
    addr_tx: Option<mpsc::Sender<SocketAddr>>,
) -> Result<(), AppError> {
    let root = Arc::new(ServedRoot::new(&cli.directory)?);

    let bind_address = format!("{}:{}", cli.listen, cli.port);
    let listener = TcpListener::bind(&bind_address)?;
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    if let Some(tx) = addr_tx {
        if tx.send(local_addr).is_err() {
            return Err(AppError::InternalServerError(
                "Failed to report the bound address to the caller".to_string(),
            ));
        }
    }

    info!(
        "Server listening on {} for directory '{}'",
        local_addr,
        root.path().display()
    );

    let pool = ThreadPool::new(cli.threads);

    'server_loop: loop {
        if let Some(ref rx) = shutdown_rx {
            if rx.try_recv().is_ok() {
                info!("Shutdown signal received. Shutting down gracefully.");
                break 'server_loop;
            }
        }

        match listener.accept() {
            Ok((stream, _)) => {
                let root = Arc::clone(&root);
                let peer_addr = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                let request_id = generate_request_id();
                let log_prefix = format!("[ReqID: {request_id}][Peer: {peer_addr}]");

                pool.execute(move || {
                    debug!("{log_prefix} Handling client connection");
                    handle_client(stream, &root, &log_prefix);
                    debug!("{log_prefix} Connection closed");
                });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(100));
                continue;
            }
            Err(e) => {
                error!("Error accepting connection: {e}");
            }
        }
    }

    info!("Server shut down.");
    Ok(())
}

fn generate_request_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}
