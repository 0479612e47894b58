//! End-to-end tests using a hand-rolled HTTP client over raw TCP, covering
//! the cases a cooked client would normalize away (literal `../` targets,
//! half-closed connections, concurrency).

use mediashare::cli::Cli;
use mediashare::server::run_server;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct TestServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Serves `<tempdir>/served`; a `secret.txt` is planted next to the
    /// served root so traversal attempts have something real to reach for.
    fn new(threads: usize) -> Self {
        let dir = tempdir().unwrap();
        let served = dir.path().join("served");
        fs::create_dir(&served).unwrap();

        fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

        let mut file = File::create(served.join("test.txt")).unwrap();
        writeln!(file, "Hello from test file!").unwrap();

        fs::write(served.join("empty.bin"), b"").unwrap();

        let large: Vec<u8> = (0..5_000_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(served.join("large.bin"), &large).unwrap();

        let subdir = served.join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("nested.txt"), b"Nested file content\n").unwrap();

        let cli = Cli {
            directory: served,
            listen: "127.0.0.1".to_string(),
            port: 0,
            threads,
            verbose: false,
            detailed_logging: false,
        };

        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let (addr_tx, addr_rx) = mpsc::channel();

        let server_handle = thread::spawn(move || {
            if let Err(e) = run_server(cli, Some(shutdown_rx), Some(addr_tx)) {
                eprintln!("Server thread failed: {e}");
            }
        });

        let server_addr = addr_rx.recv().unwrap();

        TestServer {
            addr: server_addr,
            shutdown_tx,
            handle: Some(server_handle),
            _temp_dir: dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shutdown_tx.send(()).ok();
            handle.join().unwrap();
        }
    }
}

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends one request verbatim and reads the connection to EOF. The target
/// is written exactly as given, so `../` and friends reach the server
/// unnormalized.
fn raw_get(addr: SocketAddr, target: &str, extra_header: Option<&str>) -> RawResponse {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    let mut request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\n");
    if let Some(header) = extra_header {
        request.push_str(header);
        request.push_str("\r\n");
    }
    request.push_str("Connection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator in response");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.lines();
    let status_line = lines.next().unwrap();
    let status: u16 = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

#[test]
fn test_path_traversal_is_rejected() {
    let server = TestServer::new(4);

    for target in [
        "/../secret.txt",
        "/subdir/../../secret.txt",
        "/%2e%2e/secret.txt",
        "/subdir/%2e%2e/%2e%2e/secret.txt",
    ] {
        let res = raw_get(server.addr, target, None);
        assert!(
            res.status == 403 || res.status == 404,
            "traversal target {target} answered {}",
            res.status
        );
        assert!(
            !res.body.windows(10).any(|w| w == b"top secret"),
            "traversal target {target} leaked file content"
        );
    }
}

#[test]
fn test_traversal_inside_root_is_allowed() {
    let server = TestServer::new(4);
    // Dot-dot segments that stay inside the root are legitimate.
    let res = raw_get(server.addr, "/subdir/../test.txt", None);
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"Hello from test file!\n");
}

#[test]
fn test_malformed_request_line() {
    let server = TestServer::new(4);
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    stream.write_all(b"NONSENSE\r\n\r\n").unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    let head = String::from_utf8_lossy(&raw);
    assert!(head.starts_with("HTTP/1.1 400") || head.starts_with("HTTP/1.1 405"));

    // The serving loop must survive the bad request.
    let res = raw_get(server.addr, "/test.txt", None);
    assert_eq!(res.status, 200);
}

#[test]
fn test_immediately_closed_connection() {
    let server = TestServer::new(4);
    {
        let _ = TcpStream::connect(server.addr).unwrap();
        // Dropped without sending anything; the server must not panic.
    }
    let res = raw_get(server.addr, "/test.txt", None);
    assert_eq!(res.status, 200);
}

#[test]
fn test_range_on_empty_file_is_unsatisfiable() {
    let server = TestServer::new(4);
    let res = raw_get(server.addr, "/empty.bin", Some("Range: bytes=0-"));
    assert_eq!(res.status, 416);
    assert_eq!(res.header("Content-Range"), Some("bytes */0"));
}

#[test]
fn test_empty_file_without_range() {
    let server = TestServer::new(4);
    let res = raw_get(server.addr, "/empty.bin", None);
    assert_eq!(res.status, 200);
    assert_eq!(res.header("Content-Length"), Some("0"));
    assert!(res.body.is_empty());
}

#[test]
fn test_listing_not_starved_by_large_download() {
    let server = TestServer::new(8);
    let addr = server.addr;

    let download = thread::spawn(move || {
        let res = raw_get(addr, "/large.bin", None);
        assert_eq!(res.status, 200);
        assert_eq!(res.body.len(), 5_000_000);
    });

    let listings: Vec<_> = (0..50)
        .map(|_| {
            thread::spawn(move || {
                let res = raw_get(addr, "/", None);
                assert_eq!(res.status, 200);
                assert!(String::from_utf8_lossy(&res.body).contains("test.txt"));
            })
        })
        .collect();

    for handle in listings {
        handle.join().unwrap();
    }
    download.join().unwrap();
}

#[test]
fn test_download_stops_quietly_when_client_disconnects() {
    let server = TestServer::new(4);

    {
        let mut stream = TcpStream::connect(server.addr).unwrap();
        stream
            .write_all(format!("GET /large.bin HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", server.addr).as_bytes())
            .unwrap();
        // Read a little, then hang up mid-transfer.
        let mut first = [0u8; 4096];
        stream.read_exact(&mut first).unwrap();
    }

    // Give the worker a moment to notice the broken pipe, then confirm the
    // server still answers.
    thread::sleep(Duration::from_millis(200));
    let res = raw_get(server.addr, "/test.txt", None);
    assert_eq!(res.status, 200);
}

#[test]
fn test_api_status_over_raw_socket() {
    let server = TestServer::new(4);
    let res = raw_get(server.addr, "/api/status", None);
    assert_eq!(res.status, 200);
    assert_eq!(res.header("Content-Type"), Some("application/json"));

    let status: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(status["status"], "running");
    assert_eq!(status["total_directories"], 1);
    assert_eq!(status["total_files"], 3);
}

#[test]
fn test_head_requests_are_rejected() {
    let server = TestServer::new(4);
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    stream
        .write_all(format!("HEAD / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", server.addr).as_bytes())
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.1 405"));
}
