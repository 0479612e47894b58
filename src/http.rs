//! Per-request routing: classifies each request and drives the matching
//! handler. This module is the only place errors are mapped to HTTP
//! statuses.

use crate::api;
use crate::error::AppError;
use crate::fs::generate_directory_listing;
use crate::meta;
use crate::range::{parse_range, ByteRange, RangeSpec};
use crate::resolve::ServedRoot;
use crate::response::{send_error_response, HttpResponse};
use crate::stream::stream_range;
use crate::utils::{parse_request_line, percent_decode, percent_encode};
use humansize::{format_size, BINARY};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

/// Handles a single client connection. Any failure is turned into a
/// best-effort error response; nothing propagates to the accept loop.
pub fn handle_client(mut stream: TcpStream, root: &ServedRoot, log_prefix: &str) {
    if let Err(err) = serve_request(&mut stream, root, log_prefix) {
        warn!("{log_prefix} Request failed: {err}");
        send_error_response(&mut stream, &err, log_prefix);
    }
}

fn serve_request(
    stream: &mut TcpStream,
    root: &ServedRoot,
    log_prefix: &str,
) -> Result<(), AppError> {
    let reader = BufReader::new(&*stream);
    let mut lines_iter = reader.lines();

    let request_line = match lines_iter.next() {
        Some(Ok(line)) => line,
        Some(Err(e)) => return Err(AppError::Io(e)),
        None => return Err(AppError::BadRequest),
    };
    debug!("{log_prefix} Request line: {request_line}");

    let (method, target) = parse_request_line(&request_line).ok_or(AppError::BadRequest)?;
    if method != "GET" {
        return Err(AppError::MethodNotAllowed);
    }
    let target = target.split('?').next().unwrap_or(target);
    let path = percent_decode(target);
    if !path.starts_with('/') {
        return Err(AppError::BadRequest);
    }

    let mut headers = HashMap::new();
    for line in lines_iter {
        let line = line?;
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_ascii_lowercase(), value.to_string());
        }
    }

    // Classification order matters: first match wins.
    if path == "/api" || path.starts_with("/api/") {
        let response = api::handle_api_request(&path, root)?;
        return response.send(stream, log_prefix);
    }
    if let Some(target) = path.strip_prefix("/download/") {
        return serve_download(stream, root, target, log_prefix);
    }
    if let Some(name) = path.strip_prefix("/play/") {
        return serve_play(stream, root, name, log_prefix);
    }
    if path == "/" || path.ends_with('/') {
        return serve_directory(stream, root, &path, log_prefix);
    }
    serve_file(
        stream,
        root,
        &path,
        headers.get("range").map(String::as_str),
        log_prefix,
    )
}

/// Directory listing mode.
fn serve_directory(
    stream: &mut TcpStream,
    root: &ServedRoot,
    request_path: &str,
    log_prefix: &str,
) -> Result<(), AppError> {
    let dir = root.resolve(request_path)?;
    if !dir.is_dir() {
        return Err(AppError::NotFound);
    }
    let entries = meta::describe_children(&dir)?;
    info!(
        "{log_prefix} Directory listing for '{}' ({} entries)",
        dir.display(),
        entries.len()
    );
    let html = generate_directory_listing(&entries, request_path);
    HttpResponse::new(200, "OK").with_html_body(html).send(stream, log_prefix)
}

/// Forced attachment download. A bare name goes through the find-by-name
/// fallback; a target with a directory part resolves against the root
/// directly.
fn serve_download(
    stream: &mut TcpStream,
    root: &ServedRoot,
    target: &str,
    log_prefix: &str,
) -> Result<(), AppError> {
    let path = if target.contains('/') {
        root.resolve(target)?
    } else {
        root.find_by_name(target).ok_or(AppError::NotFound)?
    };
    if path.is_dir() {
        return Err(AppError::BadRequest);
    }

    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(AppError::BadRequest)?;
    let mut file = File::open(&path).map_err(AppError::from_fs)?;
    let size = file.metadata()?.len();
    info!(
        "{log_prefix} Download started: '{}' ({})",
        display_name,
        format_size(size, BINARY)
    );

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Disposition: attachment; filename=\"{}\"\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n",
        meta::mime_type(&path),
        display_name,
        size
    );
    stream.write_all(header.as_bytes())?;

    if size > 0 {
        let range = ByteRange {
            start: 0,
            end: size - 1,
            total: size,
        };
        let sent = stream_range(&mut file, &range, stream)?;
        if sent == size {
            info!("{log_prefix} Download completed: '{display_name}'");
        } else {
            warn!("{log_prefix} Download incomplete: '{display_name}' ({sent}/{size} bytes)");
        }
    }
    Ok(())
}

/// Play mode: a 302 redirect to the file's direct URL instead of inline
/// streaming.
fn serve_play(
    stream: &mut TcpStream,
    root: &ServedRoot,
    name: &str,
    log_prefix: &str,
) -> Result<(), AppError> {
    let path = root.resolve(name)?;
    if path.is_dir() {
        return Err(AppError::NotFound);
    }
    info!("{log_prefix} Redirecting '{name}' to its direct URL");
    HttpResponse::new(302, "Found")
        .add_header(
            "Location".to_string(),
            format!("/{}", percent_encode(name.trim_start_matches('/'))),
        )
        .send(stream, log_prefix)
}

/// Raw file mode, Range-aware: 200 for the whole file, 206 with a
/// `Content-Range` for a partial span. `Accept-Ranges: bytes` is always
/// advertised.
fn serve_file(
    stream: &mut TcpStream,
    root: &ServedRoot,
    request_path: &str,
    range_header: Option<&str>,
    log_prefix: &str,
) -> Result<(), AppError> {
    let path = root.resolve(request_path)?;
    if path.is_dir() {
        // Directory reached without a trailing slash: point the client at
        // the listing URL.
        return HttpResponse::new(301, "Moved Permanently")
            .add_header(
                "Location".to_string(),
                format!("{}/", percent_encode(request_path)),
            )
            .send(stream, log_prefix);
    }

    let mut file = File::open(&path).map_err(AppError::from_fs)?;
    let size = file.metadata()?.len();

    let (status_code, status_text, range) = match parse_range(range_header, size)? {
        RangeSpec::Full => (
            200,
            "OK",
            ByteRange {
                start: 0,
                end: size.saturating_sub(1),
                total: size,
            },
        ),
        RangeSpec::Partial(r) => (206, "Partial Content", r),
    };
    let content_length = if size == 0 { 0 } else { range.byte_count() };

    let mut header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n",
        status_code,
        status_text,
        meta::mime_type(&path),
        content_length
    );
    if status_code == 206 {
        header.push_str(&format!(
            "Content-Range: bytes {}-{}/{}\r\n",
            range.start, range.end, range.total
        ));
    }
    header.push_str("\r\n");
    stream.write_all(header.as_bytes())?;

    if content_length > 0 {
        let sent = stream_range(&mut file, &range, stream)?;
        debug!(
            "{log_prefix} Sent {sent} of {content_length} bytes for '{}'",
            path.display()
        );
    }
    Ok(())
}
