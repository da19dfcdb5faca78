// src/transport/http.rs

//! Minimal HTTP/1.1 front end: the body of each `POST` request is one script.
//!
//! Responses:
//! - `200` with the number of operations submitted
//! - `400` when the request is malformed or the script does not parse
//! - `405` for any method other than `POST`
//! - `413` when the body exceeds the configured limit
//!
//! Connections are accepted and answered one at a time on the listener
//! thread, and closed after a single response. Request and header lines are
//! capped at `MAX_LINE_BYTES`. Keep-alive, chunked bodies and TLS are not
//! supported.

use crate::lang::Parser;
use crate::transport::{submit_script, OperationSink};
use anyhow::{Context, Result};
use log::*;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_HEADER_LINES: usize = 100;
/// Longest accepted request or header line, terminator included.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("request body of {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// A parsed request. Only what the handler needs is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
}

impl Response {
    fn new(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
        Response {
            status,
            reason,
            body: body.into(),
        }
    }

    fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.reason,
            self.body.len()
        )?;
        if self.status == 405 {
            out.write_all(b"Allow: POST\r\n")?;
        }
        out.write_all(b"\r\n")?;
        out.write_all(self.body.as_bytes())?;
        out.flush()
    }
}

/// Serve scripts from `listener` on a background thread.
pub fn spawn<S>(
    listener: TcpListener,
    parser: Parser,
    sink: Arc<S>,
    max_body_bytes: usize,
) -> Result<JoinHandle<()>>
where
    S: OperationSink + ?Sized + 'static,
{
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    let parser = Arc::new(parser);
    let handle = thread::Builder::new()
        .name("painter-http".to_string())
        .spawn(move || serve(listener, parser, sink, max_body_bytes))
        .context("Failed to spawn HTTP listener thread")?;
    info!("http: listening on http://{}", addr);
    Ok(handle)
}

/// Accept connections until the listener fails, answering each in turn.
pub fn serve<S>(listener: TcpListener, parser: Arc<Parser>, sink: Arc<S>, max_body_bytes: usize)
where
    S: OperationSink + ?Sized + 'static,
{
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("http: accept failed: {}", e);
                continue;
            }
        };
        if let Err(e) = handle_connection(stream, &parser, sink.as_ref(), max_body_bytes) {
            warn!("http: connection error: {:#}", e);
        }
    }
}

fn handle_connection<S>(
    mut stream: TcpStream,
    parser: &Parser,
    sink: &S,
    max_body_bytes: usize,
) -> Result<()>
where
    S: OperationSink + ?Sized,
{
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .context("Failed to set read timeout")?;
    stream
        .set_write_timeout(Some(WRITE_TIMEOUT))
        .context("Failed to set write timeout")?;
    let mut reader = BufReader::new(stream.try_clone().context("Failed to clone stream")?);

    let response = match read_request(&mut reader, max_body_bytes) {
        Ok(request) => {
            debug!(
                "http: {} {} from {} ({} bytes)",
                request.method,
                request.target,
                peer,
                request.body.len()
            );
            handle_request(&request, parser, sink)
        }
        Err(RequestError::BodyTooLarge { size, limit }) => Response::new(
            413,
            "Payload Too Large",
            format!("body of {} bytes exceeds limit of {} bytes\n", size, limit),
        ),
        Err(e) => Response::new(400, "Bad Request", format!("{}\n", e)),
    };

    response
        .write_to(&mut stream)
        .context("Failed to write response")
}

/// Turn one request into a response, submitting its script if it is valid.
pub fn handle_request<S>(request: &Request, parser: &Parser, sink: &S) -> Response
where
    S: OperationSink + ?Sized,
{
    if request.method != "POST" {
        return Response::new(405, "Method Not Allowed", "only POST is supported\n");
    }
    match submit_script(parser, sink, request.body.as_slice()) {
        Ok(count) => Response::new(200, "OK", format!("ok: {} operations\n", count)),
        Err(e) => {
            info!("http: rejected script: {}", e);
            Response::new(400, "Bad Request", format!("{}\n", e))
        }
    }
}

/// Read the request line, headers and a `Content-Length` delimited body.
pub fn read_request<R: BufRead>(reader: &mut R, max_body_bytes: usize) -> Result<Request, RequestError> {
    let mut line = String::new();
    if read_line_bounded(reader, &mut line)? == 0 {
        return Err(RequestError::Malformed("empty request".to_string()));
    }
    let mut parts = line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v)) if v.starts_with("HTTP/") => {
            (m.to_string(), t.to_string(), v.to_string())
        }
        _ => {
            return Err(RequestError::Malformed(format!(
                "bad request line '{}'",
                line.trim_end()
            )))
        }
    };
    trace!("http: request line {} {} {}", method, target, version);

    let mut content_length = 0usize;
    let mut header_lines = 0usize;
    loop {
        line.clear();
        if read_line_bounded(reader, &mut line)? == 0 {
            return Err(RequestError::Malformed(
                "connection closed inside headers".to_string(),
            ));
        }
        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        header_lines += 1;
        if header_lines > MAX_HEADER_LINES {
            return Err(RequestError::Malformed("too many headers".to_string()));
        }
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| RequestError::Malformed(format!("bad header '{}'", header)))?;
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().map_err(|_| {
                RequestError::Malformed(format!("bad Content-Length '{}'", value))
            })?;
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(RequestError::Malformed(format!(
                "unsupported Transfer-Encoding '{}'",
                value
            )));
        }
    }

    if content_length > max_body_bytes {
        return Err(RequestError::BodyTooLarge {
            size: content_length,
            limit: max_body_bytes,
        });
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(Request {
        method,
        target,
        body,
    })
}

/// `read_line` that gives up once a line exceeds `MAX_LINE_BYTES`.
fn read_line_bounded<R: BufRead>(reader: &mut R, line: &mut String) -> Result<usize, RequestError> {
    let mut bytes = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_BYTES as u64 + 1)
        .read_until(b'\n', &mut bytes)?;
    if read > MAX_LINE_BYTES {
        return Err(RequestError::Malformed(format!(
            "line longer than {} bytes",
            MAX_LINE_BYTES
        )));
    }
    let text = String::from_utf8(bytes)
        .map_err(|_| RequestError::Malformed("line is not valid UTF-8".to_string()))?;
    line.push_str(&text);
    Ok(read)
}
