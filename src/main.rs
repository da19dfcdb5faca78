// src/main.rs

//! Main entry point for `painter`.
//!
//! Usage: `painter [SCRIPT...]`
//!
//! Script files named on the command line are submitted at start-up. While
//! running, scripts are accepted over HTTP (if enabled) and single commands
//! are read from stdin. EOF on stdin shuts the painter down.

use anyhow::Context;
use log::{error, info, warn};
use painter::config::CONFIG;
use painter::display::HeadlessReceiver;
use painter::lang::Parser;
use painter::painter::{OperationLoop, State};
use painter::surface::HeadlessScreen;
use painter::transport::{self, http};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting painter...");
    let config = &*CONFIG;

    let parser = Parser::new(config.parser_options());
    let receiver = HeadlessReceiver::new(config.display.snapshot_dir.clone())
        .context("Failed to initialize headless receiver")?;
    let frames = receiver.frame_counter();

    let mut op_loop = OperationLoop::new(config.loop_options());
    let poster = op_loop
        .start(
            &HeadlessScreen,
            receiver,
            State::with_marker(config.marker()),
        )
        .context("Failed to start operation loop")?;

    // --- Start-up scripts ---
    for path in std::env::args().skip(1) {
        let file =
            File::open(&path).with_context(|| format!("Failed to open script '{}'", path))?;
        match transport::submit_script(&parser, &poster, BufReader::new(file)) {
            Ok(count) => info!("Submitted {} operations from '{}'", count, path),
            Err(e) => error!("Rejected script '{}': {}", path, e),
        }
    }

    // --- HTTP listener ---
    if config.transport.enabled {
        let addr = &config.transport.listen_addr;
        let listener =
            TcpListener::bind(addr).with_context(|| format!("Failed to bind {}", addr))?;
        http::spawn(
            listener,
            parser.clone(),
            Arc::new(poster.clone()),
            config.transport.max_body_bytes,
        )?;
    }

    // --- Console ---
    info!("Reading commands from stdin, EOF stops the painter");
    for (idx, line) in io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        };
        match parser.parse_line(&line, idx + 1) {
            Ok(Some(op)) => poster.post(op),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }

    op_loop.stop_and_wait();
    info!(
        "Painter stopped after {} frames",
        frames.load(Ordering::SeqCst)
    );
    Ok(())
}
