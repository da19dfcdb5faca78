// src/transport/mod.rs

//! Getting scripts from producers into the operation loop.
//!
//! A script is parsed in full before anything is submitted; a script with a
//! bad line submits nothing.

pub mod http;

use crate::lang::{ParseError, Parser};
use crate::painter::{Operation, OperationLoop, Poster};
use log::debug;
use std::io::BufRead;

/// Anything operations can be posted to.
pub trait OperationSink: Send + Sync {
    fn post(&self, op: Operation);
}

impl OperationSink for Poster {
    fn post(&self, op: Operation) {
        Poster::post(self, op)
    }
}

impl OperationSink for OperationLoop {
    fn post(&self, op: Operation) {
        OperationLoop::post(self, op)
    }
}

/// Parse `input` and, if it is valid, post every operation in order.
///
/// Returns the number of operations posted.
pub fn submit_script<R, S>(parser: &Parser, sink: &S, input: R) -> Result<usize, ParseError>
where
    R: BufRead,
    S: OperationSink + ?Sized,
{
    let ops = parser.parse(input)?;
    let count = ops.len();
    for op in ops {
        sink.post(op);
    }
    debug!("submit_script: posted {} operations", count);
    Ok(count)
}
