/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for long-running processes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for node generation and weight assembly.

use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use std::thread;

/// Progress events emitted during long-running computations.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// Event indicating that boundary and interior seed nodes have been placed.
    NodesSeeded {
        num_boundary: usize,
        num_interior: usize,
    },

    /// Event indicating iteration status for the node relaxation loop.
    RelaxationIteration {
        iter: usize,
        max_displacement: f64,
        progress: f64,
    },

    /// Event indicating that node relaxation stopped at the iteration cap without
    /// meeting the convergence tolerance. Non-fatal; the node set is usable but
    /// less uniform than a converged one.
    ConvergenceWarning {
        iterations: usize,
        final_max_displacement: f64,
        tolerance: f64,
    },

    /// Event indicating how many stencil weight rows have been solved so far.
    WeightRowsSolved {
        completed: usize,
        total: usize,
        progress: f64,
    },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}
