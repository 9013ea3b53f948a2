//! Per-thread registry of live recorders, for resetting every stand-in in one call.
//!
//! Recorders are held weakly: dropping the last handle to a recorder removes it
//! from the registry on the next sweep. Only recorders created on the calling
//! thread are visible, which keeps parallel test threads isolated.

use crate::recorder::{Recorder, RecorderInner};
use std::cell::RefCell;
use std::sync::{Arc, Weak};

thread_local! {
    static LIVE_RECORDERS: RefCell<Vec<Weak<RecorderInner>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn track(inner: &Arc<RecorderInner>) {
    LIVE_RECORDERS.with(|cell| {
        let mut live = cell.borrow_mut();
        if live.len() == live.capacity() {
            live.retain(|weak| weak.strong_count() > 0);
        }
        live.push(Arc::downgrade(inner));
    });
}

fn live_recorders() -> Vec<Recorder> {
    LIVE_RECORDERS.with(|cell| {
        let mut live = cell.borrow_mut();
        live.retain(|weak| weak.strong_count() > 0);
        live.iter()
            .filter_map(Weak::upgrade)
            .map(Recorder::from_inner)
            .collect()
    })
}

pub fn live_recorder_count() -> usize {
    live_recorders().len()
}

/// Resets every live recorder created on this thread. Returns how many were reset.
pub fn reset_all_recorders() -> usize {
    let recorders = live_recorders();
    for recorder in &recorders {
        recorder.reset();
    }
    recorders.len()
}

/// Clears the logs of every live recorder created on this thread.
pub fn clear_all_recorders() -> usize {
    let recorders = live_recorders();
    for recorder in &recorders {
        recorder.clear();
    }
    recorders.len()
}
