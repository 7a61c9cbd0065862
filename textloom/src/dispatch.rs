// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off of layout requests to the privileged thread.
//!
//! The engine context is owned by one privileged thread; other threads
//! never touch the cache tables. When asynchronous layout is disabled an
//! off-thread request becomes a blocking round-trip through this
//! dispatcher: the request is queued, the privileged thread services it
//! against the real caches on its next tick, and the caller resumes with
//! the result. There is no timeout; issuing a blocking request *from* the
//! privileged thread would wait on itself and is asserted against.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

use crate::layout::Layout;
use crate::rich::FlatText;
use crate::style::{LayoutFlags, Style};

pub(crate) enum Request {
    Plain {
        text: String,
        style: Style,
        flags: LayoutFlags,
        reply: Sender<Arc<Layout>>,
    },
    Sequence {
        text: FlatText,
        flags: LayoutFlags,
        reply: Sender<Arc<Layout>>,
    },
}

/// Cloneable handle for queueing layout work onto the privileged thread.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: Sender<Request>,
    privileged: ThreadId,
}

pub(crate) fn channel(privileged: ThreadId) -> (Dispatcher, Receiver<Request>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (Dispatcher { tx, privileged }, rx)
}

impl Dispatcher {
    pub(crate) fn request_plain_blocking(
        &self,
        text: &str,
        style: &Style,
        flags: LayoutFlags,
    ) -> Arc<Layout> {
        self.round_trip(|reply| Request::Plain {
            text: text.to_owned(),
            style: style.clone(),
            flags,
            reply,
        })
    }

    pub(crate) fn request_sequence_blocking(
        &self,
        text: &FlatText,
        flags: LayoutFlags,
    ) -> Arc<Layout> {
        self.round_trip(|reply| Request::Sequence {
            text: text.clone(),
            flags,
            reply,
        })
    }

    fn round_trip(&self, make: impl FnOnce(Sender<Arc<Layout>>) -> Request) -> Arc<Layout> {
        debug_assert_ne!(
            thread::current().id(),
            self.privileged,
            "blocking layout hand-off issued from the privileged thread would deadlock"
        );
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        if self.tx.send(make(reply_tx)).is_err() {
            warn!("layout engine is gone, returning the empty layout");
            return Layout::empty();
        }
        reply_rx.recv().unwrap_or_else(|_| {
            warn!("layout engine dropped a pending request, returning the empty layout");
            Layout::empty()
        })
    }
}
