//! Abort signalling carried through to the transport.
//!
//! The core never waits on a signal. It only attaches it to the request and
//! hands it to the dispatcher, which decides when to observe it, either by
//! checking `aborted()` or by awaiting `cancelled()` alongside its own I/O.

use tokio_util::sync::CancellationToken;

/// Read side of an abort signal. Clones observe the same abort.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the owning controller aborts.
    ///
    /// Resolves immediately if the abort already happened.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Owner of an `AbortSignal` that can trigger it.
#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    pub fn abort(&self) {
        self.signal.token.cancel();
    }
}
