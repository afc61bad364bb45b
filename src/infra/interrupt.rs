// ============================================================
// Layer 6 — Interrupt Signal
// ============================================================
// Cooperative cancellation for the training loop.
//
// A process-wide Ctrl-C handler is installed once and flips a
// shared flag. The orchestrator polls the flag at the top of
// every batch and, when it is set, stops both loops and saves.
// Each run resets the flag before it starts.

use anyhow::{Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

static CTRL_C: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    /// The flag shared with the Ctrl-C handler, cleared for a new run.
    pub fn ctrl_c() -> Result<Self> {
        let flag = match CTRL_C.get() {
            Some(flag) => flag.clone(),
            None => {
                let flag = Arc::new(AtomicBool::new(false));
                let handler_flag = flag.clone();
                ctrlc::set_handler(move || {
                    handler_flag.store(true, Ordering::SeqCst);
                })
                .context("Cannot install Ctrl-C handler")?;
                CTRL_C.get_or_init(|| flag).clone()
            }
        };
        flag.store(false, Ordering::SeqCst);
        Ok(Self { flag })
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let signal = StopSignal::default();
        let observer = signal.clone();
        assert!(!observer.is_raised());
        signal.trigger();
        assert!(observer.is_raised());
    }
}
