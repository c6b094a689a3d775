//! Checkpoint screenshots kept for after-the-fact diagnosis.
//!
//! Evidence never drives a decision. A failed capture is logged and the flow
//! carries on.

use std::path::{Path, PathBuf};

use wishcart_browser::SessionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Wish list at the moment an item was found purchasable.
    Available,
    /// Checkout after the credit-card option was chosen.
    PaymentMethod,
    /// Page reached after "continue and pay", before card entry.
    PaymentForm,
}

impl Checkpoint {
    fn file_suffix(self) -> &'static str {
        match self {
            Checkpoint::Available => "available",
            Checkpoint::PaymentMethod => "checkout1",
            Checkpoint::PaymentForm => "checkout2",
        }
    }
}

#[derive(Debug)]
pub struct EvidenceRecorder {
    dir: PathBuf,
    prefix: String,
    captured: Vec<(Checkpoint, PathBuf)>,
}

impl EvidenceRecorder {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            captured: Vec::new(),
        }
    }

    /// Creates the evidence directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from `create_dir_all`.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Fixed file for `checkpoint`; overwritten on every run.
    #[must_use]
    pub fn path_for(&self, checkpoint: Checkpoint) -> PathBuf {
        self.dir
            .join(format!("{}-{}.png", self.prefix, checkpoint.file_suffix()))
    }

    /// Takes a full-page screenshot for `checkpoint`.
    pub async fn capture<S>(&mut self, session: &S, checkpoint: Checkpoint) -> Option<&Path>
    where
        S: SessionHandle + ?Sized,
    {
        let path = self.path_for(checkpoint);
        match session.screenshot(&path, true).await {
            Ok(()) => {
                tracing::info!(?checkpoint, path = %path.display(), "captured evidence");
                self.captured.push((checkpoint, path));
                self.captured.last().map(|(_, p)| p.as_path())
            }
            Err(e) => {
                tracing::warn!(?checkpoint, error = %e, "failed to capture evidence");
                None
            }
        }
    }

    /// Checkpoints captured so far, in order.
    #[must_use]
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.captured.iter().map(|(c, _)| *c).collect()
    }

    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.captured.iter().map(|(_, p)| p.clone()).collect()
    }
}
