//! Sliding-window chunk production.
//!
//! Windows start at `0, step, 2*step, ...` where `step = size - overlap`.
//! Production stops after the first window that reaches the end of the transcript,
//! so the final full-size window is emitted exactly once. A shorter trailing window
//! is kept only when it holds at least `min_messages` messages.

use tracing::debug;

use super::error::WindowError;
use super::{Chunk, Message};
use crate::constants::{DEFAULT_MIN_CHUNK_MESSAGES, DEFAULT_WINDOW_OVERLAP, DEFAULT_WINDOW_SIZE};

/// Window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Messages per window.
    pub size: usize,
    /// Messages shared by consecutive windows.
    pub overlap: usize,
    /// Windows smaller than this are dropped.
    pub min_messages: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
            overlap: DEFAULT_WINDOW_OVERLAP,
            min_messages: DEFAULT_MIN_CHUNK_MESSAGES,
        }
    }
}

impl WindowConfig {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self {
            size,
            overlap,
            ..Self::default()
        }
    }

    pub fn min_messages(mut self, min_messages: usize) -> Self {
        self.min_messages = min_messages;
        self
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        if self.size == 0 {
            return Err(WindowError::ZeroSize);
        }
        if self.overlap >= self.size {
            return Err(WindowError::OverlapTooLarge {
                size: self.size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }

    /// Distance between the starts of consecutive windows.
    pub fn step(&self) -> Result<usize, WindowError> {
        self.validate()?;
        Ok(self.size - self.overlap)
    }
}

/// Splits `messages` into overlapping chunks.
pub fn sliding_windows(
    messages: &[Message],
    config: &WindowConfig,
) -> Result<Vec<Chunk>, WindowError> {
    let step = config.step()?;
    let len = messages.len();
    let min_messages = config.min_messages.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + config.size).min(len);
        if end - start >= min_messages {
            chunks.push(Chunk::new(start, messages[start..end].to_vec()));
        } else {
            debug!(start, end, min_messages, "Dropping short trailing window");
        }

        if start + config.size >= len {
            break;
        }
        start += step;
    }

    debug!(
        messages = len,
        windows = chunks.len(),
        size = config.size,
        overlap = config.overlap,
        "Sliding windows created"
    );
    Ok(chunks)
}
