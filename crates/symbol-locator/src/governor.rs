//! Degrade oversized answers to an empty value instead of truncating them.

use std::io;

use serde::Serialize;
use tracing::debug;

/// Result of bounding an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Governed<T> {
    Complete(T),
    /// The serialized answer was `chars` long, over `limit`.
    Oversized {
        chars: usize,
        limit: usize,
    },
}

impl<T: Default> Governed<T> {
    /// The answer, or the type's empty value when it was too large.
    pub fn into_value(self) -> T {
        match self {
            Self::Complete(value) => value,
            Self::Oversized {
                ..
            } => T::default(),
        }
    }
}

impl<T> Governed<T> {
    pub fn is_oversized(&self) -> bool {
        matches!(self, Self::Oversized { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSizeGovernor {
    max_chars: usize,
}

impl AnswerSizeGovernor {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
        }
    }

    /// Measure `value` as compact JSON. Serialization failures count as oversized.
    pub fn bound<T: Serialize>(
        &self,
        value: T,
    ) -> Governed<T> {
        let mut counter = CharCounter::default();
        let chars = match serde_json::to_writer(&mut counter, &value) {
            Ok(()) => counter.chars,
            Err(error) => {
                debug!("[governor] cannot measure answer: {error}");
                usize::MAX
            },
        };
        self.judge(value, chars)
    }

    /// Measure plain text by its character count.
    pub fn bound_text(
        &self,
        text: String,
    ) -> Governed<String> {
        let chars = text.chars().count();
        self.judge(text, chars)
    }

    fn judge<T>(
        &self,
        value: T,
        chars: usize,
    ) -> Governed<T> {
        if chars <= self.max_chars {
            return Governed::Complete(value);
        }
        debug!("[governor] answer of {chars} chars exceeds limit of {}", self.max_chars);
        Governed::Oversized {
            chars,
            limit: self.max_chars,
        }
    }
}

/// Compact JSON, the exact form [`AnswerSizeGovernor::bound`] measures.
pub fn answer_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// Counts UTF-8 scalar values written through it without buffering.
#[derive(Default)]
struct CharCounter {
    chars: usize,
}

impl io::Write for CharCounter {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        // Every scalar has exactly one non-continuation byte.
        self.chars += buf.iter().filter(|b| (**b & 0xC0) != 0x80).count();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/src/governor_tests.rs"]
mod tests;
