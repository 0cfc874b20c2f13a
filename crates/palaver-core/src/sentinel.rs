// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-of-turn marker handling for streamed replies.
//!
//! The streaming peer appends a reserved marker to signal the end of a turn.
//! The marker may arrive on its own or glued to the last piece of text, so it
//! is matched as a substring. It is never part of the displayed content.

use crate::types::ReplyEvent;

/// Marker the reference backend appends after the last chunk of a reply.
pub const DEFAULT_END_MARKER: &str = "[END]";

/// A classified inbound text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Plain content.
    Chunk(&'a str),
    /// The frame carries the end marker. `before` is the text preceding it;
    /// anything after the marker is dropped.
    End { before: &'a str },
}

/// Classifies a raw frame against `marker`.
pub fn classify<'a>(frame: &'a str, marker: &str) -> Frame<'a> {
    match frame.find(marker) {
        Some(pos) if !marker.is_empty() => Frame::End {
            before: &frame[..pos],
        },
        _ => Frame::Chunk(frame),
    }
}

impl Frame<'_> {
    /// Converts the frame into the reply events it stands for.
    pub fn into_events(self) -> Vec<ReplyEvent> {
        match self {
            Frame::Chunk(text) => vec![ReplyEvent::Chunk(text.to_string())],
            Frame::End { before } if before.is_empty() => vec![ReplyEvent::End],
            Frame::End { before } => {
                vec![ReplyEvent::Chunk(before.to_string()), ReplyEvent::End]
            }
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Frame::End { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_chunk() {
        assert_eq!(classify("Hello", DEFAULT_END_MARKER), Frame::Chunk("Hello"));
    }

    #[test]
    fn bare_marker_ends_turn() {
        let frame = classify("[END]", DEFAULT_END_MARKER);
        assert_eq!(frame, Frame::End { before: "" });
        assert_eq!(frame.into_events(), vec![ReplyEvent::End]);
    }

    #[test]
    fn text_before_marker_is_kept_and_after_is_dropped() {
        let frame = classify("lo![END]trailing", DEFAULT_END_MARKER);
        assert_eq!(frame, Frame::End { before: "lo!" });
        assert_eq!(
            frame.into_events(),
            vec![ReplyEvent::Chunk("lo!".into()), ReplyEvent::End]
        );
    }

    #[test]
    fn custom_marker() {
        assert!(classify("done<<EOT>>", "<<EOT>>").is_end());
        assert!(!classify("done[END]", "<<EOT>>").is_end());
    }

    #[test]
    fn empty_marker_never_matches() {
        assert_eq!(classify("abc", ""), Frame::Chunk("abc"));
    }
}
