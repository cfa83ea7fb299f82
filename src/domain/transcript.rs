use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::recognition::RecognitionSegment;

/// Join a finalized segment onto a transcript.
///
/// A single space is inserted when the transcript is non-empty, does not end
/// in whitespace, and the segment starts with neither punctuation nor
/// whitespace. An empty segment leaves the transcript unchanged.
pub fn merge_final(transcript: &str, segment: &str) -> String {
    let mut merged = String::with_capacity(transcript.len() + segment.len() + 1);
    merged.push_str(transcript);
    append_final(&mut merged, segment);
    merged
}

/// The interim buffer is always replaced wholesale.
pub fn replace_interim(segment: &str) -> String {
    segment.to_string()
}

fn append_final(transcript: &mut String, segment: &str) {
    if segment.is_empty() {
        return;
    }
    if needs_separator(transcript, segment) {
        transcript.push(' ');
    }
    transcript.push_str(segment);
}

fn needs_separator(transcript: &str, segment: &str) -> bool {
    let Some(last) = transcript.chars().next_back() else {
        return false;
    };
    let Some(first) = segment.chars().next() else {
        return false;
    };
    !last.is_whitespace() && !first.is_whitespace() && !is_punctuation(first)
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '…' | '«' | '»' | '“' | '”' | '‘' | '’' | '¿' | '¡' | '–' | '—' | '、' | '。' | '，'
        )
}

/// Transcript and interim text for one controller.
///
/// Text is zeroed in memory when cleared or dropped; dictated drafts do not
/// linger after a reset.
#[derive(Debug, Default, Zeroize, ZeroizeOnDrop)]
pub struct TranscriptBuffer {
    transcript: String,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Apply a batch of segments in order. Returns true if anything changed.
    ///
    /// Interim segments are ignored when `accept_interim` is false.
    pub fn apply(&mut self, segments: &[RecognitionSegment], accept_interim: bool) -> bool {
        let mut changed = false;
        for segment in segments {
            if segment.is_final {
                let before = self.transcript.len();
                append_final(&mut self.transcript, &segment.text);
                changed |= self.transcript.len() != before;
                changed |= self.clear_interim();
            } else if accept_interim && self.interim != segment.text {
                self.interim.zeroize();
                self.interim = replace_interim(&segment.text);
                changed = true;
            }
        }
        changed
    }

    /// Returns true if there was interim text to clear.
    pub fn clear_interim(&mut self) -> bool {
        if self.interim.is_empty() {
            return false;
        }
        self.interim.zeroize();
        true
    }

    pub fn clear(&mut self) {
        self.transcript.zeroize();
        self.interim.zeroize();
    }
}
