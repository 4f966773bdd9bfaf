//! The single-layer non-destructive string editor.
//!
//! [`Editor`] owns an immutable copy of the source text and a [`SegmentStore`] tracking how that
//! text has been split, replaced, and flanked with insertions. `append_left`/`append_right`
//! translate original-offset addressing into segment operations; `overwrite` replaces a byte
//! range outright. `to_string` materializes the current output; `generate_map`/
//! `generate_decoded_map` produce a Source Map v3 pointing back at the original text.

use std::rc::Rc;

use crate::EditorError;
use crate::map::{self, DecodedMap, SourceMapOptions, SourceMapV3};
use crate::segment::SegmentStore;

/// A non-destructive editor over an immutable source text.
#[derive(Debug, Clone)]
pub struct Editor {
    store: SegmentStore,
    /// Cumulative output length before each segment; invalidated on every mutation.
    offset_cache: Option<Vec<usize>>,
}

impl Editor {
    /// Create an editor over `source`.
    pub fn new(source: impl AsRef<str>) -> Self {
        Self::new_bytes(source.as_ref().as_bytes())
    }

    /// Create an editor over raw bytes (need not be valid UTF-8; the output is byte-exact).
    pub fn new_bytes(source: &[u8]) -> Self {
        Editor {
            store: SegmentStore::new(Rc::from(source)),
            offset_cache: None,
        }
    }

    /// The original, immutable source bytes.
    pub fn original(&self) -> &[u8] {
        self.store.original()
    }

    /// The original source length in bytes.
    pub fn original_len(&self) -> usize {
        self.store.original_len()
    }

    /// Concatenate every segment's `intro ++ content ++ outro`, in order. Infallible: bytes that
    /// aren't valid UTF-8 (only reachable via [`Editor::new_bytes`]) are replaced with `U+FFFD`
    /// rather than panicking. Use [`Editor::to_bytes`] for a byte-exact result.
    pub fn to_string(&self) -> String {
        String::from_utf8_lossy(&self.store.to_bytes()).into_owned()
    }

    /// The output bytes, without requiring them to be valid UTF-8.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.store.to_bytes()
    }

    /// The current output length in bytes, via the (lazily recomputed) offset cache.
    pub fn output_len(&mut self) -> usize {
        self.warm_offset_cache();
        let cache = self.offset_cache.as_ref().unwrap();
        let last = self.store.segments().last();
        match (cache.last(), last) {
            (Some(&base), Some(seg)) => base + seg.output_len(),
            _ => 0,
        }
    }

    fn invalidate_cache(&mut self) {
        self.offset_cache = None;
    }

    fn warm_offset_cache(&mut self) {
        if self.offset_cache.is_some() {
            return;
        }
        let mut offsets = Vec::with_capacity(self.store.segments().len());
        let mut cursor = 0usize;
        for seg in self.store.segments() {
            offsets.push(cursor);
            cursor += seg.output_len();
        }
        self.offset_cache = Some(offsets);
    }

    /// Bind `content` to the left edge of original position `index`. Repeated calls at the same
    /// edge accumulate in call order at the end of the shared `intro`, so the oldest call ends up
    /// furthest from the anchor and the newest sits adjacent to the content.
    pub fn append_left(&mut self, index: usize, content: impl AsRef<str>) -> Result<(), EditorError> {
        let content = content.as_ref();
        if content.is_empty() {
            return Ok(());
        }
        let len = self.store.original_len();

        if index >= len {
            if index > len {
                return Err(EditorError::OffsetNotFound { offset: index });
            }
            return self.append_to_last_outro(content);
        }

        let seg_idx = match self.store.find_by_source(index) {
            Some(i) => i,
            None => match self.store.find_by_original(index) {
                Some(i) => i,
                None => return Err(EditorError::OffsetNotFound { offset: index }),
            },
        };

        let rel = index - self.store.segments()[seg_idx].original_start;
        if rel == 0 {
            self.store.segments_mut()[seg_idx]
                .intro
                .extend_from_slice(content.as_bytes());
        } else {
            self.store.split(seg_idx, rel);
            self.store.segments_mut()[seg_idx + 1]
                .intro
                .extend_from_slice(content.as_bytes());
        }
        self.invalidate_cache();
        Ok(())
    }

    /// Bind `content` to the right edge of original position `index`.
    pub fn append_right(&mut self, index: usize, content: impl AsRef<str>) -> Result<(), EditorError> {
        let content = content.as_ref();
        if content.is_empty() {
            return Ok(());
        }
        let len = self.store.original_len();

        if index >= len {
            if index > len {
                return Err(EditorError::OffsetNotFound { offset: index });
            }
            return self.append_to_last_outro(content);
        }

        let seg_idx = match self.store.find_by_source(index) {
            Some(i) => i,
            None => match self.store.find_by_original(index) {
                Some(i) => i,
                None => return Err(EditorError::OffsetNotFound { offset: index }),
            },
        };

        let seg = &self.store.segments()[seg_idx];
        let rel = index - seg.original_start;
        let ro = seg.original_end - seg.original_start;

        if rel == ro {
            if let Some(next) = self.store.segments_mut().get_mut(seg_idx + 1) {
                next.intro.extend_from_slice(content.as_bytes());
            } else {
                self.store.segments_mut()[seg_idx]
                    .outro
                    .extend_from_slice(content.as_bytes());
            }
        } else if rel == 0 {
            self.store.segments_mut()[seg_idx]
                .intro
                .extend_from_slice(content.as_bytes());
        } else {
            self.store.split(seg_idx, rel);
            self.store.segments_mut()[seg_idx]
                .outro
                .extend_from_slice(content.as_bytes());
        }
        self.invalidate_cache();
        Ok(())
    }

    fn append_to_last_outro(&mut self, content: &str) -> Result<(), EditorError> {
        match self.store.last_segment_mut() {
            Some(seg) => {
                seg.outro.extend_from_slice(content.as_bytes());
                self.invalidate_cache();
                Ok(())
            }
            None => Err(EditorError::OffsetNotFound { offset: 0 }),
        }
    }

    /// Replace the original bytes `[start, end)` with `new_content`.
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        new_content: impl AsRef<str>,
    ) -> Result<(), EditorError> {
        if start >= end {
            return Err(EditorError::InvalidRange { start, end });
        }
        let len = self.store.original_len();
        if end > len {
            return Err(EditorError::OffsetOutOfBounds { offset: end, len });
        }

        let start_idx = self
            .store
            .find_by_source(start)
            .ok_or(EditorError::OffsetNotFound { offset: start })?;
        let end_idx = self
            .store
            .find_by_source(end - 1)
            .ok_or(EditorError::OffsetNotFound { offset: end - 1 })?;

        // Split at `start` if it falls strictly inside its segment, then re-resolve `end_idx`
        // since splitting `start_idx` may shift everything after it by one index.
        let start_rel = start - self.store.segments()[start_idx].original_start;
        let (start_idx, end_idx) = if start_rel > 0 {
            self.store.split(start_idx, start_rel);
            (start_idx + 1, end_idx + 1)
        } else {
            (start_idx, end_idx)
        };

        let end_seg = &self.store.segments()[end_idx];
        let end_rel = end - end_seg.original_start;
        let end_idx = if end_rel < end_seg.content.len() {
            self.store.split(end_idx, end_rel);
            end_idx
        } else {
            end_idx
        };

        let saved_intro = self.store.segments()[start_idx].intro.clone();
        let saved_outro = self.store.segments()[end_idx].outro.clone();

        self.store.replace_range(
            start_idx,
            end_idx,
            new_content.as_ref().as_bytes().to_vec(),
            saved_intro,
            saved_outro,
        );
        self.invalidate_cache();
        Ok(())
    }

    /// Walk the segment store into an in-memory decoded Source Map v3.
    pub fn generate_decoded_map(&self, options: &SourceMapOptions) -> DecodedMap {
        map::generate_decoded_map(&self.store, options)
    }

    /// Generate a VLQ-encoded, JSON-serializable Source Map v3.
    pub fn generate_map(&self, options: &SourceMapOptions) -> SourceMapV3 {
        let decoded = self.generate_decoded_map(options);
        map::encode_map(&decoded)
    }

    /// Assert the underlying segment store's coverage/uniqueness invariants hold.
    #[cfg(any(test, feature = "invariant-checks"))]
    pub fn assert_invariants(&self) {
        self.store.assert_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_string_returns_source_unchanged_without_edits() {
        let e = Editor::new("var x = 1");
        assert_eq!(e.to_string(), "var x = 1");
    }

    #[test]
    fn overwrite_simple() {
        let mut e = Editor::new("var x = 1");
        e.overwrite(4, 5, "answer").unwrap();
        assert_eq!(e.to_string(), "var answer = 1");
    }

    #[test]
    fn combined_operations() {
        let mut e = Editor::new("var x = 1");
        e.append_left(0, "// Comment\n").unwrap();
        e.overwrite(4, 5, "answer").unwrap();
        e.append_right(9, ";").unwrap();
        assert_eq!(e.to_string(), "// Comment\nvar answer = 1;");
    }

    #[test]
    fn append_left_ordering_follows_call_order() {
        let mut e = Editor::new("world");
        e.append_left(0, "Hello ").unwrap();
        e.append_left(0, ">>> ").unwrap();
        assert_eq!(e.to_string(), "Hello >>> world");
    }

    #[test]
    fn append_right_ordering_is_newest_last() {
        let mut e = Editor::new("Hello");
        e.append_right(5, " world").unwrap();
        e.append_right(5, " <<<").unwrap();
        assert_eq!(e.to_string(), "Hello world <<<");
    }

    #[test]
    fn overwrite_then_append_left_at_boundary() {
        let mut e = Editor::new("abc");
        e.overwrite(1, 2, "XXX").unwrap();
        e.append_left(1, ">>>").unwrap();
        assert_eq!(e.to_string(), "a>>>XXXc");
    }

    #[test]
    fn overwrite_then_append_right_at_boundary() {
        let mut e = Editor::new("abc");
        e.overwrite(1, 2, "XXX").unwrap();
        e.append_right(1, "<<<").unwrap();
        assert_eq!(e.to_string(), "a<<<XXXc");
    }

    #[test]
    fn append_right_and_append_left_at_index_zero_share_the_same_intro() {
        // Both resolve to segment 0's intro and both append at its end, in call order — there's
        // no special-cased asymmetry at index 0.
        let mut e = Editor::new("x");
        e.append_right(0, "R").unwrap();
        e.append_left(0, "L").unwrap();
        assert_eq!(e.to_string(), "RLx");
    }

    #[test]
    fn append_left_past_end_is_offset_not_found() {
        let mut e = Editor::new("abc");
        let err = e.append_left(4, "x").unwrap_err();
        assert_eq!(err, EditorError::OffsetNotFound { offset: 4 });
    }

    #[test]
    fn append_left_at_end_appends_to_last_outro() {
        let mut e = Editor::new("abc");
        e.append_left(3, "!").unwrap();
        assert_eq!(e.to_string(), "abc!");
    }

    #[test]
    fn overwrite_rejects_empty_range() {
        let mut e = Editor::new("abc");
        let err = e.overwrite(1, 1, "x").unwrap_err();
        assert_eq!(err, EditorError::InvalidRange { start: 1, end: 1 });
    }

    #[test]
    fn overwrite_twice_on_same_bytes_fails() {
        let mut e = Editor::new("abcdef");
        e.overwrite(1, 3, "X").unwrap();
        let err = e.overwrite(1, 2, "Y").unwrap_err();
        assert_eq!(err, EditorError::OffsetNotFound { offset: 1 });
    }

    #[test]
    fn empty_append_is_a_noop() {
        let mut e = Editor::new("abc");
        e.append_left(1, "").unwrap();
        e.append_right(1, "").unwrap();
        assert_eq!(e.to_string(), "abc");
    }

    #[test]
    fn output_len_matches_to_string_length_after_edits() {
        let mut e = Editor::new("var x = 1");
        e.append_left(0, "// Comment\n").unwrap();
        e.overwrite(4, 5, "answer").unwrap();
        e.append_right(9, ";").unwrap();
        assert_eq!(e.output_len(), e.to_string().len());
    }
}
