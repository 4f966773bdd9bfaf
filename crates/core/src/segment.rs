//! The segment list that tracks provenance through inserts, splits, and overwrites.
//!
//! Invariants (enforced by every mutating method on [`SegmentStore`]):
//!
//! 1. **Coverage**: summing `original_end - original_start` across all segments equals the
//!    length of the original source.
//! 2. **Monotonic ranges**: `segments[i].original_end <= segments[i + 1].original_start`, with
//!    equality required between adjacent coverage segments.
//! 3. **Address uniqueness**: every original byte offset is covered by exactly one segment.
//! 4. **Edge binding**: `intro` binds to `original_start`, `outro` binds to `original_end`;
//!    splitting carries `intro` to the left child and `outro` to the right child only, never
//!    both.

use std::rc::Rc;

/// One contiguous run of the eventual output.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Bytes this segment contributes to the output body.
    pub content: Vec<u8>,
    /// Byte offset into the original source, present iff `content` is a slice of it.
    pub source_offset: Option<usize>,
    /// Half-open `[start, end)` range of the original source this segment accounts for.
    pub original_start: usize,
    pub original_end: usize,
    /// Bytes emitted immediately before `content`.
    pub intro: Vec<u8>,
    /// Bytes emitted immediately after `content`.
    pub outro: Vec<u8>,
}

impl Segment {
    fn source_backed(original: &Rc<[u8]>, start: usize, end: usize) -> Self {
        Segment {
            content: original[start..end].to_vec(),
            source_offset: Some(start),
            original_start: start,
            original_end: end,
            intro: Vec::new(),
            outro: Vec::new(),
        }
    }

    /// Total number of bytes this segment contributes to the output, including `intro`/`outro`.
    pub fn output_len(&self) -> usize {
        self.intro.len() + self.content.len() + self.outro.len()
    }

    /// Whether this segment's `content` is a slice of the original source.
    pub fn is_source_backed(&self) -> bool {
        self.source_offset.is_some()
    }
}

/// The ordered sequence of segments covering the original text plus insertions.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    original: Rc<[u8]>,
    segments: Vec<Segment>,
}

impl SegmentStore {
    /// Build a store for `original`, seeded with a single source-backed segment covering all of
    /// it (or no segments at all, if `original` is empty).
    pub fn new(original: Rc<[u8]>) -> Self {
        let segments = if original.is_empty() {
            Vec::new()
        } else {
            vec![Segment::source_backed(&original, 0, original.len())]
        };
        SegmentStore { original, segments }
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn is_empty_source(&self) -> bool {
        self.original.is_empty()
    }

    pub fn last_segment_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    /// Find the unique source-backed segment whose `[source_offset, source_offset+len)` contains
    /// `p`. Binary search over `original_start`, since segments are always kept sorted.
    pub fn find_by_source(&self, p: usize) -> Option<usize> {
        let idx = match self
            .segments
            .binary_search_by(|s| s.original_start.cmp(&p))
        {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let s = &self.segments[idx];
        if s.is_source_backed() && p >= s.original_start && p < s.original_end {
            Some(idx)
        } else {
            None
        }
    }

    /// Find the unique segment whose `[original_start, original_end)` contains `p`.
    pub fn find_by_original(&self, p: usize) -> Option<usize> {
        let idx = match self
            .segments
            .binary_search_by(|s| s.original_start.cmp(&p))
        {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        let s = &self.segments[idx];
        if p >= s.original_start && p < s.original_end {
            Some(idx)
        } else {
            None
        }
    }

    /// Split segment `i` at byte offset `rel` relative to its `content`.
    ///
    /// Pre: `0 < rel < len(content)` and the segment is source-backed (debug-checked only; this
    /// is a caller invariant documented in §4.2, not a user-facing error condition).
    pub fn split(&mut self, i: usize, rel: usize) {
        let seg = &self.segments[i];
        debug_assert!(seg.is_source_backed());
        debug_assert!(rel > 0 && rel < seg.content.len());

        let source_offset = seg.source_offset.unwrap();
        let split_at = seg.original_start + rel;

        let left = Segment {
            content: seg.content[..rel].to_vec(),
            source_offset: Some(source_offset),
            original_start: seg.original_start,
            original_end: split_at,
            intro: seg.intro.clone(),
            outro: Vec::new(),
        };
        let right = Segment {
            content: seg.content[rel..].to_vec(),
            source_offset: Some(source_offset + rel),
            original_start: split_at,
            original_end: seg.original_end,
            intro: Vec::new(),
            outro: seg.outro.clone(),
        };

        self.segments.splice(i..=i, [left, right]);
    }

    /// Replace `segments[a..=b]` with a single segment carrying `new_content`.
    pub fn replace_range(
        &mut self,
        a: usize,
        b: usize,
        new_content: Vec<u8>,
        saved_intro: Vec<u8>,
        saved_outro: Vec<u8>,
    ) {
        let original_start = self.segments[a].original_start;
        let original_end = self.segments[b].original_end;
        let replacement = Segment {
            content: new_content,
            source_offset: None,
            original_start,
            original_end,
            intro: saved_intro,
            outro: saved_outro,
        };
        self.segments.splice(a..=b, [replacement]);
    }

    /// Concatenate `intro ++ content ++ outro` of every segment, in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let total: usize = self.segments.iter().map(Segment::output_len).sum();
        let mut out = Vec::with_capacity(total);
        for s in &self.segments {
            out.extend_from_slice(&s.intro);
            out.extend_from_slice(&s.content);
            out.extend_from_slice(&s.outro);
        }
        out
    }

    /// Total output length, i.e. `to_bytes().len()` without allocating the bytes.
    pub fn output_len(&self) -> usize {
        self.segments.iter().map(Segment::output_len).sum()
    }

    /// Assert the coverage/uniqueness invariants hold. Used by tests and fuzz harnesses; not
    /// called on any user-facing path.
    #[cfg(any(test, feature = "invariant-checks"))]
    pub fn assert_invariants(&self) {
        let mut cursor = 0usize;
        for s in &self.segments {
            if s.original_end > s.original_start {
                assert_eq!(
                    s.original_start, cursor,
                    "coverage gap or overlap before segment starting at {}",
                    s.original_start
                );
                cursor = s.original_end;
            } else {
                assert_eq!(s.original_start, s.original_end);
                assert!(s.original_start == cursor || s.original_start <= self.original.len());
            }
        }
        assert_eq!(cursor, self.original.len(), "segments do not cover all of the original text");
    }
}
