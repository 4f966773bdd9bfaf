//! The decoded map model, the generator that walks a segment list into one, and the VLQ-encoded
//! Source Map v3 wire format.
//!
//! Key ideas:
//!
//! - [`DecodedMap`] is the in-memory, line-oriented representation: one `Vec<MappingSegment>` per
//!   generated line, `gen_col` strictly increasing within each line.
//! - [`generate_decoded_map`] walks a [`SegmentStore`]'s segments left to right, tracking the
//!   generated position and, for source-backed/replacement content, the corresponding source
//!   position.
//! - [`encode_map`] serializes a [`DecodedMap`] into the VLQ-Base64 `mappings` string and wraps it
//!   in the JSON-serializable [`SourceMapV3`].
//!
//! Invariants:
//!
//! - `intro`/`outro` bytes never produce mappings; they only advance the generated position.
//! - A replacement segment's content maps every wrapped line back to the *same*
//!   `(src_line, src_col)` pair — the replacement occupies one original position, not a range.

use crate::segment::SegmentStore;
use crate::vlq;

/// One tied generated/source position within a single generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSegment {
    pub gen_col: u32,
    pub src_idx: Option<u32>,
    pub src_line: u32,
    pub src_col: u32,
    pub name_idx: Option<u32>,
}

/// A Source Map v3 in its decoded (pre-VLQ) form, one `Vec` of segments per generated line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMap {
    pub file: Option<String>,
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    pub mappings: Vec<Vec<MappingSegment>>,
}

/// Options controlling [`generate_decoded_map`]/[`encode_map`]. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct SourceMapOptions {
    pub file: Option<String>,
    pub source_root: Option<String>,
    pub source: Option<String>,
    pub include_content: bool,
    /// Reserved for finer (sub-segment) mappings; unused by the current generator.
    pub hires: bool,
}

/// The JSON wire format for a Source Map v3, per the spec at
/// <https://tc39.es/source-map/>.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SourceMapV3 {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "sourceRoot", skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// Compute the byte offsets where each line of `bytes` starts (always includes `0`).
fn line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// Convert an absolute byte offset into a zero-based `(line, column)` pair via binary search.
fn byte_to_line_col(starts: &[usize], offset: usize) -> (u32, u32) {
    let line = match starts.binary_search(&offset) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) => i - 1,
    };
    (line as u32, (offset - starts[line]) as u32)
}

/// Accumulates generated-side lines while walking a segment list.
struct Walker {
    lines: Vec<Vec<MappingSegment>>,
    cur: Vec<MappingSegment>,
    gen_col: u32,
}

impl Walker {
    fn new() -> Self {
        Walker {
            lines: Vec::new(),
            cur: Vec::new(),
            gen_col: 0,
        }
    }

    fn flush_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.cur));
        self.gen_col = 0;
    }

    fn finish(mut self) -> Vec<Vec<MappingSegment>> {
        self.lines.push(self.cur);
        self.lines
    }

    /// Walk bytes for generated-position bookkeeping only; emits no mappings. Used for
    /// `intro`/`outro` and for pure-insertion content.
    fn walk_position_only(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if b == b'\n' {
                self.flush_line();
            } else {
                self.gen_col += 1;
            }
        }
    }

    /// Walk a source-backed segment's content: one mapping per generated line, `src_col`
    /// advancing with `gen_col`.
    fn walk_source_backed(&mut self, content: &[u8], source_offset: usize, source_starts: &[usize]) {
        let (mut src_line, mut src_col) = byte_to_line_col(source_starts, source_offset);
        let mut first_in_line = true;
        for &b in content {
            if b == b'\n' {
                self.flush_line();
                first_in_line = true;
                src_line += 1;
                src_col = 0;
            } else {
                if first_in_line {
                    self.cur.push(MappingSegment {
                        gen_col: self.gen_col,
                        src_idx: Some(0),
                        src_line,
                        src_col,
                        name_idx: None,
                    });
                    first_in_line = false;
                }
                self.gen_col += 1;
                src_col += 1;
            }
        }
    }

    /// Walk a replacement segment's content: every wrapped generated line re-emits the same
    /// `(src_line, src_col)` pair, since the replacement stands in for one original position.
    fn walk_replacement(&mut self, content: &[u8], original_start: usize, source_starts: &[usize]) {
        let (src_line, src_col) = byte_to_line_col(source_starts, original_start);
        let mut first_in_line = true;
        for &b in content {
            if b == b'\n' {
                self.flush_line();
                first_in_line = true;
            } else {
                if first_in_line {
                    self.cur.push(MappingSegment {
                        gen_col: self.gen_col,
                        src_idx: Some(0),
                        src_line,
                        src_col,
                        name_idx: None,
                    });
                    first_in_line = false;
                }
                self.gen_col += 1;
            }
        }
    }
}

/// Walk `store`'s segments into a [`DecodedMap`] against `options`.
pub fn generate_decoded_map(store: &SegmentStore, options: &SourceMapOptions) -> DecodedMap {
    let source_starts = line_starts(store.original());
    let mut walker = Walker::new();

    for seg in store.segments() {
        walker.walk_position_only(&seg.intro);
        match seg.source_offset {
            Some(source_offset) if !seg.content.is_empty() => {
                walker.walk_source_backed(&seg.content, source_offset, &source_starts);
            }
            None if seg.original_end > seg.original_start && !seg.content.is_empty() => {
                walker.walk_replacement(&seg.content, seg.original_start, &source_starts);
            }
            _ => walker.walk_position_only(&seg.content),
        }
        walker.walk_position_only(&seg.outro);
    }

    let sources_content = if options.include_content {
        vec![Some(String::from_utf8_lossy(store.original()).into_owned())]
    } else {
        Vec::new()
    };

    DecodedMap {
        file: options.file.clone(),
        source_root: options.source_root.clone(),
        sources: vec![options.source.clone().unwrap_or_default()],
        sources_content,
        names: Vec::new(),
        mappings: walker.finish(),
    }
}

/// VLQ-encode a [`DecodedMap`]'s `mappings` and wrap it into a [`SourceMapV3`].
pub fn encode_map(decoded: &DecodedMap) -> SourceMapV3 {
    let mut out = String::new();
    let mut prev_src_idx: i64 = 0;
    let mut prev_src_line: i64 = 0;
    let mut prev_src_col: i64 = 0;
    let mut prev_name_idx: i64 = 0;

    for (line_idx, line) in decoded.mappings.iter().enumerate() {
        if line_idx > 0 {
            out.push(';');
        }
        let mut prev_gen_col: i64 = 0;
        for (seg_idx, seg) in line.iter().enumerate() {
            if seg_idx > 0 {
                out.push(',');
            }
            let mut fields = vec![seg.gen_col as i64 - prev_gen_col];
            prev_gen_col = seg.gen_col as i64;

            if let Some(src_idx) = seg.src_idx {
                let src_idx = src_idx as i64;
                let src_line = seg.src_line as i64;
                let src_col = seg.src_col as i64;
                fields.push(src_idx - prev_src_idx);
                fields.push(src_line - prev_src_line);
                fields.push(src_col - prev_src_col);
                prev_src_idx = src_idx;
                prev_src_line = src_line;
                prev_src_col = src_col;

                if let Some(name_idx) = seg.name_idx {
                    let name_idx = name_idx as i64;
                    fields.push(name_idx - prev_name_idx);
                    prev_name_idx = name_idx;
                }
            }

            out.push_str(&vlq::encode_segment(&fields));
        }
    }

    SourceMapV3 {
        version: 3,
        file: decoded.file.clone(),
        source_root: decoded.source_root.clone(),
        sources: decoded.sources.clone(),
        sources_content: if decoded.sources_content.is_empty() {
            None
        } else {
            Some(decoded.sources_content.clone())
        },
        names: decoded.names.clone(),
        mappings: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn store(src: &str) -> SegmentStore {
        SegmentStore::new(Rc::from(src.as_bytes()))
    }

    #[test]
    fn line_starts_basic() {
        assert_eq!(line_starts(b"a\nbc\nd\n"), vec![0, 2, 5, 7]);
        assert_eq!(line_starts(b"a\nb"), vec![0, 2]);
        assert_eq!(line_starts(b""), vec![0]);
    }

    #[test]
    fn byte_to_line_col_basic() {
        let starts = line_starts(b"ab\ncde\nf");
        assert_eq!(byte_to_line_col(&starts, 0), (0, 0));
        assert_eq!(byte_to_line_col(&starts, 2), (0, 2));
        assert_eq!(byte_to_line_col(&starts, 3), (1, 0));
        assert_eq!(byte_to_line_col(&starts, 5), (1, 2));
        assert_eq!(byte_to_line_col(&starts, 7), (2, 0));
    }

    #[test]
    fn unedited_source_maps_one_segment_per_line() {
        let s = store("var x = 1");
        let decoded = generate_decoded_map(&s, &SourceMapOptions::default());
        assert_eq!(decoded.mappings.len(), 1);
        assert_eq!(
            decoded.mappings[0],
            vec![MappingSegment {
                gen_col: 0,
                src_idx: Some(0),
                src_line: 0,
                src_col: 0,
                name_idx: None,
            }]
        );
    }

    #[test]
    fn empty_source_produces_empty_mappings_string() {
        let s = store("");
        let decoded = generate_decoded_map(&s, &SourceMapOptions::default());
        let encoded = encode_map(&decoded);
        assert_eq!(encoded.mappings, "");
    }

    #[test]
    fn combined_operations_mappings_match_reference() {
        // source "var x = 1"; appendLeft(0,"// Comment\n"); overwrite(4,5,"answer");
        // appendRight(9,";") -> "// Comment\nvar answer = 1;"
        use crate::editor::Editor;

        let mut e = Editor::new("var x = 1");
        e.append_left(0, "// Comment\n").unwrap();
        e.overwrite(4, 5, "answer").unwrap();
        e.append_right(9, ";").unwrap();
        assert_eq!(e.to_string(), "// Comment\nvar answer = 1;");

        let options = SourceMapOptions {
            source: Some("input.js".to_string()),
            include_content: true,
            ..Default::default()
        };
        let map = e.generate_map(&options);
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["input.js".to_string()]);
        assert_eq!(map.sources_content, Some(vec![Some("var x = 1".to_string())]));
        assert_eq!(map.mappings, ";AAAA,IAAI,MAAC");
    }

    #[test]
    fn gen_col_is_strictly_increasing_within_each_line() {
        use crate::editor::Editor;

        let mut e = Editor::new("alpha\nbeta\ngamma");
        e.append_left(0, ">> ").unwrap();
        e.overwrite(6, 10, "BETA").unwrap();
        let decoded = e.generate_decoded_map(&SourceMapOptions::default());
        for line in &decoded.mappings {
            for pair in line.windows(2) {
                assert!(pair[0].gen_col < pair[1].gen_col);
            }
        }
    }

    #[test]
    fn semicolon_count_matches_newline_count_in_output() {
        use crate::editor::Editor;

        let mut e = Editor::new("alpha\nbeta\ngamma");
        e.append_left(0, ">> ").unwrap();
        e.overwrite(6, 10, "BETA").unwrap();
        let newline_count = e.to_string().matches('\n').count();
        let map = e.generate_map(&SourceMapOptions::default());
        assert_eq!(map.mappings.matches(';').count(), newline_count);
    }

    #[test]
    fn source_map_v3_serializes_with_camel_case_keys() {
        let decoded = DecodedMap {
            file: Some("out.js".to_string()),
            source_root: Some("/root".to_string()),
            sources: vec!["in.js".to_string()],
            sources_content: vec![Some("abc".to_string())],
            names: Vec::new(),
            mappings: vec![Vec::new()],
        };
        let map = encode_map(&decoded);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"sourceRoot\":\"/root\""));
        assert!(json.contains("\"sourcesContent\":[\"abc\"]"));
        assert!(json.contains("\"version\":3"));
    }

    #[test]
    fn omitted_content_skips_sources_content_field() {
        let decoded = DecodedMap {
            sources: vec![String::new()],
            mappings: vec![Vec::new()],
            ..Default::default()
        };
        let map = encode_map(&decoded);
        let json = serde_json::to_string(&map).unwrap();
        assert!(!json.contains("sourcesContent"));
    }
}
