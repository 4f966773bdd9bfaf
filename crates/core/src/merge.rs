//! Trace-through-chain merger for a chain of decoded maps, used by the stacked editor.
//!
//! Key ideas:
//!
//! - Input is `M0, M1, ..., Mk`, where `M0`'s generated side is the final output and `Mj` maps
//!   layer `j`'s output back to layer `j - 1`'s output (`Mk` is the leaf, the only map allowed more
//!   than one source).
//! - For each segment in `M0`, trace its `(src_line, src_col)` through `M1`, `M2`, ..., `Mk` by
//!   binary-searching each intermediate line for a segment whose `gen_col` matches the running
//!   query column. The leaf segment's source position becomes the merged mapping's source.
//! - Sources and names encountered at the leaf are interned so repeated leaf sources/names collapse
//!   to a single index, rather than emitting one entry per trace.
//!
//! Invariants:
//!
//! - Every map but the last must carry exactly one source (`sources.len() == 1`); this is the
//!   "transform map" shape a single editor layer produces. Violating it is reported as
//!   `InvalidTransformMap`, not silently ignored.
//! - A trace that cannot find a matching `gen_col` at some depth, or whose intermediate segment
//!   has no source, is dropped rather than aborting the whole merge: a best-effort, partially
//!   mapped output is preferable to an all-or-nothing failure the spec does not ask for.

use std::collections::HashMap;

use crate::map::{DecodedMap, MappingSegment};
use crate::EditorError;

struct SourceAccumulator {
    sources: Vec<String>,
    contents: Vec<Option<String>>,
    index: HashMap<(String, Option<String>), u32>,
}

impl SourceAccumulator {
    fn new() -> Self {
        SourceAccumulator {
            sources: Vec::new(),
            contents: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, name: String, content: Option<String>) -> u32 {
        let key = (name, content);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.sources.len() as u32;
        self.sources.push(key.0.clone());
        self.contents.push(key.1.clone());
        self.index.insert(key, idx);
        idx
    }
}

struct StringInterner {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringInterner {
    fn new() -> Self {
        StringInterner {
            names: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, name: String) -> u32 {
        if let Some(&idx) = self.index.get(&name) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        idx
    }
}

/// Find the segment in `line` whose `gen_col` equals `col`, via binary search.
fn find_by_gen_col(line: &[MappingSegment], col: u32) -> Option<&MappingSegment> {
    line.binary_search_by_key(&col, |seg| seg.gen_col)
        .ok()
        .map(|idx| &line[idx])
}

/// Merge a non-empty chain of decoded maps into one mapping the outermost generated side directly
/// to the leaf map's sources.
pub fn merge(maps: &[DecodedMap]) -> Result<DecodedMap, EditorError> {
    let Some((m0, rest)) = maps.split_first() else {
        return Err(EditorError::NoSourceMaps);
    };
    if rest.is_empty() {
        return Ok(m0.clone());
    }

    let k = maps.len() - 1;
    for transform in &maps[..k] {
        if transform.sources.len() != 1 {
            return Err(EditorError::InvalidTransformMap(format!(
                "expected exactly one source, found {}",
                transform.sources.len()
            )));
        }
    }

    let mut source_acc = SourceAccumulator::new();
    let mut name_interner = StringInterner::new();
    let mut result_lines: Vec<Vec<MappingSegment>> = Vec::with_capacity(m0.mappings.len());

    for line in &m0.mappings {
        let mut out_line = Vec::new();
        for seg in line {
            if let Some(merged) = trace_segment(seg, maps, k, &mut source_acc, &mut name_interner) {
                out_line.push(merged);
            }
        }
        result_lines.push(out_line);
    }

    // Mirror `generate_decoded_map`'s convention: an empty `sources_content` means "no content was
    // requested", rather than a vec of `None`s. Since every interned entry traces back to the
    // leaf map's single source, content is either present for all of them or none at all.
    let sources_content = if source_acc.contents.iter().all(Option::is_none) {
        Vec::new()
    } else {
        source_acc.contents
    };

    Ok(DecodedMap {
        file: m0.file.clone(),
        source_root: m0.source_root.clone(),
        sources: source_acc.sources,
        sources_content,
        names: name_interner.names,
        mappings: result_lines,
    })
}

fn trace_segment(
    seg: &MappingSegment,
    maps: &[DecodedMap],
    k: usize,
    source_acc: &mut SourceAccumulator,
    name_interner: &mut StringInterner,
) -> Option<MappingSegment> {
    seg.src_idx?;

    let mut cur_line = seg.src_line;
    let mut cur_col = seg.src_col;
    let mut name: Option<String> = seg
        .name_idx
        .and_then(|idx| maps[0].names.get(idx as usize).cloned());

    for depth in 1..=k {
        let map = &maps[depth];
        let found = map
            .mappings
            .get(cur_line as usize)
            .and_then(|line| find_by_gen_col(line, cur_col))?;

        if depth < k && found.src_idx != Some(0) {
            return None;
        }

        if let Some(name_idx) = found.name_idx {
            name = map.names.get(name_idx as usize).cloned();
        }

        if depth == k {
            let src_idx = found.src_idx?;
            let source_name = map.sources.get(src_idx as usize)?.clone();
            let source_content = map.sources_content.get(src_idx as usize).cloned().flatten();
            let interned = source_acc.intern(source_name, source_content);
            return Some(MappingSegment {
                gen_col: seg.gen_col,
                src_idx: Some(interned),
                src_line: found.src_line,
                src_col: found.src_col,
                name_idx: name.map(|n| name_interner.intern(n)),
            });
        }

        cur_line = found.src_line;
        cur_col = found.src_col;
    }

    unreachable!("loop always returns at depth == k")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(gen_col: u32, src_line: u32, src_col: u32) -> MappingSegment {
        MappingSegment {
            gen_col,
            src_idx: Some(0),
            src_line,
            src_col,
            name_idx: None,
        }
    }

    #[test]
    fn single_map_merge_is_a_structural_clone() {
        let m = DecodedMap {
            sources: vec!["a.js".to_string()],
            mappings: vec![vec![seg(0, 0, 0)]],
            ..Default::default()
        };
        let merged = merge(&[m.clone()]).unwrap();
        assert_eq!(merged, m);
    }

    #[test]
    fn empty_chain_is_no_source_maps_error() {
        let err = merge(&[]).unwrap_err();
        assert_eq!(err, EditorError::NoSourceMaps);
    }

    #[test]
    fn two_map_chain_traces_through_to_leaf_source() {
        // M0: generated output -> layer-1 output, one mapping at gen_col 0 pointing to (0, 2).
        let m0 = DecodedMap {
            sources: vec!["layer1".to_string()],
            mappings: vec![vec![seg(0, 0, 2)]],
            ..Default::default()
        };
        // M1 (leaf): layer-1 output -> original source, a mapping at gen_col 2 pointing to (0, 5)
        // in "orig.js".
        let m1 = DecodedMap {
            sources: vec!["orig.js".to_string()],
            mappings: vec![vec![seg(2, 0, 5)]],
            ..Default::default()
        };

        let merged = merge(&[m0, m1]).unwrap();
        assert_eq!(merged.sources, vec!["orig.js".to_string()]);
        assert_eq!(merged.mappings.len(), 1);
        assert_eq!(merged.mappings[0].len(), 1);
        let out = merged.mappings[0][0];
        assert_eq!(out.gen_col, 0);
        assert_eq!(out.src_line, 0);
        assert_eq!(out.src_col, 5);
        // Neither input map carried source content, so the merged map shouldn't invent a
        // `None` placeholder for it either.
        assert!(merged.sources_content.is_empty());
    }

    #[test]
    fn leaf_content_present_is_carried_into_merged_sources_content() {
        let m0 = DecodedMap {
            sources: vec!["layer1".to_string()],
            mappings: vec![vec![seg(0, 0, 2)]],
            ..Default::default()
        };
        let m1 = DecodedMap {
            sources: vec!["orig.js".to_string()],
            sources_content: vec![Some("var x = 1".to_string())],
            mappings: vec![vec![seg(2, 0, 5)]],
            ..Default::default()
        };

        let merged = merge(&[m0, m1]).unwrap();
        assert_eq!(merged.sources_content, vec![Some("var x = 1".to_string())]);
    }

    #[test]
    fn trace_with_no_match_at_intermediate_depth_drops_the_segment() {
        let m0 = DecodedMap {
            sources: vec!["layer1".to_string()],
            mappings: vec![vec![seg(0, 0, 2)]],
            ..Default::default()
        };
        // M1 has no segment at gen_col 2 on line 0.
        let m1 = DecodedMap {
            sources: vec!["orig.js".to_string()],
            mappings: vec![vec![seg(9, 0, 0)]],
            ..Default::default()
        };

        let merged = merge(&[m0, m1]).unwrap();
        assert!(merged.mappings[0].is_empty());
    }

    #[test]
    fn non_leaf_map_with_multiple_sources_is_invalid_transform_map() {
        let m0 = DecodedMap {
            sources: vec!["a".to_string(), "b".to_string()],
            mappings: vec![vec![seg(0, 0, 0)]],
            ..Default::default()
        };
        let m1 = DecodedMap {
            sources: vec!["orig".to_string()],
            mappings: vec![vec![seg(0, 0, 0)]],
            ..Default::default()
        };
        let err = merge(&[m0, m1]).unwrap_err();
        assert!(matches!(err, EditorError::InvalidTransformMap(_)));
    }

    #[test]
    fn leaf_sources_repeated_across_traces_are_interned_once() {
        let m0 = DecodedMap {
            sources: vec!["layer1".to_string()],
            mappings: vec![vec![seg(0, 0, 0), seg(4, 0, 1)]],
            ..Default::default()
        };
        let m1 = DecodedMap {
            sources: vec!["orig.js".to_string()],
            mappings: vec![vec![seg(0, 2, 0), seg(1, 2, 1)]],
            ..Default::default()
        };

        let merged = merge(&[m0, m1]).unwrap();
        assert_eq!(merged.sources, vec!["orig.js".to_string()]);
        assert_eq!(merged.mappings[0].len(), 2);
        assert_eq!(merged.mappings[0][0].src_idx, Some(0));
        assert_eq!(merged.mappings[0][1].src_idx, Some(0));
    }

    #[test]
    fn three_map_chain_traces_through_two_intermediate_depths() {
        let m0 = DecodedMap {
            sources: vec!["layer2".to_string()],
            mappings: vec![vec![seg(0, 0, 1)]],
            ..Default::default()
        };
        let m1 = DecodedMap {
            sources: vec!["layer1".to_string()],
            mappings: vec![vec![seg(1, 0, 3)]],
            ..Default::default()
        };
        let m2 = DecodedMap {
            sources: vec!["orig.js".to_string()],
            mappings: vec![vec![seg(3, 7, 9)]],
            ..Default::default()
        };

        let merged = merge(&[m0, m1, m2]).unwrap();
        assert_eq!(merged.sources, vec!["orig.js".to_string()]);
        let out = merged.mappings[0][0];
        assert_eq!(out.src_line, 7);
        assert_eq!(out.src_col, 9);
    }
}
