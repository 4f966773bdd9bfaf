//! Stacked editor: committable layers of [`Editor`] whose source maps compose transitively.
//!
//! Key ideas:
//!
//! - `layers[i].original() == layers[i - 1].to_string()`: each layer edits the previous layer's
//!   frozen output.
//! - `commit` freezes the current layer's output as the next layer's source; `rollback` discards
//!   the active layer and resumes editing the one below it.
//! - `generate_map` delegates to the single editor when there's only one layer; otherwise it
//!   collects each layer's decoded map, reverses them so the outermost comes first, and merges the
//!   chain with [`crate::merge`].

use crate::editor::Editor;
use crate::map::{self, DecodedMap, SourceMapOptions, SourceMapV3};
use crate::merge;
use crate::EditorError;

/// A stack of editors, each editing the previous layer's committed output.
#[derive(Debug, Clone)]
pub struct StackedEditor {
    layers: Vec<Editor>,
}

impl StackedEditor {
    /// Start a stack with a single base layer over `source`.
    pub fn new(source: impl AsRef<str>) -> Self {
        StackedEditor {
            layers: vec![Editor::new(source)],
        }
    }

    /// The active (topmost) layer.
    pub fn current(&self) -> &Editor {
        self.layers.last().expect("stack always has at least one layer")
    }

    /// The active (topmost) layer, mutably.
    pub fn current_mut(&mut self) -> &mut Editor {
        self.layers.last_mut().expect("stack always has at least one layer")
    }

    /// Number of layers currently on the stack.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Bind `content` to the left edge of original position `index`, in the active layer.
    pub fn append_left(&mut self, index: usize, content: impl AsRef<str>) -> Result<(), EditorError> {
        self.current_mut().append_left(index, content)
    }

    /// Bind `content` to the right edge of original position `index`, in the active layer.
    pub fn append_right(&mut self, index: usize, content: impl AsRef<str>) -> Result<(), EditorError> {
        self.current_mut().append_right(index, content)
    }

    /// Replace the active layer's original bytes `[start, end)` with `new_content`.
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        new_content: impl AsRef<str>,
    ) -> Result<(), EditorError> {
        self.current_mut().overwrite(start, end, new_content)
    }

    /// The active layer's current output.
    pub fn to_string(&self) -> String {
        self.current().to_string()
    }

    /// Freeze the active layer's output as a new layer's source, and push it onto the stack. The
    /// previous layer is retained so its decoded map can still contribute to a composed
    /// `generate_map`.
    pub fn commit(&mut self) {
        let next = Editor::new(self.current().to_string());
        self.layers.push(next);
    }

    /// Discard the active layer and resume editing the one below it. Fails if only the base layer
    /// remains.
    pub fn rollback(&mut self) -> Result<(), EditorError> {
        if self.layers.len() == 1 {
            return Err(EditorError::CannotRollbackBase);
        }
        self.layers.pop();
        Ok(())
    }

    /// Produce a single decoded map from the stack's final output back to the base layer's
    /// original source.
    pub fn generate_decoded_map(&self, options: &SourceMapOptions) -> Result<DecodedMap, EditorError> {
        if self.layers.len() == 1 {
            return Ok(self.layers[0].generate_decoded_map(options));
        }
        let mut decoded: Vec<DecodedMap> = self
            .layers
            .iter()
            .map(|layer| layer.generate_decoded_map(options))
            .collect();
        decoded.reverse();
        merge::merge(&decoded)
    }

    /// Produce a VLQ-encoded, JSON-serializable Source Map v3 from the stack's final output back
    /// to the base layer's original source.
    pub fn generate_map(&self, options: &SourceMapOptions) -> Result<SourceMapV3, EditorError> {
        let decoded = self.generate_decoded_map(options)?;
        Ok(map::encode_map(&decoded))
    }
}
