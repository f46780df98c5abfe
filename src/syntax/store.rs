//! Line-state store
//!
//! Lines are addressed by index from the outside, but every line also
//! carries a stable [`LineId`] so deferred work can find its line again
//! (or notice it is gone) after lines were inserted or removed above it.

use std::collections::HashMap;

use super::state::{BlockState, LineData};
use crate::error::{RelexError, Result};

/// Stable identity of a line, unaffected by edits elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(u64);

#[derive(Debug, Clone)]
struct StoredLine {
    id: LineId,
    text: String,
    revision: u64,
    data: LineData,
}

/// Text and lexing results for every line of a document
#[derive(Debug, Clone, Default)]
pub struct LineStore {
    lines: Vec<StoredLine>,
    index: HashMap<LineId, usize>,
    next_id: u64,
    layout: u64,
}

impl LineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from lines of text, none of them lexed yet
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut store = Self::new();
        for text in lines {
            let line = store.make_line(text.to_string());
            store.lines.push(line);
        }
        store.reindex();
        store
    }

    fn make_line(&mut self, text: String) -> StoredLine {
        let id = LineId(self.next_id);
        self.next_id += 1;
        StoredLine {
            id,
            text,
            revision: 0,
            data: LineData::default(),
        }
    }

    /// Rebuild the id to index map after a structural edit
    fn reindex(&mut self) {
        self.index = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line.id, i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Counter bumped whenever lines are inserted or removed
    pub fn layout(&self) -> u64 {
        self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn id_at(&self, index: usize) -> Option<LineId> {
        self.lines.get(index).map(|l| l.id)
    }

    /// Current index of a line, if it still exists
    pub fn index_of(&self, id: LineId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| l.text.as_str())
    }

    /// Text revision, bumped on every change of the line's text
    pub fn revision(&self, index: usize) -> Option<u64> {
        self.lines.get(index).map(|l| l.revision)
    }

    pub fn data(&self, index: usize) -> Option<&LineData> {
        self.lines.get(index).map(|l| &l.data)
    }

    /// Store fresh lexing results for a line
    pub fn set_data(&mut self, index: usize, data: LineData) -> Result<()> {
        let line = self.lines.get_mut(index).ok_or(RelexError::LineOutOfRange(index))?;
        line.data = data;
        Ok(())
    }

    /// Whether line `index` has been lexed since its text last changed
    pub fn is_lexed(&self, index: usize) -> bool {
        self.data(index).is_some_and(|d| d.lexed)
    }

    /// State line `index` starts from: its predecessor's exit
    pub fn exit_before(&self, index: usize) -> BlockState {
        match index.checked_sub(1).and_then(|i| self.data(i)) {
            Some(data) => data.exit.clone(),
            None => BlockState::default(),
        }
    }

    /// Replace a line's text; its lexing results go stale
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> Result<LineId> {
        let line = self.lines.get_mut(index).ok_or(RelexError::LineOutOfRange(index))?;
        line.text = text.into();
        line.revision += 1;
        line.data.lexed = false;
        Ok(line.id)
    }

    /// Insert a line before `index` (`index == len` appends)
    pub fn insert(&mut self, index: usize, text: impl Into<String>) -> Result<LineId> {
        if index > self.lines.len() {
            return Err(RelexError::LineOutOfRange(index));
        }
        let line = self.make_line(text.into());
        let id = line.id;
        self.lines.insert(index, line);
        self.reindex();
        self.layout += 1;
        Ok(id)
    }

    /// Remove a line, returning its text
    pub fn remove(&mut self, index: usize) -> Result<String> {
        if index >= self.lines.len() {
            return Err(RelexError::LineOutOfRange(index));
        }
        let line = self.lines.remove(index);
        self.reindex();
        self.layout += 1;
        Ok(line.text)
    }

    /// Mark every line stale, keeping text and ids
    pub fn invalidate_all(&mut self) {
        for line in &mut self.lines {
            line.data.lexed = false;
        }
    }

    /// Iterate over the lines' text
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::state::tag;

    #[test]
    fn test_ids_survive_structural_edits() {
        let mut store = LineStore::from_lines(["a", "b", "c"]);
        let c = store.id_at(2).unwrap();
        store.insert(0, "new").unwrap();
        assert_eq!(store.index_of(c), Some(3));
        store.remove(1).unwrap();
        assert_eq!(store.index_of(c), Some(2));
        let b = store.id_at(1).unwrap();
        store.remove(1).unwrap();
        assert_eq!(store.index_of(b), None);
        assert_eq!(store.texts().collect::<Vec<_>>(), vec!["new", "c"]);
        assert_eq!(store.layout(), 3);
    }

    #[test]
    fn test_set_text_bumps_revision() {
        let mut store = LineStore::from_lines(["x"]);
        let data = LineData {
            lexed: true,
            ..Default::default()
        };
        store.set_data(0, data).unwrap();
        assert!(store.is_lexed(0));
        store.set_text(0, "y").unwrap();
        assert_eq!(store.revision(0), Some(1));
        assert!(!store.is_lexed(0));
        assert_eq!(store.text(0), Some("y"));
    }

    #[test]
    fn test_exit_before() {
        let mut store = LineStore::from_lines(["a", "b"]);
        let data = LineData {
            exit: BlockState::with_state(tag::COMMENT),
            lexed: true,
            ..Default::default()
        };
        store.set_data(0, data).unwrap();
        assert!(store.exit_before(0).is_clean());
        assert!(store.exit_before(1).is(tag::COMMENT));
    }

    #[test]
    fn test_out_of_range() {
        let mut store = LineStore::from_lines(["a"]);
        assert!(matches!(store.set_text(1, "x"), Err(RelexError::LineOutOfRange(1))));
        assert!(matches!(store.insert(3, "x"), Err(RelexError::LineOutOfRange(3))));
        assert!(matches!(store.remove(1), Err(RelexError::LineOutOfRange(1))));
        assert!(store.insert(1, "end").is_ok());
    }
}
