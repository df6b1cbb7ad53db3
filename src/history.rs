use crate::document::Document;

pub const DEFAULT_MAX_STEPS: usize = 50;

/// Whole-document snapshot history.
///
/// The top of the undo stack always equals the last committed document, so
/// undoing pops that entry onto the redo stack and restores the one beneath it.
pub struct History {
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    max_steps: usize,
}

impl History {
    pub fn new(initial: &Document, max_steps: usize) -> Self {
        Self { undo_stack: vec![initial.clone()], redo_stack: Vec::new(), max_steps: max_steps.max(1) }
    }

    /// Drops all history and starts over from `doc` (new/open).
    pub fn reset(&mut self, doc: &Document) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(doc.clone());
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps.max(1);
        self.trim();
    }

    /// Records `doc` as the newest state. Returns false when it matches the current top.
    pub fn commit(&mut self, doc: &Document) -> bool {
        if self.undo_stack.last() == Some(doc) {
            return false;
        }
        self.undo_stack.push(doc.clone());
        self.redo_stack.clear();
        self.trim();
        true
    }

    fn trim(&mut self) {
        if self.undo_stack.len() > self.max_steps {
            let excess = self.undo_stack.len() - self.max_steps;
            self.undo_stack.drain(..excess);
        }
    }

    pub fn undo(&mut self) -> Option<Document> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let top = self.undo_stack.pop()?;
        self.redo_stack.push(top);
        self.undo_stack.last().cloned()
    }

    pub fn redo(&mut self) -> Option<Document> {
        let state = self.redo_stack.pop()?;
        self.undo_stack.push(state.clone());
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn painted(doc: &Document, row: i32) -> Document {
        let mut d = doc.clone();
        d.frames[0].layers[0].canvas.set(row, 0, Some(Color::BLACK));
        d
    }

    #[test]
    fn undo_and_redo_walk_snapshots() {
        let d0 = Document::new(4).unwrap();
        let mut h = History::new(&d0, 50);
        assert!(!h.can_undo());
        let d1 = painted(&d0, 0);
        let d2 = painted(&d1, 1);
        h.commit(&d1);
        h.commit(&d2);

        assert_eq!(h.undo(), Some(d1.clone()));
        assert_eq!(h.undo(), Some(d0.clone()));
        assert_eq!(h.undo(), None);
        assert!(h.can_redo());
        assert_eq!(h.redo(), Some(d1.clone()));
        assert_eq!(h.redo(), Some(d2));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn identical_commits_are_skipped() {
        let d0 = Document::new(4).unwrap();
        let mut h = History::new(&d0, 50);
        assert!(!h.commit(&d0));
        assert_eq!(h.undo_len(), 1);
    }

    #[test]
    fn commit_clears_redo() {
        let d0 = Document::new(4).unwrap();
        let mut h = History::new(&d0, 50);
        h.commit(&painted(&d0, 0));
        h.undo();
        assert!(h.can_redo());
        h.commit(&painted(&d0, 2));
        assert!(!h.can_redo());
    }

    #[test]
    fn history_is_bounded() {
        let mut doc = Document::new(8).unwrap();
        let mut h = History::new(&doc, 3);
        for row in 0..6 {
            doc = painted(&doc, row);
            h.commit(&doc);
        }
        assert_eq!(h.undo_len(), 3);
        assert!(h.undo().is_some());
        assert!(h.undo().is_some());
        assert!(h.undo().is_none());
    }

    #[test]
    fn reset_forgets_everything() {
        let d0 = Document::new(4).unwrap();
        let mut h = History::new(&d0, 50);
        h.commit(&painted(&d0, 0));
        let fresh = Document::new(8).unwrap();
        h.reset(&fresh);
        assert!(!h.can_undo() && !h.can_redo());
        assert_eq!(h.undo_len(), 1);
    }
}
