use predbridge_protocol::Slot;

/// Most recent characters kept in a tracker's history.
pub const HISTORY_LIMIT: usize = 4096;

/// How a tracker splits its history into past stream and active prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    /// The prefix is the word being typed.
    Word,
    /// The prefix is the sentence being typed.
    Sentence,
}

impl ContextMode {
    pub fn for_slot(slot: Slot) -> Self {
        match slot {
            Slot::Word | Slot::Shorthand => Self::Word,
            Slot::Sentence | Slot::Canned => Self::Sentence,
        }
    }
}

/// Running text history of one predictor slot.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    mode: ContextMode,
    history: String,
}

impl ContextTracker {
    pub fn new(mode: ContextMode) -> Self {
        Self {
            mode,
            history: String::new(),
        }
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    /// Append `text` to the history, dropping the oldest characters beyond
    /// [`HISTORY_LIMIT`].
    pub fn update(&mut self, text: &str) {
        self.history.push_str(text);
        let excess = self.history.chars().count().saturating_sub(HISTORY_LIMIT);
        if excess > 0 {
            let cut = self
                .history
                .char_indices()
                .nth(excess)
                .map_or(self.history.len(), |(index, _)| index);
            self.history.drain(..cut);
        }
    }

    /// The fragment currently being typed.
    pub fn prefix(&self) -> &str {
        &self.history[self.prefix_start()..]
    }

    /// Everything before [`ContextTracker::prefix`].
    pub fn past_stream(&self) -> &str {
        &self.history[..self.prefix_start()]
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn prefix_start(&self) -> usize {
        match self.mode {
            ContextMode::Word => self
                .history
                .rfind(char::is_whitespace)
                .map_or(0, |index| next_boundary(&self.history, index)),
            ContextMode::Sentence => {
                let start = self
                    .history
                    .rfind(['.', '!', '?'])
                    .map_or(0, |index| index + 1);
                let rest = &self.history[start..];
                start + (rest.len() - rest.trim_start().len())
            }
        }
    }
}

fn next_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(index, |ch| index + ch.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_mode_prefix_is_trailing_fragment() {
        let mut tracker = ContextTracker::new(ContextMode::Word);
        tracker.update("how are y");
        assert_eq!(tracker.prefix(), "y");
        assert_eq!(tracker.past_stream(), "how are ");

        tracker.update("ou ");
        assert_eq!(tracker.prefix(), "");
        assert_eq!(tracker.past_stream(), "how are you ");
    }

    #[test]
    fn sentence_mode_prefix_starts_after_terminator() {
        let mut tracker = ContextTracker::new(ContextMode::Sentence);
        tracker.update("I am home. Can we");
        assert_eq!(tracker.prefix(), "Can we");
        assert_eq!(tracker.past_stream(), "I am home. ");

        tracker.clear();
        tracker.update("no terminator yet");
        assert_eq!(tracker.prefix(), "no terminator yet");
        assert_eq!(tracker.past_stream(), "");
    }

    #[test]
    fn history_is_bounded_on_char_boundaries() {
        let mut tracker = ContextTracker::new(ContextMode::Word);
        tracker.update(&"é".repeat(HISTORY_LIMIT));
        tracker.update("ab");

        assert_eq!(tracker.history().chars().count(), HISTORY_LIMIT);
        assert!(tracker.history().ends_with("éab"));
    }

    #[test]
    fn slots_pick_their_mode() {
        assert_eq!(ContextMode::for_slot(Slot::Shorthand), ContextMode::Word);
        assert_eq!(ContextMode::for_slot(Slot::Canned), ContextMode::Sentence);
    }
}
