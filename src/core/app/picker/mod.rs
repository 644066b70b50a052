use crate::core::character::{Character, CharacterFilter, FILTER_TAGS};

/// Character picker overlay: the fetched page, the active filter and the
/// cursor positions in the result list and the tag strip.
#[derive(Debug, Clone, Default)]
pub struct CharacterPickerState {
    pub characters: Vec<Character>,
    pub filter: CharacterFilter,
    pub filtered: Vec<Character>,
    pub selected: usize,
    pub tag_cursor: usize,
    pub loading: bool,
    pub selecting: bool,
}

impl CharacterPickerState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn set_characters(&mut self, characters: Vec<Character>) {
        self.characters = characters;
        self.loading = false;
        self.recompute();
    }

    /// Re-run the filter and clamp the selection into the new result list.
    pub fn recompute(&mut self) {
        self.filtered = self.filter.apply(&self.characters);
        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.filter.search.push(ch);
        self.selected = 0;
        self.recompute();
    }

    pub fn pop_search_char(&mut self) {
        if self.filter.search.pop().is_some() {
            self.selected = 0;
            self.recompute();
        }
    }

    pub fn toggle_tag_under_cursor(&mut self) {
        if let Some(tag) = FILTER_TAGS.get(self.tag_cursor) {
            self.filter.toggle_tag(tag);
            self.selected = 0;
            self.recompute();
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    pub fn tag_cursor_left(&mut self) {
        self.tag_cursor = match self.tag_cursor {
            0 => FILTER_TAGS.len() - 1,
            n => n - 1,
        };
    }

    pub fn tag_cursor_right(&mut self) {
        self.tag_cursor = (self.tag_cursor + 1) % FILTER_TAGS.len();
    }

    pub fn tag_under_cursor(&self) -> Option<&'static str> {
        FILTER_TAGS.get(self.tag_cursor).copied()
    }

    pub fn selected_character(&self) -> Option<&Character> {
        self.filtered.get(self.selected)
    }
}
