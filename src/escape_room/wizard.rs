use crate::{
    custom_questions::models::{CreateTopicRequest, DEFAULT_TIMER_SECONDS, clamp_timer_seconds},
    escape_room::models::{INCOMPLETE_ITEM_MESSAGE, STAGE_COUNT, WizardItem},
};

/// Multi-step authoring form: one step per stage.
#[derive(Debug, Clone)]
pub struct Wizard {
    title: String,
    step: usize,
    items: [WizardItem; STAGE_COUNT],
    timer_seconds: i32,
}

impl Wizard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            step: 0,
            items: Default::default(),
            timer_seconds: DEFAULT_TIMER_SECONDS,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == STAGE_COUNT - 1
    }

    pub fn items(&self) -> &[WizardItem; STAGE_COUNT] {
        &self.items
    }

    pub fn current_item(&self) -> &WizardItem {
        &self.items[self.step]
    }

    pub fn timer_seconds(&self) -> i32 {
        self.timer_seconds
    }

    pub fn set_timer_seconds(&mut self, seconds: i64) {
        self.timer_seconds = clamp_timer_seconds(seconds);
    }

    /// Returns false when `index` is not a stage.
    pub fn set_item(&mut self, index: usize, item: WizardItem) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn edit_current(&mut self, edit: impl FnOnce(&mut WizardItem)) {
        edit(&mut self.items[self.step]);
    }

    pub fn next(&mut self) -> Result<usize, String> {
        if !self.current_item().is_complete() {
            return Err(INCOMPLETE_ITEM_MESSAGE.to_string());
        }

        if !self.is_last_step() {
            self.step += 1;
        }

        Ok(self.step)
    }

    /// `None` when already on the first step.
    pub fn back(&mut self) -> Option<usize> {
        if self.step == 0 {
            return None;
        }

        self.step -= 1;
        Some(self.step)
    }

    pub fn first_incomplete(&self) -> Option<usize> {
        self.items.iter().position(|item| !item.is_complete())
    }

    pub fn to_create_request(&self) -> CreateTopicRequest {
        let title = match self.title.trim() {
            "" => "Untitled".to_string(),
            trimmed => trimmed.to_string(),
        };

        CreateTopicRequest {
            title,
            timer_seconds: Some(self.timer_seconds as i64),
            items: self.items.iter().map(WizardItem::to_create_item).collect(),
        }
    }
}
