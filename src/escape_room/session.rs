use crate::escape_room::{
    models::{Panel, STAGE_COUNT, WRONG_ANSWER_MESSAGE},
    validator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAdvance {
    /// The current stage has not been answered correctly yet.
    Blocked,
    Next(usize),
    Escaped,
}

/// Per-stage scratch state of one play-through.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    stage_index: usize,
    answer_inputs: [String; STAGE_COUNT],
    answer_errors: [Option<String>; STAGE_COUNT],
    answered_correct: [bool; STAGE_COUNT],
    open_panel: Option<Panel>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn answer_input(&self, stage: usize) -> Option<&str> {
        self.answer_inputs.get(stage).map(String::as_str)
    }

    pub fn answer_error(&self, stage: usize) -> Option<&str> {
        self.answer_errors.get(stage)?.as_deref()
    }

    pub fn answered_correct(&self, stage: usize) -> bool {
        self.answered_correct.get(stage).copied().unwrap_or(false)
    }

    pub fn panel(&self) -> Option<Panel> {
        self.open_panel
    }

    pub fn open_panel(&mut self, panel: Panel) {
        self.open_panel = Some(panel);
    }

    pub fn close_panel(&mut self) {
        self.open_panel = None;
    }

    pub fn set_answer_input(&mut self, text: impl Into<String>) {
        self.answer_inputs[self.stage_index] = text.into();
    }

    /// Checks the current stage's input against `expected`.
    pub fn submit_answer(&mut self, expected: &str) -> bool {
        let stage = self.stage_index;
        let correct = validator::is_correct(&self.answer_inputs[stage], expected);

        if correct {
            self.answered_correct[stage] = true;
            self.answer_errors[stage] = None;
        } else {
            self.answer_errors[stage] = Some(WRONG_ANSWER_MESSAGE.to_string());
        }

        correct
    }

    pub fn advance(&mut self) -> StageAdvance {
        if !self.answered_correct[self.stage_index] {
            return StageAdvance::Blocked;
        }

        if self.stage_index + 1 < STAGE_COUNT {
            self.stage_index += 1;
            self.open_panel = None;
            StageAdvance::Next(self.stage_index)
        } else {
            StageAdvance::Escaped
        }
    }
}
