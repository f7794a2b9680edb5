use tokio::sync::{
    mpsc::{UnboundedReceiver, error::TryRecvError},
    watch,
};
use tracing::{debug, info, warn};

use crate::{
    client::custom_questions_client::TopicRepository,
    custom_questions::models::DEFAULT_TIMER_SECONDS,
    escape_room::{
        hotspots::{PhaseHotspots, phase_hotspots},
        models::{
            EMPTY_TOPIC_MESSAGE, Flow, INCOMPLETE_ITEM_MESSAGE, MISSING_TOPIC_NAME_MESSAGE, Panel,
            STAGE_COUNT, Topic, WizardItem,
        },
        session::{GameSession, StageAdvance},
        timer::{Timer, TimerEvent},
        wizard::Wizard,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Cannot {action} while in {from}")]
    InvalidTransition { from: Flow, action: &'static str },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Persistence(String),

    #[error("No saved topic at position {0}")]
    UnknownTopic(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Incorrect,
    /// Moved on to the given stage.
    Advanced(usize),
    Escaped,
}

/// Holds `saving` up for the lifetime of a create call, including when the
/// call's future is dropped early.
struct SavingFlag<'a>(&'a mut bool);

impl<'a> SavingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// The topic being played plus its session scratch state.
#[derive(Debug)]
struct ActiveGame {
    title: String,
    items: [WizardItem; STAGE_COUNT],
    session: GameSession,
}

/// Drives the escape room screens. All state is owned here and mutated through
/// `&mut self`; a front end renders from the getters and can watch
/// [`Flow`] changes through [`EscapeRoomController::subscribe`].
pub struct EscapeRoomController<R: TopicRepository> {
    repository: R,
    flow: Flow,
    flow_tx: watch::Sender<Flow>,
    topic_title: String,
    wizard: Option<Wizard>,
    saved_topics: Vec<Topic>,
    selected_topic: Option<usize>,
    game: Option<ActiveGame>,
    timer: Timer,
    timer_events: UnboundedReceiver<TimerEvent>,
    validation_error: Option<String>,
    persist_error: Option<String>,
    saving: bool,
}

impl<R: TopicRepository> EscapeRoomController<R> {
    pub fn new(repository: R) -> Self {
        let (timer, timer_events) = Timer::new(DEFAULT_TIMER_SECONDS as i64);
        let (flow_tx, _) = watch::channel(Flow::Mode);

        Self {
            repository,
            flow: Flow::Mode,
            flow_tx,
            topic_title: String::new(),
            wizard: None,
            saved_topics: Vec::new(),
            selected_topic: None,
            game: None,
            timer,
            timer_events,
            validation_error: None,
            persist_error: None,
            saving: false,
        }
    }

    // Read side

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn subscribe(&self) -> watch::Receiver<Flow> {
        self.flow_tx.subscribe()
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn topic_title(&self) -> &str {
        &self.topic_title
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    pub fn saved_topics(&self) -> &[Topic] {
        &self.saved_topics
    }

    pub fn selected_topic(&self) -> Option<usize> {
        self.selected_topic
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.game.as_ref().map(|g| &g.session)
    }

    pub fn game_title(&self) -> Option<&str> {
        self.game.as_ref().map(|g| g.title.as_str())
    }

    pub fn stage_items(&self) -> Option<&[WizardItem; STAGE_COUNT]> {
        self.game.as_ref().map(|g| &g.items)
    }

    pub fn current_question(&self) -> Option<&str> {
        let game = self.game.as_ref()?;
        Some(game.items[game.session.stage_index()].question.as_str())
    }

    /// Hint `index` (0..3) of the current stage.
    pub fn hint(&self, index: usize) -> Option<&str> {
        let game = self.game.as_ref()?;
        let item = &game.items[game.session.stage_index()];
        item.hints.get(index).map(String::as_str)
    }

    pub fn hotspots(&self) -> Option<&'static PhaseHotspots> {
        let game = self.game.as_ref()?;
        phase_hotspots(game.session.stage_index())
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn remaining(&self) -> u32 {
        self.timer.remaining()
    }

    pub fn running(&self) -> bool {
        self.timer.running()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn dismiss_error(&mut self) {
        self.persist_error = None;
    }

    // Landing

    pub fn open_custom_entry(&mut self) -> Result<(), FlowError> {
        self.require_flow(&[Flow::Mode], "open custom questions")?;
        self.set_flow(Flow::CustomEntry);
        Ok(())
    }

    pub fn choose_create(&mut self) -> Result<(), FlowError> {
        self.require_flow(&[Flow::Mode, Flow::CustomEntry], "create a topic")?;
        self.validation_error = None;
        self.set_flow(Flow::TopicName);
        Ok(())
    }

    pub async fn choose_previous(&mut self) -> Result<(), FlowError> {
        self.require_flow(&[Flow::Mode, Flow::CustomEntry], "browse previous topics")?;
        self.set_flow(Flow::PrevTopics);
        self.refresh_topics().await;
        Ok(())
    }

    /// Loads the saved topics. A failed fetch shows an empty list.
    pub async fn refresh_topics(&mut self) {
        self.saved_topics = match self.repository.list().await {
            Ok(topics) => topics,
            Err(e) => {
                warn!("Failed to load saved topics: {}", e);
                Vec::new()
            }
        };
        self.selected_topic = None;
        debug!("Loaded {} saved topics", self.saved_topics.len());
    }

    // Authoring

    pub fn set_topic_title(&mut self, title: impl Into<String>) -> Result<(), FlowError> {
        self.require_flow(&[Flow::TopicName], "edit the topic name")?;
        self.topic_title = title.into();
        Ok(())
    }

    /// Opens the wizard. Coming back with the same title keeps the authored
    /// items; a different title starts over.
    pub fn submit_topic_name(&mut self) -> Result<(), FlowError> {
        self.require_flow(&[Flow::TopicName], "submit the topic name")?;

        if self.topic_title.trim().is_empty() {
            return self.reject(MISSING_TOPIC_NAME_MESSAGE);
        }

        self.validation_error = None;
        let keep_items = self
            .wizard
            .as_ref()
            .is_some_and(|w| w.title() == self.topic_title);
        if !keep_items {
            self.wizard = Some(Wizard::new(self.topic_title.clone()));
        }
        self.set_flow(Flow::Wizard);
        Ok(())
    }

    pub fn update_wizard_item(&mut self, index: usize, item: WizardItem) -> Result<(), FlowError> {
        let wizard = self.wizard_mut("edit a question")?;
        if !wizard.set_item(index, item) {
            return Err(FlowError::Validation(format!("No stage {}", index + 1)));
        }
        Ok(())
    }

    pub fn edit_current_item(
        &mut self,
        edit: impl FnOnce(&mut WizardItem),
    ) -> Result<(), FlowError> {
        self.wizard_mut("edit a question")?.edit_current(edit);
        Ok(())
    }

    pub fn set_wizard_timer(&mut self, seconds: i64) -> Result<(), FlowError> {
        self.wizard_mut("set the timer")?.set_timer_seconds(seconds);
        Ok(())
    }

    pub fn next_step(&mut self) -> Result<usize, FlowError> {
        let wizard = self.wizard_mut("go to the next question")?;
        if wizard.is_last_step() {
            return Err(FlowError::InvalidTransition {
                from: Flow::Wizard,
                action: "go past the last question",
            });
        }

        match wizard.next() {
            Ok(step) => {
                self.validation_error = None;
                Ok(step)
            }
            Err(message) => self.reject(message),
        }
    }

    /// Saves the authored topic and starts playing it. On a failed save the
    /// wizard stays open with the error banner set.
    pub async fn finish_wizard(&mut self) -> Result<(), FlowError> {
        let wizard = self.wizard_mut("finish the wizard")?;
        if !wizard.is_last_step() {
            return Err(FlowError::InvalidTransition {
                from: Flow::Wizard,
                action: "finish before the last question",
            });
        }

        if let Some(idx) = wizard.first_incomplete() {
            return self.reject(format!("Question {}: {}", idx + 1, INCOMPLETE_ITEM_MESSAGE));
        }

        let request = wizard.to_create_request();
        let items = wizard.items().clone();
        let timer_seconds = wizard.timer_seconds();

        self.validation_error = None;
        self.persist_error = None;
        let result = {
            let _saving = SavingFlag::raise(&mut self.saving);
            self.repository.create(&request).await
        };

        match result {
            Ok(topic) => {
                info!("Saved topic '{}' with {} items", topic.title, topic.items.len());
                self.start_game(request.title, items, timer_seconds);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save topic '{}': {}", request.title, e);
                let message = e.user_message();
                self.persist_error = Some(message.clone());
                Err(FlowError::Persistence(message))
            }
        }
    }

    // Previous topics

    /// Selecting the selected topic again clears the selection.
    pub fn select_topic(&mut self, index: usize) -> Result<(), FlowError> {
        self.require_flow(&[Flow::PrevTopics], "select a topic")?;
        if index >= self.saved_topics.len() {
            return Err(FlowError::UnknownTopic(index));
        }

        self.selected_topic = match self.selected_topic {
            Some(current) if current == index => None,
            _ => Some(index),
        };
        Ok(())
    }

    /// Plays the selected topic without saving it again.
    pub fn use_selected_topic(&mut self) -> Result<(), FlowError> {
        let topic = self.selected("use a topic")?.clone();
        if topic.items.is_empty() {
            return self.reject(EMPTY_TOPIC_MESSAGE);
        }

        self.topic_title = topic.title.clone();
        self.start_game(
            topic.title.clone(),
            topic.padded_items(),
            topic.clamped_timer_seconds(),
        );
        Ok(())
    }

    /// Deletes every topic with the selected title, then drops them locally.
    pub async fn delete_selected_topic(&mut self) -> Result<u64, FlowError> {
        let title = self.selected("delete a topic")?.title.clone();

        match self.repository.delete(&title).await {
            Ok(deleted) => {
                info!("Deleted {} topics titled '{}'", deleted, title);
                self.saved_topics.retain(|t| t.title != title);
                self.selected_topic = None;
                Ok(deleted)
            }
            Err(e) => {
                warn!("Failed to delete topic '{}': {}", title, e);
                let message = e.user_message();
                self.persist_error = Some(message.clone());
                Err(FlowError::Persistence(message))
            }
        }
    }

    // Game

    pub fn set_answer_input(&mut self, text: impl Into<String>) -> Result<(), FlowError> {
        self.game_mut("type an answer")?.session.set_answer_input(text);
        Ok(())
    }

    pub fn open_panel(&mut self, panel: Panel) -> Result<(), FlowError> {
        self.game_mut("open a panel")?.session.open_panel(panel);
        Ok(())
    }

    pub fn close_panel(&mut self) -> Result<(), FlowError> {
        self.game_mut("close a panel")?.session.close_panel();
        Ok(())
    }

    pub fn submit_answer(&mut self) -> Result<AnswerOutcome, FlowError> {
        let game = self.game_mut("submit an answer")?;
        let stage = game.session.stage_index();
        let expected = game.items[stage].answer.clone();

        if !game.session.submit_answer(&expected) {
            debug!("Wrong answer on stage {}", stage + 1);
            return Ok(AnswerOutcome::Incorrect);
        }

        match game.session.advance() {
            StageAdvance::Next(next) => {
                debug!("Stage {} solved", stage + 1);
                Ok(AnswerOutcome::Advanced(next))
            }
            StageAdvance::Escaped => {
                self.timer.pause();
                info!("Escaped with {} seconds left", self.timer.remaining());
                self.set_flow(Flow::Good);
                Ok(AnswerOutcome::Escaped)
            }
            StageAdvance::Blocked => Ok(AnswerOutcome::Incorrect),
        }
    }

    pub fn toggle_timer(&mut self) -> Result<(), FlowError> {
        self.require_flow(&[Flow::Game], "pause or resume")?;
        self.timer.toggle();
        Ok(())
    }

    /// Applies a timer event. Events from an earlier countdown are ignored.
    /// Returns the flow when the event changed it.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> Option<Flow> {
        if event.epoch() != self.timer.epoch() {
            debug!("Ignoring stale timer event {:?}", event);
            return None;
        }

        let expired = match event {
            TimerEvent::Expired { .. } => true,
            TimerEvent::Tick { remaining, .. } => remaining == 0,
        };

        if expired && self.flow == Flow::Game {
            self.timer.pause();
            info!("Time ran out");
            self.set_flow(Flow::Bad);
            return Some(Flow::Bad);
        }

        None
    }

    /// Waits for the next timer event and applies it.
    pub async fn process_next_timer_event(&mut self) -> Option<TimerEvent> {
        let event = self.timer_events.recv().await?;
        self.handle_timer_event(event);
        Some(event)
    }

    /// Applies every timer event that is already queued.
    pub fn drain_timer_events(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.timer_events.try_recv() {
                Ok(event) => {
                    self.handle_timer_event(event);
                    count += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        count
    }

    // Navigation

    pub fn back(&mut self) -> Result<(), FlowError> {
        match self.flow {
            Flow::CustomEntry => self.set_flow(Flow::Mode),
            Flow::TopicName | Flow::PrevTopics => {
                self.validation_error = None;
                self.set_flow(Flow::CustomEntry);
            }
            Flow::Wizard => {
                let on_first_step = self.wizard.as_mut().is_none_or(|w| w.back().is_none());
                if on_first_step {
                    self.set_flow(Flow::TopicName);
                }
            }
            from => {
                return Err(FlowError::InvalidTransition {
                    from,
                    action: "go back",
                });
            }
        }
        Ok(())
    }

    /// Returns to the landing screen and forgets every wizard and game value.
    pub fn restart(&mut self) {
        self.timer.reset(DEFAULT_TIMER_SECONDS as i64);
        self.drain_timer_events();

        self.topic_title.clear();
        self.wizard = None;
        self.selected_topic = None;
        self.game = None;
        self.validation_error = None;
        self.persist_error = None;
        self.saving = false;
        self.set_flow(Flow::Mode);
    }

    // Internals

    fn start_game(&mut self, title: String, items: [WizardItem; STAGE_COUNT], seconds: i32) {
        self.game = Some(ActiveGame {
            title,
            items,
            session: GameSession::new(),
        });
        self.persist_error = None;
        self.validation_error = None;

        self.timer.reset(seconds as i64);
        self.set_flow(Flow::Game);
        self.timer.start();
    }

    fn set_flow(&mut self, flow: Flow) {
        if self.flow != flow {
            debug!("Escape room flow {} -> {}", self.flow, flow);
        }
        self.flow = flow;
        self.flow_tx.send_replace(flow);
    }

    fn require_flow(&self, allowed: &[Flow], action: &'static str) -> Result<(), FlowError> {
        if allowed.contains(&self.flow) {
            return Ok(());
        }

        Err(FlowError::InvalidTransition {
            from: self.flow,
            action,
        })
    }

    fn reject<T>(&mut self, message: impl Into<String>) -> Result<T, FlowError> {
        let message = message.into();
        self.validation_error = Some(message.clone());
        Err(FlowError::Validation(message))
    }

    fn wizard_mut(&mut self, action: &'static str) -> Result<&mut Wizard, FlowError> {
        self.require_flow(&[Flow::Wizard], action)?;
        let flow = self.flow;
        self.wizard
            .as_mut()
            .ok_or(FlowError::InvalidTransition { from: flow, action })
    }

    fn game_mut(&mut self, action: &'static str) -> Result<&mut ActiveGame, FlowError> {
        self.require_flow(&[Flow::Game], action)?;
        let flow = self.flow;
        self.game
            .as_mut()
            .ok_or(FlowError::InvalidTransition { from: flow, action })
    }

    fn selected(&self, action: &'static str) -> Result<&Topic, FlowError> {
        self.require_flow(&[Flow::PrevTopics], action)?;
        let index = self
            .selected_topic
            .ok_or_else(|| FlowError::Validation("Select a topic first.".into()))?;

        self.saved_topics
            .get(index)
            .ok_or(FlowError::UnknownTopic(index))
    }
}
