use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{geometry::Point, hit, layout::Layout, Result};

/// Visual and logical state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InteractionState {
    /// Resting state, both initial and terminal.
    #[default]
    Up,
    /// Held by a keyboard character.
    Down,
    /// Held by the pointer button.
    PointerDown,
    /// Pointer is over the key with no button held.
    Hover,
}

/// Receiver of note start/stop intents, indexed by scale degree.
pub trait NoteSink {
    fn is_sounding(&self, index: usize) -> bool;
    fn start(&mut self, index: usize) -> Result<()>;
    /// Stopping a silent note is a no-op.
    fn stop(&mut self, index: usize);
}

/// Change to the frequency readout shown while hovering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readout {
    Show(String),
    Clear,
}

/// What an event changed: keys to repaint, in order, and the readout update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub redraw: Vec<usize>,
    pub readout: Option<Readout>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.redraw.is_empty() && self.readout.is_none()
    }

    fn redraw(&mut self, index: usize) {
        if !self.redraw.contains(&index) {
            self.redraw.push(index);
        }
    }
}

/// Per-key state machine driven by pointer and keyboard events.
///
/// At most one key is in [`InteractionState::PointerDown`] at a time. A key
/// held by one source ignores the other; releasing either source stops the
/// note and returns the key to `Up`.
#[derive(Debug, Clone)]
pub struct InteractionStateMachine {
    layout: Layout,
    pointer_key: Option<usize>,
    hovered: Option<usize>,
}

impl InteractionStateMachine {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            pointer_key: None,
            hovered: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Swaps in a freshly built layout. Every key starts over in `Up`.
    pub fn replace_layout(&mut self, layout: Layout) {
        self.layout = layout;
        self.pointer_key = None;
        self.hovered = None;
    }

    /// Key currently held by the pointer.
    pub fn pointer_key(&self) -> Option<usize> {
        self.pointer_key
    }

    /// First entry whose outline contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.layout
            .entries
            .iter()
            .position(|entry| hit::contains(point, &entry.shape))
    }

    pub fn pointer_move(&mut self, point: Point) -> Transition {
        let mut transition = Transition::default();
        self.hover_at(point, &mut transition);
        self.sync_readout(&mut transition);
        transition
    }

    pub fn pointer_down(&mut self, point: Point, notes: &mut impl NoteSink) -> Result<Transition> {
        let mut transition = Transition::default();
        let Some(index) = self.hit_test(point) else {
            return Ok(transition);
        };
        if notes.is_sounding(index) {
            debug!(index, "pointer down on a key that is already sounding");
            return Ok(transition);
        }

        // A lost pointer-up must not leave a second key held.
        if let Some(previous) = self.pointer_key.take() {
            self.release(previous, notes, &mut transition);
        }

        notes.start(index)?;
        self.set_state(index, InteractionState::PointerDown, &mut transition);
        self.pointer_key = Some(index);
        debug!(index, "pointer pressed key");

        self.sync_readout(&mut transition);
        Ok(transition)
    }

    pub fn pointer_up(&mut self, point: Point, notes: &mut impl NoteSink) -> Transition {
        let mut transition = Transition::default();
        let Some(index) = self.pointer_key.take() else {
            return transition;
        };

        if notes.is_sounding(index) {
            self.clear_state(InteractionState::Hover, &mut transition);
            self.release(index, notes, &mut transition);
            self.hover_at(point, &mut transition);
            debug!(index, "pointer released key");
        }

        self.sync_readout(&mut transition);
        transition
    }

    pub fn key_down(&mut self, key: char, notes: &mut impl NoteSink) -> Result<Transition> {
        let mut transition = Transition::default();
        let Some(index) = self.layout.index_for_key(key) else {
            return Ok(transition);
        };
        if notes.is_sounding(index) {
            return Ok(transition);
        }

        notes.start(index)?;
        self.set_state(index, InteractionState::Down, &mut transition);
        debug!(index, %key, "key pressed");

        self.sync_readout(&mut transition);
        Ok(transition)
    }

    pub fn key_up(&mut self, key: char, notes: &mut impl NoteSink) -> Transition {
        let mut transition = Transition::default();
        let Some(index) = self.layout.index_for_key(key) else {
            return transition;
        };
        if !notes.is_sounding(index) {
            return transition;
        }

        self.release(index, notes, &mut transition);
        if self.pointer_key == Some(index) {
            self.pointer_key = None;
        }
        debug!(index, %key, "key released");

        self.sync_readout(&mut transition);
        transition
    }

    fn hover_at(&mut self, point: Point, transition: &mut Transition) {
        match self.hit_test(point) {
            Some(index) if self.layout.entries[index].state == InteractionState::PointerDown => {
                self.clear_state(InteractionState::Hover, transition);
            }
            Some(index) => {
                self.set_state(index, InteractionState::Hover, transition);
                self.clear_state_except(InteractionState::Hover, Some(index), transition);
            }
            None => self.clear_state(InteractionState::Hover, transition),
        }
    }

    fn release(&mut self, index: usize, notes: &mut impl NoteSink, transition: &mut Transition) {
        notes.stop(index);
        self.set_state(index, InteractionState::Up, transition);
    }

    fn clear_state(&mut self, state: InteractionState, transition: &mut Transition) {
        self.clear_state_except(state, None, transition);
    }

    fn clear_state_except(
        &mut self,
        state: InteractionState,
        keep: Option<usize>,
        transition: &mut Transition,
    ) {
        for (index, entry) in self.layout.entries.iter_mut().enumerate() {
            if entry.state == state && Some(index) != keep {
                entry.state = InteractionState::Up;
                transition.redraw(index);
            }
        }
    }

    fn set_state(&mut self, index: usize, state: InteractionState, transition: &mut Transition) {
        if let Some(entry) = self.layout.entries.get_mut(index) {
            if entry.state != state {
                entry.state = state;
                transition.redraw(index);
            }
        }
    }

    fn sync_readout(&mut self, transition: &mut Transition) {
        let hovered = self
            .layout
            .entries
            .iter()
            .position(|entry| entry.state == InteractionState::Hover);
        if hovered == self.hovered {
            return;
        }

        self.hovered = hovered;
        transition.readout = Some(match hovered {
            Some(index) => Readout::Show(self.layout.entries[index].shape.label.clone()),
            None => Readout::Clear,
        });
    }
}
