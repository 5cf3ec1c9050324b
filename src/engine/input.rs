//! Input Action Binder
//!
//! Key edges from an `InputSource` are folded into a set of held keys:
//! holding "w" is one membership, not a stream of events. Each tick the
//! scheduler asks the binder to fire the actions of every update-eligible
//! object whose key is held.
//!
//! Two firing modes:
//! - continuous (default): fires every eligible tick while the key is held,
//!   for frame-coupled effects like thrust
//! - cooldown: fires at most once per cooldown window, for press-style
//!   effects like toggling a panel

use std::collections::HashSet;
use std::fmt;

use macroquad::input::{get_keys_pressed, get_keys_released, KeyCode};

use super::context::Context;
use super::object::{Behavior, GameObject, HookError, HookResult};

/// A key edge delivered by the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down(KeyCode),
    Up(KeyCode),
}

/// Source of key edges, polled once per tick
pub trait InputSource {
    fn poll(&mut self, edges: &mut Vec<KeyEdge>);
}

/// Edges from macroquad's keyboard state
pub struct MacroquadInput;

impl InputSource for MacroquadInput {
    fn poll(&mut self, edges: &mut Vec<KeyEdge>) {
        edges.extend(get_keys_pressed().into_iter().map(KeyEdge::Down));
        edges.extend(get_keys_released().into_iter().map(KeyEdge::Up));
    }
}

/// Source with no keys, for engines driven without a keyboard
#[cfg(test)]
pub struct NoInput;

#[cfg(test)]
impl InputSource for NoInput {
    fn poll(&mut self, _edges: &mut Vec<KeyEdge>) {}
}

/// What triggers an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTrigger {
    Keyboard(KeyCode),
}

type ActionFn =
    Box<dyn FnMut(Option<&mut (dyn Behavior + 'static)>, &mut Context<'_>, &mut GameObject) -> HookResult>;

/// A key binding owned by a game object
pub struct InputAction {
    trigger: ActionTrigger,
    cooldown_enabled: bool,
    /// Clock time of the last firing, for cooldown gating
    last_fired: Option<f64>,
    while_key_down: ActionFn,
}

impl InputAction {
    /// Bind `key` to a callback on the owning object's behavior of type `B`.
    ///
    /// ```ignore
    /// InputAction::keyboard(KeyCode::W, |ship: &mut Ship, _ctx, _this| {
    ///     ship.thrust(1.0);
    ///     Ok(())
    /// })
    /// ```
    pub fn keyboard<B, F>(key: KeyCode, mut while_key_down: F) -> Self
    where
        B: Behavior,
        F: FnMut(&mut B, &mut Context<'_>, &mut GameObject) -> HookResult + 'static,
    {
        let callback: ActionFn = Box::new(move |behavior, ctx, this| {
            match behavior.and_then(|b| b.as_any_mut().downcast_mut::<B>()) {
                Some(state) => while_key_down(state, ctx, this),
                None => Err(HookError::BehaviorMismatch {
                    identifier: this.identifier().to_string(),
                    expected: std::any::type_name::<B>(),
                }),
            }
        });
        Self {
            trigger: ActionTrigger::Keyboard(key),
            cooldown_enabled: false,
            last_fired: None,
            while_key_down: callback,
        }
    }

    /// Debounce: fire at most once per cooldown window while held
    pub fn with_cooldown(mut self) -> Self {
        self.cooldown_enabled = true;
        self
    }

    fn ready(&self, now: f64, cooldown: f64) -> bool {
        if !self.cooldown_enabled {
            return true;
        }
        match self.last_fired {
            Some(last) => now - last > cooldown,
            None => true,
        }
    }
}

impl fmt::Debug for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAction")
            .field("trigger", &self.trigger)
            .field("cooldown_enabled", &self.cooldown_enabled)
            .field("last_fired", &self.last_fired)
            .finish()
    }
}

/// Held-key state plus action dispatch
#[derive(Debug)]
pub struct InputBinder {
    held: HashSet<KeyCode>,
    /// Cooldown window in seconds
    cooldown: f64,
    edges: Vec<KeyEdge>,
}

impl InputBinder {
    pub fn new(cooldown: f64) -> Self {
        Self {
            held: HashSet::new(),
            cooldown,
            edges: Vec::new(),
        }
    }

    pub fn apply(&mut self, edge: KeyEdge) {
        match edge {
            KeyEdge::Down(key) => {
                self.held.insert(key);
            }
            KeyEdge::Up(key) => {
                self.held.remove(&key);
            }
        }
    }

    /// Pull this tick's edges from `source` into the held set
    pub fn poll(&mut self, source: &mut dyn InputSource) {
        let mut edges = std::mem::take(&mut self.edges);
        source.poll(&mut edges);
        for edge in edges.drain(..) {
            self.apply(edge);
        }
        self.edges = edges;
    }

    pub fn held(&self) -> &HashSet<KeyCode> {
        &self.held
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    /// Fire every ready action whose key is held. Stops at the first
    /// failing callback. Returns the number of actions fired.
    pub(crate) fn fire(
        held: &HashSet<KeyCode>,
        cooldown: f64,
        actions: &mut [InputAction],
        behavior: &mut Option<Box<dyn Behavior>>,
        ctx: &mut Context<'_>,
        this: &mut GameObject,
        now: f64,
    ) -> Result<usize, HookError> {
        let mut fired = 0;
        for action in actions.iter_mut() {
            let ActionTrigger::Keyboard(key) = action.trigger;
            if !held.contains(&key) || !action.ready(now, cooldown) {
                continue;
            }
            if action.cooldown_enabled {
                action.last_fired = Some(now);
            }
            (action.while_key_down)(behavior.as_deref_mut(), ctx, this)?;
            fired += 1;
        }
        Ok(fired)
    }
}

/// Edges replayed from a script, one batch per poll
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedInput {
    batches: std::collections::VecDeque<Vec<KeyEdge>>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue edges for the next unconsumed poll
    pub fn push(&mut self, edges: Vec<KeyEdge>) {
        self.batches.push_back(edges);
    }
}

#[cfg(test)]
impl InputSource for ScriptedInput {
    fn poll(&mut self, edges: &mut Vec<KeyEdge>) {
        if let Some(batch) = self.batches.pop_front() {
            edges.extend(batch);
        }
    }
}
