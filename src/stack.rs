//! Ordered middleware stacks and the per-dispatch [`Next`] cursor.
//!
//! A [`Stack`] is configuration: an ordered list of units, built once and
//! shared. All state belonging to one dispatch (which unit runs next, and in
//! which possibly nested stack) lives in the [`Next`] value created by
//! [`Stack::run`]. Two threads can therefore run the same stack at the same
//! time, and a route target can dispatch a sub-request through the stack it
//! is running in.
//!
//! # Nesting
//!
//! A stack is itself a [`Middleware`]. When a nested stack runs out of units,
//! `next.run` carries on with the enclosing stack:
//!
//! ```text
//! outer: [ log, inner, router ]        inner: [ auth, detect ]
//!
//! log → inner → auth → detect ─┐
//!                              └→ router (outer resumes)
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::handler::{BoxedMiddleware, Middleware};
use crate::request::Request;
use crate::response::Response;

/// An ordered list of middleware units.
///
/// Mutating methods take `&mut self` and [`run`](Stack::run) takes `&self`,
/// so a stack cannot be modified while a dispatch through it is in progress.
/// Cloning is cheap; the unit list is shared until one clone is modified.
#[derive(Clone, Default)]
pub struct Stack {
    units: Arc<Vec<BoxedMiddleware>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit. Returns `self` for chaining.
    pub fn with(mut self, unit: impl Middleware) -> Self {
        self.push(unit);
        self
    }

    /// Appends a unit to the end of the stack.
    pub fn push(&mut self, unit: impl Middleware) {
        Arc::make_mut(&mut self.units).push(Arc::new(unit));
    }

    /// Inserts a unit at the front of the stack.
    pub fn unshift(&mut self, unit: impl Middleware) {
        Arc::make_mut(&mut self.units).insert(0, Arc::new(unit));
    }

    /// Removes and returns the last unit.
    pub fn pop(&mut self) -> Option<Arc<dyn Middleware>> {
        Arc::make_mut(&mut self.units).pop()
    }

    /// Removes and returns the first unit.
    pub fn shift(&mut self) -> Option<Arc<dyn Middleware>> {
        let units = Arc::make_mut(&mut self.units);
        (!units.is_empty()).then(|| units.remove(0))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Runs the stack against `req` and `res`, starting with the first unit.
    ///
    /// With no units, `res` is left untouched. Errors returned by a unit,
    /// including application errors no router recovered from, are returned
    /// here unchanged.
    pub fn run(&self, req: &mut Request, res: &mut Response) -> Result<()> {
        let mut next = Next::new(Arc::clone(&self.units));
        next.run(req, res)
    }

    /// Runs the stack with a fresh `200 OK` response and returns it ready to
    /// send, see [`Response::prepare`]. Use [`run`](Self::run) to keep the
    /// request or to finish the response yourself.
    pub fn dispatch(&self, mut req: Request) -> Result<Response> {
        let mut res = Response::new();
        self.run(&mut req, &mut res)?;
        res.prepare(&req);
        Ok(res)
    }
}

impl Middleware for Stack {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &mut Next) -> Result<()> {
        let level = next.enter(Arc::clone(&self.units));
        let result = next.run(req, res);
        next.leave(level);
        result
    }
}

struct Frame {
    units: Arc<Vec<BoxedMiddleware>>,
    cursor: usize,
}

/// The cursor of one dispatch: a stack of (units, position) frames, one per
/// nesting level.
pub struct Next {
    frames: Vec<Frame>,
}

/// Where the innermost active stack stood when [`Next::mark`] was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Mark {
    level: usize,
    cursor: usize,
}

impl Next {
    fn new(units: Arc<Vec<BoxedMiddleware>>) -> Self {
        Self { frames: vec![Frame { units, cursor: 0 }] }
    }

    /// Runs the next unit.
    ///
    /// The innermost stack that still has units is advanced; when every level
    /// is exhausted this returns immediately. Each call advances the cursor,
    /// so a unit should call it at most once.
    pub fn run(&mut self, req: &mut Request, res: &mut Response) -> Result<()> {
        match self.advance() {
            Some(unit) => unit.handle(req, res, self),
            None => {
                trace!("middleware stack exhausted");
                Ok(())
            }
        }
    }

    /// `true` once no level has a unit left to run.
    pub fn is_exhausted(&self) -> bool {
        self.frames.iter().all(|f| f.cursor >= f.units.len())
    }

    /// Number of nested stacks still running units (`0` while only the
    /// outer stack is active).
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// The position of the unit that is running now.
    pub(crate) fn mark(&self) -> Mark {
        let level = self.frames.len().saturating_sub(1);
        let cursor = self.frames.get(level).map_or(0, |f| f.cursor);
        Mark { level, cursor }
    }

    /// `true` when the stack `mark` was taken in has moved on since.
    pub(crate) fn moved_since(&self, mark: Mark) -> bool {
        self.frames.get(mark.level).is_none_or(|f| f.cursor != mark.cursor)
    }

    /// Pushes a frame and returns its level, to be passed to [`leave`](Self::leave).
    fn enter(&mut self, units: Arc<Vec<BoxedMiddleware>>) -> usize {
        self.frames.push(Frame { units, cursor: 0 });
        self.frames.len() - 1
    }

    /// Drops the frame entered at `level`, unless it was already left when
    /// its units ran out.
    fn leave(&mut self, level: usize) {
        self.frames.truncate(level);
    }

    /// Takes the next unit of the innermost stack, dropping nested stacks
    /// whose units have all run. The outer frame is never dropped.
    fn advance(&mut self) -> Option<BoxedMiddleware> {
        loop {
            let depth = self.frames.len().saturating_sub(1);
            let frame = self.frames.last_mut()?;
            if let Some(unit) = frame.units.get(frame.cursor).cloned() {
                trace!(depth, position = frame.cursor, "running middleware");
                frame.cursor += 1;
                return Some(unit);
            }
            if depth == 0 {
                return None;
            }
            self.frames.pop();
        }
    }
}
