//! World events and the listener registry.
//!
//! Listeners are registered per [`WorldEventKind`]. [`EventEmitter::emit`]
//! copies the matching listeners before calling any of them, so a listener
//! that registers or removes listeners only affects later emissions.

use std::fmt;
use std::rc::Rc;

use planar_constraint::Equation;
use planar_types::{BodyId, ShapeId, SpringId};

/// Something that happened in the world.
#[derive(Debug, Clone, Copy)]
pub enum WorldEvent<'a> {
    /// A step finished.
    PostStep,
    /// A body was added.
    AddBody {
        /// The new body.
        body: BodyId,
    },
    /// A body was removed.
    RemoveBody {
        /// The removed body.
        body: BodyId,
    },
    /// A spring was added.
    AddSpring {
        /// The new spring.
        spring: SpringId,
    },
    /// A spring was removed.
    RemoveSpring {
        /// The removed spring.
        spring: SpringId,
    },
    /// A contact appeared between two bodies that were apart on the
    /// previous step.
    Impact {
        /// Body A of the contact.
        body_a: BodyId,
        /// Body B of the contact.
        body_b: BodyId,
        /// Shape on body A.
        shape_a: ShapeId,
        /// Shape on body B.
        shape_b: ShapeId,
        /// The contact row.
        contact: &'a Equation,
    },
    /// The broadphase produced its candidate pairs.
    PostBroadphase {
        /// Candidate body pairs.
        pairs: &'a [(BodyId, BodyId)],
    },
    /// Two shapes started touching.
    BeginContact {
        /// First shape.
        shape_a: ShapeId,
        /// Second shape.
        shape_b: ShapeId,
        /// Body owning `shape_a`.
        body_a: BodyId,
        /// Body owning `shape_b`.
        body_b: BodyId,
        /// Contact rows generated for the pair. Empty for sensors.
        contact_equations: &'a [Equation],
    },
    /// Two shapes stopped touching.
    EndContact {
        /// First shape.
        shape_a: ShapeId,
        /// Second shape.
        shape_b: ShapeId,
        /// Body owning `shape_a`.
        body_a: BodyId,
        /// Body owning `shape_b`.
        body_b: BodyId,
    },
    /// Contact and friction rows are about to be solved.
    PreSolve {
        /// Contact rows of this step.
        contact_equations: &'a [Equation],
        /// Friction rows of this step.
        friction_equations: &'a [Equation],
    },
}

/// Discriminant of [`WorldEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    /// See [`WorldEvent::PostStep`].
    PostStep,
    /// See [`WorldEvent::AddBody`].
    AddBody,
    /// See [`WorldEvent::RemoveBody`].
    RemoveBody,
    /// See [`WorldEvent::AddSpring`].
    AddSpring,
    /// See [`WorldEvent::RemoveSpring`].
    RemoveSpring,
    /// See [`WorldEvent::Impact`].
    Impact,
    /// See [`WorldEvent::PostBroadphase`].
    PostBroadphase,
    /// See [`WorldEvent::BeginContact`].
    BeginContact,
    /// See [`WorldEvent::EndContact`].
    EndContact,
    /// See [`WorldEvent::PreSolve`].
    PreSolve,
}

impl WorldEvent<'_> {
    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> WorldEventKind {
        match self {
            Self::PostStep => WorldEventKind::PostStep,
            Self::AddBody { .. } => WorldEventKind::AddBody,
            Self::RemoveBody { .. } => WorldEventKind::RemoveBody,
            Self::AddSpring { .. } => WorldEventKind::AddSpring,
            Self::RemoveSpring { .. } => WorldEventKind::RemoveSpring,
            Self::Impact { .. } => WorldEventKind::Impact,
            Self::PostBroadphase { .. } => WorldEventKind::PostBroadphase,
            Self::BeginContact { .. } => WorldEventKind::BeginContact,
            Self::EndContact { .. } => WorldEventKind::EndContact,
            Self::PreSolve { .. } => WorldEventKind::PreSolve,
        }
    }
}

/// Handle returned by [`EventEmitter::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A listener. It receives the event and the emitter, so it may register
/// or remove listeners while being called.
pub type Callback = Rc<dyn Fn(&WorldEvent<'_>, &mut EventEmitter)>;

struct Listener {
    id: ListenerId,
    kind: WorldEventKind,
    callback: Callback,
}

/// Registry of event listeners.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl EventEmitter {
    /// Create an emitter without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event.
    pub fn on<F>(&mut self, kind: WorldEventKind, callback: F) -> ListenerId
    where
        F: Fn(&WorldEvent<'_>, &mut EventEmitter) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Rc::new(callback),
        });
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Check whether any listener is registered for `kind`.
    #[must_use]
    pub fn has(&self, kind: WorldEventKind) -> bool {
        self.listeners.iter().any(|l| l.kind == kind)
    }

    /// Check whether a listener is still registered.
    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: WorldEventKind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }

    /// Call every listener registered for the event's kind, in registration
    /// order.
    pub fn emit(&mut self, event: &WorldEvent<'_>) {
        let kind = event.kind();
        let snapshot: Vec<Callback> = self
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| Rc::clone(&l.callback))
            .collect();
        for callback in snapshot {
            callback(event, self);
        }
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
