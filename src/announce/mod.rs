//! Result announcements
//!
//! A small typed publish/subscribe bus. Handlers are registered per
//! [`AnnouncementKind`] and invoked synchronously, in registration order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::results::SuiteResult;

/// Kinds of announcement published by a suite run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AnnouncementKind {
    /// A test resolved and its record was added to the result
    Result,
}

/// Event published after a test resolves
#[derive(Clone)]
pub struct Announcement {
    kind: AnnouncementKind,
    selector: String,
    result: SuiteResult,
}

impl Announcement {
    /// Result announcement for the test that just resolved
    pub fn resolved(selector: impl Into<String>, result: SuiteResult) -> Self {
        Self {
            kind: AnnouncementKind::Result,
            selector: selector.into(),
            result,
        }
    }

    pub fn kind(&self) -> AnnouncementKind {
        self.kind
    }

    /// Selector of the test whose resolution triggered this announcement
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The live result; may still be incomplete
    pub fn result(&self) -> &SuiteResult {
        &self.result
    }
}

impl fmt::Debug for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Announcement")
            .field("kind", &self.kind)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

type Handler = Rc<dyn Fn(&Announcement)>;

/// Registry of announcement handlers
#[derive(Clone, Default)]
pub struct Announcer {
    subscriptions: Rc<RefCell<Vec<(AnnouncementKind, Handler)>>>,
}

impl Announcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `handler` for every later announcement of `kind`
    pub fn on(&self, kind: AnnouncementKind, handler: impl Fn(&Announcement) + 'static) {
        let handler: Handler = Rc::new(handler);
        self.subscriptions.borrow_mut().push((kind, handler));
    }

    /// Deliver `announcement` to the handlers registered for its kind.
    ///
    /// Handlers registered while publishing only see later announcements.
    pub fn publish(&self, announcement: &Announcement) {
        let handlers: Vec<Handler> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == announcement.kind)
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in handlers {
            handler(announcement);
        }
    }

    pub fn subscriber_count(&self, kind: AnnouncementKind) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl fmt::Debug for Announcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Announcer")
            .field("subscriptions", &self.subscriptions.borrow().len())
            .finish()
    }
}
