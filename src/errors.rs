//! Scoped collection of model issues.
//!
//! Resource-model validation does not stop at the first problem. Issues are
//! accumulated in an [`ErrorScope`] that is passed by reference through the
//! model-building call graph. Scopes nest: every [`ErrorScope::enter`]
//! returns a [`ScopeGuard`], and only the outermost guard reports and clears
//! the collected issues when it goes away.
//!
//! ```
//! use jersey_router::errors::ErrorScope;
//!
//! let scope = ErrorScope::new();
//! let guard = scope.enter();
//! guard.warning("OrdersResource", "no resource methods");
//! assert!(guard.finish().is_ok());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;

use tracing::{debug, error, warn};

/// How serious a collected issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Prevents the model from being used.
    Fatal,
    Warning,
    /// Informational only.
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Fatal => "FATAL",
            Severity::Warning => "WARNING",
            Severity::Hint => "HINT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    source: String,
    message: String,
    severity: Severity,
}

impl ErrorMessage {
    pub fn new(source: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity,
        }
    }

    /// What the issue is about, usually a resource name or template.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.source, self.message)
    }
}

/// Returned by [`ScopeGuard::finish`] when fatal issues were collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessagesError {
    messages: Vec<ErrorMessage>,
}

impl ErrorMessagesError {
    /// Every issue of the scope, fatal or not.
    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }

    pub fn fatal_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_fatal()).count()
    }
}

impl fmt::Display for ErrorMessagesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fatal issue(s) found", self.fatal_count())?;
        for (i, message) in self.messages.iter().filter(|m| m.is_fatal()).enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorMessagesError {}

/// Accumulator for model issues with nested enter/exit and rollback marks.
///
/// Not `Sync`: a scope belongs to the single thread building a model.
#[derive(Debug, Default)]
pub struct ErrorScope {
    messages: RefCell<Vec<ErrorMessage>>,
    marks: RefCell<Vec<usize>>,
    depth: Cell<usize>,
}

impl ErrorScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a (possibly nested) collection scope.
    pub fn enter(&self) -> ScopeGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        ScopeGuard {
            scope: self,
            active: true,
        }
    }

    /// Current nesting depth; 0 outside of any guard.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    pub fn add(&self, message: ErrorMessage) {
        self.messages.borrow_mut().push(message);
    }

    pub fn fatal(&self, source: impl Into<String>, message: impl Into<String>) {
        self.add(ErrorMessage::new(source, message, Severity::Fatal));
    }

    pub fn warning(&self, source: impl Into<String>, message: impl Into<String>) {
        self.add(ErrorMessage::new(source, message, Severity::Warning));
    }

    pub fn hint(&self, source: impl Into<String>, message: impl Into<String>) {
        self.add(ErrorMessage::new(source, message, Severity::Hint));
    }

    /// Remember the current position so later issues can be rolled back.
    pub fn mark(&self) {
        let len = self.messages.borrow().len();
        self.marks.borrow_mut().push(len);
    }

    /// Forget the most recent mark and keep everything collected since.
    pub fn unmark(&self) {
        self.marks.borrow_mut().pop();
    }

    /// Drop every issue collected since the most recent mark, and the mark.
    ///
    /// Without a mark this is a no-op.
    pub fn reset(&self) {
        if let Some(len) = self.marks.borrow_mut().pop() {
            self.messages.borrow_mut().truncate(len);
        }
    }

    /// Snapshot of the collected issues; with `after_mark` only those added
    /// since the most recent mark.
    pub fn messages(&self, after_mark: bool) -> Vec<ErrorMessage> {
        let messages = self.messages.borrow();
        let start = if after_mark {
            self.marks.borrow().last().copied().unwrap_or(0)
        } else {
            0
        };
        messages[start.min(messages.len())..].to_vec()
    }

    pub fn fatal_issues_found(&self) -> bool {
        self.messages.borrow().iter().any(ErrorMessage::is_fatal)
    }

    fn exit(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth > 0 {
            return;
        }
        let messages = std::mem::take(&mut *self.messages.borrow_mut());
        self.marks.borrow_mut().clear();
        for message in &messages {
            match message.severity {
                Severity::Fatal => error!(
                    source = %message.source,
                    issue = %message.message,
                    "Fatal model issue"
                ),
                Severity::Warning => warn!(
                    source = %message.source,
                    issue = %message.message,
                    "Model issue"
                ),
                Severity::Hint => debug!(
                    source = %message.source,
                    issue = %message.message,
                    "Model hint"
                ),
            }
        }
    }
}

/// Acquisition of one [`ErrorScope`] level; exits the level when dropped.
#[must_use = "dropping the guard exits the scope immediately"]
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    scope: &'a ErrorScope,
    active: bool,
}

impl ScopeGuard<'_> {
    pub fn is_outermost(&self) -> bool {
        self.scope.depth() == 1
    }

    /// Exit this level and report whether fatal issues were collected.
    ///
    /// The check covers everything in the scope, including issues added by
    /// enclosing levels.
    pub fn finish(mut self) -> Result<(), ErrorMessagesError> {
        let result = if self.scope.fatal_issues_found() {
            Err(ErrorMessagesError {
                messages: self.scope.messages(false),
            })
        } else {
            Ok(())
        };
        self.active = false;
        self.scope.exit();
        result
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = ErrorScope;

    fn deref(&self) -> &ErrorScope {
        self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.scope.exit();
        }
    }
}
