//! Scope-chain resolution and mutation of scenario variables.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use super::defaults::{ValueKind, VariableDefaults};
use super::overrides::OverrideStack;
use super::session::Session;
use super::VariableError;

/// Resolves scenario variables through override stack → session → defaults.
///
/// One store exists per request context and is never shared between
/// concurrent requests; the hosting application constructs it around the
/// session it restored for that request. Batch scripts use
/// [`VariableStore::batch`], which has no session and only accepts plain
/// writes inside a [`VariableStore::allow_external_set`] scope.
///
/// The override stack is context-local (it lives inside the store), so
/// scoped overrides on one store cannot leak into another evaluation
/// context.
pub struct VariableStore {
    defaults: Arc<VariableDefaults>,
    session: Option<Arc<Mutex<Session>>>,
    overrides: Mutex<OverrideStack>,
}

impl VariableStore {
    /// Store for a request context, writing through to `session`.
    pub fn for_session(defaults: Arc<VariableDefaults>, session: Arc<Mutex<Session>>) -> Self {
        Self {
            defaults,
            session: Some(session),
            overrides: Mutex::new(OverrideStack::default()),
        }
    }

    /// Store for a non-request context (batch scripts, what-if harnesses).
    pub fn batch(defaults: Arc<VariableDefaults>) -> Self {
        Self {
            defaults,
            session: None,
            overrides: Mutex::new(OverrideStack::default()),
        }
    }

    pub fn defaults(&self) -> &Arc<VariableDefaults> {
        &self.defaults
    }

    /// Resolves `name` per the scope chain. The returned value is owned,
    /// so callers cannot mutate shared defaults through it.
    pub fn get(&self, name: &str) -> Result<Value, VariableError> {
        let default = self.defaults.get(name)?;

        if let Some(value) = self.overrides.lock().get(name) {
            return Ok(value.clone());
        }

        if let Some(session) = &self.session {
            let mut session = session.lock();
            session.synchronize(self.defaults.fingerprint());
            if let Some(value) = session.get(name) {
                return Ok(value.clone());
            }
        }

        Ok(default.clone())
    }

    /// Writes `name` in the innermost writable scope.
    ///
    /// Inside a request context the write goes to the session; writing a
    /// value equal to the default deletes the session entry instead, so
    /// "reset" is implicit and storage stays minimal. Outside a request
    /// context the write goes to the override stack and requires an
    /// `allow_external_set` scope.
    pub fn set(&self, name: &str, value: Value) -> Result<(), VariableError> {
        let default = self.check_kind(name, &value)?;

        match &self.session {
            Some(session) => {
                let mut session = session.lock();
                session.synchronize(self.defaults.fingerprint());
                if value == default {
                    session.remove(name);
                    trace!(variable = name, "session override removed");
                } else {
                    session.set(name, value);
                    trace!(variable = name, "session override set");
                }
            }
            None => {
                let mut overrides = self.overrides.lock();
                if !overrides.allow_set() {
                    return Err(VariableError::SetNotAllowed { name: name.to_string() });
                }
                if value == default {
                    overrides.remove_topmost(name);
                } else {
                    overrides.set(name, value);
                }
            }
        }
        Ok(())
    }

    /// Pushes a temporary override and returns a guard that restores the
    /// previous value, or absence, when dropped: on normal exit, `?`
    /// propagation and panic unwind alike. Nested guards restore to the
    /// immediately enclosing value, not the default.
    pub fn scoped_override(
        &self,
        name: &str,
        value: Value,
    ) -> Result<OverrideGuard<'_>, VariableError> {
        self.check_kind(name, &value)?;
        let depth = self.overrides.lock().push(name, value);
        trace!(variable = name, depth, "override pushed");
        Ok(OverrideGuard { store: self, depth })
    }

    /// Enables plain `set` calls on a batch store for the guard's
    /// lifetime. Guards nest.
    pub fn allow_external_set(&self) -> AllowSetGuard<'_> {
        self.overrides.lock().enter_allow_set();
        AllowSetGuard { store: self }
    }

    /// Removes any session or stack override for one name.
    ///
    /// Calling this while a scoped guard for the same name is live is
    /// unsupported; the guard restores by stack depth.
    pub fn reset(&self, name: &str) -> Result<(), VariableError> {
        self.defaults.get(name)?;
        self.overrides.lock().remove_all(name);
        if let Some(session) = &self.session {
            let mut session = session.lock();
            session.synchronize(self.defaults.fingerprint());
            session.remove(name);
        }
        Ok(())
    }

    /// Clears every override in this store's scopes and stamps the current
    /// default fingerprint into the session.
    pub fn reset_all(&self) {
        self.overrides.lock().clear_frames();
        if let Some(session) = &self.session {
            session.lock().reset(self.defaults.fingerprint());
        }
    }

    /// Current value of every variable in the default set.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.defaults
            .names()
            .map(|name| {
                let value = self
                    .get(name)
                    .expect("BUG: default-set names always resolve");
                (name.to_string(), value)
            })
            .collect()
    }

    fn check_kind(&self, name: &str, value: &Value) -> Result<Value, VariableError> {
        let default = self.defaults.get(name)?;
        let expected = ValueKind::of(default);
        let got = ValueKind::of(value);
        if expected != got {
            return Err(VariableError::TypeMismatch {
                name: name.to_string(),
                expected,
                got,
            });
        }
        Ok(default.clone())
    }
}

/// Scoped-override guard; truncates the stack back to its entry point on
/// drop, which also runs during panic unwinding.
#[must_use = "the override is undone when the guard drops"]
pub struct OverrideGuard<'a> {
    store: &'a VariableStore,
    depth: usize,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        self.store.overrides.lock().truncate(self.depth);
        trace!(depth = self.depth, "override popped");
    }
}

/// Guard for the explicit "allow external set" scope on batch stores.
#[must_use = "external sets are forbidden again when the guard drops"]
pub struct AllowSetGuard<'a> {
    store: &'a VariableStore,
}

impl Drop for AllowSetGuard<'_> {
    fn drop(&mut self) {
        self.store.overrides.lock().exit_allow_set();
    }
}
