//! Registry of open sessions with an explicit current selection.

use crate::config::EnvConfig;
use crate::error::{EnvError, EnvResult};
use crate::session::Session;
use log::{info, warn};
use std::path::Path;

/// Open sessions keyed by store name.
#[derive(Debug, Default)]
pub struct Registry {
    config: EnvConfig,
    sessions: Vec<Session>,
    current: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EnvConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered store names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sessions.iter().map(Session::name).collect()
    }

    /// Opens (or creates) the store at `path`, registers it under `name` and
    /// selects it.
    pub fn open(&mut self, name: &str, path: impl AsRef<Path>) -> EnvResult<&mut Session> {
        if self.position(name).is_some() {
            return Err(EnvError::DuplicateConnection(name.to_string()));
        }
        let session = Session::open(name, path, self.config.clone())?;
        self.register(session)
    }

    /// Appends an opened session and selects it.
    pub fn register(&mut self, session: Session) -> EnvResult<&mut Session> {
        if self.position(session.name()).is_some() {
            return Err(EnvError::DuplicateConnection(session.name().to_string()));
        }
        info!(
            "event=connection_register module=session status=ok sessions={}",
            self.sessions.len() + 1
        );
        self.current = Some(session.name().to_string());
        self.sessions.push(session);
        let index = self.sessions.len() - 1;
        Ok(&mut self.sessions[index])
    }

    pub fn lookup(&self, name: &str) -> EnvResult<&Session> {
        self.position(name)
            .map(|index| &self.sessions[index])
            .ok_or_else(|| EnvError::ConnectionNotFound(name.to_string()))
    }

    pub fn lookup_mut(&mut self, name: &str) -> EnvResult<&mut Session> {
        match self.position(name) {
            Some(index) => Ok(&mut self.sessions[index]),
            None => Err(EnvError::ConnectionNotFound(name.to_string())),
        }
    }

    /// Makes an already registered session current.
    pub fn select(&mut self, name: &str) -> EnvResult<()> {
        if self.position(name).is_none() {
            return Err(EnvError::ConnectionNotFound(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> EnvResult<&Session> {
        let name = self.current.as_deref().ok_or(EnvError::NoOpenConnection)?;
        self.lookup(name)
    }

    /// Returns the selected session, or `NoOpenConnection`.
    ///
    /// Every mutation of projects, templates or entries goes through here.
    pub fn require_current(&mut self) -> EnvResult<&mut Session> {
        let index = self
            .current
            .as_deref()
            .and_then(|name| self.position(name))
            .ok_or(EnvError::NoOpenConnection)?;
        Ok(&mut self.sessions[index])
    }

    /// Closes a session's store and unregisters it.
    ///
    /// Unflushed changes of that session are discarded. Clears the current
    /// selection when it pointed at the closed session.
    pub fn close(&mut self, name: &str) -> EnvResult<()> {
        let index = self
            .position(name)
            .ok_or_else(|| EnvError::ConnectionNotFound(name.to_string()))?;
        let session = self.sessions.remove(index);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        if session.has_pending_changes() {
            warn!("event=connection_close module=session status=discarding_pending_changes");
        }
        session.close()?;
        info!(
            "event=connection_close module=session status=ok sessions={}",
            self.sessions.len()
        );
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sessions
            .iter()
            .position(|session| session.name() == name)
    }
}
