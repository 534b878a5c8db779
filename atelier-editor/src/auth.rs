/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use tracing::{debug, info};

pub trait AuthProvider {
    fn is_authenticated(&self) -> bool;
    fn bearer_token(&self) -> Option<String>;
}

/// Credential held in memory; signed out while `token` is `None`.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    pub token: Option<String>,
}

impl StaticAuth {
    pub fn signed_in(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Holds back one job until the user is signed in. A newer request replaces
/// an older pending one.
#[derive(Debug)]
pub struct ExportGate<T> {
    pending: Option<T>,
}

impl<T> Default for ExportGate<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> ExportGate<T> {
    /// Returns the job back when it may run now, otherwise parks it.
    pub fn request(&mut self, auth: &dyn AuthProvider, job: T) -> Option<T> {
        if auth.is_authenticated() {
            return Some(job);
        }
        if self.pending.replace(job).is_some() {
            debug!("replaced an earlier deferred export");
        }
        info!("export deferred until sign-in");
        None
    }

    /// Releases the parked job once `auth` reports a signed-in user.
    pub fn on_authenticated(&mut self, auth: &dyn AuthProvider) -> Option<T> {
        if !auth.is_authenticated() {
            return None;
        }
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }
}
