use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::User;

pub type AuthListener = Box<dyn Fn(Option<&User>) + Send>;

/// Source of the signed-in identity.
pub trait AuthProvider {
    fn current_user(&self) -> Option<User>;

    /// Register a listener called with the new identity on every sign-in and sign-out.
    fn subscribe(&self, listener: AuthListener);

    fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(Error::Unauthenticated)
    }
}

/// Identity held in process, switched explicitly with `sign_in` / `sign_out`.
#[derive(Default)]
pub struct LocalAuth {
    user: Mutex<Option<User>>,
    listeners: Mutex<Vec<AuthListener>>,
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Mutex::new(Some(user)),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn sign_in(&self, user: User) {
        log::info!("Signed in as {}", user.email);
        self.set(Some(user));
    }

    pub fn sign_out(&self) {
        log::info!("Signed out");
        self.set(None);
    }

    fn set(&self, user: Option<User>) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = user.clone();
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener(user.as_ref());
        }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        self.user.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn subscribe(&self, listener: AuthListener) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }
}
