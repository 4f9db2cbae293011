//! Session Manager
//!
//! Single writer of the authentication state. Every mutation moves the
//! persisted record, the `authorization` header and the in-memory state
//! together under one commit lock, and listeners hear about it only after
//! all three agree.
//!
//! Order per operation:
//! - sign-in: persist → set header → memory
//! - sign-out: clear header → clear persisted → memory
//! - user update: persist → memory (header untouched)

use gobarber_api::{bearer_value, ApiClient, BearerAuth};
use gobarber_storage::PersistentStore;
use parking_lot::{ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::SessionError;
use crate::observable::{Listeners, SessionReader, Subscription};
use crate::profile::{AvatarUpload, ProfileUpdate};
use crate::state::{AuthState, Authenticated};
use crate::user::{Credentials, UserProfile};
use crate::{Result, TOKEN_KEY, USER_KEY};

pub struct SessionManager {
    /// Last committed state
    state: Arc<RwLock<AuthState>>,
    /// Holds the token and user entries
    store: Arc<dyn PersistentStore>,
    /// Request side of the API client
    api: ApiClient,
    /// Only writer of the authorization header
    auth: Arc<BearerAuth>,
    /// Serializes commit sections. Reentrant so a listener may call back in.
    commit: Arc<ReentrantMutex<()>>,
    /// Bumped whenever the credential changes: restore, sign-in, sign-out
    epoch: Arc<AtomicU64>,
    /// Set while a network-bound operation awaits its response
    in_flight: Arc<AtomicBool>,
    listeners: Arc<Listeners>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn PersistentStore>, api: ApiClient, auth: BearerAuth) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::signed_out())),
            store,
            api,
            auth: Arc::new(auth),
            commit: Arc::new(ReentrantMutex::new(())),
            epoch: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicBool::new(false)),
            listeners: Arc::new(Listeners::default()),
        }
    }

    /// Restore the persisted session on cold start.
    ///
    /// Call once, before anything else issues requests. Anything short of a
    /// complete, readable record yields the signed-out state. Listeners are
    /// not notified.
    pub fn initialize(&self) -> AuthState {
        let _commit = self.commit.lock();

        let restored = match self.load_persisted() {
            Ok(restored) => restored,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding persisted session");
                None
            }
        };

        let restored = restored.and_then(|session| match bearer_value(&session.token) {
            Ok(header) => Some((header, session)),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted token is not usable, starting signed out");
                None
            }
        });

        let state = match restored {
            Some((header, session)) => {
                self.auth.set(header);
                tracing::info!(user_id = %session.user.id, "Restored persisted session");
                AuthState::from(session)
            }
            None => {
                self.auth.clear();
                tracing::info!("No persisted session, starting signed out");
                AuthState::signed_out()
            }
        };

        *self.state.write() = state.clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        state
    }

    /// Read both entries, then decide. Exactly one present counts as absent.
    fn load_persisted(&self) -> Result<Option<Authenticated>> {
        let token = self.store.get(TOKEN_KEY);
        let user = self.store.get(USER_KEY);

        let token = token.map_err(SessionError::PersistenceReadFailure)?;
        let user = user.map_err(SessionError::PersistenceReadFailure)?;

        match (token, user) {
            (Some(token), Some(user)) => {
                let user: UserProfile =
                    serde_json::from_str(&user).map_err(SessionError::MalformedPersistedState)?;
                Ok(Some(Authenticated { token, user }))
            }
            (None, None) => Ok(None),
            (token, user) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    has_user = user.is_some(),
                    "Ignoring partial persisted session"
                );
                Ok(None)
            }
        }
    }

    pub fn current(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    /// Read-only handle for consumers that must not mutate the session
    pub fn reader(&self) -> SessionReader {
        SessionReader::new(Arc::clone(&self.state), Arc::clone(&self.listeners))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials for a token and make it the active session.
    ///
    /// Not retried. On any failure nothing changes and no listener runs.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthState> {
        let _flight = InFlight::begin(&self.in_flight)?;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let session: Authenticated = self
            .api
            .post_json("sessions", credentials)
            .await
            .map_err(|e| {
                tracing::warn!(status = ?e.status(), error = %e, "Sign-in rejected");
                SessionError::AuthenticationFailed(e)
            })?;

        self.commit_sign_in(epoch, session)
    }

    fn commit_sign_in(&self, epoch: u64, session: Authenticated) -> Result<AuthState> {
        let header = bearer_value(&session.token).map_err(SessionError::AuthenticationFailed)?;

        let _commit = self.commit.lock();
        self.ensure_epoch(epoch)?;

        let state = AuthState::from(session);
        if let Err(e) = self.write_record(&state) {
            self.roll_back_record();
            return Err(e);
        }

        self.auth.set(header);
        *self.state.write() = state.clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(user) = state.user() {
            tracing::info!(user_id = %user.id, "Signed in");
        }

        self.listeners.notify(&state);
        Ok(state)
    }

    /// Forget the session everywhere. Signing out twice is harmless.
    pub fn sign_out(&self) -> Result<()> {
        let _commit = self.commit.lock();
        let previous = self.state.read().clone();

        self.auth.clear();

        let state = AuthState::signed_out();
        if let Err(e) = self.write_record(&state) {
            if let Some(session) = previous.session() {
                if let Ok(header) = bearer_value(&session.token) {
                    self.auth.set(header);
                }
            }
            self.roll_back_record();
            return Err(e);
        }

        *self.state.write() = state.clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        tracing::info!(user_id = ?previous.user().map(|u| &u.id), "Signed out");

        self.listeners.notify(&state);
        Ok(())
    }

    /// Replace the stored profile of the signed-in user.
    ///
    /// Fails with `NotAuthenticated` when signed out. The token and the
    /// authorization header are left alone.
    pub fn update_user(&self, user: UserProfile) -> Result<AuthState> {
        let _commit = self.commit.lock();
        self.commit_user(user)
    }

    /// `PUT profile`, then store what the server returned
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthState> {
        let _flight = InFlight::begin(&self.in_flight)?;
        let epoch = self.authenticated_epoch()?;

        let user: UserProfile = self.api.put_json("profile", update).await?;

        self.commit_remote_user(epoch, user)
    }

    /// Multipart `PATCH users/avatar`, then store what the server returned
    pub async fn update_avatar(&self, upload: AvatarUpload) -> Result<AuthState> {
        let _flight = InFlight::begin(&self.in_flight)?;
        let epoch = self.authenticated_epoch()?;

        let form = upload.into_form()?;
        let user: UserProfile = self.api.patch_multipart("users/avatar", form).await?;

        self.commit_remote_user(epoch, user)
    }

    fn commit_remote_user(&self, epoch: u64, user: UserProfile) -> Result<AuthState> {
        let _commit = self.commit.lock();
        self.ensure_epoch(epoch)?;
        self.commit_user(user)
    }

    /// Caller holds the commit lock
    fn commit_user(&self, user: UserProfile) -> Result<AuthState> {
        let token = self
            .state
            .read()
            .token()
            .map(str::to_string)
            .ok_or(SessionError::NotAuthenticated)?;

        let user_json = serde_json::to_string(&user).map_err(SessionError::Serialization)?;
        self.store
            .set(USER_KEY, &user_json)
            .map_err(SessionError::PersistenceWriteFailure)?;

        let state = AuthState::authenticated(token, user);
        *self.state.write() = state.clone();

        if let Some(user) = state.user() {
            tracing::info!(user_id = %user.id, "Updated user profile");
        }

        self.listeners.notify(&state);
        Ok(state)
    }

    fn authenticated_epoch(&self) -> Result<u64> {
        let _commit = self.commit.lock();
        if !self.state.read().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        Ok(self.epoch.load(Ordering::SeqCst))
    }

    fn ensure_epoch(&self, epoch: u64) -> Result<()> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::warn!("Discarding response for a session that has since changed");
            return Err(SessionError::Superseded);
        }
        Ok(())
    }

    /// Make the persisted record describe `state`
    fn write_record(&self, state: &AuthState) -> Result<()> {
        let written = match state.session() {
            Some(session) => {
                let user_json =
                    serde_json::to_string(&session.user).map_err(SessionError::Serialization)?;
                self.store.write_all(&[
                    (TOKEN_KEY, Some(session.token.as_str())),
                    (USER_KEY, Some(user_json.as_str())),
                ])
            }
            None => self.store.write_all(&[(TOKEN_KEY, None), (USER_KEY, None)]),
        };

        written.map_err(SessionError::PersistenceWriteFailure)
    }

    /// Best effort: put the persisted record back in line with memory
    fn roll_back_record(&self) {
        let committed = self.state.read().clone();
        if let Err(e) = self.write_record(&committed) {
            tracing::error!(
                error = %e,
                "Failed to restore persisted session, next start may not match this one"
            );
        }
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            api: self.api.clone(),
            auth: Arc::clone(&self.auth),
            commit: Arc::clone(&self.commit),
            epoch: Arc::clone(&self.epoch),
            in_flight: Arc::clone(&self.in_flight),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

/// Marks a network-bound operation as running; cleared on drop, including
/// when the caller abandons the future.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn begin(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::OperationInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
