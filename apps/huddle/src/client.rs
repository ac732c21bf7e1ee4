//! # Orchestration Client
//!
//! [`AppClient`] is the only code that calls the remote service and then
//! dispatches. Every flow follows a fixed choreography:
//!
//! ```text
//! SET_STATUS(loading) → call wrapper → re-check guard → SET_* | SET_ERROR
//! ```
//!
//! ## Stale responses
//!
//! A load captures a ticket before its call: the flow's sequence number
//! and the session epoch. After the call the ticket must still be current
//! (no newer load of the same flow started, no sign-out happened, the store
//! is still authenticated) or the result is dropped without a dispatch and
//! the load reports [`LoadOutcome::Superseded`].
//!
//! Sign-out bumps the epoch before it clears anything, so loads that were in
//! flight when it started can never repopulate a cleared session. Auth flows
//! check the epoch too: a sign-in whose reply lands after a sign-out returns
//! `CANCELLED` and dispatches nothing.
//!
//! The profile and subscription slices belong to the signed-in member. Any
//! auth dispatch that leaves the store unauthenticated is followed by
//! `profile/CLEAR` and `subscription/SET_CURRENT(null)`, and a session for a
//! different member clears them before it is installed.

use crate::resolver::ProfileResolver;
use crate::service::{RemoteService, ops};
use crate::store::{LOG_CONTEXT, Store};
use crate::wrapper::{CallWrapper, OperationKind};
use huddle_core::state::selectors::{select_current_user, select_profile};
use huddle_core::{
    ApiError, AuthAction, AuthReply, AuthReplyRecord, AuthSession, AuthUser, Envelope, Product,
    ProductRecord, Profile, ProfileAction, ProfilePatch, ProfileRecord, PublicProfile,
    SessionRecord, SliceStatus, Subscription, SubscriptionAction, SubscriptionRecord, Transaction,
    TransactionRecord, UserId, codes,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation name of public-profile reads in call events.
pub const PUBLIC_PROFILE_OPERATION: &str = "profiles.public";

// =============================================================================
// OUTCOMES
// =============================================================================

/// How a load ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result was dispatched.
    Applied,
    /// A newer load or a sign-out made the result stale; nothing was dispatched.
    Superseded,
}

/// How a sign-up ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account exists and is signed in.
    SignedIn(AuthUser),
    /// The account exists but awaits email confirmation; nobody is signed in.
    ConfirmationPending(AuthUser),
}

// =============================================================================
// TICKETS
// =============================================================================

#[derive(Debug, Default)]
struct Sequence(AtomicU64);

impl Sequence {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.0.load(Ordering::SeqCst) == seq
    }
}

#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    epoch: u64,
    needs_session: bool,
}

#[derive(Debug, Default)]
struct Flows {
    profile: Sequence,
    subscription: Sequence,
    products: Sequence,
    transactions: Sequence,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Owns the store and sequences remote calls with dispatches.
pub struct AppClient {
    store: Arc<Store>,
    api: CallWrapper,
    resolver: ProfileResolver,
    epoch: AtomicU64,
    flows: Flows,
}

impl AppClient {
    pub fn new(store: Arc<Store>, api: CallWrapper, resolver: ProfileResolver) -> Self {
        Self {
            store,
            api,
            resolver,
            epoch: AtomicU64::new(0),
            flows: Flows::default(),
        }
    }

    /// A client over `service` with a fresh store and the friendship-backed resolver.
    pub fn connect(service: Arc<dyn RemoteService>) -> Self {
        Self::new(
            Arc::new(Store::new()),
            CallWrapper::new(Arc::clone(&service)),
            ProfileResolver::with_friendships(service),
        )
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn ticket(&self, flow: &Sequence, needs_session: bool) -> Ticket {
        Ticket {
            seq: flow.next(),
            epoch: self.epoch.load(Ordering::SeqCst),
            needs_session,
        }
    }

    fn is_current(&self, flow: &Sequence, ticket: Ticket) -> bool {
        flow.is_latest(ticket.seq)
            && self.epoch.load(Ordering::SeqCst) == ticket.epoch
            && (!ticket.needs_session || self.store.get_state().auth.is_authenticated)
    }

    fn current_user_id(&self) -> Result<UserId, ApiError> {
        let state = self.store.get_state();
        if !state.auth.is_authenticated {
            return Err(ApiError::not_authenticated());
        }
        select_current_user(&state)
            .map(|u| u.id.clone())
            .ok_or_else(ApiError::not_authenticated)
    }

    // =========================================================================
    // SESSION LIFECYCLE
    // =========================================================================

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidate every ticket and auth flow issued so far.
    fn cancel_in_flight(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop the member-scoped slices.
    fn clear_member_slices(&self) {
        self.store.dispatch(ProfileAction::Clear);
        self.store.dispatch(SubscriptionAction::SetCurrent(None));
    }

    /// Follow-up of any auth dispatch that left the store unauthenticated.
    fn end_session(&self) {
        self.cancel_in_flight();
        self.clear_member_slices();
    }

    /// The error returned by an auth flow whose reply arrived after a
    /// sign-out (or another session change). Nothing is dispatched.
    fn cancelled(&self, operation: &str) -> ApiError {
        tracing::debug!(
            context = LOG_CONTEXT,
            operation,
            "session changed while the call was in flight, reply dropped"
        );
        ApiError::new(
            codes::CANCELLED,
            format!("{operation} was overtaken by a session change"),
        )
    }

    // =========================================================================
    // AUTH FLOWS
    // =========================================================================

    /// Create an account. On a live session, loads the new member's profile
    /// before returning.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ApiError> {
        let epoch = self.epoch();
        self.store.dispatch(AuthAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::AUTH_SIGN_UP,
                json!({ "email": email, "password": password }),
                |record: AuthReplyRecord| AuthReply::try_from(record),
            )
            .await;
        if self.epoch() != epoch {
            return Err(self.cancelled(ops::AUTH_SIGN_UP));
        }
        let reply = self.settle_auth(envelope)?;

        match (reply.session, reply.user) {
            (Some(session), _) => {
                let user = self.start_session(session).await;
                Ok(SignUpOutcome::SignedIn(user))
            }
            (None, Some(user)) => {
                tracing::info!(
                    context = LOG_CONTEXT,
                    user_id = %user.id,
                    "sign-up awaits email confirmation"
                );
                self.store.dispatch(AuthAction::SetSession(None));
                self.end_session();
                Ok(SignUpOutcome::ConfirmationPending(user))
            }
            (None, None) => Err(self.fail_auth(ApiError::new(
                codes::SESSION_MISSING,
                "sign-up returned neither a user nor a session",
            ))),
        }
    }

    /// Sign in with email and password, then load the member's profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ApiError> {
        let epoch = self.epoch();
        self.store.dispatch(AuthAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::AUTH_SIGN_IN,
                json!({ "email": email, "password": password }),
                |record: AuthReplyRecord| AuthReply::try_from(record),
            )
            .await;
        if self.epoch() != epoch {
            return Err(self.cancelled(ops::AUTH_SIGN_IN));
        }
        let reply = self.settle_auth(envelope)?;

        let Some(session) = reply.session else {
            return Err(self.fail_auth(ApiError::new(
                codes::SESSION_MISSING,
                "sign-in succeeded without a session",
            )));
        };
        Ok(self.start_session(session).await)
    }

    /// Sign out. Local state is cleared even when the remote call fails.
    ///
    /// Loads and auth flows already in flight are cancelled before the
    /// remote call starts.
    pub async fn sign_out(&self) {
        self.cancel_in_flight();

        let token = self
            .store
            .get_state()
            .auth
            .session
            .as_ref()
            .map(|s| s.access_token.clone());
        let envelope: Envelope<()> = self
            .api
            .query(ops::AUTH_SIGN_OUT, json!({ "access_token": token }))
            .await;
        if let Some(error) = envelope.error() {
            tracing::warn!(
                context = LOG_CONTEXT,
                error_code = %error.code,
                error = %error.message,
                "remote sign-out failed, clearing local session anyway"
            );
        }

        self.store.dispatch(AuthAction::ClearSession);
        self.clear_member_slices();
    }

    /// Pick up a session the backend still holds. `Ok(None)` when there is none.
    pub async fn restore_session(&self) -> Result<Option<AuthUser>, ApiError> {
        let epoch = self.epoch();
        self.store.dispatch(AuthAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::AUTH_SESSION,
                json!({}),
                |record: Option<SessionRecord>| record.map(AuthSession::try_from).transpose(),
            )
            .await;
        if self.epoch() != epoch {
            return Err(self.cancelled(ops::AUTH_SESSION));
        }

        match envelope.into_result() {
            Ok(Some(session)) => Ok(Some(self.start_session(session).await)),
            Ok(None) => {
                self.store.dispatch(AuthAction::SetSession(None));
                self.end_session();
                Ok(None)
            }
            Err(error) => Err(self.fail_auth(error)),
        }
    }

    fn settle_auth(&self, envelope: Envelope<AuthReply>) -> Result<AuthReply, ApiError> {
        envelope.into_result().map_err(|error| self.fail_auth(error))
    }

    /// `auth/SET_ERROR` drops the session, so the member slices go with it.
    fn fail_auth(&self, error: ApiError) -> ApiError {
        self.store.dispatch(AuthAction::SetError(error.clone()));
        self.end_session();
        error
    }

    async fn start_session(&self, session: AuthSession) -> AuthUser {
        let user = session.user.clone();

        let state = self.store.get_state();
        let switching = select_current_user(&state).is_some_and(|u| u.id != user.id)
            || select_profile(&state).is_some_and(|p| p.id != user.id);
        if switching {
            self.cancel_in_flight();
            self.clear_member_slices();
        }

        self.store.dispatch(AuthAction::SetSession(Some(session)));
        tracing::info!(context = LOG_CONTEXT, user_id = %user.id, "session started");

        if let Err(error) = self.load_profile(&user.id).await {
            tracing::warn!(
                context = LOG_CONTEXT,
                user_id = %user.id,
                error_code = %error.code,
                "profile load after sign-in failed"
            );
        }
        user
    }

    // =========================================================================
    // PROFILE FLOWS
    // =========================================================================

    /// Load a member's own profile into the profile slice.
    pub async fn load_profile(&self, user_id: &UserId) -> Result<LoadOutcome, ApiError> {
        if !self.store.get_state().auth.is_authenticated {
            return Err(ApiError::not_authenticated());
        }
        let flow = &self.flows.profile;
        let ticket = self.ticket(flow, true);
        self.store.dispatch(ProfileAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::PROFILES_GET,
                json!({ "id": user_id }),
                |record: Option<ProfileRecord>| record.map(Profile::try_from).transpose(),
            )
            .await;

        if !self.is_current(flow, ticket) {
            tracing::debug!(
                context = LOG_CONTEXT,
                user_id = %user_id,
                "stale profile load dropped"
            );
            return Ok(LoadOutcome::Superseded);
        }

        let result = envelope.into_result().and_then(|found| {
            found.ok_or_else(|| ApiError::not_found(format!("profile {user_id}")))
        });
        match result {
            Ok(profile) => {
                self.store.dispatch(ProfileAction::Set(profile));
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                self.store.dispatch(ProfileAction::SetError(error.clone()));
                Err(error)
            }
        }
    }

    /// Reload the signed-in member's profile.
    pub async fn refresh_profile(&self) -> Result<LoadOutcome, ApiError> {
        let user_id = self.current_user_id()?;
        self.load_profile(&user_id).await
    }

    /// Change one field of the signed-in member's profile.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), ApiError> {
        let user_id = self.current_user_id()?;
        tracing::debug!(
            context = LOG_CONTEXT,
            user_id = %user_id,
            column = patch.column(),
            "profile update requested"
        );

        let envelope: Envelope<serde_json::Value> = self
            .api
            .query(
                ops::PROFILES_UPDATE,
                json!({ "id": user_id, "patch": patch }),
            )
            .await;

        match envelope.into_result() {
            Ok(_) => {
                self.store.dispatch(ProfileAction::UpdateField(patch));
                Ok(())
            }
            Err(error) => {
                self.store.dispatch(ProfileAction::SetError(error.clone()));
                Err(error)
            }
        }
    }

    /// Read `subject`'s profile as `viewer` sees it.
    pub async fn get_public_profile(
        &self,
        subject: &UserId,
        viewer: Option<&UserId>,
    ) -> Envelope<PublicProfile> {
        self.api
            .invoke(
                OperationKind::Query,
                PUBLIC_PROFILE_OPERATION,
                self.resolver.resolve(subject, viewer),
            )
            .await
    }

    /// Read `subject`'s profile as the signed-in member (or anonymously).
    pub async fn view_profile(&self, subject: &UserId) -> Envelope<PublicProfile> {
        let viewer = self.current_user_id().ok();
        self.get_public_profile(subject, viewer.as_ref()).await
    }

    // =========================================================================
    // SUBSCRIPTION FLOWS
    // =========================================================================

    /// Load the member's current subscription.
    pub async fn load_subscription(&self, user_id: &UserId) -> Result<LoadOutcome, ApiError> {
        if !self.store.get_state().auth.is_authenticated {
            return Err(ApiError::not_authenticated());
        }
        let flow = &self.flows.subscription;
        let ticket = self.ticket(flow, true);
        self.store
            .dispatch(SubscriptionAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::SUBSCRIPTIONS_CURRENT,
                json!({ "user_id": user_id }),
                |record: Option<SubscriptionRecord>| {
                    record.map(Subscription::try_from).transpose()
                },
            )
            .await;

        self.settle_subscription(flow, ticket, envelope, SubscriptionAction::SetCurrent)
    }

    /// Load the product catalogue. Needs no session.
    pub async fn load_products(&self) -> Result<LoadOutcome, ApiError> {
        let flow = &self.flows.products;
        let ticket = self.ticket(flow, false);
        self.store
            .dispatch(SubscriptionAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(ops::PRODUCTS_LIST, json!({}), |rows: Vec<ProductRecord>| {
                rows.into_iter()
                    .map(Product::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .await;

        self.settle_subscription(flow, ticket, envelope, SubscriptionAction::SetProducts)
    }

    /// Load the signed-in member's transaction ledger.
    pub async fn load_transactions(&self) -> Result<LoadOutcome, ApiError> {
        let user_id = self.current_user_id()?;
        let flow = &self.flows.transactions;
        let ticket = self.ticket(flow, true);
        self.store
            .dispatch(SubscriptionAction::SetStatus(SliceStatus::Loading));

        let envelope = self
            .api
            .query_mapped(
                ops::TRANSACTIONS_LIST,
                json!({ "user_id": user_id }),
                |rows: Vec<TransactionRecord>| {
                    rows.into_iter()
                        .map(Transaction::try_from)
                        .collect::<Result<Vec<_>, _>>()
                },
            )
            .await;

        self.settle_subscription(flow, ticket, envelope, SubscriptionAction::SetTransactions)
    }

    fn settle_subscription<T>(
        &self,
        flow: &Sequence,
        ticket: Ticket,
        envelope: Envelope<T>,
        apply: impl FnOnce(T) -> SubscriptionAction,
    ) -> Result<LoadOutcome, ApiError> {
        if !self.is_current(flow, ticket) {
            tracing::debug!(context = LOG_CONTEXT, "stale subscription load dropped");
            return Ok(LoadOutcome::Superseded);
        }
        match envelope.into_result() {
            Ok(data) => {
                self.store.dispatch(apply(data));
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                self.store
                    .dispatch(SubscriptionAction::SetError(error.clone()));
                Err(error)
            }
        }
    }
}
