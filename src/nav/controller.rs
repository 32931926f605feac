//! Backstack state machine.
//!
//! `NavigationController` owns the ordered backstack; the current
//! destination is always the last element, and the two change together.
//! Mutations are `&mut self` and are expected to run on the single UI
//! event loop; a multi-threaded host wraps the controller in one
//! mutual-exclusion boundary.
//!
//! Each mutation publishes a `NavSnapshot` over a `tokio::sync::watch`
//! channel so a declarative UI layer can re-render from the latest state.

use tokio::sync::watch;
use tracing::debug;

use crate::auth::{IdentityProvider, SessionManager};

use super::destination::Destination;

/// Atomically published navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavSnapshot {
    pub backstack: Vec<Destination>,
    pub current: Destination,
}

pub struct NavigationController {
    backstack: Vec<Destination>,
    snapshot_tx: watch::Sender<NavSnapshot>,
}

impl NavigationController {
    /// Create a controller seeded with a single root entry.
    pub fn new(root: Destination) -> Self {
        let (snapshot_tx, _) = watch::channel(NavSnapshot {
            backstack: vec![root.clone()],
            current: root.clone(),
        });
        Self {
            backstack: vec![root],
            snapshot_tx,
        }
    }

    /// Startup root selection against the identity provider.
    ///
    /// Queried exactly once; later session changes do not re-run it. The
    /// check suspends on `bearer_credential`, so a caller whose UI may be
    /// torn down in the meantime must discard the result instead of
    /// applying a late navigation.
    pub async fn start_destination(identity: &dyn IdentityProvider) -> Destination {
        let authenticated =
            identity.current_identity().is_some() && !identity.bearer_credential().await.is_empty();
        if authenticated {
            Destination::Home
        } else {
            Destination::Login
        }
    }

    /// Startup root selection against an already-hydrated session.
    pub fn start_destination_for(session: &SessionManager) -> Destination {
        if session.is_valid() {
            Destination::Home
        } else {
            Destination::Login
        }
    }

    /// Create a controller rooted by the startup session check.
    pub async fn from_identity(identity: &dyn IdentityProvider) -> Self {
        Self::new(Self::start_destination(identity).await)
    }

    /// Append a destination and make it current. Revisiting the same
    /// destination is legal and produces another stack entry.
    pub fn navigate_to(&mut self, destination: Destination) {
        debug!(to = destination.title(), depth = self.backstack.len() + 1, "navigate_to");
        self.backstack.push(destination);
        self.publish();
    }

    /// Pop the top entry. Returns false (and leaves the stack unchanged)
    /// when only the root remains.
    pub fn navigate_back(&mut self) -> bool {
        if self.backstack.len() <= 1 {
            return false;
        }
        self.backstack.pop();
        debug!(to = self.current_destination().title(), depth = self.backstack.len(), "navigate_back");
        self.publish();
        true
    }

    /// Replace the whole backstack with a single root entry. Used for hard
    /// resets after login/logout, where history must not be revisitable.
    pub fn navigate_to_root(&mut self, destination: Destination) {
        debug!(root = destination.title(), "navigate_to_root");
        self.backstack.clear();
        self.backstack.push(destination);
        self.publish();
    }

    /// The top of the backstack.
    pub fn current_destination(&self) -> &Destination {
        self.backstack
            .last()
            .expect("backstack is never empty after initialization")
    }

    pub fn backstack(&self) -> &[Destination] {
        &self.backstack
    }

    pub fn depth(&self) -> usize {
        self.backstack.len()
    }

    /// Subscribe to navigation state changes. The receiver always holds the
    /// latest snapshot, published atomically with each mutation.
    pub fn subscribe(&self) -> watch::Receiver<NavSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        // send_replace keeps the value current even with no subscribers
        self.snapshot_tx.send_replace(NavSnapshot {
            backstack: self.backstack.clone(),
            current: self.current_destination().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::NoopIdentity;
    use crate::models::UserRecord;

    fn assert_invariant(nav: &NavigationController) {
        assert!(nav.depth() >= 1);
        assert_eq!(Some(nav.current_destination()), nav.backstack().last());
    }

    #[test]
    fn test_navigate_to_pushes_and_updates_current() {
        let mut nav = NavigationController::new(Destination::Login);
        nav.navigate_to(Destination::Home);

        assert_eq!(nav.current_destination(), &Destination::Home);
        assert_eq!(nav.depth(), 2);
        assert_invariant(&nav);
    }

    #[test]
    fn test_duplicates_are_not_suppressed() {
        let mut nav = NavigationController::new(Destination::Home);
        nav.navigate_to(Destination::Search);
        nav.navigate_to(Destination::Search);

        assert_eq!(nav.depth(), 3);
        assert!(nav.navigate_back());
        assert_eq!(nav.current_destination(), &Destination::Search);
    }

    #[test]
    fn test_navigate_back_at_root_is_a_noop() {
        let mut nav = NavigationController::new(Destination::Login);

        assert!(!nav.navigate_back());
        assert_eq!(nav.current_destination(), &Destination::Login);
        assert_eq!(nav.depth(), 1);
        assert_invariant(&nav);
    }

    #[test]
    fn test_back_navigation_scenario() {
        let mut nav = NavigationController::new(Destination::Login);
        nav.navigate_to(Destination::Home);
        nav.navigate_to(Destination::Profile);

        assert!(nav.navigate_back());
        assert_eq!(nav.current_destination(), &Destination::Home);

        assert!(nav.navigate_back());
        assert_eq!(nav.current_destination(), &Destination::Login);

        assert!(!nav.navigate_back());
        assert_eq!(nav.current_destination(), &Destination::Login);
        assert_invariant(&nav);
    }

    #[test]
    fn test_navigate_back_pops_exactly_one() {
        let mut nav = NavigationController::new(Destination::Home);
        nav.navigate_to(Destination::Team);
        nav.navigate_to(Destination::post_detail("p1"));

        let before = nav.depth();
        assert!(nav.navigate_back());
        assert_eq!(nav.depth(), before - 1);
        assert_eq!(nav.current_destination(), &Destination::Team);
    }

    #[test]
    fn test_navigate_to_root_collapses_history() {
        let mut nav = NavigationController::new(Destination::Login);
        nav.navigate_to(Destination::Register);
        nav.navigate_to(Destination::Home);

        nav.navigate_to_root(Destination::Home);
        assert_eq!(nav.backstack(), &[Destination::Home]);
        assert!(!nav.navigate_back());
        assert_invariant(&nav);
    }

    #[test]
    fn test_invariant_holds_over_mixed_sequence() {
        let mut nav = NavigationController::new(Destination::Login);
        let steps: Vec<Box<dyn Fn(&mut NavigationController)>> = vec![
            Box::new(|n| n.navigate_to(Destination::Home)),
            Box::new(|n| n.navigate_to(Destination::Search)),
            Box::new(|n| {
                n.navigate_back();
            }),
            Box::new(|n| n.navigate_to(Destination::post_detail("p9"))),
            Box::new(|n| n.navigate_to_root(Destination::Home)),
            Box::new(|n| {
                n.navigate_back();
            }),
            Box::new(|n| n.navigate_to(Destination::Settings)),
        ];
        for step in steps {
            step(&mut nav);
            assert_invariant(&nav);
        }
    }

    #[test]
    fn test_watch_snapshot_tracks_mutations() {
        let mut nav = NavigationController::new(Destination::Login);
        let rx = nav.subscribe();

        nav.navigate_to(Destination::Home);
        let snap = rx.borrow().clone();
        assert_eq!(snap.current, Destination::Home);
        assert_eq!(snap.backstack, vec![Destination::Login, Destination::Home]);

        nav.navigate_to_root(Destination::Home);
        let snap = rx.borrow().clone();
        assert_eq!(snap.backstack, vec![Destination::Home]);
        assert_eq!(snap.current, *snap.backstack.last().unwrap());
    }

    /// Identity stub that always reports a signed-in user.
    struct SignedInIdentity;

    #[async_trait::async_trait]
    impl crate::auth::IdentityProvider for SignedInIdentity {
        async fn create_account(&self, _e: &str, _p: &str) -> crate::auth::AuthOutcome {
            crate::auth::AuthOutcome::success("u1")
        }

        async fn sign_in(&self, _e: &str, _p: &str) -> crate::auth::AuthOutcome {
            crate::auth::AuthOutcome::success("u1")
        }

        fn sign_out(&self) {}

        fn current_identity(&self) -> Option<UserRecord> {
            Some(UserRecord::new("u1"))
        }

        async fn bearer_credential(&self) -> String {
            "tok-1".to_string()
        }

        async fn update_display_name(&self, _n: &str) -> crate::auth::AuthOutcome {
            crate::auth::AuthOutcome::success("u1")
        }
    }

    #[tokio::test]
    async fn test_start_destination_authenticated() {
        let nav = NavigationController::from_identity(&SignedInIdentity).await;
        assert_eq!(nav.current_destination(), &Destination::Home);
        assert_eq!(nav.depth(), 1);
    }

    #[tokio::test]
    async fn test_start_destination_unauthenticated() {
        let dest = NavigationController::start_destination(&NoopIdentity).await;
        assert_eq!(dest, Destination::Login);

        let nav = NavigationController::from_identity(&NoopIdentity).await;
        assert_eq!(nav.current_destination(), &Destination::Login);
    }

    #[test]
    fn test_start_destination_for_session() {
        let clock = ManualClock::new(1_000);
        let mut session = SessionManager::with_clock(clock.clone());
        assert_eq!(
            NavigationController::start_destination_for(&session),
            Destination::Login
        );

        session.save_session("tok", UserRecord::new("u1"), 60);
        assert_eq!(
            NavigationController::start_destination_for(&session),
            Destination::Home
        );

        // Startup selection reflects expiry at check time only
        clock.advance(61);
        assert_eq!(
            NavigationController::start_destination_for(&session),
            Destination::Login
        );
    }
}
