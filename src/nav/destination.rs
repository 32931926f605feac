/// An addressable screen in the Huddle client.
///
/// Destinations are immutable values compared by equality; `PostDetail`
/// carries the post being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Login,
    Register,
    Home,
    Search,
    Team,
    Profile,
    Settings,
    PostDetail { post_id: String },
}

impl Destination {
    pub fn post_detail(post_id: impl Into<String>) -> Self {
        Destination::PostDetail {
            post_id: post_id.into(),
        }
    }

    /// Get the display title for this destination.
    pub fn title(&self) -> &'static str {
        match self {
            Destination::Login => "Login",
            Destination::Register => "Register",
            Destination::Home => "Home",
            Destination::Search => "Search",
            Destination::Team => "Team",
            Destination::Profile => "Profile",
            Destination::Settings => "Settings",
            Destination::PostDetail { .. } => "Post",
        }
    }

    /// Whether this screen is only reachable with a valid session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Destination::Login | Destination::Register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_equality_is_by_value() {
        assert_eq!(Destination::Home, Destination::Home);
        assert_eq!(Destination::post_detail("p1"), Destination::post_detail("p1"));
        assert_ne!(Destination::post_detail("p1"), Destination::post_detail("p2"));
        assert_ne!(Destination::Home, Destination::Search);
    }

    #[test]
    fn test_requires_auth() {
        assert!(!Destination::Login.requires_auth());
        assert!(!Destination::Register.requires_auth());
        assert!(Destination::Home.requires_auth());
        assert!(Destination::post_detail("p1").requires_auth());
    }

    #[test]
    fn test_titles() {
        assert_eq!(Destination::Home.title(), "Home");
        assert_eq!(Destination::post_detail("p1").title(), "Post");
    }
}
