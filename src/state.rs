//! Classification of a session into the four authentication states and the
//! access decisions derived from them.

/// How the process was started. Injected once through the gateway settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Production,
    /// Local testing: the Discord flow may run without a CAS identity.
    Diagnostic,
}

impl RunMode {
    /// Any non-blank `DEBUG` value turns diagnostic mode on.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some(value) if !value.is_empty() => RunMode::Diagnostic,
            _ => RunMode::Production,
        }
    }

    pub fn is_diagnostic(self) -> bool {
        self == RunMode::Diagnostic
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    CasOnly,
    /// CAS identity and a Discord token are held. The token still has to pass
    /// the liveness probe before the linked view is shown.
    CasDiscord,
    /// Discord token without a CAS identity. Never trusted.
    DiscordOrphaned,
}

impl SessionState {
    pub fn classify(has_cas_identity: bool, has_discord_token: bool) -> Self {
        match (has_cas_identity, has_discord_token) {
            (false, false) => SessionState::Anonymous,
            (false, true) => SessionState::DiscordOrphaned,
            (true, false) => SessionState::CasOnly,
            (true, true) => SessionState::CasDiscord,
        }
    }

    pub fn is_cas_authenticated(self) -> bool {
        matches!(self, SessionState::CasOnly | SessionState::CasDiscord)
    }
}

/// What the profile endpoint answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Unauthorized,
    Profile,
    LinkedProfile,
}

/// `discord_live` is the outcome of the liveness probe, only meaningful for
/// [`SessionState::CasDiscord`].
pub fn select_view(state: SessionState, discord_live: bool) -> View {
    match state {
        SessionState::Anonymous | SessionState::DiscordOrphaned => View::Unauthorized,
        SessionState::CasOnly => View::Profile,
        SessionState::CasDiscord if discord_live => View::LinkedProfile,
        SessionState::CasDiscord => View::Profile,
    }
}

/// Whether the Discord login or callback may proceed.
pub fn discord_flow_allowed(state: SessionState, mode: RunMode) -> bool {
    state.is_cas_authenticated() || mode.is_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_combination() {
        assert_eq!(SessionState::classify(false, false), SessionState::Anonymous);
        assert_eq!(SessionState::classify(false, true), SessionState::DiscordOrphaned);
        assert_eq!(SessionState::classify(true, false), SessionState::CasOnly);
        assert_eq!(SessionState::classify(true, true), SessionState::CasDiscord);
    }

    #[test]
    fn orphaned_discord_token_is_treated_as_anonymous() {
        for live in [false, true] {
            assert_eq!(select_view(SessionState::DiscordOrphaned, live), View::Unauthorized);
            assert_eq!(select_view(SessionState::Anonymous, live), View::Unauthorized);
        }
    }

    #[test]
    fn linked_view_needs_a_live_token() {
        assert_eq!(select_view(SessionState::CasDiscord, true), View::LinkedProfile);
        assert_eq!(select_view(SessionState::CasDiscord, false), View::Profile);
        assert_eq!(select_view(SessionState::CasOnly, true), View::Profile);
    }

    #[test]
    fn discord_flow_needs_cas_outside_diagnostic_mode() {
        assert!(!discord_flow_allowed(SessionState::Anonymous, RunMode::Production));
        assert!(!discord_flow_allowed(SessionState::DiscordOrphaned, RunMode::Production));
        assert!(discord_flow_allowed(SessionState::CasOnly, RunMode::Production));
        assert!(discord_flow_allowed(SessionState::Anonymous, RunMode::Diagnostic));
    }

    #[test]
    fn run_mode_from_flag() {
        assert_eq!(RunMode::from_flag(None), RunMode::Production);
        assert_eq!(RunMode::from_flag(Some("")), RunMode::Production);
        assert_eq!(RunMode::from_flag(Some("  ")), RunMode::Production);
        assert_eq!(RunMode::from_flag(Some("1")), RunMode::Diagnostic);
        assert!(RunMode::from_flag(Some("true")).is_diagnostic());
    }
}
