use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FmiError::artwork("x")
            .to_string()
            .contains("artwork unavailable:")
    );
    assert!(
        FmiError::avatar("x")
            .to_string()
            .contains("avatar unavailable:")
    );
    assert!(
        FmiError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert_eq!(
        FmiError::ScrobbleIncomplete("album").to_string(),
        "scrobble incomplete: missing album"
    );
    assert_eq!(
        FmiError::ScrobbleUnavailable(ScrobbleFailure::NoRecentActivity).to_string(),
        "scrobble unavailable: no recent activity"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FmiError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_artwork_avatar_and_outages_are_transient() {
    assert!(FmiError::artwork("x").is_transient());
    assert!(FmiError::avatar("x").is_transient());
    assert!(FmiError::ScrobbleUnavailable(ScrobbleFailure::ServiceUnreachable).is_transient());
    assert!(!FmiError::ScrobbleUnavailable(ScrobbleFailure::NoRecentActivity).is_transient());
    assert!(!FmiError::ScrobbleIncomplete("title").is_transient());
    assert!(!FmiError::validation("x").is_transient());
}

#[test]
fn user_messages_distinguish_artwork_from_avatar() {
    let art = FmiError::artwork("archive 503").user_message();
    let avatar = FmiError::avatar("timeout").user_message();
    assert_ne!(art, avatar);
    assert!(art.contains("album artwork"));
    assert!(avatar.contains("avatar"));
    assert!(!art.contains("503"));
}

#[test]
fn internal_errors_surface_generic_message() {
    let err = FmiError::Other(anyhow::anyhow!("index out of range"));
    assert_eq!(err.user_message(), "Something went wrong...");
}
