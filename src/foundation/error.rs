/// Convenience result type used across fmi.
pub type FmiResult<T> = Result<T, FmiError>;

/// Why a scrobble lookup produced no usable track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrobbleFailure {
    /// The account exists but has nothing in its recent tracks.
    NoRecentActivity,
    /// The scrobble service does not know the account.
    AccountNotFound,
    /// The scrobble service could not be reached or answered with an error.
    ServiceUnreachable,
}

impl std::fmt::Display for ScrobbleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoRecentActivity => "no recent activity",
            Self::AccountNotFound => "account not found",
            Self::ServiceUnreachable => "service unreachable",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by card rendering APIs.
#[derive(thiserror::Error, Debug)]
pub enum FmiError {
    /// Upstream scrobble lookup failed or returned no track.
    #[error("scrobble unavailable: {0}")]
    ScrobbleUnavailable(ScrobbleFailure),

    /// The scrobble record is missing one of its required fields.
    #[error("scrobble incomplete: missing {0}")]
    ScrobbleIncomplete(&'static str),

    /// Every artwork source was exhausted, or the artwork could not be decoded.
    #[error("artwork unavailable: {0}")]
    ArtworkUnavailable(String),

    /// The avatar could not be fetched or decoded.
    #[error("avatar unavailable: {0}")]
    AvatarUnavailable(String),

    /// No scrobble-service username is linked to the platform user.
    #[error("user not linked: {0}")]
    UserNotLinked(String),

    /// Invalid caller-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FmiError {
    /// Build a [`FmiError::ArtworkUnavailable`] value.
    pub fn artwork(msg: impl Into<String>) -> Self {
        Self::ArtworkUnavailable(msg.into())
    }

    /// Build a [`FmiError::AvatarUnavailable`] value.
    pub fn avatar(msg: impl Into<String>) -> Self {
        Self::AvatarUnavailable(msg.into())
    }

    /// Build a [`FmiError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ArtworkUnavailable(_) | Self::AvatarUnavailable(_) => true,
            Self::ScrobbleUnavailable(reason) => *reason == ScrobbleFailure::ServiceUnreachable,
            Self::ScrobbleIncomplete(_)
            | Self::UserNotLinked(_)
            | Self::Validation(_)
            | Self::Other(_) => false,
        }
    }

    /// Message shown to the person who asked for the card.
    pub fn user_message(&self) -> String {
        match self {
            Self::ScrobbleUnavailable(ScrobbleFailure::NoRecentActivity) => {
                "No scrobbles found.".to_string()
            }
            Self::ScrobbleUnavailable(
                ScrobbleFailure::AccountNotFound | ScrobbleFailure::ServiceUnreachable,
            ) => "Account doesn't exist on Last.fm or we can't connect to the Last.fm API."
                .to_string(),
            Self::ScrobbleIncomplete(field) => {
                format!("Your most recent scrobble is missing its {field}, so there's nothing to draw.")
            }
            Self::ArtworkUnavailable(_) => {
                "We can't get that album artwork right now, try again in a few minutes.".to_string()
            }
            Self::AvatarUnavailable(_) => {
                "We can't get your avatar right now, try again in a few minutes.".to_string()
            }
            Self::UserNotLinked(name) => format!(
                "It looks like {name} hasn't connected their Last.fm account.\nTry using `fmi link`"
            ),
            Self::Validation(_) | Self::Other(_) => "Something went wrong...".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
