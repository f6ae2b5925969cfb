/// Result record of a session operation.
///
/// Rejections are regular outcomes rather than errors: the transport
/// adapter decides how each kind is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A movie is already playing; carries its filename.
    AlreadyPlaying(String),
    /// The requested file is not in the catalog.
    InvalidMovie,
    /// Nothing is playing.
    NoMovie,
    /// Unknown command; carries the list of valid names.
    InvalidCommand(String),
    Started(String),
    Stopped,
    CommandAccepted(String),
    Current(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    AlreadyPlaying,
    InvalidMovie,
    NoMovie,
    InvalidCommand,
    Started,
    Stopped,
    CommandAccepted,
    Current,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::AlreadyPlaying => "already_playing",
            OutcomeKind::InvalidMovie => "invalid_movie",
            OutcomeKind::NoMovie => "no_movie",
            OutcomeKind::InvalidCommand => "invalid_command",
            OutcomeKind::Started => "started",
            OutcomeKind::Stopped => "stopped",
            OutcomeKind::CommandAccepted => "command_accepted",
            OutcomeKind::Current => "current",
        }
    }
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::AlreadyPlaying(_) => OutcomeKind::AlreadyPlaying,
            Outcome::InvalidMovie => OutcomeKind::InvalidMovie,
            Outcome::NoMovie => OutcomeKind::NoMovie,
            Outcome::InvalidCommand(_) => OutcomeKind::InvalidCommand,
            Outcome::Started(_) => OutcomeKind::Started,
            Outcome::Stopped => OutcomeKind::Stopped,
            Outcome::CommandAccepted(_) => OutcomeKind::CommandAccepted,
            Outcome::Current(_) => OutcomeKind::Current,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::AlreadyPlaying(detail)
            | Outcome::InvalidCommand(detail)
            | Outcome::Started(detail)
            | Outcome::CommandAccepted(detail)
            | Outcome::Current(detail) => Some(detail.as_str()),
            Outcome::InvalidMovie | Outcome::NoMovie | Outcome::Stopped => None,
        }
    }

    /// True for outcomes that left the request unfulfilled.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Outcome::AlreadyPlaying(_)
                | Outcome::InvalidMovie
                | Outcome::NoMovie
                | Outcome::InvalidCommand(_)
        )
    }

    /// Human readable text for clients that display the result as is.
    pub fn message(&self) -> String {
        match self {
            Outcome::AlreadyPlaying(movie) => format!("Movie \"{movie}\" is already playing"),
            Outcome::InvalidMovie => "Please specify a valid movie file".to_string(),
            Outcome::NoMovie => "No movie is playing".to_string(),
            Outcome::InvalidCommand(valid) => format!("Invalid command; try any of these: {valid}"),
            Outcome::Started(movie) => format!("Playing \"{movie}\""),
            Outcome::Stopped => "Movie stopped".to_string(),
            Outcome::CommandAccepted(name) => format!("Command \"{name}\" sent"),
            Outcome::Current(movie) => format!("Now playing \"{movie}\""),
        }
    }
}
