#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptRole {
    User,
    Assistant,
    System,
    AppInfo,
    AppWarning,
    AppError,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::System => "system",
            TranscriptRole::AppInfo => "app/info",
            TranscriptRole::AppWarning => "app/warning",
            TranscriptRole::AppError => "app/error",
        }
    }

    pub fn is_assistant(self) -> bool {
        self == TranscriptRole::Assistant
    }

    pub fn app_kind(self) -> Option<AppMessageKind> {
        match self {
            TranscriptRole::AppInfo => Some(AppMessageKind::Info),
            TranscriptRole::AppWarning => Some(AppMessageKind::Warning),
            TranscriptRole::AppError => Some(AppMessageKind::Error),
            _ => None,
        }
    }
}

/// Severity for locally authored notices. They are rendered in the
/// transcript but never transmitted to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMessageKind {
    /// Lifecycle information such as a successful connection.
    Info,

    /// Recoverable problems, e.g. a dropped connection that will be retried.
    Warning,

    /// Rejected input or transport failures.
    Error,
}

impl AppMessageKind {
    pub fn as_role(self) -> TranscriptRole {
        match self {
            AppMessageKind::Info => TranscriptRole::AppInfo,
            AppMessageKind::Warning => TranscriptRole::AppWarning,
            AppMessageKind::Error => TranscriptRole::AppError,
        }
    }
}
