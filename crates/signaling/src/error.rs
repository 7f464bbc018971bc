//! Fehlertypen fuer den Signaling-Service

use palace_core::{PalaceError, PlayerId};
use palace_protocol::ErrorCode;
use thiserror::Error;

/// Einheitlicher Client-Text fuer interne Fehler
pub const INTERNER_FEHLER: &str = "Internal server error";

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Socket, Bind)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fehler aus Spiel- und Sitzungslogik
    #[error(transparent)]
    Spiel(#[from] PalaceError),

    /// Verbindung hat sich noch nicht registriert
    #[error("Not registered")]
    NichtRegistriert,

    /// Anzeigename ist schon vergeben
    #[error("Name '{0}' is already taken")]
    NameVergeben(String),

    /// Spieler gehoert nicht zur Sitzung
    #[error("{spieler} is not a member of '{sitzung}'")]
    KeinMitglied { spieler: PlayerId, sitzung: String },

    /// Privates Spiel ohne Passwort betreten
    #[error("Private games require a password")]
    PasswortFehlt,

    /// Passwort stimmt nicht
    #[error("Wrong password")]
    FalschesPasswort,

    /// Nur der Ersteller darf diese Aktion ausfuehren
    #[error("Only the creator can start the game")]
    KeinErsteller,

    /// Sitzung nimmt keine Spieler mehr an
    #[error("Game '{0}' is already running or finished")]
    SitzungGeschlossen(String),

    /// Zustellung an einzelne Empfaenger fehlgeschlagen
    #[error("Delivery to {} recipients failed", fehlgeschlagen.len())]
    Zustellung { fehlgeschlagen: Vec<PlayerId> },

    /// Protokollfehler (ungueltiger Umschlag oder Inhalt)
    #[error("Protocol error: {0}")]
    Protokoll(String),

    /// Interner Fehler
    #[error("Internal error: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Fehler-Code fuer die Error-Antwort an den Client
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Spiel(e) => match e {
                PalaceError::Validierung(_) => ErrorCode::InvalidRequest,
                PalaceError::SitzungVoll => ErrorCode::GameFull,
                PalaceError::NichtGefunden(_) => ErrorCode::NotFound,
                PalaceError::NichtAmZug => ErrorCode::NotYourTurn,
                PalaceError::UngueltigeAktion(_) => ErrorCode::IllegalAction,
                PalaceError::PasswortHashing(_) | PalaceError::Intern(_) => {
                    ErrorCode::InternalError
                }
            },
            Self::NichtRegistriert => ErrorCode::NotRegistered,
            Self::NameVergeben(_) => ErrorCode::NameTaken,
            Self::KeinMitglied { .. } => ErrorCode::NotFound,
            Self::PasswortFehlt | Self::FalschesPasswort => ErrorCode::WrongPassword,
            Self::KeinErsteller => ErrorCode::PermissionDenied,
            Self::SitzungGeschlossen(_) => ErrorCode::IllegalAction,
            Self::Protokoll(_) => ErrorCode::InvalidRequest,
            Self::Io(_) | Self::Zustellung { .. } | Self::Intern(_) => ErrorCode::InternalError,
        }
    }

    /// Client-Text. Interne Details werden nicht weitergegeben.
    pub fn client_nachricht(&self) -> String {
        match self.code() {
            ErrorCode::InternalError => INTERNER_FEHLER.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for SignalingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protokoll(e.to_string())
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domaenenfehler_codes() {
        assert_eq!(
            SignalingError::from(PalaceError::SitzungVoll).code(),
            ErrorCode::GameFull
        );
        assert_eq!(
            SignalingError::from(PalaceError::validierung("x")).code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            SignalingError::from(PalaceError::NichtAmZug).code(),
            ErrorCode::NotYourTurn
        );
    }

    #[test]
    fn interne_details_bleiben_intern() {
        let e = SignalingError::intern("Mutex vergiftet in Zeile 12");
        assert_eq!(e.client_nachricht(), INTERNER_FEHLER);

        let e = SignalingError::NameVergeben("bob".into());
        assert_eq!(e.client_nachricht(), "Name 'bob' is already taken");
    }

    #[test]
    fn transparente_domaenenmeldung() {
        let e = SignalingError::from(PalaceError::SitzungVoll);
        assert_eq!(e.to_string(), "Game is full");
    }
}
