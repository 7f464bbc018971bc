//! Passwoerter privater Spiele
//!
//! Gespeichert wird nur der Argon2id-PHC-String. Hashing und Verifikation
//! sind teuer und laufen deshalb nie unter einem Registry- oder
//! Sitzungs-Lock.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use palace_core::{PalaceError, Result};

/// Argon2id mit OWASP-Mindestparametern (19 MiB, 2 Iterationen, 1 Thread).
/// Spielpasswoerter schuetzen keine Konten, daher die kleinere Variante.
fn argon2_instanz() -> Result<Argon2<'static>> {
    let params = Params::new(
        19 * 1024, // m_cost: 19 MiB
        2,         // t_cost
        1,         // p_cost
        None,
    )
    .map_err(|e| PalaceError::PasswortHashing(format!("invalid Argon2 parameters: {e}")))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hasht ein Passwort mit zufaelligem Salt und gibt den PHC-String zurueck
pub fn passwort_hashen(passwort: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    argon2_instanz()?
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PalaceError::PasswortHashing(e.to_string()))
}

/// Prueft ein Passwort gegen einen gespeicherten PHC-Hash
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PalaceError::PasswortHashing(format!("invalid hash format: {e}")))?;

    match argon2_instanz()?.verify_password(passwort.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PalaceError::PasswortHashing(e.to_string())),
    }
}
