//! Namensregeln fuer Spieler und Spiele

use palace_core::{PalaceError, Result};

/// Maximale Laenge von Spieler- und Spielnamen (Unicode-Zeichen)
pub const MAX_NAME_LAENGE: usize = 24;

/// Verbotene Steuerzeichen
const VERBOTENE_ZEICHEN: [char; 3] = ['\u{00}', '\u{1f}', '\u{7f}'];

/// Prueft einen Namen: 1 bis 24 Zeichen, keine verbotenen Steuerzeichen.
///
/// `feld` landet in der Fehlermeldung ("Name", "Game name", ...).
pub fn name_pruefen(name: &str, feld: &str) -> Result<()> {
    let laenge = name.chars().count();
    if laenge == 0 {
        return Err(PalaceError::validierung(format!("{feld} must not be empty")));
    }
    if laenge > MAX_NAME_LAENGE {
        return Err(PalaceError::validierung(format!(
            "{feld} must be at most {MAX_NAME_LAENGE} characters"
        )));
    }
    if name.contains(VERBOTENE_ZEICHEN) {
        return Err(PalaceError::validierung(format!(
            "{feld} contains invalid characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gueltige_namen() {
        assert!(name_pruefen("a", "Name").is_ok());
        assert!(name_pruefen("Königin der Karten", "Name").is_ok());
        assert!(name_pruefen(&"x".repeat(MAX_NAME_LAENGE), "Name").is_ok());
    }

    #[test]
    fn leer_und_zu_lang() {
        assert!(name_pruefen("", "Name").is_err());
        assert!(name_pruefen(&"x".repeat(MAX_NAME_LAENGE + 1), "Name").is_err());
    }

    #[test]
    fn laenge_in_zeichen_nicht_bytes() {
        // 24 Umlaute sind 48 Bytes, aber 24 Zeichen
        assert!(name_pruefen(&"ä".repeat(MAX_NAME_LAENGE), "Name").is_ok());
    }

    #[test]
    fn steuerzeichen_verboten() {
        for c in VERBOTENE_ZEICHEN {
            let name = format!("ab{c}cd");
            let fehler = name_pruefen(&name, "Game name").unwrap_err();
            assert!(fehler.to_string().contains("Game name"));
        }
    }
}
