//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::guess::GuessRequest;

/// Longest accepted player name.
pub const MAX_PLAYER_NAME_LEN: usize = 32;

/// Validates that a player name is non-blank and reasonably short.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ana")   // Ok
/// validate_player_name("   ")   // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!(
                "Player name must be at most {MAX_PLAYER_NAME_LEN} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that every per-block verdict and the hit count agree with the guesses.
pub fn validate_guess_consistency(request: &GuessRequest) -> Result<(), ValidationError> {
    if let Some(index) = request
        .bloques
        .iter()
        .position(|block| block.acertado != (block.intento == block.peso_real))
    {
        let mut err = ValidationError::new("guess_verdict_mismatch");
        err.message = Some(format!("Block {} verdict does not match its guess", index + 1).into());
        return Err(err);
    }

    let hits = request.bloques.iter().filter(|block| block.acertado).count();
    if hits != request.aciertos as usize {
        let mut err = ValidationError::new("guess_hits_mismatch");
        err.message = Some(
            format!(
                "Reported hits ({}) do not match correct blocks ({hits})",
                request.aciertos
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::guess::GuessBlock;

    fn block(intento: u32, peso_real: u32) -> GuessBlock {
        GuessBlock {
            intento,
            peso_real,
            acertado: intento == peso_real,
        }
    }

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Ana").is_ok());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(MAX_PLAYER_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_guess_consistency_valid() {
        let request = GuessRequest {
            jugador: "Ana".into(),
            bloques: vec![block(4, 4), block(5, 9)],
            aciertos: 1,
        };
        assert!(validate_guess_consistency(&request).is_ok());
    }

    #[test]
    fn test_guess_consistency_wrong_verdict() {
        let mut lying = block(4, 9);
        lying.acertado = true;
        let request = GuessRequest {
            jugador: "Ana".into(),
            bloques: vec![lying],
            aciertos: 1,
        };
        assert!(validate_guess_consistency(&request).is_err());
    }

    #[test]
    fn test_guess_consistency_wrong_hits() {
        let request = GuessRequest {
            jugador: "Ana".into(),
            bloques: vec![block(4, 4), block(5, 5)],
            aciertos: 1,
        };
        assert!(validate_guess_consistency(&request).is_err());
    }
}
