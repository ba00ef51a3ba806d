use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Per-registration token that Telegram echoes back in the
/// `X-Telegram-Bot-Api-Secret-Token` header of every webhook call.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Mint a fresh token from a v4 UUID (122 random bits).
    ///
    /// The simple (hyphen-less) form stays inside Telegram's allowed
    /// alphabet for `secret_token`: `A-Z`, `a-z`, `0-9`, `_` and `-`.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a claimed token against this one without early exit.
    pub fn matches(&self, claimed: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), claimed.as_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_secrets_do_not_repeat() {
        let minted: HashSet<String> = (0..1000)
            .map(|_| Secret::mint().as_str().to_string())
            .collect();
        assert_eq!(minted.len(), 1000);
    }

    #[test]
    fn minted_secret_fits_telegram_alphabet() {
        let secret = Secret::mint();
        assert_eq!(secret.as_str().len(), 32);
        assert!(secret
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn matches_only_exact_value() {
        let secret = Secret::mint();
        let value = secret.as_str().to_string();
        assert!(secret.matches(&value));
        assert!(!secret.matches(&value[1..]));
        assert!(!secret.matches(&value.to_uppercase()));
        assert!(!secret.matches(""));
    }

    #[test]
    fn debug_output_is_redacted() {
        let secret = Secret::mint();
        let printed = format!("{secret:?}");
        assert!(!printed.contains(secret.as_str()));
    }

    #[test]
    fn constant_time_eq_different_length() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"abc", b"abc"));
    }
}
