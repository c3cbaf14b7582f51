use crate::domain::ports::SecretStore;
use crate::utils::error::Result;
use keyring::Entry;

/// OS-keychain-backed secret store. The service name is the MealPal host,
/// so saved passwords survive across working directories.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl SecretStore for KeyringStore {
    fn get_secret(&self, account: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, account)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_secret(&self, account: &str, secret: &str) -> Result<()> {
        Entry::new(&self.service, account)?.set_password(secret)?;
        Ok(())
    }
}

/// Resolve the account password: the stored secret when the store is in use
/// (remembering a freshly prompted one), a prompt on every run otherwise.
pub fn resolve_password<S, F>(store: &S, account: &str, use_store: bool, prompt: F) -> Result<String>
where
    S: SecretStore,
    F: FnOnce() -> Result<String>,
{
    if !use_store {
        return prompt();
    }

    if let Some(secret) = store.get_secret(account)? {
        return Ok(secret);
    }

    let secret = prompt()?;
    store.set_secret(account, &secret)?;
    Ok(secret)
}
