//! Active account selection
//!
//! When the provider cache holds several accounts the first one wins. An
//! account chooser would plug in through [`AccountResolver`].

use super::types::Account;

/// Picks the active account among cached ones
pub trait AccountResolver: Send + Sync {
    fn resolve(&self, accounts: Vec<Account>) -> Option<Account>;
}

/// Default policy: first account in provider order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAccountResolver;

impl AccountResolver for FirstAccountResolver {
    fn resolve(&self, accounts: Vec<Account>) -> Option<Account> {
        resolve_account(accounts)
    }
}

/// Total and deterministic: `[]` → `None`, `[a, ..]` → `a`
pub fn resolve_account(accounts: Vec<Account>) -> Option<Account> {
    accounts.into_iter().next()
}
