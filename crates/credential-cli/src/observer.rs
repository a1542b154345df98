//! Terminal presentation of session changes

use console::style;
use credential_sdk::{SessionChange, SessionObserver};

/// Text shown for a session change
pub fn describe(change: &SessionChange) -> String {
    match change {
        SessionChange::SignedIn(account) => format!("Logged in as {}", account.username),
        SessionChange::SignedOut => "Please sign-in to create an API key".to_string(),
    }
}

/// Prints session changes to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_session_change(&self, change: SessionChange) {
        let text = describe(&change);
        match change {
            SessionChange::SignedIn(_) => println!("{}", style(text).green()),
            SessionChange::SignedOut => println!("{}", style(text).yellow()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credential_sdk::Account;

    #[test]
    fn test_describe_matches_page_text() {
        let account = Account::new("u.local", "u", "u@local.invalid");
        assert_eq!(
            describe(&SessionChange::SignedIn(account)),
            "Logged in as u@local.invalid"
        );
        assert_eq!(
            describe(&SessionChange::SignedOut),
            "Please sign-in to create an API key"
        );
    }
}
