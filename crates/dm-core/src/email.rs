//! Email address extraction for guest accounts
//!
//! Guest user principal names encode the home address as
//! `alice_contoso.com#EXT#@tenant.onmicrosoft.com`; invitations and
//! free-text attributes embed addresses in arbitrary text.

use regex::Regex;
use std::sync::OnceLock;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static GUEST_UPN_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+'_-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
            .expect("valid regex")
    })
}

fn guest_upn_regex() -> &'static Regex {
    GUEST_UPN_RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<local>.+)_(?P<domain>[^_#@]+\.[^_#@]+)#EXT#@").expect("valid regex")
    })
}

/// First email address found in `text`, lower-cased.
pub fn extract_email(text: &str) -> Option<String> {
    email_regex()
        .find(text)
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Home address of a guest, recovered from its `#EXT#` principal name.
///
/// The local part may itself contain underscores; the domain is the segment
/// after the last underscore before `#EXT#`.
pub fn guest_upn_to_email(upn: &str) -> Option<String> {
    let caps = guest_upn_regex().captures(upn)?;
    let local = caps.name("local")?.as_str();
    let domain = caps.name("domain")?.as_str();
    extract_email(&format!("{}@{}", local, domain))
}

/// Domain part of an address.
pub fn email_domain(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_email_from_text() {
        assert_eq!(
            extract_email("Invite sent to <Jane.Doe@Fabrikam.com> yesterday"),
            Some("jane.doe@fabrikam.com".to_string())
        );
        assert_eq!(extract_email("no address here"), None);
    }

    #[test]
    fn test_guest_upn_to_email() {
        assert_eq!(
            guest_upn_to_email("alice_contoso.com#EXT#@tenant.onmicrosoft.com"),
            Some("alice@contoso.com".to_string())
        );
        assert_eq!(
            guest_upn_to_email("first_last_partner.co.uk#EXT#@tenant.onmicrosoft.com"),
            Some("first_last@partner.co.uk".to_string())
        );
        assert_eq!(guest_upn_to_email("member@tenant.onmicrosoft.com"), None);
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("alice@contoso.com"), Some("contoso.com"));
        assert_eq!(email_domain("broken@"), None);
        assert_eq!(email_domain("nodomain"), None);
    }
}
