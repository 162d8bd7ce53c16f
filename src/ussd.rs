//! USSD dial string construction.
//!
//! A pending order is paid by dialling
//! `<provider-prefix><shortcode>*<amount>#` on the buyer's phone. When the
//! string is embedded in a `tel:` URI for a tap-to-dial link, the trailing
//! `#` must be percent-encoded as `%23` or dialers silently drop it.

use crate::types::Money;

/// Build the USSD dial string for a merchant shortcode and amount.
///
/// # Examples
///
/// ```
/// use matchday_core::types::Money;
/// use matchday_core::ussd::dial_string;
///
/// assert_eq!(
///     dial_string("*182*8*1*", "12345", Money::from_minor(1500)),
///     "*182*8*1*12345*1500#"
/// );
/// ```
#[must_use]
pub fn dial_string(prefix: &str, shortcode: &str, amount: Money) -> String {
    format!("{prefix}{shortcode}*{amount}#")
}

/// Embed a USSD dial string in a `tel:` URI.
///
/// Percent-encodes everything a dialer would mangle; in particular the
/// trailing `#` becomes `%23`.
///
/// # Examples
///
/// ```
/// use matchday_core::ussd::tel_uri;
///
/// assert_eq!(
///     tel_uri("*182*8*1*12345*1500#"),
///     "tel:*182*8*1*12345*1500%23"
/// );
/// ```
#[must_use]
pub fn tel_uri(dial: &str) -> String {
    // `*` stays dialable; only `#` (and any stray reserved bytes) need
    // escaping.
    let encoded = urlencoding::encode(dial).replace("%2A", "*");
    format!("tel:{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_string_layout() {
        let dial = dial_string("*182*8*1*", "12345", Money::from_minor(4500));
        assert_eq!(dial, "*182*8*1*12345*4500#");
        assert!(dial.ends_with('#'));
    }

    #[test]
    fn tel_uri_encodes_the_hash() {
        let uri = tel_uri("*182*8*1*12345*4500#");
        assert_eq!(uri, "tel:*182*8*1*12345*4500%23");
        assert!(!uri.contains('#'));
    }

    #[test]
    fn tel_uri_keeps_stars_dialable() {
        let uri = tel_uri("*182*8*1*12345*100#");
        assert_eq!(uri.matches('*').count(), 5);
    }
}
