use once_cell::sync::Lazy;
use regex::Regex;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    // Optional country code and area code, then two groups of 3-4 digits
    Regex::new(r"(?:(?:\+\d{1,3}[\s-]?)?(?:\(\d{2,4}\)[\s-]?)?\d{3,4}[\s-]?\d{3,4})").unwrap()
});

pub const EMAIL_MASK: &str = "[email]";
pub const PHONE_MASK: &str = "[phone]";

pub fn mask_pii(input: &str) -> String {
    // Emails first so their digits are not taken for phone numbers
    let s = RE_EMAIL.replace_all(input, EMAIL_MASK);
    let s = RE_PHONE.replace_all(&s, PHONE_MASK);
    s.into_owned()
}
