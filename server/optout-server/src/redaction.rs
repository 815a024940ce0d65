//! PII redaction for patient records shown before identity is verified
//!
//! Each field has a fixed [`MaskPattern`]:
//!
//! | Field | Pattern | Example |
//! |---|---|---|
//! | title, given name, surname, address | [`MaskPattern::Tokens`] | `123 High Street` → `123 H*** S*****` |
//! | post code | [`MaskPattern::Tail`] | `SW1A 1AA` → `SW1A 1**` |
//! | phone | [`MaskPattern::Partial`] | `07700900123` → `07*******23` |
//! | email | [`MaskPattern::Email`] | `john.smith@example.com` → `j***.s****@example.com` |
//!
//! NHS number, date of birth and gender are returned as held.
//!
//! Masking is not idempotent, so [`Redactor::redact`] consumes the raw
//! [`PdsPatient`] and the resulting [`RedactedPatient`] offers no way back in.

use chrono::NaiveDate;
use pds_service::PdsPatient;
use serde::Serialize;
use utoipa::ToSchema;

const MASK: char = '*';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPattern {
    /// Alphanumeric runs keep their first character; all-digit runs and
    /// separators are kept as they are
    Tokens,
    /// Keep the leading characters, mask the last `masked`
    Tail { masked: usize },
    /// Keep `show_first` and `show_last` characters, mask the middle
    Partial { show_first: usize, show_last: usize },
    /// Keep the domain, token-mask the local part
    Email,
}

impl MaskPattern {
    pub fn apply(self, value: &str) -> String {
        match self {
            MaskPattern::Tokens => mask_tokens(value),
            MaskPattern::Tail { masked } => {
                let len = value.chars().count();
                if len <= masked {
                    return MASK.to_string().repeat(len);
                }
                let kept: String = value.chars().take(len - masked).collect();
                format!("{kept}{}", MASK.to_string().repeat(masked))
            }
            MaskPattern::Partial {
                show_first,
                show_last,
            } => {
                let len = value.chars().count();
                if len <= show_first + show_last {
                    return MASK.to_string().repeat(len);
                }
                let first: String = value.chars().take(show_first).collect();
                let last: String = value.chars().skip(len - show_last).collect();
                let middle = MASK.to_string().repeat(len - show_first - show_last);
                format!("{first}{middle}{last}")
            }
            MaskPattern::Email => match value.rsplit_once('@') {
                Some((local, domain)) => format!("{}@{domain}", mask_tokens(local)),
                None => mask_tokens(value),
            },
        }
    }
}

fn mask_tokens(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut token = String::new();
    for c in value.chars() {
        if c.is_alphanumeric() {
            token.push(c);
        } else {
            flush_token(&mut token, &mut out);
            out.push(c);
        }
    }
    flush_token(&mut token, &mut out);
    out
}

fn flush_token(token: &mut String, out: &mut String) {
    if token.chars().all(|c| c.is_ascii_digit()) {
        out.push_str(token);
    } else {
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.push(first);
            out.extend(chars.map(|_| MASK));
        }
    }
    token.clear();
}

/// Patient record safe to return to an unverified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RedactedPatient {
    pub nhs_number: String,
    pub title: Option<String>,
    pub given_name: String,
    pub surname: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub post_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Redactor;

impl Redactor {
    pub fn new() -> Self {
        Self
    }

    pub fn redact(&self, patient: PdsPatient) -> RedactedPatient {
        let names = MaskPattern::Tokens;
        RedactedPatient {
            nhs_number: patient.nhs_number,
            title: redact_optional(patient.title, names),
            given_name: names.apply(&patient.given_name),
            surname: names.apply(&patient.surname),
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            email: redact_optional(patient.email, MaskPattern::Email),
            phone: redact_optional(
                patient.phone,
                MaskPattern::Partial {
                    show_first: 2,
                    show_last: 2,
                },
            ),
            address: redact_optional(patient.address, names),
            post_code: redact_optional(patient.post_code, MaskPattern::Tail { masked: 2 }),
        }
    }
}

fn redact_optional(value: Option<String>, pattern: MaskPattern) -> Option<String> {
    value.map(|v| if v.is_empty() { v } else { pattern.apply(&v) })
}
