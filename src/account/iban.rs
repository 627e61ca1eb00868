//! Structured IBAN
//!
//! Any country is accepted: `CC kk BBAN`, validated with the ISO 7064 mod-97
//! check digits. The BBAN is split into bank code, optional branch code and
//! account number using a per-country layout; countries missing from the
//! table fall back to a generic split (first four BBAN characters are the
//! bank code).
//!
//! Home-bank (Polish) layout:
//!
//! ```text
//! PL kk BBB SSSS C AAAAAAAAAAAAAAAA
//!    |  |   |    | └─ account number (16)
//!    |  |   |    └─── national check digit (1)
//!    |  |   └──────── branch code (4)
//!    |  └──────────── bank code (3)
//!    └─────────────── check digits
//! ```
//!
//! Only home-layout account numbers encode their owner: characters 4..14 are
//! the owner segment compared by the relationship analyzer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core_types::UserId;

const MIN_LENGTH: usize = 15;
const MAX_LENGTH: usize = 34;

/// Padding prefix of the account number, skipped when comparing owners
pub const OWNER_SEGMENT_OFFSET: usize = 4;
/// Width of the owner-encoding segment
pub const OWNER_SEGMENT_LENGTH: usize = 10;

/// Bank identity used by [`Iban::generate`]
pub const HOME_COUNTRY_CODE: &str = "PL";
pub const HOME_BANK_CODE: &str = "485";
pub const HOME_BRANCH_CODE: &str = "1123";
pub const HOME_NATIONAL_CHECK_DIGIT: &str = "4";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IbanError {
    #[error("IBAN has invalid length {actual} (expected {expected})")]
    InvalidLength { actual: usize, expected: String },

    #[error("Invalid IBAN country code: {0}")]
    InvalidCountry(String),

    #[error("IBAN contains invalid characters")]
    InvalidCharacters,

    #[error("Invalid IBAN field {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("IBAN checksum mismatch")]
    InvalidChecksum,
}

/// BBAN slices of one country, as `(start, end)` offsets into the BBAN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Layout {
    country: &'static str,
    length: usize,
    bank: (usize, usize),
    branch: Option<(usize, usize)>,
    account: (usize, usize),
}

const LAYOUTS: &[Layout] = &[
    Layout { country: "AT", length: 20, bank: (0, 5), branch: None, account: (5, 16) },
    Layout { country: "BE", length: 16, bank: (0, 3), branch: None, account: (3, 10) },
    Layout { country: "CH", length: 21, bank: (0, 5), branch: None, account: (5, 17) },
    Layout { country: "CZ", length: 24, bank: (0, 4), branch: None, account: (4, 20) },
    Layout { country: "DE", length: 22, bank: (0, 8), branch: None, account: (8, 18) },
    Layout { country: "ES", length: 24, bank: (0, 4), branch: Some((4, 8)), account: (10, 20) },
    Layout { country: "FR", length: 27, bank: (0, 5), branch: Some((5, 10)), account: (10, 21) },
    Layout { country: "GB", length: 22, bank: (0, 4), branch: Some((4, 10)), account: (10, 18) },
    Layout { country: "IE", length: 22, bank: (0, 4), branch: Some((4, 10)), account: (10, 18) },
    Layout { country: "IT", length: 27, bank: (1, 6), branch: Some((6, 11)), account: (11, 23) },
    Layout { country: "LT", length: 20, bank: (0, 5), branch: None, account: (5, 16) },
    Layout { country: "NL", length: 18, bank: (0, 4), branch: None, account: (4, 14) },
    Layout { country: "PL", length: 28, bank: (0, 3), branch: Some((3, 7)), account: (8, 24) },
    Layout { country: "SE", length: 24, bank: (0, 3), branch: None, account: (3, 20) },
    Layout { country: "UA", length: 29, bank: (0, 6), branch: None, account: (6, 25) },
];

impl Layout {
    /// Split for countries missing from [`LAYOUTS`]
    fn generic(total_length: usize) -> Self {
        Self {
            country: "",
            length: total_length,
            bank: (0, 4),
            branch: None,
            account: (4, total_length - 4),
        }
    }
}

fn known_layout(country: &str) -> Option<Layout> {
    LAYOUTS.iter().find(|l| l.country == country).copied()
}

/// International Bank Account Number split into its structural parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iban {
    country_code: String,
    check_digits: String,
    bban: String,
    layout: Layout,
}

impl Iban {
    /// Build an IBAN from country code and BBAN, computing the check digits
    pub fn new(country_code: &str, bban: &str) -> Result<Self, IbanError> {
        if country_code.len() != 2 || !country_code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(IbanError::InvalidCountry(country_code.to_string()));
        }
        if !bban.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()) {
            return Err(IbanError::InvalidCharacters);
        }

        let total = bban.len() + 4;
        let layout = match known_layout(country_code) {
            Some(layout) if layout.length != total => {
                return Err(IbanError::InvalidLength {
                    actual: total,
                    expected: layout.length.to_string(),
                });
            }
            Some(layout) => layout,
            None if !(MIN_LENGTH..=MAX_LENGTH).contains(&total) => {
                return Err(IbanError::InvalidLength {
                    actual: total,
                    expected: format!("{MIN_LENGTH}..={MAX_LENGTH}"),
                });
            }
            None => Layout::generic(total),
        };

        let check_digits = compute_check_digits(country_code, bban)?;
        Ok(Self {
            country_code: country_code.to_string(),
            check_digits,
            bban: bban.to_string(),
            layout,
        })
    }

    /// Generate the IBAN of a user's n-th account at this bank.
    ///
    /// Account number layout: `%06d(user_id * 17)` + `00000000` + `%02d(counter)`.
    pub fn generate(user_id: UserId, account_counter: u32) -> Result<Self, IbanError> {
        let encoded_id = user_id
            .checked_mul(17)
            .filter(|v| (0..1_000_000).contains(v))
            .ok_or_else(|| IbanError::InvalidField {
                field: "user_id",
                value: user_id.to_string(),
            })?;
        if account_counter > 99 {
            return Err(IbanError::InvalidField {
                field: "account_counter",
                value: account_counter.to_string(),
            });
        }
        Self::home(&format!("{encoded_id:06}00000000{account_counter:02}"))
    }

    /// Home-bank IBAN for a 16-digit account number
    pub fn home(account_number: &str) -> Result<Self, IbanError> {
        if account_number.len() != 16 || !account_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IbanError::InvalidField {
                field: "account_number",
                value: account_number.to_string(),
            });
        }
        Self::new(
            HOME_COUNTRY_CODE,
            &format!("{HOME_BANK_CODE}{HOME_BRANCH_CODE}{HOME_NATIONAL_CHECK_DIGIT}{account_number}"),
        )
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn check_digits(&self) -> &str {
        &self.check_digits
    }

    pub fn bban(&self) -> &str {
        &self.bban
    }

    pub fn bank_code(&self) -> &str {
        self.slice(self.layout.bank)
    }

    pub fn branch_code(&self) -> Option<&str> {
        self.layout.branch.map(|range| self.slice(range))
    }

    pub fn account_number(&self) -> &str {
        self.slice(self.layout.account)
    }

    pub fn is_home_country(&self) -> bool {
        self.country_code == HOME_COUNTRY_CODE
    }

    /// Owner-encoding slice of a home-layout account number, `None` abroad
    pub fn owner_segment(&self) -> Option<&str> {
        if !self.is_home_country() {
            return None;
        }
        self.account_number()
            .get(OWNER_SEGMENT_OFFSET..OWNER_SEGMENT_OFFSET + OWNER_SEGMENT_LENGTH)
    }

    /// Compact form without spaces, e.g. `PL61485112340000...`
    pub fn to_compact(&self) -> String {
        format!("{}{}{}", self.country_code, self.check_digits, self.bban)
    }

    /// Presentation form in groups of four
    pub fn to_formatted(&self) -> String {
        let compact = self.to_compact();
        compact
            .as_bytes()
            .chunks(4)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Masked form for logs: country + check digits and the last four characters
    pub fn masked(&self) -> String {
        let compact = self.to_compact();
        let len = compact.len();
        format!("{}{}{}", &compact[..4], "*".repeat(len - 8), &compact[len - 4..])
    }

    fn slice(&self, (start, end): (usize, usize)) -> &str {
        self.bban.get(start..end).unwrap_or_default()
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_compact())
    }
}

impl FromStr for Iban {
    type Err = IbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if !compact.is_ascii() {
            return Err(IbanError::InvalidCharacters);
        }
        if compact.len() < 4 {
            return Err(IbanError::InvalidLength {
                actual: compact.len(),
                expected: format!("{MIN_LENGTH}..={MAX_LENGTH}"),
            });
        }

        let iban = Self::new(&compact[..2], &compact[4..])?;
        if iban.check_digits != compact[2..4] {
            return Err(IbanError::InvalidChecksum);
        }
        Ok(iban)
    }
}

/// ISO 7064 MOD 97-10 check digits for `country` + `bban`
fn compute_check_digits(country: &str, bban: &str) -> Result<String, IbanError> {
    let rearranged = format!("{bban}{country}00");
    let remainder = mod97(&rearranged)?;
    Ok(format!("{:02}", 98 - remainder))
}

fn mod97(input: &str) -> Result<u32, IbanError> {
    let mut remainder: u32 = 0;
    for c in input.chars() {
        let value = c.to_digit(36).ok_or(IbanError::InvalidCharacters)?;
        // letters expand to two digits (A=10 .. Z=35)
        remainder = if value > 9 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }
    Ok(remainder)
}
