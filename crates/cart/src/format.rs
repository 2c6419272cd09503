//! Locale-aware money rendering for the cart views.

use core::fmt;
use core::str::FromStr;

use storefront_core::{DomainError, Money};

/// Renders an amount for display.
pub trait MoneyFormatter: Send + Sync {
    fn format(&self, amount: Money) -> String;
}

/// Locales the storefront renders prices for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    EnUs,
    EnGb,
    #[default]
    FiFi,
    DeDe,
}

const NBSP: char = '\u{a0}';

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::FiFi => "fi-FI",
            Locale::DeDe => "de-DE",
        }
    }

    fn decimal_separator(self) -> char {
        match self {
            Locale::EnUs | Locale::EnGb => '.',
            Locale::FiFi | Locale::DeDe => ',',
        }
    }

    fn group_separator(self) -> char {
        match self {
            Locale::EnUs | Locale::EnGb => ',',
            Locale::FiFi => NBSP,
            Locale::DeDe => '.',
        }
    }

    fn symbol_first(self) -> bool {
        matches!(self, Locale::EnUs | Locale::EnGb)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en-us" => Ok(Locale::EnUs),
            "en-gb" => Ok(Locale::EnGb),
            "fi-fi" | "fi" => Ok(Locale::FiFi),
            "de-de" | "de" => Ok(Locale::DeDe),
            other => Err(DomainError::validation(format!("unsupported locale '{other}'"))),
        }
    }
}

/// Formats money by the conventions of a [`Locale`].
///
/// `en-US`: `€1,234.50`, `fi-FI`: `1 234,50 €` (non-breaking spaces),
/// `de-DE`: `1.234,50 €`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LocaleFormatter {
    locale: Locale,
}

impl LocaleFormatter {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl MoneyFormatter for LocaleFormatter {
    fn format(&self, amount: Money) -> String {
        let locale = self.locale;
        let (negative, major, minor) = amount.parts();
        let digits = amount.currency().minor_digits() as usize;

        let mut number = group_thousands(major, locale.group_separator());
        if digits > 0 {
            number.push(locale.decimal_separator());
            number.push_str(&format!("{minor:0digits$}"));
        }

        let sign = if negative { "-" } else { "" };
        let symbol = amount.currency().symbol();
        if locale.symbol_first() {
            format!("{sign}{symbol}{number}")
        } else {
            format!("{sign}{number}{NBSP}{symbol}")
        }
    }
}

impl<F: MoneyFormatter + ?Sized> MoneyFormatter for std::sync::Arc<F> {
    fn format(&self, amount: Money) -> String {
        (**self).format(amount)
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
