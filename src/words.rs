//! Spells whole amounts in words using the Indian grouping scheme.
//!
//! Numbers are split into crore (10,000,000), lakh (100,000), thousand
//! and a remainder below one thousand.  Each non-zero group is spelled
//! on its own and followed by its scale word, so `12,34,567` becomes
//! `"Twelve Lakh Thirty Four Thousand Five Hundred Sixty Seven"`.

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Spell `n` in words.  `0` is `"Zero"`.
///
/// The crore group is not itself decomposed further, so values of a
/// thousand crore or more spell their crore count the same way a
/// remainder group would.
pub fn words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }
    groups(n)
        .into_iter()
        .map(|(value, scale)| match scale {
            Some(scale) => format!("{} {}", spell_group(value), scale),
            None => spell_group(value),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The non-zero groups of `n`, most significant first.
pub fn groups(n: u64) -> Vec<(u64, Option<&'static str>)> {
    let crore = n / CRORE;
    let lakh = (n % CRORE) / LAKH;
    let thousand = (n % LAKH) / THOUSAND;
    let rest = n % THOUSAND;
    [
        (crore, Some("Crore")),
        (lakh, Some("Lakh")),
        (thousand, Some("Thousand")),
        (rest, None),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .collect()
}

fn below_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{} {}", TENS[n / 10], ONES[n % 10])
    }
}

fn spell_group(n: u64) -> String {
    if n >= 1000 {
        // Only reachable for the crore group of very large values.
        return words(n);
    }
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, _) => below_hundred(rest),
        (h, 0) => format!("{} Hundred", ONES[h as usize]),
        (h, r) => format!("{} Hundred {}", ONES[h as usize], below_hundred(r)),
    }
}
