//! Display-name normalization applied to feed values.

/// Title-case a brand name, except short names (three characters or fewer)
/// which are treated as abbreviations and upper-cased: `bmw` -> `BMW`,
/// `PEUGEOT` -> `Peugeot`.
pub fn pretty_brand_name(brand: &str) -> String {
    let brand = brand.trim();
    if brand.chars().count() <= 3 {
        brand.to_uppercase()
    } else {
        title_case(brand)
    }
}

/// `DIESEL` -> `Diesel`.
pub fn pretty_fuel_type(fuel_type: &str) -> String {
    title_case(fuel_type.trim())
}

/// Lower-case everything, then upper-case the first letter of each word.
/// A word starts after any character that is not alphanumeric or `_`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}
