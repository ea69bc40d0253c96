// Released under MIT License.
// Copyright (c) 2025-2026 atomio_rs contributors

//! The periodic table of element symbols and symbol validation.

/// All 118 element symbols, ordered by atomic number.
pub const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Placeholder symbol for species with no resolvable element.
pub const PLACEHOLDER_SYMBOL: &str = "X";

/// Deterministic fallback symbols substituted for unknown element symbols,
/// indexed by site position modulo the table length.
pub(crate) const FALLBACK_SYMBOLS: [&str; 10] =
    ["H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne"];

/// Check whether `symbol` is one of the 118 known element symbols.
pub fn is_element(symbol: &str) -> bool {
    ELEMENT_SYMBOLS.contains(&symbol)
}

/// Get the element symbol for an atomic number (1-based), if valid.
pub fn symbol_from_atomic_number(z: i64) -> Option<&'static str> {
    if (1..=118).contains(&z) {
        Some(ELEMENT_SYMBOLS[(z - 1) as usize])
    } else {
        None
    }
}

/// Get the atomic number (1-based) for an element symbol, if known.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENT_SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .map(|index| index as u8 + 1)
}

/// Resolve a raw element symbol as written by a source format.
///
/// Pseudopotential suffixes (`Fe_pv`, `Si/hash`) are stripped before
/// validation. If the cleaned symbol is not a known element, a deterministic
/// fallback symbol selected by `index` is returned instead.
///
/// ## Returns
/// The resolved symbol and `true` if a fallback substitution happened.
pub fn resolve_symbol(raw: &str, index: usize) -> (&'static str, bool) {
    let clean = raw
        .split(['_', '/'])
        .next()
        .unwrap_or("")
        .trim();

    match ELEMENT_SYMBOLS.iter().find(|&&s| s == clean) {
        Some(&symbol) => (symbol, false),
        None => (FALLBACK_SYMBOLS[index % FALLBACK_SYMBOLS.len()], true),
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        assert_eq!(ELEMENT_SYMBOLS.len(), 118);
        assert_eq!(symbol_from_atomic_number(1), Some("H"));
        assert_eq!(symbol_from_atomic_number(26), Some("Fe"));
        assert_eq!(symbol_from_atomic_number(118), Some("Og"));
        assert_eq!(symbol_from_atomic_number(0), None);
        assert_eq!(symbol_from_atomic_number(119), None);
        assert_eq!(atomic_number("Fe"), Some(26));
        assert_eq!(atomic_number("Xx"), None);
    }

    #[test]
    fn resolve_known_symbol() {
        assert_eq!(resolve_symbol("Fe", 0), ("Fe", false));
    }

    #[test]
    fn resolve_strips_potcar_suffix() {
        assert_eq!(resolve_symbol("Fe_pv", 3), ("Fe", false));
        assert_eq!(resolve_symbol("Si/a1b2", 3), ("Si", false));
    }

    #[test]
    fn resolve_unknown_symbol_is_deterministic() {
        assert_eq!(resolve_symbol("Element0", 0), ("H", true));
        assert_eq!(resolve_symbol("Q", 7), ("O", true));
        assert_eq!(resolve_symbol("Q", 17), ("O", true));
    }
}
