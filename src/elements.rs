use once_cell::sync::Lazy;
use std::collections::HashMap;

static Z_BY_SYMBOL: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, u32> = ELEMENT_SYMBOLS
        .iter()
        .enumerate()
        .map(|(idx, symbol)| (*symbol, idx as u32 + 1))
        .collect();
    // The free neutron shows up as a product in some reaction tables.
    table.insert("n", 0);
    table
});

pub fn symbol_for_z(z: u32) -> Option<&'static str> {
    match z {
        0 => Some("n"),
        _ => ELEMENT_SYMBOLS.get((z as usize).saturating_sub(1)).copied(),
    }
}

pub fn z_for_symbol(symbol: &str) -> Option<u32> {
    Z_BY_SYMBOL.get(symbol).copied()
}

const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_and_numbers_agree() {
        for z in 0..=118 {
            let symbol = symbol_for_z(z).unwrap();
            assert_eq!(z_for_symbol(symbol), Some(z));
        }
        assert_eq!(z_for_symbol("Co"), Some(27));
        assert_eq!(z_for_symbol("co"), None);
        assert_eq!(symbol_for_z(119), None);
    }
}
