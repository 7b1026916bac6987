use super::error::ModelError;
use phf::phf_map;

static ELEMENT_MASSES: phf::Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "F" => 18.998,
    "Na" => 22.990,
    "Mg" => 24.305,
    "P" => 30.974,
    "S" => 32.06,
    "Cl" => 35.45,
    "K" => 39.098,
    "Ca" => 40.078,
    "Mn" => 54.938,
    "Fe" => 55.845,
    "Co" => 58.933,
    "Ni" => 58.693,
    "Cu" => 63.546,
    "Zn" => 65.38,
    "Se" => 78.971,
    "Br" => 79.904,
    "I" => 126.904,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    symbol: &'static str,
    mass: f64,
}

impl Element {
    /// Looks up an element by symbol. The lookup is case-insensitive ("FE", "fe" and "Fe" all
    /// resolve to iron).
    pub fn from_symbol(symbol: &str) -> Result<Self, ModelError> {
        let normalized = normalize_symbol(symbol);
        ELEMENT_MASSES
            .get_entry(normalized.as_str())
            .map(|(symbol, mass)| Element {
                symbol: *symbol,
                mass: *mass,
            })
            .ok_or_else(|| ModelError::UnknownElement(symbol.to_string()))
    }

    pub fn symbol(&self) -> &str {
        self.symbol
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }
}

fn normalize_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn from_symbol(symbol: &str) -> Result<Self, ModelError> {
        Element::from_symbol(symbol).map(Self::new)
    }

    pub fn mass(&self) -> f64 {
        self.element.mass()
    }
}
