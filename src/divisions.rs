//! Brazilian federative units (states plus the Federal District).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub code: &'static str,
    pub name: &'static str,
}

pub const STATES: [State; 27] = [
    State { code: "AC", name: "Acre" },
    State { code: "AL", name: "Alagoas" },
    State { code: "AP", name: "Amapá" },
    State { code: "AM", name: "Amazonas" },
    State { code: "BA", name: "Bahia" },
    State { code: "CE", name: "Ceará" },
    State { code: "DF", name: "Distrito Federal" },
    State { code: "ES", name: "Espírito Santo" },
    State { code: "GO", name: "Goiás" },
    State { code: "MA", name: "Maranhão" },
    State { code: "MT", name: "Mato Grosso" },
    State { code: "MS", name: "Mato Grosso do Sul" },
    State { code: "MG", name: "Minas Gerais" },
    State { code: "PA", name: "Pará" },
    State { code: "PB", name: "Paraíba" },
    State { code: "PR", name: "Paraná" },
    State { code: "PE", name: "Pernambuco" },
    State { code: "PI", name: "Piauí" },
    State { code: "RJ", name: "Rio de Janeiro" },
    State { code: "RN", name: "Rio Grande do Norte" },
    State { code: "RS", name: "Rio Grande do Sul" },
    State { code: "RO", name: "Rondônia" },
    State { code: "RR", name: "Roraima" },
    State { code: "SC", name: "Santa Catarina" },
    State { code: "SP", name: "São Paulo" },
    State { code: "SE", name: "Sergipe" },
    State { code: "TO", name: "Tocantins" },
];

pub fn state_by_code(code: &str) -> Option<&'static State> {
    let code = code.trim();
    STATES
        .iter()
        .find(|state| state.code.eq_ignore_ascii_case(code))
}

/// States ordered by name, the way they are offered for selection.
pub fn states_by_name() -> Vec<&'static State> {
    let mut states: Vec<&'static State> = STATES.iter().collect();
    states.sort_by_key(|state| crate::normalize::normalize(state.name));
    states
}
