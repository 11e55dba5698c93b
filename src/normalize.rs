//! Text canonicalization and UF (state code) mapping.
//!
//! Source spreadsheets spell the same union or state a dozen different ways:
//! mixed case, stray accents, doubled spaces. Every lookup key in the engine
//! goes through [`normalize`] so that `"São Paulo "` and `"SAO PAULO"` land
//! on the same entry. The module also carries the fixed table of the 27
//! two-letter Brazilian state codes, usable in both directions.

/// The 27 two-letter Brazilian state codes and their accent-free state names.
pub const UF_TO_STATE: [(&str, &str); 27] = [
    ("AC", "ACRE"),
    ("AL", "ALAGOAS"),
    ("AP", "AMAPA"),
    ("AM", "AMAZONAS"),
    ("BA", "BAHIA"),
    ("CE", "CEARA"),
    ("DF", "DISTRITO FEDERAL"),
    ("ES", "ESPIRITO SANTO"),
    ("GO", "GOIAS"),
    ("MA", "MARANHAO"),
    ("MT", "MATO GROSSO"),
    ("MS", "MATO GROSSO DO SUL"),
    ("MG", "MINAS GERAIS"),
    ("PA", "PARA"),
    ("PB", "PARAIBA"),
    ("PR", "PARANA"),
    ("PE", "PERNAMBUCO"),
    ("PI", "PIAUI"),
    ("RJ", "RIO DE JANEIRO"),
    ("RN", "RIO GRANDE DO NORTE"),
    ("RS", "RIO GRANDE DO SUL"),
    ("RO", "RONDONIA"),
    ("RR", "RORAIMA"),
    ("SC", "SANTA CATARINA"),
    ("SP", "SAO PAULO"),
    ("SE", "SERGIPE"),
    ("TO", "TOCANTINS"),
];

/// Canonicalizes a lookup key: trims, uppercases, strips diacritics, and
/// collapses internal whitespace runs to single spaces.
///
/// Empty or whitespace-only input yields an empty string; the function
/// never fails.
///
/// # Example
///
/// ```
/// use vr_engine::normalize::normalize;
///
/// assert_eq!(normalize("  São   Paulo "), "SAO PAULO");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        for upper in ch.to_uppercase() {
            out.push(strip_diacritic(upper));
        }
    }
    out
}

/// Looks up the accent-free state name for a two-letter UF code.
///
/// The code is matched case-insensitively after trimming.
pub fn state_for_uf(uf: &str) -> Option<&'static str> {
    let key = uf.trim().to_uppercase();
    UF_TO_STATE
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, state)| *state)
}

/// Looks up the two-letter UF code for a state name.
///
/// The name is normalized before comparison, so accented and mixed-case
/// spellings match.
pub fn uf_for_state(state: &str) -> Option<&'static str> {
    let key = normalize(state);
    UF_TO_STATE
        .iter()
        .find(|(_, name)| *name == key)
        .map(|(code, _)| *code)
}

/// Maps an uppercase accented Latin letter to its base letter.
///
/// Covers the Portuguese alphabet; anything else passes through unchanged.
fn strip_diacritic(ch: char) -> char {
    match ch {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        'Ý' => 'Y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases_and_trims() {
        assert_eq!(normalize("  sindicato "), "SINDICATO");
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("São Paulo"), "SAO PAULO");
        assert_eq!(normalize("Goiás"), "GOIAS");
        assert_eq!(normalize("Espírito Santo"), "ESPIRITO SANTO");
        assert_eq!(normalize("admissão"), "ADMISSAO");
    }

    #[test]
    fn test_normalize_collapses_whitespace_runs() {
        assert_eq!(normalize("RIO   DE \t JANEIRO"), "RIO DE JANEIRO");
    }

    #[test]
    fn test_normalize_empty_input_yields_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  Maranhão  do  Sul ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_uf_table_has_all_27_codes() {
        assert_eq!(UF_TO_STATE.len(), 27);
        let mut codes: Vec<&str> = UF_TO_STATE.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 27);
    }

    #[test]
    fn test_state_for_uf() {
        assert_eq!(state_for_uf("SP"), Some("SAO PAULO"));
        assert_eq!(state_for_uf("df"), Some("DISTRITO FEDERAL"));
        assert_eq!(state_for_uf(" rj "), Some("RIO DE JANEIRO"));
        assert_eq!(state_for_uf("XX"), None);
    }

    #[test]
    fn test_uf_for_state_accepts_accented_names() {
        assert_eq!(uf_for_state("São Paulo"), Some("SP"));
        assert_eq!(uf_for_state("goiás"), Some("GO"));
        assert_eq!(uf_for_state("MATO GROSSO DO SUL"), Some("MS"));
        assert_eq!(uf_for_state("ATLANTIDA"), None);
    }

    #[test]
    fn test_mapping_is_bidirectional() {
        for (code, state) in UF_TO_STATE {
            assert_eq!(state_for_uf(code), Some(state));
            assert_eq!(uf_for_state(state), Some(code));
        }
    }
}
