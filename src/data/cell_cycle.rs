//! Canonical cell-cycle marker gene lists (Tirosh et al., mouse symbols),
//! used to populate the gene dropdowns on the cell-cycle tab.

/// S-phase marker genes.
pub const S_GENES: &[&str] = &[
    "Cdc45", "Uhrf1", "Mcm2", "Slbp", "Mcm5", "Pola1", "Gmnn", "Cdc6", "Rrm2", "Atad2", "Dscc1",
    "Mcm4", "Chaf1b", "Rfc2", "Msh2", "Fen1", "Hells", "Prim1", "Tyms", "Mcm6", "Wdr76", "Rad51",
    "Pcna", "Ccne2", "Casp8ap2", "Usp1", "Nasp", "Rpa2", "Ung", "Rad51ap1", "Blm", "Pold3",
    "Rrm1", "Cenpu", "Gins2", "Tipin", "Brip1", "Dtl", "Exo1", "Ubr7", "Clspn", "E2f8", "Cdca7",
];

/// G2M-phase marker genes.
pub const G2M_GENES: &[&str] = &[
    "Ube2c", "Lbr", "Ctcf", "Cdc20", "Cbx5", "Kif11", "Anp32e", "Birc5", "Cdk1", "Tmpo", "Hmmr",
    "Pimreg", "Aurkb", "Top2a", "Gtse1", "Rangap1", "Cdca3", "Ndc80", "Kif20b", "Cenpf", "Nek2",
    "Nuf2", "Nusap1", "Bub1", "Tpx2", "Aurka", "Ect2", "Cks1b", "Kif2c", "Cdca8", "Cenpa",
    "Mki67", "Ccnb2", "Kif23", "Smc4", "G2e3", "Tubb4b", "Anln", "Tacc3", "Dlgap5", "Ckap2",
    "Ncapd2", "Ttk", "Ckap5", "Cdc25c", "Hjurp", "Cenpe", "Ckap2l", "Cdca2", "Hmgb2", "Cks2",
    "Psrc1", "Gas2l3",
];

/// Restrict a canonical marker list to the genes the dataset actually has,
/// preserving the canonical order.
pub fn available<'a>(canonical: &[&'a str], dataset_genes: &[String]) -> Vec<&'a str> {
    canonical
        .iter()
        .copied()
        .filter(|g| dataset_genes.iter().any(|d| d == g))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_keeps_canonical_order() {
        let genes = vec!["Top2a".to_string(), "Ube2c".to_string(), "Actb".to_string()];
        assert_eq!(available(G2M_GENES, &genes), vec!["Ube2c", "Top2a"]);
    }

    #[test]
    fn available_is_empty_when_nothing_matches() {
        let genes = vec!["Actb".to_string()];
        assert!(available(S_GENES, &genes).is_empty());
    }
}
