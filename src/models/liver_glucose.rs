//! Hepatic glucose metabolism
//!
//! Kinetic network of glycolysis, gluconeogenesis and glycogen metabolism in a
//! hepatocyte, regulated by insulin, glucagon and epinephrine via the
//! phosphorylation state `gamma`. Blood glucose (`glc_ext`) and lactate (`lac_ext`)
//! are boundary species; hormone levels are assignment rules of `glc_ext`.
//!
//! Time is in minutes, concentrations in mM and reaction rates in mmole/min.
//!
//! Whole liver outputs use the convention *positive = production*:
//!
//! | output | rule | positive |
//! |--------|------|----------|
//! | `HGP` | `-GLUT2 * flux_conversion` | glucose release |
//! | `GNG` | `-GPI * flux_conversion` | gluconeogenesis |
//! | `GLY` | `G16PI * flux_conversion` | glycogenolysis |

use crate::network::definition::{
    AssignmentRule, Compartment, NetworkDefinition, NetworkDefinitionBuilder, Parameter,
    ReactionBuilder, Species,
};
use crate::network::error::NetworkError;
use crate::network::model::ReactionNetwork;

/// Identifier of the packaged network.
pub const MODEL_ID: &str = "liver_glucose";

/// Boundary species whose concentrations drive the network.
pub const INPUTS: [&str; 2] = ["glc_ext", "lac_ext"];

/// Whole liver fluxes in µmol/min/kg bodyweight.
pub const OUTPUTS: [&str; 3] = ["HGP", "GNG", "GLY"];

/// Hormone levels in pM.
pub const HORMONES: [&str; 3] = ["ins", "glu", "epi"];

/// Conserved nucleotide pools that are not fed by any boundary reaction.
pub const CONSERVED_POOLS: [(&str, &[&str]); 3] = [
    ("utp_tot", &["utp", "udp", "udpglc"]),
    ("gtp_tot", &["gtp", "gdp"]),
    ("gtp_mito_tot", &["gtp_mito", "gdp_mito"]),
];

// (id, compartment, initial concentration, boundary, name)
const SPECIES: &[(&str, &str, f64, bool, &str)] = &[
    ("atp", "cyto", 2.8, true, "ATP"),
    ("adp", "cyto", 0.8, true, "ADP"),
    ("amp", "cyto", 0.16, true, "AMP"),
    ("utp", "cyto", 0.27, false, "UTP"),
    ("udp", "cyto", 0.09, false, "UDP"),
    ("gtp", "cyto", 0.29, false, "GTP"),
    ("gdp", "cyto", 0.1, false, "GDP"),
    ("nad", "cyto", 1.22, true, "NAD+"),
    ("nadh", "cyto", 0.56e-3, true, "NADH"),
    ("phos", "cyto", 5.0, true, "phosphate"),
    ("pp", "cyto", 0.008, false, "pyrophosphate"),
    ("co2", "cyto", 5.0, true, "CO2"),
    ("h2o", "cyto", 0.0, true, "H2O"),
    ("h", "cyto", 0.0, true, "H+"),
    ("glc1p", "cyto", 0.012, false, "glucose-1 phosphate"),
    ("udpglc", "cyto", 0.38, false, "UDP-glucose"),
    ("glyglc", "cyto", 250.0, false, "glycogen"),
    ("glc", "cyto", 5.0, false, "glucose"),
    ("glc6p", "cyto", 0.12, false, "glucose-6 phosphate"),
    ("fru6p", "cyto", 0.05, false, "fructose-6 phosphate"),
    ("fru16bp", "cyto", 0.02, false, "fructose-1,6 bisphosphate"),
    ("fru26bp", "cyto", 0.004, false, "fructose-2,6 bisphosphate"),
    ("grap", "cyto", 0.1, false, "glyceraldehyde 3-phosphate"),
    ("dhap", "cyto", 0.03, false, "dihydroxyacetone phosphate"),
    ("bpg13", "cyto", 0.3, false, "1,3-bisphospho-glycerate"),
    ("pg3", "cyto", 0.27, false, "3-phosphoglycerate"),
    ("pg2", "cyto", 0.03, false, "2-phosphoglycerate"),
    ("pep", "cyto", 0.15, false, "phosphoenolpyruvate"),
    ("pyr", "cyto", 0.1, false, "pyruvate"),
    ("oaa", "cyto", 0.01, false, "oxaloacetate"),
    ("lac", "cyto", 0.5, false, "lactate"),
    ("glc_ext", "ext", 3.0, true, "glucose"),
    ("lac_ext", "ext", 1.2, true, "lactate"),
    ("co2_mito", "mito", 5.0, true, "CO2"),
    ("phos_mito", "mito", 5.0, true, "phosphate"),
    ("oaa_mito", "mito", 0.01, false, "oxaloacetate"),
    ("pep_mito", "mito", 0.15, false, "phosphoenolpyruvate"),
    ("acoa_mito", "mito", 0.04, true, "acetyl-coenzyme A"),
    ("pyr_mito", "mito", 0.1, false, "pyruvate"),
    ("cit_mito", "mito", 0.32, true, "citrate"),
    ("atp_mito", "mito", 2.8, true, "ATP"),
    ("adp_mito", "mito", 0.8, true, "ADP"),
    ("gtp_mito", "mito", 0.29, false, "GTP"),
    ("gdp_mito", "mito", 0.1, false, "GDP"),
    ("coa_mito", "mito", 0.055, true, "coenzyme A"),
    ("nadh_mito", "mito", 0.24, true, "NADH"),
    ("nad_mito", "mito", 0.98, true, "NAD+"),
    ("h2o_mito", "mito", 0.0, true, "H2O"),
    ("h_mito", "mito", 0.0, true, "H+"),
];

const PARAMETERS: &[(&str, f64)] = &[
    ("scale", 1.0),
    ("V_cyto", 1.0),
    ("f_mito", 0.2),
    ("Vliver", 1.5),
    ("fliver", 0.583333333333334),
    ("bodyweight", 70.0),
    ("sec_per_min", 60.0),
    ("mumole_per_mmole", 1000.0),
    ("x_ins1", 818.9),
    ("x_ins2", 0.0),
    ("x_ins3", 8.6),
    ("x_ins4", 4.2),
    ("x_glu1", 190.0),
    ("x_glu2", 37.9),
    ("x_glu3", 3.01),
    ("x_glu4", 6.40),
    ("x_epi1", 6090.0),
    ("x_epi2", 100.0),
    ("x_epi3", 3.10),
    ("x_epi4", 8.40),
    ("K_val", 0.1),
    ("epi_f", 0.8),
];

const RULES: &[(&str, &str)] = &[
    ("V_mito", "f_mito * V_cyto"),
    ("flux_conversion", "mumole_per_mmole / bodyweight"),
    ("f_gly", "scale"),
    ("f_glyglc", "scale"),
    // hormonal regulation
    (
        "ins",
        "x_ins2 + (x_ins1 - x_ins2) * glc_ext^x_ins4 / (glc_ext^x_ins4 + x_ins3^x_ins4)",
    ),
    ("ins_norm", "max(0.0, ins - x_ins2)"),
    (
        "glu",
        "x_glu2 + (x_glu1 - x_glu2) * (1 - glc_ext^x_glu4 / (glc_ext^x_glu4 + x_glu3^x_glu4))",
    ),
    ("glu_norm", "max(0.0, glu - x_glu2)"),
    (
        "epi",
        "x_epi2 + (x_epi1 - x_epi2) * (1 - glc_ext^x_epi4 / (glc_ext^x_epi4 + x_epi3^x_epi4))",
    ),
    ("epi_norm", "max(0.0, epi - x_epi2)"),
    ("K_ins", "(x_ins1 - x_ins2) * K_val"),
    ("K_glu", "(x_glu1 - x_glu2) * K_val"),
    ("K_epi", "(x_epi1 - x_epi2) * K_val"),
    (
        "gamma",
        "0.5 * (1 - ins_norm / (ins_norm + K_ins) \
         + max(glu_norm / (glu_norm + K_glu), epi_f * epi_norm / (epi_norm + K_epi)))",
    ),
    // pools
    ("nadh_tot", "nadh + nad"),
    ("atp_tot", "atp + adp + amp"),
    ("utp_tot", "utp + udp + udpglc"),
    ("gtp_tot", "gtp + gdp"),
    ("nadh_mito_tot", "nadh_mito + nad_mito"),
    ("atp_mito_tot", "atp_mito + adp_mito"),
    ("gtp_mito_tot", "gtp_mito + gdp_mito"),
    // whole liver
    ("HGP", "-GLUT2 * flux_conversion"),
    ("GNG", "-GPI * flux_conversion"),
    ("GLY", "G16PI * flux_conversion"),
];

struct ReactionSpec {
    id: &'static str,
    name: &'static str,
    equation: &'static str,
    compartment: &'static str,
    parameters: &'static [(&'static str, f64)],
    rules: &'static [(&'static str, &'static str)],
    rate_law: &'static str,
}

const REACTIONS: &[ReactionSpec] = &[
    ReactionSpec {
        id: "GLUT2",
        name: "GLUT2 glucose transporter",
        equation: "glc_ext <-> glc",
        compartment: "pm",
        parameters: &[("GLUT2_keq", 1.0), ("GLUT2_k_glc", 42.0), ("GLUT2_Vmax", 420.0)],
        rules: &[],
        rate_law: "f_gly * (GLUT2_Vmax / GLUT2_k_glc) * (glc_ext - glc / GLUT2_keq) \
                   / (1 + glc_ext / GLUT2_k_glc + glc / GLUT2_k_glc)",
    },
    ReactionSpec {
        id: "GK",
        name: "Glucokinase",
        equation: "glc + atp => glc6p + adp + h [glc1p, fru6p]",
        compartment: "cyto",
        parameters: &[
            ("GK_n_gkrp", 2.0),
            ("GK_k_glc1", 15.0),
            ("GK_k_fru6p", 0.010),
            ("GK_b", 0.7),
            ("GK_n", 1.6),
            ("GK_k_glc", 7.5),
            ("GK_k_atp", 0.26),
            ("GK_Vmax", 25.2),
        ],
        rules: &[(
            "GK_gc_free",
            "(glc^GK_n_gkrp / (glc^GK_n_gkrp + GK_k_glc1^GK_n_gkrp)) \
             * (1 - GK_b * fru6p / (fru6p + GK_k_fru6p))",
        )],
        rate_law: "f_gly * GK_Vmax * GK_gc_free * (atp / (GK_k_atp + atp)) \
                   * (glc^GK_n / (glc^GK_n + GK_k_glc^GK_n))",
    },
    ReactionSpec {
        id: "G6PASE",
        name: "D-Glucose-6-phosphate Phosphatase",
        equation: "glc6p + h2o => glc + phos",
        compartment: "cyto",
        parameters: &[("G6PASE_k_glc6p", 2.0), ("G6PASE_Vmax", 18.9)],
        rules: &[],
        rate_law: "f_gly * G6PASE_Vmax * (glc6p / (G6PASE_k_glc6p + glc6p))",
    },
    ReactionSpec {
        id: "GPI",
        name: "D-Glucose-6-phosphate Isomerase",
        equation: "glc6p <-> fru6p",
        compartment: "cyto",
        parameters: &[
            ("GPI_keq", 0.517060817492925),
            ("GPI_k_glc6p", 0.182),
            ("GPI_k_fru6p", 0.071),
            ("GPI_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * (GPI_Vmax / GPI_k_glc6p) * (glc6p - fru6p / GPI_keq) \
                   / (1 + glc6p / GPI_k_glc6p + fru6p / GPI_k_fru6p)",
    },
    ReactionSpec {
        id: "G16PI",
        name: "Glucose 1-phosphate 1,6-phosphomutase",
        equation: "glc1p <-> glc6p",
        compartment: "cyto",
        parameters: &[
            ("G16PI_keq", 15.717554082151441),
            ("G16PI_k_glc6p", 0.67),
            ("G16PI_k_glc1p", 0.045),
            ("G16PI_Vmax", 100.0),
        ],
        rules: &[],
        rate_law: "f_glyglc * (G16PI_Vmax / G16PI_k_glc1p) * (glc1p - glc6p / G16PI_keq) \
                   / (1 + glc1p / G16PI_k_glc1p + glc6p / G16PI_k_glc6p)",
    },
    ReactionSpec {
        id: "UPGASE",
        name: "UTP:Glucose-1-phosphate uridylyltransferase",
        equation: "glc1p + h + utp <-> pp + udpglc",
        compartment: "cyto",
        parameters: &[
            ("UPGASE_keq", 0.312237619153088),
            ("UPGASE_k_utp", 0.563),
            ("UPGASE_k_glc1p", 0.172),
            ("UPGASE_k_udpglc", 0.049),
            ("UPGASE_k_pp", 0.166),
            ("UPGASE_Vmax", 80.0),
        ],
        rules: &[],
        rate_law: "f_glyglc * UPGASE_Vmax / (UPGASE_k_utp * UPGASE_k_glc1p) \
                   * (utp * glc1p - udpglc * pp / UPGASE_keq) \
                   / ((1 + utp / UPGASE_k_utp) * (1 + glc1p / UPGASE_k_glc1p) \
                   + (1 + udpglc / UPGASE_k_udpglc) * (1 + pp / UPGASE_k_pp) - 1)",
    },
    ReactionSpec {
        id: "PPASE",
        name: "Pyrophosphate phosphohydrolase",
        equation: "pp + h2o => h + 2 phos",
        compartment: "cyto",
        parameters: &[("PPASE_k_pp", 0.005), ("PPASE_Vmax", 2.4)],
        rules: &[],
        rate_law: "f_glyglc * PPASE_Vmax * pp / (pp + PPASE_k_pp)",
    },
    ReactionSpec {
        id: "GS",
        name: "Glycogen synthase",
        equation: "udpglc + h2o => udp + h + glyglc [glc6p]",
        compartment: "cyto",
        parameters: &[
            ("GS_C", 500.0),
            ("GS_k1_max", 0.2),
            ("GSn_k1", 0.224),
            ("GSp_k1", 3.003),
            ("GSn_k2", 0.1504),
            ("GSp_k2", 0.09029),
            ("GS_Vmax", 13.2),
        ],
        rules: &[
            (
                "GS_fs",
                "(1 + GS_k1_max) * (GS_C - glyglc) / ((GS_C - glyglc) + GS_k1_max * GS_C)",
            ),
            ("GSn_k_udpglc", "GSn_k1 / (glc6p + GSn_k2)"),
            ("GSp_k_udpglc", "GSp_k1 / (glc6p + GSp_k2)"),
            (
                "GSn",
                "f_glyglc * GS_Vmax * GS_fs * udpglc / (GSn_k_udpglc + udpglc)",
            ),
            (
                "GSp",
                "f_glyglc * GS_Vmax * GS_fs * udpglc / (GSp_k_udpglc + udpglc)",
            ),
        ],
        rate_law: "(1 - gamma) * GSn + gamma * GSp",
    },
    ReactionSpec {
        id: "GP",
        name: "Glycogen-Phosphorylase",
        equation: "glyglc + phos <-> glc1p + h2o [phos, amp, glc]",
        compartment: "cyto",
        parameters: &[
            ("GP_keq", 0.211826505793075),
            ("GPn_k_glyglc", 4.8),
            ("GPp_k_glyglc", 2.7),
            ("GPn_k_glc1p", 120.0),
            ("GPp_k_glc1p", 2.0),
            ("GPn_k_phos", 300.0),
            ("GPp_k_phos", 5.0),
            ("GPp_ki_glc", 5.0),
            ("GPn_ka_amp", 1.0),
            ("GPn_base_amp", 0.03),
            ("GPn_max_amp", 0.30),
            ("GP_Vmax", 6.8),
        ],
        rules: &[
            (
                "GP_fmax",
                "(1 + GS_k1_max) * glyglc / (glyglc + GS_k1_max * GS_C)",
            ),
            (
                "GPn_Vmax",
                "f_glyglc * GP_Vmax * GP_fmax \
                 * (GPn_base_amp + (GPn_max_amp - GPn_base_amp) * amp / (amp + GPn_ka_amp))",
            ),
            (
                "GPn",
                "GPn_Vmax / (GPn_k_glyglc * GPn_k_phos) * (glyglc * phos - glc1p / GP_keq) \
                 / ((1 + glyglc / GPn_k_glyglc) * (1 + phos / GPn_k_phos) \
                 + (1 + glc1p / GPn_k_glc1p) - 1)",
            ),
            (
                "GPp_Vmax",
                "f_glyglc * GP_Vmax * GP_fmax * exp(-ln(2) / GPp_ki_glc * glc)",
            ),
            (
                "GPp",
                "GPp_Vmax / (GPp_k_glyglc * GPp_k_phos) * (glyglc * phos - glc1p / GP_keq) \
                 / ((1 + glyglc / GPp_k_glyglc) * (1 + phos / GPp_k_phos) \
                 + (1 + glc1p / GPp_k_glc1p) - 1)",
            ),
        ],
        rate_law: "(1 - gamma) * GPn + gamma * GPp",
    },
    ReactionSpec {
        id: "NDKGTP",
        name: "Nucleoside-diphosphate kinase (ATP, GTP)",
        equation: "atp + gdp <-> adp + gtp",
        compartment: "cyto",
        parameters: &[
            ("NDKGTP_keq", 1.0),
            ("NDKGTP_k_atp", 1.33),
            ("NDKGTP_k_adp", 0.042),
            ("NDKGTP_k_gtp", 0.15),
            ("NDKGTP_k_gdp", 0.031),
            ("NDKGTP_Vmax", 0.0),
        ],
        rules: &[],
        rate_law: "f_gly * NDKGTP_Vmax / (NDKGTP_k_atp * NDKGTP_k_gdp) \
                   * (atp * gdp - adp * gtp / NDKGTP_keq) \
                   / ((1 + atp / NDKGTP_k_atp) * (1 + gdp / NDKGTP_k_gdp) \
                   + (1 + adp / NDKGTP_k_adp) * (1 + gtp / NDKGTP_k_gtp) - 1)",
    },
    ReactionSpec {
        id: "NDKUTP",
        name: "Nucleoside-diphosphate kinase (ATP, UTP)",
        equation: "atp + udp <-> adp + utp",
        compartment: "cyto",
        parameters: &[
            ("NDKUTP_keq", 1.0),
            ("NDKUTP_k_atp", 1.33),
            ("NDKUTP_k_adp", 0.042),
            ("NDKUTP_k_utp", 16.0),
            ("NDKUTP_k_udp", 0.19),
            ("NDKUTP_Vmax", 2940.0),
        ],
        rules: &[],
        rate_law: "f_glyglc * NDKUTP_Vmax / (NDKUTP_k_atp * NDKUTP_k_udp) \
                   * (atp * udp - adp * utp / NDKUTP_keq) \
                   / ((1 + atp / NDKUTP_k_atp) * (1 + udp / NDKUTP_k_udp) \
                   + (1 + adp / NDKUTP_k_adp) * (1 + utp / NDKUTP_k_utp) - 1)",
    },
    ReactionSpec {
        id: "AK",
        name: "ATP:AMP phosphotransferase (Adenylatkinase)",
        equation: "amp + atp <-> 2 adp",
        compartment: "cyto",
        parameters: &[
            ("AK_keq", 0.247390074904985),
            ("AK_k_atp", 0.09),
            ("AK_k_amp", 0.08),
            ("AK_k_adp", 0.11),
            ("AK_Vmax", 0.0),
        ],
        rules: &[],
        rate_law: "f_gly * AK_Vmax / (AK_k_atp * AK_k_amp) * (atp * amp - adp * adp / AK_keq) \
                   / ((1 + atp / AK_k_atp) * (1 + amp / AK_k_amp) \
                   + (1 + adp / AK_k_adp) * (1 + adp / AK_k_adp) - 1)",
    },
    ReactionSpec {
        id: "PFK2",
        name: "ATP:D-fructose-6-phosphate 2-phosphotransferase",
        equation: "fru6p + atp => fru26bp + adp + h",
        compartment: "cyto",
        parameters: &[
            ("PFK2n_n", 1.3),
            ("PFK2p_n", 2.1),
            ("PFK2n_k_fru6p", 0.016),
            ("PFK2p_k_fru6p", 0.050),
            ("PFK2n_k_atp", 0.28),
            ("PFK2p_k_atp", 0.65),
            ("PFK2_Vmax", 0.0042),
        ],
        rules: &[
            (
                "PFK2n",
                "f_gly * PFK2_Vmax * fru6p^PFK2n_n / (fru6p^PFK2n_n + PFK2n_k_fru6p^PFK2n_n) \
                 * atp / (atp + PFK2n_k_atp)",
            ),
            (
                "PFK2p",
                "f_gly * PFK2_Vmax * fru6p^PFK2p_n / (fru6p^PFK2p_n + PFK2p_k_fru6p^PFK2p_n) \
                 * atp / (atp + PFK2p_k_atp)",
            ),
        ],
        rate_law: "(1 - gamma) * PFK2n + gamma * PFK2p",
    },
    ReactionSpec {
        id: "FBP2",
        name: "D-Fructose-2,6-bisphosphate 2-phosphohydrolase",
        equation: "fru26bp + h2o => fru6p + phos",
        compartment: "cyto",
        parameters: &[
            ("FBP2n_k_fru26bp", 0.010),
            ("FBP2p_k_fru26bp", 0.0005),
            ("FBP2n_ki_fru6p", 0.0035),
            ("FBP2p_ki_fru6p", 0.010),
            ("FBP2_Vmax", 0.126),
        ],
        rules: &[
            (
                "FBP2n",
                "f_gly * FBP2_Vmax / (1 + fru6p / FBP2n_ki_fru6p) * fru26bp \
                 / (FBP2n_k_fru26bp + fru26bp)",
            ),
            (
                "FBP2p",
                "f_gly * FBP2_Vmax / (1 + fru6p / FBP2p_ki_fru6p) * fru26bp \
                 / (FBP2p_k_fru26bp + fru26bp)",
            ),
        ],
        rate_law: "(1 - gamma) * FBP2n + gamma * FBP2p",
    },
    ReactionSpec {
        id: "PFK1",
        name: "ATP:D-fructose-6-phosphate 1-phosphotransferase",
        equation: "fru6p + atp => fru16bp + adp + h [fru26bp]",
        compartment: "cyto",
        parameters: &[
            ("PFK1_k_atp", 0.111),
            ("PFK1_k_fru6p", 0.077),
            ("PFK1_ki_fru6p", 0.012),
            ("PFK1_ka_fru26bp", 0.001),
            ("PFK1_Vmax", 7.182),
        ],
        rules: &[],
        rate_law: "f_gly * PFK1_Vmax * (1 - 1 / (1 + fru26bp / PFK1_ka_fru26bp)) * fru6p * atp \
                   / (PFK1_ki_fru6p * PFK1_k_atp + PFK1_k_fru6p * atp + PFK1_k_atp * fru6p \
                   + atp * fru6p)",
    },
    ReactionSpec {
        id: "FBP1",
        name: "D-Fructose-1,6-bisphosphate 1-phosphohydrolase",
        equation: "fru16bp + h2o => fru6p + phos [fru26bp]",
        compartment: "cyto",
        parameters: &[
            ("FBP1_ki_fru26bp", 0.001),
            ("FBP1_k_fru16bp", 0.0013),
            ("FBP1_Vmax", 4.326),
        ],
        rules: &[],
        rate_law: "f_gly * FBP1_Vmax / (1 + fru26bp / FBP1_ki_fru26bp) \
                   * fru16bp / (fru16bp + FBP1_k_fru16bp)",
    },
    ReactionSpec {
        id: "ALD",
        name: "Aldolase",
        equation: "fru16bp <-> grap + dhap",
        compartment: "cyto",
        parameters: &[
            ("ALD_keq", 9.762988973629690e-5),
            ("ALD_k_fru16bp", 0.0071),
            ("ALD_k_dhap", 0.0364),
            ("ALD_k_grap", 0.0071),
            ("ALD_ki1_grap", 0.0572),
            ("ALD_ki2_grap", 0.176),
            ("ALD_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * ALD_Vmax / ALD_k_fru16bp * (fru16bp - grap * dhap / ALD_keq) \
                   / (1 + fru16bp / ALD_k_fru16bp + grap / ALD_ki1_grap \
                   + dhap * (grap + ALD_k_grap) / (ALD_k_dhap * ALD_ki1_grap) \
                   + (fru16bp * grap) / (ALD_k_fru16bp * ALD_ki2_grap))",
    },
    ReactionSpec {
        id: "TPI",
        name: "Triosephosphate Isomerase",
        equation: "dhap <-> grap",
        compartment: "cyto",
        parameters: &[
            ("TPI_keq", 0.054476985386756),
            ("TPI_k_dhap", 0.59),
            ("TPI_k_grap", 0.42),
            ("TPI_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * TPI_Vmax / TPI_k_dhap * (dhap - grap / TPI_keq) \
                   / (1 + dhap / TPI_k_dhap + grap / TPI_k_grap)",
    },
    ReactionSpec {
        id: "GAPDH",
        name: "D-Glyceraldehyde-3-phosphate:NAD+ oxidoreductase",
        equation: "grap + nad + phos <-> bpg13 + nadh + h",
        compartment: "cyto",
        parameters: &[
            ("GAPDH_keq", 0.086779866194594),
            ("GAPDH_k_nad", 0.05),
            ("GAPDH_k_grap", 0.005),
            ("GAPDH_k_phos", 3.9),
            ("GAPDH_k_nadh", 0.0083),
            ("GAPDH_k_bpg13", 0.0035),
            ("GAPDH_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * GAPDH_Vmax / (GAPDH_k_nad * GAPDH_k_grap * GAPDH_k_phos) \
                   * (nad * grap * phos - bpg13 * nadh / GAPDH_keq) \
                   / ((1 + nad / GAPDH_k_nad) * (1 + grap / GAPDH_k_grap) \
                   * (1 + phos / GAPDH_k_phos) \
                   + (1 + nadh / GAPDH_k_nadh) * (1 + bpg13 / GAPDH_k_bpg13) - 1)",
    },
    ReactionSpec {
        id: "PGK",
        name: "Phosphoglycerate Kinase",
        equation: "adp + bpg13 <-> atp + pg3",
        compartment: "cyto",
        parameters: &[
            ("PGK_keq", 6.958644052488538),
            ("PGK_k_adp", 0.35),
            ("PGK_k_atp", 0.48),
            ("PGK_k_bpg13", 0.002),
            ("PGK_k_pg3", 1.2),
            ("PGK_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * PGK_Vmax / (PGK_k_adp * PGK_k_bpg13) \
                   * (adp * bpg13 - atp * pg3 / PGK_keq) \
                   / ((1 + adp / PGK_k_adp) * (1 + bpg13 / PGK_k_bpg13) \
                   + (1 + atp / PGK_k_atp) * (1 + pg3 / PGK_k_pg3) - 1)",
    },
    ReactionSpec {
        id: "PGM",
        name: "2-Phospho-D-glycerate 2,3-phosphomutase",
        equation: "pg3 <-> pg2",
        compartment: "cyto",
        parameters: &[
            ("PGM_keq", 0.181375378837397),
            ("PGM_k_pg3", 5.0),
            ("PGM_k_pg2", 1.0),
            ("PGM_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * PGM_Vmax * (pg3 - pg2 / PGM_keq) \
                   / (pg3 + PGM_k_pg3 * (1 + pg2 / PGM_k_pg2))",
    },
    ReactionSpec {
        id: "EN",
        name: "2-Phospho-D-glycerate hydro-lyase (enolase)",
        equation: "pg2 <-> h2o + pep",
        compartment: "cyto",
        parameters: &[
            ("EN_keq", 0.054476985386756),
            ("EN_k_pep", 1.0),
            ("EN_k_pg2", 1.0),
            ("EN_Vmax", 35.994),
        ],
        rules: &[],
        rate_law: "f_gly * EN_Vmax * (pg2 - pep / EN_keq) / (pg2 + EN_k_pg2 * (1 + pep / EN_k_pep))",
    },
    ReactionSpec {
        id: "PK",
        name: "Pyruvatkinase",
        equation: "pep + adp + h => pyr + atp [fru16bp]",
        compartment: "cyto",
        parameters: &[
            ("PKn_n", 3.5),
            ("PKp_n", 3.5),
            ("PKn_n_fbp", 1.8),
            ("PKp_n_fbp", 1.8),
            ("PKn_alpha", 1.0),
            ("PKp_alpha", 1.1),
            ("PKn_k_fbp", 0.16e-3),
            ("PKp_k_fbp", 0.35e-3),
            ("PKn_k_pep", 0.58),
            ("PKp_k_pep", 1.10),
            ("PKn_ba", 0.08),
            ("PKp_ba", 0.04),
            ("PK_ae", 1.0),
            ("PKn_k_pep_end", 0.08),
            ("PK_k_adp", 2.3),
            ("PK_Vmax", 46.2),
        ],
        rules: &[
            (
                "PKn_f",
                "fru16bp^PKn_n_fbp / (PKn_k_fbp^PKn_n_fbp + fru16bp^PKn_n_fbp)",
            ),
            (
                "PKp_f",
                "fru16bp^PKp_n_fbp / (PKp_k_fbp^PKp_n_fbp + fru16bp^PKp_n_fbp)",
            ),
            ("PKn_alpha_inp", "(1 - PKn_f) * (PKn_alpha - PK_ae) + PK_ae"),
            ("PKp_alpha_inp", "(1 - PKp_f) * (PKp_alpha - PK_ae) + PK_ae"),
            (
                "PKn_pep_inp",
                "(1 - PKn_f) * (PKn_k_pep - PKn_k_pep_end) + PKn_k_pep_end",
            ),
            (
                "PKp_pep_inp",
                "(1 - PKp_f) * (PKp_k_pep - PKn_k_pep_end) + PKn_k_pep_end",
            ),
            (
                "PKn",
                "f_gly * PK_Vmax * PKn_alpha_inp * pep^PKn_n / (PKn_pep_inp^PKn_n + pep^PKn_n) \
                 * adp / (adp + PK_k_adp) * (PKn_ba + (1 - PKn_ba) * PKn_f)",
            ),
            (
                "PKp",
                "f_gly * PK_Vmax * PKp_alpha_inp * pep^PKp_n / (PKp_pep_inp^PKp_n + pep^PKp_n) \
                 * adp / (adp + PK_k_adp) * (PKp_ba + (1 - PKp_ba) * PKp_f)",
            ),
        ],
        rate_law: "(1 - gamma) * PKn + gamma * PKp",
    },
    ReactionSpec {
        id: "PEPCK",
        name: "PEPCK cyto",
        equation: "gtp + oaa <-> co2 + gdp + pep",
        compartment: "cyto",
        parameters: &[
            ("PEPCK_keq", 3.369565215864287e2),
            ("PEPCK_k_pep", 0.237),
            ("PEPCK_k_gdp", 0.0921),
            ("PEPCK_k_co2", 25.5),
            ("PEPCK_k_oaa", 0.0055),
            ("PEPCK_k_gtp", 0.0222),
            ("PEPCK_Vmax", 0.0),
        ],
        rules: &[],
        rate_law: "f_gly * PEPCK_Vmax / (PEPCK_k_oaa * PEPCK_k_gtp) \
                   * (oaa * gtp - pep * gdp * co2 / PEPCK_keq) \
                   / ((1 + oaa / PEPCK_k_oaa) * (1 + gtp / PEPCK_k_gtp) \
                   + (1 + pep / PEPCK_k_pep) * (1 + gdp / PEPCK_k_gdp) * (1 + co2 / PEPCK_k_co2) - 1)",
    },
    ReactionSpec {
        id: "PEPCKM",
        name: "PEPCK mito",
        equation: "gtp_mito + oaa_mito <-> co2_mito + gdp_mito + pep_mito",
        compartment: "mito",
        parameters: &[("PEPCKM_Vmax", 546.0)],
        rules: &[],
        rate_law: "f_gly * PEPCKM_Vmax / (PEPCK_k_oaa * PEPCK_k_gtp) \
                   * (oaa_mito * gtp_mito - pep_mito * gdp_mito * co2_mito / PEPCK_keq) \
                   / ((1 + oaa_mito / PEPCK_k_oaa) * (1 + gtp_mito / PEPCK_k_gtp) \
                   + (1 + pep_mito / PEPCK_k_pep) * (1 + gdp_mito / PEPCK_k_gdp) \
                   * (1 + co2_mito / PEPCK_k_co2) - 1)",
    },
    ReactionSpec {
        id: "PC",
        name: "Pyruvate Carboxylase",
        equation: "atp_mito + pyr_mito + co2_mito + h2o_mito \
                   => adp_mito + oaa_mito + phos_mito + 2 h [acoa_mito]",
        compartment: "mito",
        parameters: &[
            ("PC_k_atp", 0.22),
            ("PC_k_pyr", 0.22),
            ("PC_k_co2", 3.2),
            ("PC_k_acoa", 0.015),
            ("PC_n", 2.5),
            ("PC_Vmax", 168.0),
        ],
        rules: &[],
        rate_law: "f_gly * PC_Vmax * atp_mito / (PC_k_atp + atp_mito) \
                   * pyr_mito / (PC_k_pyr + pyr_mito) * co2_mito / (PC_k_co2 + co2_mito) \
                   * acoa_mito^PC_n / (acoa_mito^PC_n + PC_k_acoa^PC_n)",
    },
    ReactionSpec {
        id: "LDH",
        name: "Lactate Dehydrogenase",
        equation: "pyr + nadh + h <-> lac + nad",
        compartment: "cyto",
        parameters: &[
            ("LDH_keq", 2.783210760047520e-4),
            ("LDH_k_pyr", 0.495),
            ("LDH_k_lac", 31.98),
            ("LDH_k_nad", 0.984),
            ("LDH_k_nadh", 0.027),
            ("LDH_Vmax", 12.6),
        ],
        rules: &[],
        rate_law: "f_gly * LDH_Vmax / (LDH_k_pyr * LDH_k_nadh) * (pyr * nadh - lac * nad / LDH_keq) \
                   / ((1 + nadh / LDH_k_nadh) * (1 + pyr / LDH_k_pyr) \
                   + (1 + lac / LDH_k_lac) * (1 + nad / LDH_k_nad) - 1)",
    },
    ReactionSpec {
        id: "LACT",
        name: "Lactate transport (import)",
        equation: "lac_ext <-> lac",
        compartment: "pm",
        parameters: &[("LACT_keq", 1.0), ("LACT_k_lac", 0.8), ("LACT_Vmax", 5.418)],
        rules: &[],
        rate_law: "f_gly * LACT_Vmax / LACT_k_lac * (lac_ext - lac / LACT_keq) \
                   / (1 + lac_ext / LACT_k_lac + lac / LACT_k_lac)",
    },
    ReactionSpec {
        id: "PYRTM",
        name: "Pyruvate transport (mito)",
        equation: "pyr <-> pyr_mito",
        compartment: "mm",
        parameters: &[("PYRTM_keq", 1.0), ("PYRTM_k_pyr", 0.1), ("PYRTM_Vmax", 42.0)],
        rules: &[],
        rate_law: "f_gly * PYRTM_Vmax / PYRTM_k_pyr * (pyr - pyr_mito / PYRTM_keq) \
                   / (1 + pyr / PYRTM_k_pyr + pyr_mito / PYRTM_k_pyr)",
    },
    ReactionSpec {
        id: "PEPTM",
        name: "PEP Transport (export mito)",
        equation: "pep_mito <-> pep",
        compartment: "mm",
        parameters: &[("PEPTM_keq", 1.0), ("PEPTM_k_pep", 0.1), ("PEPTM_Vmax", 33.6)],
        rules: &[],
        rate_law: "f_gly * PEPTM_Vmax / PEPTM_k_pep * (pep_mito - pep / PEPTM_keq) \
                   / (1 + pep / PEPTM_k_pep + pep_mito / PEPTM_k_pep)",
    },
    ReactionSpec {
        id: "PDH",
        name: "Pyruvate Dehydrogenase",
        equation: "pyr_mito + coa_mito + nad_mito => acoa_mito + co2_mito + nadh_mito",
        compartment: "mito",
        parameters: &[
            ("PDH_k_pyr", 0.025),
            ("PDH_k_coa", 0.013),
            ("PDH_k_nad", 0.050),
            ("PDH_ki_acoa", 0.035),
            ("PDH_ki_nadh", 0.036),
            ("PDHn_alpha", 5.0),
            ("PDHp_alpha", 1.0),
            ("PDH_Vmax", 13.44),
        ],
        rules: &[
            (
                "PDH_base",
                "f_gly * PDH_Vmax * pyr_mito / (pyr_mito + PDH_k_pyr) \
                 * nad_mito / (nad_mito + PDH_k_nad * (1 + nadh_mito / PDH_ki_nadh)) \
                 * coa_mito / (coa_mito + PDH_k_coa * (1 + acoa_mito / PDH_ki_acoa))",
            ),
            ("PDHn", "PDH_base * PDHn_alpha"),
            ("PDHp", "PDH_base * PDHp_alpha"),
        ],
        rate_law: "(1 - gamma) * PDHn + gamma * PDHp",
    },
    ReactionSpec {
        id: "CS",
        name: "Citrate Synthase",
        equation: "acoa_mito + oaa_mito + h2o_mito <-> cit_mito + coa_mito + h_mito",
        compartment: "mito",
        parameters: &[
            ("CS_keq", 2.665990308427589e5),
            ("CS_k_oaa", 0.002),
            ("CS_k_acoa", 0.016),
            ("CS_k_cit", 0.420),
            ("CS_k_coa", 0.070),
            ("CS_Vmax", 4.2),
        ],
        rules: &[],
        rate_law: "f_gly * CS_Vmax / (CS_k_oaa * CS_k_acoa) \
                   * (acoa_mito * oaa_mito - cit_mito * coa_mito / CS_keq) \
                   / ((1 + acoa_mito / CS_k_acoa) * (1 + oaa_mito / CS_k_oaa) \
                   + (1 + cit_mito / CS_k_cit) * (1 + coa_mito / CS_k_coa) - 1)",
    },
    ReactionSpec {
        id: "NDKGTPM",
        name: "Nucleoside-diphosphate kinase (ATP, GTP) mito",
        equation: "atp_mito + gdp_mito <-> adp_mito + gtp_mito",
        compartment: "mito",
        parameters: &[
            ("NDKGTPM_keq", 1.0),
            ("NDKGTPM_k_atp", 1.33),
            ("NDKGTPM_k_adp", 0.042),
            ("NDKGTPM_k_gtp", 0.15),
            ("NDKGTPM_k_gdp", 0.031),
            ("NDKGTPM_Vmax", 420.0),
        ],
        rules: &[],
        rate_law: "f_gly * NDKGTPM_Vmax / (NDKGTPM_k_atp * NDKGTPM_k_gdp) \
                   * (atp_mito * gdp_mito - adp_mito * gtp_mito / NDKGTPM_keq) \
                   / ((1 + atp_mito / NDKGTPM_k_atp) * (1 + gdp_mito / NDKGTPM_k_gdp) \
                   + (1 + adp_mito / NDKGTPM_k_adp) * (1 + gtp_mito / NDKGTPM_k_gtp) - 1)",
    },
    ReactionSpec {
        id: "OAAFLX",
        name: "oxalacetate influx",
        equation: "=> oaa_mito",
        compartment: "mito",
        parameters: &[("OAAFLX_Vmax", 0.0)],
        rules: &[],
        rate_law: "f_gly * OAAFLX_Vmax",
    },
    ReactionSpec {
        id: "ACOAFLX",
        name: "acetyl-coa efflux",
        equation: "acoa_mito =>",
        compartment: "mito",
        parameters: &[("ACOAFLX_Vmax", 0.0)],
        rules: &[],
        rate_law: "f_gly * ACOAFLX_Vmax",
    },
    ReactionSpec {
        id: "CITFLX",
        name: "citrate efflux",
        equation: "cit_mito =>",
        compartment: "mito",
        parameters: &[("CITFLX_Vmax", 0.0)],
        rules: &[],
        rate_law: "f_gly * CITFLX_Vmax",
    },
];

/// The hepatic glucose network definition.
pub fn definition() -> Result<NetworkDefinition, NetworkError> {
    let mut builder = NetworkDefinitionBuilder::default();
    builder.id(MODEL_ID).name("Hepatic glucose metabolism");

    builder
        .to_compartments(named(Compartment::new("ext", 1.0, 3), "blood"))
        .to_compartments(named(Compartment::new("cyto", "V_cyto", 3), "cytosol"))
        .to_compartments(named(Compartment::new("mito", "V_mito", 3), "mitochondrion"))
        .to_compartments(named(Compartment::new("pm", 1.0, 2), "plasma membrane"))
        .to_compartments(named(
            Compartment::new("mm", 1.0, 2),
            "mitochondrial membrane",
        ));

    for (id, compartment, concentration, boundary, name) in SPECIES {
        let mut species = Species::new(*id, *compartment, *concentration);
        species.boundary_condition = *boundary;
        species.name = Some(name.to_string());
        builder.to_species(species);
    }

    for (id, value) in PARAMETERS {
        builder.to_parameters(Parameter::new(*id, *value));
    }

    for (variable, expression) in RULES {
        builder.to_rules(AssignmentRule::new(*variable, *expression));
    }

    for spec in REACTIONS {
        let reaction = ReactionBuilder::default()
            .id(spec.id)
            .name(spec.name)
            .compartment(spec.compartment)
            .equation(spec.equation)?
            .parameters(
                spec.parameters
                    .iter()
                    .map(|(id, value)| Parameter::new(*id, *value))
                    .collect::<Vec<_>>(),
            )
            .rules(
                spec.rules
                    .iter()
                    .map(|(variable, expression)| AssignmentRule::new(*variable, *expression))
                    .collect::<Vec<_>>(),
            )
            .rate_law(spec.rate_law)
            .build()?;
        builder.to_reactions(reaction);
    }

    builder.build()
}

/// Variant with glycogen as a boundary species.
///
/// Used for steady state scans over the glycogen content.
pub fn const_glycogen_definition() -> Result<NetworkDefinition, NetworkError> {
    let mut definition = definition()?.with_boundary_condition("glyglc", true)?;
    definition.id = format!("{MODEL_ID}_const_glycogen");
    Ok(definition)
}

/// The validated hepatic glucose network.
pub fn network() -> Result<ReactionNetwork, NetworkError> {
    ReactionNetwork::new(definition()?)
}

/// The validated constant glycogen network.
pub fn const_glycogen_network() -> Result<ReactionNetwork, NetworkError> {
    ReactionNetwork::new(const_glycogen_definition()?)
}

fn named(mut compartment: Compartment, name: &str) -> Compartment {
    compartment.name = Some(name.to_string());
    compartment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::consistency::{check_consistency, Severity};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_definition_is_consistent() {
        let definition = definition().unwrap();
        let report = check_consistency(&definition);

        assert!(report.is_valid, "{:#?}", report.errors);
        assert_eq!(definition.compartments.len(), 5);
        assert_eq!(definition.species.len(), 49);
        assert_eq!(definition.reactions.len(), 36);
        assert_eq!(report.with_severity(Severity::Error).count(), 0);
    }

    #[test]
    fn test_network_partition() {
        let network = network().unwrap();

        assert_eq!(network.dynamic_species().len(), 27);
        assert_eq!(network.boundary_species().len(), 22);
        assert!(network.boundary_species().iter().any(|s| s == "glc_ext"));
    }

    #[test]
    fn test_const_glycogen_variant() {
        let network = const_glycogen_network().unwrap();

        assert!(network.boundary_species().iter().any(|s| s == "glyglc"));
        assert!(!network.dynamic_species().iter().any(|s| s == "glyglc"));
        assert_eq!(network.id(), "liver_glucose_const_glycogen");
    }

    #[test]
    fn test_stoichiometry_of_pyruvate_carboxylase() {
        let definition = definition().unwrap();
        let pc = definition.get_reaction("PC").unwrap();

        assert_eq!(pc.coefficient("pyr_mito"), -1.0);
        assert_eq!(pc.coefficient("h"), 2.0);
        assert_eq!(pc.modifiers, vec!["acoa_mito".to_string()]);
    }

    #[test]
    fn test_initial_hormone_levels() {
        let network = network().unwrap();
        let bindings = network.initial_bindings(0.0);
        let value = |name: &str| bindings[network.slot(name).unwrap()];

        // glc_ext = 3 mM
        let ins = 818.9 * 3f64.powf(4.2) / (3f64.powf(4.2) + 8.6f64.powf(4.2));
        assert_relative_eq!(value("ins"), ins, max_relative = 1e-12);
        assert_relative_eq!(value("HGP"), -value("GLUT2") * 1000.0 / 70.0, max_relative = 1e-12);
        assert_relative_eq!(value("V_mito"), 0.2);

        let gamma = value("gamma");
        assert!(gamma > 0.0 && gamma < 1.0);

        let pools: HashMap<&str, f64> = CONSERVED_POOLS
            .iter()
            .map(|(pool, members)| (*pool, members.iter().map(|m| value(m)).sum()))
            .collect();
        assert_relative_eq!(pools["utp_tot"], 0.27 + 0.09 + 0.38, max_relative = 1e-12);
        assert_relative_eq!(value("gtp_tot"), pools["gtp_tot"], max_relative = 1e-12);
    }
}
