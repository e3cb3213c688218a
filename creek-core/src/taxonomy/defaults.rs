//! The built-in nine-dimension taxonomy. Shipped as data so deployments can
//! override or extend it from configuration without touching classifier code.

use std::collections::BTreeMap;

use super::{DimensionSchema, MatchMode, TaxonomySchema};

/// Default minimum density score for a primary reading. Density is signal
/// hits over token count, so one hit in a fifty-token fragment sits at the
/// floor.
pub fn primary_floor() -> f64 {
    0.02
}

/// Default minimum density score for a secondary label.
pub fn secondary_floor() -> f64 {
    0.01
}

fn dimension(
    name: &str,
    dual_reading: bool,
    open_set: bool,
    table: &[(&str, &[&str])],
) -> (String, DimensionSchema) {
    let labels = table.iter().map(|(label, _)| label.to_string()).collect();
    let signals: BTreeMap<String, Vec<String>> = table
        .iter()
        .filter(|(_, terms)| !terms.is_empty())
        .map(|(label, terms)| {
            (
                label.to_string(),
                terms.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect();
    (
        name.to_string(),
        DimensionSchema {
            name: name.to_string(),
            labels,
            open_set,
            signals,
            primary_floor: primary_floor(),
            secondary_floor: secondary_floor(),
            dual_reading,
            match_mode: MatchMode::Substring,
        },
    )
}

/// The archive taxonomy: frequencies of concern, energetic phase, mode of
/// engagement, do/feel orientation, dosage, voice register, conviction,
/// emotional texture, and actionability.
pub fn default_taxonomy() -> TaxonomySchema {
    let dimensions = BTreeMap::from([
        dimension(
            "frequency",
            false,
            false,
            &[
                ("f1_survival", &["survival", "safety", "security", "threat", "danger", "scarcity"] as &[&str]),
                ("f2_belonging", &["belonging", "tribe", "loyalty", "kinship", "acceptance"]),
                ("f3_agency", &["power", "agency", "ambition", "drive", "steering", "discipline", "taking action", "intention", "commit", "submit", "habit"]),
                ("f4_order", &["order", "structure", "procedure", "routine", "stability"]),
                ("f5_achievement", &["achievement", "strategy", "success", "goal", "milestone", "winning"]),
                ("f6_community", &["community", "empathy", "compassion", "inclusion", "consensus"]),
                ("f7_systems", &["systems", "patterns", "complexity", "integrate", "emergent", "feedback loop"]),
                ("f8_holistic", &["ecology", "holistic", "collective", "planetary", "interdependence"]),
                ("f9_witness", &["witness", "presence", "stillness", "being with", "attention"]),
                ("f10_unity", &["unity", "oneness", "non-dual", "dissolve", "boundless"]),
            ],
        ),
        dimension(
            "phase",
            false,
            false,
            &[
                ("rising", &["emerging", "building toward", "gathering", "momentum"] as &[&str]),
                ("peaking", &["peaking", "climax", "intense", "at its peak", "full force"]),
                ("withdrawal", &["retreating", "pulling back", "withdrawing", "receding"]),
                ("diminishing", &["fading", "declining", "waning", "ebbing"]),
                ("bottoming_out", &["rock bottom", "emptied", "depleted", "burnt out"]),
                ("restoration", &["recovering", "healing", "returning to", "renewal"]),
            ],
        ),
        dimension(
            "mode",
            false,
            false,
            &[
                ("inhabit", &["dwelling", "immersed", "inhabiting", "living in"] as &[&str]),
                ("express", &["expressing", "creating", "articulating", "voicing"]),
                ("collaborate", &["collaborating", "together we", "co-creating", "alongside"]),
                ("integrate", &["integrating", "weaving", "synthesizing", "braiding"]),
                ("absorb", &["absorbing", "receiving", "taking in", "soaking up"]),
            ],
        ),
        dimension(
            "orientation",
            true,
            false,
            &[
                ("do", &["doing", "building", "making", "executing", "shipping"] as &[&str]),
                ("feel", &["feeling", "sensing", "emotion", "heart", "aching"]),
            ],
        ),
        dimension(
            "dosage",
            true,
            false,
            &[
                ("medicine", &["nourishing", "grounding", "steadying", "healing", "restores me"] as &[&str]),
                ("toxic", &["spiraling", "obsessive", "compulsive", "draining", "corrosive"]),
            ],
        ),
        dimension(
            "register",
            false,
            false,
            &[
                ("confessional", &["confess", "admit", "never told", "secret truth"] as &[&str]),
                ("analytical", &["analysis", "examine", "hypothesis", "framework"]),
                ("playful", &["playful", "joking", "silly", "whimsical"]),
                ("prophetic", &["vision of", "prophecy", "revelation", "what is coming"]),
                ("instructional", &["step by step", "how to", "here's how", "instructions"]),
                ("raw", &["screaming", "rage", "fuck", "unfiltered"]),
                ("conversational", &["yeah", "lol", "anyway", "you know"]),
            ],
        ),
        dimension(
            "conviction",
            false,
            false,
            &[
                ("musing", &["wondering", "maybe", "perhaps", "idly"] as &[&str]),
                ("exploring", &["exploring", "what if", "curious", "circling"]),
                ("forming", &["starting to think", "beginning to see", "taking shape"]),
                ("settled", &["i believe", "i've concluded", "it's clear to me"]),
                ("conviction", &["certain", "absolutely", "without doubt", "unshakable"]),
            ],
        ),
        dimension(
            "texture",
            false,
            true,
            &[
                ("longing", &["longing", "yearning"] as &[&str]),
                ("grief", &["grief", "mourning"]),
                ("joy", &["joy", "delight"]),
                ("dread", &["dread", "foreboding"]),
                ("awe", &["awe", "wonder"]),
                ("tenderness", &["tenderness", "tender"]),
                ("restlessness", &["restless", "restlessness"]),
            ],
        ),
        dimension(
            "actionability",
            false,
            false,
            &[
                ("none", &[] as &[&str]),
                ("latent", &["someday", "i should", "could try", "one day"]),
                ("explicit", &["i will", "next step", "plan to", "committing to"]),
            ],
        ),
    ]);
    TaxonomySchema { dimensions }
}
