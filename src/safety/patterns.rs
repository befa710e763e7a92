//! Pattern sets for the content-safety rules.

use std::sync::LazyLock;

use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("safety pattern must compile"))
        .collect()
}

pub static EATING_DISORDER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)anorex",
        r"(?i)bulimi",
        r"(?i)binge\s*eat",
        r"(?i)purge",
        r"(?i)self[-\s]*harm",
        r"(?i)suicid",
        r"(?i)laxative",
        r"(?i)vomit",
        r"(?i)starv",
        r"(?i)eating\s*disorder",
    ])
});

pub static MEDICAL_ADVICE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)medical\s*advice",
        r"(?i)diagnos",
        r"(?i)prescrib",
        r"(?i)medication",
        r"(?i)surgery",
        r"(?i)treat",
        r"(?i)rehab",
        r"(?i)physical\s*therapy",
        r"(?i)injury\s*advice",
    ])
});

// Prohibited domains: weapons, explosives, illegal activities
pub static PROHIBITED_DOMAIN: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\b(bomb|explosive|dynamite|grenade|detonat|incendiary|molotov|pipe\s*bomb|improvised\s*explosive)\b",
        r"(?i)\b(weapon|gun|firearm|rifle|pistol|ammunition|bullet|ammo)\b",
        r"(?i)\b(hack|hacking|cyber\s*attack|ddos|malware|virus|trojan)\b",
        r"(?i)\b(poison|toxic\s*substance|chemical\s*weapon)\b",
        r"(?i)\b(illegal\s*drug|manufactur.*drug|synthesiz.*drug)\b",
    ])
});

// Instructional intent: requests for procedures/instructions
pub static INSTRUCTIONAL_INTENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\b(how\s*to|step\s*by\s*step|instructions?|guide|tutorial|recipe\s*for|make\s*a|build\s*a|create\s*a|construct\s*a)\b",
        r"(?i)\b(teach\s*me|show\s*me|explain\s*how|walk\s*me\s*through)\b",
    ])
});

// Culinary allow-list that suppresses the compound prohibited-content rule.
pub static COOKING_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(cook|recipe|food|meal|ingredient|kitchen|culinary|bake|roast|grill|fry|boil|steam)\b",
    )
    .expect("cooking pattern must compile")
});

/// True when any pattern in the set matches the text.
pub fn has_pattern(text: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}
