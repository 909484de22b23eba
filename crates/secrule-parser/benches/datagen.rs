//! Synthetic SecRule configuration generators for benchmarks.
//!
//! Produces deterministic output when given the same seed, so benchmark runs are
//! reproducible. Each generator returns a `String` of valid configuration text.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed seed for reproducible benchmarks.
const SEED: u64 = 0x5EC_2017_CAFE;

/// Create a seeded RNG.
pub fn rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

const VARIABLES: &[&str] = &[
    "ARGS",
    "ARGS_NAMES",
    "REQUEST_COOKIES",
    "!REQUEST_COOKIES:/__utm/",
    "REQUEST_COOKIES_NAMES",
    "REQUEST_HEADERS:User-Agent",
    "REQUEST_HEADERS:Referer",
    "REQUEST_FILENAME",
    "REQUEST_BASENAME",
    "REQUEST_URI",
    "REQUEST_HEADERS:/^X-Forwarded-/",
    "&TX:real_ip",
];

const OPERATORS: &[&str] = &[
    "@rx (?i)\\b(?:union\\s+select|select\\s+.*\\s+from)\\b",
    "@rx ^[\\d.:]+$",
    "@pm sqlmap nikto nessus masscan",
    "@pmFromFile scanners-user-agents.data",
    "@detectSQLi",
    "@detectXSS",
    "@contains <script",
    "@beginsWith /admin",
    "@ipMatch 127.0.0.1,10.0.0.0/8,::1",
    "@validateByteRange 1-255",
    "@gt %{tx.inbound_anomaly_score_threshold}",
    "!@streq GET",
];

const TRANSFORMS: &[&str] = &[
    "t:none",
    "t:urlDecodeUni",
    "t:lowercase",
    "t:htmlEntityDecode",
    "t:removeNulls",
    "t:compressWhitespace",
    "t:cmdLine",
];

const TAGS: &[&str] = &[
    "application-multi",
    "language-multi",
    "platform-multi",
    "attack-sqli",
    "attack-xss",
    "paranoia-level/1",
    "OWASP_CRS",
    "capec/1000/152/248/66",
];

const SEVERITIES: &[&str] = &["CRITICAL", "ERROR", "WARNING", "NOTICE"];

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Generate one realistic detection rule, written across continuation lines
/// the way published rule sets are formatted.
pub fn gen_single_rule(rng: &mut StdRng, id: usize) -> String {
    let num_vars = rng.random_range(1..=3);
    let variables: Vec<&str> = (0..num_vars)
        .map(|_| VARIABLES[rng.random_range(0..VARIABLES.len())])
        .collect();
    let operator = OPERATORS[rng.random_range(0..OPERATORS.len())];
    let phase = rng.random_range(1..=2);
    let severity = SEVERITIES[rng.random_range(0..SEVERITIES.len())];

    let mut actions = vec![
        format!("id:{}", 900_000 + id),
        format!("phase:{phase}"),
        "block".to_string(),
        "capture".to_string(),
    ];
    for _ in 0..rng.random_range(1..=3) {
        actions.push(TRANSFORMS[rng.random_range(0..TRANSFORMS.len())].to_string());
    }
    actions.push(format!("msg:'Synthetic detection {id}'"));
    actions.push(
        "logdata:'Matched Data: %{TX.0} found within %{MATCHED_VAR_NAME}: %{MATCHED_VAR}'"
            .to_string(),
    );
    for _ in 0..rng.random_range(1..=3) {
        actions.push(format!("tag:'{}'", TAGS[rng.random_range(0..TAGS.len())]));
    }
    actions.push("ver:'OWASP_CRS/4.0.0'".to_string());
    actions.push(format!("severity:'{severity}'"));
    actions.push(
        "setvar:'tx.inbound_anomaly_score_pl1=+%{tx.critical_anomaly_score}'".to_string(),
    );

    format!(
        "SecRule {} \"{operator}\" \\\n    \"{}\"\n\n",
        variables.join("|"),
        actions.join(",\\\n    ")
    )
}

/// A file of `n` rules preceded by a comment header and engine settings.
pub fn gen_n_rules(n: usize) -> String {
    let mut rng = rng();
    let mut conf = String::from(
        "# ------------------------------------------------------------------------\n\
         # Synthetic benchmark rule set\n\
         # ------------------------------------------------------------------------\n\
         SecRuleEngine DetectionOnly\n\
         SecRequestBodyAccess On\n\
         SecDefaultAction \"phase:2,log,auditlog,pass\"\n\n",
    );
    for id in 0..n {
        conf.push_str(&gen_single_rule(&mut rng, id));
    }
    conf.push_str("SecMarker \"END-SYNTHETIC\"\n");
    conf
}

/// `n` rules whose strings are dominated by macros and `setvar` targets.
pub fn gen_n_macro_rules(n: usize) -> String {
    let mut conf = String::new();
    for id in 0..n {
        conf.push_str(&format!(
            "SecAction \"id:{},phase:1,pass,nolog,\
             setvar:'tx.%{{rule.id}}-%{{MATCHED_VAR_NAME}}=%{{MATCHED_VAR}}',\
             setvar:ip.counter_{id}=+1,expirevar:ip.counter_{id}=%{{tx.window}},\
             initcol:ip=%{{REMOTE_ADDR}}_%{{tx.ua_hash}}\"\n",
            10_000 + id
        ));
    }
    conf
}
