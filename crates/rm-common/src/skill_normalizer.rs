use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Skill alias → canonical form mapping (O(1) lookup).
///
/// Required and candidate skills both pass through this table before set
/// comparison, so "React.js" on a posting matches "react" on a resume.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        // Programming languages
        (
            "javascript",
            &["js", "javascript", "java script", "ecmascript", "es6"],
        ),
        ("typescript", &["ts", "typescript", "type script"]),
        ("python", &["python3", "python 3", "py", "python"]),
        ("java", &["java8", "java11", "java17", "openjdk", "java"]),
        ("csharp", &["c#", "c sharp", "csharp", ".net", "dotnet"]),
        ("cplusplus", &["c++", "cpp", "c plus plus"]),
        ("golang", &["go", "golang", "go lang"]),
        ("rust", &["rust lang", "rust language", "rust"]),
        ("ruby", &["ruby lang", "ruby on rails dev", "ruby"]),
        ("php", &["php7", "php8", "php"]),
        ("shell", &["bash", "shell scripting", "shell"]),
        // Web frameworks
        (
            "react",
            &["reactjs", "react.js", "react js", "react", "react18"],
        ),
        ("angular", &["angularjs", "angular.js", "angular"]),
        ("vue", &["vue.js", "vuejs", "vue js", "vue"]),
        ("nodejs", &["node.js", "node js", "nodejs", "node"]),
        ("express", &["express.js", "expressjs", "express"]),
        ("django", &["django rest framework", "drf", "django"]),
        ("flask", &["flask framework", "python flask", "flask"]),
        ("fastapi", &["fast api", "fastapi"]),
        ("spring", &["spring boot", "springboot", "spring framework", "spring"]),
        ("rails", &["ruby on rails", "ror", "rails"]),
        // Databases
        ("postgresql", &["postgres", "pg", "postgresql", "postgre sql"]),
        ("mysql", &["my sql", "mysql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db", "mongodb"]),
        ("redis", &["redis cache", "redis"]),
        ("elasticsearch", &["elastic search", "elasticsearch"]),
        ("sqlite", &["sqlite3", "sqlite"]),
        ("sql", &["sql", "structured query language"]),
        // Cloud and devops
        ("aws", &["amazon web services", "amazon aws", "aws cloud", "aws"]),
        ("gcp", &["google cloud platform", "google cloud", "gcp"]),
        ("azure", &["microsoft azure", "ms azure", "azure"]),
        ("docker", &["docker container", "containerization", "docker"]),
        (
            "kubernetes",
            &["k8s", "kube", "kubernetes orchestration", "kubernetes"],
        ),
        ("terraform", &["infrastructure as code", "iac", "terraform"]),
        ("ansible", &["configuration management", "ansible"]),
        ("jenkins", &["jenkins ci", "jenkins"]),
        ("git", &["git scm", "github", "gitlab", "git"]),
        ("cicd", &["ci/cd", "ci cd", "continuous integration"]),
        // Data science and ML
        ("pandas", &["python pandas", "pandas"]),
        ("numpy", &["numerical python", "numpy"]),
        ("tensorflow", &["tensor flow", "tf", "tensorflow"]),
        ("pytorch", &["torch", "py torch", "pytorch"]),
        ("scikitlearn", &["scikit-learn", "sklearn", "scikit learn"]),
        ("spark", &["apache spark", "pyspark", "spark"]),
        ("hadoop", &["apache hadoop", "hadoop"]),
        ("kafka", &["apache kafka", "kafka"]),
        (
            "machinelearning",
            &["machine learning", "ml", "machinelearning"],
        ),
        // Practices and misc
        ("restapi", &["rest api", "rest", "restful api", "restapi"]),
        ("graphql", &["graph ql", "graphql"]),
        ("microservices", &["micro services", "microservice", "microservices"]),
        ("linux", &["gnu/linux", "unix", "linux"]),
        ("agile", &["agile", "scrum", "agile/scrum"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Separator-free keys tolerate minor punctuation/spacing differences
/// ("node-js", "node.js", "nodejs" all collapse to the same key).
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        map.entry(compact_key(alias)).or_insert(*canonical);
    }
    map
});

fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

fn match_canonical_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(token) {
        return Some((*canonical).to_string());
    }

    let compact = compact_key(token);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return Some((*canonical).to_string());
    }

    fuzzy_match_canonical(&compact)
}

fn fuzzy_match_canonical(compact: &str) -> Option<String> {
    if compact.len() < 5 {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        // Short tokens (go, java, rust) are matched only via exact/alias
        // lookups above; fuzzy matching them produces false positives on
        // brief inputs.
        if alias.len() < 5 || canonical.len() < 5 {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        if distance == 0 {
            return Some((*canonical).to_string());
        }

        let len = compact.len().max(alias.len());
        let acceptable = distance == 1 || (len >= 8 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            None => best = Some((*canonical, distance)),
            Some((_, best_dist)) if distance < best_dist => best = Some((*canonical, distance)),
            _ => {}
        }
    }

    best.map(|(canonical, _)| canonical.to_string())
}

/// Normalize one skill string to its canonical form. Unknown skills are
/// NFKC-folded, trimmed and lowercased but otherwise kept verbatim.
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    if let Some(canonical) = match_canonical_token(&normalized) {
        return canonical;
    }
    normalized
}

/// Normalize a skill list into a set, dropping blanks.
pub fn normalize_skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_skill(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_alias_equivalence() {
        assert_eq!(normalize_skill("JavaScript"), "javascript");
        assert_eq!(normalize_skill("js"), "javascript");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("C#"), "csharp");
        assert_eq!(normalize_skill("Node.js"), "nodejs");
    }

    #[test]
    fn trims_and_folds_width() {
        assert_eq!(normalize_skill("  Python  "), "python");
        assert_eq!(normalize_skill("ＡＷＳ"), "aws");
    }

    #[test]
    fn tolerates_small_typos_for_known_aliases() {
        assert_eq!(normalize_skill("javascirpt"), "javascript");
        assert_eq!(normalize_skill("kuberntes"), "kubernetes");
        assert_eq!(normalize_skill("pytroch"), "pytorch");
    }

    #[test]
    fn does_not_fuzz_short_tokens() {
        assert_eq!(normalize_skill("javaa"), "javaa");
        assert_eq!(normalize_skill("ab"), "ab");
    }

    #[test]
    fn unknown_skills_lowercase_verbatim() {
        assert_eq!(normalize_skill("MyCustomFramework"), "mycustomframework");
    }

    #[test]
    fn skill_sets_compare_bidirectionally() {
        let job = vec!["React.js".to_string(), "K8s".to_string()];
        let candidate = vec!["react".to_string(), "kubernetes".to_string()];

        assert_eq!(normalize_skill_set(&job), normalize_skill_set(&candidate));
    }

    #[test]
    fn blank_entries_are_dropped() {
        let set = normalize_skill_set(&["  ".to_string(), "Rust".to_string()]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("rust"));
    }
}
