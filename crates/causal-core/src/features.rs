//! Maps file paths to the user-facing product features they implement.
//!
//! The tables are static and matched case-insensitively against the whole
//! path, so directory names count as much as file names.

use indexmap::IndexSet;

/// Files that serve several features at once, checked before [`FEATURE_PATTERNS`]
const MULTI_FEATURE_FILES: &[(&str, &[&str])] = &[
    ("useauth", &["로그인", "회원가입", "프로필"]),
    ("auth.ts", &["로그인", "회원가입", "프로필", "인증"]),
    ("supabase", &["로그인", "회원가입", "인증"]),
    ("session", &["로그인", "인증"]),
    ("authprovider", &["로그인", "회원가입", "프로필"]),
];

/// Feature name → path substrings, in priority order
pub const FEATURE_PATTERNS: &[(&str, &[&str])] = &[
    ("로그인", &["login", "signin", "sign-in"]),
    ("회원가입", &["signup", "sign-up", "register", "registration"]),
    ("로그아웃", &["logout", "signout", "sign-out"]),
    ("프로필", &["profile", "user-info", "userinfo", "account"]),
    ("인증", &["auth", "authentication", "authorize", "token", "session"]),
    ("대시보드", &["dashboard", "home", "main", "overview"]),
    ("설정", &["setting", "config", "preference"]),
    (
        "코드 시각화",
        &["mermaid", "diagram", "visualization", "flowchart", "graph", "logic-flow", "call-graph"],
    ),
    ("이슈 관리", &["issue", "ticket", "bug", "task"]),
    ("레포지토리", &["repo", "repository", "project"]),
    ("검색", &["search", "find", "query"]),
    ("알림", &["notification", "alert", "toast"]),
    ("파일 관리", &["file", "upload", "download", "attachment"]),
    ("댓글", &["comment", "reply", "discussion"]),
];

/// Every feature `path` belongs to; empty when nothing matches
pub fn map_file_to_features(path: &str) -> Vec<String> {
    let lower = path.to_lowercase();
    let mut features: IndexSet<&str> = IndexSet::new();

    for (needle, names) in MULTI_FEATURE_FILES {
        if lower.contains(needle) {
            features.extend(names.iter().copied());
        }
    }

    for (feature, patterns) in FEATURE_PATTERNS {
        if patterns.iter().any(|p| lower.contains(p)) {
            features.insert(*feature);
        }
    }

    features.into_iter().map(str::to_string).collect()
}

/// Flattens the features of many paths, first occurrence wins.
///
/// Absent (`None`) and empty entries are skipped.
pub fn map_to_user_features<'a, I, P>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = P>,
    P: Into<Option<&'a str>>,
{
    let mut features: IndexSet<String> = IndexSet::new();
    for path in paths {
        let Some(path) = path.into() else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        features.extend(map_file_to_features(path));
    }
    features.into_iter().collect()
}

/// Features of a function, judged by its file and its own name
pub fn map_function_to_features(name: &str, file: &str) -> Vec<String> {
    map_to_user_features([file, name])
}

/// Orders features by their position in [`FEATURE_PATTERNS`]; unknown names go last
pub fn sort_features_by_priority(features: &[String]) -> Vec<String> {
    let priority = |feature: &str| {
        FEATURE_PATTERNS
            .iter()
            .position(|(name, _)| *name == feature)
            .unwrap_or(usize::MAX)
    };
    let mut sorted = features.to_vec();
    sorted.sort_by_key(|f| priority(f.as_str()));
    sorted
}

/// One-line Korean summary of affected features, listing at most three
pub fn generate_feature_summary(features: &[String]) -> String {
    if features.is_empty() {
        return "영향받는 주요 기능이 없습니다.".to_string();
    }
    let sorted = sort_features_by_priority(features);
    let shown = sorted.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    if sorted.len() > 3 {
        format!("영향받는 기능: {} 외 {}개", shown, sorted.len() - 3)
    } else {
        format!("영향받는 기능: {}", shown)
    }
}
