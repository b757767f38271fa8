//! Friendly, non-developer labels for code identifiers.
//!
//! `handleLoginSubmit` becomes `로그인` with a lock icon; names matching no
//! keyword fall back to a layer-based `"{layer} 모듈"` label.

use crate::call_graph::FunctionKind;
use crate::layers::Layer;
use serde::{Deserialize, Serialize};

/// Keyword → (label, icon), searched in this order
const KEYWORD_MAP: &[(&str, &str, &str)] = &[
    ("login", "로그인", "🔐"),
    ("logout", "로그아웃", "🚪"),
    ("auth", "인증", "✅"),
    ("signin", "로그인", "🔐"),
    ("signout", "로그아웃", "🚪"),
    ("signup", "회원가입", "📝"),
    ("register", "회원가입", "📝"),
    ("password", "비밀번호", "🔑"),
    ("user", "회원", "👤"),
    ("profile", "프로필", "👤"),
    ("account", "계정", "👤"),
    ("member", "회원", "👥"),
    ("dashboard", "대시보드", "📊"),
    ("home", "홈", "🏠"),
    ("main", "메인", "🏠"),
    ("page", "화면", "📄"),
    ("modal", "팝업", "💬"),
    ("dialog", "팝업", "💬"),
    ("list", "목록", "📋"),
    ("detail", "상세", "🔍"),
    ("form", "입력폼", "📝"),
    ("table", "표", "📊"),
    ("card", "카드", "🃏"),
    ("create", "생성", "➕"),
    ("add", "추가", "➕"),
    ("new", "새로만들기", "✨"),
    ("edit", "수정", "✏️"),
    ("update", "수정", "✏️"),
    ("delete", "삭제", "🗑️"),
    ("remove", "삭제", "🗑️"),
    ("save", "저장", "💾"),
    ("submit", "제출", "📤"),
    ("search", "검색", "🔍"),
    ("filter", "필터", "🔽"),
    ("sort", "정렬", "↕️"),
    ("nav", "메뉴", "☰"),
    ("menu", "메뉴", "☰"),
    ("header", "상단", "⬆️"),
    ("footer", "하단", "⬇️"),
    ("sidebar", "사이드바", "◀️"),
    ("setting", "설정", "⚙️"),
    ("config", "설정", "⚙️"),
    ("option", "옵션", "🎛️"),
    ("preference", "환경설정", "⚙️"),
    ("route", "서버처리", "🌐"),
    ("api", "API", "🔌"),
    ("endpoint", "엔드포인트", "🔌"),
    ("handler", "처리", "⚡"),
    ("controller", "제어", "🎮"),
    ("service", "처리", "⚙️"),
    ("util", "도구", "🔧"),
    ("helper", "도우미", "🤝"),
    ("hook", "훅", "🪝"),
    ("store", "저장소", "📦"),
    ("notification", "알림", "🔔"),
    ("alert", "경고", "⚠️"),
    ("message", "메시지", "💬"),
    ("toast", "알림", "🔔"),
    ("file", "파일", "📁"),
    ("upload", "업로드", "📤"),
    ("download", "다운로드", "📥"),
    ("image", "이미지", "🖼️"),
    ("video", "영상", "🎬"),
    ("payment", "결제", "💳"),
    ("order", "주문", "🛒"),
    ("cart", "장바구니", "🛒"),
    ("checkout", "결제", "💳"),
    ("button", "버튼", "🔘"),
    ("input", "입력", "⌨️"),
    ("loading", "로딩", "⏳"),
    ("error", "오류", "❌"),
    ("success", "성공", "✅"),
];

const PREFIX_MAP: &[(&str, &str)] = &[
    ("user", "회원"),
    ("admin", "관리자"),
    ("guest", "손님"),
    ("auth", "인증"),
    ("github", "GitHub"),
    ("google", "Google"),
    ("issue", "이슈"),
    ("repo", "저장소"),
    ("repository", "저장소"),
    ("project", "프로젝트"),
    ("ai", "AI"),
    ("code", "코드"),
    ("flow", "흐름"),
    ("diagram", "다이어그램"),
    ("interactive", "인터랙티브"),
    ("redirect", "리다이렉트"),
];

const DEFAULT_LABEL: &str = "기능";
const DEFAULT_ICON: &str = "📄";

/// Display metadata for one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionLabel {
    pub icon: String,
    pub display_name: String,
    pub technical_name: String,
    pub description: String,
}

fn kind_icon(kind: Option<FunctionKind>) -> &'static str {
    match kind {
        Some(FunctionKind::Component) => "🧩",
        Some(FunctionKind::Hook) => "🪝",
        Some(FunctionKind::Handler) => "⚡",
        Some(FunctionKind::Method) => "📌",
        Some(FunctionKind::Arrow) => "➜",
        Some(FunctionKind::Function) | None => DEFAULT_ICON,
    }
}

fn kind_description(kind: Option<FunctionKind>) -> &'static str {
    match kind {
        Some(FunctionKind::Component) => "화면 컴포넌트",
        Some(FunctionKind::Hook) => "재사용 로직",
        Some(FunctionKind::Handler) => "이벤트 처리",
        Some(FunctionKind::Method) => "메서드",
        Some(FunctionKind::Arrow) => "함수",
        Some(FunctionKind::Function) | None => "기능",
    }
}

/// Builds the friendly label for `name`
pub fn function_label(name: &str, kind: Option<FunctionKind>, layer: Option<Layer>) -> FunctionLabel {
    let lower = name.to_lowercase();
    let words: Vec<String> = split_camel_case(name)
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect();

    let by_word = words.iter().find_map(|word| {
        KEYWORD_MAP
            .iter()
            .find(|(key, _, _)| key == word)
            .map(|entry| (entry, true))
    });
    let matched = by_word.or_else(|| {
        KEYWORD_MAP
            .iter()
            .find(|(key, _, _)| lower.contains(key))
            .map(|entry| (entry, false))
    });

    match matched {
        Some(((key, label, icon), whole_word)) => {
            let prefix = words
                .iter()
                .filter(|w| !whole_word || w.as_str() != *key)
                .find_map(|w| PREFIX_MAP.iter().find(|(p, _)| p == w).map(|(_, v)| *v));
            let display_name = match prefix {
                Some(prefix) => format!("{} {}", prefix, label),
                None => label.to_string(),
            };
            let layer_text = layer.map(|l| l.description()).unwrap_or("");
            let description = format!("{} {} {}입니다.", layer_text, display_name, kind_description(kind))
                .trim()
                .to_string();
            FunctionLabel {
                icon: icon.to_string(),
                display_name,
                technical_name: name.to_string(),
                description,
            }
        }
        None => {
            let default_label = layer.map(|l| l.default_label()).unwrap_or(DEFAULT_LABEL);
            let area = layer.map(|l| l.default_label()).unwrap_or("기타");
            FunctionLabel {
                icon: kind_icon(kind).to_string(),
                display_name: format!("{} 모듈", default_label),
                technical_name: name.to_string(),
                description: format!("{} 영역의 기능입니다.", area),
            }
        }
    }
}

/// Friendly display name of an identifier
pub fn friendly_label(name: &str) -> String {
    function_label(name, None, None).display_name
}

/// Icon of an identifier's matched keyword, or the generic document icon
pub fn function_icon(name: &str) -> String {
    function_label(name, None, None).icon
}

/// Splits `camelCase`, `PascalCase`, `snake_case` and `kebab-case` into words.
///
/// Acronym runs stay together: `XMLParser` → `["XML", "Parser"]`.
pub fn split_camel_case(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if i > 0 && !current.is_empty() {
            let prev = chars[i - 1];
            let lower_to_upper = prev.is_ascii_lowercase() && c.is_ascii_uppercase();
            let acronym_end = prev.is_ascii_uppercase()
                && c.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if lower_to_upper || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Makes a label safe to embed in a quoted diagram string
pub fn escape_label(label: &str) -> String {
    label
        .replace('"', "'")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_identifier_shapes() {
        assert_eq!(split_camel_case("handleLoginSubmit"), vec!["handle", "Login", "Submit"]);
        assert_eq!(split_camel_case("XMLParser"), vec!["XML", "Parser"]);
        assert_eq!(split_camel_case("user_profile-card"), vec!["user", "profile", "card"]);
        assert!(split_camel_case("").is_empty());
    }

    #[test]
    fn labels_by_first_keyword_word() {
        assert_eq!(friendly_label("handleLogin"), "로그인");
        assert_eq!(friendly_label("useAuth"), "인증");
        assert_eq!(function_icon("LoginPage"), "🔐");
    }

    #[test]
    fn adds_prefix_from_remaining_words() {
        assert_eq!(friendly_label("UserProfileCard"), "회원");
        assert_eq!(friendly_label("GithubIssueList"), "GitHub 목록");
        assert_eq!(friendly_label("adminDashboard"), "관리자 대시보드");
    }

    #[test]
    fn falls_back_to_substring_then_layer_default() {
        assert_eq!(friendly_label("relogin"), "로그인");
        assert_eq!(friendly_label("App"), "기능 모듈");
        let label = function_label("App", Some(FunctionKind::Component), Some(Layer::Ui));
        assert_eq!(label.display_name, "화면 모듈");
        assert_eq!(label.icon, "🧩");
    }

    #[test]
    fn describes_with_layer_and_kind() {
        let label = function_label("useAuth", Some(FunctionKind::Hook), Some(Layer::Logic));
        assert_eq!(label.description, "데이터를 처리하는 인증 재사용 로직입니다.");
        let plain = function_label("useAuth", None, None);
        assert_eq!(plain.description, "인증 기능입니다.");
    }

    #[test]
    fn escapes_quotes_and_newlines() {
        assert_eq!(escape_label("say \"hi\"\nnow"), "say 'hi' now");
    }
}
