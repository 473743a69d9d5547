use super::src::canonical::{normalize_path, to_canonical_path};

#[test]
fn test_normalizes_separators() {
    assert_eq!(normalize_path(r"src\app\main.ts"), "src/app/main.ts");
    assert_eq!(normalize_path(r"\src\main.ts"), "/src/main.ts");
}

#[test]
fn test_collapses_dot_segments() {
    assert_eq!(normalize_path("/src/./app/../main.ts"), "/src/main.ts");
    assert_eq!(normalize_path("/a//b///c.ts"), "/a/b/c.ts");
}

#[test]
fn test_case_insensitive_hosts_fold_case() {
    let a = to_canonical_path("/Src/Main.ts", false);
    let b = to_canonical_path("/src/main.ts", false);
    assert_eq!(a, b);
}

#[test]
fn test_case_sensitive_hosts_preserve_case() {
    let a = to_canonical_path("/Src/Main.ts", true);
    let b = to_canonical_path("/src/main.ts", true);
    assert_ne!(a, b);
}

#[test]
fn test_drive_letters_always_fold() {
    let a = to_canonical_path(r"C:\proj\main.ts", true);
    assert_eq!(a.as_str(), "c:/proj/main.ts");
}
