//! Bounded, relevance-ranked repository digests.
//!
//! A summary is built once per assessment and thrown away after the prompt
//! is rendered. Fetching stops at the configured byte and file caps; files
//! above the per-file cap are never requested.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::RepoClient;
use crate::error::RepoResult;
use crate::reference::RepoRef;
use crate::types::{RepoLimits, TreeEntry};

const TRUNCATION_MARKER: &str = "...";

const SKIPPED_DIRS: &[&str] = &[
    "node_modules/",
    "vendor/",
    "dist/",
    "build/",
    "target/",
    ".git/",
    "__pycache__/",
    ".venv/",
];

const LOCK_FILES: &[&str] = &[
    "cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "composer.lock",
    "gemfile.lock",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "mjs", "ts", "jsx", "tsx", "java", "kt", "go", "c", "h", "cpp", "hpp", "cc",
    "cs", "rb", "php", "swift", "scala", "dart", "html", "css", "scss", "vue", "svelte", "sql",
    "sh", "md", "txt", "json", "yaml", "yml", "toml", "r", "m", "ipynb",
];

/// A file included in full (truncated) in the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub path: String,
    pub truncated_content: String,
}

/// Derived view of one repository, consumed once by the prompt compiler.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySummary {
    pub owner: String,
    pub repo_name: String,
    pub description: Option<String>,
    pub file_count: usize,
    pub analyzed_file_count: usize,
    pub languages: BTreeMap<String, u64>,
    pub has_readme: bool,
    pub has_tests: bool,
    pub has_documentation: bool,
    pub structure_text: String,
    pub readme_excerpt: Option<String>,
    pub selected_files: Vec<SelectedFile>,
}

/// A fetched candidate prior to ranking.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: String,
    pub content: String,
    /// Position in the tree listing.
    pub order: usize,
}

/// Builds [`RepositorySummary`] values from the repository API.
#[derive(Debug, Clone)]
pub struct RepoSummarizer {
    client: RepoClient,
}

impl RepoSummarizer {
    pub fn new(client: RepoClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RepoClient {
        &self.client
    }

    /// Fetch and summarize a repository.
    ///
    /// Access failures (missing, private, throttled) are returned as errors;
    /// a single unreadable file is skipped.
    pub async fn summarize(
        &self,
        repo: &RepoRef,
        keywords: &[String],
    ) -> RepoResult<RepositorySummary> {
        let limits = &self.client.config().limits;

        let meta = self.client.get_repository(repo).await?;
        let languages = self.client.get_languages(repo).await?;
        let tree = self.client.get_tree(repo, &meta.default_branch).await?;
        if tree.truncated {
            warn!(repo = %repo, "file tree listing truncated by host");
        }

        let files: Vec<&TreeEntry> = tree.tree.iter().filter(|e| e.is_file()).collect();
        let paths: Vec<&str> = files.iter().map(|e| e.path.as_str()).collect();

        let has_readme = paths.iter().any(|p| is_readme_path(p));
        let has_tests = paths.iter().any(|p| is_test_path(p));
        let has_documentation = paths.iter().any(|p| is_doc_path(p));
        let structure_text = render_structure(&tree.tree, limits.max_structure_entries);

        let mut budget = FetchBudget::new(limits);

        let mut readme_excerpt = None;
        if let Some(readme) = files.iter().find(|e| is_root_readme(&e.path)) {
            let size = readme.size.unwrap_or(0);
            if budget.admit(size) {
                match self
                    .client
                    .get_file_content(repo, &readme.path, &meta.default_branch)
                    .await
                {
                    Ok(text) => {
                        readme_excerpt = Some(truncate_chars(text.trim(), limits.readme_chars));
                    }
                    Err(e) => warn!(path = %readme.path, error = %e, "skipping README"),
                }
            }
        }

        let mut queue: Vec<(usize, &TreeEntry)> = files
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, e)| !is_root_readme(&e.path) && is_text_candidate(&e.path))
            .collect();
        prioritize_by_path(&mut queue, keywords);

        let mut candidates = Vec::new();
        for (order, entry) in queue {
            if budget.files_exhausted() {
                break;
            }
            let size = entry.size.unwrap_or(0);
            if size > limits.max_file_bytes {
                debug!(path = %entry.path, size, "skipping file above per-file cap");
                continue;
            }
            if !budget.admit(size) {
                debug!(path = %entry.path, size, "file exceeds remaining byte budget");
                continue;
            }
            match self
                .client
                .get_file_content(repo, &entry.path, &meta.default_branch)
                .await
            {
                Ok(content) => candidates.push(CandidateFile {
                    path: entry.path.clone(),
                    content,
                    order,
                }),
                Err(e) => warn!(path = %entry.path, error = %e, "skipping unreadable file"),
            }
        }

        let analyzed_file_count = candidates.len();
        let selected_files = rank_files(candidates, keywords, limits.top_files)
            .into_iter()
            .map(|c| SelectedFile {
                truncated_content: truncate_chars(&c.content, limits.file_snippet_chars),
                path: c.path,
            })
            .collect();

        info!(
            repo = %repo,
            file_count = files.len(),
            analyzed_file_count,
            fetched_bytes = budget.used_bytes,
            "repository summarized"
        );

        Ok(RepositorySummary {
            owner: repo.owner.clone(),
            repo_name: repo.name.clone(),
            description: meta.description.filter(|d| !d.trim().is_empty()),
            file_count: files.len(),
            analyzed_file_count,
            languages,
            has_readme,
            has_tests,
            has_documentation,
            structure_text,
            readme_excerpt,
            selected_files,
        })
    }
}

struct FetchBudget {
    max_bytes: u64,
    max_files: usize,
    used_bytes: u64,
    used_files: usize,
}

impl FetchBudget {
    fn new(limits: &RepoLimits) -> Self {
        Self {
            max_bytes: limits.max_total_bytes,
            max_files: limits.max_fetched_files,
            used_bytes: 0,
            used_files: 0,
        }
    }

    fn files_exhausted(&self) -> bool {
        self.used_files >= self.max_files
    }

    fn admit(&mut self, size: u64) -> bool {
        if self.files_exhausted() || self.used_bytes + size > self.max_bytes {
            return false;
        }
        self.used_bytes += size;
        self.used_files += 1;
        true
    }
}

/// Order tree entries for fetching: entries whose path names a keyword
/// first, most hits first, then listing order. The fetch caps apply to this
/// order, so keyword files deep in the tree still get read.
pub fn prioritize_by_path(entries: &mut [(usize, &TreeEntry)], keywords: &[String]) {
    entries.sort_by_cached_key(|(order, entry)| {
        let path = entry.path.to_lowercase();
        let hits = keywords.iter().filter(|k| path.contains(k.as_str())).count();
        (std::cmp::Reverse(hits), *order)
    });
}

/// Rank candidates by keyword relevance and keep the top `top_n`.
///
/// Relevance is the number of distinct keywords found in the lower-cased
/// path or content. Ties go to the shorter path, then to the earlier file
/// in the listing.
pub fn rank_files(
    candidates: Vec<CandidateFile>,
    keywords: &[String],
    top_n: usize,
) -> Vec<CandidateFile> {
    let mut scored: Vec<(usize, CandidateFile)> = candidates
        .into_iter()
        .map(|c| (relevance(&c, keywords), c))
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| a.path.len().cmp(&b.path.len()))
            .then_with(|| a.order.cmp(&b.order))
    });

    scored.into_iter().take(top_n).map(|(_, c)| c).collect()
}

fn relevance(candidate: &CandidateFile, keywords: &[String]) -> usize {
    let path = candidate.path.to_lowercase();
    let content = candidate.content.to_lowercase();
    keywords
        .iter()
        .filter(|k| path.contains(k.as_str()) || content.contains(k.as_str()))
        .count()
}

/// Cut `text` to `budget` characters, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(budget).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TRUNCATION_MARKER)
    } else {
        head
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn is_readme_path(path: &str) -> bool {
    file_name(path).to_lowercase().starts_with("readme")
}

fn is_root_readme(path: &str) -> bool {
    !path.contains('/') && is_readme_path(path)
}

/// Matches common test-naming conventions across ecosystems.
pub fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let name = file_name(&lower);
    let in_test_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "test" | "tests" | "__tests__" | "spec" | "specs"));

    in_test_dir
        || name.starts_with("test_")
        || name.contains("_test.")
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.contains("_spec.")
        || (name.starts_with("test") && name.ends_with(".java"))
        || name.ends_with("test.java")
        || name.ends_with("tests.cs")
}

pub fn is_doc_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let name = file_name(&lower);
    let in_docs_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "doc" | "docs" | "documentation" | "wiki"));

    in_docs_dir
        || name.starts_with("contributing")
        || name.starts_with("changelog")
        || name.ends_with(".rst")
        || name.ends_with(".adoc")
        || (name.ends_with(".md") && !name.starts_with("readme"))
}

fn is_text_candidate(path: &str) -> bool {
    let lower = path.to_lowercase();
    if SKIPPED_DIRS
        .iter()
        .any(|d| lower.starts_with(d) || lower.contains(&format!("/{}", d)))
    {
        return false;
    }
    let name = file_name(&lower);
    if LOCK_FILES.contains(&name) || name.ends_with(".min.js") || name.ends_with(".min.css") {
        return false;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => TEXT_EXTENSIONS.contains(&ext),
        None => matches!(name, "makefile" | "dockerfile"),
    }
}

/// Indented listing of the tree, capped at `max_entries`.
pub fn render_structure(entries: &[TreeEntry], max_entries: usize) -> String {
    let mut out = String::new();
    for entry in entries.iter().take(max_entries) {
        let depth = entry.path.matches('/').count();
        let suffix = if entry.is_file() { "" } else { "/" };
        let _ = writeln!(
            out,
            "{}{}{}",
            "  ".repeat(depth),
            file_name(&entry.path),
            suffix
        );
    }
    if entries.len() > max_entries {
        let _ = writeln!(out, "... ({} more entries)", entries.len() - max_entries);
    }
    out
}

impl RepositorySummary {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo_name)
    }

    /// Language shares as `(language, bytes, percent)`, largest first.
    pub fn language_shares(&self) -> Vec<(String, u64, f64)> {
        let total: u64 = self.languages.values().sum();
        let mut shares: Vec<(String, u64, f64)> = self
            .languages
            .iter()
            .map(|(lang, bytes)| {
                let pct = if total == 0 {
                    0.0
                } else {
                    (*bytes as f64) * 100.0 / (total as f64)
                };
                (lang.clone(), *bytes, pct)
            })
            .collect();
        shares.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        shares
    }

    /// Render the single digest string handed to the prompt compiler.
    pub fn render_digest(&self) -> String {
        let mut out = String::new();
        let yes_no = |b: bool| if b { "yes" } else { "no" };

        let _ = writeln!(out, "Repository: {}", self.full_name());
        let _ = writeln!(
            out,
            "URL: https://github.com/{}/{}",
            self.owner, self.repo_name
        );
        if let Some(desc) = &self.description {
            let _ = writeln!(out, "Description: {}", desc.trim());
        }
        let _ = writeln!(
            out,
            "Files: {} total, {} analyzed",
            self.file_count, self.analyzed_file_count
        );

        let shares = self.language_shares();
        if shares.is_empty() {
            let _ = writeln!(out, "Languages: none detected");
        } else {
            let rendered: Vec<String> = shares
                .iter()
                .map(|(lang, bytes, pct)| format!("{} {:.1}% ({} bytes)", lang, pct, bytes))
                .collect();
            let _ = writeln!(out, "Languages: {}", rendered.join(", "));
        }

        let _ = writeln!(out, "\nQuality signals:");
        let _ = writeln!(out, "- README present: {}", yes_no(self.has_readme));
        let _ = writeln!(out, "- Tests present: {}", yes_no(self.has_tests));
        let _ = writeln!(
            out,
            "- Documentation present: {}",
            yes_no(self.has_documentation)
        );

        let _ = writeln!(out, "\nDirectory structure:");
        out.push_str(&self.structure_text);

        if let Some(readme) = &self.readme_excerpt {
            let _ = writeln!(out, "\nREADME (excerpt):\n{}", readme);
        }

        if !self.selected_files.is_empty() {
            let _ = writeln!(out, "\nKey files:");
            for file in &self.selected_files {
                let _ = writeln!(out, "--- {} ---\n{}", file.path, file.truncated_content);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &str, content: &str, order: usize) -> CandidateFile {
        CandidateFile {
            path: path.to_string(),
            content: content.to_string(),
            order,
        }
    }

    #[test]
    fn test_truncate_chars_marks_cut() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
        // multi-byte safe
        assert_eq!(truncate_chars("ééééé", 2), "éé...");
    }

    #[test]
    fn test_rank_prefers_keyword_hits() {
        let keywords = vec!["calculator".to_string(), "parser".to_string()];
        let ranked = rank_files(
            vec![
                candidate("src/util.rs", "fn helper() {}", 0),
                candidate("src/calc.rs", "// calculator parser", 1),
                candidate("src/parser.rs", "fn parse() {}", 2),
            ],
            &keywords,
            2,
        );
        let paths: Vec<&str> = ranked.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/calc.rs", "src/parser.rs"]);
    }

    #[test]
    fn test_rank_tie_breaks_short_path_then_order() {
        let ranked = rank_files(
            vec![
                candidate("src/deeper/b.rs", "", 0),
                candidate("src/a.rs", "", 1),
                candidate("src/c.rs", "", 2),
            ],
            &[],
            3,
        );
        let paths: Vec<&str> = ranked.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.rs", "src/c.rs", "src/deeper/b.rs"]);
    }

    #[test]
    fn test_prioritize_by_path_moves_keyword_files_forward() {
        let entries: Vec<TreeEntry> = [
            "docs/a.md",
            "src/util.py",
            "src/calculator.py",
            "calc/parser_calculator.py",
        ]
        .iter()
        .map(|p| TreeEntry {
            path: p.to_string(),
            kind: "blob".into(),
            size: Some(1),
        })
        .collect();
        let mut queue: Vec<(usize, &TreeEntry)> = entries.iter().enumerate().collect();
        let keywords = vec!["calculator".to_string(), "parser".to_string()];
        prioritize_by_path(&mut queue, &keywords);
        let paths: Vec<&str> = queue.iter().map(|(_, e)| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["calc/parser_calculator.py", "src/calculator.py", "docs/a.md", "src/util.py"]
        );

        let mut untouched: Vec<(usize, &TreeEntry)> = entries.iter().enumerate().collect();
        prioritize_by_path(&mut untouched, &[]);
        assert_eq!(untouched[0].1.path, "docs/a.md");
    }

    #[test]
    fn test_heuristics() {
        assert!(is_readme_path("README.md"));
        assert!(is_readme_path("docs/readme.txt"));
        assert!(is_test_path("tests/integration.rs"));
        assert!(is_test_path("src/app.test.js"));
        assert!(is_test_path("pkg/handler_test.go"));
        assert!(is_test_path("test_app.py"));
        assert!(!is_test_path("src/contest.rs"));
        assert!(is_doc_path("docs/guide.txt"));
        assert!(is_doc_path("CONTRIBUTING.md"));
        assert!(!is_doc_path("README.md"));
        assert!(!is_doc_path("src/main.rs"));
    }

    #[test]
    fn test_text_candidates_skip_vendored_and_locks() {
        assert!(is_text_candidate("src/main.rs"));
        assert!(is_text_candidate("Dockerfile"));
        assert!(!is_text_candidate("node_modules/x/index.js"));
        assert!(!is_text_candidate("web/dist/app.js"));
        assert!(!is_text_candidate("Cargo.lock"));
        assert!(!is_text_candidate("logo.png"));
        assert!(!is_text_candidate("static/app.min.js"));
    }

    #[test]
    fn test_render_structure_caps_entries() {
        let entries = vec![
            TreeEntry {
                path: "src".into(),
                kind: "tree".into(),
                size: None,
            },
            TreeEntry {
                path: "src/main.rs".into(),
                kind: "blob".into(),
                size: Some(10),
            },
            TreeEntry {
                path: "Cargo.toml".into(),
                kind: "blob".into(),
                size: Some(10),
            },
        ];
        let text = render_structure(&entries, 2);
        assert_eq!(text, "src/\n  main.rs\n... (1 more entries)\n");
    }

    #[test]
    fn test_fetch_budget() {
        let limits = RepoLimits {
            max_total_bytes: 100,
            max_fetched_files: 2,
            ..Default::default()
        };
        let mut budget = FetchBudget::new(&limits);
        assert!(budget.admit(60));
        assert!(!budget.admit(50));
        assert!(budget.admit(40));
        assert!(budget.files_exhausted());
        assert!(!budget.admit(0));
    }

    #[test]
    fn test_render_digest_sections() {
        let mut languages = BTreeMap::new();
        languages.insert("Rust".to_string(), 300);
        languages.insert("Shell".to_string(), 100);
        let summary = RepositorySummary {
            owner: "octo".into(),
            repo_name: "hello".into(),
            description: Some("demo".into()),
            file_count: 3,
            analyzed_file_count: 1,
            languages,
            has_readme: true,
            has_tests: false,
            has_documentation: false,
            structure_text: "src/\n  main.rs\n".into(),
            readme_excerpt: Some("# Hello".into()),
            selected_files: vec![SelectedFile {
                path: "src/main.rs".into(),
                truncated_content: "fn main() {}".into(),
            }],
        };

        let digest = summary.render_digest();
        assert!(digest.starts_with("Repository: octo/hello\n"));
        assert!(digest.contains("Languages: Rust 75.0% (300 bytes), Shell 25.0% (100 bytes)"));
        assert!(digest.contains("- Tests present: no"));
        assert!(digest.contains("README (excerpt):\n# Hello"));
        assert!(digest.contains("--- src/main.rs ---\nfn main() {}"));
    }
}
