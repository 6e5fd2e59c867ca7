use crate::config::Config;
use crate::fix::organize_text;
use crate::incremental::IncrementalAnalyzer;
use crate::rules::{Issue, Rule, RuleContext};
use crate::source_io::read_source_file;
use crate::syntax::parse;
use crate::walker::SourceFileWalker;
use ahash::AHashMap;
use dashmap::DashMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Analyzer {
    config: Arc<Config>,
    rules: Vec<Box<dyn Rule>>,
    incremental_analyzer: Option<IncrementalAnalyzer>,
}

#[derive(Debug, serde::Serialize)]
pub struct AnalysisResults {
    pub file_issues: AHashMap<PathBuf, Vec<Issue>>,
    pub stats: AnalysisStats,
    pub performance_stats: Option<PerformanceStats>,
    /// Fixed file contents keyed by path, present after an autofix run.
    pub fixed_files: Option<AHashMap<PathBuf, String>>,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct AnalysisStats {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_issues: usize,
    pub issues_by_severity: AHashMap<String, usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct PerformanceStats {
    pub cache_hit_rate: f64,
    pub files_from_cache: usize,
    pub analysis_time_ms: u128,
    pub autofix_time_ms: Option<u128>,
    pub fixes_applied: usize,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let rules = crate::rules::get_enabled_rules(&config);

        let incremental_analyzer = if config.performance.incremental_analysis {
            Some(IncrementalAnalyzer::new(config.clone()))
        } else {
            None
        };

        Self {
            config: Arc::new(config),
            rules,
            incremental_analyzer,
        }
    }

    pub fn analyze_path(&mut self, path: &Path) -> AnalysisResults {
        self.analyze_path_with_options(path, false)
    }

    pub fn analyze_path_with_autofix(&mut self, path: &Path) -> AnalysisResults {
        self.analyze_path_with_options(path, true)
    }

    fn analyze_path_with_options(&mut self, path: &Path, apply_autofix: bool) -> AnalysisResults {
        let start_time = std::time::Instant::now();

        let walker = SourceFileWalker::new();
        let files: Vec<_> = walker.walk(path).collect();
        let total_files = files.len();

        let (file_issues, mut performance_stats) =
            if let Some(ref mut incremental) = self.incremental_analyzer {
                let incremental_results = incremental.analyze_files(files);
                let all_issues = incremental_results.all_issues();

                let perf_stats = PerformanceStats {
                    cache_hit_rate: incremental_results.stats.cache_hit_rate,
                    files_from_cache: incremental_results.stats.files_from_cache,
                    analysis_time_ms: start_time.elapsed().as_millis(),
                    autofix_time_ms: None,
                    fixes_applied: 0,
                };

                (all_issues, Some(perf_stats))
            } else {
                let file_issues = self.analyze_files_parallel(&files);
                let perf_stats = PerformanceStats {
                    cache_hit_rate: 0.0,
                    files_from_cache: 0,
                    analysis_time_ms: start_time.elapsed().as_millis(),
                    autofix_time_ms: None,
                    fixes_applied: 0,
                };

                (file_issues, Some(perf_stats))
            };

        let mut fixed_files = None;
        if apply_autofix && self.config.autofix.enabled {
            let autofix_start = std::time::Instant::now();
            let mut fixes = AHashMap::new();

            for (file_path, issues) in &file_issues {
                if !issues.iter().any(|issue| issue.fix.is_some()) {
                    continue;
                }
                if let Ok(content) = read_source_file(file_path) {
                    if let Some(fixed_content) = organize_text(&content, &self.config.imports) {
                        fixes.insert(file_path.clone(), fixed_content);
                    }
                }
            }

            if let Some(ref mut perf_stats) = performance_stats.as_mut() {
                perf_stats.autofix_time_ms = Some(autofix_start.elapsed().as_millis());
                perf_stats.fixes_applied = fixes.len();
            }
            if !fixes.is_empty() {
                fixed_files = Some(fixes);
            }
        }

        let mut stats = AnalysisStats {
            total_files,
            files_with_issues: file_issues.len(),
            ..AnalysisStats::default()
        };

        for issues in file_issues.values() {
            stats.total_issues += issues.len();
            for issue in issues {
                *stats
                    .issues_by_severity
                    .entry(issue.severity.to_string())
                    .or_insert(0) += 1;
            }
        }

        AnalysisResults {
            file_issues,
            stats,
            performance_stats,
            fixed_files,
        }
    }

    fn analyze_files_parallel(&self, files: &[PathBuf]) -> AHashMap<PathBuf, Vec<Issue>> {
        let file_issues: DashMap<PathBuf, Vec<Issue>> = DashMap::new();

        if self.config.performance.parallel_analysis {
            files.par_iter().for_each(|file_path| {
                if let Some(issues) = self.analyze_single_file(file_path) {
                    if !issues.is_empty() {
                        file_issues.insert(file_path.clone(), issues);
                    }
                }
            });
        } else {
            for file_path in files {
                if let Some(issues) = self.analyze_single_file(file_path) {
                    if !issues.is_empty() {
                        file_issues.insert(file_path.clone(), issues);
                    }
                }
            }
        }

        file_issues.into_iter().collect()
    }

    fn analyze_single_file(&self, file_path: &Path) -> Option<Vec<Issue>> {
        let content = if self.config.performance.memory_mapped_io {
            read_source_file(file_path).ok()?
        } else {
            std::fs::read_to_string(file_path).ok()?
        };

        let tree = parse(&content);
        let mut ctx = RuleContext::new(file_path.to_path_buf(), content, tree);

        for rule in &self.rules {
            rule.check(&mut ctx);
        }

        Some(ctx.issues)
    }

    pub fn analyze_file(&self, path: &Path) -> AnalysisResults {
        let mut file_issues = AHashMap::new();

        if let Some(issues) = self.analyze_single_file(path) {
            if !issues.is_empty() {
                file_issues.insert(path.to_path_buf(), issues);
            }
        }

        let mut stats = AnalysisStats {
            total_files: 1,
            files_with_issues: usize::from(!file_issues.is_empty()),
            ..AnalysisStats::default()
        };

        for issues in file_issues.values() {
            stats.total_issues += issues.len();
            for issue in issues {
                *stats
                    .issues_by_severity
                    .entry(issue.severity.to_string())
                    .or_insert(0) += 1;
            }
        }

        AnalysisResults {
            file_issues,
            stats,
            performance_stats: None,
            fixed_files: None,
        }
    }
}

impl AnalysisResults {
    pub fn total_issues(&self) -> usize {
        self.stats.total_issues
    }

    pub fn file_count(&self) -> usize {
        self.stats.total_files
    }

    pub fn files_with_issues(&self) -> usize {
        self.stats.files_with_issues
    }

    pub fn fixable_count(&self) -> usize {
        self.file_issues
            .values()
            .flat_map(|issues| issues.iter())
            .filter(|issue| issue.fix.is_some())
            .count()
    }

    pub fn fixes_applied(&self) -> usize {
        self.performance_stats
            .as_ref()
            .map(|stats| stats.fixes_applied)
            .unwrap_or(0)
    }

    pub fn has_fixes(&self) -> bool {
        self.fixed_files.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn analyzes_a_directory_and_fixes_it() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("program.cs");
        fs::write(&file, "using B;\nusing A;\n").unwrap();

        let mut analyzer = Analyzer::new(Config::default());
        let results = analyzer.analyze_path_with_autofix(temp_dir.path());

        assert_eq!(results.file_count(), 1);
        assert!(results.total_issues() > 0);
        assert!(results.has_fixes());
        let fixed = &results.fixed_files.as_ref().unwrap()[&file];
        assert_eq!(fixed, "using A;\nusing B;\n");
    }

    #[test]
    fn clean_directory_has_no_fixes() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("program.cs");
        fs::write(&file, "using A;\nusing B;\n").unwrap();

        let mut analyzer = Analyzer::new(Config::default());
        let results = analyzer.analyze_path_with_autofix(temp_dir.path());

        assert_eq!(results.total_issues(), 0);
        assert!(!results.has_fixes());
    }
}
