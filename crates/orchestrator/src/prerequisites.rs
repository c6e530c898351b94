use std::path::PathBuf;
use tracing::debug;

/// Resolves command-line tools by name.
pub trait ToolLocator: Send + Sync {
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Searches `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPath;

impl ToolLocator for SystemPath {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }
}

/// Reports every tool as present. Used for simulated runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeAvailable;

impl ToolLocator for AssumeAvailable {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        Some(PathBuf::from(tool))
    }
}

/// Tools from `required` that `locator` cannot find, in input order.
pub fn missing_tools(locator: &dyn ToolLocator, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|tool| match locator.locate(tool) {
            Some(path) => {
                debug!(tool = %tool, path = %path.display(), "Found tool");
                false
            }
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Only(&'static [&'static str]);

    impl ToolLocator for Only {
        fn locate(&self, tool: &str) -> Option<PathBuf> {
            self.0
                .iter()
                .any(|t| *t == tool)
                .then(|| PathBuf::from(format!("/usr/bin/{}", tool)))
        }
    }

    fn tools(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_tools_in_order() {
        let locator = Only(&["kubectl"]);
        let missing = missing_tools(&locator, &tools(&["aws", "kubectl", "docker"]));
        assert_eq!(missing, vec!["aws", "docker"]);
    }

    #[test]
    fn test_assume_available() {
        assert!(missing_tools(&AssumeAvailable, &tools(&["aws", "nonexistent-tool"])).is_empty());
    }

    #[test]
    fn test_system_path_missing_tool() {
        let missing = missing_tools(&SystemPath, &tools(&["definitely-not-installed-7f3a"]));
        assert_eq!(missing.len(), 1);
    }
}
