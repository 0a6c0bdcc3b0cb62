/// Build metadata baked in at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_date: &'static str,
}

impl VersionInfo {
    pub const fn get() -> Self {
        VersionInfo {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: match option_env!("GIT_COMMIT") {
                Some(commit) => commit,
                None => "unknown",
            },
            build_date: match option_env!("BUILD_DATE") {
                Some(date) => date,
                None => "unknown",
            },
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.version)?;
        writeln!(f, "{}", self.build_date)?;
        write!(f, "{}", self.git_commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_package() {
        let info = VersionInfo::get();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.to_string().lines().count(), 3);
    }
}
