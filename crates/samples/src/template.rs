//! Path templates such as `/projects/{project_gid}/tasks`.

use std::sync::OnceLock;

use regex::Regex;

use crate::source::SampleCache;

/// Identifier no real resource carries; used by not-found probes.
pub const NIL_GID: &str = "00000000-0000-0000-0000-000000000000";

fn kind_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+?)_gid\}").expect("placeholder pattern"))
}

fn any_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^}]+\}").expect("placeholder pattern"))
}

/// Placeholder names in order of appearance, without braces.
pub fn placeholders(template: &str) -> Vec<&str> {
    any_placeholder()
        .find_iter(template)
        .map(|m| m.as_str().trim_start_matches('{').trim_end_matches('}'))
        .collect()
}

pub fn is_parameterized(template: &str) -> bool {
    any_placeholder().is_match(template)
}

/// Replace every `{<kind>_gid}` with the first sample key of that kind.
///
/// Returns the name of the first placeholder that cannot be filled:
/// a kind without samples, or a placeholder not of the `_gid` form.
pub fn expand_path(template: &str, cache: &SampleCache) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for m in any_placeholder().find_iter(template) {
        let name = &template[m.start() + 1..m.end() - 1];
        let kind = kind_placeholder()
            .captures(m.as_str())
            .and_then(|c| c.get(1))
            .map(|k| k.as_str());
        let key = kind.and_then(|k| cache.first(k)).ok_or_else(|| name.to_string())?;

        out.push_str(&template[last..m.start()]);
        out.push_str(key);
        last = m.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// The template with its first placeholder set to [`NIL_GID`] and the
/// rest expanded. `None` for templates without placeholders.
pub fn probe_path(template: &str, cache: &SampleCache) -> Option<Result<String, String>> {
    let first = any_placeholder().find(template)?;
    let mut rest = String::with_capacity(template.len());
    rest.push_str(&template[..first.start()]);
    rest.push_str(NIL_GID);
    rest.push_str(&template[first.end()..]);
    Some(expand_path(&rest, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSamples;
    use std::collections::BTreeMap;

    fn cache() -> SampleCache {
        let mut keys = BTreeMap::new();
        keys.insert("project".to_string(), vec!["p1".to_string(), "p2".to_string()]);
        keys.insert("task".to_string(), vec!["t9".to_string()]);
        SampleCache::load(&StaticSamples::new(keys), 3)
    }

    #[test]
    fn lists_placeholders() {
        assert_eq!(
            placeholders("/projects/{project_gid}/tasks/{task_gid}"),
            vec!["project_gid", "task_gid"]
        );
        assert!(placeholders("/workspaces").is_empty());
        assert!(is_parameterized("/x/{gid}"));
        assert!(!is_parameterized("/users/me"));
    }

    #[test]
    fn expands_with_first_key() {
        let c = cache();
        assert_eq!(expand_path("/projects/{project_gid}", &c).unwrap(), "/projects/p1");
        assert_eq!(
            expand_path("/projects/{project_gid}/tasks/{task_gid}/stories", &c).unwrap(),
            "/projects/p1/tasks/t9/stories"
        );
        assert_eq!(expand_path("/workspaces", &c).unwrap(), "/workspaces");
    }

    #[test]
    fn unresolved_placeholder_is_reported() {
        let c = cache();
        assert_eq!(expand_path("/goals/{goal_gid}", &c).unwrap_err(), "goal_gid");
        assert_eq!(expand_path("/things/{id}", &c).unwrap_err(), "id");
    }

    #[test]
    fn probe_replaces_first_placeholder_only() {
        let c = cache();
        assert_eq!(
            probe_path("/projects/{project_gid}/tasks/{task_gid}", &c),
            Some(Ok(format!("/projects/{NIL_GID}/tasks/t9")))
        );
        assert_eq!(
            probe_path("/goals/{goal_gid}", &c),
            Some(Ok(format!("/goals/{NIL_GID}")))
        );
        assert_eq!(probe_path("/workspaces", &c), None);
    }
}
